//! Namespace discovery.
//!
//! [`NamespaceLocator`] lazily walks an immutable buffer for `namespace`
//! blocks. Top-level blocks must start with the configured prefix; blocks
//! nested inside a recorded one are always recorded, qualified by their
//! parent (`namespace a { namespace b {` yields `a` and `a::b`).
//!
//! Scanning resumes just past each opening brace, so nested blocks become
//! independent records. `using namespace x;` and `namespace x = y;` are
//! skipped because the name must be followed by `{`.

use memchr::memmem;

use crate::line_index::LineIndex;
use crate::scope::{match_scope, ScopeError, ScopeKind};
use crate::text::{is_ident_byte, is_word_at};

const KEYWORD: &str = "namespace";

/// A recorded namespace body.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NamespaceSpan {
    /// Fully qualified name, `::`-separated.
    pub name: String,
    pub begin_line: u32,
    pub end_line: u32,
    /// Byte offset of the opening brace.
    pub open: usize,
    /// Byte offset of the closing brace.
    pub close: usize,
}

impl NamespaceSpan {
    #[inline]
    pub fn contains_line(&self, line: u32) -> bool {
        (self.begin_line..=self.end_line).contains(&line)
    }

    /// Namespace name with `::` replaced by `_`, upper-cased.
    pub fn screaming_name(&self) -> String {
        self.name.replace("::", "_").to_ascii_uppercase()
    }
}

/// Lazy iterator over namespace blocks of one buffer.
pub struct NamespaceLocator<'a> {
    source: &'a str,
    prefix: &'a str,
    lines: &'a LineIndex,
    finder: memmem::Finder<'static>,
    pos: usize,
    /// Close offset and qualified name of every recorded block still open.
    open_blocks: Vec<(usize, String)>,
}

impl<'a> NamespaceLocator<'a> {
    pub fn new(source: &'a str, prefix: &'a str, lines: &'a LineIndex) -> Self {
        NamespaceLocator {
            source,
            prefix,
            lines,
            finder: memmem::Finder::new(KEYWORD),
            pos: 0,
            open_blocks: Vec::new(),
        }
    }

    /// Offset of the `{` ending a namespace header, if the header ends in one.
    fn header_brace(&self, from: usize) -> Option<usize> {
        let bytes = self.source.as_bytes();
        let rel = bytes
            .get(from..)?
            .iter()
            .position(|b| matches!(b, b'{' | b'}' | b';' | b'=' | b'(' | b')'))?;
        (bytes[from + rel] == b'{').then_some(from + rel)
    }
}

impl Iterator for NamespaceLocator<'_> {
    type Item = Result<NamespaceSpan, ScopeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.source.as_bytes();
        loop {
            let keyword = self.pos + self.finder.find(bytes.get(self.pos..)?)?;
            self.pos = keyword + KEYWORD.len();
            if !is_word_at(bytes, keyword, KEYWORD.len()) {
                continue;
            }
            let Some(brace) = self.header_brace(self.pos) else {
                continue;
            };
            let token = self.source[self.pos..brace].trim();
            if !is_qualified_ident(token) {
                continue;
            }

            while self
                .open_blocks
                .last()
                .is_some_and(|(close, _)| *close < keyword)
            {
                self.open_blocks.pop();
            }
            let name = match self.open_blocks.last() {
                Some((_, outer)) => format!("{outer}::{token}"),
                None if token.starts_with(self.prefix) => token.to_owned(),
                None => continue,
            };

            let close = match match_scope(self.source, brace, ScopeKind::Braces) {
                Ok(close) => close,
                Err(err) => {
                    self.pos = self.source.len();
                    return Some(Err(err));
                }
            };
            self.open_blocks.push((close, name.clone()));
            self.pos = brace + 1;

            return Some(Ok(NamespaceSpan {
                name,
                begin_line: self.lines.line_of(brace),
                end_line: self.lines.line_of(close),
                open: brace,
                close,
            }));
        }
    }
}

fn is_qualified_ident(token: &str) -> bool {
    !token.is_empty()
        && token.split("::").all(|part| {
            let part = part.trim();
            !part.is_empty()
                && !part.as_bytes()[0].is_ascii_digit()
                && part.bytes().all(is_ident_byte)
        })
}

/// Every namespace block of a buffer, with innermost-match lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamespaceTable {
    spans: Vec<NamespaceSpan>,
}

impl NamespaceTable {
    pub fn collect(source: &str, prefix: &str, lines: &LineIndex) -> Result<Self, ScopeError> {
        let spans = NamespaceLocator::new(source, prefix, lines).collect::<Result<Vec<_>, _>>()?;
        Ok(NamespaceTable { spans })
    }

    /// Innermost namespace whose line range holds `line`.
    pub fn innermost(&self, line: u32) -> Option<&NamespaceSpan> {
        self.spans
            .iter()
            .filter(|span| span.contains_line(line))
            .max_by_key(|span| span.open)
    }

    pub fn spans(&self) -> &[NamespaceSpan] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

#[cfg(test)]
mod tests;

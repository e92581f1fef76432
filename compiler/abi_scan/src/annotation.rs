//! Export-marker scanning.
//!
//! The scanner never edits its input. Every marker (plus its dependency
//! clause and one trailing blank) is removed while copying into a fresh
//! buffer; newlines inside removed ranges are kept so line numbers agree
//! between the original and the parse-ready text. [`OffsetMap`] maps offsets
//! in the new buffer back to the original.

use std::collections::BTreeSet;
use std::ops::Range;

use memchr::memmem;
use tracing::{debug, warn};

use crate::flags::FLAGS_BEGIN;
use crate::line_index::LineIndex;
use crate::namespace::NamespaceTable;
use crate::reference::{TokenKind, TypeReference};
use crate::scope::{match_scope, ScopeError, ScopeKind};
use crate::text::{find_word, is_ident_byte, is_word_at, leading_ident};

/// Scanner settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanOptions {
    /// Export marker, matched as a whole word.
    pub marker: String,
    /// Keyword introducing `KEYWORD(a, b::C)` right after the marker.
    pub dependency_keyword: String,
    /// Required prefix of top-level namespace names.
    pub namespace_prefix: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            marker: "EXPORT".to_owned(),
            dependency_keyword: "DEPENDS".to_owned(),
            namespace_prefix: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("line {line}: `{marker}` annotates neither a type, a function, nor a flags block")]
    UnclassifiedMarker { line: u32, marker: String },
    #[error("flags block `{name}` has no matching `{boundary}`")]
    MissingFlagsBoundary { name: String, boundary: &'static str },
    #[error(transparent)]
    Scope(#[from] ScopeError),
}

/// Maps offsets of the stripped buffer back to the original.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OffsetMap {
    /// `(stripped, original)` start of every kept chunk, sorted.
    anchors: Vec<(usize, usize)>,
}

impl OffsetMap {
    fn push(&mut self, stripped: usize, original: usize) {
        match self.anchors.last_mut() {
            Some(last) if last.0 == stripped => *last = (stripped, original),
            _ => self.anchors.push((stripped, original)),
        }
    }

    pub fn to_original(&self, offset: usize) -> usize {
        let idx = self.anchors.partition_point(|(stripped, _)| *stripped <= offset);
        match idx.checked_sub(1).and_then(|i| self.anchors.get(i)) {
            Some(&(stripped, original)) => original + (offset - stripped),
            None => offset,
        }
    }
}

/// Result of scanning one header.
#[derive(Clone, Debug)]
pub struct ScanOutput {
    pub references: BTreeSet<TypeReference>,
    /// Parse-ready text: markers and dependency clauses removed.
    pub text: String,
    pub lines: LineIndex,
    pub offsets: OffsetMap,
    /// Namespaces of `text`.
    pub namespaces: NamespaceTable,
}

/// A reference before its namespace is known.
struct Pending {
    name: String,
    line: u32,
    kind: TokenKind,
    dependencies: Vec<String>,
}

pub struct AnnotationScanner<'o> {
    options: &'o ScanOptions,
    marker: memmem::Finder<'o>,
}

impl<'o> AnnotationScanner<'o> {
    pub fn new(options: &'o ScanOptions) -> Self {
        AnnotationScanner {
            options,
            marker: memmem::Finder::new(options.marker.as_bytes()),
        }
    }

    /// Classify every marker of `source` and produce the parse-ready text.
    ///
    /// Scanning the returned text again finds no markers.
    #[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
    pub fn scan(&self, source: &str) -> Result<ScanOutput, ScanError> {
        let bytes = source.as_bytes();
        let marker_len = self.options.marker.len();
        let original_lines = LineIndex::new(source);

        let mut pending = Vec::new();
        let mut removals: Vec<Range<usize>> = Vec::new();
        let mut consumed = 0;

        if marker_len > 0 {
            for at in self.marker.find_iter(bytes) {
                if at < consumed || !is_word_at(bytes, at, marker_len) {
                    continue;
                }
                let line = original_lines.line_of(at);
                let (dependencies, clause_end) = self.dependency_clause(source, at + marker_len)?;

                let line_start = original_lines.line_start(line).unwrap_or(0);
                let (kind, name) = classify(&source[line_start..at], &source[clause_end..])
                    .ok_or_else(|| ScanError::UnclassifiedMarker {
                        line,
                        marker: self.options.marker.clone(),
                    })?;

                let mut end = clause_end;
                if matches!(bytes.get(end), Some(b' ' | b'\t')) {
                    end += 1;
                }
                removals.push(at..end);
                consumed = end;

                debug!(%kind, %name, line, deps = dependencies.len(), "export marker");
                pending.push(Pending {
                    name,
                    line,
                    kind,
                    dependencies,
                });
            }
        }

        let (text, offsets) = strip(source, &removals);
        let lines = LineIndex::new(&text);
        let namespaces = NamespaceTable::collect(&text, &self.options.namespace_prefix, &lines)?;

        let mut references = BTreeSet::new();
        for p in pending {
            let Some(namespace) = namespaces.innermost(p.line) else {
                warn!(name = %p.name, line = p.line, "export marker outside any recognized namespace; skipped");
                continue;
            };
            references.insert(TypeReference {
                name: p.name,
                line: p.line,
                kind: p.kind,
                namespace: namespace.clone(),
                dependencies: p.dependencies,
            });
        }

        Ok(ScanOutput {
            references,
            text,
            lines,
            offsets,
            namespaces,
        })
    }

    /// Parse an optional `KEYWORD(a, b)` clause starting at `from`.
    ///
    /// Returns the listed names and the offset just past the clause, or
    /// `from` itself when there is no clause.
    fn dependency_clause(
        &self,
        source: &str,
        from: usize,
    ) -> Result<(Vec<String>, usize), ScanError> {
        let keyword = self.options.dependency_keyword.as_str();
        let bytes = source.as_bytes();
        let rest = &source[from..];
        let keyword_at = from + (rest.len() - rest.trim_start().len());

        if keyword.is_empty()
            || !source[keyword_at..].starts_with(keyword)
            || !is_word_at(bytes, keyword_at, keyword.len())
        {
            return Ok((Vec::new(), from));
        }

        let after = &source[keyword_at + keyword.len()..];
        let open = keyword_at + keyword.len() + (after.len() - after.trim_start().len());
        if bytes.get(open) != Some(&b'(') {
            return Ok((Vec::new(), from));
        }
        let close = match_scope(source, open, ScopeKind::Parentheses)?;
        let dependencies = source[open + 1..close]
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect();
        Ok((dependencies, close + 1))
    }
}

/// Classify a marker from the text before it on its line and the text after
/// its dependency clause.
fn classify(head: &str, tail: &str) -> Option<(TokenKind, String)> {
    for kind in TokenKind::DECLARATION_KEYWORDS {
        if find_word(head, kind.keyword()).is_some() {
            let (name, _) = leading_ident(tail)?;
            return Some((kind, name.to_owned()));
        }
    }
    // Flags first: `BEGIN_FLAGS_DECLARATION(X)` would also pass as a call.
    if let Some(name) = flags_name(tail) {
        return Some((TokenKind::Flags, name));
    }
    function_name(tail).map(|name| (TokenKind::Function, name))
}

/// Name of a function declared by `tail`: an optional return type, an
/// identifier (or `~identifier`), and a balanced parameter list.
fn function_name(tail: &str) -> Option<String> {
    let paren = tail.find('(')?;
    let head = &tail[..paren];
    let allowed = |b: u8| {
        is_ident_byte(b)
            || b.is_ascii_whitespace()
            || matches!(b, b':' | b'&' | b'*' | b'<' | b'>' | b',' | b'~')
    };
    if !head.bytes().all(allowed) {
        return None;
    }
    let head = head.trim_end();
    let start = head
        .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '~'))
        .map_or(0, |i| i + 1);
    let name = &head[start..];
    let bare = name.trim_start_matches('~');
    if bare.is_empty() || bare.as_bytes()[0].is_ascii_digit() || bare.contains('~') {
        return None;
    }
    match_scope(tail, paren, ScopeKind::Parentheses).ok()?;
    Some(name.to_owned())
}

/// Name in `BEGIN_FLAGS_DECLARATION(Name)` at the start of `tail`.
fn flags_name(tail: &str) -> Option<String> {
    let rest = tail.trim_start().strip_prefix(FLAGS_BEGIN)?;
    let rest = rest.trim_start().strip_prefix('(')?;
    let (name, end) = leading_ident(rest)?;
    rest[end..].trim_start().starts_with(')').then(|| name.to_owned())
}

fn strip(source: &str, removals: &[Range<usize>]) -> (String, OffsetMap) {
    let mut text = String::with_capacity(source.len());
    let mut offsets = OffsetMap::default();
    let mut kept_from = 0;

    for range in removals {
        offsets.push(text.len(), kept_from);
        text.push_str(&source[kept_from..range.start]);
        for (i, b) in source.as_bytes()[range.clone()].iter().enumerate() {
            if *b == b'\n' {
                offsets.push(text.len(), range.start + i);
                text.push('\n');
            }
        }
        kept_from = range.end;
    }
    offsets.push(text.len(), kept_from);
    text.push_str(&source[kept_from..]);

    (text, offsets)
}

#[cfg(test)]
mod tests;

//! Flags blocks.
//!
//! ```text
//! BEGIN_FLAGS_DECLARATION(Access)
//! FLAG(read, 1)
//! FLAG(write, 2)
//! END_FLAGS_DECLARATION(Access);
//! ```

use std::ops::Range;

use memchr::{memchr_iter, memmem};

use crate::annotation::ScanError;
use crate::scope::{match_scope, ScopeKind};
use crate::text::is_word_at;

pub const FLAGS_BEGIN: &str = "BEGIN_FLAGS_DECLARATION";
pub const FLAGS_END: &str = "END_FLAGS_DECLARATION";
const FLAG_ENTRY: &str = "FLAG";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlagEntry {
    pub name: String,
    pub value: String,
}

/// One parsed flags block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlagsBlock {
    pub name: String,
    /// 1-based line of the opening macro.
    pub line: u32,
    /// Source text from the opening macro through the closing one.
    pub declaration: String,
    pub flags: Vec<FlagEntry>,
}

/// A macro invocation `NAME(arg)`: start offset, argument, closing paren.
struct Invocation<'s> {
    at: usize,
    argument: &'s str,
    close: usize,
}

/// Invocations of `macro_name` within `range`, in order.
fn invocations<'s>(source: &'s str, macro_name: &str, range: Range<usize>) -> Vec<Invocation<'s>> {
    let bytes = source.as_bytes();
    let window = bytes.get(range.clone()).unwrap_or_default();
    let len = macro_name.len();
    memmem::find_iter(window, macro_name.as_bytes())
        .map(move |rel| range.start + rel)
        .filter(move |&at| is_word_at(bytes, at, len))
        .filter_map(move |at| {
            let rest = &source[at + len..];
            let open = at + len + (rest.len() - rest.trim_start().len());
            if bytes.get(open) != Some(&b'(') {
                return None;
            }
            let close = match_scope(source, open, ScopeKind::Parentheses).ok()?;
            Some(Invocation {
                at,
                argument: source[open + 1..close].trim(),
                close,
            })
        })
        .collect()
}

fn line_of(source: &str, offset: usize) -> u32 {
    let newlines = memchr_iter(b'\n', &source.as_bytes()[..offset]).count();
    u32::try_from(newlines + 1).unwrap_or(u32::MAX)
}

/// Read the flags block `name` opening at or after `from`.
pub fn read_flags_block(source: &str, from: usize, name: &str) -> Result<FlagsBlock, ScanError> {
    let begin = invocations(source, FLAGS_BEGIN, from..source.len())
        .into_iter()
        .find(|inv| inv.argument == name)
        .ok_or_else(|| ScanError::MissingFlagsBoundary {
            name: name.to_owned(),
            boundary: FLAGS_BEGIN,
        })?;
    let end = invocations(source, FLAGS_END, begin.close..source.len())
        .into_iter()
        .find(|inv| inv.argument == name)
        .ok_or_else(|| ScanError::MissingFlagsBoundary {
            name: name.to_owned(),
            boundary: FLAGS_END,
        })?;

    let flags = invocations(source, FLAG_ENTRY, begin.close..end.at)
        .into_iter()
        .filter_map(|inv| {
            let (flag, value) = inv.argument.split_once(',')?;
            Some(FlagEntry {
                name: flag.trim().to_owned(),
                value: value.trim().to_owned(),
            })
        })
        .collect();

    Ok(FlagsBlock {
        name: name.to_owned(),
        line: line_of(source, begin.at),
        declaration: source[begin.at..=end.close].to_owned(),
        flags,
    })
}

#[cfg(test)]
mod tests;

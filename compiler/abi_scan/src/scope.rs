//! Delimiter matching by depth counting.
//!
//! Only delimiters of the requested kind affect depth. Literals and comments
//! are not recognized, so a `}` inside a string literal counts like any other.

use memchr::{memchr, memchr2};

/// The four delimiter pairs the scanners care about.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Braces,
    Parentheses,
    SquareBrackets,
    AngleBrackets,
}

impl ScopeKind {
    #[inline]
    pub const fn opener(self) -> u8 {
        match self {
            ScopeKind::Braces => b'{',
            ScopeKind::Parentheses => b'(',
            ScopeKind::SquareBrackets => b'[',
            ScopeKind::AngleBrackets => b'<',
        }
    }

    #[inline]
    pub const fn closer(self) -> u8 {
        match self {
            ScopeKind::Braces => b'}',
            ScopeKind::Parentheses => b')',
            ScopeKind::SquareBrackets => b']',
            ScopeKind::AngleBrackets => b'>',
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    #[error("offset {offset} does not hold an opening `{opener}`")]
    NotAnOpener { offset: usize, opener: char },
    #[error("`{opener}` opened at offset {offset} is never closed")]
    Unbalanced { offset: usize, opener: char },
    #[error("no `{opener}` at or after offset {from}")]
    NoOpener { from: usize, opener: char },
}

/// Offset of the delimiter closing the one at `open`.
///
/// Fails when `open` does not hold an opener of `kind`, or when the source
/// ends before depth returns to zero. Never returns a partial match.
pub fn match_scope(source: &str, open: usize, kind: ScopeKind) -> Result<usize, ScopeError> {
    let bytes = source.as_bytes();
    let (opener, closer) = (kind.opener(), kind.closer());
    if bytes.get(open) != Some(&opener) {
        return Err(ScopeError::NotAnOpener {
            offset: open,
            opener: char::from(opener),
        });
    }

    let mut depth = 1usize;
    let mut pos = open + 1;
    while let Some(rel) = memchr2(opener, closer, &bytes[pos..]) {
        let at = pos + rel;
        if bytes[at] == opener {
            depth += 1;
        } else {
            depth -= 1;
            if depth == 0 {
                return Ok(at);
            }
        }
        pos = at + 1;
    }

    Err(ScopeError::Unbalanced {
        offset: open,
        opener: char::from(opener),
    })
}

/// Locate the first opener of `kind` at or after `from` and return
/// `(open, close)` offsets of the whole scope.
pub fn extract_scope(
    source: &str,
    from: usize,
    kind: ScopeKind,
) -> Result<(usize, usize), ScopeError> {
    let open = source
        .as_bytes()
        .get(from..)
        .and_then(|tail| memchr(kind.opener(), tail))
        .map(|rel| from + rel)
        .ok_or(ScopeError::NoOpener {
            from,
            opener: char::from(kind.opener()),
        })?;
    let close = match_scope(source, open, kind)?;
    Ok((open, close))
}

//! Byte-level identifier helpers shared by the scanners.

use memchr::memmem;

/// Bytes that may appear inside a C-family identifier.
#[inline]
pub fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Whether `bytes[at..at + len]` is a whole word (not glued to identifier bytes).
#[inline]
pub fn is_word_at(bytes: &[u8], at: usize, len: usize) -> bool {
    let before = at.checked_sub(1).and_then(|i| bytes.get(i));
    let after = bytes.get(at + len);
    !before.is_some_and(|b| is_ident_byte(*b)) && !after.is_some_and(|b| is_ident_byte(*b))
}

/// First whole-word occurrence of `word` in `haystack`.
pub fn find_word(haystack: &str, word: &str) -> Option<usize> {
    let bytes = haystack.as_bytes();
    memmem::find_iter(bytes, word.as_bytes()).find(|&at| is_word_at(bytes, at, word.len()))
}

/// Leading identifier of `text` after skipping whitespace, with its end offset.
pub(crate) fn leading_ident(text: &str) -> Option<(&str, usize)> {
    let start = text.len() - text.trim_start().len();
    let len = text[start..]
        .bytes()
        .take_while(|b| is_ident_byte(*b))
        .count();
    if len == 0 || text.as_bytes()[start].is_ascii_digit() {
        return None;
    }
    Some((&text[start..start + len], start + len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_boundaries() {
        assert_eq!(find_word("EXPORTED EXPORT", "EXPORT"), Some(9));
        assert_eq!(find_word("_EXPORT", "EXPORT"), None);
        assert_eq!(find_word("EXPORT", "EXPORT"), Some(0));
    }

    #[test]
    fn leading_identifier() {
        assert_eq!(leading_ident("  Widget : Base"), Some(("Widget", 8)));
        assert_eq!(leading_ident("  {"), None);
        assert_eq!(leading_ident("9abc"), None);
    }
}

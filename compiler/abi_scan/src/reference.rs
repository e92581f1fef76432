//! Raw references produced by the annotation scanner.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::namespace::NamespaceSpan;

/// What an export marker annotates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
    Enum,
    Class,
    Struct,
    Union,
    Function,
    Flags,
}

impl TokenKind {
    /// Keywords recognized on the marker line, in classification priority.
    ///
    /// `enum` comes first so `enum class` classifies as an enum.
    pub const DECLARATION_KEYWORDS: [TokenKind; 4] = [
        TokenKind::Enum,
        TokenKind::Class,
        TokenKind::Struct,
        TokenKind::Union,
    ];

    pub const fn keyword(self) -> &'static str {
        match self {
            TokenKind::Enum => "enum",
            TokenKind::Class => "class",
            TokenKind::Struct => "struct",
            TokenKind::Union => "union",
            TokenKind::Function => "function",
            TokenKind::Flags => "flags",
        }
    }

    #[inline]
    pub const fn is_class_like(self) -> bool {
        matches!(self, TokenKind::Class | TokenKind::Struct)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One export marker occurrence.
///
/// Identity is `(name, line)`: two references with the same name on the
/// same line are the same reference regardless of the other fields.
/// Ordering is by line, then name, so sets iterate in source order.
#[derive(Clone, Debug)]
pub struct TypeReference {
    pub name: String,
    /// 1-based declaration line.
    pub line: u32,
    pub kind: TokenKind,
    pub namespace: NamespaceSpan,
    /// Names listed in the dependency clause, as written.
    pub dependencies: Vec<String>,
}

impl PartialEq for TypeReference {
    fn eq(&self, other: &Self) -> bool {
        self.line == other.line && self.name == other.name
    }
}

impl Eq for TypeReference {}

impl Hash for TypeReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.line.hash(state);
    }
}

impl PartialOrd for TypeReference {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeReference {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.name.cmp(&other.name))
    }
}

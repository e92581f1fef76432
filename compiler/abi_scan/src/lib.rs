//! Text-level scanning of annotated headers.
//!
//! This crate finds export markers in raw header text without a language
//! grammar. It has no `abi_*` dependencies so tooling can reuse it on its own.
//!
//! # Architecture
//!
//! ```text
//! header text
//!     │
//!     ├── LineIndex ─────────────── offset <-> 1-based line
//!     ├── match_scope ───────────── delimiter depth counting
//!     │
//!     ▼
//! AnnotationScanner::scan
//!     │   classify each marker (enum/class/struct/union/function/flags)
//!     │   consume `DEPENDS(..)` clauses
//!     │   strip markers into a new buffer (lines preserved)
//!     ▼
//! NamespaceTable (over the stripped text)
//!     │   innermost enclosing namespace per reference
//!     ▼
//! ScanOutput { references, text, lines, offsets, namespaces }
//! ```
//!
//! Flags blocks (`BEGIN_FLAGS_DECLARATION(Name) ... END_FLAGS_DECLARATION(Name)`)
//! are read by [`read_flags_block`].

mod annotation;
mod flags;
mod line_index;
mod namespace;
mod reference;
mod scope;
mod text;

pub use annotation::{AnnotationScanner, OffsetMap, ScanError, ScanOptions, ScanOutput};
pub use flags::{read_flags_block, FlagEntry, FlagsBlock, FLAGS_BEGIN, FLAGS_END};
pub use line_index::LineIndex;
pub use namespace::{NamespaceLocator, NamespaceSpan, NamespaceTable};
pub use reference::{TokenKind, TypeReference};
pub use scope::{extract_scope, match_scope, ScopeError, ScopeKind};
pub use text::{find_word, is_ident_byte, is_word_at};

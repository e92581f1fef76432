//! Data model shared by every stage of the ABI bridge generator.
//!
//! # Overview
//!
//! ```text
//! abi_scan ──► TypeReference, NamespaceSpan, FlagsBlock   (re-exported)
//! parser   ──► ParsedHeader { classes, enums, flags, usings, includes }
//! resolve  ──► ResourceArena { Resource { Declaration, children, parent } }
//! codegen  ──► reads the arena, never mutates it
//! ```
//!
//! Resources live in a [`ResourceArena`] and refer to each other through
//! [`ResourceId`] handles, so nesting is a forest of indices rather than a
//! web of owning pointers.

use std::path::Path;

mod config;
mod error;
mod parsed;
mod resource;

pub use abi_scan::{
    FlagEntry, FlagsBlock, LineIndex, NamespaceSpan, ScanError, ScanOptions, ScopeError,
    ScopeKind, TokenKind, TypeReference,
};
pub use config::{GenConfig, InheritanceMapping};
pub use error::GenError;
pub use parsed::{
    Access, ClassKind, MethodFlags, ParseFailure, ParsedBase, ParsedClass, ParsedEnum,
    ParsedHeader, ParsedMethod, ParsedParam, ParsedProperty, StructuralParser, UsingAlias,
};
pub use resource::{Declaration, Resource, ResourceArena, ResourceId};

/// Render a relative path with `/` separators, as written in `#include`.
pub fn include_path(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    out
}

/// `CamelCase` to `snake_case`, splitting before every interior capital that
/// follows a lowercase letter or digit, or that starts a new word after an
/// acronym (`HTTPServer` becomes `http_server`).
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(char::is_ascii_lowercase);
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_lower)
            {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// `snake_case` to `CamelCase`, keeping the first letter's case.
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn snake_case_conversion() {
        assert_eq!(snake_case("Point"), "point");
        assert_eq!(snake_case("WidgetFactory"), "widget_factory");
        assert_eq!(snake_case("HTTPServer"), "http_server");
        assert_eq!(snake_case("Vec3Math"), "vec3_math");
        assert_eq!(snake_case("lower"), "lower");
    }

    #[test]
    fn include_paths_use_forward_slashes() {
        let path: std::path::PathBuf = ["api", "core", "widget.h"].iter().collect();
        assert_eq!(include_path(&path), "api/core/widget.h");
    }

    #[test]
    fn camel_case_conversion() {
        assert_eq!(camel_case("frame_count"), "frameCount");
        assert_eq!(camel_case("x"), "x");
        assert_eq!(camel_case("_hidden_value"), "hiddenValue");
    }
}

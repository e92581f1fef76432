//! Fatal generator errors.
//!
//! Anything that should skip a single item is a `tracing::warn!` event
//! instead; a `GenError` always aborts the run.

use std::io;
use std::path::PathBuf;

use crate::{ScanError, ScopeError, TokenKind};

#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error("{}: {source}", path.display())]
    Scan { path: PathBuf, source: ScanError },

    #[error("cannot read header {}: {source}", path.display())]
    ReadHeader { path: PathBuf, source: io::Error },

    #[error(
        "{}: {kind} `{name}` declared at line {line} was not found in the structural parse",
        path.display()
    )]
    MissingDeclaration {
        path: PathBuf,
        name: String,
        line: u32,
        kind: TokenKind,
    },

    #[error(
        "dependency `{dependency}` referred by resource `{resource}` is not found among exported \
         resources; is its declaration missing the export marker?"
    )]
    UnresolvedDependency { dependency: String, resource: String },

    #[error(
        "parameter type `{ty}` of `{class}::{function}` is a function pointer without a `using` \
         alias in the enclosing class; exported signatures must alias function pointer types"
    )]
    UnaliasedFunctionPointer {
        ty: String,
        class: String,
        function: String,
    },

    #[error(
        "namespaces `{first}` and `{second}` both mangle to `{token}`; rename one so exported \
         symbols stay distinct"
    )]
    NamespaceTokenCollision {
        token: String,
        first: String,
        second: String,
    },

    #[error("resource `{resource}` is reached twice while flattening its nesting tree")]
    NestingCycle { resource: String },

    #[error("{}: unbalanced scope while capturing {what}: {source}", path.display())]
    Scope {
        path: PathBuf,
        what: String,
        source: ScopeError,
    },

    #[error("version file {}: {reason}", path.display())]
    MissingVersion { path: PathBuf, reason: String },

    #[error("configuration {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("template `{template}` references unknown variable `${{{variable}}}`")]
    TemplateVariable { template: String, variable: String },

    #[error("cannot read template {}: {source}", path.display())]
    TemplateLoad { path: PathBuf, source: io::Error },

    #[error("cannot write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

//! Source rendering for the ABI bridge generator.
//!
//! Phase 3: reads the resolved [`ResourceGraph`] and produces text
//! artifacts. Nothing here mutates the graph, so nesting trees render
//! independently and in any order.
//!
//! ```text
//! data class / enum / union / flags ──► <api>/<short>.h
//! opaque-handle class tree          ──► <header dir>/_<short>.cpp   (export wrappers)
//!                                       <api>/<short>.h + .cpp     (import proxies)
//! every opaque-handle class         ──► <api>/ioc_traits.h, <engine>/_ioc_traits.cpp,
//!                                       <api>/runtime.h + .cpp, <engine>/build_info.h
//! ```
//!
//! Symbols come from [`Mangler`]; text comes from a [`TemplateRegistry`].

mod build_info;
mod lookup;
mod mangle;
mod render;
mod template;
mod types;

use std::path::PathBuf;

use abi_ir::{GenConfig, GenError, ResourceId};
use abi_resolve::ResourceGraph;

use crate::lookup::IocTable;

pub use build_info::{pack_version, read_version};
pub use mangle::{
    check_namespace_tokens, destructor_symbol, encode_type, namespace_token, Mangler, CONSTRUCTOR_TOKEN, DELETER_SUFFIX,
    DESTRUCTOR_TOKEN,
};
pub use template::{placeholders, TemplateKind, TemplateRegistry, COMMON_VARIABLES};

/// One generated file, relative to the output root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: String,
}

/// Stamped into the build-info header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildInfo {
    /// Packed with [`pack_version`].
    pub version: u64,
    pub revision: String,
}

/// Renders artifacts of one resolved graph.
pub struct Generator<'g> {
    graph: &'g ResourceGraph,
    config: &'g GenConfig,
    templates: &'g TemplateRegistry,
    iocs: IocTable,
    license: String,
}

impl<'g> Generator<'g> {
    pub fn new(
        graph: &'g ResourceGraph,
        config: &'g GenConfig,
        templates: &'g TemplateRegistry,
    ) -> Result<Self, GenError> {
        check_namespace_tokens(
            graph
                .arena
                .iter()
                .filter(|(_, r)| r.is_ioc)
                .map(|(_, r)| r.namespace.name.as_str()),
        )?;
        Ok(Generator {
            graph,
            config,
            templates,
            iocs: IocTable::build(&graph.arena)?,
            license: banner(config.license_header.as_deref()),
        })
    }

    /// Top-level resources, one nesting tree each.
    pub fn roots(&self) -> &[ResourceId] {
        self.graph.arena.roots()
    }

    /// Every opaque-handle resource in aggregate order.
    pub fn ioc_resources(&self) -> &[ResourceId] {
        self.iocs.order()
    }

    /// Files of the nesting tree rooted at `root`.
    #[tracing::instrument(level = "debug", skip(self), fields(resource = %self.graph.arena[root].qualified_name()))]
    pub fn render_tree(&self, root: ResourceId) -> Result<Vec<Artifact>, GenError> {
        let resource = &self.graph.arena[root];
        if !resource.is_ioc {
            return Ok(vec![self.render_declaration(root)?]);
        }
        let mut artifacts = vec![self.render_export(root)?];
        artifacts.extend(self.render_import(root)?);
        tracing::debug!(files = artifacts.len(), "opaque-handle tree rendered");
        Ok(artifacts)
    }

    /// The run-wide files.
    pub fn render_aggregates(&self, build: &BuildInfo) -> Result<Vec<Artifact>, GenError> {
        Ok(vec![
            self.render_type_ids()?,
            self.render_size_table()?,
            self.render_linker_header()?,
            self.render_linker_source()?,
            self.render_build_info(build)?,
        ])
    }

    /// Render `kind` with the common variables added to `vars`.
    fn render(&self, kind: TemplateKind, vars: &[(&str, &str)]) -> Result<String, GenError> {
        let mut all: Vec<(&str, &str)> = vec![
            ("license", &self.license),
            ("runtime", &self.config.runtime_namespace),
            ("export_macro", &self.config.export_macro),
            ("call_macro", &self.config.call_macro),
        ];
        all.extend_from_slice(vars);
        self.templates.render(kind, &all)
    }
}

/// License text as a line-comment block followed by a blank line.
fn banner(license: Option<&str>) -> String {
    let Some(text) = license else {
        return String::new();
    };
    let mut out = String::with_capacity(text.len() + 64);
    for line in text.lines() {
        if line.is_empty() {
            out.push_str("//\n");
        } else {
            out.push_str("// ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push('\n');
    out
}

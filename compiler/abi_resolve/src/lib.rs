//! Resource graph construction.
//!
//! Phase 2 of the generator: takes every header's scan and parse output and
//! builds one dependency-resolved [`ResourceArena`].
//!
//! ```text
//! HeaderUnit*  ──► HeaderBuilder (per header, in input order)
//!                    classify, harvest exported members, nest
//!              ──► ResourceIndex (qualified name → top-level resource)
//!              ──► dependency resolution + include patching (per tree)
//!              ──► inherited-type marking
//! ```
//!
//! Nothing here runs before every header has been processed: a dependency
//! may be exported by a header that comes later in the input.

mod builder;
mod classify;
mod includes;
mod index;

use std::path::PathBuf;

use abi_ir::{
    include_path, GenConfig, GenError, InheritanceMapping, ParsedHeader, ResourceArena, ResourceId,
};
use abi_scan::ScanOutput;
use tracing::{debug, info};

use crate::builder::HeaderBuilder;
use crate::includes::IncludePatcher;

pub use classify::is_ioc;
pub use index::{context_variants, ResourceIndex};

/// Phase-1 output for one header.
#[derive(Clone, Debug)]
pub struct HeaderUnit {
    /// Header path relative to the source tree, e.g. `engine/scene/camera.h`.
    pub path: PathBuf,
    pub scan: ScanOutput,
    /// Parse of `scan.text`.
    pub parsed: ParsedHeader,
}

/// How a base class of an exported class crosses the boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BaseKind<'c> {
    /// Replaced by a configured public type.
    Mapped(&'c InheritanceMapping),
    /// Another exported opaque-handle resource.
    Exported(ResourceId),
    /// Unknown to the generator.
    Foreign,
}

#[derive(Debug)]
pub struct ResourceGraph {
    pub arena: ResourceArena,
    pub index: ResourceIndex,
}

impl ResourceGraph {
    /// Classify `base` as written in a class whose namespace is `context`.
    pub fn base_kind<'c>(&self, config: &'c GenConfig, context: &str, base: &str) -> BaseKind<'c> {
        let mapping = &config.inherited_types_api_mapping;
        if let Some(mapped) = context_variants(context, base)
            .iter()
            .find_map(|candidate| mapping.get(candidate))
        {
            return BaseKind::Mapped(mapped);
        }
        match self.index.resolve(context, base) {
            Some(id) if self.arena[id].is_ioc => BaseKind::Exported(id),
            _ => BaseKind::Foreign,
        }
    }
}

/// Build and resolve the resource graph of a whole run.
#[tracing::instrument(level = "debug", skip_all, fields(headers = units.len()))]
pub fn build_graph(units: &[HeaderUnit], config: &GenConfig) -> Result<ResourceGraph, GenError> {
    let mut arena = ResourceArena::new();
    let mut inherited = Vec::new();
    for unit in units {
        inherited.extend(HeaderBuilder::new(unit, config).build(&mut arena)?);
    }

    let index = ResourceIndex::build(&arena);
    debug!(indexed = index.len(), "resource index built");

    // Dependencies anywhere in a tree land on the root's include list;
    // nested resources render inside their root's files.
    let patcher = IncludePatcher::new(config, &arena);
    let roots = arena.roots().to_vec();
    let mut patched = Vec::with_capacity(roots.len());
    for root in roots {
        let mut dependency_headers = Vec::new();
        for id in arena.ravel(root)? {
            let resource = &arena[id];
            for dependency in &resource.dependencies {
                let target = index
                    .resolve(&resource.namespace.name, dependency)
                    .ok_or_else(|| GenError::UnresolvedDependency {
                        dependency: dependency.clone(),
                        resource: resource.qualified_name(),
                    })?;
                dependency_headers.push(include_path(&arena[target].api_header_path));
            }
        }
        let own = include_path(&arena[root].api_header_path);
        patched.push((root, patcher.patch(&arena[root].includes, &own, &dependency_headers)));
    }
    for (root, includes) in patched {
        arena.get_mut(root).includes = includes;
    }

    for base in &inherited {
        match index.resolve(&base.context, &base.name) {
            Some(id) => {
                debug!(base = %base.name, derived = %base.derived, "marked inherited");
                arena.get_mut(id).is_inherited = true;
            }
            None => debug!(base = %base.name, derived = %base.derived, "base not exported"),
        }
    }

    info!(
        resources = arena.len(),
        roots = arena.roots().len(),
        "resource graph built"
    );
    Ok(ResourceGraph { arena, index })
}

//! Include-list patching.
//!
//! Generated public headers may only include public headers. Internal
//! includes are rewritten to the public headers of whatever the internal
//! header exports followed by any configured inheritance-remap headers, or
//! failing both to the public mirror of a common resource. Anything else
//! internal is dropped.

use rustc_hash::{FxHashMap, FxHashSet};

use abi_ir::{include_path, GenConfig, ResourceArena};

pub(crate) struct IncludePatcher<'a> {
    config: &'a GenConfig,
    /// Internal header to the public headers of its exports, in order.
    exports: FxHashMap<String, Vec<String>>,
}

impl<'a> IncludePatcher<'a> {
    pub(crate) fn new(config: &'a GenConfig, arena: &ResourceArena) -> Self {
        let mut exports: FxHashMap<String, Vec<String>> = FxHashMap::default();
        for &root in arena.roots() {
            let resource = &arena[root];
            exports
                .entry(include_path(&resource.header_path))
                .or_default()
                .push(include_path(&resource.api_header_path));
        }
        IncludePatcher { config, exports }
    }

    /// Patched include list of the resource whose public header is `own`.
    ///
    /// Dependency headers and forced includes are appended; duplicates
    /// collapse keeping the first occurrence.
    pub(crate) fn patch(&self, includes: &[String], own: &str, dependencies: &[String]) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        let mut push = |include: &str| {
            if include != own && seen.insert(include.to_owned()) {
                out.push(include.to_owned());
            }
        };

        for include in includes {
            if !self.config.is_internal_path(include) {
                push(include);
                continue;
            }
            let mut replaced = false;
            if let Some(public) = self.exports.get(include) {
                public.iter().for_each(|p| push(p));
                replaced = true;
            }
            for mapping in self.config.inherited_types_api_mapping.values() {
                if mapping.source_object_header_path == *include {
                    push(&mapping.mapped_object_header_path);
                    replaced = true;
                }
            }
            if replaced {
                continue;
            }
            if self.config.common_resources.iter().any(|c| c == include) {
                push(&self.config.api_path_for(include));
                continue;
            }
            tracing::debug!(include = %include, "internal header exports nothing; dropped");
        }

        dependencies.iter().for_each(|d| push(d));
        self.config.forced_includes.iter().for_each(|f| push(f));
        out
    }
}

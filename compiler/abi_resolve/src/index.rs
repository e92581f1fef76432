//! Global name index and scoped lookup.

use rustc_hash::FxHashMap;

use abi_ir::{ResourceArena, ResourceId};

/// Candidate qualified names for `name` seen from inside `namespace`,
/// innermost first.
///
/// From `a::b`, `c` yields `a::b::c`, `a::c`, `c`; a qualified `q::T`
/// yields `a::b::q::T`, `a::q::T`, `q::T`. A leading `::` pins the lookup
/// to the global namespace.
pub fn context_variants(namespace: &str, name: &str) -> Vec<String> {
    if let Some(global) = name.strip_prefix("::") {
        return vec![global.to_owned()];
    }
    let mut variants = Vec::new();
    let mut scope = namespace;
    while !scope.is_empty() {
        variants.push(format!("{scope}::{name}"));
        scope = scope.rsplit_once("::").map_or("", |(outer, _)| outer);
    }
    variants.push(name.to_owned());
    variants
}

/// Qualified name to top-level resource.
///
/// Built once after every header is processed; read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct ResourceIndex {
    by_name: FxHashMap<String, ResourceId>,
}

impl ResourceIndex {
    pub fn build(arena: &ResourceArena) -> Self {
        let mut by_name = FxHashMap::default();
        for &root in arena.roots() {
            let qualified = arena[root].qualified_name();
            if let Some(previous) = by_name.get(&qualified) {
                tracing::warn!(
                    name = %qualified,
                    first = %arena[*previous].header_path.display(),
                    second = %arena[root].header_path.display(),
                    "resource exported twice; keeping the first"
                );
                continue;
            }
            by_name.insert(qualified, root);
        }
        ResourceIndex { by_name }
    }

    pub fn get(&self, qualified: &str) -> Option<ResourceId> {
        self.by_name.get(qualified).copied()
    }

    /// First context variant of `name` present in the index.
    pub fn resolve(&self, namespace: &str, name: &str) -> Option<ResourceId> {
        context_variants(namespace, name)
            .iter()
            .find_map(|candidate| self.get(candidate))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

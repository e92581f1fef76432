//! Opaque-handle type lookup from type text.

use rustc_hash::FxHashMap;

use abi_ir::{GenError, ResourceArena, ResourceId};
use abi_resolve::context_variants;

use crate::types::base_name;

/// Every opaque-handle resource, nested ones included, by qualified name.
#[derive(Debug, Default)]
pub(crate) struct IocTable {
    by_name: FxHashMap<String, ResourceId>,
    /// Root order, breadth-first within each tree.
    order: Vec<ResourceId>,
}

impl IocTable {
    pub(crate) fn build(arena: &ResourceArena) -> Result<Self, GenError> {
        let order = arena.ioc_resources()?;
        let mut by_name = FxHashMap::default();
        for &id in &order {
            by_name.entry(arena[id].qualified_name()).or_insert(id);
        }
        Ok(IocTable { by_name, order })
    }

    /// Resource named by `ty` (qualifiers, pointers and references
    /// ignored) as seen from inside `namespace`; innermost match wins.
    pub(crate) fn lookup(&self, namespace: &str, ty: &str) -> Option<ResourceId> {
        let name = base_name(ty);
        if name.is_empty() {
            return None;
        }
        context_variants(namespace, &name)
            .iter()
            .find_map(|candidate| self.by_name.get(candidate).copied())
    }

    pub(crate) fn order(&self) -> &[ResourceId] {
        &self.order
    }
}

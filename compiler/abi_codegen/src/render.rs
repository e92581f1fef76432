//! Shared rendering helpers.
//!
//! The per-artifact renderers live in submodules, each adding methods to
//! [`Generator`]:
//!
//! - `declaration`: public headers of data classes, enums, unions, flags
//! - `export`: C-linkage wrappers of an opaque-handle tree
//! - `import`: proxy classes of an opaque-handle tree
//! - `aggregate`: run-wide tables, linker and build info

mod aggregate;
mod declaration;
mod export;
mod import;

use std::fmt::Write;

use abi_ir::{ParsedParam, Resource, ResourceArena, ResourceId};

use crate::types::{self, is_trivial, pointee, unique_ptr_target};
use crate::Generator;

/// How a method's return value crosses the boundary.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ReturnShape {
    /// Primitive, pointer or reference: returned as is.
    Direct,
    /// Raw pointer to an opaque-handle type; rewrapped into its proxy.
    RawIoc(ResourceId),
    /// `std::unique_ptr` to an opaque-handle type; handed back as a
    /// `shared_ptr` carrying the type's deleter.
    UniqueIoc(ResourceId),
    /// Opaque-handle type by value; placement-constructed into caller storage.
    IocObject(ResourceId),
    /// Any other type by value; copy-assigned into an output reference.
    Object,
}

impl ReturnShape {
    /// Whether the C function returns `void` and writes an output parameter.
    pub(crate) fn has_output(self) -> bool {
        matches!(
            self,
            ReturnShape::UniqueIoc(_) | ReturnShape::IocObject(_) | ReturnShape::Object
        )
    }
}

impl Generator<'_> {
    /// Classify `ty` as returned by a method of `owner`.
    pub(crate) fn return_shape(&self, owner: &Resource, ty: &str) -> ReturnShape {
        let context = owner.qualified_name();
        if let Some(target) = unique_ptr_target(ty) {
            if let Some(id) = self.iocs.lookup(&context, &target) {
                return ReturnShape::UniqueIoc(id);
            }
        }
        if is_trivial(ty) {
            return match pointee(ty).and_then(|target| self.iocs.lookup(&context, &target)) {
                Some(id) => ReturnShape::RawIoc(id),
                None => ReturnShape::Direct,
            };
        }
        match self.iocs.lookup(&context, ty) {
            Some(id) => ReturnShape::IocObject(id),
            None => ReturnShape::Object,
        }
    }

    fn resource(&self, id: ResourceId) -> &Resource {
        &self.graph.arena[id]
    }
}

/// Root of the nesting tree containing `id`.
pub(crate) fn tree_root(arena: &ResourceArena, id: ResourceId) -> ResourceId {
    let mut current = id;
    while let Some(parent) = arena[current].parent {
        current = parent;
    }
    current
}

/// Qualified name of `resource` as written inside `namespace`.
pub(crate) fn relative_name(resource: &Resource, namespace: &str) -> String {
    let qualified = resource.qualified_name();
    qualified
        .strip_prefix(namespace)
        .and_then(|rest| rest.strip_prefix("::"))
        .map_or(qualified.clone(), str::to_owned)
}

/// `#include <..>` lines.
pub(crate) fn includes_list<'i>(includes: impl IntoIterator<Item = &'i str>) -> String {
    let mut out = String::new();
    for include in includes {
        let _ = writeln!(out, "#include <{include}>");
    }
    out
}

/// Prefix every non-empty line of `text` with a tab.
pub(crate) fn indent(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    for line in text.lines() {
        if !line.is_empty() {
            out.push('\t');
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

/// Parameter name, synthesized when the declaration omits it.
pub(crate) fn param_name(param: &ParsedParam, index: usize) -> String {
    if param.name.is_empty() {
        format!("param{index}")
    } else {
        param.name.clone()
    }
}

/// Argument forwarding `name` declared with type `ty`.
pub(crate) fn forward(name: &str, ty: &str) -> String {
    if types::is_rvalue_reference(ty) {
        format!("std::move({name})")
    } else {
        name.to_owned()
    }
}

/// Include guard derived from a runtime namespace and a file stem.
pub(crate) fn runtime_guard(runtime: &str, stem: &str) -> String {
    format!(
        "{}_{}_H",
        runtime.replace("::", "_").to_ascii_uppercase(),
        stem.to_ascii_uppercase()
    )
}

/// `snake_case` to `UpperCamel`.
pub(crate) fn upper_camel(name: &str) -> String {
    let camel = abi_ir::camel_case(name);
    let mut chars = camel.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => camel,
    }
}

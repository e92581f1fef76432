//! Exported resources and their arena.

use std::ops::Index;
use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::{FlagsBlock, GenError, NamespaceSpan, ParsedClass, ParsedEnum, ParsedMethod, TokenKind};

/// Index into a [`ResourceArena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ResourceId(u32);

impl ResourceId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        ResourceId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// The structurally parsed record a resource exports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Declaration {
    Class(ParsedClass),
    Enum(ParsedEnum),
    Union(ParsedClass),
    Flags(FlagsBlock),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Class(c) | Declaration::Union(c) => &c.name,
            Declaration::Enum(e) => &e.name,
            Declaration::Flags(f) => &f.name,
        }
    }

    pub fn line(&self) -> u32 {
        match self {
            Declaration::Class(c) | Declaration::Union(c) => c.line,
            Declaration::Enum(e) => e.line,
            Declaration::Flags(f) => f.line,
        }
    }

    pub fn as_class(&self) -> Option<&ParsedClass> {
        match self {
            Declaration::Class(c) => Some(c),
            _ => None,
        }
    }
}

/// One exported declaration with everything rendering needs.
#[derive(Clone, Debug)]
pub struct Resource {
    /// `snake_case` of the declared name; names the generated files.
    pub short_name: String,
    /// Declaring header, relative to the source tree.
    pub header_path: PathBuf,
    /// Parse-ready text of the declaring header.
    pub source: Arc<str>,
    /// Generated public header, relative to the output tree.
    pub api_header_path: PathBuf,
    /// Include list; patched once after the whole graph is known.
    pub includes: Vec<String>,
    pub namespace: NamespaceSpan,
    pub declaration: Declaration,
    pub kind: TokenKind,
    /// Exported methods, constructors and destructors excluded.
    pub methods: Vec<ParsedMethod>,
    pub nested_flags: Vec<FlagsBlock>,
    pub nested_enums: Vec<ParsedEnum>,
    pub nested_unions: Vec<ParsedClass>,
    pub children: Vec<ResourceId>,
    pub parent: Option<ResourceId>,
    /// Dependency names as written in the marker clause.
    pub dependencies: Vec<String>,
    pub is_ioc: bool,
    pub is_inherited: bool,
}

impl Resource {
    pub fn name(&self) -> &str {
        self.declaration.name()
    }

    /// `namespace::Name`
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.namespace.name, self.name())
    }

    pub fn class(&self) -> Option<&ParsedClass> {
        self.declaration.as_class()
    }

    /// Identifier of the resource in the opaque-type enumeration:
    /// `NS_PARTS_SHORT_NAME`.
    pub fn type_id_name(&self) -> String {
        format!(
            "{}_{}",
            self.namespace.screaming_name(),
            self.short_name.to_ascii_uppercase()
        )
    }
}

/// Owner of every resource. Nesting is expressed with ids.
#[derive(Clone, Debug, Default)]
pub struct ResourceArena {
    resources: Vec<Resource>,
    roots: Vec<ResourceId>,
}

impl ResourceArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, resource: Resource) -> ResourceId {
        let id = ResourceId::new(u32::try_from(self.resources.len()).unwrap_or(u32::MAX));
        self.resources.push(resource);
        id
    }

    /// Register a top-level resource.
    pub fn push_root(&mut self, id: ResourceId) {
        self.roots.push(id);
    }

    /// Link `child` under `parent`.
    pub fn adopt(&mut self, parent: ResourceId, child: ResourceId) {
        self.resources[child.index()].parent = Some(parent);
        self.resources[parent.index()].children.push(child);
    }

    #[inline]
    pub fn get(&self, id: ResourceId) -> &Resource {
        &self.resources[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: ResourceId) -> &mut Resource {
        &mut self.resources[id.index()]
    }

    pub fn roots(&self) -> &[ResourceId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &Resource)> {
        self.resources
            .iter()
            .enumerate()
            .map(|(i, r)| (ResourceId::new(u32::try_from(i).unwrap_or(u32::MAX)), r))
    }

    /// Breadth-first flatten of `root` and its descendants.
    ///
    /// Fails on the first revisit, so a malformed nesting graph can never
    /// loop.
    pub fn ravel(&self, root: ResourceId) -> Result<Vec<ResourceId>, GenError> {
        let mut visited = FxHashSet::default();
        let mut order = Vec::new();
        let mut queue = std::collections::VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                return Err(GenError::NestingCycle {
                    resource: self.get(id).qualified_name(),
                });
            }
            order.push(id);
            queue.extend(self.get(id).children.iter().copied());
        }
        Ok(order)
    }

    /// Every opaque-handle resource of every tree, in root order.
    pub fn ioc_resources(&self) -> Result<Vec<ResourceId>, GenError> {
        let mut out = Vec::new();
        for &root in &self.roots {
            out.extend(
                self.ravel(root)?
                    .into_iter()
                    .filter(|id| self.get(*id).is_ioc),
            );
        }
        Ok(out)
    }
}

impl Index<ResourceId> for ResourceArena {
    type Output = Resource;

    fn index(&self, id: ResourceId) -> &Resource {
        self.get(id)
    }
}

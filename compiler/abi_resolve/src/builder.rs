//! Per-header resource construction.
//!
//! Every export marker of a header is consumed at most once. Class markers
//! are matched against namespace-scope records first; member, nested and
//! flags markers are consumed while their owning class is built; whatever
//! remains becomes a flat resource or is reported.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use abi_ir::{
    include_path, snake_case, Access, ClassKind, Declaration, GenConfig, GenError, NamespaceSpan,
    ParsedBase, ParsedClass, Resource, ResourceArena, ResourceId, ScopeKind, TokenKind,
    TypeReference,
};
use abi_scan::{extract_scope, read_flags_block};
use tracing::{debug, warn};

use crate::classify::is_ioc;
use crate::index::context_variants;
use crate::HeaderUnit;

/// A public base recorded while building; resolved once the index exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct InheritedType {
    pub name: String,
    /// Namespace the base name is looked up from.
    pub context: String,
    pub derived: String,
}

/// `<api dir mirroring the header's dir>/<short_name>.h`
pub(crate) fn api_header_path(config: &GenConfig, header: &Path, short_name: &str) -> PathBuf {
    let dir = header.parent().map(include_path).unwrap_or_default();
    PathBuf::from(config.api_path_for(&dir)).join(format!("{short_name}.h"))
}

pub(crate) struct HeaderBuilder<'a> {
    unit: &'a HeaderUnit,
    config: &'a GenConfig,
    source: Arc<str>,
    /// Markers not consumed yet.
    working: BTreeSet<TypeReference>,
    inherited: Vec<InheritedType>,
}

impl<'a> HeaderBuilder<'a> {
    pub(crate) fn new(unit: &'a HeaderUnit, config: &'a GenConfig) -> Self {
        HeaderBuilder {
            unit,
            config,
            source: Arc::from(unit.scan.text.as_str()),
            working: unit.scan.references.clone(),
            inherited: Vec::new(),
        }
    }

    /// Add every resource of the header to `arena`.
    ///
    /// Returns the public bases seen on opaque-handle classes.
    #[tracing::instrument(level = "debug", skip_all, fields(header = %self.unit.path.display()))]
    pub(crate) fn build(mut self, arena: &mut ResourceArena) -> Result<Vec<InheritedType>, GenError> {
        let unit = self.unit;
        let class_refs: Vec<TypeReference> = self
            .working
            .iter()
            .filter(|r| r.kind.is_class_like())
            .cloned()
            .collect();

        for reference in class_refs {
            if !self.working.contains(&reference) {
                continue;
            }
            // Records without a namespace-scope match are nested; their
            // owner consumes them.
            let Some(record) = unit.parsed.classes.iter().find(|c| {
                c.kind != ClassKind::Union && c.name == reference.name && c.line == reference.line
            }) else {
                continue;
            };
            self.working.remove(&reference);
            let id = self.class_resource(
                arena,
                record,
                reference.namespace.clone(),
                reference.kind,
                reference.dependencies.clone(),
            )?;
            arena.push_root(id);
        }

        self.flat_resources(arena)?;
        Ok(self.inherited)
    }

    /// Remove and return the first unconsumed marker matching `pred`.
    fn take(&mut self, pred: impl Fn(&TypeReference) -> bool) -> Option<TypeReference> {
        let found = self.working.iter().find(|&r| pred(r)).cloned()?;
        self.working.remove(&found);
        Some(found)
    }

    fn resource(
        &self,
        name: &str,
        namespace: NamespaceSpan,
        declaration: Declaration,
        kind: TokenKind,
        dependencies: Vec<String>,
    ) -> Resource {
        let short_name = snake_case(name);
        Resource {
            api_header_path: api_header_path(self.config, &self.unit.path, &short_name),
            short_name,
            header_path: self.unit.path.clone(),
            source: Arc::clone(&self.source),
            includes: self.unit.parsed.includes.clone(),
            namespace,
            declaration,
            kind,
            methods: Vec::new(),
            nested_flags: Vec::new(),
            nested_enums: Vec::new(),
            nested_unions: Vec::new(),
            children: Vec::new(),
            parent: None,
            dependencies,
            is_ioc: false,
            is_inherited: false,
        }
    }

    fn class_resource(
        &mut self,
        arena: &mut ResourceArena,
        record: &ParsedClass,
        namespace: NamespaceSpan,
        kind: TokenKind,
        dependencies: Vec<String>,
    ) -> Result<ResourceId, GenError> {
        let mut methods = Vec::new();
        for method in record.public_methods() {
            if self
                .take(|r| r.kind == TokenKind::Function && r.line == method.line)
                .is_none()
            {
                continue;
            }
            // Construction and destruction functions are generated for
            // every class; their markers are only consumed.
            if method.is_constructor() || method.is_destructor() {
                continue;
            }
            methods.push(method.clone());
        }

        let ioc = is_ioc(record, methods.len());
        let mut resource = self.resource(
            &record.name,
            namespace.clone(),
            Declaration::Class(record.clone()),
            kind,
            dependencies,
        );
        resource.methods = methods;
        resource.is_ioc = ioc;

        if !ioc {
            debug!(class = %record.name, "data class");
            return Ok(arena.alloc(resource));
        }
        debug!(
            class = %record.name,
            methods = resource.methods.len(),
            "opaque-handle class"
        );

        for base in record.bases.iter().filter(|b| b.access == Access::Public) {
            self.record_base(&namespace.name, &record.name, base);
        }

        for block in &record.flags {
            if self
                .take(|r| r.kind == TokenKind::Flags && r.name == block.name && r.line == block.line)
                .is_some()
            {
                resource.nested_flags.push(block.clone());
            }
        }
        for decl in record.enums.iter().filter(|e| e.access == Access::Public) {
            if self
                .take(|r| r.kind == TokenKind::Enum && r.name == decl.name && r.line == decl.line)
                .is_some()
            {
                resource.nested_enums.push(decl.clone());
            }
        }

        let mut nested_classes = Vec::new();
        for nested in record.nested.iter().filter(|n| n.access == Access::Public) {
            let wanted = |r: &TypeReference| {
                r.name == nested.name
                    && r.line == nested.line
                    && match nested.kind {
                        ClassKind::Union => r.kind == TokenKind::Union,
                        ClassKind::Class | ClassKind::Struct => r.kind.is_class_like(),
                    }
            };
            let Some(reference) = self.take(wanted) else {
                continue;
            };
            if nested.kind == ClassKind::Union {
                resource.nested_unions.push(nested.clone());
            } else {
                nested_classes.push((nested, reference));
            }
        }

        let id = arena.alloc(resource);
        if !nested_classes.is_empty() {
            let inner = self.class_namespace(&namespace, record)?;
            for (nested, reference) in nested_classes {
                let child = self.class_resource(
                    arena,
                    nested,
                    inner.clone(),
                    reference.kind,
                    reference.dependencies,
                )?;
                arena.adopt(id, child);
            }
        }
        Ok(id)
    }

    /// Synthetic namespace `<outer>::<Class>` spanning the class body.
    fn class_namespace(
        &self,
        outer: &NamespaceSpan,
        record: &ParsedClass,
    ) -> Result<NamespaceSpan, GenError> {
        let (open, close) = extract_scope(&self.source, record.body.start, ScopeKind::Braces)
            .map_err(|source| GenError::Scope {
                path: self.unit.path.clone(),
                what: format!("body of `{}`", record.name),
                source,
            })?;
        let lines = &self.unit.scan.lines;
        Ok(NamespaceSpan {
            name: format!("{}::{}", outer.name, record.name),
            begin_line: lines.line_of(open),
            end_line: lines.line_of(close),
            open,
            close,
        })
    }

    fn record_base(&mut self, context: &str, derived: &str, base: &ParsedBase) {
        let mapping = &self.config.inherited_types_api_mapping;
        if let Some(mapped) = context_variants(context, &base.name)
            .into_iter()
            .find(|candidate| mapping.contains_key(candidate))
        {
            debug!(derived, base = %mapped, "base remapped");
            return;
        }
        self.inherited.push(InheritedType {
            name: base.name.clone(),
            context: context.to_owned(),
            derived: derived.to_owned(),
        });
    }

    /// Enum, union and flags exports plus reporting of everything left.
    fn flat_resources(&mut self, arena: &mut ResourceArena) -> Result<(), GenError> {
        let unit = self.unit;
        let parsed = &unit.parsed;
        let remaining = std::mem::take(&mut self.working);

        for reference in remaining {
            let declaration = match reference.kind {
                TokenKind::Enum => parsed
                    .enums
                    .iter()
                    .find(|e| e.name == reference.name && e.line == reference.line)
                    .cloned()
                    .map(Declaration::Enum),
                TokenKind::Union => parsed
                    .classes
                    .iter()
                    .find(|c| {
                        c.kind == ClassKind::Union
                            && c.name == reference.name
                            && c.line == reference.line
                    })
                    .cloned()
                    .map(Declaration::Union),
                TokenKind::Flags => self.namespace_flags(&reference)?,
                TokenKind::Class | TokenKind::Struct => None,
                TokenKind::Function => {
                    warn!(
                        header = %self.unit.path.display(),
                        function = %reference.name,
                        line = reference.line,
                        "exported function is not a public method of an exported class; skipped"
                    );
                    continue;
                }
            };

            match declaration {
                Some(declaration) => {
                    let resource = self.resource(
                        &reference.name,
                        reference.namespace.clone(),
                        declaration,
                        reference.kind,
                        reference.dependencies.clone(),
                    );
                    debug!(name = %reference.name, kind = %reference.kind, "flat resource");
                    let id = arena.alloc(resource);
                    arena.push_root(id);
                }
                None => self.leftover(&reference)?,
            }
        }
        Ok(())
    }

    fn nested_flags_present(&self, reference: &TypeReference) -> bool {
        self.unit.parsed.all_classes().iter().any(|c| {
            c.flags
                .iter()
                .any(|f| f.name == reference.name && f.line == reference.line)
        })
    }

    fn namespace_flags(&self, reference: &TypeReference) -> Result<Option<Declaration>, GenError> {
        if self.nested_flags_present(reference) {
            return Ok(None);
        }
        let from = self.unit.scan.lines.line_start(reference.line).unwrap_or(0);
        read_flags_block(&self.source, from, &reference.name)
            .map(|block| Some(Declaration::Flags(block)))
            .map_err(|_| self.missing(reference))
    }

    fn missing(&self, reference: &TypeReference) -> GenError {
        GenError::MissingDeclaration {
            path: self.unit.path.clone(),
            name: reference.name.clone(),
            line: reference.line,
            kind: reference.kind,
        }
    }

    /// A marker nothing consumed: skipped when its declaration exists
    /// somewhere unreachable, fatal when it exists nowhere.
    fn leftover(&self, reference: &TypeReference) -> Result<(), GenError> {
        let parsed = &self.unit.parsed;
        let present = match reference.kind {
            TokenKind::Enum => parsed
                .all_enums()
                .any(|e| e.name == reference.name && e.line == reference.line),
            TokenKind::Flags => self.nested_flags_present(reference),
            _ => parsed
                .all_classes()
                .iter()
                .any(|c| c.name == reference.name && c.line == reference.line),
        };
        if !present {
            return Err(self.missing(reference));
        }
        warn!(
            header = %self.unit.path.display(),
            name = %reference.name,
            line = reference.line,
            kind = %reference.kind,
            "exported declaration is not reachable for export; skipped"
        );
        Ok(())
    }
}

//! Template registry.
//!
//! Every artifact is produced by substituting `${name}` placeholders into a
//! template picked by [`TemplateKind`]. Built-in templates ship with the
//! crate; the configuration may replace any of them with a file. `$$` is a
//! literal `$`, and a `$` not starting a placeholder is copied as is.

use std::borrow::Cow;
use std::path::Path;

use rustc_hash::FxHashMap;

use abi_ir::{GenConfig, GenError};

/// Variables every template may use.
pub const COMMON_VARIABLES: &[&str] = &["license", "runtime", "export_macro", "call_macro"];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// Public header of any resource.
    ImportHeader,
    /// Export source file of one nesting tree.
    IocExport,
    /// One opaque-handle class within an export source.
    IocExportSection,
    /// Proxy class declaration.
    IocImportClass,
    /// Import source file of one nesting tree.
    IocImport,
    /// One proxy class within an import source.
    IocImportSection,
    /// Opaque-type identifier enumeration.
    TypeIdHeader,
    /// Export-side size table.
    SizeTable,
    LinkerHeader,
    LinkerSource,
    BuildInfo,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 11] = [
        TemplateKind::ImportHeader,
        TemplateKind::IocExport,
        TemplateKind::IocExportSection,
        TemplateKind::IocImportClass,
        TemplateKind::IocImport,
        TemplateKind::IocImportSection,
        TemplateKind::TypeIdHeader,
        TemplateKind::SizeTable,
        TemplateKind::LinkerHeader,
        TemplateKind::LinkerSource,
        TemplateKind::BuildInfo,
    ];

    /// Key of the template in the configuration's `templates` table.
    pub const fn name(self) -> &'static str {
        match self {
            TemplateKind::ImportHeader => "import_header",
            TemplateKind::IocExport => "ioc_export",
            TemplateKind::IocExportSection => "ioc_export_section",
            TemplateKind::IocImportClass => "ioc_import_class",
            TemplateKind::IocImport => "ioc_import",
            TemplateKind::IocImportSection => "ioc_import_section",
            TemplateKind::TypeIdHeader => "type_id_header",
            TemplateKind::SizeTable => "size_table",
            TemplateKind::LinkerHeader => "linker_header",
            TemplateKind::LinkerSource => "linker_source",
            TemplateKind::BuildInfo => "build_info",
        }
    }

    pub fn from_name(name: &str) -> Option<TemplateKind> {
        TemplateKind::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Kind-specific variables, in addition to [`COMMON_VARIABLES`].
    pub const fn variables(self) -> &'static [&'static str] {
        match self {
            TemplateKind::ImportHeader => &["guard", "includes", "namespace", "declaration"],
            TemplateKind::IocExport => &["exporting_header", "sections"],
            TemplateKind::IocExportSection => {
                &["namespace", "using_declarations", "deleters", "functions"]
            }
            TemplateKind::IocImportClass => &[
                "class_token",
                "class_name",
                "class_qualifier",
                "inheritance_list",
                "fp_using_declarations",
                "flags",
                "enums",
                "unions",
                "nested_forward_declarations",
                "nested_classes",
                "api_methods",
                "accessors",
                "protected_apis",
            ],
            TemplateKind::IocImport => &["api_header", "namespace", "sections"],
            TemplateKind::IocImportSection => &[
                "layout_name",
                "layout_fields",
                "using_declarations",
                "api_pointers",
                "qualified_class",
                "link_calls",
                "link_check",
                "accessor_definitions",
                "method_definitions",
            ],
            TemplateKind::TypeIdHeader => &["guard", "type_ids"],
            TemplateKind::SizeTable => &["includes", "size_cases"],
            TemplateKind::LinkerHeader => &["guard"],
            TemplateKind::LinkerSource => &["runtime_header", "includes", "link_calls"],
            TemplateKind::BuildInfo => &["guard", "version", "revision"],
        }
    }

    pub fn accepts(self, variable: &str) -> bool {
        COMMON_VARIABLES.contains(&variable) || self.variables().contains(&variable)
    }

    const fn builtin(self) -> &'static str {
        match self {
            TemplateKind::ImportHeader => include_str!("../templates/import_header.h.in"),
            TemplateKind::IocExport => include_str!("../templates/ioc_export.cpp.in"),
            TemplateKind::IocExportSection => {
                include_str!("../templates/ioc_export_section.cpp.in")
            }
            TemplateKind::IocImportClass => include_str!("../templates/ioc_import_class.h.in"),
            TemplateKind::IocImport => include_str!("../templates/ioc_import.cpp.in"),
            TemplateKind::IocImportSection => {
                include_str!("../templates/ioc_import_section.cpp.in")
            }
            TemplateKind::TypeIdHeader => include_str!("../templates/ioc_traits.h.in"),
            TemplateKind::SizeTable => include_str!("../templates/ioc_traits.cpp.in"),
            TemplateKind::LinkerHeader => include_str!("../templates/runtime.h.in"),
            TemplateKind::LinkerSource => include_str!("../templates/runtime.cpp.in"),
            TemplateKind::BuildInfo => include_str!("../templates/build_info.h.in"),
        }
    }
}

/// A parsed piece of template text.
#[derive(Debug, PartialEq, Eq)]
enum Segment<'t> {
    Text(&'t str),
    Variable(&'t str),
}

fn is_variable_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(at) = rest.find('$') {
        out.push(Segment::Text(&rest[..at]));
        let after = &rest[at + 1..];
        if let Some(tail) = after.strip_prefix('$') {
            out.push(Segment::Text("$"));
            rest = tail;
        } else if let Some((name, tail)) = after
            .strip_prefix('{')
            .and_then(|inner| inner.split_once('}'))
            .filter(|(name, _)| is_variable_name(name))
        {
            out.push(Segment::Variable(name));
            rest = tail;
        } else {
            out.push(Segment::Text("$"));
            rest = after;
        }
    }
    out.push(Segment::Text(rest));
    out
}

/// Placeholder names used by `text`, in order of appearance.
pub fn placeholders(text: &str) -> Vec<&str> {
    segments(text)
        .into_iter()
        .filter_map(|s| match s {
            Segment::Variable(name) => Some(name),
            Segment::Text(_) => None,
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct TemplateRegistry {
    sources: FxHashMap<TemplateKind, Cow<'static, str>>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateRegistry {
    pub fn builtin() -> Self {
        let sources = TemplateKind::ALL
            .into_iter()
            .map(|kind| (kind, Cow::Borrowed(kind.builtin())))
            .collect();
        TemplateRegistry { sources }
    }

    /// Built-in templates with the configuration's overrides applied.
    ///
    /// Relative override paths resolve against `base`.
    pub fn from_config(config: &GenConfig, base: &Path) -> Result<Self, GenError> {
        let mut registry = Self::builtin();
        for (name, path) in &config.templates {
            let path = base.join(path);
            let Some(kind) = TemplateKind::from_name(name) else {
                return Err(GenError::Config {
                    path,
                    message: format!("unknown template `{name}`"),
                });
            };
            let text = std::fs::read_to_string(&path)
                .map_err(|source| GenError::TemplateLoad { path: path.clone(), source })?;
            registry.set(kind, text)?;
            tracing::debug!(template = name.as_str(), path = %path.display(), "template overridden");
        }
        Ok(registry)
    }

    /// Replace one template; placeholders are checked up front.
    pub fn set(&mut self, kind: TemplateKind, text: String) -> Result<(), GenError> {
        if let Some(unknown) = placeholders(&text).into_iter().find(|v| !kind.accepts(v)) {
            return Err(GenError::TemplateVariable {
                template: kind.name().to_owned(),
                variable: unknown.to_owned(),
            });
        }
        self.sources.insert(kind, Cow::Owned(text));
        Ok(())
    }

    pub fn source(&self, kind: TemplateKind) -> &str {
        self.sources.get(&kind).map_or_else(|| kind.builtin(), |s| s.as_ref())
    }

    /// Substitute `vars` into the template of `kind`.
    ///
    /// Every placeholder must have a value in `vars`.
    pub fn render(&self, kind: TemplateKind, vars: &[(&str, &str)]) -> Result<String, GenError> {
        let source = self.source(kind);
        let mut out = String::with_capacity(source.len() * 2);
        for segment in segments(source) {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Variable(name) => {
                    let Some((_, value)) = vars.iter().find(|(key, _)| *key == name) else {
                        return Err(GenError::TemplateVariable {
                            template: kind.name().to_owned(),
                            variable: name.to_owned(),
                        });
                    };
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

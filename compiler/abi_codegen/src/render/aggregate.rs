//! Run-wide artifacts over every opaque-handle resource.

use std::fmt::Write;
use std::path::PathBuf;

use rustc_hash::FxHashSet;

use abi_ir::{include_path, GenError};

use super::declaration::api_include;
use super::{includes_list, runtime_guard, tree_root};
use crate::template::TemplateKind;
use crate::{Artifact, BuildInfo, Generator};

impl Generator<'_> {
    fn api_path(&self, file: &str) -> PathBuf {
        PathBuf::from(&self.config.api_root).join(file)
    }

    /// Header of the tree roots owning opaque-handle resources, deduplicated
    /// in first-use order.
    fn root_headers(&self, header: impl Fn(&abi_ir::Resource) -> String) -> Vec<String> {
        let arena = &self.graph.arena;
        let mut seen = FxHashSet::default();
        self.iocs
            .order()
            .iter()
            .map(|&id| header(&arena[tree_root(arena, id)]))
            .filter(|h| seen.insert(h.clone()))
            .collect()
    }

    /// `<api>/ioc_traits.h`: the opaque-type identifier enumeration.
    pub(crate) fn render_type_ids(&self) -> Result<Artifact, GenError> {
        let mut type_ids = String::new();
        for &id in self.iocs.order() {
            let _ = writeln!(type_ids, "\t{},", self.resource(id).type_id_name());
        }
        let guard = runtime_guard(&self.config.runtime_namespace, "ioc_traits");
        let contents = self.render(
            TemplateKind::TypeIdHeader,
            &[("guard", &guard), ("type_ids", &type_ids)],
        )?;
        Ok(Artifact {
            path: self.api_path("ioc_traits.h"),
            contents,
        })
    }

    /// `<source>/_ioc_traits.cpp`: native object sizes by type identifier.
    pub(crate) fn render_size_table(&self) -> Result<Artifact, GenError> {
        let mut headers = self.root_headers(|r| include_path(&r.header_path));
        headers.push(include_path(&self.api_path("ioc_traits.h")));
        let includes = includes_list(headers.iter().map(String::as_str));

        let mut size_cases = String::new();
        for &id in self.iocs.order() {
            let resource = self.resource(id);
            let _ = write!(
                size_cases,
                "\tcase ImportedOpaqueClass::{}:\n\t\treturn sizeof({});\n",
                resource.type_id_name(),
                resource.qualified_name()
            );
        }
        let contents = self.render(
            TemplateKind::SizeTable,
            &[("includes", &includes), ("size_cases", &size_cases)],
        )?;
        Ok(Artifact {
            path: PathBuf::from(&self.config.source_root).join("_ioc_traits.cpp"),
            contents,
        })
    }

    /// `<api>/runtime.h`
    pub(crate) fn render_linker_header(&self) -> Result<Artifact, GenError> {
        let guard = runtime_guard(&self.config.runtime_namespace, "runtime");
        let contents = self.render(TemplateKind::LinkerHeader, &[("guard", &guard)])?;
        Ok(Artifact {
            path: self.api_path("runtime.h"),
            contents,
        })
    }

    /// `<api>/runtime.cpp`: links every proxy against one loaded module.
    pub(crate) fn render_linker_source(&self) -> Result<Artifact, GenError> {
        let headers = self.root_headers(api_include);
        let includes = includes_list(headers.iter().map(String::as_str));
        let mut link_calls = String::new();
        for &id in self.iocs.order() {
            let qualified = self.resource(id).qualified_name();
            let _ = writeln!(
                link_calls,
                "\trv.emplace(std::make_pair(std::string{{\"{qualified}\"}}, {qualified}::link(module)));"
            );
        }
        let runtime_header = include_path(&self.api_path("runtime.h"));
        let contents = self.render(
            TemplateKind::LinkerSource,
            &[
                ("runtime_header", &runtime_header),
                ("includes", &includes),
                ("link_calls", &link_calls),
            ],
        )?;
        Ok(Artifact {
            path: self.api_path("runtime.cpp"),
            contents,
        })
    }

    /// `<source>/build_info.h`
    pub(crate) fn render_build_info(&self, build: &BuildInfo) -> Result<Artifact, GenError> {
        let guard = runtime_guard(&self.config.runtime_namespace, "build_info");
        let version = build.version.to_string();
        let revision = escape(&build.revision);
        let contents = self.render(
            TemplateKind::BuildInfo,
            &[
                ("guard", &guard),
                ("version", &version),
                ("revision", &revision),
            ],
        )?;
        Ok(Artifact {
            path: PathBuf::from(&self.config.source_root).join("build_info.h"),
            contents,
        })
    }
}

/// Escape text for a C string literal.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

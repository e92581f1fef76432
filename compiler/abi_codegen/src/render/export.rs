//! Export-side C-linkage wrappers.
//!
//! One source file per nesting tree, compiled into the exporting module. Each
//! opaque-handle class gets a placement-construction function per public
//! constructor, one destructor, a non-exported deleter, and one forwarder per
//! exported method.

use std::collections::BTreeSet;
use std::fmt::Write;

use rustc_hash::FxHashSet;

use abi_ir::{include_path, GenError, ParsedClass, ParsedMethod, Resource, ResourceId};

use super::{forward, param_name, ReturnShape};
use crate::mangle::{destructor_symbol, Mangler, DELETER_SUFFIX};
use crate::template::TemplateKind;
use crate::types::strip_cv;
use crate::{Artifact, Generator};

/// Rendered parameter list and call arguments of one function.
struct Signature {
    /// `T a, U b`
    params: String,
    /// `a, std::move(b)`
    args: String,
}

/// Accumulated text of one export section.
#[derive(Default)]
struct Section {
    functions: String,
    /// Deleters referenced by `unique_ptr` returns.
    deleters: BTreeSet<String>,
    symbols: FxHashSet<String>,
}

impl Section {
    fn note(&mut self, class: &str, symbol: &str) {
        if !self.symbols.insert(symbol.to_owned()) {
            tracing::warn!(
                class,
                symbol,
                "two exported functions mangle to the same symbol; overloads differing only in \
                 method constness cannot both be exported"
            );
        }
    }
}

impl Generator<'_> {
    /// `<header dir>/_<short>.cpp` of the tree rooted at `root`.
    pub(crate) fn render_export(&self, root: ResourceId) -> Result<Artifact, GenError> {
        let arena = &self.graph.arena;
        let root_resource = self.resource(root);
        let mut sections = String::new();
        for id in arena.ravel(root)? {
            let resource = self.resource(id);
            let Some(class) = resource.class().filter(|_| resource.is_ioc) else {
                continue;
            };
            sections.push_str(&self.export_section(root_resource, resource, class)?);
        }

        let exporting_header = include_path(&root_resource.header_path);
        let contents = self.render(
            TemplateKind::IocExport,
            &[
                ("exporting_header", &exporting_header),
                ("sections", &sections),
            ],
        )?;
        let dir = root_resource
            .header_path
            .parent()
            .map(std::path::Path::to_path_buf)
            .unwrap_or_default();
        Ok(Artifact {
            path: dir.join(format!("_{}.cpp", root_resource.short_name)),
            contents,
        })
    }

    fn export_section(
        &self,
        root: &Resource,
        resource: &Resource,
        class: &ParsedClass,
    ) -> Result<String, GenError> {
        let qualified = resource.qualified_name();
        let mut mangler = Mangler::new(&resource.namespace.name, class);
        let mut section = Section::default();

        for constructor in class.constructors() {
            let symbol = mangler.constructor(constructor)?;
            let signature = signature(&mut mangler, constructor)?;
            section.note(&qualified, &symbol);
            let _ = write!(
                section.functions,
                "{export} void {symbol}(void* p_destination{sep}{params})\n\
                 {{\n\
                 \tnew (p_destination) {qualified}{{{args}}};\n\
                 }}\n\n",
                export = self.config.export_macro,
                sep = separator(&signature.params),
                params = signature.params,
                args = signature.args,
            );
        }

        let destructor = mangler.destructor();
        let _ = write!(
            section.functions,
            "{export} void {destructor}(void* p_instance)\n\
             {{\n\
             \treinterpret_cast<{qualified}*>(p_instance)->~{name}();\n\
             }}\n\n\
             void {destructor}{DELETER_SUFFIX}(void* p_instance)\n\
             {{\n\
             \tdelete reinterpret_cast<{qualified}*>(p_instance);\n\
             }}\n\n",
            export = self.config.export_macro,
            name = class.name,
        );

        for method in &resource.methods {
            self.export_method(&mut section, &mut mangler, resource, &qualified, method)?;
        }

        let mut usings = String::new();
        for name in nested_names(resource, &self.graph.arena) {
            let _ = writeln!(usings, "using {name} = {qualified}::{name};");
        }
        for (alias, target) in mangler.used_aliases() {
            let _ = writeln!(usings, "using {alias} = {target};");
        }
        let deleters: String = section
            .deleters
            .iter()
            .map(|d| format!("void {d}(void* p_instance);\n"))
            .collect();

        self.render(
            TemplateKind::IocExportSection,
            &[
                ("namespace", &root.namespace.name),
                ("using_declarations", &usings),
                ("deleters", &deleters),
                ("functions", &section.functions),
            ],
        )
    }

    fn export_method(
        &self,
        section: &mut Section,
        mangler: &mut Mangler<'_>,
        resource: &Resource,
        qualified: &str,
        method: &ParsedMethod,
    ) -> Result<(), GenError> {
        let symbol = mangler.method(method)?;
        section.note(qualified, &symbol);
        let signature = signature(mangler, method)?;
        let shape = self.return_shape(resource, &method.return_type);
        let cv = if method.is_const() { " const" } else { "" };
        let instance = format!("void{cv}* p_instance");
        let call = format!(
            "reinterpret_cast<{qualified}{cv}*>(p_instance)->{}({})",
            method.name, signature.args
        );
        let sep = separator(&signature.params);
        let export = &self.config.export_macro;
        let params = &signature.params;

        let (head, body) = match shape {
            ReturnShape::Direct | ReturnShape::RawIoc(_) => {
                let ret = &method.return_type;
                let keyword = if strip_cv(ret) == "void" { "" } else { "return " };
                (
                    format!("{export} {ret} {symbol}({instance}{sep}{params})"),
                    format!("\t{keyword}{call};\n"),
                )
            }
            ReturnShape::UniqueIoc(target) => {
                let target = self.resource(target);
                let target_name = target.qualified_name();
                let deleter = format!(
                    "{}{DELETER_SUFFIX}",
                    destructor_symbol(&target.namespace.name, target.name())
                );
                let body = format!(
                    "\tauto _temp = {call};\n\
                     \tstd::unique_ptr<{target_name}, void(*)(void*)> _temp1{{_temp.release(), &{deleter}}};\n\
                     \tdestination = std::shared_ptr<{target_name}>{{std::move(_temp1)}};\n"
                );
                section.deleters.insert(deleter);
                (
                    format!(
                        "{export} void {symbol}({instance}, std::shared_ptr<{target_name}>& destination{sep}{params})"
                    ),
                    body,
                )
            }
            ReturnShape::IocObject(target) => {
                let target_name = self.resource(target).qualified_name();
                (
                    format!(
                        "{export} void {symbol}({instance}, {target_name}* p_destination{sep}{params})"
                    ),
                    format!("\tnew (p_destination) {target_name}{{std::move({call})}};\n"),
                )
            }
            ReturnShape::Object => {
                let core = strip_cv(&method.return_type);
                (
                    format!("{export} void {symbol}({instance}, {core}& destination{sep}{params})"),
                    format!("\tdestination = {call};\n"),
                )
            }
        };
        let _ = write!(section.functions, "{head}\n{{\n{body}}}\n\n");
        Ok(())
    }
}

/// `, ` when a parameter list follows a leading parameter.
fn separator(params: &str) -> &'static str {
    if params.is_empty() {
        ""
    } else {
        ", "
    }
}

fn signature(mangler: &mut Mangler<'_>, function: &ParsedMethod) -> Result<Signature, GenError> {
    let mut params = Vec::with_capacity(function.params.len());
    let mut args = Vec::with_capacity(function.params.len());
    for (index, param) in function.params.iter().enumerate() {
        let ty = mangler.signature_type(&function.name, &param.ty)?;
        let name = param_name(param, index);
        args.push(forward(&name, &ty));
        params.push(format!("{ty} {name}"));
    }
    Ok(Signature {
        params: params.join(", "),
        args: args.join(", "),
    })
}

/// Names declared inside `resource` that its signatures may use unqualified.
pub(crate) fn nested_names<'r>(
    resource: &'r Resource,
    arena: &'r abi_ir::ResourceArena,
) -> Vec<&'r str> {
    let mut names: Vec<&str> = Vec::new();
    names.extend(resource.nested_flags.iter().map(|f| f.name.as_str()));
    names.extend(resource.nested_enums.iter().map(|e| e.name.as_str()));
    names.extend(resource.nested_unions.iter().map(|u| u.name.as_str()));
    names.extend(resource.children.iter().map(|&child| arena[child].name()));
    names
}

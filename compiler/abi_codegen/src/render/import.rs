//! Import-side proxy classes.
//!
//! A proxy mirrors one opaque-handle class: it owns only the opaque pointer
//! held by the runtime `Ioc` base and forwards every call through a function
//! pointer bound by `link()`. Nested resources are declared inside their
//! parent's proxy; their definitions come first in the source file.

use std::fmt::Write;

use abi_ir::{
    include_path, Access, GenError, ParsedClass, ParsedMethod, ParsedProperty, Resource,
    ResourceId,
};
use abi_resolve::BaseKind;

use super::declaration::definition_text;
use super::{forward, indent, param_name, relative_name, upper_camel, ReturnShape};
use crate::mangle::Mangler;
use crate::template::TemplateKind;
use crate::types::strip_cv;
use crate::{Artifact, Generator};

/// How the `Ioc` base of a proxy is initialized by one constructor.
enum IocInit<'a> {
    /// Fresh native storage of the proxy's own type.
    TypeId(&'a str),
    /// Adopt an existing native object.
    Pointer,
    /// A base-class subobject of a derived proxy; the most derived
    /// constructor initializes the virtual `Ioc` base.
    FakeConstruction,
}

/// A base class as the proxy derives from it.
struct ProxyBase {
    name: String,
    access: Access,
    is_virtual: bool,
    remapped: bool,
}

/// Rendered text of one proxy.
struct Proxy {
    /// Class declaration, without the trailing `;`.
    declaration: String,
    /// Source sections, nested ones first.
    sources: String,
}

/// Accumulated members of one proxy.
#[derive(Default)]
struct Members {
    declarations: String,
    definitions: String,
    api_pointers: String,
    linked: Vec<String>,
}

impl Members {
    fn link(&mut self, symbol: &str, ret: &str, params: &str, call_macro: &str) {
        let _ = writeln!(
            self.api_pointers,
            "static {ret}({call_macro}* api__{symbol})({params}) = nullptr;"
        );
        self.linked.push(symbol.to_owned());
    }
}

impl Generator<'_> {
    /// `<api>/<short>.h` and `<api>/<short>.cpp` of the tree rooted at `root`.
    pub(crate) fn render_import(&self, root: ResourceId) -> Result<Vec<Artifact>, GenError> {
        let resource = self.resource(root);
        let proxy = self.proxy(root, &resource.namespace.name)?;
        let header = self.import_header(resource, &proxy.declaration)?;

        let api_header = include_path(&resource.api_header_path);
        let source = self.render(
            TemplateKind::IocImport,
            &[
                ("api_header", &api_header),
                ("namespace", &resource.namespace.name),
                ("sections", &proxy.sources),
            ],
        )?;
        Ok(vec![
            Artifact {
                path: resource.api_header_path.clone(),
                contents: header,
            },
            Artifact {
                path: resource.api_header_path.with_extension("cpp"),
                contents: source,
            },
        ])
    }

    /// Proxy of the opaque-handle resource `id`; `namespace` is the namespace
    /// of the tree root, which every definition is written inside.
    fn proxy(&self, id: ResourceId, namespace: &str) -> Result<Proxy, GenError> {
        let resource = self.resource(id);
        let Some(class) = resource.class().filter(|_| resource.is_ioc) else {
            return Ok(Proxy {
                declaration: definition_text(resource).to_owned(),
                sources: String::new(),
            });
        };
        let relative = relative_name(resource, namespace);
        let runtime = &self.config.runtime_namespace;
        let bases = self.proxy_bases(resource, class);
        let mut mangler = Mangler::new(&resource.namespace.name, class);
        let destructor = mangler.destructor();
        let type_id = format!(
            "{runtime}::ImportedOpaqueClass::{}",
            resource.type_id_name()
        );

        let mut members = Members::default();
        let name = &class.name;
        let mut constructors = 0usize;
        for constructor in class.constructors() {
            constructors += 1;
            let symbol = mangler.constructor(constructor)?;
            let signature = proxy_signature(&mut mangler, constructor, runtime)?;
            let _ = writeln!(members.declarations, "\t{name}({});", signature.declared);
            let _ = write!(
                members.definitions,
                "{relative}::{name}({}){}\n{{\n\tapi__{symbol}(getNative(){});\n}}\n\n",
                signature.defined,
                self.init_list(&bases, &destructor, IocInit::TypeId(&type_id)),
                signature.call_tail()
            );
            let params = format!("void*{}", signature.types_tail());
            members.link(&symbol, "void", &params, &self.config.call_macro);
        }

        for method in &resource.methods {
            self.proxy_method(&mut members, &mut mangler, resource, &relative, method)?;
        }

        if constructors == 0 {
            let _ = writeln!(members.declarations, "\t{name}();");
            let _ = write!(
                members.definitions,
                "{relative}::{name}(){}\n{{\n}}\n\n",
                self.init_list(&bases, &destructor, IocInit::TypeId(&type_id))
            );
        }
        let _ = writeln!(
            members.declarations,
            "\texplicit {name}({runtime}::ImportedOpaqueClass type_id);\n\
             \t{name}(std::shared_ptr<{runtime}::Ioc> const& ptr);\n\
             \t{name}({runtime}::Ioc* ptr);\n\
             \t~{name}() = default;"
        );
        let _ = write!(
            members.definitions,
            "{relative}::{name}({runtime}::ImportedOpaqueClass type_id){}\n{{\n}}\n\n\
             {relative}::{name}(std::shared_ptr<{runtime}::Ioc> const& ptr){}\n{{\n}}\n\n\
             {relative}::{name}({runtime}::Ioc* ptr){}\n{{\n}}\n\n",
            self.init_list(&bases, &destructor, IocInit::TypeId("type_id")),
            self.init_list(&bases, &destructor, IocInit::Pointer),
            self.init_list(&bases, &destructor, IocInit::Pointer),
        );
        members.link(&destructor, "void", "void*", &self.config.call_macro);

        let mut protected_apis = String::new();
        if resource.is_inherited {
            let _ = writeln!(protected_apis, "\t{name}({runtime}::FakeConstruction_tag);");
            let _ = write!(
                members.definitions,
                "{relative}::{name}({runtime}::FakeConstruction_tag){}\n{{\n}}\n\n",
                self.init_list(&bases, &destructor, IocInit::FakeConstruction)
            );
        }

        let properties = accessible_properties(resource, class);
        let layout_name = format!("{}Layout", relative.replace("::", "_"));
        let (accessor_declarations, accessor_definitions) =
            accessors(&properties, &relative, &layout_name, runtime);

        // Nested proxies are declared inside this class; their definitions
        // precede this class's section.
        let mut sources = String::new();
        let mut forward_declarations = String::new();
        let mut nested_classes = String::new();
        for &child in &resource.children {
            let child_resource = self.resource(child);
            let keyword = child_resource
                .class()
                .map_or(child_resource.kind.keyword(), |c| c.kind.keyword());
            let _ = writeln!(forward_declarations, "\t{keyword} {};", child_resource.name());
            let nested = self.proxy(child, namespace)?;
            nested_classes.push_str(&indent(&format!("{};", nested.declaration)));
            nested_classes.push('\n');
            sources.push_str(&nested.sources);
        }

        let mut fp_usings = String::new();
        let mut usings = String::new();
        for (alias, target) in mangler.used_aliases() {
            let _ = writeln!(fp_usings, "\tusing {alias} = {target};");
            let _ = writeln!(usings, "using {alias} = {relative}::{alias};");
        }
        for nested in super::export::nested_names(resource, &self.graph.arena) {
            let _ = writeln!(usings, "using {nested} = {relative}::{nested};");
        }

        let flags: String = resource
            .nested_flags
            .iter()
            .map(|f| indent(&format!("{};", f.declaration)) + "\n")
            .collect();
        let enums: String = resource
            .nested_enums
            .iter()
            .map(|e| indent(&format!("{};", e.text)) + "\n")
            .collect();
        let unions: String = resource
            .nested_unions
            .iter()
            .map(|u| indent(&format!("{};", u.text(&resource.source))) + "\n")
            .collect();

        let inheritance_list = inheritance_list(&bases, runtime);
        let class_qualifier = if class.is_final { " final" } else { "" };
        let declaration = self.render(
            TemplateKind::IocImportClass,
            &[
                ("class_token", class.kind.keyword()),
                ("class_name", name),
                ("class_qualifier", class_qualifier),
                ("inheritance_list", &inheritance_list),
                ("fp_using_declarations", &fp_usings),
                ("flags", &flags),
                ("enums", &enums),
                ("unions", &unions),
                ("nested_forward_declarations", &forward_declarations),
                ("nested_classes", &nested_classes),
                ("api_methods", &members.declarations),
                ("accessors", &accessor_declarations),
                ("protected_apis", &protected_apis),
            ],
        )?;

        let layout_fields: String = properties
            .iter()
            .map(|p| format!("\t{} {};\n", const_type(p), p.name))
            .collect();
        let link_calls: String = members
            .linked
            .iter()
            .map(|symbol| {
                format!(
                    "\tapi__{symbol} = reinterpret_cast<decltype(api__{symbol})>(linker.attemptLink(\"{symbol}\"));\n"
                )
            })
            .collect();
        let link_check = members
            .linked
            .iter()
            .map(|symbol| format!("api__{symbol} != nullptr"))
            .collect::<Vec<_>>()
            .join("\n\t\t&& ");
        sources.push_str(&self.render(
            TemplateKind::IocImportSection,
            &[
                ("layout_name", &layout_name),
                ("layout_fields", &layout_fields),
                ("using_declarations", &usings),
                ("api_pointers", &members.api_pointers),
                ("qualified_class", &relative),
                ("link_calls", &link_calls),
                ("link_check", &link_check),
                ("accessor_definitions", &accessor_definitions),
                ("method_definitions", &members.definitions),
            ],
        )?);

        tracing::debug!(
            proxy = %resource.qualified_name(),
            linked = members.linked.len(),
            "proxy rendered"
        );
        Ok(Proxy {
            declaration,
            sources,
        })
    }

    fn proxy_method(
        &self,
        members: &mut Members,
        mangler: &mut Mangler<'_>,
        resource: &Resource,
        relative: &str,
        method: &ParsedMethod,
    ) -> Result<(), GenError> {
        let symbol = mangler.method(method)?;
        let runtime = &self.config.runtime_namespace;
        let signature = proxy_signature(mangler, method, runtime)?;
        let shape = self.return_shape(resource, &method.return_type);
        let cv = if method.is_const() { " const" } else { "" };
        let call_tail = signature.call_tail();
        let written = &method.return_type;

        let (ret, api_ret, output, body) = match shape {
            ReturnShape::Direct => {
                let keyword = if strip_cv(written) == "void" { "" } else { "return " };
                (
                    written.clone(),
                    written.clone(),
                    None,
                    format!("\t{keyword}api__{symbol}(getNative(){call_tail});\n"),
                )
            }
            ReturnShape::RawIoc(target) => {
                let target = self.resource(target).qualified_name();
                let body = format!(
                    "\tvoid* ptr = api__{symbol}(getNative(){call_tail});\n\
                     \treturn {target}{{static_cast<{runtime}::Ioc*>(ptr)}};\n"
                );
                (target, "void*".to_owned(), None, body)
            }
            ReturnShape::UniqueIoc(target) => {
                let target = self.resource(target).qualified_name();
                let body = format!(
                    "\tstd::shared_ptr<{target}> rv{{}};\n\
                     \tapi__{symbol}(getNative(), rv{call_tail});\n\
                     \treturn {target}{{rv}};\n"
                );
                let output = format!("std::shared_ptr<{target}>&");
                (target, "void".to_owned(), Some(output), body)
            }
            ReturnShape::IocObject(target) => {
                let type_id = self.resource(target).type_id_name();
                let core = strip_cv(written);
                let body = format!(
                    "\t{core} rv{{{runtime}::ImportedOpaqueClass::{type_id}}};\n\
                     \tapi__{symbol}(getNative(), rv.getNative(){call_tail});\n\
                     \treturn rv;\n"
                );
                (written.clone(), "void".to_owned(), Some("void*".to_owned()), body)
            }
            ReturnShape::Object => {
                let core = strip_cv(written);
                let body = format!(
                    "\t{core} rv{{}};\n\
                     \tapi__{symbol}(getNative(), rv{call_tail});\n\
                     \treturn rv;\n"
                );
                (written.clone(), "void".to_owned(), Some(format!("{core}&")), body)
            }
        };

        let _ = writeln!(
            members.declarations,
            "\t{ret} {}({}){cv};",
            method.name, signature.declared
        );
        let _ = write!(
            members.definitions,
            "{ret} {relative}::{}({}){cv}\n{{\n{body}}}\n\n",
            method.name, signature.defined
        );
        let mut params = format!("void{cv}*");
        if let Some(output) = output {
            params.push_str(", ");
            params.push_str(&output);
        }
        params.push_str(&signature.types_tail());
        members.link(&symbol, &api_ret, &params, &self.config.call_macro);
        Ok(())
    }

    fn proxy_bases(&self, resource: &Resource, class: &ParsedClass) -> Vec<ProxyBase> {
        class
            .bases
            .iter()
            .map(|base| {
                let kind = self
                    .graph
                    .base_kind(self.config, &resource.namespace.name, &base.name);
                let (name, remapped) = match kind {
                    BaseKind::Mapped(mapping) => (mapping.mapped_object_name.clone(), true),
                    BaseKind::Exported(_) => (base.name.clone(), false),
                    BaseKind::Foreign => {
                        tracing::warn!(
                            class = %resource.qualified_name(),
                            base = %base.name,
                            "base class is neither exported nor remapped; the proxy derives from \
                             it as written"
                        );
                        (base.name.clone(), false)
                    }
                };
                ProxyBase {
                    name,
                    access: base.access,
                    is_virtual: base.is_virtual,
                    remapped,
                }
            })
            .collect()
    }

    fn init_list(&self, bases: &[ProxyBase], destructor: &str, strategy: IocInit<'_>) -> String {
        let runtime = &self.config.runtime_namespace;
        let mut out = match strategy {
            IocInit::TypeId(type_id) => {
                format!("\n\t: {runtime}::Ioc{{{type_id}, api__{destructor}}}")
            }
            IocInit::Pointer => format!("\n\t: {runtime}::Ioc{{ptr}}"),
            IocInit::FakeConstruction => {
                format!("\n\t: {runtime}::Ioc{{{runtime}::FakeConstruction_tag{{}}}}")
            }
        };
        for base in bases {
            if base.remapped {
                let _ = write!(out, "\n\t, {}{{}}", base.name);
            } else {
                let _ = write!(
                    out,
                    "\n\t, {}{{{runtime}::FakeConstruction_tag{{}}}}",
                    base.name
                );
            }
        }
        out
    }
}

/// Public non-static data members; static ones are reported and skipped.
fn accessible_properties<'c>(resource: &Resource, class: &'c ParsedClass) -> Vec<&'c ParsedProperty> {
    class
        .properties
        .iter()
        .filter(|p| p.access == Access::Public)
        .filter(|p| {
            if p.is_static {
                tracing::warn!(
                    class = %resource.qualified_name(),
                    property = %p.name,
                    "static public property is not supported on opaque-handle classes; skipped"
                );
            }
            !p.is_static
        })
        .collect()
}

/// `: virtual public rt::Ioc` or the re-derived base list.
fn inheritance_list(bases: &[ProxyBase], runtime: &str) -> String {
    if bases.is_empty() {
        return format!(": virtual public {runtime}::Ioc");
    }
    let list: Vec<String> = bases
        .iter()
        .map(|b| {
            let virtual_ = if b.is_virtual { " virtual" } else { "" };
            format!("{}{virtual_} {}", b.access.keyword(), b.name)
        })
        .collect();
    format!(": {}", list.join(", "))
}

/// Property type with its constness spelled once.
fn const_type(property: &ParsedProperty) -> String {
    if property.is_const && !has_const(&property.ty) {
        format!("{} const", property.ty)
    } else {
        property.ty.clone()
    }
}

fn has_const(ty: &str) -> bool {
    ty.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .any(|word| word == "const")
}

/// Getter and setter declarations and definitions.
fn accessors(
    properties: &[&ParsedProperty],
    relative: &str,
    layout: &str,
    runtime: &str,
) -> (String, String) {
    let mut declarations = String::new();
    let mut definitions = String::new();
    for property in properties {
        let ty = &property.ty;
        let field = &property.name;
        let upper = upper_camel(field);
        let read_ptr = if property.is_const && has_const(ty) {
            format!("{ty}*")
        } else {
            format!("{ty} const*")
        };
        let _ = writeln!(declarations, "\t{ty} get{upper}() const;");
        let _ = write!(
            definitions,
            "{ty} {relative}::get{upper}() const\n{{\n\
             \treturn *reinterpret_cast<{read_ptr}>(static_cast<uint8_t const*>(getNative()) + offsetof({layout}, {field}));\n\
             }}\n\n"
        );
        if property.is_const {
            continue;
        }
        let value = format!("public_property_type_accessor<{ty}>::value_type");
        let _ = writeln!(declarations, "\tvoid set{upper}({runtime}::{value} value);");
        let _ = write!(
            definitions,
            "void {relative}::set{upper}({runtime}::{value} value)\n{{\n\
             \t*reinterpret_cast<{ty}*>(static_cast<uint8_t*>(getNative()) + offsetof({layout}, {field})) = value;\n\
             }}\n\n"
        );
    }
    (declarations, definitions)
}

/// Proxy-side parameter lists of one function.
struct ProxySignature {
    /// With default arguments, for the class declaration.
    declared: String,
    /// Without defaults, for the out-of-class definition.
    defined: String,
    /// Parameter types only, for the function pointer.
    types: Vec<String>,
    /// `rt::unfold(..)` arguments.
    calls: Vec<String>,
}

impl ProxySignature {
    /// `, a, b` or empty.
    fn call_tail(&self) -> String {
        self.calls.iter().map(|c| format!(", {c}")).collect()
    }

    fn types_tail(&self) -> String {
        self.types.iter().map(|t| format!(", {t}")).collect()
    }
}

fn proxy_signature(
    mangler: &mut Mangler<'_>,
    function: &ParsedMethod,
    runtime: &str,
) -> Result<ProxySignature, GenError> {
    let mut declared = Vec::with_capacity(function.params.len());
    let mut defined = Vec::with_capacity(function.params.len());
    let mut types = Vec::with_capacity(function.params.len());
    let mut calls = Vec::with_capacity(function.params.len());
    for (index, param) in function.params.iter().enumerate() {
        let ty = mangler.signature_type(&function.name, &param.ty)?;
        let name = param_name(param, index);
        calls.push(format!("{runtime}::unfold({})", forward(&name, &ty)));
        defined.push(format!("{ty} {name}"));
        declared.push(match &param.default {
            Some(default) => format!("{ty} {name} = {default}"),
            None => format!("{ty} {name}"),
        });
        types.push(ty);
    }
    Ok(ProxySignature {
        declared: declared.join(", "),
        defined: defined.join(", "),
        types,
        calls,
    })
}

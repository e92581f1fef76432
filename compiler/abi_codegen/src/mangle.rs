//! C-linkage symbol mangling.
//!
//! Every exported function of an opaque-handle class gets a plain C symbol
//! that encodes where it lives and what it takes, so overloads never
//! collide across the boundary.
//!
//! # Mangling Scheme
//!
//! ```text
//! <namespace>XXXX<Class>XXXX<method><params>[_RTNTYPE_<return>]
//! ```
//!
//! Where:
//! - `<namespace>` is the namespace path camel-joined: `a::b::c` is `aBC`
//! - `<method>` is the method name, or `_Ctor` / `_Dtor` for construction
//!   and destruction (reserved identifiers, so no method can produce them)
//! - `<params>` is `YY<type>` per parameter
//! - the return suffix appears only for returns that are not primitive,
//!   pointer or reference types
//!
//! Types are encoded piece by piece:
//!
//! | Piece | Encoding |
//! |-------|----------|
//! | `&&` | `_RVALREF_` |
//! | `&` | `_LVALREF_` |
//! | `*` | `_PTR_` |
//! | `const` | `_CONST_` |
//! | `volatile` | `_VOLATILE_` |
//! | `::` | `_NS_` |
//! | `<` `>` | `_TMPLB_` `_TMPLE_` |
//! | `,` | `_COMMA_` |
//!
//! # Examples
//!
//! | Declaration | Mangled Name |
//! |-------------|--------------|
//! | `project::Widget::spin()` | `projectXXXXWidgetXXXXspin` |
//! | `Widget(int)` | `projectXXXXWidgetXXXX_CtorYYint` |
//! | `~Widget()` | `projectXXXXWidgetXXXX_Dtor` |
//! | `Point at(Point const&)` | `projectXXXXWidgetXXXXatYYPoint_CONST__LVALREF__RTNTYPE_Point` |

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use abi_ir::{GenError, ParsedClass, ParsedMethod};

use crate::types::{self, Piece};

/// Separator between namespace, class and method sections.
const SECTION_SEP: &str = "XXXX";

/// Prefix of every encoded parameter.
const PARAM_MARKER: &str = "YY";

const RETURN_MARKER: &str = "_RTNTYPE_";

pub const CONSTRUCTOR_TOKEN: &str = "_Ctor";
pub const DESTRUCTOR_TOKEN: &str = "_Dtor";

/// Suffix of the non-exported helper that `delete`s a native instance.
pub const DELETER_SUFFIX: &str = "__deleter";

/// `a::b::c` to `aBC`.
///
/// The flattening is lossy: `a::bC` and `aB::c` both give `aBC`. Runs
/// reject such pairs up front with [`check_namespace_tokens`].
pub fn namespace_token(namespace: &str) -> String {
    let mut parts = namespace.split("::").filter(|p| !p.is_empty());
    let mut out = parts.next().unwrap_or_default().to_owned();
    for part in parts {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Fail when two distinct namespaces flatten to the same token.
pub fn check_namespace_tokens<'n>(
    namespaces: impl IntoIterator<Item = &'n str>,
) -> Result<(), GenError> {
    let mut seen: BTreeMap<String, &str> = BTreeMap::new();
    for namespace in namespaces {
        match seen.entry(namespace_token(namespace)) {
            Entry::Vacant(slot) => {
                slot.insert(namespace);
            }
            Entry::Occupied(slot) if *slot.get() != namespace => {
                return Err(GenError::NamespaceTokenCollision {
                    token: slot.key().clone(),
                    first: (*slot.get()).to_owned(),
                    second: namespace.to_owned(),
                });
            }
            Entry::Occupied(_) => {}
        }
    }
    Ok(())
}

/// Encode type text for use inside a symbol.
pub fn encode_type(ty: &str) -> String {
    let mut out = String::with_capacity(ty.len() * 2);
    let mut prev_word = false;
    for piece in types::pieces(ty) {
        match piece {
            Piece::Word("const") => {
                out.push_str("_CONST_");
                prev_word = false;
            }
            Piece::Word("volatile") => {
                out.push_str("_VOLATILE_");
                prev_word = false;
            }
            Piece::Word(word) => {
                if prev_word {
                    out.push('_');
                }
                out.push_str(word);
                prev_word = true;
            }
            Piece::Punct(punct) => {
                encode_punct(&mut out, punct);
                prev_word = false;
            }
        }
    }
    out
}

fn encode_punct(out: &mut String, punct: &str) {
    match punct {
        "&&" => out.push_str("_RVALREF_"),
        "&" => out.push_str("_LVALREF_"),
        "*" => out.push_str("_PTR_"),
        "::" => out.push_str("_NS_"),
        "<" => out.push_str("_TMPLB_"),
        ">" => out.push_str("_TMPLE_"),
        "," => out.push_str("_COMMA_"),
        other => {
            for c in other.chars() {
                let _ = write!(out, "_X{:02X}_", c as u32);
            }
        }
    }
}

/// Destructor symbol of `class_name` declared in `namespace`.
pub fn destructor_symbol(namespace: &str, class_name: &str) -> String {
    format!(
        "{}{SECTION_SEP}{class_name}{SECTION_SEP}{DESTRUCTOR_TOKEN}",
        namespace_token(namespace)
    )
}

/// Mangler for the functions of one class.
///
/// Function-pointer parameters are replaced by the class's `using` alias
/// naming them; every alias used that way is remembered so renderers can
/// re-declare it next to the generated signatures.
#[derive(Debug)]
pub struct Mangler<'c> {
    namespace: &'c str,
    class: &'c ParsedClass,
    used_aliases: BTreeSet<(String, String)>,
}

impl<'c> Mangler<'c> {
    pub fn new(namespace: &'c str, class: &'c ParsedClass) -> Self {
        Mangler {
            namespace,
            class,
            used_aliases: BTreeSet::new(),
        }
    }

    /// Parameter type as it must be spelled in generated signatures.
    pub fn signature_type(&mut self, function: &str, ty: &str) -> Result<String, GenError> {
        if !types::is_function_pointer(ty) {
            return Ok(ty.to_owned());
        }
        match self.class.alias_for(ty) {
            Some(alias) => {
                self.used_aliases
                    .insert((alias.alias.clone(), alias.target.clone()));
                Ok(alias.alias.clone())
            }
            None => Err(GenError::UnaliasedFunctionPointer {
                ty: ty.to_owned(),
                class: self.class.name.clone(),
                function: function.to_owned(),
            }),
        }
    }

    pub fn method(&mut self, method: &ParsedMethod) -> Result<String, GenError> {
        let mut symbol = self.prefix();
        symbol.push_str(&method.name);
        self.push_params(&mut symbol, method)?;
        if !types::is_trivial(&method.return_type) {
            symbol.push_str(RETURN_MARKER);
            symbol.push_str(&encode_type(&method.return_type));
        }
        Ok(symbol)
    }

    pub fn constructor(&mut self, constructor: &ParsedMethod) -> Result<String, GenError> {
        let mut symbol = self.prefix();
        symbol.push_str(CONSTRUCTOR_TOKEN);
        self.push_params(&mut symbol, constructor)?;
        Ok(symbol)
    }

    pub fn destructor(&self) -> String {
        destructor_symbol(self.namespace, &self.class.name)
    }

    /// `(alias, target)` pairs substituted so far, sorted by alias.
    pub fn used_aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.used_aliases
            .iter()
            .map(|(alias, target)| (alias.as_str(), target.as_str()))
    }

    fn prefix(&self) -> String {
        let mut out = String::with_capacity(64);
        out.push_str(&namespace_token(self.namespace));
        out.push_str(SECTION_SEP);
        out.push_str(&self.class.name);
        out.push_str(SECTION_SEP);
        out
    }

    fn push_params(&mut self, symbol: &mut String, function: &ParsedMethod) -> Result<(), GenError> {
        for param in &function.params {
            let ty = self.signature_type(&function.name, &param.ty)?;
            symbol.push_str(PARAM_MARKER);
            symbol.push_str(&encode_type(&ty));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;

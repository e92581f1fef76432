//! Structural parse contract.
//!
//! Whatever parses the header text hands the generator these records. Lines
//! are 1-based and must agree with the scanner's line numbers; byte ranges
//! index into the parse-ready text the parser was given.

use std::ops::Range;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::FlagsBlock;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Access {
    Public,
    Protected,
    Private,
}

impl Access {
    pub const fn keyword(self) -> &'static str {
        match self {
            Access::Public => "public",
            Access::Protected => "protected",
            Access::Private => "private",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Struct,
    Union,
}

impl ClassKind {
    pub const fn keyword(self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Struct => "struct",
            ClassKind::Union => "union",
        }
    }

    /// Access of members declared before any access specifier.
    pub const fn default_access(self) -> Access {
        match self {
            ClassKind::Class => Access::Private,
            ClassKind::Struct | ClassKind::Union => Access::Public,
        }
    }
}

bitflags! {
    /// Method qualifiers relevant to classification and rendering.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MethodFlags: u16 {
        const CONST = 1 << 0;
        const VIRTUAL = 1 << 1;
        const OVERRIDE = 1 << 2;
        const FINAL = 1 << 3;
        const PURE_VIRTUAL = 1 << 4;
        const CONSTRUCTOR = 1 << 5;
        const DESTRUCTOR = 1 << 6;
        const DELETED = 1 << 7;
        const STATIC = 1 << 8;
        const DEFAULTED = 1 << 9;
    }
}

impl MethodFlags {
    /// Any qualifier that forces a class onto the opaque-handle path.
    pub const POLYMORPHIC: MethodFlags = MethodFlags::VIRTUAL
        .union(MethodFlags::OVERRIDE)
        .union(MethodFlags::FINAL)
        .union(MethodFlags::PURE_VIRTUAL);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedParam {
    /// Type text as written, whitespace-normalized.
    pub ty: String,
    /// Parameter name; empty when the declaration omits it.
    pub name: String,
    pub default: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedMethod {
    pub name: String,
    pub params: Vec<ParsedParam>,
    /// Empty for constructors and destructors.
    pub return_type: String,
    pub line: u32,
    pub access: Access,
    pub flags: MethodFlags,
}

impl ParsedMethod {
    #[inline]
    pub fn is_const(&self) -> bool {
        self.flags.contains(MethodFlags::CONST)
    }

    #[inline]
    pub fn is_constructor(&self) -> bool {
        self.flags.contains(MethodFlags::CONSTRUCTOR)
    }

    #[inline]
    pub fn is_destructor(&self) -> bool {
        self.flags.contains(MethodFlags::DESTRUCTOR)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedProperty {
    pub name: String,
    pub ty: String,
    pub line: u32,
    pub access: Access,
    pub is_const: bool,
    pub is_static: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedBase {
    /// Base name as written, possibly qualified.
    pub name: String,
    pub access: Access,
    pub is_virtual: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedEnum {
    pub name: String,
    pub line: u32,
    pub access: Access,
    /// Declaration text from `enum` through the closing brace.
    pub text: String,
    pub span: Range<usize>,
}

/// `using Alias = Target;`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UsingAlias {
    pub alias: String,
    pub target: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedClass {
    pub name: String,
    pub kind: ClassKind,
    pub line: u32,
    /// Access within the enclosing class; `Public` at namespace scope.
    pub access: Access,
    pub is_final: bool,
    pub bases: SmallVec<[ParsedBase; 2]>,
    pub methods: Vec<ParsedMethod>,
    pub properties: Vec<ParsedProperty>,
    /// Nested classes, structs and unions.
    pub nested: Vec<ParsedClass>,
    pub enums: Vec<ParsedEnum>,
    pub flags: Vec<FlagsBlock>,
    pub usings: Vec<UsingAlias>,
    /// From the class keyword through the closing brace.
    pub span: Range<usize>,
    /// Offsets of the body's opening and closing braces.
    pub body: Range<usize>,
}

impl ParsedClass {
    pub fn public_methods(&self) -> impl Iterator<Item = &ParsedMethod> {
        self.methods.iter().filter(|m| m.access == Access::Public)
    }

    /// Public, non-deleted constructors named after the class.
    pub fn constructors(&self) -> impl Iterator<Item = &ParsedMethod> {
        self.public_methods().filter(|m| {
            m.is_constructor() && m.name == self.name && !m.flags.contains(MethodFlags::DELETED)
        })
    }

    /// Text of the whole declaration within `source`.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.span.clone()).unwrap_or_default()
    }

    /// Alias naming `target`, compared without whitespace.
    pub fn alias_for(&self, target: &str) -> Option<&UsingAlias> {
        let wanted = squash(target);
        self.usings.iter().find(|u| squash(&u.target) == wanted)
    }
}

fn squash(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Everything the parser found in one header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedHeader {
    /// Namespace-scope classes, structs and unions.
    pub classes: Vec<ParsedClass>,
    pub enums: Vec<ParsedEnum>,
    pub flags: Vec<FlagsBlock>,
    pub usings: Vec<UsingAlias>,
    /// Include targets as written between `<>` or `""`.
    pub includes: Vec<String>,
}

impl ParsedHeader {
    /// Depth-first walk over every class record, nested ones included.
    pub fn all_classes(&self) -> Vec<&ParsedClass> {
        let mut out = Vec::new();
        let mut stack: Vec<&ParsedClass> = self.classes.iter().rev().collect();
        while let Some(class) = stack.pop() {
            out.push(class);
            stack.extend(class.nested.iter().rev());
        }
        out
    }

    /// Every enum record, nested ones included.
    pub fn all_enums(&self) -> impl Iterator<Item = &ParsedEnum> {
        self.enums
            .iter()
            .chain(self.all_classes().into_iter().flat_map(|c| c.enums.iter()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ParseFailure {
    pub line: u32,
    pub message: String,
}

/// Structural parser seam.
///
/// The generator never parses declarations itself; it asks an implementation
/// of this trait. Implementations must be usable from several threads.
pub trait StructuralParser: Sync {
    fn parse(&self, source: &str) -> Result<ParsedHeader, ParseFailure>;
}

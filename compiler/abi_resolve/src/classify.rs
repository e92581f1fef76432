//! Opaque-handle classification.

use abi_ir::{Access, MethodFlags, ParsedClass};

/// Whether `class` must cross the boundary as an opaque handle.
///
/// Anything with behavior or hidden state does: exported methods, bases,
/// non-public data, polymorphic methods, or a user-declared constructor.
/// Everything else is plain data and is re-declared verbatim.
pub fn is_ioc(class: &ParsedClass, exported_methods: usize) -> bool {
    exported_methods > 0
        || !class.bases.is_empty()
        || class.properties.iter().any(|p| p.access != Access::Public)
        || class.methods.iter().any(|m| {
            m.flags.intersects(MethodFlags::POLYMORPHIC)
                || (m.is_constructor() && m.name == class.name)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use abi_ir::{ClassKind, ParsedBase, ParsedMethod, ParsedProperty};
    use smallvec::SmallVec;

    fn data(name: &str) -> ParsedClass {
        ParsedClass {
            name: name.to_owned(),
            kind: ClassKind::Struct,
            line: 1,
            access: Access::Public,
            is_final: false,
            bases: SmallVec::new(),
            methods: Vec::new(),
            properties: vec![ParsedProperty {
                name: "x".to_owned(),
                ty: "int".to_owned(),
                line: 1,
                access: Access::Public,
                is_const: false,
                is_static: false,
            }],
            nested: Vec::new(),
            enums: Vec::new(),
            flags: Vec::new(),
            usings: Vec::new(),
            span: 0..0,
            body: 0..0,
        }
    }

    fn method(name: &str, flags: MethodFlags) -> ParsedMethod {
        ParsedMethod {
            name: name.to_owned(),
            params: Vec::new(),
            return_type: String::new(),
            line: 2,
            access: Access::Public,
            flags,
        }
    }

    #[test]
    fn plain_struct_is_data() {
        assert!(!is_ioc(&data("Point"), 0));
    }

    #[test]
    fn exported_method_makes_ioc() {
        assert!(is_ioc(&data("Point"), 1));
    }

    #[test]
    fn base_or_hidden_state_makes_ioc() {
        let mut derived = data("Derived");
        derived.bases.push(ParsedBase {
            name: "Base".to_owned(),
            access: Access::Public,
            is_virtual: false,
        });
        assert!(is_ioc(&derived, 0));

        let mut hidden = data("Hidden");
        hidden.properties[0].access = Access::Private;
        assert!(is_ioc(&hidden, 0));
    }

    #[test]
    fn constructors_and_virtuals_make_ioc() {
        let mut with_ctor = data("Thing");
        with_ctor
            .methods
            .push(method("Thing", MethodFlags::CONSTRUCTOR));
        assert!(is_ioc(&with_ctor, 0));

        let mut with_virtual = data("Thing");
        with_virtual.methods.push(method("run", MethodFlags::VIRTUAL));
        assert!(is_ioc(&with_virtual, 0));

        let mut plain_method = data("Thing");
        plain_method.methods.push(method("len", MethodFlags::CONST));
        assert!(!is_ioc(&plain_method, 0));
    }
}

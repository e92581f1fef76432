//! Property tests for classification and scoped lookup.

#![allow(
    clippy::disallowed_types,
    clippy::redundant_closure_for_method_calls,
    reason = "Proptest macros generate code with these patterns"
)]

use abi_ir::{Access, ClassKind, MethodFlags, ParsedBase, ParsedClass, ParsedMethod, ParsedProperty};
use abi_resolve::{context_variants, is_ioc};
use proptest::prelude::*;
use smallvec::SmallVec;

fn access() -> impl Strategy<Value = Access> {
    prop_oneof![
        Just(Access::Public),
        Just(Access::Protected),
        Just(Access::Private)
    ]
}

fn method_flags() -> impl Strategy<Value = MethodFlags> {
    (0u16..1024).prop_map(MethodFlags::from_bits_truncate)
}

fn class_strategy() -> impl Strategy<Value = (ParsedClass, usize)> {
    (
        prop::collection::vec(access(), 0..3),
        prop::collection::vec(access(), 0..4),
        prop::collection::vec(method_flags(), 0..4),
        0usize..3,
    )
        .prop_map(|(bases, props, methods, exported)| {
            let class = ParsedClass {
                name: "Subject".to_owned(),
                kind: ClassKind::Class,
                line: 1,
                access: Access::Public,
                is_final: false,
                bases: bases
                    .into_iter()
                    .enumerate()
                    .map(|(i, access)| ParsedBase {
                        name: format!("Base{i}"),
                        access,
                        is_virtual: false,
                    })
                    .collect::<SmallVec<[ParsedBase; 2]>>(),
                methods: methods
                    .into_iter()
                    .enumerate()
                    .map(|(i, flags)| ParsedMethod {
                        name: if flags.contains(MethodFlags::CONSTRUCTOR) {
                            "Subject".to_owned()
                        } else {
                            format!("m{i}")
                        },
                        params: Vec::new(),
                        return_type: String::new(),
                        line: 2,
                        access: Access::Public,
                        flags,
                    })
                    .collect(),
                properties: props
                    .into_iter()
                    .enumerate()
                    .map(|(i, access)| ParsedProperty {
                        name: format!("p{i}"),
                        ty: "int".to_owned(),
                        line: 3,
                        access,
                        is_const: false,
                        is_static: false,
                    })
                    .collect(),
                nested: Vec::new(),
                enums: Vec::new(),
                flags: Vec::new(),
                usings: Vec::new(),
                span: 0..0,
                body: 0..0,
            };
            (class, exported)
        })
}

fn ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,5}"
}

proptest! {
    /// Adding a member or trigger never turns an opaque-handle class back
    /// into data, and adding a trigger always makes one.
    #[test]
    fn classification_is_monotone((class, exported) in class_strategy(), which in 0usize..6) {
        let before = is_ioc(&class, exported);
        let mut grown = class.clone();
        let mut exported_after = exported;
        let trigger = which < 4;
        match which {
            0 => exported_after += 1,
            1 => grown.bases.push(ParsedBase {
                name: "Extra".to_owned(),
                access: Access::Public,
                is_virtual: false,
            }),
            2 | 4 => grown.properties.push(ParsedProperty {
                name: "extra".to_owned(),
                ty: "int".to_owned(),
                line: 9,
                access: if which == 2 { Access::Private } else { Access::Public },
                is_const: false,
                is_static: false,
            }),
            _ => grown.methods.push(ParsedMethod {
                name: "run".to_owned(),
                params: Vec::new(),
                return_type: "void".to_owned(),
                line: 9,
                access: Access::Public,
                flags: if which == 3 { MethodFlags::VIRTUAL } else { MethodFlags::CONST },
            }),
        }
        let after = is_ioc(&grown, exported_after);
        prop_assert!(!before || after);
        if trigger {
            prop_assert!(after);
        }
    }

    /// Variants go from most to least qualified and end at the bare name.
    #[test]
    fn variants_shrink_outward(parts in prop::collection::vec(ident(), 0..4), name in ident()) {
        let namespace = parts.join("::");
        let variants = context_variants(&namespace, &name);
        prop_assert_eq!(variants.len(), parts.len() + 1);
        prop_assert_eq!(variants.last(), Some(&name));
        let suffix = format!("::{name}");
        for pair in variants.windows(2) {
            prop_assert!(pair[0].len() > pair[1].len());
            prop_assert!(pair[0].ends_with(&suffix));
        }
        if !parts.is_empty() {
            prop_assert_eq!(&variants[0], &format!("{namespace}::{name}"));
        }
    }
}

use super::*;
use abi_ir::{Access, ClassKind, MethodFlags, ParsedParam, UsingAlias};
use pretty_assertions::assert_eq;
use smallvec::SmallVec;

fn class(name: &str, usings: &[(&str, &str)]) -> ParsedClass {
    ParsedClass {
        name: name.to_owned(),
        kind: ClassKind::Class,
        line: 1,
        access: Access::Public,
        is_final: false,
        bases: SmallVec::new(),
        methods: Vec::new(),
        properties: Vec::new(),
        nested: Vec::new(),
        enums: Vec::new(),
        flags: Vec::new(),
        usings: usings
            .iter()
            .map(|(alias, target)| UsingAlias {
                alias: (*alias).to_owned(),
                target: (*target).to_owned(),
            })
            .collect(),
        span: 0..0,
        body: 0..0,
    }
}

fn method(name: &str, ret: &str, params: &[&str]) -> ParsedMethod {
    ParsedMethod {
        name: name.to_owned(),
        params: params
            .iter()
            .enumerate()
            .map(|(i, ty)| ParsedParam {
                ty: (*ty).to_owned(),
                name: format!("p{i}"),
                default: None,
            })
            .collect(),
        return_type: ret.to_owned(),
        line: 1,
        access: Access::Public,
        flags: MethodFlags::empty(),
    }
}

fn mangle(namespace: &str, m: &ParsedMethod) -> String {
    let widget = class("Widget", &[]);
    match Mangler::new(namespace, &widget).method(m) {
        Ok(symbol) => symbol,
        Err(err) => panic!("mangling failed: {err}"),
    }
}

#[test]
fn namespace_tokens() {
    assert_eq!(namespace_token("project"), "project");
    assert_eq!(namespace_token("project::scene::detail"), "projectSceneDetail");
    assert_eq!(namespace_token(""), "");
}

#[test]
fn colliding_namespace_tokens_are_rejected() {
    assert_eq!(namespace_token("a::bC"), namespace_token("aB::c"));
    match check_namespace_tokens(["project::scene", "a::bC", "project::scene", "aB::c"]) {
        Err(GenError::NamespaceTokenCollision {
            token,
            first,
            second,
        }) => {
            assert_eq!(token, "aBC");
            assert_eq!(first, "a::bC");
            assert_eq!(second, "aB::c");
        }
        other => panic!("expected a collision, got {other:?}"),
    }
    assert!(check_namespace_tokens(["project", "project::scene", "project::Widget"]).is_ok());
}

#[test]
fn type_encoding() {
    assert_eq!(encode_type("int"), "int");
    assert_eq!(encode_type("Point const&"), "Point_CONST__LVALREF_");
    assert_eq!(encode_type("Point&&"), "Point_RVALREF_");
    assert_eq!(encode_type("char const*"), "char_CONST__PTR_");
    assert_eq!(encode_type("unsigned int"), "unsigned_int");
    assert_eq!(
        encode_type("std::map<int, float>"),
        "std_NS_map_TMPLB_int_COMMA_float_TMPLE_"
    );
    assert_eq!(encode_type("float[4]"), "float_X5B_4_X5D_");
}

#[test]
fn method_layout() {
    assert_eq!(
        mangle("project", &method("spin", "void", &[])),
        "projectXXXXWidgetXXXXspin"
    );
    assert_eq!(
        mangle("project::scene", &method("move", "void", &["float", "float"])),
        "projectSceneXXXXWidgetXXXXmoveYYfloatYYfloat"
    );
}

#[test]
fn non_trivial_returns_are_encoded() {
    assert_eq!(
        mangle("project", &method("at", "Point", &["Point const&"])),
        "projectXXXXWidgetXXXXatYYPoint_CONST__LVALREF__RTNTYPE_Point"
    );
    assert_eq!(
        mangle("project", &method("size", "size_t", &[])),
        "projectXXXXWidgetXXXXsize"
    );
    assert_eq!(
        mangle("project", &method("origin", "Point const&", &[])),
        "projectXXXXWidgetXXXXorigin"
    );
}

#[test]
fn construction_tokens() {
    let widget = class("Widget", &[]);
    let mut mangler = Mangler::new("project", &widget);
    let Ok(default) = mangler.constructor(&method("Widget", "", &[])) else {
        panic!("constructor mangling failed");
    };
    assert_eq!(default, "projectXXXXWidgetXXXX_Ctor");
    assert_eq!(mangler.destructor(), "projectXXXXWidgetXXXX_Dtor");
    assert_eq!(
        destructor_symbol("project::scene", "Camera"),
        "projectSceneXXXXCameraXXXX_Dtor"
    );
}

#[test]
fn distinct_declarations_get_distinct_symbols() {
    let widget = class("Widget", &[]);
    let mut mangler = Mangler::new("project", &widget);
    let symbols = [
        mangler.method(&method("set", "void", &["Point&"])),
        mangler.method(&method("set", "void", &["Point const&"])),
        mangler.method(&method("set", "void", &["Point&&"])),
        mangler.method(&method("set", "void", &["Point*"])),
        mangler.constructor(&method("Widget", "", &["int"])),
        mangler.constructor(&method("Widget", "", &["int", "int"])),
        mangler.constructor(&method("Widget", "", &["unsigned int"])),
    ];
    let mut seen = BTreeSet::new();
    for symbol in symbols {
        let Ok(symbol) = symbol else {
            panic!("mangling failed");
        };
        assert!(seen.insert(symbol.clone()), "duplicate symbol {symbol}");
    }

    assert_ne!(
        mangle("project::a", &method("spin", "void", &[])),
        mangle("project::b", &method("spin", "void", &[]))
    );
}

#[test]
fn function_pointers_use_class_aliases() {
    let widget = class("Widget", &[("Callback", "void(*)(int)")]);
    let mut mangler = Mangler::new("project", &widget);
    let Ok(symbol) = mangler.method(&method("listen", "void", &["void (*)(int)"])) else {
        panic!("aliased function pointer was rejected");
    };
    assert_eq!(symbol, "projectXXXXWidgetXXXXlistenYYCallback");
    let used: Vec<(&str, &str)> = mangler.used_aliases().collect();
    assert_eq!(used, vec![("Callback", "void(*)(int)")]);
}

#[test]
fn unaliased_function_pointer_is_fatal() {
    let widget = class("Widget", &[]);
    let mut mangler = Mangler::new("project", &widget);
    let err = mangler.method(&method("listen", "void", &["void(*)(int)"]));
    assert!(matches!(
        err,
        Err(GenError::UnaliasedFunctionPointer { ref class, ref function, .. })
            if class == "Widget" && function == "listen"
    ));
}

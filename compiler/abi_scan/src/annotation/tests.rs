use super::*;
use pretty_assertions::assert_eq;

fn options() -> ScanOptions {
    ScanOptions {
        namespace_prefix: "project".to_owned(),
        ..ScanOptions::default()
    }
}

fn scan(source: &str) -> ScanOutput {
    let options = options();
    match AnnotationScanner::new(&options).scan(source) {
        Ok(out) => out,
        Err(err) => panic!("scan failed: {err}"),
    }
}

fn refs(out: &ScanOutput) -> Vec<(String, u32, TokenKind)> {
    out.references
        .iter()
        .map(|r| (r.name.clone(), r.line, r.kind))
        .collect()
}

#[test]
fn data_struct() {
    let out = scan("namespace project {\nstruct EXPORT Point { int x; int y; };\n}\n");
    assert_eq!(refs(&out), vec![("Point".to_owned(), 2, TokenKind::Struct)]);
    assert_eq!(
        out.text,
        "namespace project {\nstruct Point { int x; int y; };\n}\n"
    );
    let point = out.references.iter().next().map(|r| r.namespace.name.clone());
    assert_eq!(point.as_deref(), Some("project"));
}

#[test]
fn class_with_methods_and_constructor() {
    let src = "namespace project {\n\
               class EXPORT Widget {\n\
               public:\n\
               \x20   EXPORT Widget();\n\
               \x20   EXPORT virtual void spin();\n\
               \x20   EXPORT ~Widget();\n\
               };\n\
               }\n";
    let out = scan(src);
    assert_eq!(
        refs(&out),
        vec![
            ("Widget".to_owned(), 2, TokenKind::Class),
            ("Widget".to_owned(), 4, TokenKind::Function),
            ("spin".to_owned(), 5, TokenKind::Function),
            ("~Widget".to_owned(), 6, TokenKind::Function),
        ]
    );
    assert!(!out.text.contains("EXPORT"));
    assert!(out.text.contains("    Widget();\n"));
}

#[test]
fn enum_class_is_enum() {
    let out = scan("namespace project {\nenum class EXPORT Mode : int { A, B };\n}\n");
    assert_eq!(refs(&out), vec![("Mode".to_owned(), 2, TokenKind::Enum)]);
}

#[test]
fn union_and_flags() {
    let src = "namespace project {\n\
               union EXPORT Bits { int i; float f; };\n\
               EXPORT BEGIN_FLAGS_DECLARATION(Access)\n\
               FLAG(read, 1)\n\
               END_FLAGS_DECLARATION(Access);\n\
               }\n";
    let out = scan(src);
    assert_eq!(
        refs(&out),
        vec![
            ("Bits".to_owned(), 2, TokenKind::Union),
            ("Access".to_owned(), 3, TokenKind::Flags),
        ]
    );
    assert!(out.text.contains("\nBEGIN_FLAGS_DECLARATION(Access)\n"));
}

#[test]
fn dependency_clause_consumed() {
    let src = "namespace project {\nclass EXPORT DEPENDS(Helper, gfx::Device) Widget final {\n};\n}\n";
    let out = scan(src);
    let widget = out.references.iter().next();
    assert_eq!(
        widget.map(|r| r.dependencies.clone()),
        Some(vec!["Helper".to_owned(), "gfx::Device".to_owned()])
    );
    assert_eq!(widget.map(|r| r.name.as_str()), Some("Widget"));
    assert_eq!(
        out.text,
        "namespace project {\nclass Widget final {\n};\n}\n"
    );
}

#[test]
fn multiline_dependency_clause_keeps_lines() {
    let src = "namespace project {\nstruct EXPORT DEPENDS(A,\n B) S {\n};\n}\n";
    let out = scan(src);
    assert_eq!(out.text, "namespace project {\nstruct \nS {\n};\n}\n");
    assert_eq!(out.lines.line_count(), LineIndex::new(src).line_count());
}

#[test]
fn marker_outside_namespace_dropped() {
    let out = scan("struct EXPORT Loose {};\nnamespace project {\n}\n");
    assert!(out.references.is_empty());
    assert_eq!(out.text, "struct Loose {};\nnamespace project {\n}\n");
}

#[test]
fn innermost_namespace_assigned() {
    let src = "namespace project {\nnamespace gfx {\nstruct EXPORT Color { float r; };\n}\n}\n";
    let out = scan(src);
    let ns = out.references.iter().next().map(|r| r.namespace.name.clone());
    assert_eq!(ns.as_deref(), Some("project::gfx"));
}

#[test]
fn unclassified_marker_is_fatal() {
    let options = options();
    let err = AnnotationScanner::new(&options).scan("namespace project {\nint EXPORT = 3;\n}\n");
    assert_eq!(
        err.map(|_| ()),
        Err(ScanError::UnclassifiedMarker {
            line: 2,
            marker: "EXPORT".to_owned()
        })
    );
}

#[test]
fn glued_marker_ignored() {
    let out = scan("namespace project {\nint EXPORTED_COUNT;\n}\n");
    assert!(out.references.is_empty());
    assert!(out.text.contains("EXPORTED_COUNT"));
}

#[test]
fn idempotent_on_own_output() {
    let src = "namespace project {\nclass EXPORT DEPENDS(X) A {\npublic:\n    EXPORT int f(int a, float* b) const;\n};\n}\n";
    let first = scan(src);
    let second = scan(&first.text);
    assert!(second.references.is_empty());
    assert_eq!(second.text, first.text);
}

#[test]
fn offsets_map_back_to_original() {
    let src = "namespace project {\nstruct EXPORT P { int x; };\n}\n";
    let out = scan(src);
    let stripped_at = out.text.find("P {").unwrap_or_default();
    let original_at = src.find("P {").unwrap_or_default();
    assert_eq!(out.offsets.to_original(stripped_at), original_at);
    assert_eq!(out.offsets.to_original(0), 0);
}

#[test]
fn custom_marker_and_keyword() {
    let options = ScanOptions {
        marker: "LIB_API".to_owned(),
        dependency_keyword: "DEPENDS_ON".to_owned(),
        namespace_prefix: "lib".to_owned(),
    };
    let src = "namespace lib {\nclass LIB_API DEPENDS_ON(Other) Thing {\n};\n}\n";
    let out = AnnotationScanner::new(&options).scan(src);
    let deps = out
        .ok()
        .and_then(|o| o.references.iter().next().map(|r| r.dependencies.clone()));
    assert_eq!(deps, Some(vec!["Other".to_owned()]));
}

#[test]
fn function_name_forms() {
    assert_eq!(function_name(" void run();").as_deref(), Some("run"));
    assert_eq!(
        function_name(" std::unique_ptr<Foo> make(int a, void(*cb)(int));").as_deref(),
        Some("make")
    );
    assert_eq!(function_name(" ~Widget();").as_deref(), Some("~Widget"));
    assert_eq!(function_name(" x = f();"), None);
    assert_eq!(function_name(" void run(;"), None);
}

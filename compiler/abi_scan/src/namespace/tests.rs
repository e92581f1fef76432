use super::*;
use pretty_assertions::assert_eq;

fn table(source: &str, prefix: &str) -> NamespaceTable {
    let lines = LineIndex::new(source);
    match NamespaceTable::collect(source, prefix, &lines) {
        Ok(table) => table,
        Err(err) => panic!("unexpected scope error: {err}"),
    }
}

fn names(table: &NamespaceTable) -> Vec<&str> {
    table.spans().iter().map(|s| s.name.as_str()).collect()
}

#[test]
fn single_namespace() {
    let src = "namespace project {\nstruct A {};\n}\n";
    let t = table(src, "project");
    assert_eq!(names(&t), vec!["project"]);
    let span = &t.spans()[0];
    assert_eq!((span.begin_line, span.end_line), (1, 3));
    assert_eq!(span.open, 18);
}

#[test]
fn nested_blocks_are_qualified() {
    let src = "namespace project {\nnamespace core {\nint x;\n}\n}\n";
    let t = table(src, "project");
    assert_eq!(names(&t), vec!["project", "project::core"]);
}

#[test]
fn qualified_header() {
    let src = "namespace project::core::math {\n}\n";
    assert_eq!(names(&table(src, "project")), vec!["project::core::math"]);
}

#[test]
fn prefix_filters_top_level_only() {
    let src = "namespace std {\n}\nnamespace other {\n}\nnamespace project_x {\n}\n";
    assert_eq!(names(&table(src, "project")), vec!["project_x"]);
}

#[test]
fn using_and_alias_forms_skipped() {
    let src = "using namespace project;\nnamespace p = project;\nnamespace project {\n}\n";
    assert_eq!(names(&table(src, "project")), vec!["project"]);
}

#[test]
fn keyword_inside_identifier_skipped() {
    let src = "int my_namespace_count;\nnamespace project {\n}\n";
    assert_eq!(names(&table(src, "")), vec!["project"]);
}

#[test]
fn anonymous_namespace_skipped() {
    let src = "namespace {\n}\n";
    assert!(table(src, "").is_empty());
}

#[test]
fn innermost_wins() {
    let src = "namespace a {\nint x;\nnamespace b {\nint y;\n}\nint z;\n}\n";
    let t = table(src, "a");
    assert_eq!(t.innermost(2).map(|s| s.name.as_str()), Some("a"));
    assert_eq!(t.innermost(4).map(|s| s.name.as_str()), Some("a::b"));
    assert_eq!(t.innermost(6).map(|s| s.name.as_str()), Some("a"));
    assert_eq!(t.innermost(9), None);
}

#[test]
fn siblings_after_nested_block() {
    let src = "namespace a {\nnamespace b {\n}\nnamespace c {\n}\n}\n";
    assert_eq!(names(&table(src, "a")), vec!["a", "a::b", "a::c"]);
}

#[test]
fn unbalanced_namespace_is_error() {
    let src = "namespace a {\nint x;\n";
    let lines = LineIndex::new(src);
    assert!(NamespaceTable::collect(src, "a", &lines).is_err());
}

#[test]
fn screaming_name_flattens_nesting() {
    let span = NamespaceSpan {
        name: "a::b::c".to_owned(),
        begin_line: 1,
        end_line: 1,
        open: 0,
        close: 0,
    };
    assert_eq!(span.screaming_name(), "A_B_C");
}

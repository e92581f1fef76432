//! Full runs against a source tree on disk.

use std::path::{Path, PathBuf};

use abi_ir::GenError;
use abigen::{load_headers, run, Options, Summary};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const WIDGET: &str = "\
namespace project {
class EXPORT Widget {
public:
    EXPORT Widget();
    EXPORT virtual void spin();
};
}
";

const POINT: &str = "namespace project {\nstruct EXPORT Point { int x; int y; };\n}\n";

const HELPER_USER: &str = "\
namespace project {
class EXPORT DEPENDS(Helper) Gadget {
public:
    EXPORT Gadget();
};
}
";

struct Tree {
    source: TempDir,
    output: TempDir,
}

impl Tree {
    fn new() -> Self {
        let tree = Tree {
            source: tempfile::tempdir().unwrap_or_else(|e| panic!("failed to create temp dir: {e}")),
            output: tempfile::tempdir().unwrap_or_else(|e| panic!("failed to create temp dir: {e}")),
        };
        tree.file("version.txt", "1.2.3\n");
        tree
    }

    fn file(&self, relative: &str, contents: &str) {
        let path = self.source.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("mkdir failed: {e}"));
        }
        std::fs::write(&path, contents).unwrap_or_else(|e| panic!("write failed: {e}"));
    }

    fn options(&self, headers: &[&str], revision: Option<&str>) -> Options {
        Options {
            headers: headers.iter().map(PathBuf::from).collect(),
            config: self.source.path().join("abigen.json"),
            output: self.output.path().to_path_buf(),
            source_tree: self.source.path().to_path_buf(),
            revision: revision.map(str::to_owned),
            common_lib: None,
        }
    }

    fn output(&self, relative: &str) -> String {
        let path = self.output.path().join(relative);
        std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
    }

    fn exists(&self, relative: &str) -> bool {
        self.output.path().join(relative).is_file()
    }
}

#[test]
fn generates_every_artifact() {
    let tree = Tree::new();
    tree.file(
        "abigen.json",
        r#"{
            "namespace_prefix": "project",
            "ignored_headers": ["engine/legacy/old.h"],
            "common_resources": ["engine/core/types.h"],
            "revision": "from-config"
        }"#,
    );
    tree.file("engine/ui/widget.h", WIDGET);
    tree.file("engine/math/point.h", POINT);
    tree.file("engine/legacy/old.h", "this is not C++ {{{");
    tree.file("engine/core/types.h", "using u32 = unsigned;\n");

    let options = tree.options(
        &["engine/ui/widget.h", "engine/math/point.h", "engine/legacy/old.h"],
        Some("cafe42"),
    );
    let summary = match run(&options) {
        Ok(summary) => summary,
        Err(err) => panic!("run failed: {err}"),
    };
    assert_eq!(
        summary,
        Summary {
            headers: 3,
            skipped: 1,
            resources: 2,
            artifacts: 9,
            common_resources: 1,
        }
    );

    for file in [
        "engine/ui/_widget.cpp",
        "api/ui/widget.h",
        "api/ui/widget.cpp",
        "api/math/point.h",
        "api/ioc_traits.h",
        "engine/_ioc_traits.cpp",
        "api/runtime.h",
        "api/runtime.cpp",
        "engine/build_info.h",
    ] {
        assert!(tree.exists(file), "{file} was not written");
    }
    assert!(!tree.exists("engine/math/_point.cpp"));

    assert_eq!(tree.output("engine/ui/_widget.cpp").matches("ABI_EXPORT ").count(), 3);
    assert!(tree.output("api/math/point.h").contains("struct Point { int x; int y; };"));
    assert_eq!(tree.output("api/core/types.h"), "using u32 = unsigned;\n");

    let info = tree.output("engine/build_info.h");
    assert!(info.contains("project_version = 4295098371ull;"), "{info}");
    assert!(info.contains("project_revision = \"cafe42\";"), "{info}");
}

#[test]
fn configured_revision_is_the_fallback() {
    let tree = Tree::new();
    tree.file(
        "abigen.json",
        r#"{ "namespace_prefix": "project", "revision": "from-config" }"#,
    );
    tree.file("engine/math/point.h", POINT);
    if let Err(err) = run(&tree.options(&["engine/math/point.h"], None)) {
        panic!("run failed: {err}");
    }
    assert!(tree
        .output("engine/build_info.h")
        .contains("project_revision = \"from-config\";"));
}

#[test]
fn unresolved_dependency_writes_nothing() {
    let tree = Tree::new();
    tree.file("abigen.json", r#"{ "namespace_prefix": "project" }"#);
    tree.file("engine/gadget.h", HELPER_USER);
    match run(&tree.options(&["engine/gadget.h"], None)) {
        Err(GenError::UnresolvedDependency {
            dependency,
            resource,
        }) => {
            assert_eq!(dependency, "Helper");
            assert!(resource.contains("Gadget"), "{resource}");
        }
        other => panic!("expected an unresolved dependency, got {other:?}"),
    }
    let written = std::fs::read_dir(tree.output.path())
        .unwrap_or_else(|e| panic!("read_dir failed: {e}"))
        .count();
    assert_eq!(written, 0);
}

#[test]
fn missing_version_file_is_fatal() {
    let tree = Tree::new();
    tree.file("abigen.json", r#"{ "version_file": "VERSION" }"#);
    tree.file("engine/math/point.h", POINT);
    let result = run(&tree.options(&["engine/math/point.h"], None));
    assert!(matches!(result, Err(GenError::MissingVersion { .. })), "{result:?}");
}

#[test]
fn unreadable_header_is_fatal() {
    let tree = Tree::new();
    tree.file("abigen.json", "{}");
    let result = run(&tree.options(&["engine/absent.h"], None));
    assert!(matches!(result, Err(GenError::ReadHeader { .. })), "{result:?}");
}

#[test]
fn headers_load_in_input_order() {
    let tree = Tree::new();
    tree.file("engine/ui/widget.h", WIDGET);
    tree.file("engine/math/point.h", POINT);
    let config = abi_ir::GenConfig {
        namespace_prefix: "project".to_owned(),
        ..abi_ir::GenConfig::default()
    };
    let absolute = tree.source.path().join("engine/ui/widget.h");
    let headers = [PathBuf::from("engine/math/point.h"), absolute];
    let units = match load_headers(&config, tree.source.path(), &headers) {
        Ok(units) => units,
        Err(err) => panic!("loading failed: {err}"),
    };
    let paths: Vec<&Path> = units.iter().map(|u| u.path.as_path()).collect();
    assert_eq!(
        paths,
        vec![Path::new("engine/math/point.h"), Path::new("engine/ui/widget.h")]
    );
}

#[test]
fn common_directories_expand_into_manifests() {
    let tree = Tree::new();
    tree.file(
        "abigen.json",
        r#"{ "namespace_prefix": "project", "common_resources": ["engine/common", "engine/core/types.h"] }"#,
    );
    tree.file("engine/math/point.h", POINT);
    tree.file("engine/common/log.h", "void log();\n");
    tree.file("engine/common/log.cpp", "void log() {}\n");
    tree.file("engine/common/detail/clock.hpp", "struct Clock;\n");
    tree.file("engine/core/types.h", "using u32 = unsigned;\n");

    let common_lib = tree.output.path().join("lib/common");
    let options = Options {
        common_lib: Some(common_lib.clone()),
        ..tree.options(&["engine/math/point.h"], None)
    };
    let summary = match run(&options) {
        Ok(summary) => summary,
        Err(err) => panic!("run failed: {err}"),
    };
    assert_eq!(summary.common_resources, 3);

    assert_eq!(tree.output("api/common/log.h"), "void log();\n");
    assert_eq!(tree.output("api/common/detail/clock.hpp"), "struct Clock;\n");
    assert_eq!(tree.output("api/core/types.h"), "using u32 = unsigned;\n");
    assert!(!tree.exists("api/common/log.cpp"));

    let root = std::fs::canonicalize(tree.source.path())
        .unwrap_or_else(|e| panic!("canonicalize failed: {e}"))
        .to_string_lossy()
        .replace('\\', "/");
    let read = |path: &Path| {
        std::fs::read_to_string(path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
    };
    assert_eq!(
        read(&common_lib.join("headers_list.txt")),
        format!(
            "{root}/engine/common/detail/clock.hpp\n{root}/engine/common/log.h\n{root}/engine/core/types.h\n"
        )
    );
    let sources = format!("{root}/engine/common/log.cpp\n");
    assert_eq!(read(&common_lib.join("sources_list.txt")), sources);
    assert_eq!(tree.output("engine/excluded_sources.txt"), sources);
}

//! Whole-graph resolution across several headers.

use std::path::PathBuf;

use abi_ir::{GenConfig, GenError, StructuralParser};
use abi_parse::DeclParser;
use abi_resolve::{build_graph, BaseKind, HeaderUnit, ResourceGraph};
use abi_scan::AnnotationScanner;
use pretty_assertions::assert_eq;

fn config() -> GenConfig {
    GenConfig {
        namespace_prefix: "project".to_owned(),
        forced_includes: vec!["api/runtime/ioc.h".to_owned()],
        ..GenConfig::default()
    }
}

fn unit(config: &GenConfig, path: &str, source: &str) -> HeaderUnit {
    let options = config.scan_options();
    let scan = match AnnotationScanner::new(&options).scan(source) {
        Ok(scan) => scan,
        Err(err) => panic!("{path}: scan failed: {err}"),
    };
    let parsed = match DeclParser.parse(&scan.text) {
        Ok(parsed) => parsed,
        Err(err) => panic!("{path}: parse failed: {err}"),
    };
    HeaderUnit {
        path: PathBuf::from(path),
        scan,
        parsed,
    }
}

fn graph(config: &GenConfig, headers: &[(&str, &str)]) -> Result<ResourceGraph, GenError> {
    let units: Vec<HeaderUnit> = headers
        .iter()
        .map(|(path, source)| unit(config, path, source))
        .collect();
    build_graph(&units, config)
}

const MATH: &str = "#include <cmath>\n\
namespace project {\n\
struct EXPORT Vec3 { float x; float y; float z; };\n\
namespace render {\n\
struct EXPORT Vec3 { double x; double y; double z; };\n\
}\n\
}\n";

const CAMERA: &str = "#include \"engine/math/vec3.h\"\n\
#include \"engine/private/impl.h\"\n\
namespace project::render {\n\
class EXPORT DEPENDS(Vec3) Camera {\n\
public:\n\
    EXPORT Vec3 eye() const;\n\
};\n\
class EXPORT Rig : public Camera {\n\
public:\n\
    EXPORT void mount();\n\
};\n\
}\n";

#[test]
fn innermost_dependency_wins() {
    let config = config();
    let graph = match graph(
        &config,
        &[("engine/math/vec3.h", MATH), ("engine/render/camera.h", CAMERA)],
    ) {
        Ok(graph) => graph,
        Err(err) => panic!("graph failed: {err}"),
    };
    let Some(camera) = graph.index.get("project::render::Camera") else {
        panic!("Camera not indexed");
    };
    // Both `Vec3`s live in the same public header; the private include
    // exports nothing and is dropped.
    assert_eq!(
        graph.arena[camera].includes,
        vec!["api/math/vec3.h", "api/runtime/ioc.h"]
    );
    assert_eq!(
        graph.index.resolve("project::render", "Vec3"),
        graph.index.get("project::render::Vec3")
    );
    assert_eq!(
        graph.index.resolve("project", "Vec3"),
        graph.index.get("project::Vec3")
    );
}

#[test]
fn derived_class_marks_base_inherited() {
    let config = config();
    let graph = match graph(
        &config,
        &[("engine/math/vec3.h", MATH), ("engine/render/camera.h", CAMERA)],
    ) {
        Ok(graph) => graph,
        Err(err) => panic!("graph failed: {err}"),
    };
    let (Some(camera), Some(rig)) = (
        graph.index.get("project::render::Camera"),
        graph.index.get("project::render::Rig"),
    ) else {
        panic!("classes not indexed");
    };
    assert!(graph.arena[camera].is_inherited);
    assert!(!graph.arena[rig].is_inherited);
    assert_eq!(
        graph.base_kind(&config, "project::render", "Camera"),
        BaseKind::Exported(camera)
    );
    assert_eq!(
        graph.base_kind(&config, "project::render", "std::exception"),
        BaseKind::Foreign
    );
}

#[test]
fn unresolved_dependency_names_both_sides() {
    let config = config();
    let source = "namespace project {\n\
                  class EXPORT DEPENDS(Helper) Widget {\n\
                  public:\n\
                  \x20   EXPORT void run();\n\
                  };\n\
                  }\n";
    let err = match graph(&config, &[("engine/widget.h", source)]) {
        Ok(_) => panic!("resolution unexpectedly succeeded"),
        Err(err) => err,
    };
    match &err {
        GenError::UnresolvedDependency {
            dependency,
            resource,
        } => {
            assert_eq!(dependency, "Helper");
            assert_eq!(resource, "project::Widget");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn dependency_declared_in_later_header_resolves() {
    let config = config();
    let user = "namespace project {\n\
                class EXPORT DEPENDS(Clock) Timer {\n\
                public:\n\
                \x20   EXPORT int ticks() const;\n\
                };\n\
                }\n";
    let clock = "namespace project {\nstruct EXPORT Clock { long now; };\n}\n";
    let graph = match graph(
        &config,
        &[("engine/timer.h", user), ("engine/time/clock.h", clock)],
    ) {
        Ok(graph) => graph,
        Err(err) => panic!("graph failed: {err}"),
    };
    let Some(timer) = graph.index.get("project::Timer") else {
        panic!("Timer not indexed");
    };
    assert_eq!(
        graph.arena[timer].includes,
        vec!["api/time/clock.h", "api/runtime/ioc.h"]
    );
}

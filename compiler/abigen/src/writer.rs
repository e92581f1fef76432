//! Artifact output.

use std::path::{Path, PathBuf};

use abi_codegen::Artifact;
use abi_ir::{include_path, GenConfig, GenError};
use rayon::prelude::*;

fn write_file(path: &Path, contents: &[u8]) -> Result<(), GenError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| GenError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, contents).map_err(|source| GenError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write every artifact below `output`, creating directories as needed.
pub fn write_artifacts(output: &Path, artifacts: &[Artifact]) -> Result<(), GenError> {
    artifacts.par_iter().try_for_each(|artifact| {
        let path = output.join(&artifact.path);
        tracing::debug!(path = %path.display(), bytes = artifact.contents.len(), "writing");
        write_file(&path, artifact.contents.as_bytes())
    })
}

/// Common resources expanded to files, split by role.
///
/// Paths are source-tree relative with `/` separators, in configuration
/// order; files found under a directory entry are sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommonResources {
    pub headers: Vec<String>,
    pub sources: Vec<String>,
}

const HEADER_EXTENSIONS: &[&str] = &["h", "hpp", "inl"];
const SOURCE_EXTENSIONS: &[&str] = &["c", "cpp"];

impl CommonResources {
    /// Expand every configured entry; directories are walked recursively.
    pub fn collect(config: &GenConfig, source_tree: &Path) -> Result<Self, GenError> {
        let mut resources = CommonResources::default();
        for entry in &config.common_resources {
            let path = source_tree.join(entry);
            let metadata = std::fs::metadata(&path).map_err(|source| GenError::ReadHeader {
                path: path.clone(),
                source,
            })?;
            if metadata.is_dir() {
                let mut files = Vec::new();
                walk(&path, &mut files)?;
                files.sort();
                for file in files {
                    let relative = file.strip_prefix(source_tree).unwrap_or(&file);
                    resources.classify(include_path(relative));
                }
            } else {
                resources.classify(entry.replace('\\', "/"));
            }
        }
        Ok(resources)
    }

    fn classify(&mut self, path: String) {
        let extension = Path::new(&path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        if HEADER_EXTENSIONS.contains(&extension) {
            self.headers.push(path);
        } else if SOURCE_EXTENSIONS.contains(&extension) {
            self.sources.push(path);
        } else {
            tracing::debug!(path = path.as_str(), "common resource is neither header nor source");
        }
    }
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), GenError> {
    let read_error = |source| GenError::ReadHeader {
        path: dir.to_path_buf(),
        source,
    };
    for entry in std::fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if path.is_dir() {
            walk(&path, files)?;
        } else if path.is_file() {
            files.push(path);
        }
    }
    Ok(())
}

/// One absolute path per line.
fn manifest(source_tree: &Path, paths: &[String]) -> String {
    paths
        .iter()
        .map(|p| format!("{}\n", source_tree.join(p).to_string_lossy().replace('\\', "/")))
        .collect()
}

/// Copy common headers from the source tree into the public tree, e.g.
/// `engine/core/types.h` to `<output>/api/core/types.h`, and write the
/// build manifests:
///
/// * `<common_lib>/headers_list.txt`: every common header;
/// * `<common_lib>/sources_list.txt`: every common source;
/// * `<output>/<source root>/excluded_sources.txt`: the same sources, which
///   the common library builds instead of the engine.
///
/// Returns the number of headers mirrored.
pub fn mirror_common_resources(
    config: &GenConfig,
    source_tree: &Path,
    output: &Path,
    common_lib: &Path,
) -> Result<usize, GenError> {
    let resources = CommonResources::collect(config, source_tree)?;
    for header in &resources.headers {
        let from = source_tree.join(header);
        let bytes = std::fs::read(&from).map_err(|source| GenError::ReadHeader {
            path: from.clone(),
            source,
        })?;
        let to = output.join(config.api_path_for(header));
        write_file(&to, &bytes)?;
        tracing::debug!(from = %from.display(), to = %to.display(), "common resource mirrored");
    }

    let absolute_tree = std::fs::canonicalize(source_tree).map_err(|source| GenError::ReadHeader {
        path: source_tree.to_path_buf(),
        source,
    })?;
    let headers = manifest(&absolute_tree, &resources.headers);
    let sources = manifest(&absolute_tree, &resources.sources);
    write_file(&common_lib.join("headers_list.txt"), headers.as_bytes())?;
    write_file(&common_lib.join("sources_list.txt"), sources.as_bytes())?;
    write_file(
        &output.join(&config.source_root).join("excluded_sources.txt"),
        sources.as_bytes(),
    )?;
    tracing::info!(
        headers = resources.headers.len(),
        sources = resources.sources.len(),
        "common resources written"
    );
    Ok(resources.headers.len())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use pretty_assertions::assert_eq;

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
    }

    #[test]
    fn artifacts_land_in_nested_directories() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("failed to create temp dir: {e}"));
        let artifacts = [
            Artifact {
                path: PathBuf::from("api/ui/widget.h"),
                contents: "#pragma once\n".to_owned(),
            },
            Artifact {
                path: PathBuf::from("engine/_ioc_traits.cpp"),
                contents: "// sizes\n".to_owned(),
            },
        ];
        if let Err(err) = write_artifacts(dir.path(), &artifacts) {
            panic!("write failed: {err}");
        }
        assert_eq!(read(&dir.path().join("api/ui/widget.h")), "#pragma once\n");
        assert_eq!(read(&dir.path().join("engine/_ioc_traits.cpp")), "// sizes\n");
    }

    #[test]
    fn common_resources_move_to_the_api_root() {
        let source = tempfile::tempdir().unwrap_or_else(|e| panic!("failed to create temp dir: {e}"));
        let output = tempfile::tempdir().unwrap_or_else(|e| panic!("failed to create temp dir: {e}"));
        let header = source.path().join("engine/core/types.h");
        write_file(&header, b"using u32 = unsigned;\n")
            .unwrap_or_else(|e| panic!("failed to seed source tree: {e}"));

        let config = GenConfig {
            common_resources: vec!["engine/core/types.h".to_owned()],
            ..GenConfig::default()
        };
        let common_lib = output.path().join("common_lib");
        let copied = mirror_common_resources(&config, source.path(), output.path(), &common_lib);
        assert!(matches!(copied, Ok(1)));
        assert_eq!(
            read(&output.path().join("api/core/types.h")),
            "using u32 = unsigned;\n"
        );
    }

    #[test]
    fn missing_common_resource_is_fatal() {
        let source = tempfile::tempdir().unwrap_or_else(|e| panic!("failed to create temp dir: {e}"));
        let config = GenConfig {
            common_resources: vec!["engine/absent.h".to_owned()],
            ..GenConfig::default()
        };
        let result =
            mirror_common_resources(&config, source.path(), source.path(), source.path());
        assert!(matches!(result, Err(GenError::ReadHeader { .. })));
    }

    #[test]
    fn directory_entries_expand_sorted_by_role() {
        let source = tempfile::tempdir().unwrap_or_else(|e| panic!("failed to create temp dir: {e}"));
        for file in [
            "engine/common/zeta.h",
            "engine/common/alpha.cpp",
            "engine/common/detail/beta.inl",
            "engine/common/detail/gamma.c",
            "engine/common/notes.txt",
        ] {
            write_file(&source.path().join(file), b"")
                .unwrap_or_else(|e| panic!("failed to seed source tree: {e}"));
        }
        let config = GenConfig {
            common_resources: vec!["engine/common".to_owned()],
            ..GenConfig::default()
        };
        let Ok(resources) = CommonResources::collect(&config, source.path()) else {
            panic!("collection failed");
        };
        assert_eq!(
            resources,
            CommonResources {
                headers: vec![
                    "engine/common/detail/beta.inl".to_owned(),
                    "engine/common/zeta.h".to_owned(),
                ],
                sources: vec![
                    "engine/common/alpha.cpp".to_owned(),
                    "engine/common/detail/gamma.c".to_owned(),
                ],
            }
        );
    }
}

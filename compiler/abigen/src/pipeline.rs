//! The three generator phases.

use std::path::{Path, PathBuf};

use abi_codegen::{read_version, Artifact, BuildInfo, Generator, TemplateRegistry};
use abi_ir::{include_path, GenConfig, GenError, StructuralParser};
use abi_parse::DeclParser;
use abi_resolve::{build_graph, HeaderUnit};
use abi_scan::AnnotationScanner;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::load_config;
use crate::writer::{mirror_common_resources, write_artifacts};

/// One `generate` invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Headers to scan, relative to `source_tree` (absolute paths inside it
    /// are accepted too).
    pub headers: Vec<PathBuf>,
    pub config: PathBuf,
    pub output: PathBuf,
    pub source_tree: PathBuf,
    /// Overrides the configured revision.
    pub revision: Option<String>,
    /// Where the common-resource manifests go; `<output>/common_lib` when
    /// unset.
    pub common_lib: Option<PathBuf>,
}

/// What a run produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub headers: usize,
    pub skipped: usize,
    pub resources: usize,
    pub artifacts: usize,
    pub common_resources: usize,
}

/// Run every phase and write the results.
#[tracing::instrument(level = "debug", skip_all, fields(headers = options.headers.len()))]
pub fn run(options: &Options) -> Result<Summary, GenError> {
    let config = load_config(&options.config)?;
    let config_dir = options.config.parent().unwrap_or(Path::new("."));
    let templates = TemplateRegistry::from_config(&config, config_dir)?;

    let units = load_headers(&config, &options.source_tree, &options.headers)?;
    let skipped = options.headers.len() - units.len();
    info!(loaded = units.len(), skipped, "phase 1 complete");

    let graph = build_graph(&units, &config)?;
    info!(resources = graph.arena.len(), "phase 2 complete");

    let version = read_version(&options.source_tree.join(&config.version_file))?;
    let revision = options
        .revision
        .clone()
        .or_else(|| config.revision.clone())
        .unwrap_or_else(|| "unknown".to_owned());
    let build = BuildInfo { version, revision };

    let generator = Generator::new(&graph, &config, &templates)?;
    let trees: Vec<Vec<Artifact>> = generator
        .roots()
        .par_iter()
        .map(|&root| generator.render_tree(root))
        .collect::<Result<_, _>>()?;
    let mut artifacts: Vec<Artifact> = trees.into_iter().flatten().collect();
    artifacts.extend(generator.render_aggregates(&build)?);
    info!(artifacts = artifacts.len(), "phase 3 complete");

    write_artifacts(&options.output, &artifacts)?;
    let common_lib = options
        .common_lib
        .clone()
        .unwrap_or_else(|| options.output.join("common_lib"));
    let common_resources =
        mirror_common_resources(&config, &options.source_tree, &options.output, &common_lib)?;

    Ok(Summary {
        headers: options.headers.len(),
        skipped,
        resources: graph.arena.len(),
        artifacts: artifacts.len(),
        common_resources,
    })
}

/// Phase 1: read, scan and parse every header, in input order.
///
/// Ignored headers and headers the parser rejects are skipped with a
/// warning; unreadable headers and scan errors abort.
pub fn load_headers(
    config: &GenConfig,
    source_tree: &Path,
    headers: &[PathBuf],
) -> Result<Vec<HeaderUnit>, GenError> {
    let options = config.scan_options();
    let scanner = AnnotationScanner::new(&options);
    let loaded: Vec<Option<HeaderUnit>> = headers
        .par_iter()
        .map(|header| load_header(config, &scanner, source_tree, header))
        .collect::<Result<_, _>>()?;
    Ok(loaded.into_iter().flatten().collect())
}

fn load_header(
    config: &GenConfig,
    scanner: &AnnotationScanner<'_>,
    source_tree: &Path,
    header: &Path,
) -> Result<Option<HeaderUnit>, GenError> {
    let relative = header.strip_prefix(source_tree).unwrap_or(header);
    let relative_text = include_path(relative);
    if config
        .ignored_headers
        .iter()
        .any(|ignored| ignored.replace('\\', "/") == relative_text)
    {
        warn!(header = relative_text.as_str(), "header is ignored by configuration");
        return Ok(None);
    }

    let path = source_tree.join(relative);
    let source = std::fs::read_to_string(&path).map_err(|source| GenError::ReadHeader {
        path: path.clone(),
        source,
    })?;
    let scan = scanner.scan(&source).map_err(|source| GenError::Scan {
        path: path.clone(),
        source,
    })?;
    if scan.references.is_empty() {
        tracing::debug!(header = relative_text.as_str(), "no exported declarations");
    }
    let parsed = match DeclParser.parse(&scan.text) {
        Ok(parsed) => parsed,
        Err(failure) => {
            warn!(
                header = relative_text.as_str(),
                line = failure.line,
                message = failure.message.as_str(),
                "structural parse failed; header skipped"
            );
            return Ok(None);
        }
    };
    Ok(Some(HeaderUnit {
        path: relative.to_path_buf(),
        scan,
        parsed,
    }))
}

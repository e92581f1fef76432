use std::path::Path;

use abi_ir::{GenConfig, GenError};

/// Read and deserialize `abigen.json`.
pub fn load_config(path: &Path) -> Result<GenConfig, GenError> {
    let text = std::fs::read_to_string(path).map_err(|err| GenError::Config {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    let config: GenConfig = serde_json::from_str(&text).map_err(|err| GenError::Config {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    if config.marker.is_empty() {
        return Err(GenError::Config {
            path: path.to_path_buf(),
            message: "`marker` must not be empty".to_owned(),
        });
    }
    tracing::debug!(
        path = %path.display(),
        prefix = config.namespace_prefix.as_str(),
        "configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(dir: &Path, text: &str) -> std::path::PathBuf {
        let path = dir.join("abigen.json");
        std::fs::write(&path, text).unwrap_or_else(|e| panic!("failed to write config: {e}"));
        path
    }

    #[test]
    fn empty_object_loads_defaults() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("failed to create temp dir: {e}"));
        let path = write(dir.path(), "{}");
        let Ok(config) = load_config(&path) else {
            panic!("config did not load");
        };
        assert_eq!(config, GenConfig::default());
    }

    #[test]
    fn malformed_json_names_the_file() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("failed to create temp dir: {e}"));
        let path = write(dir.path(), "{ \"marker\": ");
        match load_config(&path) {
            Err(GenError::Config { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected a config error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("failed to create temp dir: {e}"));
        let err = load_config(&dir.path().join("nope.json"));
        assert!(matches!(err, Err(GenError::Config { .. })));
    }

    #[test]
    fn empty_marker_is_rejected() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("failed to create temp dir: {e}"));
        let path = write(dir.path(), r#"{ "marker": "" }"#);
        assert!(matches!(load_config(&path), Err(GenError::Config { .. })));
    }
}

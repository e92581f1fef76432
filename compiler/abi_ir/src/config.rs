//! Generator configuration.
//!
//! Deserialized from JSON by the driver. Every field has a default, so `{}`
//! is a valid configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::ScanOptions;

/// How a base class is re-expressed on the import side.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct InheritanceMapping {
    /// Name the proxy derives from instead of the original base.
    pub mapped_object_name: String,
    /// Header declaring the original base.
    pub source_object_header_path: String,
    /// Header declaring the mapped base.
    pub mapped_object_header_path: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    /// Required prefix of top-level namespaces holding exports.
    pub namespace_prefix: String,
    pub marker: String,
    pub dependency_keyword: String,
    /// First path component of internal headers.
    pub source_root: String,
    /// First path component of generated public headers.
    pub api_root: String,
    /// Headers (source-tree relative) never scanned.
    pub ignored_headers: Vec<String>,
    /// Includes appended to every resource's include list.
    pub forced_includes: Vec<String>,
    /// Internal headers mirrored verbatim into the public tree.
    pub common_resources: Vec<String>,
    /// Keyed by the base's fully qualified name.
    pub inherited_types_api_mapping: BTreeMap<String, InheritanceMapping>,
    /// Template overrides keyed by template name.
    pub templates: BTreeMap<String, PathBuf>,
    /// Namespace of the runtime support types (`Ioc`, linker, traits).
    pub runtime_namespace: String,
    /// Macro decorating exported C-linkage functions.
    pub export_macro: String,
    /// Calling-convention macro for linked function pointers.
    pub call_macro: String,
    /// Version file, relative to the source tree.
    pub version_file: PathBuf,
    /// Source-control revision stamped into build info.
    pub revision: Option<String>,
    /// Banner prepended to every generated file.
    pub license_header: Option<String>,
}

impl Default for GenConfig {
    fn default() -> Self {
        GenConfig {
            namespace_prefix: String::new(),
            marker: "EXPORT".to_owned(),
            dependency_keyword: "DEPENDS".to_owned(),
            source_root: "engine".to_owned(),
            api_root: "api".to_owned(),
            ignored_headers: Vec::new(),
            forced_includes: Vec::new(),
            common_resources: Vec::new(),
            inherited_types_api_mapping: BTreeMap::new(),
            templates: BTreeMap::new(),
            runtime_namespace: "abi".to_owned(),
            export_macro: "ABI_EXPORT".to_owned(),
            call_macro: "ABI_CALL".to_owned(),
            version_file: PathBuf::from("version.txt"),
            revision: None,
            license_header: None,
        }
    }
}

impl GenConfig {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            marker: self.marker.clone(),
            dependency_keyword: self.dependency_keyword.clone(),
            namespace_prefix: self.namespace_prefix.clone(),
        }
    }

    /// Whether an include path points into the internal source tree.
    pub fn is_internal_path(&self, path: &str) -> bool {
        path.split(['/', '\\']).next() == Some(self.source_root.as_str())
    }

    /// Mirror of an internal path under the public root.
    ///
    /// `engine/core/a.h` becomes `api/core/a.h`; other paths are unchanged.
    pub fn api_path_for(&self, path: &str) -> String {
        match path.split_once(['/', '\\']) {
            Some((root, rest)) if root == self.source_root => format!("{}/{rest}", self.api_root),
            None if path == self.source_root => self.api_root.clone(),
            _ => path.to_owned(),
        }
    }
}

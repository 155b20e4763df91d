//! Search configuration

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading a configuration or heap document from disk
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported document extension for {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(PathBuf),
}

/// Options for one search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Only strong references count toward reachability
    pub strong_only: bool,
    /// Stop after expanding this many values
    pub max_nodes: Option<usize>,
    /// Do not expand values further than this many references from a root
    pub max_depth: Option<usize>,
    /// Stop traversal as soon as the target is known to be strongly held
    pub stop_when_found: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strong_only: false,
            max_nodes: None,
            max_depth: None,
            stop_when_found: false,
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count only strong references
    pub fn strong_only(mut self, strong_only: bool) -> Self {
        self.strong_only = strong_only;
        self
    }

    /// Cap the number of expanded values
    pub fn max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = Some(max_nodes);
        self
    }

    /// Cap the expansion depth
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Stop early once the target is strongly held
    pub fn stop_when_found(mut self, stop: bool) -> Self {
        self.stop_when_found = stop;
        self
    }

    /// Load a configuration from a `.yaml`, `.yml` or `.json` file
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        load_document(path)
    }
}

/// Deserialize a YAML or JSON document, picking the format by extension
pub(crate) fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        }
        Some("json") => serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        }),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}

//! Errors raised while loading option and descriptor files.

use thiserror::Error;

/// Failure to load a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// File could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    /// Glob matched an entry that could not be inspected
    #[error("Glob error: {0}")]
    Glob(#[from] glob::GlobError),
    /// Extension is not one of yaml, yml, json, jsonc
    #[error("Unknown file type: {0}")]
    UnknownFileType(String),
}

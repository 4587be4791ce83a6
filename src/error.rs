use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the migration pipeline.
///
/// Only whole-run problems surface as `Err`; per-document failures are
/// captured as [`crate::pipeline::FileFailure`] records so the batch keeps going.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to walk source tree: {0}")]
    Walk(#[from] ignore::Error),
    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid exclusion pattern: {0}")]
    Pattern(#[from] globset::Error),
    #[error("failed to serialize artifact: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrateError>;

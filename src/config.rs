//! Run configuration, loaded from `.framelift.toml` and overridden by CLI flags.

use crate::error::{MigrateError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Default configuration file looked up next to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".framelift.toml";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Log severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            level: default_log_level(),
        }
    }
}

/// Everything a migration run needs besides the source and output roots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Only documents under this relative prefix are navigation-eligible.
    #[serde(default)]
    pub content_root: String,
    /// Keep `<script>` elements even when they look like plugin hooks.
    #[serde(default)]
    pub preserve_scripts: bool,
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
    #[serde(default = "default_hamming_threshold")]
    pub hamming_threshold: u32,
    #[serde(default = "default_jaccard_threshold")]
    pub jaccard_threshold: f64,
    /// Extra glob patterns excluded from navigation, on top of the fixed list.
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default = "default_document_extensions")]
    pub document_extensions: Vec<String>,
    #[serde(default = "default_report_file")]
    pub report_file: String,
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,
    #[serde(default = "default_fulltext_file")]
    pub fulltext_file: String,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_snippet_chars() -> usize {
    400
}

fn default_hamming_threshold() -> u32 {
    3
}

fn default_jaccard_threshold() -> f64 {
    0.98
}

fn default_document_extensions() -> Vec<String> {
    vec!["html".to_string(), "htm".to_string()]
}

fn default_report_file() -> String {
    "dedup_report.json".to_string()
}

fn default_manifest_file() -> String {
    "nav_manifest.json".to_string()
}

fn default_fulltext_file() -> String {
    "fulltext_index.json".to_string()
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            content_root: String::new(),
            preserve_scripts: false,
            snippet_chars: default_snippet_chars(),
            hamming_threshold: default_hamming_threshold(),
            jaccard_threshold: default_jaccard_threshold(),
            exclude: Vec::new(),
            document_extensions: default_document_extensions(),
            report_file: default_report_file(),
            manifest_file: default_manifest_file(),
            fulltext_file: default_fulltext_file(),
            logging: LoggingConfig::default(),
        }
    }
}

impl MigrationConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| MigrateError::io(path, e))?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.jaccard_threshold) {
            return Err(MigrateError::InvalidConfig(format!(
                "jaccard_threshold must be within [0, 1], got {}",
                self.jaccard_threshold
            )));
        }
        if self.hamming_threshold > 64 {
            return Err(MigrateError::InvalidConfig(format!(
                "hamming_threshold must be at most 64, got {}",
                self.hamming_threshold
            )));
        }
        if self.document_extensions.is_empty() {
            return Err(MigrateError::InvalidConfig(
                "document_extensions must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// True when `path`'s extension marks it as a document.
    pub fn is_document(&self, path: &str) -> bool {
        let ext = match path.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.contains('/') => ext.to_lowercase(),
            _ => return false,
        };
        self.document_extensions
            .iter()
            .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(&ext))
    }
}

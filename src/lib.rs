//! framelift - migrate frame-based legacy HTML corpora into flat pages
//!
//! Each document is sanitized, its frameset merged (or replaced by a listing),
//! and its legacy `javascript:parent.*` links resolved against a snapshot of
//! the source tree. Navigation-eligible pages are then grouped by title and
//! near-duplicates flagged with SimHash and Jaccard similarity.

pub mod config;
pub mod dedup;
pub mod document;
pub mod error;
pub mod html;
pub mod manifest;
pub mod paths;
pub mod pipeline;
pub mod simhash;
pub mod text;

pub use config::{LogFormat, LogLevel, LoggingConfig, MigrationConfig, DEFAULT_CONFIG_FILE};
pub use dedup::{DedupCandidate, DedupDecision, DuplicateGrouper, DuplicateRule, Thresholds};
pub use document::{Document, DocumentKind};
pub use error::{MigrateError, Result};
pub use manifest::{FullTextRecord, NavManifestEntry};
pub use paths::KnownPaths;
pub use pipeline::{DedupReport, FileFailure, Migration, MigrationOutcome, MigrationStats};

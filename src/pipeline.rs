//! The batch run: scan, per-document processing, grouping, artifacts.
//!
//! Two barriers order the run. The tree scan finishes (and its path set is
//! frozen) before any document is touched, and the grouping pass starts only
//! once every document has been written.

use crate::config::MigrationConfig;
use crate::dedup::{DedupCandidate, DedupDecision, DuplicateGrouper, Thresholds};
use crate::document::{strict_title, Document, DocumentKind};
use crate::error::{MigrateError, Result};
use crate::html::frameset::{FramesetMerger, FsPaneLoader, PaneLoader};
use crate::html::links::resolve_links;
use crate::html::sanitize::sanitize;
use crate::html::to_html;
use crate::manifest::{build_manifest, Eligibility, FullTextRecord, NavManifestEntry};
use crate::paths::{relative_key, KnownPaths};
use crate::simhash::{compute_simhash, token_set};
use crate::text::{normalize_title, TextProfile};
use ahash::AHashSet;
use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of the initial tree scan.
#[derive(Debug, Clone)]
pub struct SourceTree {
    pub root: PathBuf,
    /// Every file, sorted; this is the scan order used for tie-breaks.
    pub files: Vec<String>,
    pub known: KnownPaths,
}

/// Walk `root` and snapshot every file path.
pub fn scan_tree(root: &Path) -> Result<SourceTree> {
    if !root.is_dir() {
        return Err(MigrateError::io(
            root,
            std::io::Error::new(std::io::ErrorKind::NotFound, "source root is not a directory"),
        ));
    }

    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .hidden(true)
        .follow_links(false);

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = entry?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        if let Some(key) = relative_key(root, entry.path()) {
            files.push(key);
        }
    }
    files.sort();
    files.dedup();

    let known = KnownPaths::new(&files);
    Ok(SourceTree {
        root: root.to_path_buf(),
        files,
        known,
    })
}

/// One document after sanitize / merge / link resolution / fingerprinting.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub path: String,
    pub kind: DocumentKind,
    /// Exact `<title>` of the source page.
    pub strict_title: String,
    pub display_title: String,
    pub profile: TextProfile,
    pub fingerprint: u64,
    /// Pane documents consumed by a two-frame merge.
    pub panes: Vec<String>,
    /// Serialized output page.
    pub html: String,
}

/// A document that could not be read or written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: String,
    pub error: String,
}

/// Transform one document. Pure apart from pane reads through `loader`.
pub fn process_document(
    path: &str,
    raw: &str,
    known: &KnownPaths,
    config: &MigrationConfig,
    loader: &dyn PaneLoader,
) -> ProcessedDocument {
    let doc = Document::parse(path, raw);
    let merger = FramesetMerger::new(known, config, loader);

    let (dom, kind, panes, display) = match merger.transform(&doc) {
        // The synthesized page already carries the resolved display title.
        Some(page) => {
            let display = normalize_title(&strict_title(&page.dom));
            (page.dom, page.kind, page.panes, display)
        }
        None => {
            let stats = sanitize(&doc.dom, config.preserve_scripts);
            debug!(
                path,
                scripts = stats.scripts,
                handlers = stats.event_handlers,
                frame_containers = stats.frame_containers,
                "sanitized"
            );
            let display = doc.display_title();
            (doc.dom, DocumentKind::NormalPage, Vec::new(), display)
        }
    };

    let links = resolve_links(&dom.document, path, known);
    if links.resolved + links.inert > 0 {
        debug!(path, resolved = links.resolved, inert = links.inert, "legacy links rewritten");
    }

    let profile = TextProfile::from_dom(&dom);
    let fingerprint = compute_simhash(&profile.tokens);

    ProcessedDocument {
        path: path.to_string(),
        kind,
        strict_title: doc.strict_title,
        display_title: display,
        profile,
        fingerprint,
        panes,
        html: to_html(&dom),
    }
}

/// Normalize and fingerprint a standalone page, no frameset handling.
pub fn analyze_markup(path: &str, raw: &str, config: &MigrationConfig) -> DedupCandidate {
    let doc = Document::parse(path, raw);
    sanitize(&doc.dom, config.preserve_scripts);
    let profile = TextProfile::from_dom(&doc.dom);
    DedupCandidate {
        path: path.to_string(),
        strict_title: normalize_title(&doc.strict_title),
        display_title: doc.display_title(),
        text_len: profile.char_len(),
        fingerprint: compute_simhash(&profile.tokens),
        tokens: token_set(&profile.tokens),
    }
}

/// Counts for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationStats {
    pub files_scanned: usize,
    pub documents: usize,
    pub normal_pages: usize,
    pub merged_framesets: usize,
    pub fallback_framesets: usize,
    pub failures: usize,
    pub candidates: usize,
    pub title_groups: usize,
    pub groups_with_duplicates: usize,
    pub duplicates: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupReport {
    pub thresholds: Thresholds,
    pub decisions: Vec<DedupDecision>,
    pub failures: Vec<FileFailure>,
}

/// Everything a run produced, also written to the output root.
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    pub stats: MigrationStats,
    pub report: DedupReport,
    pub manifest: Vec<NavManifestEntry>,
    pub fulltext: Vec<FullTextRecord>,
}

pub struct Migration<'a> {
    config: &'a MigrationConfig,
    source: PathBuf,
    output: PathBuf,
}

impl<'a> Migration<'a> {
    pub fn new(config: &'a MigrationConfig, source: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            config,
            source: source.into(),
            output: output.into(),
        }
    }

    pub fn run(&self) -> Result<MigrationOutcome> {
        let start = Instant::now();
        self.config.validate()?;
        let eligibility = Eligibility::new(self.config)?;

        let tree = scan_tree(&self.source)?;
        info!(
            root = %self.source.display(),
            files = tree.files.len(),
            "source tree scanned"
        );

        fs::create_dir_all(&self.output).map_err(|e| MigrateError::io(&self.output, e))?;

        let documents: Vec<&String> = tree
            .files
            .iter()
            .filter(|p| self.config.is_document(p))
            .collect();

        let loader = FsPaneLoader::new(&tree.root);
        let results: Vec<std::result::Result<ProcessedDocument, FileFailure>> = documents
            .par_iter()
            .map(|path| self.migrate_one(path, &tree.known, &loader))
            .collect();

        // Barrier: every document is written before grouping starts.
        let mut stats = MigrationStats {
            files_scanned: tree.files.len(),
            documents: documents.len(),
            ..Default::default()
        };
        let mut processed = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(doc) => {
                    match doc.kind {
                        DocumentKind::NormalPage => stats.normal_pages += 1,
                        DocumentKind::MergedFramesetPage => stats.merged_framesets += 1,
                        DocumentKind::FallbackFramesetPage => stats.fallback_framesets += 1,
                    }
                    processed.push(doc);
                }
                Err(failure) => failures.push(failure),
            }
        }
        stats.failures = failures.len();

        let merged_panes: AHashSet<String> = processed
            .iter()
            .flat_map(|d| d.panes.iter().cloned())
            .collect();

        let mut candidates = Vec::new();
        let mut fulltext = Vec::new();
        for doc in &processed {
            let title = normalize_title(&doc.strict_title);
            if !eligibility.is_eligible(&doc.path, &title, &merged_panes) {
                continue;
            }
            fulltext.push(FullTextRecord {
                path: doc.path.clone(),
                title: doc.display_title.clone(),
                text: doc.profile.token_string(),
                snippet: doc.profile.snippet(self.config.snippet_chars),
            });
            candidates.push(DedupCandidate {
                path: doc.path.clone(),
                strict_title: title,
                display_title: doc.display_title.clone(),
                text_len: doc.profile.char_len(),
                fingerprint: doc.fingerprint,
                tokens: token_set(&doc.profile.tokens),
            });
        }
        stats.candidates = candidates.len();

        let grouper = DuplicateGrouper::new(Thresholds {
            hamming: self.config.hamming_threshold,
            jaccard: self.config.jaccard_threshold,
        });
        let grouping = grouper.group(&candidates);
        stats.title_groups = grouping.groups;
        stats.groups_with_duplicates = grouping.decisions.len();
        stats.duplicates = grouping.duplicates.len();

        let manifest = build_manifest(&candidates, &grouping.duplicates);
        let report = DedupReport {
            thresholds: grouper.thresholds(),
            decisions: grouping.decisions,
            failures,
        };

        self.write_artifact(&self.config.report_file, &report)?;
        self.write_artifact(&self.config.manifest_file, &manifest)?;
        self.write_artifact(&self.config.fulltext_file, &fulltext)?;

        stats.elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            documents = stats.documents,
            failures = stats.failures,
            candidates = stats.candidates,
            duplicates = stats.duplicates,
            elapsed_ms = stats.elapsed_ms,
            "migration finished"
        );

        Ok(MigrationOutcome {
            stats,
            report,
            manifest,
            fulltext,
        })
    }

    fn migrate_one(
        &self,
        path: &str,
        known: &KnownPaths,
        loader: &FsPaneLoader,
    ) -> std::result::Result<ProcessedDocument, FileFailure> {
        let fail = |e: MigrateError| {
            warn!(path, error = %e, "document skipped");
            FileFailure {
                path: path.to_string(),
                error: e.to_string(),
            }
        };

        let source = self.source.join(path);
        let bytes = fs::read(&source).map_err(|e| fail(MigrateError::io(&source, e)))?;
        let raw = String::from_utf8_lossy(&bytes);

        let doc = process_document(path, &raw, known, self.config, loader);

        let target = self.output.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| fail(MigrateError::io(parent, e)))?;
        }
        fs::write(&target, &doc.html).map_err(|e| fail(MigrateError::io(&target, e)))?;

        debug!(path, kind = doc.kind.as_str(), "document written");
        Ok(doc)
    }

    fn write_artifact<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.output.join(name);
        fs::write(&path, serde_json::to_string_pretty(value)?)
            .map_err(|e| MigrateError::io(&path, e))
    }
}

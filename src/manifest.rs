//! Navigation eligibility and the artifacts handed to the browsing UI.

use crate::config::MigrationConfig;
use crate::dedup::DedupCandidate;
use crate::error::Result;
use crate::paths::{file_name, file_stem, normalize};
use crate::text::is_meaningful_title;
use ahash::AHashSet;
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

/// Placeholder pages that never appear in navigation.
pub const FIXED_EXCLUSIONS: &[&str] = &[
    "index.html",
    "index.htm",
    "blank.html",
    "blank.htm",
    "empty.html",
    "dummy.html",
];

/// File-stem suffixes that mark frameset panes.
const PANE_SUFFIXES: &[&str] = &["_PR1", "_PR2"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavManifestEntry {
    pub title: String,
    pub path: String,
    pub duplicate_flag: bool,
}

/// Per-document full-text record for the search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullTextRecord {
    pub path: String,
    pub title: String,
    /// Space-joined tokens.
    pub text: String,
    pub snippet: String,
}

/// Decides which documents may appear in navigation.
#[derive(Debug, Clone)]
pub struct Eligibility {
    content_root: String,
    excluded: GlobSet,
}

impl Eligibility {
    pub fn new(config: &MigrationConfig) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for name in FIXED_EXCLUSIONS {
            builder.add(
                GlobBuilder::new(&format!("**/{}", name))
                    .case_insensitive(true)
                    .build()?,
            );
        }
        for pattern in &config.exclude {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self {
            content_root: normalize(&config.content_root),
            excluded: builder.build()?,
        })
    }

    pub fn under_content_root(&self, path: &str) -> bool {
        if self.content_root.is_empty() {
            return true;
        }
        path.strip_prefix(&self.content_root)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    /// Matched against both the relative path and the bare file name.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded.is_match(path) || self.excluded.is_match(file_name(path))
    }

    /// Path-only checks: content root, pane suffix, exclusion list, merged panes.
    pub fn path_eligible(&self, path: &str, merged_panes: &AHashSet<String>) -> bool {
        self.under_content_root(path)
            && !is_pane_path(path)
            && !self.is_excluded(path)
            && !merged_panes.contains(path)
    }

    /// Full rule, `normalized_title` being the normalized strict title.
    pub fn is_eligible(
        &self,
        path: &str,
        normalized_title: &str,
        merged_panes: &AHashSet<String>,
    ) -> bool {
        self.path_eligible(path, merged_panes) && is_meaningful_title(normalized_title)
    }
}

pub fn is_pane_path(path: &str) -> bool {
    let stem = file_stem(path);
    PANE_SUFFIXES.iter().any(|suffix| {
        stem.len()
            .checked_sub(suffix.len())
            .and_then(|start| stem.get(start..))
            .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
    })
}

/// One entry per candidate, duplicates flagged, sorted case-insensitively by title.
pub fn build_manifest(
    candidates: &[DedupCandidate],
    duplicates: &AHashSet<String>,
) -> Vec<NavManifestEntry> {
    let mut entries: Vec<NavManifestEntry> = candidates
        .iter()
        .map(|c| NavManifestEntry {
            title: c.display_title.clone(),
            path: c.path.clone(),
            duplicate_flag: duplicates.contains(&c.path),
        })
        .collect();
    entries.sort_by_cached_key(|e| e.title.to_lowercase());
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(path: &str, title: &str) -> DedupCandidate {
        DedupCandidate {
            path: path.to_string(),
            strict_title: title.to_string(),
            display_title: title.to_string(),
            text_len: 0,
            fingerprint: 0,
            tokens: AHashSet::new(),
        }
    }

    #[test]
    fn test_pane_paths() {
        assert!(is_pane_path("man/ABC_PR1.html"));
        assert!(is_pane_path("man/abc_pr2.htm"));
        assert!(!is_pane_path("man/ABC_PR.html"));
        assert!(!is_pane_path("man/ABC_PR3.html"));
        assert!(!is_pane_path("PR1"));
    }

    #[test]
    fn test_eligibility_rules() {
        let config = MigrationConfig {
            content_root: "manuals/".to_string(),
            exclude: vec!["**/menu*.html".to_string()],
            ..Default::default()
        };
        let rules = Eligibility::new(&config).unwrap();
        let panes: AHashSet<String> = ["manuals/left.html".to_string()].into_iter().collect();

        assert!(rules.is_eligible("manuals/eng/p1.html", "Engine", &panes));
        assert!(rules.is_eligible("manuals/p1.html", "Engine", &panes));
        assert!(!rules.is_eligible("other/p1.html", "Engine", &panes));
        assert!(!rules.is_eligible("manualsx/p1.html", "Engine", &panes));
        assert!(!rules.is_eligible("manuals/p1_PR1.html", "Engine", &panes));
        assert!(!rules.is_eligible("manuals/eng/INDEX.html", "Engine", &panes));
        assert!(!rules.is_eligible("manuals/blank.html", "Engine", &panes));
        assert!(!rules.is_eligible("manuals/eng/menu2.html", "Engine", &panes));
        assert!(!rules.is_eligible("manuals/left.html", "Engine", &panes));
        assert!(!rules.is_eligible("manuals/p2.html", "", &panes));
        assert!(!rules.is_eligible("manuals/p2.html", "* * *", &panes));
    }

    #[test]
    fn test_empty_content_root_admits_everything() {
        let rules = Eligibility::new(&MigrationConfig::default()).unwrap();
        assert!(rules.under_content_root("a.html"));
        assert!(rules.under_content_root("x/y/z.html"));
        assert!(rules.is_excluded("index.html"));
        assert!(rules.is_excluded("a/b/Dummy.HTML"));
    }

    #[test]
    fn test_custom_glob_matches_file_name() {
        let config = MigrationConfig {
            exclude: vec!["toc_*.html".to_string()],
            ..Default::default()
        };
        let rules = Eligibility::new(&config).unwrap();
        assert!(rules.is_excluded("deep/dir/toc_1.html"));
        assert!(!rules.is_excluded("deep/dir/body_1.html"));
    }

    #[test]
    fn test_bad_glob_is_an_error() {
        let config = MigrationConfig {
            exclude: vec!["a[".to_string()],
            ..Default::default()
        };
        assert!(Eligibility::new(&config).is_err());
    }

    #[test]
    fn test_build_manifest_sorts_and_flags() {
        let candidates = vec![
            candidate("c.html", "brakes"),
            candidate("a.html", "Engine"),
            candidate("b.html", "Brakes"),
            candidate("d.html", "alternator"),
        ];
        let duplicates: AHashSet<String> = ["b.html".to_string()].into_iter().collect();
        let manifest = build_manifest(&candidates, &duplicates);

        let paths: Vec<&str> = manifest.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["d.html", "c.html", "b.html", "a.html"]);
        assert!(manifest[2].duplicate_flag);
        assert_eq!(manifest.iter().filter(|e| e.duplicate_flag).count(), 1);
    }
}

//! Title-grouped near-duplicate detection.
//!
//! Candidates sharing a normalized title form a group. The longest document
//! (by normalized text) is elected canonical and every other member is
//! compared against it alone: first by SimHash Hamming distance, then by
//! Jaccard similarity of distinct tokens. Members are never compared with
//! each other, so two near-identical non-canonical pages that both differ
//! from the canonical stay distinct.

use crate::simhash::{hamming_distance, jaccard_similarity};
use crate::text::is_meaningful_title;
use ahash::{AHashMap, AHashSet};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Everything the grouper needs to know about one navigation-eligible document.
#[derive(Debug, Clone)]
pub struct DedupCandidate {
    pub path: String,
    /// Normalized strict title, the grouping key.
    pub strict_title: String,
    pub display_title: String,
    /// Normalized text length in characters.
    pub text_len: usize,
    pub fingerprint: u64,
    pub tokens: AHashSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Maximum differing bits for the fingerprint rule.
    pub hamming: u32,
    /// Minimum token-set similarity for the fallback rule.
    pub jaccard: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            hamming: 3,
            jaccard: 0.98,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateRule {
    Hamming,
    Jaccard,
}

/// Why one member was classified duplicate of its canonical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateMatch {
    pub path: String,
    pub rule: DuplicateRule,
    pub hamming: u32,
    /// Only computed when the Hamming rule did not fire.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jaccard: Option<f64>,
}

/// One record per title group that has at least one duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupDecision {
    pub title: String,
    pub canonical_path: String,
    /// Canonical first, then distinct members in group order.
    pub kept_paths: Vec<String>,
    pub duplicate_paths: Vec<String>,
    pub threshold_reason: String,
    pub matches: Vec<DuplicateMatch>,
}

/// Output of a grouping pass.
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    pub decisions: Vec<DedupDecision>,
    pub duplicates: AHashSet<String>,
    pub groups: usize,
}

pub struct DuplicateGrouper {
    thresholds: Thresholds,
}

impl DuplicateGrouper {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Classify `member` against `canonical`; `None` keeps it as a distinct entry.
    pub fn classify(
        &self,
        canonical: &DedupCandidate,
        member: &DedupCandidate,
    ) -> Option<DuplicateMatch> {
        let hamming = hamming_distance(canonical.fingerprint, member.fingerprint);
        if hamming <= self.thresholds.hamming {
            return Some(DuplicateMatch {
                path: member.path.clone(),
                rule: DuplicateRule::Hamming,
                hamming,
                jaccard: None,
            });
        }

        let jaccard = jaccard_similarity(&canonical.tokens, &member.tokens);
        (jaccard >= self.thresholds.jaccard).then(|| DuplicateMatch {
            path: member.path.clone(),
            rule: DuplicateRule::Jaccard,
            hamming,
            jaccard: Some(jaccard),
        })
    }

    /// Group `candidates` (in scan order) by title and classify every group.
    pub fn group(&self, candidates: &[DedupCandidate]) -> Grouping {
        let mut order: Vec<&str> = Vec::new();
        let mut groups: AHashMap<&str, Vec<&DedupCandidate>> = AHashMap::new();
        for candidate in candidates {
            if !is_meaningful_title(&candidate.strict_title) {
                continue;
            }
            let members = groups.entry(&candidate.strict_title).or_insert_with(|| {
                order.push(&candidate.strict_title);
                Vec::new()
            });
            members.push(candidate);
        }

        let mut grouping = Grouping {
            groups: order.len(),
            ..Default::default()
        };

        for title in order {
            let Some(mut members) = groups.remove(title) else {
                continue;
            };
            if members.len() < 2 {
                continue;
            }
            // Stable: equal lengths keep scan order.
            members.sort_by(|a, b| b.text_len.cmp(&a.text_len));
            let canonical = members[0];

            let verdicts: Vec<(&DedupCandidate, Option<DuplicateMatch>)> = members[1..]
                .par_iter()
                .map(|member| (*member, self.classify(canonical, member)))
                .collect();

            let mut kept_paths = vec![canonical.path.clone()];
            let mut matches = Vec::new();
            for (member, verdict) in verdicts {
                match verdict {
                    Some(m) => matches.push(m),
                    None => kept_paths.push(member.path.clone()),
                }
            }

            if matches.is_empty() {
                continue;
            }

            debug!(
                title = %title,
                canonical = %canonical.path,
                duplicates = matches.len(),
                "duplicate group"
            );

            let duplicate_paths: Vec<String> = matches.iter().map(|m| m.path.clone()).collect();
            grouping.duplicates.extend(duplicate_paths.iter().cloned());
            grouping.decisions.push(DedupDecision {
                title: title.to_string(),
                canonical_path: canonical.path.clone(),
                kept_paths,
                duplicate_paths,
                threshold_reason: self.reason(&matches),
                matches,
            });
        }

        grouping
    }

    fn reason(&self, matches: &[DuplicateMatch]) -> String {
        let mut parts = Vec::new();
        if matches.iter().any(|m| m.rule == DuplicateRule::Hamming) {
            parts.push(format!("Hamming ≤ {}", self.thresholds.hamming));
        }
        if matches.iter().any(|m| m.rule == DuplicateRule::Jaccard) {
            parts.push(format!("Jaccard ≥ {}", self.thresholds.jaccard));
        }
        parts.join(" + ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(path: &str, title: &str, text_len: usize, fingerprint: u64, tokens: &[&str]) -> DedupCandidate {
        DedupCandidate {
            path: path.to_string(),
            strict_title: title.to_string(),
            display_title: title.to_string(),
            text_len,
            fingerprint,
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn grouper() -> DuplicateGrouper {
        DuplicateGrouper::new(Thresholds::default())
    }

    /// `shared` common words plus words unique to each side.
    fn word_sets(shared: usize, only_a: usize, only_b: usize) -> (Vec<String>, Vec<String>) {
        let common: Vec<String> = (0..shared).map(|i| format!("word{}", i)).collect();
        let mut a = common.clone();
        a.extend((0..only_a).map(|i| format!("alpha{}", i)));
        let mut b = common;
        b.extend((0..only_b).map(|i| format!("beta{}", i)));
        (a, b)
    }

    #[test]
    fn test_hamming_rule_longest_is_canonical() {
        let fp = 0xF0F0_F0F0_F0F0_F0F0u64;
        let candidates = vec![
            candidate("b.html", "Engine Removal Procedure", 480, fp ^ 0b11, &["engine"]),
            candidate("a.html", "Engine Removal Procedure", 500, fp, &["removal"]),
        ];
        let grouping = grouper().group(&candidates);

        assert_eq!(grouping.decisions.len(), 1);
        let decision = &grouping.decisions[0];
        assert_eq!(decision.canonical_path, "a.html");
        assert_eq!(decision.kept_paths, vec!["a.html"]);
        assert_eq!(decision.duplicate_paths, vec!["b.html"]);
        assert_eq!(decision.threshold_reason, "Hamming ≤ 3");
        assert_eq!(decision.matches[0].hamming, 2);
        assert!(grouping.duplicates.contains("b.html"));
        assert!(!grouping.duplicates.contains("a.html"));
    }

    #[test]
    fn test_jaccard_fallback() {
        let (a, mut b) = word_sets(99, 0, 0);
        // 99 shared of 100 total distinct tokens: 0.99
        b.push("extra".to_string());
        let a: Vec<&str> = a.iter().map(String::as_str).collect();
        let b: Vec<&str> = b.iter().map(String::as_str).collect();
        let candidates = vec![
            candidate("long.html", "Torque", 900, 0, &a),
            candidate("short.html", "Torque", 800, 0b11_1111_1111, &b),
        ];
        let grouping = grouper().group(&candidates);

        let decision = &grouping.decisions[0];
        assert_eq!(decision.duplicate_paths, vec!["short.html"]);
        assert_eq!(decision.threshold_reason, "Jaccard ≥ 0.98");
        let m = &decision.matches[0];
        assert_eq!(m.rule, DuplicateRule::Jaccard);
        assert_eq!(m.hamming, 10);
        assert!((m.jaccard.unwrap() - 0.99).abs() < 1e-9);
    }

    #[test]
    fn test_distinct_member_is_kept() {
        let (a, b) = word_sets(50, 50, 50);
        let a: Vec<&str> = a.iter().map(String::as_str).collect();
        let b: Vec<&str> = b.iter().map(String::as_str).collect();
        let candidates = vec![
            candidate("x.html", "Wiring", 300, 0, &a),
            candidate("y.html", "Wiring", 200, u64::MAX, &b),
        ];
        let grouping = grouper().group(&candidates);
        assert!(grouping.decisions.is_empty());
        assert!(grouping.duplicates.is_empty());
        assert_eq!(grouping.groups, 1);
    }

    #[test]
    fn test_star_topology_only_compares_to_canonical() {
        // b and c are identical to each other but far from the canonical a.
        let candidates = vec![
            candidate("a.html", "Brakes", 1000, 0, &["pads", "rotor"]),
            candidate("b.html", "Brakes", 500, u64::MAX, &["caliper", "fluid"]),
            candidate("c.html", "Brakes", 400, u64::MAX, &["caliper", "fluid"]),
        ];
        let grouping = grouper().group(&candidates);
        assert!(grouping.decisions.is_empty());
    }

    #[test]
    fn test_mixed_rules_and_kept_members() {
        let candidates = vec![
            candidate("c.html", "Fuel", 100, 0, &["pump", "line"]),
            candidate("a.html", "Fuel", 300, 0, &["pump", "filter"]),
            candidate("b.html", "Fuel", 200, u64::MAX, &["pump", "filter"]),
            candidate("d.html", "Fuel", 50, u64::MAX, &["tank"]),
        ];
        let grouping = grouper().group(&candidates);
        let decision = &grouping.decisions[0];
        assert_eq!(decision.canonical_path, "a.html");
        assert_eq!(decision.kept_paths, vec!["a.html", "d.html"]);
        assert_eq!(decision.duplicate_paths, vec!["b.html", "c.html"]);
        assert_eq!(decision.threshold_reason, "Hamming ≤ 3 + Jaccard ≥ 0.98");
    }

    #[test]
    fn test_equal_lengths_keep_scan_order() {
        let candidates = vec![
            candidate("first.html", "Same", 100, 1, &["x"]),
            candidate("second.html", "Same", 100, 1, &["x"]),
        ];
        let decision = &grouper().group(&candidates).decisions[0];
        assert_eq!(decision.canonical_path, "first.html");
        assert_eq!(decision.duplicate_paths, vec!["second.html"]);
    }

    #[test]
    fn test_meaningless_titles_are_not_grouped() {
        let candidates = vec![
            candidate("a.html", "", 10, 0, &[]),
            candidate("b.html", "", 10, 0, &[]),
            candidate("c.html", "---", 10, 0, &[]),
            candidate("d.html", "---", 10, 0, &[]),
        ];
        let grouping = grouper().group(&candidates);
        assert!(grouping.decisions.is_empty());
        assert_eq!(grouping.groups, 0);
    }

    #[test]
    fn test_empty_token_sets_are_fully_similar() {
        let canonical = candidate("a.html", "T", 0, 0, &[]);
        let member = candidate("b.html", "T", 0, u64::MAX, &[]);
        let verdict = grouper().classify(&canonical, &member).unwrap();
        assert_eq!(verdict.rule, DuplicateRule::Jaccard);
        assert_eq!(verdict.jaccard, Some(1.0));
    }
}

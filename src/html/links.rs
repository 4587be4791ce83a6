//! Rewrites `javascript:parent.Xxx(...)` navigation anchors into real relative paths.
//!
//! The legacy viewer exposed three functions on its parent frame:
//! `Prt(id[, page])` opens a related document, `Cts(id)` opens a contents
//! entry, and `Jmp(id)` scrolls to an in-page anchor.

use super::{attr, find_all, set_attr};
use crate::paths::{normalize, parent_dir, KnownPaths};
use markup5ever_rcdom::Handle;
use regex::Regex;
use std::sync::OnceLock;

/// Scheme prefix that marks an href as a legacy navigation call.
pub const PSEUDO_PROTOCOL_PREFIX: &str = "javascript:parent.";

/// Inert target written when a call cannot be mapped to a document.
pub const INERT_HREF: &str = "#";

/// Candidate file names tried for `Prt` / `Cts`, in priority order.
const CANDIDATE_SUFFIXES: &[&str] = &[".html", "_PR.html", "_PR1.html", "_PR2.html"];

fn call_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*\(\s*['"]([^'"]*)['"]\s*(?:,\s*['"]?([^'")]*?)['"]?\s*)?\)\s*;?\s*$"#,
        )
        .expect("static regex")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Prt,
    Cts,
    Jmp,
}

/// Parsed payload of a pseudo-protocol href.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyCall {
    Call {
        kind: CallKind,
        id: String,
        /// Page argument of `Prt`; accepted but never used for targeting.
        extra: Option<String>,
    },
    Unrecognized,
}

impl LegacyCall {
    /// Parse an href. `None` when it is not a pseudo-protocol link at all.
    pub fn parse(href: &str) -> Option<Self> {
        let trimmed = href.trim_start();
        let prefix = trimmed.get(..PSEUDO_PROTOCOL_PREFIX.len())?;
        if !prefix.eq_ignore_ascii_case(PSEUDO_PROTOCOL_PREFIX) {
            return None;
        }
        let payload = &trimmed[PSEUDO_PROTOCOL_PREFIX.len()..];

        let Some(caps) = call_pattern().captures(payload) else {
            return Some(Self::Unrecognized);
        };
        let kind = match &caps[1] {
            "Prt" => CallKind::Prt,
            "Cts" => CallKind::Cts,
            "Jmp" => CallKind::Jmp,
            _ => return Some(Self::Unrecognized),
        };
        let id = caps[2].trim().to_string();
        let extra = caps
            .get(3)
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty());

        // Only Prt takes a second argument.
        if extra.is_some() && kind != CallKind::Prt {
            return Some(Self::Unrecognized);
        }
        if id.is_empty() {
            return Some(Self::Unrecognized);
        }
        Some(Self::Call { kind, id, extra })
    }
}

/// Map a parsed call to an href, relative to the directory of `doc_path`.
pub fn resolve_call(call: &LegacyCall, doc_path: &str, known: &KnownPaths) -> String {
    match call {
        LegacyCall::Call {
            kind: CallKind::Prt | CallKind::Cts,
            id,
            ..
        } => {
            let dir = parent_dir(doc_path);
            CANDIDATE_SUFFIXES
                .iter()
                .map(|suffix| format!("{}{}", id, suffix))
                .find(|candidate| {
                    let key = if dir.is_empty() {
                        normalize(candidate)
                    } else {
                        normalize(&format!("{}/{}", dir, candidate))
                    };
                    known.contains(&key)
                })
                .unwrap_or_else(|| INERT_HREF.to_string())
        }
        LegacyCall::Call {
            kind: CallKind::Jmp,
            ..
        }
        | LegacyCall::Unrecognized => INERT_HREF.to_string(),
    }
}

/// Counts from one resolution pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkStats {
    pub resolved: usize,
    pub inert: usize,
}

/// Rewrite every pseudo-protocol anchor under `root`; other anchors are untouched.
pub fn resolve_links(root: &Handle, doc_path: &str, known: &KnownPaths) -> LinkStats {
    let mut stats = LinkStats::default();
    for anchor in find_all(root, "a") {
        let Some(href) = attr(&anchor, "href") else {
            continue;
        };
        let Some(call) = LegacyCall::parse(&href) else {
            continue;
        };
        let target = resolve_call(&call, doc_path, known);
        if target == INERT_HREF {
            stats.inert += 1;
        } else {
            stats.resolved += 1;
        }
        set_attr(&anchor, "href", &target);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::{parse, to_html};

    #[test]
    fn test_parse_calls() {
        assert_eq!(
            LegacyCall::parse("javascript:parent.Prt('ABC123')"),
            Some(LegacyCall::Call {
                kind: CallKind::Prt,
                id: "ABC123".to_string(),
                extra: None
            })
        );
        assert_eq!(
            LegacyCall::parse("JavaScript:parent.Prt(\"X9\", 4);"),
            Some(LegacyCall::Call {
                kind: CallKind::Prt,
                id: "X9".to_string(),
                extra: Some("4".to_string())
            })
        );
        assert_eq!(
            LegacyCall::parse("javascript:parent.Cts('c01')"),
            Some(LegacyCall::Call {
                kind: CallKind::Cts,
                id: "c01".to_string(),
                extra: None
            })
        );
        assert_eq!(
            LegacyCall::parse("javascript:parent.Foo('x')"),
            Some(LegacyCall::Unrecognized)
        );
        assert_eq!(
            LegacyCall::parse("javascript:parent.Prt(ABC)"),
            Some(LegacyCall::Unrecognized)
        );
        assert_eq!(
            LegacyCall::parse("javascript:parent.Jmp('a', 2)"),
            Some(LegacyCall::Unrecognized)
        );
        assert_eq!(LegacyCall::parse("page.html"), None);
        assert_eq!(LegacyCall::parse("javascript:void(0)"), None);
    }

    #[test]
    fn test_prt_prefers_candidates_in_order() {
        let known = KnownPaths::new(["man/ABC123_PR1.html", "man/ABC123_PR2.html"]);
        let call = LegacyCall::parse("javascript:parent.Prt('ABC123')").unwrap();
        assert_eq!(resolve_call(&call, "man/page.html", &known), "ABC123_PR1.html");

        let known = KnownPaths::new(["man/ABC123.html", "man/ABC123_PR1.html"]);
        assert_eq!(resolve_call(&call, "man/page.html", &known), "ABC123.html");

        let known = KnownPaths::new(["ABC123_PR.html"]);
        assert_eq!(resolve_call(&call, "top.html", &known), "ABC123_PR.html");
    }

    #[test]
    fn test_candidates_are_relative_to_current_directory() {
        let known = KnownPaths::new(["other/ABC123.html"]);
        let call = LegacyCall::parse("javascript:parent.Cts('ABC123')").unwrap();
        assert_eq!(resolve_call(&call, "man/page.html", &known), INERT_HREF);
    }

    #[test]
    fn test_jmp_is_always_inert() {
        let known = KnownPaths::new(["i220.html", "i220_PR.html"]);
        let call = LegacyCall::parse("javascript:parent.Jmp('i220')").unwrap();
        assert_eq!(resolve_call(&call, "page.html", &known), INERT_HREF);
    }

    #[test]
    fn test_resolve_links_rewrites_only_pseudo_anchors() {
        let dom = parse(
            r#"<body>
            <a href="javascript:parent.Prt('ABC123', '2')">rel</a>
            <a href="javascript:parent.Jmp('i220')">jump</a>
            <a href="javascript:parent.Cts('missing')">gone</a>
            <a href="plain.html">plain</a>
            </body>"#,
        );
        let known = KnownPaths::new(["ABC123_PR1.html", "plain.html"]);
        let stats = resolve_links(&dom.document, "page.html", &known);
        assert_eq!(stats, LinkStats { resolved: 1, inert: 2 });

        let html = to_html(&dom);
        assert!(html.contains(r#"href="ABC123_PR1.html""#));
        assert!(html.contains(r#"href="plain.html""#));
        assert_eq!(html.matches(r##"href="#""##).count(), 2);
        assert!(!html.contains("javascript:"));
    }
}

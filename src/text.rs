//! Comparable text: normalization, tokenization, title cleanup.

use crate::html::{body, visible_text};
use markup5ever_rcdom::RcDom;

/// Tokens of this many characters or fewer are noise.
const MAX_NOISE_TOKEN_CHARS: usize = 2;

/// Zero-width and formatting characters that render as nothing.
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}' | '\u{200B}'..='\u{200F}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}'
    )
}

/// Normalized body text plus its tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextProfile {
    pub normalized: String,
    pub tokens: Vec<String>,
}

impl TextProfile {
    pub fn from_dom(dom: &RcDom) -> Self {
        let raw = body(dom).map(|b| visible_text(&b)).unwrap_or_default();
        Self::from_text(&raw)
    }

    pub fn from_text(raw: &str) -> Self {
        let normalized = normalize_text(raw);
        let tokens = tokenize(&normalized);
        Self { normalized, tokens }
    }

    /// Length in characters, the canonical-election key.
    pub fn char_len(&self) -> usize {
        self.normalized.chars().count()
    }

    /// First `max_chars` characters of the normalized text.
    pub fn snippet(&self, max_chars: usize) -> String {
        self.normalized.chars().take(max_chars).collect()
    }

    pub fn token_string(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Lowercase; every run of control or non letter/digit/whitespace characters
/// becomes one space; whitespace collapses; ends trimmed.
pub fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for c in raw.chars().flat_map(char::to_lowercase) {
        let keep = !c.is_control() && !c.is_whitespace() && c.is_alphanumeric();
        if keep {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Whitespace split, dropping tokens of two characters or fewer.
pub fn tokenize(normalized: &str) -> Vec<String> {
    normalized
        .split_whitespace()
        .filter(|t| t.chars().count() > MAX_NOISE_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Grouping key for titles: invisible characters stripped, whitespace collapsed.
pub fn normalize_title(title: &str) -> String {
    let visible: String = title.chars().filter(|c| !is_invisible(*c)).collect();
    collapse_whitespace(&visible)
}

/// A title is meaningful when it has at least one letter or digit.
pub fn is_meaningful_title(title: &str) -> bool {
    title.chars().any(char::is_alphanumeric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Hello,   WORLD!! "), "hello world");
        assert_eq!(normalize_text("a\u{0007}\u{0008}b"), "a b");
        assert_eq!(normalize_text("x--y__z"), "x y z");
        assert_eq!(normalize_text("Ölfilter: 12 Nm"), "ölfilter 12 nm");
        assert_eq!(normalize_text("エンジン　取り外し"), "エンジン 取り外し");
        assert_eq!(normalize_text("!!!"), "");
    }

    #[test]
    fn test_tokenize_drops_short_tokens() {
        let tokens = tokenize("the engine is at a 90 degree angle");
        assert_eq!(tokens, vec!["the", "engine", "degree", "angle"]);
        assert_eq!(tokenize("日本語 ab"), vec!["日本語"]);
    }

    #[test]
    fn test_profile_from_dom_uses_body_only() {
        let dom = parse(
            "<html><head><title>Ignored Title</title></head><body><h1>Remove Engine</h1><script>bad()</script><p>Loosen the bolts.</p></body></html>",
        );
        let profile = TextProfile::from_dom(&dom);
        assert_eq!(profile.normalized, "remove engine loosen the bolts");
        assert_eq!(profile.tokens, vec!["remove", "engine", "loosen", "the", "bolts"]);
        assert_eq!(profile.char_len(), 30);
        assert_eq!(profile.snippet(6), "remove");
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title(" Engine\u{200B}  Removal\n"), "Engine Removal");
        assert_eq!(normalize_title("\u{FEFF}"), "");
    }

    #[test]
    fn test_is_meaningful_title() {
        assert!(is_meaningful_title("Engine"));
        assert!(is_meaningful_title("1"));
        assert!(!is_meaningful_title(""));
        assert!(!is_meaningful_title(" - * - "));
    }
}

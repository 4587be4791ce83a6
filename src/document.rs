//! Documents and the title fallback chain.

use crate::html::{self, headings, text_content};
use crate::paths::file_stem;
use crate::text::normalize_title;
use markup5ever_rcdom::{Handle, RcDom};
use serde::{Deserialize, Serialize};

/// How the output page was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    NormalPage,
    MergedFramesetPage,
    FallbackFramesetPage,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NormalPage => "normal",
            Self::MergedFramesetPage => "merged_frameset",
            Self::FallbackFramesetPage => "fallback_frameset",
        }
    }
}

/// A parsed source document.
pub struct Document {
    /// Relative, slash-normalized corpus key.
    pub path: String,
    pub dom: RcDom,
    /// Exact content of the first `<title>`, empty when missing.
    pub strict_title: String,
}

impl Document {
    pub fn parse(path: impl Into<String>, raw: &str) -> Self {
        let dom = html::parse(raw);
        let strict_title = strict_title(&dom);
        Self {
            path: path.into(),
            dom,
            strict_title,
        }
    }

    /// Strict title, else first heading, else file name.
    pub fn display_title(&self) -> String {
        display_title(&self.strict_title, &[&self.dom.document], &self.path)
    }
}

pub fn strict_title(dom: &RcDom) -> String {
    html::find_first(&dom.document, "title")
        .map(|t| text_content(&t))
        .unwrap_or_default()
}

/// First non-empty of (each title-normalized): the strict title, the first heading found in `roots`
/// (searched in order), the file stem of `path`.
pub fn display_title(strict: &str, roots: &[&Handle], path: &str) -> String {
    let strict = normalize_title(strict);
    if !strict.is_empty() {
        return strict;
    }
    roots
        .iter()
        .flat_map(|root| headings(root))
        .map(|h| normalize_title(&text_content(&h)))
        .find(|text| !text.is_empty())
        .unwrap_or_else(|| file_stem(path).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_title_is_exact() {
        let doc = Document::parse("a.html", "<title>  Engine\n Removal </title><h1>H</h1>");
        assert_eq!(doc.strict_title, "  Engine\n Removal ");
        assert_eq!(doc.display_title(), "Engine Removal");
    }

    #[test]
    fn test_display_title_falls_back_to_heading() {
        let doc = Document::parse("a.html", "<title> </title><body><h2> Torque  Specs</h2></body>");
        assert_eq!(doc.display_title(), "Torque Specs");
    }

    #[test]
    fn test_display_title_falls_back_to_file_name() {
        let doc = Document::parse("man/CH01_PR1.html", "<body><p>text</p></body>");
        assert_eq!(doc.strict_title, "");
        assert_eq!(doc.display_title(), "CH01_PR1");
    }

    #[test]
    fn test_display_title_skips_empty_headings() {
        let doc = Document::parse("x.html", "<h1> </h1><h3>Second</h3>");
        assert_eq!(doc.display_title(), "Second");
    }

    #[test]
    fn test_display_title_drops_invisible_characters() {
        let doc = Document::parse("x.html", "<title>Fuel\u{200B} Pump\u{FEFF}</title>");
        assert_eq!(doc.display_title(), "Fuel Pump");
        let doc = Document::parse("y.html", "<title>\u{200B}</title><h1>Oil\u{00AD} Filter</h1>");
        assert_eq!(doc.display_title(), "Oil Filter");
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(DocumentKind::NormalPage.as_str(), "normal");
        assert_eq!(DocumentKind::MergedFramesetPage.as_str(), "merged_frameset");
        assert_eq!(DocumentKind::FallbackFramesetPage.as_str(), "fallback_frameset");
    }
}

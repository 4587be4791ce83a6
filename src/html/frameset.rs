//! Turns frame-based pages into single self-contained pages.
//!
//! Exactly two frames are merged side by side; any other frame count becomes
//! a listing page that links to each frame's target.

use super::sanitize::sanitize;
use super::{append_child, attr, body, find_all, find_first, move_children};
use super::{new_element, new_text, parse, set_text};
use crate::config::MigrationConfig;
use crate::document::{display_title, Document, DocumentKind};
use crate::paths::{resolve_reference, KnownPaths};
use markup5ever_rcdom::{Handle, RcDom};
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};

const MERGED_SKELETON: &str = concat!(
    "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title></title>",
    "<style>.framelift-panes{display:flex;align-items:flex-start}",
    ".framelift-pane{flex:1 1 50%;min-width:0;overflow:auto}</style>",
    "</head><body><div class=\"framelift-panes\">",
    "<div class=\"framelift-pane\" id=\"framelift-pane-1\"></div>",
    "<div class=\"framelift-pane\" id=\"framelift-pane-2\"></div>",
    "</div></body></html>"
);

const LISTING_SKELETON: &str = concat!(
    "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title></title></head>",
    "<body><h1></h1><ul class=\"framelift-frames\"></ul></body></html>"
);

/// A `<frame>` as declared in the host page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRef {
    pub name: Option<String>,
    pub src: Option<String>,
}

impl FrameRef {
    fn from_element(handle: &Handle) -> Self {
        let non_empty = |v: String| {
            let v = v.trim().to_string();
            (!v.is_empty()).then_some(v)
        };
        Self {
            name: attr(handle, "name").and_then(non_empty),
            src: attr(handle, "src").and_then(non_empty),
        }
    }

    /// Declared name, else target path, else the word "frame".
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.src.as_deref())
            .unwrap_or("frame")
    }
}

/// A page is frame-based iff it has a frame container and at least one frame.
pub fn frame_refs(dom: &RcDom) -> Option<Vec<FrameRef>> {
    find_first(&dom.document, "frameset")?;
    let frames: Vec<FrameRef> = find_all(&dom.document, "frame")
        .iter()
        .map(FrameRef::from_element)
        .collect();
    (!frames.is_empty()).then_some(frames)
}

/// Reads pane documents. Kept as a seam so merging can run without a filesystem.
pub trait PaneLoader: Sync {
    fn load(&self, path: &str) -> io::Result<String>;
}

/// Loads panes from the source tree.
#[derive(Debug, Clone)]
pub struct FsPaneLoader {
    root: PathBuf,
}

impl FsPaneLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PaneLoader for FsPaneLoader {
    fn load(&self, path: &str) -> io::Result<String> {
        let bytes = fs::read(self.root.join(path))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Result of merging or replacing a frameset host.
pub struct FramesetPage {
    pub dom: RcDom,
    pub kind: DocumentKind,
    /// Source paths consumed as panes; they never become navigation entries.
    pub panes: Vec<String>,
}

pub struct FramesetMerger<'a> {
    known: &'a KnownPaths,
    config: &'a MigrationConfig,
    loader: &'a dyn PaneLoader,
}

impl<'a> FramesetMerger<'a> {
    pub fn new(
        known: &'a KnownPaths,
        config: &'a MigrationConfig,
        loader: &'a dyn PaneLoader,
    ) -> Self {
        Self {
            known,
            config,
            loader,
        }
    }

    /// `None` when `host` is not frame-based.
    pub fn transform(&self, host: &Document) -> Option<FramesetPage> {
        let frames = frame_refs(&host.dom)?;
        let page = if frames.len() == 2 {
            self.merge_two(host, &frames[0], &frames[1])
        } else {
            self.listing(host, &frames)
        };
        debug!(
            path = %host.path,
            frames = frames.len(),
            kind = page.kind.as_str(),
            "frameset transformed"
        );
        Some(page)
    }

    /// Load and sanitize one pane; a missing or non-document target is empty.
    fn load_pane(&self, host: &Document, frame: &FrameRef) -> Option<(String, RcDom)> {
        let src = frame.src.as_deref()?;
        let path = resolve_reference(&host.path, src);
        if !self.known.contains(&path) || !self.config.is_document(&path) {
            debug!(host = %host.path, pane = %path, "pane target missing, using empty region");
            return None;
        }
        match self.loader.load(&path) {
            Ok(raw) => {
                let dom = parse(&raw);
                sanitize(&dom, false);
                Some((path, dom))
            }
            Err(e) => {
                warn!(host = %host.path, pane = %path, error = %e, "failed to read pane, using empty region");
                None
            }
        }
    }

    fn merge_two(&self, host: &Document, first: &FrameRef, second: &FrameRef) -> FramesetPage {
        let loaded = [self.load_pane(host, first), self.load_pane(host, second)];

        let dom = parse(MERGED_SKELETON);
        let regions: Vec<Handle> = find_all(&dom.document, "div")
            .into_iter()
            .filter(|d| attr(d, "class").as_deref() == Some("framelift-pane"))
            .collect();

        let pane_roots: Vec<&Handle> = loaded
            .iter()
            .flatten()
            .map(|(_, pane)| &pane.document)
            .collect();
        let title = display_title(&host.strict_title, &pane_roots, &host.path);
        set_document_title(&dom, &title);

        for (region, pane) in regions.iter().zip(loaded.iter()) {
            if let Some(pane_body) = pane.as_ref().and_then(|(_, p)| body(p)) {
                move_children(&pane_body, region);
            }
        }

        FramesetPage {
            dom,
            kind: DocumentKind::MergedFramesetPage,
            panes: loaded.into_iter().flatten().map(|(path, _)| path).collect(),
        }
    }

    fn listing(&self, host: &Document, frames: &[FrameRef]) -> FramesetPage {
        let dom = parse(LISTING_SKELETON);
        let title = display_title(&host.strict_title, &[&host.dom.document], &host.path);
        set_document_title(&dom, &title);
        if let Some(h1) = find_first(&dom.document, "h1") {
            set_text(&h1, &title);
        }

        if let Some(list) = find_first(&dom.document, "ul") {
            for frame in frames {
                let href = frame.src.as_deref().unwrap_or("#");
                let link = new_element("a", &[("href", href)]);
                append_child(&link, new_text(frame.label()));
                let item = new_element("li", &[]);
                append_child(&item, link);
                append_child(&list, item);
            }
        }

        FramesetPage {
            dom,
            kind: DocumentKind::FallbackFramesetPage,
            panes: Vec::new(),
        }
    }
}

fn set_document_title(dom: &RcDom, title: &str) {
    if let Some(el) = find_first(&dom.document, "title") {
        set_text(&el, title);
    }
}

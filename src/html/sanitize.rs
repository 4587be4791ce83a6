//! Strips frame containers, plugin-hook scripts and inline event handlers.

use super::{append_child, attr, ensure_head, find_all, is_element, new_element, prepend_child};
use super::{remove_where, retain_attrs, text_content};
use markup5ever_rcdom::{Handle, RcDom};
use regex::Regex;
use std::sync::OnceLock;

/// Names that identify ActiveX / HTA style automation hooks.
fn plugin_hook_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(activexobject|activex|\.hta\b|mshta|hta:application|wscript|shell\.application|scripting\.filesystemobject|clsid:)",
        )
        .expect("static regex")
    })
}

fn event_handler_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^on[a-z0-9_]+$").expect("static regex"))
}

/// What a sanitize pass removed, for logging.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeStats {
    pub frame_containers: usize,
    pub scripts: usize,
    pub event_handlers: usize,
}

/// Clean `dom` in place and make sure it declares a charset and has a `<title>`.
pub fn sanitize(dom: &RcDom, preserve_scripts: bool) -> SanitizeStats {
    let mut stats = SanitizeStats {
        frame_containers: remove_where(&dom.document, &mut |h| is_element(h, "frameset")),
        ..Default::default()
    };

    if !preserve_scripts {
        stats.scripts = remove_where(&dom.document, &mut is_plugin_hook_script);
    }

    stats.event_handlers = strip_event_handlers(&dom.document);
    ensure_charset(dom);
    ensure_title(dom);
    stats
}

fn is_plugin_hook_script(handle: &Handle) -> bool {
    if !is_element(handle, "script") {
        return false;
    }
    let pattern = plugin_hook_pattern();
    attr(handle, "src").is_some_and(|src| pattern.is_match(&src))
        || pattern.is_match(&text_content(handle))
}

fn strip_event_handlers(root: &Handle) -> usize {
    let pattern = event_handler_pattern();
    let mut removed = 0;
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        removed += retain_attrs(&node, |name| !pattern.is_match(name));
        stack.extend(node.children.borrow().iter().cloned());
    }
    removed
}

fn is_charset_meta(handle: &Handle) -> bool {
    if !is_element(handle, "meta") {
        return false;
    }
    attr(handle, "charset").is_some()
        || attr(handle, "http-equiv").is_some_and(|v| v.eq_ignore_ascii_case("content-type"))
}

/// Output is always written as UTF-8, so stale legacy declarations are replaced.
fn ensure_charset(dom: &RcDom) {
    remove_where(&dom.document, &mut is_charset_meta);
    let head = ensure_head(dom);
    prepend_child(&head, new_element("meta", &[("charset", "utf-8")]));
}

fn ensure_title(dom: &RcDom) {
    if !find_all(&dom.document, "title").is_empty() {
        return;
    }
    let head = ensure_head(dom);
    append_child(&head, new_element("title", &[]));
}

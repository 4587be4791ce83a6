//! Thin helpers over the html5ever RcDom tree.
//!
//! Parsing never fails: html5ever recovers from any malformed input, so every
//! helper here works on whatever structure the tree builder produced.

pub mod frameset;
pub mod links;
pub mod sanitize;

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{parse_document, Attribute, LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};
use std::cell::RefCell;
use std::rc::Rc;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Subtrees that never contribute visible text.
const NON_RENDERED: &[&str] = &["script", "style", "noscript", "template", "noframes"];

/// Elements that break the text flow; adjacent text across them is separated.
const BLOCK_LEVEL: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "br", "caption", "center", "dd", "dir",
    "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3",
    "h4", "h5", "h6", "header", "hr", "li", "main", "menu", "nav", "ol", "p", "pre", "section",
    "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Parse a full document, best effort.
pub fn parse(markup: &str) -> RcDom {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            scripting_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    parse_document(RcDom::default(), opts).one(markup)
}

/// Serialize the whole document, doctype included.
pub fn to_html(dom: &RcDom) -> String {
    serialize_scope(&dom.document, TraversalScope::ChildrenOnly(None))
}

fn serialize_scope(handle: &Handle, scope: TraversalScope) -> String {
    let mut bytes = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: scope,
        ..Default::default()
    };
    let node: SerializableHandle = handle.clone().into();
    // Writing into a Vec cannot fail.
    let _ = serialize(&mut bytes, &node, opts);
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Lowercase local name of an element, `None` for other node kinds.
pub fn tag(handle: &Handle) -> Option<&str> {
    match &handle.data {
        NodeData::Element { name, .. } => Some(&*name.local),
        _ => None,
    }
}

pub fn is_element(handle: &Handle, name: &str) -> bool {
    tag(handle) == Some(name)
}

pub fn attr(handle: &Handle, name: &str) -> Option<String> {
    match &handle.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| (*a.name.local).eq_ignore_ascii_case(name))
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

pub fn set_attr(handle: &Handle, name: &str, value: &str) {
    if let NodeData::Element { attrs, .. } = &handle.data {
        let mut attrs = attrs.borrow_mut();
        let existing = attrs
            .iter_mut()
            .find(|a| (*a.name.local).eq_ignore_ascii_case(name));
        match existing {
            Some(existing) => existing.value = value.into(),
            None => attrs.push(Attribute {
                name: attr_name(name),
                value: value.into(),
            }),
        }
    }
}

/// Drop every attribute whose name satisfies `pred`. Returns how many were removed.
pub fn retain_attrs(handle: &Handle, mut pred: impl FnMut(&str) -> bool) -> usize {
    match &handle.data {
        NodeData::Element { attrs, .. } => {
            let mut attrs = attrs.borrow_mut();
            let before = attrs.len();
            attrs.retain(|a| pred(&*a.name.local));
            before - attrs.len()
        }
        _ => 0,
    }
}

fn element_name(local: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(local))
}

/// HTML attributes live in the null namespace.
fn attr_name(local: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(local))
}

/// Create a detached element.
pub fn new_element(name: &str, attrs: &[(&str, &str)]) -> Handle {
    Node::new(NodeData::Element {
        name: element_name(name),
        attrs: RefCell::new(
            attrs
                .iter()
                .map(|(k, v)| Attribute {
                    name: attr_name(k),
                    value: (*v).into(),
                })
                .collect(),
        ),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    })
}

pub fn new_text(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(text.into()),
    })
}

pub fn append_child(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

pub fn prepend_child(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().insert(0, child);
}

/// Move every child of `from` to the end of `to`, preserving order.
pub fn move_children(from: &Handle, to: &Handle) {
    let children: Vec<Handle> = from.children.borrow_mut().drain(..).collect();
    for child in children {
        append_child(to, child);
    }
}

/// Replace all children of `handle` with a single text node.
pub fn set_text(handle: &Handle, text: &str) {
    handle.children.borrow_mut().clear();
    if !text.is_empty() {
        append_child(handle, new_text(text));
    }
}

/// All elements named `name` under `root`, in document order.
pub fn find_all(root: &Handle, name: &str) -> Vec<Handle> {
    let mut found = Vec::new();
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        if is_element(&node, name) {
            found.push(node.clone());
        }
        for child in node.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
    }
    found
}

pub fn find_first(root: &Handle, name: &str) -> Option<Handle> {
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        if is_element(&node, name) {
            return Some(node);
        }
        for child in node.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
    }
    None
}

/// Every `h1`..`h6` under `root`, in document order.
pub fn headings(root: &Handle) -> Vec<Handle> {
    let mut found = Vec::new();
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        if matches!(tag(&node), Some("h1" | "h2" | "h3" | "h4" | "h5" | "h6")) {
            found.push(node.clone());
        }
        for child in node.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
    }
    found
}

/// Detach every descendant matching `pred`, subtree included. Returns the count.
pub fn remove_where(root: &Handle, pred: &mut impl FnMut(&Handle) -> bool) -> usize {
    let mut removed = 0;
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        let mut children = node.children.borrow_mut();
        let before = children.len();
        children.retain(|child| {
            if pred(child) {
                child.parent.set(None);
                false
            } else {
                true
            }
        });
        removed += before - children.len();
        stack.extend(children.iter().cloned());
    }
    removed
}

/// Raw concatenation of every text node under `handle`.
pub fn text_content(handle: &Handle) -> String {
    let mut out = String::new();
    let mut stack = vec![handle.clone()];
    while let Some(node) = stack.pop() {
        if let NodeData::Text { contents } = &node.data {
            out.push_str(&contents.borrow());
        }
        for child in node.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
    }
    out
}

/// Text a reader would see: non-rendered subtrees skipped, inline runs joined
/// as-is and block boundaries turned into a space.
pub fn visible_text(handle: &Handle) -> String {
    let mut out = String::new();
    collect_visible(handle, &mut out);
    out
}

fn collect_visible(node: &Handle, out: &mut String) {
    let block = match &node.data {
        NodeData::Text { contents } => {
            out.push_str(&contents.borrow());
            return;
        }
        NodeData::Element { name, .. } => {
            if NON_RENDERED.contains(&&*name.local) {
                return;
            }
            BLOCK_LEVEL.contains(&&*name.local)
        }
        _ => false,
    };
    if block {
        out.push(' ');
    }
    for child in node.children.borrow().iter() {
        collect_visible(child, out);
    }
    if block {
        out.push(' ');
    }
}

/// The `<head>` element, created in front of everything else if the tree lacks one.
pub fn ensure_head(dom: &RcDom) -> Handle {
    if let Some(head) = find_first(&dom.document, "head") {
        return head;
    }
    let head = new_element("head", &[]);
    match find_first(&dom.document, "html") {
        Some(html) => prepend_child(&html, head.clone()),
        None => append_child(&dom.document, head.clone()),
    }
    head
}

pub fn body(dom: &RcDom) -> Option<Handle> {
    find_first(&dom.document, "body")
}

//! Slash-normalized relative paths and the immutable path-existence snapshot.

use ahash::AHashSet;
use std::path::Path;

/// Every file found by the initial tree scan, as slash-normalized relative paths.
///
/// Built once before any document is processed and only ever read afterwards.
#[derive(Debug, Default, Clone)]
pub struct KnownPaths {
    paths: AHashSet<String>,
}

impl KnownPaths {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            paths: paths
                .into_iter()
                .map(|p| normalize(p.as_ref()))
                .collect(),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Convert a filesystem path relative to the source root into the corpus key form.
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let joined = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    Some(normalize(&joined))
}

/// Collapse `.`/`..` segments, duplicate and back slashes.
///
/// `..` segments that would climb above the root are dropped.
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split(['/', '\\']) {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// Directory portion of a relative key, empty for root-level files.
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Final path segment.
pub fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, name)| name).unwrap_or(path)
}

/// File name without its last extension.
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Resolve a reference (as written in markup) against the directory of `base`.
///
/// Query strings and fragments are discarded; absolute references are taken
/// relative to the corpus root.
pub fn resolve_reference(base: &str, reference: &str) -> String {
    let reference = reference
        .split(['#', '?'])
        .next()
        .unwrap_or_default()
        .trim();
    if reference.starts_with('/') {
        return normalize(reference);
    }
    let dir = parent_dir(base);
    if dir.is_empty() {
        normalize(reference)
    } else {
        normalize(&format!("{}/{}", dir, reference))
    }
}

//! Shared types used across pipeline stages.
//!
//! These are serialized into the collated manifest and read back by the
//! compile stage, so both sides see identical shapes.

use crate::pattern::{Entry, Items, Registry};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Navigation tree item: a collection with children, or a pattern leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavItem {
    pub title: String,
    /// Site-relative URL of the page showing this item.
    pub path: String,
    /// Pattern key for leaves, collection slug for groups.
    pub key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavItem>,
}

/// Build the navigation tree for a sorted registry.
///
/// Top-level collections link to `patterns/<slug>/index.html`, nested
/// collections to `patterns/<top>/<slug>.html`. Patterns link to an anchor on
/// the page that shows them. Patterns with `in_nav = false` are left out, as
/// are collections left empty by that.
pub fn build_navigation(registry: &Registry) -> Vec<NavItem> {
    let mut nav = Vec::new();
    for (slug, entry) in registry.items().iter() {
        match entry {
            Entry::Collection(c) => {
                let path = format!("patterns/{slug}/index.html");
                let children = nav_children(&c.items, slug, &path);
                if !children.is_empty() {
                    nav.push(NavItem {
                        title: c.name.clone(),
                        path,
                        key: slug.to_string(),
                        children,
                    });
                }
            }
            Entry::Pattern(p) if p.in_nav => nav.push(NavItem {
                title: p.name.clone(),
                path: format!("patterns/index.html#{}", p.key),
                key: p.key.clone(),
                children: vec![],
            }),
            Entry::Pattern(_) => {}
        }
    }
    nav
}

fn nav_children(items: &Items, top: &str, page: &str) -> Vec<NavItem> {
    let mut out = Vec::new();
    for (slug, entry) in items.iter() {
        match entry {
            Entry::Pattern(p) if p.in_nav => out.push(NavItem {
                title: p.name.clone(),
                path: format!("{page}#{}", p.key),
                key: p.key.clone(),
                children: vec![],
            }),
            Entry::Pattern(_) => {}
            Entry::Collection(c) => {
                // Everything below the second level renders on its sub-collection page.
                let sub_page = if page.ends_with("/index.html") {
                    format!("patterns/{top}/{slug}.html")
                } else {
                    page.to_string()
                };
                let children = nav_children(&c.items, top, &sub_page);
                if !children.is_empty() {
                    out.push(NavItem {
                        title: c.name.clone(),
                        path: sub_page,
                        key: slug.to_string(),
                        children,
                    });
                }
            }
        }
    }
    out
}

/// What went wrong with a piece of input that the build worked around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A pattern file could not be read or parsed and contributed nothing.
    FileSkipped,
    /// A template failed to compile or render.
    RenderFailed,
    /// A snippet ran to end of file without `<!-- endsnippet -->`.
    UnterminatedSnippet,
    /// A snippet was cut short by another start marker.
    ReplacedSnippet,
    /// A partial reference names no known pattern.
    DanglingReference,
    /// Two sources produced the same pattern key; the later one was kept.
    KeyCollision,
    /// A markdown snippet has no html snippet of the same name.
    OrphanNotes,
    /// A global data file could not be read or parsed.
    DataSkipped,
    /// A name was defined twice in the render context.
    DataCollision,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::FileSkipped => "file skipped",
            Self::RenderFailed => "render failed",
            Self::UnterminatedSnippet => "unterminated snippet",
            Self::ReplacedSnippet => "replaced snippet",
            Self::DanglingReference => "dangling reference",
            Self::KeyCollision => "key collision",
            Self::OrphanNotes => "orphan notes",
            Self::DataSkipped => "data skipped",
            Self::DataCollision => "data collision",
        };
        f.write_str(label)
    }
}

/// A recoverable problem found while building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// File the problem was found in.
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic and log it at warn level.
    pub fn warn(kind: DiagnosticKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        let diagnostic = Self {
            kind,
            path: path.into(),
            message: message.into(),
        };
        tracing::warn!(
            kind = %diagnostic.kind,
            path = %diagnostic.path,
            "{}",
            diagnostic.message
        );
        diagnostic
    }
}

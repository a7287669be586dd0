//! Shared test utilities for the kickstart test suite.
//!
//! Builds throwaway projects in a temp directory and wraps registry lookups
//! with panics that name what was available.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = project(&[
//!     ("src/patterns/01-atoms/button.html", "<button></button>"),
//!     ("src/data/site.json", r#"{"title": "Kit"}"#),
//! ]);
//! let collation = collate_project(tmp.path());
//!
//! assert_eq!(pattern_keys(&collation.registry), vec!["atoms-button"]);
//! let button = find_pattern(&collation.registry, "atoms-button");
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::collate::{Collation, collate};
use crate::config::load_config;
use crate::pattern::{Pattern, Registry};
use crate::render::Renderer;
use crate::types::DiagnosticKind;

// =========================================================================
// Project setup
// =========================================================================

/// Create a temp project containing `files` (relative path, content).
///
/// The pattern base directory always exists, even when no pattern files are
/// given.
pub fn project(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("src/patterns")).unwrap();
    for (rel, content) in files {
        write_file(tmp.path(), rel, content);
    }
    tmp
}

/// Write `content` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Collate a project with its own (or the stock) config.
pub fn collate_project(root: &Path) -> Collation {
    let config = load_config(root).unwrap();
    let mut renderer = Renderer::new(config.indent());
    collate(&config, root, &mut renderer).unwrap()
}

// =========================================================================
// Registry lookups, panicking with a clear message on miss
// =========================================================================

/// Find a pattern by key. Panics if not found.
pub fn find_pattern<'a>(registry: &'a Registry, key: &str) -> &'a Pattern {
    registry.find(key).unwrap_or_else(|| {
        panic!(
            "pattern '{key}' not found. Available: {:?}",
            pattern_keys(registry)
        )
    })
}

/// All pattern keys, depth-first in registry order.
pub fn pattern_keys(registry: &Registry) -> Vec<&str> {
    registry.patterns().iter().map(|p| p.key.as_str()).collect()
}

pub fn diagnostic_kinds(collation: &Collation) -> Vec<DiagnosticKind> {
    collation.diagnostics.iter().map(|d| d.kind).collect()
}

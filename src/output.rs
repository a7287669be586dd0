//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every collection and
//! pattern leads with its positional index and display name, with the source
//! file and lineage shown as indented context lines. This reads as an
//! inventory of the pattern library while still tracing back to files.
//!
//! # Output Format
//!
//! ## Collate
//!
//! ```text
//! Patterns
//! 001 Atoms
//!     001 Button
//!         Source: 01-atoms/button.html
//!         Included by: molecules-card
//!     002 Forms
//!         001 Input
//!             Source: 01-atoms/forms/input.html
//! 002 Molecules
//!     001 Card
//!         Source: 02-molecules/card.html
//!         Includes: atoms-button
//!
//! Data
//!     colors, site
//!
//! Diagnostics
//!     dangling reference 02-molecules/card.html: 'molecules-card' includes unknown pattern 'x'
//!
//! Collated 3 patterns, 1 diagnostic
//! ```
//!
//! ## Compile
//!
//! ```text
//! Styleguide
//!     patterns/index.html
//!     patterns/atoms/index.html
//!
//! Pages
//!     001 index.html
//!
//! Generated 2 styleguide pages, 1 page
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::collate::Manifest;
use crate::generate::{GenerateReport, PageKind};
use crate::pattern::{Entry, Items, Pattern};
use crate::types::Diagnostic;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Lines for one pattern: header, then source and lineage context.
fn pattern_lines(index: usize, pattern: &Pattern, depth: usize) -> Vec<String> {
    let pad = indent(depth);
    let mut lines = vec![format!("{pad}{} {}", format_index(index), pattern.name)];
    lines.push(format!("{pad}    Source: {}", pattern.path));
    if !pattern.in_nav {
        lines.push(format!("{pad}    Hidden from navigation"));
    }
    let includes: Vec<&str> = pattern
        .lineage
        .includes
        .iter()
        .map(|r| r.pattern.as_str())
        .collect();
    if !includes.is_empty() {
        lines.push(format!("{pad}    Includes: {}", includes.join(", ")));
    }
    let included_by: Vec<&str> = pattern
        .lineage
        .included_by
        .iter()
        .map(|r| r.pattern.as_str())
        .collect();
    if !included_by.is_empty() {
        lines.push(format!("{pad}    Included by: {}", included_by.join(", ")));
    }
    lines
}

fn items_lines(items: &Items, depth: usize, lines: &mut Vec<String>) {
    for (i, (_, entry)) in items.iter().enumerate() {
        match entry {
            Entry::Pattern(p) => lines.extend(pattern_lines(i + 1, p, depth)),
            Entry::Collection(c) => {
                lines.push(format!("{}{} {}", indent(depth), format_index(i + 1), c.name));
                items_lines(&c.items, depth + 1, lines);
            }
        }
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// One line per diagnostic: kind, path, message.
pub fn format_diagnostics(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics
        .iter()
        .map(|d| format!("    {} {}: {}", d.kind, d.path, d.message))
        .collect()
}

pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for line in format_diagnostics(diagnostics) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 1: Collate output
// ============================================================================

/// Format collate stage output: the pattern tree, data namespaces and
/// diagnostics.
pub fn format_collate_output(manifest: &Manifest) -> Vec<String> {
    let mut lines = vec!["Patterns".to_string()];
    items_lines(manifest.patterns.items(), 0, &mut lines);

    if !manifest.data.is_empty() {
        lines.push(String::new());
        lines.push("Data".to_string());
        let mut names: Vec<&str> = manifest.data.keys().map(String::as_str).collect();
        names.sort_unstable();
        lines.push(format!("    {}", names.join(", ")));
    }

    if !manifest.diagnostics.is_empty() {
        lines.push(String::new());
        lines.push("Diagnostics".to_string());
        lines.extend(format_diagnostics(&manifest.diagnostics));
    }

    lines.push(String::new());
    lines.push(format!(
        "Collated {}, {}",
        plural(manifest.patterns.len(), "pattern"),
        plural(manifest.diagnostics.len(), "diagnostic")
    ));
    lines
}

pub fn print_collate_output(manifest: &Manifest) {
    for line in format_collate_output(manifest) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Compile output
// ============================================================================

/// Format compile stage output: every written file, styleguide pages first.
pub fn format_generate_output(report: &GenerateReport) -> Vec<String> {
    let mut lines = vec!["Styleguide".to_string()];
    let styleguide: Vec<&str> = report
        .pages
        .iter()
        .filter(|p| p.kind != PageKind::Page)
        .map(|p| p.path.as_str())
        .collect();
    for path in &styleguide {
        lines.push(format!("    {path}"));
    }

    let pages: Vec<&str> = report
        .pages
        .iter()
        .filter(|p| p.kind == PageKind::Page)
        .map(|p| p.path.as_str())
        .collect();
    if !pages.is_empty() {
        lines.push(String::new());
        lines.push("Pages".to_string());
        for (i, path) in pages.iter().enumerate() {
            lines.push(format!("    {} {}", format_index(i + 1), path));
        }
    }

    if !report.diagnostics.is_empty() {
        lines.push(String::new());
        lines.push("Diagnostics".to_string());
        lines.extend(format_diagnostics(&report.diagnostics));
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated {}, {}",
        plural(styleguide.len(), "styleguide page"),
        plural(pages.len(), "page")
    ));
    lines
}

pub fn print_generate_output(report: &GenerateReport) {
    for line in format_generate_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::GeneratedPage;
    use crate::pattern::{Lineage, LineageRef, Registry, Segment};
    use crate::types::DiagnosticKind;
    use pretty_assertions::assert_eq;

    fn pattern(key: &str, name: &str, path: &str) -> Pattern {
        Pattern {
            key: key.into(),
            id: key.into(),
            name: name.into(),
            collections: vec![],
            path: path.into(),
            template: String::new(),
            content: String::new(),
            notes: None,
            data: Default::default(),
            order: None,
            flags: None,
            in_nav: true,
            lineage: Lineage::default(),
        }
    }

    fn segment(slug: &str, name: &str) -> Segment {
        Segment {
            slug: slug.into(),
            name: name.into(),
            order: None,
        }
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "pattern"), "1 pattern");
        assert_eq!(plural(0, "pattern"), "0 patterns");
    }

    #[test]
    fn pattern_lines_show_lineage_and_hidden() {
        let mut p = pattern("card", "Card", "card.html");
        p.in_nav = false;
        p.lineage.includes.push(LineageRef {
            pattern: "button".into(),
            pattern_path: "button.html".into(),
        });
        assert_eq!(
            pattern_lines(2, &p, 1),
            vec![
                "    002 Card",
                "        Source: card.html",
                "        Hidden from navigation",
                "        Includes: button",
            ]
        );
    }

    #[test]
    fn collate_output_tree_data_and_summary() {
        let mut registry = Registry::new();
        let atoms = segment("atoms", "Atoms");
        registry
            .insert(&[atoms.clone()], pattern("atoms-button", "Button", "01-atoms/button.html"))
            .unwrap();
        registry
            .insert(
                &[atoms, segment("forms", "Forms")],
                pattern("atoms-forms-input", "Input", "01-atoms/forms/input.html"),
            )
            .unwrap();

        let mut manifest = Manifest {
            patterns: registry,
            ..Default::default()
        };
        manifest.data.insert("site".into(), serde_json::json!({}));
        manifest.data.insert("colors".into(), serde_json::json!({}));
        manifest.diagnostics.push(Diagnostic {
            kind: DiagnosticKind::UnterminatedSnippet,
            path: "x.html".into(),
            message: "no end marker".into(),
        });

        assert_eq!(
            format_collate_output(&manifest),
            vec![
                "Patterns",
                "001 Atoms",
                "    001 Button",
                "        Source: 01-atoms/button.html",
                "    002 Forms",
                "        001 Input",
                "            Source: 01-atoms/forms/input.html",
                "",
                "Data",
                "    colors, site",
                "",
                "Diagnostics",
                "    unterminated snippet x.html: no end marker",
                "",
                "Collated 2 patterns, 1 diagnostic",
            ]
        );
    }

    #[test]
    fn generate_output_splits_styleguide_and_pages() {
        let report = GenerateReport {
            pages: vec![
                GeneratedPage {
                    path: "patterns/index.html".into(),
                    kind: PageKind::Overview,
                },
                GeneratedPage {
                    path: "patterns/atoms/index.html".into(),
                    kind: PageKind::PatternGroup,
                },
                GeneratedPage {
                    path: "index.html".into(),
                    kind: PageKind::Page,
                },
            ],
            diagnostics: vec![],
        };
        assert_eq!(
            format_generate_output(&report),
            vec![
                "Styleguide",
                "    patterns/index.html",
                "    patterns/atoms/index.html",
                "",
                "Pages",
                "    001 index.html",
                "",
                "Generated 2 styleguide pages, 1 page",
            ]
        );
    }
}

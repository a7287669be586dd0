//! Cross-pattern references.
//!
//! After the registry is complete, every pattern's template is scanned for
//! partial inclusions (`{{> atoms-button}}`, `{{#> layouts-card}}…{{/layouts-card}}`).
//! Each reference that names a known pattern becomes a directed edge recorded on
//! both ends:
//!
//! ```text
//! card.template  =  "<div>{{> button}}</div>"
//!
//! card.lineage.includes     = [{ pattern: "button", patternPath: "button.html" }]
//! button.lineage.includedBy = [{ pattern: "card",   patternPath: "card.html"   }]
//! ```
//!
//! References to unknown names are reported as diagnostics and dropped.
//! Scanning is textual and sits behind [`ReferenceScanner`].

use crate::pattern::{LineageRef, Registry};
use crate::types::{Diagnostic, DiagnosticKind};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Finds the partial names a template refers to.
pub trait ReferenceScanner {
    /// Referenced names in order of first appearance, without duplicates.
    fn references(&self, template: &str) -> Vec<String>;
}

/// Matches `{{> name}}` and `{{#> name}}`, with optional whitespace after the
/// `>`. Names are word characters plus `.`, `/` and `-`. References inside
/// `{{!-- --}}` and `{{! }}` comments are not counted.
pub struct PartialSyntaxScanner;

static PARTIAL_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{~?#?>\s*([\w./-]+)").expect("partial reference regex")
});

static COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{\{~?!--.*?--~?\}\}|\{\{~?!.*?\}\}").expect("comment regex")
});

impl ReferenceScanner for PartialSyntaxScanner {
    fn references(&self, template: &str) -> Vec<String> {
        let template = COMMENT.replace_all(template, "");
        let mut names: Vec<String> = Vec::new();
        for caps in PARTIAL_REF.captures_iter(&template) {
            let name = &caps[1];
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }
}

/// Rebuild every pattern's lineage from its template.
///
/// Existing edges are cleared first, so running it twice gives the same
/// result. Self-references are ignored.
pub fn resolve_lineage(registry: &mut Registry, scanner: &dyn ReferenceScanner) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    // Pass 1: read-only scan, keyed lookups.
    let paths: HashMap<String, String> = registry
        .patterns()
        .into_iter()
        .map(|p| (p.key.clone(), p.path.clone()))
        .collect();

    let mut includes: HashMap<String, Vec<LineageRef>> = HashMap::new();
    let mut included_by: HashMap<String, Vec<LineageRef>> = HashMap::new();

    for pattern in registry.patterns() {
        for name in scanner.references(&pattern.template) {
            if name == pattern.key {
                continue;
            }
            let Some(target_path) = paths.get(&name) else {
                diagnostics.push(Diagnostic::warn(
                    DiagnosticKind::DanglingReference,
                    &pattern.path,
                    format!("'{}' includes unknown pattern '{name}'", pattern.key),
                ));
                continue;
            };

            includes
                .entry(pattern.key.clone())
                .or_default()
                .push(LineageRef {
                    pattern: name.clone(),
                    pattern_path: target_path.clone(),
                });

            let back = included_by.entry(name).or_default();
            if !back.iter().any(|r| r.pattern == pattern.key) {
                back.push(LineageRef {
                    pattern: pattern.key.clone(),
                    pattern_path: pattern.path.clone(),
                });
            }
        }
    }

    // Pass 2: write the edges back.
    for pattern in registry.patterns_mut() {
        pattern.lineage.includes = includes.remove(&pattern.key).unwrap_or_default();
        pattern.lineage.included_by = included_by.remove(&pattern.key).unwrap_or_default();
    }

    tracing::debug!(
        edges = registry
            .patterns()
            .iter()
            .map(|p| p.lineage.includes.len())
            .sum::<usize>(),
        "lineage resolved"
    );
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{Lineage, Pattern, Segment};
    use pretty_assertions::assert_eq;

    fn pattern(key: &str, template: &str) -> Pattern {
        Pattern {
            key: key.into(),
            id: key.into(),
            name: key.into(),
            collections: vec![],
            path: format!("{key}.html"),
            template: template.into(),
            content: String::new(),
            notes: None,
            data: Default::default(),
            order: None,
            flags: None,
            in_nav: true,
            lineage: Lineage::default(),
        }
    }

    fn edge(key: &str) -> LineageRef {
        LineageRef {
            pattern: key.into(),
            pattern_path: format!("{key}.html"),
        }
    }

    #[test]
    fn scanner_finds_inline_and_block_partials() {
        let names = PartialSyntaxScanner.references(
            "{{> button}} {{#> layouts/card title=x}}{{/layouts/card}} {{>button}} {{~> icon-x}}",
        );
        assert_eq!(names, vec!["button", "layouts/card", "icon-x"]);
    }

    #[test]
    fn scanner_ignores_plain_expressions() {
        assert!(PartialSyntaxScanner
            .references("{{label}} {{#if x}}{{/if}} a > b")
            .is_empty());
    }

    #[test]
    fn scanner_skips_commented_out_partials() {
        let names = PartialSyntaxScanner.references(
            "{{!-- old: {{> ghost}} --}}\n{{! {{> stale }}<b>{{> real}}</b>{{!--\n{{#> gone}}x{{/gone}}\n--}}",
        );
        assert_eq!(names, vec!["real"]);
    }

    #[test]
    fn edges_recorded_on_both_ends() {
        let mut registry = Registry::new();
        registry.insert(&[], pattern("button", "<button></button>")).unwrap();
        registry
            .insert(&[], pattern("card", "<div>{{> button}}{{> button}}</div>"))
            .unwrap();

        let diagnostics = resolve_lineage(&mut registry, &PartialSyntaxScanner);
        assert!(diagnostics.is_empty());

        let card = registry.find("card").unwrap();
        let button = registry.find("button").unwrap();
        assert_eq!(card.lineage.includes, vec![edge("button")]);
        assert!(card.lineage.included_by.is_empty());
        assert_eq!(button.lineage.included_by, vec![edge("card")]);
        assert!(button.lineage.includes.is_empty());
    }

    #[test]
    fn nested_keys_resolve() {
        let mut registry = Registry::new();
        let seg = Segment {
            slug: "atoms".into(),
            name: "Atoms".into(),
            order: None,
        };
        registry.insert(&[seg.clone()], pattern("atoms-icon", "<i></i>")).unwrap();
        registry
            .insert(&[seg], pattern("atoms-button", "<b>{{> atoms-icon}}</b>"))
            .unwrap();
        resolve_lineage(&mut registry, &PartialSyntaxScanner);
        assert_eq!(
            registry.find("atoms-icon").unwrap().lineage.included_by[0].pattern,
            "atoms-button"
        );
    }

    #[test]
    fn dangling_reference_reported_and_dropped() {
        let mut registry = Registry::new();
        registry.insert(&[], pattern("card", "{{> missing}}")).unwrap();
        let diagnostics = resolve_lineage(&mut registry, &PartialSyntaxScanner);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::DanglingReference);
        assert!(registry.find("card").unwrap().lineage.includes.is_empty());
    }

    #[test]
    fn self_reference_ignored_and_rerun_is_stable() {
        let mut registry = Registry::new();
        registry.insert(&[], pattern("tree", "{{> tree}}{{> leaf}}")).unwrap();
        registry.insert(&[], pattern("leaf", "<li></li>")).unwrap();

        resolve_lineage(&mut registry, &PartialSyntaxScanner);
        let first = registry.clone();
        resolve_lineage(&mut registry, &PartialSyntaxScanner);
        assert_eq!(registry, first);
        assert_eq!(registry.find("tree").unwrap().lineage.includes, vec![edge("leaf")]);
    }
}

//! HTML site generation.
//!
//! Stage 2 of the build. Takes the collated [`Manifest`] and writes the static
//! styleguide plus the project's own pages.
//!
//! ## Generated Pages
//!
//! - **Overview** (`/patterns/index.html`): every pattern, grouped by
//!   top-level collection, with patterns at the scan root first
//! - **Group pages** (`/patterns/{collection}/index.html`): one per top-level
//!   collection, its direct patterns then one section per sub-collection
//! - **Sub-group pages** (`/patterns/{collection}/{sub}.html`): one per
//!   second-level collection, everything below it
//! - **Project pages** (`/{relative path}.html`): every file under the
//!   configured page directories, rendered through Handlebars
//!
//! ## Output Structure
//!
//! ```text
//! public/
//! ├── index.html                 # src/pages/index.html
//! ├── templates/
//! │   └── article.html           # src/pages/templates/article.hbs
//! ├── data/
//! │   └── styleguide-data.json   # written by collate
//! └── patterns/
//!     ├── index.html
//!     ├── atoms/
//!     │   ├── index.html
//!     │   └── forms.html
//!     └── molecules/
//!         └── index.html
//! ```
//!
//! ## Pattern Sections
//!
//! Each pattern shows its notes, a live preview, the escaped source and its
//! lineage, linking to the pages of the patterns on the other end.
//!
//! ## HTML Generation
//!
//! Styleguide pages use [maud](https://maud.lambda.xyz/) with automatic
//! escaping. Project pages are Handlebars templates rendered against
//! `{ data, patterns, navigation, page }`, where `page` is the file's front
//! matter. Page files whose name starts with `_` are registered as partials
//! (`_intro.html` → `{{> intro}}`) instead of being written.

use crate::collate::{Manifest, register_patterns};
use crate::config::StyleguideConfig;
use crate::matter;
use crate::pattern::{Entry, Items, Pattern};
use crate::render::Renderer;
use crate::snippet::{SnippetKind, strip_regions};
use crate::types::{Diagnostic, DiagnosticKind, NavItem};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

const CSS: &str = include_str!("../static/styleguide.css");

/// What a generated file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Overview,
    PatternGroup,
    Page,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPage {
    /// Path relative to the site directory, `/`-separated.
    pub path: String,
    pub kind: PageKind,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateReport {
    pub pages: Vec<GeneratedPage>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Register every collated pattern with `renderer`: its template as a
/// partial and its rendered content as a helper.
///
/// Needed when generating from a manifest read back from disk; a renderer
/// that just ran collation already has them.
pub fn register_manifest(renderer: &mut Renderer, manifest: &Manifest) -> Vec<Diagnostic> {
    register_patterns(renderer, &manifest.patterns)
}

/// Write the styleguide and the project pages under the configured site
/// directory.
pub fn generate(
    manifest: &Manifest,
    config: &StyleguideConfig,
    project: &Path,
    renderer: &mut Renderer,
) -> Result<GenerateReport, GenerateError> {
    let site_dir = config.site_dir(project);
    fs::create_dir_all(&site_dir)?;

    let mut report = GenerateReport::default();
    let pages = pattern_pages(manifest);

    let overview = render_overview(manifest, &pages);
    write_page(&site_dir, "patterns/index.html", overview, PageKind::Overview, &mut report)?;

    for (slug, entry) in manifest.patterns.items().iter() {
        let Entry::Collection(collection) = entry else {
            continue;
        };
        let page = format!("patterns/{slug}/index.html");
        let html = render_group_page(&collection.name, &collection.items, &page, manifest, &pages);
        write_page(&site_dir, &page, html, PageKind::PatternGroup, &mut report)?;

        for (sub_slug, sub_entry) in collection.items.iter() {
            let Entry::Collection(sub) = sub_entry else {
                continue;
            };
            let page = format!("patterns/{slug}/{sub_slug}.html");
            let title = format!("{} › {}", collection.name, sub.name);
            let html = render_group_page(&title, &sub.items, &page, manifest, &pages);
            write_page(&site_dir, &page, html, PageKind::PatternGroup, &mut report)?;
        }
    }

    render_project_pages(manifest, config, project, renderer, &site_dir, &mut report)?;

    tracing::info!(
        pages = report.pages.len(),
        site = %site_dir.display(),
        "site generated"
    );
    Ok(report)
}

fn write_page(
    site_dir: &Path,
    rel: &str,
    markup: Markup,
    kind: PageKind,
    report: &mut GenerateReport,
) -> Result<(), GenerateError> {
    write_file(site_dir, rel, &markup.into_string())?;
    report.pages.push(GeneratedPage {
        path: rel.to_string(),
        kind,
    });
    Ok(())
}

fn write_file(site_dir: &Path, rel: &str, content: &str) -> Result<(), GenerateError> {
    let path = site_dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, content)?;
    tracing::debug!(path = %path.display(), "wrote page");
    Ok(())
}

/// The page each pattern is shown on, by key.
fn pattern_pages(manifest: &Manifest) -> HashMap<&str, String> {
    manifest
        .patterns
        .patterns()
        .into_iter()
        .map(|p| (p.key.as_str(), page_for(p)))
        .collect()
}

fn page_for(pattern: &Pattern) -> String {
    match pattern.collections.as_slice() {
        [] => "patterns/index.html".to_string(),
        [top] => format!("patterns/{top}/index.html"),
        [top, sub, ..] => format!("patterns/{top}/{sub}.html"),
    }
}

/// All patterns below `items`, depth-first.
fn flatten(items: &Items) -> Vec<&Pattern> {
    let mut out = Vec::new();
    for (_, entry) in items.iter() {
        match entry {
            Entry::Pattern(p) => out.push(p.as_ref()),
            Entry::Collection(c) => out.extend(flatten(&c.items)),
        }
    }
    out
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, nav: Markup, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(CSS)) }
            }
            body {
                nav.styleguide-nav {
                    a.styleguide-home href="/patterns/index.html" { "Patterns" }
                    (nav)
                }
                main { (content) }
            }
        }
    }
}

/// Renders the navigation tree, marking the branch containing `current_page`.
pub fn render_nav(items: &[NavItem], current_page: &str) -> Markup {
    html! {
        ul {
            @for item in items {
                (render_nav_item(item, current_page))
            }
        }
    }
}

fn render_nav_item(item: &NavItem, current_page: &str) -> Markup {
    let page = item.path.split('#').next().unwrap_or_default();
    let is_current = page == current_page;

    html! {
        li class=[is_current.then_some("current")] {
            a href={ "/" (item.path) } { (item.title) }
            @if !item.children.is_empty() {
                ul {
                    @for child in &item.children {
                        (render_nav_item(child, current_page))
                    }
                }
            }
        }
    }
}

/// Renders one pattern: notes, live preview, escaped source, lineage.
fn render_pattern(pattern: &Pattern, pages: &HashMap<&str, String>) -> Markup {
    let link = |key: &str| -> String {
        match pages.get(key) {
            Some(page) => format!("/{page}#{key}"),
            None => format!("#{key}"),
        }
    };

    html! {
        section.pattern id=(pattern.key) {
            h3.pattern-title {
                a href={ "#" (pattern.key) } { (pattern.name) }
            }
            @if let Some(notes) = &pattern.notes {
                div.pattern-notes { (PreEscaped(notes)) }
            }
            div.pattern-preview { (PreEscaped(&pattern.content)) }
            details.pattern-source {
                summary { "Source" }
                pre { code.language-html { (pattern.content) } }
            }
            @if !pattern.lineage.includes.is_empty() || !pattern.lineage.included_by.is_empty() {
                div.pattern-lineage {
                    @if !pattern.lineage.includes.is_empty() {
                        div {
                            "Includes: "
                            ul {
                                @for r in &pattern.lineage.includes {
                                    li { a href=(link(&r.pattern)) { (r.pattern) } }
                                }
                            }
                        }
                    }
                    @if !pattern.lineage.included_by.is_empty() {
                        div {
                            "Included by: "
                            ul {
                                @for r in &pattern.lineage.included_by {
                                    li { a href=(link(&r.pattern)) { (r.pattern) } }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders every pattern, root patterns first, then one group per top-level
/// collection.
fn render_overview(manifest: &Manifest, pages: &HashMap<&str, String>) -> Markup {
    let nav = render_nav(&manifest.navigation, "patterns/index.html");
    let items = manifest.patterns.items();

    let content = html! {
        h1 { "Patterns" }
        @for (_, entry) in items.iter() {
            @if let Entry::Pattern(p) = entry {
                (render_pattern(p, pages))
            }
        }
        @for (slug, entry) in items.iter() {
            @if let Entry::Collection(c) = entry {
                section.pattern-group id={ "group-" (slug) } {
                    h2 { a href={ "/patterns/" (slug) "/index.html" } { (c.name) } }
                    @for p in flatten(&c.items) {
                        (render_pattern(p, pages))
                    }
                }
            }
        }
    };

    base_document("Patterns", nav, content)
}

/// Renders a collection page: its direct patterns, then one section per
/// nested collection.
fn render_group_page(
    title: &str,
    items: &Items,
    page: &str,
    manifest: &Manifest,
    pages: &HashMap<&str, String>,
) -> Markup {
    let nav = render_nav(&manifest.navigation, page);

    let content = html! {
        h1 { (title) }
        @for (_, entry) in items.iter() {
            @if let Entry::Pattern(p) = entry {
                (render_pattern(p, pages))
            }
        }
        @for (slug, entry) in items.iter() {
            @if let Entry::Collection(c) = entry {
                section.pattern-group id={ "group-" (slug) } {
                    h2 { (c.name) }
                    @for p in flatten(&c.items) {
                        (render_pattern(p, pages))
                    }
                }
            }
        }
    };

    base_document(title, nav, content)
}

// ============================================================================
// Project pages
// ============================================================================

fn render_project_pages(
    manifest: &Manifest,
    config: &StyleguideConfig,
    project: &Path,
    renderer: &mut Renderer,
    site_dir: &Path,
    report: &mut GenerateReport,
) -> Result<(), GenerateError> {
    let files = collect_page_files(config, project);
    let (partials, pages): (Vec<_>, Vec<_>) = files
        .into_iter()
        .partition(|(rel, _)| file_stem(rel).starts_with('_'));

    for (rel, abs) in &partials {
        let Some(body) = read_page(abs, rel, &mut report.diagnostics) else {
            continue;
        };
        let name = file_stem(rel).trim_start_matches('_').to_string();
        if let Err(e) = renderer.register_partial(&name, &body.1) {
            report.diagnostics.push(Diagnostic::warn(
                DiagnosticKind::RenderFailed,
                rel,
                e.to_string(),
            ));
        }
    }

    let patterns = serde_json::to_value(&manifest.patterns)?;
    let navigation = serde_json::to_value(&manifest.navigation)?;

    for (rel, abs) in &pages {
        let Some((front_matter, body)) = read_page(abs, rel, &mut report.diagnostics) else {
            continue;
        };
        let mut ctx = Map::new();
        ctx.insert("data".into(), Value::Object(manifest.data.clone()));
        ctx.insert("patterns".into(), patterns.clone());
        ctx.insert("navigation".into(), navigation.clone());
        ctx.insert("page".into(), Value::Object(front_matter));

        let html = match renderer.render(&body, &Value::Object(ctx)) {
            Ok(html) => html,
            Err(e) => {
                report.diagnostics.push(Diagnostic::warn(
                    DiagnosticKind::RenderFailed,
                    rel,
                    e.to_string(),
                ));
                continue;
            }
        };

        let out = Path::new(rel).with_extension("html");
        let out = out.to_string_lossy().replace('\\', "/");
        write_file(site_dir, &out, &html)?;
        report.pages.push(GeneratedPage {
            path: out,
            kind: PageKind::Page,
        });
    }
    Ok(())
}

/// Page files keyed by their path relative to their page directory, in
/// sorted order. A later directory wins on identical relative paths.
fn collect_page_files(config: &StyleguideConfig, project: &Path) -> Vec<(String, PathBuf)> {
    let mut files: Vec<(String, PathBuf)> = Vec::new();
    for dir in config.page_dirs(project) {
        if !dir.is_dir() {
            tracing::debug!(path = %dir.display(), "no page directory");
            continue;
        }
        let walker = WalkDir::new(&dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
        for entry in walker.filter_map(Result::ok) {
            let path = entry.path();
            if !entry.file_type().is_file() || !config.accepts_extension(path) {
                continue;
            }
            let Ok(rel) = path.strip_prefix(&dir) else {
                continue;
            };
            let rel = rel.to_string_lossy().replace('\\', "/");
            files.retain(|(existing, _)| *existing != rel);
            files.push((rel, path.to_path_buf()));
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    files
}

fn file_stem(rel: &str) -> &str {
    let name = rel.rsplit('/').next().unwrap_or(rel);
    name.split_once('.').map_or(name, |(stem, _)| stem)
}

fn read_page(
    abs: &Path,
    rel: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<(Map<String, Value>, String)> {
    let parsed = fs::read_to_string(abs)
        .map_err(|e| e.to_string())
        .and_then(|raw| matter::parse_front_matter(&raw).map_err(|e| e.to_string()));
    match parsed {
        Ok(parsed) => {
            let body = strip_regions(&parsed.body, &[SnippetKind::Remove]);
            Some((parsed.front_matter, body))
        }
        Err(e) => {
            diagnostics.push(Diagnostic::warn(DiagnosticKind::FileSkipped, rel, e));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collate::collate;
    use crate::config::load_config;
    use crate::pattern::{Lineage, LineageRef};
    use crate::test_helpers::*;

    fn nav_item(title: &str, path: &str, children: Vec<NavItem>) -> NavItem {
        NavItem {
            title: title.to_string(),
            path: path.to_string(),
            key: title.to_lowercase(),
            children,
        }
    }

    fn sample_pattern() -> Pattern {
        Pattern {
            key: "atoms-button".into(),
            id: "button".into(),
            name: "Button".into(),
            collections: vec!["atoms".into()],
            path: "01-atoms/button.html".into(),
            template: "<button>{{label}}</button>".into(),
            content: "<button class=\"btn\">Go</button>".into(),
            notes: Some("<p>Primary action.</p>\n".into()),
            data: Map::new(),
            order: None,
            flags: None,
            in_nav: true,
            lineage: Lineage {
                includes: vec![],
                included_by: vec![LineageRef {
                    pattern: "molecules-card".into(),
                    pattern_path: "02-molecules/card.html".into(),
                }],
            },
        }
    }

    /// Collate and generate a project, returning the site directory.
    fn build(tmp: &tempfile::TempDir) -> (PathBuf, GenerateReport) {
        let config = load_config(tmp.path()).unwrap();
        let mut renderer = Renderer::new(config.indent());
        let collation = collate(&config, tmp.path(), &mut renderer).unwrap();
        let report = generate(&collation.manifest(), &config, tmp.path(), &mut renderer).unwrap();
        (config.site_dir(tmp.path()), report)
    }

    #[test]
    fn nav_renders_nested_children_and_marks_current() {
        let items = vec![nav_item(
            "Atoms",
            "patterns/atoms/index.html",
            vec![nav_item("Button", "patterns/atoms/index.html#atoms-button", vec![])],
        )];
        let html = render_nav(&items, "patterns/atoms/index.html").into_string();
        assert!(html.contains("/patterns/atoms/index.html#atoms-button"));
        assert!(html.contains(r#"class="current""#));
        assert!(html.contains("Button"));
    }

    #[test]
    fn base_document_includes_doctype_and_css() {
        let doc = base_document("Test", html! {}, html! { p { "x" } }).into_string();
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains(".pattern-preview"));
    }

    #[test]
    fn pattern_section_shows_preview_source_notes_and_lineage() {
        let mut pages = HashMap::new();
        pages.insert("molecules-card", "patterns/molecules/index.html".to_string());
        let html = render_pattern(&sample_pattern(), &pages).into_string();

        assert!(html.contains(r#"id="atoms-button""#));
        assert!(html.contains(r#"<div class="pattern-preview"><button class="btn">Go</button></div>"#));
        assert!(html.contains("&lt;button class=&quot;btn&quot;&gt;Go&lt;/button&gt;"));
        assert!(html.contains("<p>Primary action.</p>"));
        assert!(html.contains("Included by: "));
        assert!(html.contains("/patterns/molecules/index.html#molecules-card"));
    }

    #[test]
    fn page_for_depends_on_collection_depth() {
        let mut p = sample_pattern();
        assert_eq!(page_for(&p), "patterns/atoms/index.html");
        p.collections.push("forms".into());
        p.collections.push("deep".into());
        assert_eq!(page_for(&p), "patterns/atoms/forms.html");
        p.collections.clear();
        assert_eq!(page_for(&p), "patterns/index.html");
    }

    #[test]
    fn generates_group_subgroup_and_overview_pages() {
        let tmp = project(&[
            ("src/patterns/01-atoms/button.html", "<button>Go</button>"),
            ("src/patterns/01-atoms/forms/input.html", "<input>"),
            ("src/patterns/02-molecules/card.html", "<div>{{> atoms-button}}</div>"),
        ]);
        let (site, report) = build(&tmp);

        let paths: Vec<&str> = report.pages.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "patterns/index.html",
                "patterns/atoms/index.html",
                "patterns/atoms/forms.html",
                "patterns/molecules/index.html",
            ]
        );

        let atoms = fs::read_to_string(site.join("patterns/atoms/index.html")).unwrap();
        assert!(atoms.contains(r#"id="atoms-button""#));
        assert!(atoms.contains(r#"id="atoms-forms-input""#));
        assert!(atoms.contains("/patterns/molecules/index.html#molecules-card"));

        let forms = fs::read_to_string(site.join("patterns/atoms/forms.html")).unwrap();
        assert!(forms.contains(r#"id="atoms-forms-input""#));
        assert!(!forms.contains(r#"id="atoms-button""#));

        let overview = fs::read_to_string(site.join("patterns/index.html")).unwrap();
        assert!(overview.contains(r#"id="molecules-card""#));
    }

    #[test]
    fn project_pages_render_with_partials_data_and_front_matter() {
        let tmp = project(&[
            ("src/data/site.yaml", "name: Kit\n"),
            ("src/patterns/button.html", "<button>Go</button>"),
            ("src/pages/_intro.html", "<header>{{data.site.name}}</header>"),
            (
                "src/pages/templates/article.hbs",
                "---\ntitle: Article\n---\n{{> intro}}\n<h1>{{page.title}}</h1>\n<!-- snippet:remove -->\n<p>draft</p>\n<!-- endsnippet -->\n{{> button}}",
            ),
        ]);
        let (site, report) = build(&tmp);

        assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
        assert!(!site.join("_intro.html").exists());
        let article = fs::read_to_string(site.join("templates/article.html")).unwrap();
        assert!(article.contains("<header>Kit</header>"));
        assert!(article.contains("<h1>Article</h1>"));
        assert!(article.contains("<button>Go</button>"));
        assert!(!article.contains("draft"));
        assert!(report
            .pages
            .iter()
            .any(|p| p.path == "templates/article.html" && p.kind == PageKind::Page));
    }

    #[test]
    fn broken_page_reported_not_fatal() {
        let tmp = project(&[
            ("src/pages/bad.html", "{{> missing}}"),
            ("src/pages/good.html", "<p>ok</p>"),
        ]);
        let (site, report) = build(&tmp);
        assert!(!site.join("bad.html").exists());
        assert!(site.join("good.html").exists());
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::RenderFailed);
    }

    #[test]
    fn register_manifest_restores_partials_and_helpers() {
        let tmp = project(&[("src/patterns/pill.html", "<span class=\"pill\">x</span>")]);
        let config = load_config(tmp.path()).unwrap();
        let mut first = Renderer::new(config.indent());
        let manifest = collate(&config, tmp.path(), &mut first).unwrap().manifest();

        let mut fresh = Renderer::new(config.indent());
        assert!(register_manifest(&mut fresh, &manifest).is_empty());
        assert!(fresh.has_partial("pill"));
        let html = fresh
            .render("{{> pill}}{{pill \"big\"}}", &Value::Null)
            .unwrap();
        assert_eq!(html, "<span class=\"pill\">x</span><span class=\"pill big\">x</span>");
    }
}

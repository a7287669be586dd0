//! Pattern collation: source tree → registry → manifest.
//!
//! Stage 1 of the build. Walks the configured pattern directories, turns every
//! pattern file into one or more [`Pattern`]s and assembles them into a
//! [`Registry`] shaped like the directory tree:
//!
//! ```text
//! src/patterns/
//! ├── 01-atoms/
//! │   ├── 01-button.html     # <!-- snippet:html button --> …  → atoms-button
//! │   ├── 01-button.md       # notes for the whole file
//! │   └── forms/
//! │       └── input.html     # no snippets → one pattern      → atoms-forms-input
//! └── 02-molecules/
//!     └── card.html          # {{> atoms-button}}             → molecules-card
//! ```
//!
//! ## Phases
//!
//! 1. **Parse**: files are read in sorted path order; each yields front matter
//!    and snippets. Every `html` snippet becomes a draft pattern; a file with
//!    none becomes a single whole-file pattern.
//! 2. **Register**: every draft template is registered as a partial under its
//!    key before anything renders, so patterns may include each other in any
//!    order.
//! 3. **Render**: each draft renders against its context (see
//!    [`pattern_context`]), is beautified and stored. The rendered markup is
//!    also registered as a helper under the same key for later templates.
//! 4. **Resolve**: the registry is sorted and lineage edges are built.
//!
//! Bad input never aborts collation. Unreadable files, malformed front matter,
//! broken templates and dangling references become [`Diagnostic`]s and the
//! offending piece is left out. Only an invalid data glob or a failed manifest
//! write is an error.

use crate::config::StyleguideConfig;
use crate::data::{self, DataError};
use crate::lineage::{PartialSyntaxScanner, resolve_lineage};
use crate::matter::{self, FrontMatter};
use crate::naming::{compose_key, parse_entry_name, title_case};
use crate::pattern::{Lineage, OrderKey, Pattern, Registry, Segment};
use crate::render::{Renderer, render_markdown};
use crate::snippet::{self, Snippet, SnippetKind, Termination};
use crate::types::{Diagnostic, DiagnosticKind, NavItem, build_navigation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CollateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Data error: {0}")]
    Data(#[from] DataError),
}

/// Top-level render context names that front matter cannot shadow.
pub const RESERVED_CONTEXT_KEYS: &[&str] = &["data", "pattern"];

/// Marker annotations that hide a pattern from navigation.
const HIDDEN_MARKERS: &[&str] = &["false", "hidden"];

/// Result of collating a project.
#[derive(Debug, Clone, Default)]
pub struct Collation {
    pub registry: Registry,
    /// Global data namespace, keyed by data file stem.
    pub data: Map<String, Value>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Collation {
    pub fn manifest(&self) -> Manifest {
        Manifest {
            navigation: build_navigation(&self.registry),
            patterns: self.registry.clone(),
            data: self.data.clone(),
            diagnostics: self.diagnostics.clone(),
        }
    }
}

/// The collated JSON artifact consumed by the compile stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub navigation: Vec<NavItem>,
    pub patterns: Registry,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Write `manifest` as pretty JSON, creating parent directories.
pub fn write_manifest(manifest: &Manifest, path: &Path) -> Result<(), CollateError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(path, json)?;
    tracing::info!(path = %path.display(), "manifest written");
    Ok(())
}

pub fn read_manifest(path: &Path) -> Result<Manifest, CollateError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Build the render context for a pattern.
///
/// `{ data: global, pattern: front_matter, ...front_matter }`. A front matter
/// key named `data` or `pattern` stays reachable under `pattern.*` only; the
/// clashing names are returned.
pub fn pattern_context(
    global: &Map<String, Value>,
    front_matter: &Map<String, Value>,
) -> (Value, Vec<&'static str>) {
    let mut ctx = Map::new();
    let mut clashes = Vec::new();
    for (key, value) in front_matter {
        match RESERVED_CONTEXT_KEYS.iter().find(|r| **r == key) {
            Some(reserved) => clashes.push(*reserved),
            None => {
                ctx.insert(key.clone(), value.clone());
            }
        }
    }
    ctx.insert("data".to_string(), Value::Object(global.clone()));
    ctx.insert("pattern".to_string(), Value::Object(front_matter.clone()));
    (Value::Object(ctx), clashes)
}

/// Collate every pattern under the configured sources.
pub fn collate(
    config: &StyleguideConfig,
    project: &Path,
    renderer: &mut Renderer,
) -> Result<Collation, CollateError> {
    let global = data::load_global_data(&config.data_globs(project))?;
    let mut diagnostics = global.diagnostics;

    let files = collect_pattern_files(config, project);
    tracing::info!(files = files.len(), "collating patterns");

    let mut drafts = Vec::new();
    for (rel, abs) in &files {
        drafts.extend(parse_pattern_file(abs, rel, &mut diagnostics));
    }

    let mut partials = Vec::new();
    let drafts: Vec<Draft> = drafts
        .into_iter()
        .filter(|d| match renderer.register_partial(&d.pattern.key, &d.pattern.template) {
            Ok(()) => {
                partials.push(d.pattern.key.clone());
                true
            }
            Err(e) => {
                diagnostics.push(Diagnostic::warn(
                    DiagnosticKind::RenderFailed,
                    &d.pattern.path,
                    format!("'{}' is not a valid template: {e}", d.pattern.key),
                ));
                false
            }
        })
        .collect();

    let mut registry = Registry::new();
    for mut draft in drafts {
        let (ctx, clashes) = pattern_context(&global.namespace, &draft.pattern.data);
        for name in clashes {
            diagnostics.push(Diagnostic::warn(
                DiagnosticKind::DataCollision,
                &draft.pattern.path,
                format!("front matter key '{name}' is reserved, use pattern.{name}"),
            ));
        }

        match renderer.render(&draft.pattern.template, &ctx) {
            Ok(content) => draft.pattern.content = content,
            Err(e) => {
                diagnostics.push(Diagnostic::warn(
                    DiagnosticKind::RenderFailed,
                    &draft.pattern.path,
                    format!("'{}' failed to render: {e}", draft.pattern.key),
                ));
                continue;
            }
        }

        let key = draft.pattern.key.clone();
        let path = draft.pattern.path.clone();
        let content = draft.pattern.content.clone();
        match registry.insert(&draft.segments, draft.pattern) {
            Ok(None) => tracing::debug!(key = %key, path = %path, "pattern collated"),
            Ok(Some(previous)) => diagnostics.push(Diagnostic::warn(
                DiagnosticKind::KeyCollision,
                &path,
                format!("'{key}' replaces the pattern from {}", previous.path),
            )),
            Err(e) => {
                diagnostics.push(Diagnostic::warn(DiagnosticKind::KeyCollision, &path, e.to_string()));
                continue;
            }
        }
        renderer.register_pattern_helper(&key, content);
    }

    registry.sort();
    diagnostics.extend(resolve_lineage(&mut registry, &PartialSyntaxScanner));

    // Leave the renderer holding exactly what a manifest read back from disk
    // would register, so `build` and `compile` render pages alike.
    for key in &partials {
        if registry.find(key).is_none() {
            renderer.unregister_partial(key);
        }
    }
    diagnostics.extend(register_patterns(renderer, &registry));

    tracing::info!(
        patterns = registry.len(),
        diagnostics = diagnostics.len(),
        "collation complete"
    );

    Ok(Collation {
        registry,
        data: global.namespace,
        diagnostics,
    })
}

/// Register every pattern in `registry` with `renderer`: its template as a
/// partial and its rendered content as a helper.
pub fn register_patterns(renderer: &mut Renderer, registry: &Registry) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for pattern in registry.patterns() {
        if let Err(e) = renderer.register_partial(&pattern.key, &pattern.template) {
            diagnostics.push(Diagnostic::warn(
                DiagnosticKind::RenderFailed,
                &pattern.path,
                e.to_string(),
            ));
            continue;
        }
        renderer.register_pattern_helper(&pattern.key, pattern.content.clone());
    }
    diagnostics
}

/// Pattern files under every configured directory, keyed and sorted by their
/// `/`-separated path relative to the pattern base.
fn collect_pattern_files(config: &StyleguideConfig, project: &Path) -> BTreeMap<String, PathBuf> {
    let base = config.pattern_base(project);
    let mut files = BTreeMap::new();

    for dir in config.pattern_dirs(project) {
        if !dir.is_dir() {
            tracing::warn!(path = %dir.display(), "pattern directory not found, skipping");
            continue;
        }
        let walker = WalkDir::new(&dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "unreadable entry, skipping");
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() || !config.accepts_extension(path) {
                continue;
            }
            let rel = path
                .strip_prefix(&base)
                .or_else(|_| path.strip_prefix(&dir))
                .unwrap_or(path);
            files.insert(to_slash(rel), path.to_path_buf());
        }
    }
    files
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// A pattern waiting to be rendered, with the collection path it goes under.
struct Draft {
    segments: Vec<Segment>,
    pattern: Pattern,
}

/// Notes that apply to every pattern of a file, split by precedence.
#[derive(Default)]
struct FileNotes {
    /// `notes: file.md` in front matter, replacing snippet notes.
    replacing: Option<String>,
    /// Inline `notes:` text, or the sibling `<stem>.md`.
    fallback: Option<String>,
}

fn parse_pattern_file(abs: &Path, rel: &str, diagnostics: &mut Vec<Diagnostic>) -> Vec<Draft> {
    let raw = match fs::read_to_string(abs) {
        Ok(raw) => raw,
        Err(e) => {
            diagnostics.push(Diagnostic::warn(
                DiagnosticKind::FileSkipped,
                rel,
                format!("could not read: {e}"),
            ));
            return vec![];
        }
    };
    let parsed = match matter::parse_front_matter(&raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            diagnostics.push(Diagnostic::warn(DiagnosticKind::FileSkipped, rel, e.to_string()));
            return vec![];
        }
    };
    let front = matter::split_reserved(parsed.front_matter);

    let snippets = snippet::extract(&parsed.body);
    for s in &snippets {
        let problem = match s.termination {
            Termination::Closed => continue,
            Termination::Unterminated => (
                DiagnosticKind::UnterminatedSnippet,
                "has no endsnippet marker and runs to end of file",
            ),
            Termination::Replaced => (
                DiagnosticKind::ReplacedSnippet,
                "was cut short by the next snippet marker",
            ),
        };
        diagnostics.push(Diagnostic::warn(
            problem.0,
            rel,
            format!("snippet '{}' {}", s.name, problem.1),
        ));
    }

    let (segments, file_name) = path_segments(rel);
    let stem = Path::new(&file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(&file_name)
        .to_string();
    let parsed_name = parse_entry_name(&stem);
    let file_order = parsed_name.number.map(OrderKey::from_prefix);
    let file_notes = resolve_file_notes(&front, abs, rel, diagnostics);

    let markdown: Vec<&Snippet> = snippets
        .iter()
        .filter(|s| s.kind == SnippetKind::Markdown)
        .collect();
    let html: Vec<&Snippet> = snippets
        .iter()
        .filter(|s| s.kind == SnippetKind::Html)
        .collect();

    let snippet_notes = |name: &str| -> Option<String> {
        markdown
            .iter()
            .rev()
            .find(|m| m.name == name)
            .map(|m| render_markdown(&m.content))
    };

    let base = DraftBase {
        segments: &segments,
        rel,
        front: &front,
        file_order: &file_order,
    };

    if html.is_empty() {
        let template = snippet::strip_regions(&parsed.body, &[SnippetKind::Remove, SnippetKind::Markdown]);
        let template = template.trim_start_matches(['\r', '\n']).trim_end().to_string();
        let id = parsed_name.name;
        let notes = file_notes
            .replacing
            .clone()
            .or_else(|| snippet_notes(&id))
            .or_else(|| snippet_notes(""))
            .or(file_notes.fallback);
        for orphan in markdown.iter().filter(|m| m.name != id && !m.name.is_empty()) {
            diagnostics.push(orphan_notes(rel, &orphan.name));
        }
        return vec![base.draft(id, template, notes, None, true)];
    }

    for orphan in markdown
        .iter()
        .filter(|m| !html.iter().any(|h| h.name == m.name))
    {
        diagnostics.push(orphan_notes(rel, &orphan.name));
    }

    html.iter()
        .map(|s| {
            let id = if s.name.is_empty() {
                parsed_name.name.clone()
            } else {
                s.name.clone()
            };
            let notes = file_notes
                .replacing
                .clone()
                .or_else(|| snippet_notes(&s.name))
                .or_else(|| file_notes.fallback.clone());
            let in_nav = s.extra.as_deref().is_none_or(|extra| {
                !HIDDEN_MARKERS.contains(&extra.trim().to_ascii_lowercase().as_str())
            });
            base.draft(id, s.content.clone(), notes, s.flags.clone(), in_nav)
        })
        .collect()
}

fn orphan_notes(rel: &str, name: &str) -> Diagnostic {
    Diagnostic::warn(
        DiagnosticKind::OrphanNotes,
        rel,
        format!("markdown snippet '{name}' has no html snippet of the same name"),
    )
}

/// File-level values shared by every draft from one file.
struct DraftBase<'a> {
    segments: &'a [Segment],
    rel: &'a str,
    front: &'a FrontMatter,
    file_order: &'a Option<OrderKey>,
}

impl DraftBase<'_> {
    fn draft(
        &self,
        id: String,
        template: String,
        notes: Option<String>,
        flags: Option<String>,
        in_nav: bool,
    ) -> Draft {
        let slugs: Vec<&str> = self.segments.iter().map(|s| s.slug.as_str()).collect();
        Draft {
            segments: self.segments.to_vec(),
            pattern: Pattern {
                key: compose_key(&slugs, &id),
                name: title_case(&id),
                id,
                collections: slugs.iter().map(|s| s.to_string()).collect(),
                path: self.rel.to_string(),
                template,
                content: String::new(),
                notes,
                data: self.front.data.clone(),
                order: self.front.order.clone().or_else(|| self.file_order.clone()),
                flags,
                in_nav,
                lineage: Lineage::default(),
            },
        }
    }
}

/// Collection segments for the directories of `rel`, and the file name.
fn path_segments(rel: &str) -> (Vec<Segment>, String) {
    let mut parts: Vec<&str> = rel.split('/').collect();
    let file_name = parts.pop().unwrap_or_default().to_string();
    let segments = parts
        .into_iter()
        .filter(|p| !p.is_empty() && *p != ".")
        .map(|dir| {
            let parsed = parse_entry_name(dir);
            Segment {
                slug: parsed.name,
                name: parsed.display_title,
                order: parsed.number.map(OrderKey::from_prefix),
            }
        })
        .collect();
    (segments, file_name)
}

fn resolve_file_notes(
    front: &FrontMatter,
    abs: &Path,
    rel: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> FileNotes {
    let dir = abs.parent().unwrap_or(Path::new("."));
    match &front.notes {
        Some(notes) if notes.trim_end().ends_with(".md") => {
            let notes_path = dir.join(notes.trim());
            match fs::read_to_string(&notes_path) {
                Ok(md) => FileNotes {
                    replacing: Some(render_markdown(&md)),
                    fallback: None,
                },
                Err(e) => {
                    diagnostics.push(Diagnostic::warn(
                        DiagnosticKind::FileSkipped,
                        rel,
                        format!("notes file {} could not be read: {e}", notes_path.display()),
                    ));
                    FileNotes::default()
                }
            }
        }
        Some(inline) => FileNotes {
            replacing: None,
            fallback: Some(render_markdown(inline)),
        },
        None => {
            let sibling = abs.with_extension("md");
            let fallback = fs::read_to_string(&sibling)
                .ok()
                .map(|md| render_markdown(&md));
            FileNotes {
                replacing: None,
                fallback,
            }
        }
    }
}

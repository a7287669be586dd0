//! Snippet extraction from comment-delimited regions.
//!
//! Pattern files mark reusable regions with HTML comments:
//!
//! ```text
//! <!-- snippet:html button -->
//! <button class="btn">{{label}}</button>
//! <!-- endsnippet -->
//!
//! <!-- snippet:markdown button -->
//! Use for primary actions.
//! <!-- endsnippet -->
//! ```
//!
//! The start marker grammar is `snippet:TYPE[(FLAGS)] [NAME] [EXTRA]`. `TYPE`
//! is `html`, `markdown`, or `remove`; anything else is kept as
//! [`SnippetKind::Other`] and left for the caller to ignore. `remove` blocks are
//! anonymous and named by a per-file counter.
//!
//! Extraction is a single line scan. Lines outside a snippet are ignored. A
//! start marker while another snippet is open abandons the open one; a snippet
//! with no end marker runs to end of input. Both cases are reported through
//! [`Snippet::termination`] rather than as errors.

use regex::Regex;
use std::sync::LazyLock;

static START_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*snippet:(\w+)(?:\(([^)]*)\))?(.*?)-->").expect("start marker regex")
});

static END_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--\s*endsnippet\s*-->").expect("end marker regex"));

/// Snippet type from the start marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnippetKind {
    Html,
    Markdown,
    Remove,
    Other(String),
}

impl SnippetKind {
    fn parse(raw: &str) -> Self {
        match raw {
            "html" => Self::Html,
            "markdown" => Self::Markdown,
            "remove" => Self::Remove,
            other => Self::Other(other.to_string()),
        }
    }
}

/// How a snippet's region ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Closed by `<!-- endsnippet -->`.
    Closed,
    /// Ran to end of input without an end marker.
    Unterminated,
    /// Abandoned when another start marker opened before the end marker.
    Replaced,
}

/// A typed, named region of a pattern file body.
#[derive(Debug, Clone, PartialEq)]
pub struct Snippet {
    pub kind: SnippetKind,
    /// Marker name, or the removal counter for `remove` blocks. Empty when the
    /// marker carries no name.
    pub name: String,
    /// Parenthesized annotation: `snippet:html(wide) card` → `Some("wide")`.
    pub flags: Option<String>,
    /// Free text after the name, e.g. a navigation visibility hint.
    pub extra: Option<String>,
    /// Text between the markers, with the opening marker's indentation
    /// prepended and the input's line ending preserved.
    pub content: String,
    pub termination: Termination,
}

/// Line ending detected in a body: CRLF wins if present anywhere.
pub fn detect_line_ending(body: &str) -> &'static str {
    if body.contains("\r\n") { "\r\n" } else { "\n" }
}

struct Region {
    kind: SnippetKind,
    name: String,
    flags: Option<String>,
    extra: Option<String>,
    lines: Vec<String>,
    termination: Termination,
}

/// Split `body` into snippets, in order of first appearance.
///
/// A repeated `(type, name, extra)` triple replaces the earlier snippet's
/// content but keeps its position.
pub fn extract(body: &str) -> Vec<Snippet> {
    let line_ending = detect_line_ending(body);
    let normalized = body.replace("\r\n", "\n");

    let mut regions: Vec<Region> = Vec::new();
    let mut open: Option<usize> = None;
    let mut remove_index = 0u32;

    for line in normalized.split('\n') {
        if let Some(caps) = START_MARKER.captures(line) {
            if let Some(idx) = open {
                regions[idx].termination = Termination::Replaced;
            }

            let kind = SnippetKind::parse(&caps[1]);
            let flags = caps
                .get(2)
                .map(|m| m.as_str().trim().to_string())
                .filter(|f| !f.is_empty());
            let (mut name, extra) = split_name_and_extra(caps.get(3).map_or("", |m| m.as_str()));
            if kind == SnippetKind::Remove {
                name = remove_index.to_string();
                remove_index += 1;
            }

            let region = Region {
                kind,
                name,
                flags,
                extra,
                lines: vec![line.to_string()],
                termination: Termination::Unterminated,
            };

            let existing = regions.iter().position(|r| {
                r.kind == region.kind && r.name == region.name && r.extra == region.extra
            });
            let idx = match existing {
                Some(idx) => {
                    regions[idx] = region;
                    idx
                }
                None => {
                    regions.push(region);
                    regions.len() - 1
                }
            };
            open = Some(idx);
            continue;
        }

        if let Some(idx) = open {
            regions[idx].lines.push(line.to_string());
            if END_MARKER.is_match(line) {
                regions[idx].termination = Termination::Closed;
                open = None;
            }
        }
    }

    regions
        .into_iter()
        .map(|r| finish(r, line_ending))
        .collect()
}

/// Drop every region of one of `kinds`, markers included, from `body`.
///
/// Used where a whole file body becomes output: a pattern without html
/// snippets drops its `remove` and `markdown` regions, a page drops `remove`
/// regions. An unterminated region drops the rest of the body. The input's
/// line ending is kept.
pub fn strip_regions(body: &str, kinds: &[SnippetKind]) -> String {
    let line_ending = detect_line_ending(body);
    let normalized = body.replace("\r\n", "\n");
    let mut kept: Vec<&str> = Vec::new();
    let mut removing = false;

    for line in normalized.split('\n') {
        if let Some(caps) = START_MARKER.captures(line)
            && kinds.contains(&SnippetKind::parse(&caps[1]))
        {
            removing = true;
            continue;
        }
        if removing {
            if END_MARKER.is_match(line) {
                removing = false;
            }
            continue;
        }
        kept.push(line);
    }
    kept.join(line_ending)
}

fn split_name_and_extra(rest: &str) -> (String, Option<String>) {
    let rest = rest.trim();
    match rest.split_once(char::is_whitespace) {
        Some((name, extra)) => {
            let extra = extra.trim();
            (
                name.to_string(),
                (!extra.is_empty()).then(|| extra.to_string()),
            )
        }
        None => (rest.to_string(), None),
    }
}

fn finish(region: Region, line_ending: &str) -> Snippet {
    let indent: String = region.lines[0]
        .chars()
        .take_while(|c| c.is_whitespace())
        .collect();

    let body_end = match region.termination {
        Termination::Closed => region.lines.len() - 1,
        Termination::Unterminated | Termination::Replaced => region.lines.len(),
    };
    let inner = if body_end > 1 {
        region.lines[1..body_end].join(line_ending)
    } else {
        String::new()
    };

    Snippet {
        kind: region.kind,
        name: region.name,
        flags: region.flags,
        extra: region.extra,
        content: format!("{indent}{inner}"),
        termination: region.termination,
    }
}

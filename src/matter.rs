//! Front matter parsing for pattern and page files.
//!
//! ```text
//! ---
//! order: 2
//! notes: button.md
//! variant: primary
//! ---
//! <!-- snippet:html button -->
//! ...
//! ```
//!
//! The YAML block is split from the body by `gray_matter` and decoded into a
//! JSON object, so front matter values can flow straight into render
//! contexts. `notes` and `order` are reserved: they steer the registry builder
//! and never reach a pattern's `data`.

use crate::pattern::OrderKey;
use gray_matter::Matter;
use gray_matter::engine::YAML;
use serde_json::{Map, Value};
use thiserror::Error;

/// Front matter keys consumed by the registry builder.
pub const RESERVED_KEYS: &[&str] = &["notes", "order"];

#[derive(Error, Debug)]
pub enum MatterError {
    #[error("front matter parse error: {0}")]
    Parse(#[from] gray_matter::Error),
    #[error("front matter cannot be represented as data: {0}")]
    Convert(#[from] serde_json::Error),
    #[error("front matter must be a mapping, found {0}")]
    NotAMapping(&'static str),
}

/// A file split into its front matter object and body text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedMatter {
    pub front_matter: Map<String, Value>,
    pub body: String,
}

/// Front matter with the reserved keys pulled out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    /// Path to a `.md` file (relative to the pattern file) or inline Markdown.
    pub notes: Option<String>,
    pub order: Option<OrderKey>,
    /// Everything else, verbatim.
    pub data: Map<String, Value>,
}

/// Drop trailing blank lines (and the whitespace before them).
///
/// Text that ends in spaces without a final newline is returned unchanged.
pub fn trim_trailing_blank_lines(raw: &str) -> &str {
    if raw.ends_with('\n') || raw.ends_with('\r') {
        raw.trim_end()
    } else {
        raw
    }
}

/// Split `raw` into front matter and body.
///
/// A file without a front matter block yields an empty map and the whole
/// (trimmed) text as body.
pub fn parse_front_matter(raw: &str) -> Result<ParsedMatter, MatterError> {
    let input = trim_trailing_blank_lines(raw);
    let matter = Matter::<YAML>::new();
    let parsed = matter.parse::<serde_yaml::Value>(input)?;

    let front_matter = match parsed.data {
        None => Map::new(),
        Some(yaml) => match serde_json::to_value(yaml)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => return Err(MatterError::NotAMapping(value_kind(&other))),
        },
    };

    Ok(ParsedMatter {
        front_matter,
        body: parsed.content,
    })
}

/// Pull the reserved keys out of a front matter object.
///
/// A non-string `notes` value is ignored; an `order` that is neither a number
/// nor a string is treated as absent.
pub fn split_reserved(mut front_matter: Map<String, Value>) -> FrontMatter {
    let notes = match front_matter.remove("notes") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    };
    let order = front_matter
        .remove("order")
        .as_ref()
        .and_then(OrderKey::from_value);

    FrontMatter {
        notes,
        order,
        data: front_matter,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

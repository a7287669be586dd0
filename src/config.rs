//! Project configuration module.
//!
//! Handles loading, validating, and merging `kickstart.toml`. The file lives in
//! the project directory and is layered over stock defaults, so it only needs
//! the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [source]
//! base = "src/patterns"          # Root directory for pattern scanning
//! patterns = ["."]               # Sub-directories of base to scan
//! extensions = ["html", "hbs"]   # Pattern file extensions
//! data = ["src/data/**/*.json", "src/data/**/*.yaml", "src/data/**/*.yml"]
//! pages = ["src/pages"]          # Page/template directories
//!
//! [dest]
//! base = "public"                            # Rendered site
//! data = "public/data/styleguide-data.json"  # Collated registry
//!
//! [beautify]
//! indent_with_tabs = true
//! indent_size = 1
//!
//! [lineage]
//! strict = false                 # `check` fails on any diagnostic
//! ```
//!
//! ## Partial Configuration
//!
//! ```toml
//! # Only move the output directory
//! [dest]
//! base = "dist"
//! ```
//!
//! Unknown keys are rejected to catch typos early. Relative paths resolve
//! against the project directory.

use crate::beautify::Indent;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file name looked up in the project directory.
pub const CONFIG_FILE: &str = "kickstart.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `kickstart.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleguideConfig {
    /// Where patterns, data and pages are read from.
    pub source: SourceConfig,
    /// Where the registry and the rendered site are written.
    pub dest: DestConfig,
    /// Indentation of rendered markup.
    pub beautify: BeautifyConfig,
    pub lineage: LineageConfig,
}

impl StyleguideConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.patterns.is_empty() {
            return Err(ConfigError::Validation(
                "source.patterns must not be empty".into(),
            ));
        }
        if self.source.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "source.extensions must not be empty".into(),
            ));
        }
        if !(1..=8).contains(&self.beautify.indent_size) {
            return Err(ConfigError::Validation(
                "beautify.indent_size must be 1-8".into(),
            ));
        }
        if Path::new(&self.dest.data)
            .extension()
            .is_none_or(|ext| ext != "json")
        {
            return Err(ConfigError::Validation(
                "dest.data must be a .json file".into(),
            ));
        }
        Ok(())
    }

    pub fn indent(&self) -> Indent {
        Indent {
            use_tabs: self.beautify.indent_with_tabs,
            size: self.beautify.indent_size,
        }
    }

    /// Directories to scan for patterns, in configured order.
    pub fn pattern_dirs(&self, project: &Path) -> Vec<PathBuf> {
        let base = project.join(&self.source.base);
        self.source
            .patterns
            .iter()
            .map(|p| if p == "." { base.clone() } else { base.join(p) })
            .collect()
    }

    pub fn pattern_base(&self, project: &Path) -> PathBuf {
        project.join(&self.source.base)
    }

    /// Data globs made absolute against the project directory.
    pub fn data_globs(&self, project: &Path) -> Vec<String> {
        self.source
            .data
            .iter()
            .map(|g| project.join(g).to_string_lossy().into_owned())
            .collect()
    }

    pub fn page_dirs(&self, project: &Path) -> Vec<PathBuf> {
        self.source.pages.iter().map(|p| project.join(p)).collect()
    }

    pub fn site_dir(&self, project: &Path) -> PathBuf {
        project.join(&self.dest.base)
    }

    pub fn manifest_path(&self, project: &Path) -> PathBuf {
        project.join(&self.dest.data)
    }

    pub fn accepts_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.source
                    .extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }
}

/// Input locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub base: String,
    pub patterns: Vec<String>,
    pub extensions: Vec<String>,
    /// Globs for global JSON/YAML data.
    pub data: Vec<String>,
    pub pages: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base: "src/patterns".to_string(),
            patterns: vec![".".to_string()],
            extensions: vec!["html".to_string(), "hbs".to_string()],
            data: vec![
                "src/data/**/*.json".to_string(),
                "src/data/**/*.yaml".to_string(),
                "src/data/**/*.yml".to_string(),
            ],
            pages: vec!["src/pages".to_string()],
        }
    }
}

/// Output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DestConfig {
    pub base: String,
    pub data: String,
}

impl Default for DestConfig {
    fn default() -> Self {
        Self {
            base: "public".to_string(),
            data: "public/data/styleguide-data.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BeautifyConfig {
    pub indent_with_tabs: bool,
    pub indent_size: usize,
}

impl Default for BeautifyConfig {
    fn default() -> Self {
        Self {
            indent_with_tabs: true,
            indent_size: 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LineageConfig {
    /// Treat every diagnostic as a failure in `check`.
    pub strict: bool,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(StyleguideConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, so a list in
///   the overlay replaces the stock list rather than extending it.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `kickstart.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist, `Err` if it exists but is
/// not valid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<StyleguideConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: StyleguideConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config for the project at `project`.
pub fn load_config(project: &Path) -> Result<StyleguideConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(project)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `kickstart.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Kickstart Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Relative paths resolve against the
# directory containing this file. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Sources
# ---------------------------------------------------------------------------
[source]
# Root directory for pattern scanning. Directory names below it become
# collections; an NN- prefix sets their order and is dropped from the name.
base = "src/patterns"

# Sub-directories of base to scan. "." scans base itself.
patterns = ["."]

# File extensions treated as pattern files.
extensions = ["html", "hbs"]

# Global data files. Each file is exposed to templates under its file stem:
# src/data/colors.yaml -> {{data.colors.primary}}
data = ["src/data/**/*.json", "src/data/**/*.yaml", "src/data/**/*.yml"]

# Page and template directories rendered to the site.
pages = ["src/pages"]

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[dest]
# Rendered site directory.
base = "public"

# Collated registry written by `kickstart collate`.
data = "public/data/styleguide-data.json"

# ---------------------------------------------------------------------------
# Rendered markup
# ---------------------------------------------------------------------------
[beautify]
indent_with_tabs = true

# Indent characters per nesting level (1-8).
indent_size = 1

# ---------------------------------------------------------------------------
# Diagnostics
# ---------------------------------------------------------------------------
[lineage]
# When true, `kickstart check` exits non-zero on any diagnostic (dangling
# partial references, unterminated snippets, skipped files...).
strict = false
"##
}

//! Global data loading.
//!
//! Every file matched by the configured data globs is decoded (`.json` with
//! serde_json, `.yaml`/`.yml` with serde_yaml) and stored under its file stem:
//!
//! ```text
//! src/data/colors.yaml   →  data.colors
//! src/data/site.json     →  data.site
//! ```
//!
//! Files are processed in sorted path order. When two files share a stem, their
//! top-level keys merge and the later path wins on conflict. Files that fail to
//! decode are skipped with a diagnostic; only an invalid glob is an error.

use crate::types::{Diagnostic, DiagnosticKind};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid data glob: {0}")]
    Glob(#[from] glob::PatternError),
    #[error("unsupported data file extension: {0}")]
    Unsupported(String),
}

/// The merged global data namespace and what went wrong building it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalData {
    pub namespace: Map<String, Value>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Decode one data file by extension.
pub fn load_data_file(path: &Path) -> Result<Value, DataError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let content = fs::read_to_string(path)?;
    match ext.as_str() {
        "json" => Ok(serde_json::from_str(&content)?),
        "yaml" | "yml" => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(&content)?;
            Ok(serde_json::to_value(yaml)?)
        }
        _ => Err(DataError::Unsupported(path.display().to_string())),
    }
}

/// Expand `globs`, load every match and namespace it by file stem.
pub fn load_global_data(globs: &[String]) -> Result<GlobalData, DataError> {
    let mut paths: BTreeSet<PathBuf> = BTreeSet::new();
    for pattern in globs {
        for entry in glob::glob(pattern)? {
            match entry {
                Ok(path) if path.is_file() => {
                    paths.insert(path);
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(error = %e, "unreadable data glob match"),
            }
        }
    }

    let mut data = GlobalData::default();
    for path in paths {
        let shown = path.display().to_string();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let value = match load_data_file(&path) {
            Ok(value) => value,
            Err(e) => {
                data.diagnostics.push(Diagnostic::warn(
                    DiagnosticKind::DataSkipped,
                    &shown,
                    format!("could not load data file: {e}"),
                ));
                continue;
            }
        };
        tracing::debug!(path = %shown, namespace = stem, "loaded data file");
        insert_namespaced(&mut data, stem, value, &shown);
    }
    Ok(data)
}

fn insert_namespaced(data: &mut GlobalData, stem: &str, value: Value, path: &str) {
    let Some(existing) = data.namespace.get_mut(stem) else {
        data.namespace.insert(stem.to_string(), value);
        return;
    };

    match (existing, value) {
        (Value::Object(into), Value::Object(from)) => {
            let clashes: Vec<String> = from
                .keys()
                .filter(|k| into.contains_key(*k))
                .cloned()
                .collect();
            into.extend(from);
            if !clashes.is_empty() {
                data.diagnostics.push(Diagnostic::warn(
                    DiagnosticKind::DataCollision,
                    path,
                    format!("overrides data.{stem} keys: {}", clashes.join(", ")),
                ));
            }
        }
        (slot, value) => {
            *slot = value;
            data.diagnostics.push(Diagnostic::warn(
                DiagnosticKind::DataCollision,
                path,
                format!("replaces earlier data.{stem}"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn globs(root: &Path) -> Vec<String> {
        ["**/*.json", "**/*.yaml", "**/*.yml"]
            .iter()
            .map(|g| root.join(g).to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn namespaces_by_file_stem() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("site.json"), r#"{"title": "Kit"}"#).unwrap();
        fs::write(tmp.path().join("colors.yaml"), "primary: \"#f00\"\n").unwrap();

        let data = load_global_data(&globs(tmp.path())).unwrap();
        assert_eq!(data.namespace["site"], json!({"title": "Kit"}));
        assert_eq!(data.namespace["colors"]["primary"], json!("#f00"));
        assert!(data.diagnostics.is_empty());
    }

    #[test]
    fn same_stem_merges_later_path_wins() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("b")).unwrap();
        fs::write(tmp.path().join("a.json"), r#"{"x": 1, "y": 1}"#).unwrap();
        fs::write(tmp.path().join("b/a.yml"), "y: 2\nz: 3\n").unwrap();

        let data = load_global_data(&globs(tmp.path())).unwrap();
        assert_eq!(data.namespace["a"], json!({"x": 1, "y": 2, "z": 3}));
        assert_eq!(data.diagnostics.len(), 1);
        assert_eq!(data.diagnostics[0].kind, DiagnosticKind::DataCollision);
    }

    #[test]
    fn broken_file_skipped_with_diagnostic() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bad.json"), "{nope").unwrap();
        fs::write(tmp.path().join("good.json"), "[1, 2]").unwrap();

        let data = load_global_data(&globs(tmp.path())).unwrap();
        assert_eq!(data.namespace.keys().collect::<Vec<_>>(), vec!["good"]);
        assert_eq!(data.diagnostics[0].kind, DiagnosticKind::DataSkipped);
    }

    #[test]
    fn no_matches_is_empty() {
        let tmp = TempDir::new().unwrap();
        let data = load_global_data(&globs(tmp.path())).unwrap();
        assert!(data.namespace.is_empty());
    }

    #[test]
    fn invalid_glob_is_an_error() {
        assert!(matches!(
            load_global_data(&["[".to_string()]),
            Err(DataError::Glob(_))
        ));
    }
}

//! # Kickstart
//!
//! A pattern library generator. Pattern files are Handlebars templates in a
//! directory tree; directories become collections, snippet markers split files
//! into patterns, and markdown becomes their notes. The result is a navigable
//! styleguide plus the project's own pages, all rendered against one shared
//! registry of partials and helpers.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! Kickstart processes content through two stages joined by a JSON manifest:
//!
//! ```text
//! 1. Collate  src/patterns/ + src/data/  →  styleguide-data.json  (files → registry)
//! 2. Compile  manifest + src/pages/      →  public/               (final HTML site)
//! ```
//!
//! This separation exists for two reasons:
//!
//! - **Debuggability**: the manifest is human-readable JSON you can inspect,
//!   and other tools can consume it.
//! - **Testability**: collation is a function from files to a registry, so
//!   unit tests can exercise ordering, keys and lineage without rendering a site.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`collate`] | Stage 1: walks pattern directories, renders patterns, writes the manifest |
//! | [`generate`] | Stage 2: renders styleguide pages with Maud and project pages with Handlebars |
//! | [`snippet`] | `<!-- snippet:kind name -->` region extraction |
//! | [`matter`] | YAML front matter parsing and reserved-key split |
//! | [`pattern`] | Registry tree, pattern and collection types, ordering |
//! | [`lineage`] | Partial-reference scanning and bidirectional lineage edges |
//! | [`data`] | Global JSON/YAML data namespaced by file stem |
//! | [`render`] | Handlebars registry with `iterate` and per-pattern helpers, Markdown |
//! | [`beautify`] | Indentation normalizer for rendered HTML |
//! | [`config`] | `kickstart.toml` loading, validation and merging over stock defaults |
//! | [`types`] | Shared types serialized in the manifest (`NavItem`, `Diagnostic`) |
//! | [`naming`] | `NN-name` prefix parser and key composition |
//! | [`output`] | CLI output formatting, tree-based display of pipeline results |
//!
//! # Design Decisions
//!
//! ## One Renderer Per Build
//!
//! Every pattern is registered as a partial under its key before any pattern
//! renders, so templates may include patterns defined later in scan order.
//! After a pattern renders, its output is also registered as a helper
//! (`{{atoms-button "primary"}}`) that adds classes to its first element.
//! Pages are rendered by the same registry, which is why `build` runs both
//! stages in one process and `compile` re-registers everything from the
//! manifest.
//!
//! ## Warn, Don't Fail
//!
//! A broken pattern file never stops the build. Unreadable files, templates
//! that fail to compile, unterminated snippets and references to unknown
//! patterns are recorded as [`types::Diagnostic`]s, logged, written into the
//! manifest and printed. Only configuration errors and output write failures
//! are fatal. `kickstart check --strict` turns diagnostics into a failure.
//!
//! ## NN-Prefix Ordering
//!
//! Directories and files use a numeric prefix (`01-`, `020-`) for explicit
//! ordering. This is parsed by [`naming::parse_entry_name`]. Front matter
//! `order` overrides it. Items without an order (or with an empty one) sort
//! first, then numeric orders ascending, then other strings lexically; ties
//! keep scan order. See [`pattern::compare_orders`]:
//!
//! ```
//! use kickstart::pattern::{OrderKey, compare_orders};
//!
//! let mut orders = vec![
//!     Some(OrderKey::from_prefix(3)),
//!     Some(OrderKey::Text(String::new())),
//!     Some(OrderKey::from_prefix(1)),
//! ];
//! orders.sort_by(|a, b| compare_orders(a.as_ref(), b.as_ref()));
//! assert_eq!(
//!     orders,
//!     vec![
//!         Some(OrderKey::Text(String::new())),
//!         Some(OrderKey::from_prefix(1)),
//!         Some(OrderKey::from_prefix(3)),
//!     ]
//! );
//! ```
//!
//! ## Maud For The Styleguide, Handlebars For Content
//!
//! The styleguide chrome is generated with [Maud](https://maud.lambda.xyz/),
//! so its markup is checked at compile time and escaped by default. Pattern
//! and page files are the user's Handlebars templates and go through
//! `handlebars-rust`.

pub mod beautify;
pub mod collate;
pub mod config;
pub mod data;
pub mod generate;
pub mod lineage;
pub mod matter;
pub mod naming;
pub mod output;
pub mod pattern;
pub mod render;
pub mod snippet;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

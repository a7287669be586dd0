//! The pattern registry: a directory-shaped tree of render-ready patterns.
//!
//! ```text
//! Registry
//! ├── "atoms"  → Collection { name: "Atoms", items }
//! │   ├── "atoms-button" → Pattern
//! │   └── "forms"  → Collection { name: "Forms", items }
//! │       └── "atoms-forms-input" → Pattern
//! └── "badge"  → Pattern            (file at the scan root)
//! ```
//!
//! Collections are created on demand from a pattern's directory segments, so
//! the tree has whatever depth the source tree has. Items keep insertion order
//! until [`Registry::sort`] orders every level by [`compare_orders`].
//!
//! Lineage edges are stored as keys plus source paths, never as references
//! into the tree: the registry is the only owner of its patterns.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Sort key declared in front matter (`order: 2`) or taken from an `NN-` prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderKey {
    Number(serde_json::Number),
    Text(String),
}

impl OrderKey {
    /// Read an order from a front matter value. Only numbers and strings qualify.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    pub fn from_prefix(number: u32) -> Self {
        Self::Number(number.into())
    }
}

enum SortRank<'a> {
    Empty,
    Numeric(f64),
    Lexical(&'a str),
}

fn sort_rank(order: Option<&OrderKey>) -> SortRank<'_> {
    match order {
        None => SortRank::Empty,
        Some(OrderKey::Number(n)) => n.as_f64().map_or(SortRank::Empty, SortRank::Numeric),
        Some(OrderKey::Text(s)) => {
            let t = s.trim();
            if t.is_empty() {
                return SortRank::Empty;
            }
            match t.parse::<f64>() {
                Ok(n) if n.is_finite() => SortRank::Numeric(n),
                _ => SortRank::Lexical(t),
            }
        }
    }
}

/// Total order over optional sort keys.
///
/// Missing or empty orders come first, then numeric orders (numbers and
/// numeric strings) ascending, then remaining strings lexically. So
/// `[3, "", 1]` sorts to `["", 1, 3]`.
pub fn compare_orders(a: Option<&OrderKey>, b: Option<&OrderKey>) -> Ordering {
    use SortRank::*;
    match (sort_rank(a), sort_rank(b)) {
        (Empty, Empty) => Ordering::Equal,
        (Empty, _) => Ordering::Less,
        (_, Empty) => Ordering::Greater,
        (Numeric(x), Numeric(y)) => x.total_cmp(&y),
        (Numeric(_), Lexical(_)) => Ordering::Less,
        (Lexical(_), Numeric(_)) => Ordering::Greater,
        (Lexical(x), Lexical(y)) => x.cmp(y),
    }
}

/// One directed lineage edge endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageRef {
    /// Key of the pattern on the other end of the edge.
    pub pattern: String,
    /// Source path of that pattern, relative to the scan base.
    pub pattern_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lineage {
    /// Patterns this pattern's template includes.
    #[serde(default)]
    pub includes: Vec<LineageRef>,
    /// Patterns whose templates include this pattern.
    #[serde(default)]
    pub included_by: Vec<LineageRef>,
}

/// A render-ready pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    /// Composite key: collection segments and id joined by `-`.
    pub key: String,
    /// Snippet name, or the file name with its ordering prefix stripped.
    pub id: String,
    /// Display title derived from the id.
    pub name: String,
    /// Collection segments from the scan root down to the file's directory.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<String>,
    /// Source file path relative to the scan base, `/`-separated.
    pub path: String,
    /// Raw template text as extracted from the file.
    pub template: String,
    /// Rendered and beautified HTML.
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Front matter minus the reserved keys.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
    #[serde(default = "default_in_nav")]
    pub in_nav: bool,
    #[serde(default)]
    pub lineage: Lineage,
}

fn default_in_nav() -> bool {
    true
}

impl Pattern {
    /// Immediate parent directory's collection name.
    pub fn collection(&self) -> Option<&str> {
        self.collections.last().map(String::as_str)
    }

    /// Grandparent collection name, for patterns nested two levels deep.
    pub fn parent_collection(&self) -> Option<&str> {
        let n = self.collections.len();
        (n >= 2).then(|| self.collections[n - 2].as_str())
    }
}

/// A collection node created from a directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderKey>,
    #[serde(default)]
    pub items: Items,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entry {
    Pattern(Box<Pattern>),
    Collection(Collection),
}

impl Entry {
    fn order(&self) -> Option<&OrderKey> {
        match self {
            Entry::Pattern(p) => p.order.as_ref(),
            Entry::Collection(c) => c.order.as_ref(),
        }
    }
}

/// Ordered mapping from item key to entry. Serialized as a JSON object whose
/// member order is the item order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Items(Vec<(String, Entry)>);

impl Items {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.0.iter().map(|(k, e)| (k.as_str(), e))
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, e)| e)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.0.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.0.iter().position(|(k, _)| k == key)
    }

    fn sort(&mut self) {
        self.0.sort_by(|(_, a), (_, b)| compare_orders(a.order(), b.order()));
        for (_, entry) in &mut self.0 {
            if let Entry::Collection(c) = entry {
                c.items.sort();
            }
        }
    }
}

/// Remove the pattern `key` found under the collections `trail`, dropping
/// collections that end up empty.
fn remove_at(items: &mut Items, trail: &[String], key: &str) -> Option<Pattern> {
    match trail.split_first() {
        None => {
            let idx = items
                .0
                .iter()
                .position(|(k, e)| k == key && matches!(e, Entry::Pattern(_)))?;
            match items.0.remove(idx).1 {
                Entry::Pattern(p) => Some(*p),
                Entry::Collection(_) => None,
            }
        }
        Some((slug, rest)) => {
            let idx = items.position(slug)?;
            let (removed, emptied) = match &mut items.0[idx].1 {
                Entry::Collection(c) => {
                    let removed = remove_at(&mut c.items, rest, key);
                    (removed, c.items.is_empty())
                }
                Entry::Pattern(_) => return None,
            };
            if emptied {
                items.0.remove(idx);
            }
            removed
        }
    }
}

impl Serialize for Items {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, entry) in &self.0 {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Items {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ItemsVisitor;

        impl<'de> Visitor<'de> for ItemsVisitor {
            type Value = Items;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of registry entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Items, A::Error> {
                let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, entry)) = access.next_entry::<String, Entry>()? {
                    items.push((key, entry));
                }
                Ok(Items(items))
            }
        }

        deserializer.deserialize_map(ItemsVisitor)
    }
}

/// One directory level on the way to a pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Item key in the parent level (directory name with its prefix stripped).
    pub slug: String,
    /// Display title.
    pub name: String,
    pub order: Option<OrderKey>,
}

#[derive(Error, Debug, PartialEq)]
pub enum InsertError {
    #[error("'{0}' is already a pattern, cannot create a collection there")]
    PatternInTheWay(String),
    #[error("'{0}' is already a collection, cannot store a pattern there")]
    CollectionInTheWay(String),
}

/// Root of the pattern tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    items: Items,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &Items {
        &self.items
    }

    /// Insert a pattern under `segments`, creating collections along the way.
    ///
    /// An existing pattern with the same key at that level is replaced and
    /// returned.
    ///
    /// Keys are unique across the whole tree: a pattern with the same key in
    /// another collection is removed (pruning collections left empty) and
    /// returned as the replaced one.
    pub fn insert(
        &mut self,
        segments: &[Segment],
        pattern: Pattern,
    ) -> Result<Option<Pattern>, InsertError> {
        let key = pattern.key.clone();
        let elsewhere = self
            .location(&key)
            .filter(|trail| !trail.iter().eq(segments.iter().map(|s| &s.slug)));
        let replaced = self.insert_at(segments, pattern)?;
        match elsewhere {
            Some(trail) => Ok(remove_at(&mut self.items, &trail, &key)),
            None => Ok(replaced),
        }
    }

    fn insert_at(
        &mut self,
        segments: &[Segment],
        pattern: Pattern,
    ) -> Result<Option<Pattern>, InsertError> {
        let mut items = &mut self.items;
        for segment in segments {
            let idx = match items.position(&segment.slug) {
                Some(idx) => idx,
                None => {
                    items.0.push((
                        segment.slug.clone(),
                        Entry::Collection(Collection {
                            name: segment.name.clone(),
                            order: segment.order.clone(),
                            items: Items::default(),
                        }),
                    ));
                    items.0.len() - 1
                }
            };
            items = match &mut items.0[idx].1 {
                Entry::Collection(c) => &mut c.items,
                Entry::Pattern(_) => return Err(InsertError::PatternInTheWay(segment.slug.clone())),
            };
        }

        let key = pattern.key.clone();
        match items.position(&key) {
            Some(idx) => match &mut items.0[idx].1 {
                Entry::Pattern(existing) => {
                    let previous = std::mem::replace(existing.as_mut(), pattern);
                    Ok(Some(previous))
                }
                Entry::Collection(_) => Err(InsertError::CollectionInTheWay(key)),
            },
            None => {
                items.0.push((key, Entry::Pattern(Box::new(pattern))));
                Ok(None)
            }
        }
    }

    /// Collection slugs leading to the pattern stored under `key`.
    fn location(&self, key: &str) -> Option<Vec<String>> {
        fn walk(items: &Items, key: &str, trail: &mut Vec<String>) -> bool {
            for (slug, entry) in &items.0 {
                match entry {
                    Entry::Pattern(p) if p.key == key => return true,
                    Entry::Pattern(_) => {}
                    Entry::Collection(c) => {
                        trail.push(slug.clone());
                        if walk(&c.items, key, trail) {
                            return true;
                        }
                        trail.pop();
                    }
                }
            }
            false
        }
        let mut trail = Vec::new();
        walk(&self.items, key, &mut trail).then_some(trail)
    }

    /// All patterns, depth-first in item order.
    pub fn patterns(&self) -> Vec<&Pattern> {
        fn walk<'a>(items: &'a Items, out: &mut Vec<&'a Pattern>) {
            for (_, entry) in &items.0 {
                match entry {
                    Entry::Pattern(p) => out.push(&**p),
                    Entry::Collection(c) => walk(&c.items, out),
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.items, &mut out);
        out
    }

    pub fn patterns_mut(&mut self) -> Vec<&mut Pattern> {
        fn walk<'a>(items: &'a mut Items, out: &mut Vec<&'a mut Pattern>) {
            for (_, entry) in items.0.iter_mut() {
                match entry {
                    Entry::Pattern(p) => out.push(p.as_mut()),
                    Entry::Collection(c) => walk(&mut c.items, out),
                }
            }
        }
        let mut out = Vec::new();
        walk(&mut self.items, &mut out);
        out
    }

    pub fn find(&self, key: &str) -> Option<&Pattern> {
        self.patterns().into_iter().find(|p| p.key == key)
    }

    pub fn len(&self) -> usize {
        self.patterns().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Order every level by [`compare_orders`], keeping insertion order for ties.
    pub fn sort(&mut self) {
        self.items.sort();
    }
}

//! Read-only value providers consulted by the walker.
//!
//! A [`Source`] answers one question: is there a value for this key path, and
//! if so what is it. Key paths are the external names of every non-flattened
//! ancestor followed by the leaf's external name, e.g. `["postgres", "port"]`.
//!
//! Flat sources (environment, flags) render the path into a single string with
//! a [`KeyStyle`]; tree sources (decoded files) descend table by table.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use toml::{Table, Value};

use crate::schema::Leaf;
use crate::value::Raw;

pub trait Source {
    /// The raw value stored under `path`, if any.
    fn lookup(&self, path: &[&str]) -> Option<Raw<'_>>;
}

/// A source with nothing in it. Walking against it applies defaults only.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySource;

impl Source for EmptySource {
    fn lookup(&self, _path: &[&str]) -> Option<Raw<'_>> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Case {
    Upper,
    Lower,
}

/// How a key path becomes a flat key.
///
/// | Style | Path | Key |
/// |-------|------|-----|
/// | [`env`](KeyStyle::env) | `postgres`, `db_name` | `POSTGRES_DB_NAME` |
/// | [`env`](KeyStyle::env) + prefix `APP` | `port` | `APP_PORT` |
/// | [`flag`](KeyStyle::flag) | `postgres`, `db_name` | `postgres-db-name` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStyle {
    prefix: Option<String>,
    separator: String,
    case: Case,
    dashed: bool,
}

impl KeyStyle {
    /// Uppercase segments joined by `_`.
    pub fn env() -> Self {
        Self {
            prefix: None,
            separator: "_".into(),
            case: Case::Upper,
            dashed: false,
        }
    }

    /// Lowercase segments joined by `-`, with `_` inside a name turned into `-`.
    pub fn flag() -> Self {
        Self {
            prefix: None,
            separator: "-".into(),
            case: Case::Lower,
            dashed: true,
        }
    }

    /// Prepend `prefix` as an extra leading segment. An empty prefix means none.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn render(&self, path: &[&str]) -> String {
        let segments = self.prefix.as_deref().into_iter().chain(path.iter().copied());
        let joined = segments
            .map(|segment| {
                let segment = match self.case {
                    Case::Upper => segment.to_uppercase(),
                    Case::Lower => segment.to_lowercase(),
                };
                if self.dashed {
                    segment.replace('_', "-")
                } else {
                    segment
                }
            })
            .collect::<Vec<_>>();
        joined.join(&self.separator)
    }
}

/// Key/text pairs looked up through a [`KeyStyle`].
#[derive(Debug, Clone)]
pub struct FlatSource {
    style: KeyStyle,
    entries: HashMap<String, String>,
}

impl FlatSource {
    pub fn new(style: KeyStyle, entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            style,
            entries: entries.into_iter().collect(),
        }
    }

    pub fn style(&self) -> &KeyStyle {
        &self.style
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Two leaves whose key paths render to the same flat key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyClash {
    pub key: String,
    pub first: String,
    pub second: String,
}

/// Every pair of leaves that `style` renders to one key, in walk order.
pub(crate) fn key_collisions(style: &KeyStyle, leaves: &[Leaf]) -> Vec<KeyClash> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    let mut clashes = Vec::new();
    for leaf in leaves {
        match seen.entry(style.render(&leaf.keys)) {
            Entry::Occupied(entry) => clashes.push(KeyClash {
                key: entry.key().clone(),
                first: entry.get().to_string(),
                second: leaf.path.clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(leaf.path.as_str());
            }
        }
    }
    clashes
}

impl Source for FlatSource {
    fn lookup(&self, path: &[&str]) -> Option<Raw<'_>> {
        self.entries
            .get(&self.style.render(path))
            .map(|text| Raw::Text(text))
    }
}

/// A decoded document, looked up by descending through nested tables.
#[derive(Debug, Clone, Copy)]
pub struct TreeSource<'a> {
    root: &'a Table,
}

impl<'a> TreeSource<'a> {
    pub fn new(root: &'a Table) -> Self {
        Self { root }
    }

    /// The view rooted at the table under `path`, if there is one.
    pub fn subtree(&self, path: &[&str]) -> Option<TreeSource<'a>> {
        let mut table = self.root;
        for key in path {
            table = table.get(*key)?.as_table()?;
        }
        Some(TreeSource { root: table })
    }

    pub fn root(&self) -> &'a Table {
        self.root
    }
}

impl Source for TreeSource<'_> {
    fn lookup(&self, path: &[&str]) -> Option<Raw<'_>> {
        let (leaf, parents) = path.split_last()?;
        let value: &Value = self.subtree(parents)?.root.get(*leaf)?;
        Some(Raw::Tree(value))
    }
}

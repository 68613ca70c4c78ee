//! Logical object names
//!
//! Scene scripts refer to geometry by a short name (`cube`, `teapot-centered`).
//! The map turns those names into OBJ paths relative to the asset search paths;
//! a reference the map does not know is taken to be a path already.

use std::collections::BTreeMap;

/// Logical object name to OBJ path
#[derive(Debug, Clone, Default)]
pub struct ObjectFileMap {
    entries: BTreeMap<String, String>,
}

impl ObjectFileMap {
    /// Build a map from `(name, path)` entries
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    /// Add or replace an entry
    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<String>) {
        self.entries.insert(name.into(), path.into());
    }

    /// Path for `reference`: the mapped path, or the reference itself
    pub fn resolve<'a>(&'a self, reference: &'a str) -> &'a str {
        self.entries.get(reference).map_or(reference, String::as_str)
    }

    /// Known logical names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

//! Symbolic path key lookup.
//!
//! GET requests name their source as `/{opkey}/{pathkey}/{resource}`. The
//! `pathkey` is mapped to a base location (a directory prefix or URL prefix)
//! by a [`PathResolver`] injected into the orchestrator.

use std::collections::HashMap;

/// Maps path keys to base locations.
pub trait PathResolver: Send + Sync {
    /// Base location for `key`, or `None` if the key is not configured.
    fn resolve(&self, key: &str) -> Option<String>;
}

/// Resolver backed by a fixed table, usually the `[paths]` section of the
/// server configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticPathResolver {
    bases: HashMap<String, String>,
}

impl StaticPathResolver {
    pub fn new(bases: HashMap<String, String>) -> Self {
        Self { bases }
    }

    pub fn with_base(mut self, key: impl Into<String>, base: impl Into<String>) -> Self {
        self.bases.insert(key.into(), base.into());
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.bases.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }
}

impl PathResolver for StaticPathResolver {
    fn resolve(&self, key: &str) -> Option<String> {
        self.bases.get(key).cloned()
    }
}

impl FromIterator<(String, String)> for StaticPathResolver {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            bases: iter.into_iter().collect(),
        }
    }
}

//! Core data types shared by the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::{DocextractError, Result};

/// Metadata key for the document content type.
pub const CONTENT_TYPE: &str = "Content-Type";
/// Metadata key for the character encoding reported by the parser.
pub const CONTENT_ENCODING: &str = "Content-Encoding";
/// Metadata key for the declared upload length.
pub const CONTENT_LENGTH: &str = "Content-Length";
/// Metadata key for the client-declared file name.
pub const RESOURCE_NAME: &str = "resourceName";

/// A metadata value: either a single string or an ordered list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Single(String),
    Multi(Vec<String>),
}

impl MetadataValue {
    /// First value, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            MetadataValue::Single(v) => Some(v.as_str()),
            MetadataValue::Multi(values) => values.first().map(String::as_str),
        }
    }

    pub fn is_multi_valued(&self) -> bool {
        matches!(self, MetadataValue::Multi(_))
    }

    /// All values as a slice-like iterator.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            MetadataValue::Single(v) => std::slice::from_ref(v),
            MetadataValue::Multi(values) => values.as_slice(),
        };
        values.iter().map(String::as_str)
    }
}

/// Document metadata collected during a single extraction.
///
/// Keys are kept in lexicographic order. `set` replaces any existing value,
/// `add` appends and turns a scalar entry into a multi-valued one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataMap {
    entries: BTreeMap<String, MetadataValue>,
}

impl MetadataMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the value stored under `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), MetadataValue::Single(value.into()));
    }

    /// Store a list of values under `key`, replacing anything already there.
    pub fn set_values(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.entries.insert(key.into(), MetadataValue::Multi(values));
    }

    /// Append a value under `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        match self.entries.entry(key.into()) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(MetadataValue::Single(value));
            }
            std::collections::btree_map::Entry::Occupied(mut slot) => match slot.get_mut() {
                MetadataValue::Multi(values) => values.push(value),
                single => {
                    let first = single.first().unwrap_or_default().to_string();
                    *single = MetadataValue::Multi(vec![first, value]);
                }
            },
        }
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(MetadataValue::first)
    }

    pub fn get_value(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.get(key)
    }

    pub fn contains_value(&self, key: &str, value: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.iter().any(|v| v == value))
    }

    pub fn is_multi_valued(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(MetadataValue::is_multi_valued)
    }

    /// Keys in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Requested response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Metadata only; body text is discarded while parsing.
    Metadata,
    /// Extracted text only.
    Text,
    /// Metadata and text.
    #[serde(rename = "fulldata")]
    FullData,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Metadata => "metadata",
            Operation::Text => "text",
            Operation::FullData => "fulldata",
        }
    }

    /// Whether the parser should buffer body text for this operation.
    pub fn collects_text(&self) -> bool {
        !matches!(self, Operation::Metadata)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = DocextractError;

    /// Case-insensitive parse of `metadata`, `text`, or `fulldata`.
    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("metadata") {
            Ok(Operation::Metadata)
        } else if s.eq_ignore_ascii_case("text") {
            Ok(Operation::Text)
        } else if s.eq_ignore_ascii_case("fulldata") {
            Ok(Operation::FullData)
        } else {
            Err(DocextractError::validation(format!("Unknown operation: {}", s)))
        }
    }
}

/// Output of a successful extraction, consumed once to render the response.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    pub metadata: MetadataMap,
    /// Extracted body text; empty when nothing was collected.
    pub text: String,
    /// Encoding label used when writing the response body.
    pub encoding: String,
}

//! Structured key/value document
//!
//! Request and response bodies are modeled as a string-keyed map of JSON
//! values instead of free-form `serde_json::Value`s. Keys starting with the
//! reserved prefix are server-assigned metadata and are rejected at the
//! public mutation entry point.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Keys starting with this character are reserved for server metadata
pub const RESERVED_PREFIX: char = '_';

/// A string-keyed document of JSON-compatible values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Insert a field value, rejecting empty and reserved keys
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        if key.is_empty() {
            return Err(Error::InvalidField("field key cannot be empty".to_string()));
        }
        if key.starts_with(RESERVED_PREFIX) {
            return Err(Error::InvalidField(format!(
                "key '{key}' uses the reserved prefix '{RESERVED_PREFIX}'"
            )));
        }
        self.0.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Insert without the reserved-key check
    ///
    /// Only for folding server-issued documents back into local state.
    pub(crate) fn insert_raw(&mut self, key: String, value: Value) {
        self.0.insert(key, value);
    }

    /// Get a field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Remove a field, returning the previous value if any
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Whether the document contains a field
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the document has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Remove all fields
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Iterate over fields
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Field keys
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Merge `overlay` on top of this document into a new document
    ///
    /// Overlay values win on key collision.
    pub fn merged(&self, overlay: &Document) -> Document {
        let mut out = self.0.clone();
        for (k, v) in &overlay.0 {
            out.insert(k.clone(), v.clone());
        }
        Document(out)
    }

    /// View the underlying map
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying map
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Wrap an existing map without key checks
    pub(crate) fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Serialize to a JSON value
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

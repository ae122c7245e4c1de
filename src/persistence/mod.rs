//! Persisted session state
//!
//! The core only ever sets a handful of scalar markers (e.g. the first
//! completion time). Storage format is the host's business; `MemoryStore`
//! keeps values in memory and can snapshot them as JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque key/value storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value);

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Write `value` only if `key` has never been written. Returns true if written.
    fn set_once(&mut self, key: &str, value: Value) -> bool {
        if self.contains(key) {
            return false;
        }
        self.set(key, value);
        true
    }
}

/// In-memory store, ordered by key so snapshots are stable
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    values: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Serialize all values to a JSON object string
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.values).unwrap_or_else(|_| "{}".to_string())
    }

    /// Restore from a JSON object string; malformed input yields an empty store
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(values) => Self { values },
            Err(e) => {
                log::warn!("Discarding malformed store snapshot: {}", e);
                Self::new()
            }
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }
}

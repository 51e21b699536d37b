//! In-memory storage medium

use std::cell::RefCell;
use std::collections::HashMap;

use super::{check_quota, total_size, StorageInstance, StorageResult};

/// `HashMap`-backed medium with an optional byte quota
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    /// Create an empty, unbounded medium
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty medium that rejects writes past `bytes` in total
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: RefCell::default(),
            quota: Some(bytes),
        }
    }

    /// Store a raw persisted string, bypassing any codec and the quota
    ///
    /// Useful for seeding fixtures, including undecodable text.
    pub fn insert_raw(&self, key: impl Into<String>, raw: impl Into<String>) {
        self.entries.borrow_mut().insert(key.into(), raw.into());
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether the medium holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Sorted list of stored keys
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Total bytes held (keys plus values)
    pub fn size_bytes(&self) -> usize {
        total_size(&self.entries.borrow())
    }
}

impl StorageInstance for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.borrow_mut();
        check_quota(&entries, key, value, self.quota)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

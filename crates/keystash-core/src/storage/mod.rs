//! Storage layer
//!
//! The accessor talks to its backing medium only through [`StorageInstance`]:
//! a synchronous, string-keyed, string-valued store with one read and one
//! write call. Nothing else (remove, clear, enumerate) is part of the contract.
//!
//! ## Media
//!
//! - **MemoryStorage**: `HashMap` behind a `RefCell`, for tests and
//!   short-lived processes
//! - **FileStorage**: a single JSON object file, rewritten atomically on
//!   every write
//!
//! Both media use interior mutability, so they are `!Sync` and every call
//! runs to completion before the next one starts.

use std::collections::HashMap;
use std::rc::Rc;

pub mod error;
pub mod file;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use file::FileStorage;
pub use memory::MemoryStorage;

/// A synchronous string key-value medium
pub trait StorageInstance {
    /// Read the persisted string for `key`, or `None` if absent
    fn get_item(&self, key: &str) -> Option<String>;

    /// Replace the persisted string for `key`
    ///
    /// Either the whole value is stored or the medium is left unchanged.
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;
}

impl<S: StorageInstance + ?Sized> StorageInstance for &S {
    fn get_item(&self, key: &str) -> Option<String> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }
}

impl<S: StorageInstance + ?Sized> StorageInstance for Rc<S> {
    fn get_item(&self, key: &str) -> Option<String> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }
}

/// Bytes an entry counts against a quota
fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

/// Total bytes of all entries
pub(crate) fn total_size(entries: &HashMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| entry_size(k, v)).sum()
}

/// Reject a write that would push `entries` past `quota`
pub(crate) fn check_quota(
    entries: &HashMap<String, String>,
    key: &str,
    value: &str,
    quota: Option<usize>,
) -> StorageResult<()> {
    let Some(limit) = quota else {
        return Ok(());
    };

    let current = total_size(entries);
    let replaced = entries.get(key).map(|old| entry_size(key, old)).unwrap_or(0);
    let needed = current - replaced + entry_size(key, value);

    if needed > limit {
        return Err(StorageError::QuotaExceeded {
            key: key.to_string(),
            needed,
            limit,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_counts_replacement_not_addition() {
        let mut entries = HashMap::new();
        entries.insert("k".to_string(), "12345".to_string());

        // 1 + 5 bytes stored; replacing with 1 + 9 fits exactly in 10
        assert!(check_quota(&entries, "k", "123456789", Some(10)).is_ok());
        assert!(check_quota(&entries, "k", "1234567890", Some(10)).is_err());
    }

    #[test]
    fn test_no_quota_accepts_anything() {
        let entries = HashMap::new();
        let big = "x".repeat(1 << 16);
        assert!(check_quota(&entries, "k", &big, None).is_ok());
    }

    #[test]
    fn test_shared_handles_see_same_medium() {
        let storage = Rc::new(MemoryStorage::new());
        let other = Rc::clone(&storage);

        storage.set_item("a", "1").unwrap();
        assert_eq!(other.get_item("a"), Some("1".to_string()));

        let by_ref: &MemoryStorage = &storage;
        by_ref.set_item("b", "2").unwrap();
        assert_eq!(StorageInstance::get_item(&by_ref, "b"), Some("2".to_string()));
    }
}

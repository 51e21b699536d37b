//! File-backed storage medium
//!
//! All entries live in one JSON object (`{"key": "persisted string", ...}`)
//! at the configured path, by default `~/.local/share/keystash/store.json`.
//! The file is read once on open; every `set_item` rewrites it with an
//! atomic write (write to temp file, sync, then rename).
//!
//! The in-memory copy is only updated after the file write succeeds, so a
//! rejected write leaves both the file and the cache as they were.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{check_quota, total_size, StorageError, StorageInstance, StorageResult};
use crate::config::Config;

/// JSON-file-backed medium
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: RefCell<HashMap<String, String>>,
    quota: Option<usize>,
}

impl FileStorage {
    /// Open the store file at `path`, starting empty if it doesn't exist
    ///
    /// Returns `CorruptStore` (after writing a backup next to it) if the file
    /// exists but isn't a JSON object of strings.
    pub fn open(path: impl Into<PathBuf>, quota: Option<usize>) -> StorageResult<Self> {
        let path = path.into();
        let entries = load_entries(&path)?;
        debug!(path = ?path, entries = entries.len(), "Opened store file");

        Ok(Self {
            path,
            entries: RefCell::new(entries),
            quota,
        })
    }

    /// Open the store file named by the configuration
    pub fn from_config(config: &Config) -> StorageResult<Self> {
        Self::open(config.store_path(), config.quota_bytes)
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured quota, if any
    pub fn quota(&self) -> Option<usize> {
        self.quota
    }

    /// Whether the backing file exists on disk
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Sorted list of stored keys
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Total bytes held (keys plus values), as counted against the quota
    pub fn size_bytes(&self) -> usize {
        total_size(&self.entries.borrow())
    }
}

impl StorageInstance for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.borrow_mut();
        check_quota(&entries, key, value, self.quota)?;

        let json = {
            let mut next: BTreeMap<&str, &str> = entries
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            next.insert(key, value);
            serde_json::to_string_pretty(&next).map_err(|e| {
                StorageError::from_io(
                    io::Error::new(io::ErrorKind::InvalidData, e),
                    self.path.clone(),
                )
            })?
        };
        atomic_write(&self.path, json.as_bytes())?;

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Read the entry map from disk
fn load_entries(path: &Path) -> StorageResult<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let content = fs::read_to_string(path).map_err(|source| StorageError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }

    serde_json::from_str(&content).map_err(|e| {
        let backup_path = backup_path_for(path);
        warn!(path = ?path, backup = ?backup_path, error = %e, "Store file is corrupted");
        if let Err(copy_err) = fs::copy(path, &backup_path) {
            warn!(error = %copy_err, "Failed to back up corrupted store file");
        }
        StorageError::CorruptStore {
            path: path.to_path_buf(),
            backup_path,
            details: e.to_string(),
        }
    })
}

fn backup_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".corrupt.backup");
    PathBuf::from(name)
}

// `<file>.tmp`; never equal to `path`
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let temp_path = temp_path_for(path);

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_path(temp_dir: &TempDir) -> PathBuf {
        temp_dir.path().join("store.json")
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::open(store_path(&temp_dir), None).unwrap();

        assert!(!storage.exists());
        assert!(storage.is_empty());
        assert!(storage.get_item("anything").is_none());
    }

    #[test]
    fn test_set_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = store_path(&temp_dir);

        let storage = FileStorage::open(&path, None).unwrap();
        storage.set_item("count", "1").unwrap();
        storage.set_item("tags", "[\"a\"]").unwrap();
        assert!(storage.exists());
        drop(storage);

        let reopened = FileStorage::open(&path, None).unwrap();
        assert_eq!(reopened.get_item("count"), Some("1".to_string()));
        assert_eq!(reopened.get_item("tags"), Some("[\"a\"]".to_string()));
        assert_eq!(reopened.keys(), vec!["count".to_string(), "tags".to_string()]);
    }

    #[test]
    fn test_nested_directory_created() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a").join("b").join("store.json");

        let storage = FileStorage::open(&path, None).unwrap();
        storage.set_item("k", "true").unwrap();

        assert!(path.exists());
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_tmp_named_store_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.tmp");
        assert_ne!(temp_path_for(&path), path);

        let storage = FileStorage::open(&path, None).unwrap();
        storage.set_item("k", "1").unwrap();
        storage.set_item("k", "2").unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path, None).unwrap();
        assert_eq!(reopened.get_item("k"), Some("2".to_string()));
        assert!(!temp_dir.path().join("store.tmp.tmp").exists());
    }

    #[test]
    fn test_stores_differing_by_extension_keep_separate_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let plain = temp_dir.path().join("store");
        let json = temp_dir.path().join("store.json");
        assert_ne!(temp_path_for(&plain), temp_path_for(&json));
    }

    #[test]
    fn test_quota_rejection_leaves_file_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = store_path(&temp_dir);

        let storage = FileStorage::open(&path, Some(10)).unwrap();
        storage.set_item("k", "12").unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let err = storage.set_item("k", "1234567890").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
        assert_eq!(storage.get_item("k"), Some("12".to_string()));
    }

    #[test]
    fn test_corrupt_file_is_backed_up() {
        let temp_dir = TempDir::new().unwrap();
        let path = store_path(&temp_dir);
        fs::write(&path, "this is not json").unwrap();

        let err = FileStorage::open(&path, None).unwrap_err();
        match err {
            StorageError::CorruptStore { backup_path, .. } => {
                assert!(backup_path.exists());
                assert_eq!(fs::read_to_string(backup_path).unwrap(), "this is not json");
            }
            other => panic!("expected CorruptStore, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_file_is_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let path = store_path(&temp_dir);
        fs::write(&path, "  \n").unwrap();

        let storage = FileStorage::open(&path, None).unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_undecodable_value_text_is_kept_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let path = store_path(&temp_dir);
        fs::write(&path, r#"{"broken": "{oops"}"#).unwrap();

        let storage = FileStorage::open(&path, None).unwrap();
        assert_eq!(storage.get_item("broken"), Some("{oops".to_string()));
    }
}

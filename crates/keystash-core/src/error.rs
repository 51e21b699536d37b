//! Accessor error handling
//!
//! Only the write path can fail. Reads absorb decode failures and fall back
//! to the caller's default, so they never produce an `AccessError`.

use thiserror::Error;

use crate::codec::EncodeError;
use crate::storage::StorageError;

/// Errors returned by set-class accessor operations
#[derive(Error, Debug)]
pub enum AccessError {
    /// The value could not be encoded
    #[error("Cannot store '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: EncodeError,
    },

    /// The storage medium rejected the write
    #[error("Storage rejected write to '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: StorageError,
    },
}

impl AccessError {
    /// Key the failed write targeted
    pub fn key(&self) -> &str {
        match self {
            AccessError::Encode { key, .. } | AccessError::Write { key, .. } => key,
        }
    }

    /// Underlying storage error, if the medium rejected the write
    pub fn storage_error(&self) -> Option<&StorageError> {
        match self {
            AccessError::Write { source, .. } => Some(source),
            AccessError::Encode { .. } => None,
        }
    }

    /// Recovery suggestion from the storage layer, if any
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        self.storage_error()
            .and_then(StorageError::recovery_suggestion)
    }
}

/// Result type for accessor write operations
pub type AccessResult<T> = Result<T, AccessError>;

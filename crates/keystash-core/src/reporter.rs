//! Decode-failure reporting
//!
//! A caller can observe undecodable entries by registering a callback at
//! accessor construction. The callback only sees the failure; it has no way
//! to change what the accessor returns. A panicking callback is caught and
//! logged; the read still falls back to its default.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

use crate::codec::DecodeError;

/// Context passed to the failure callback
#[derive(Debug)]
pub struct DecodeFailure {
    /// Key whose persisted text failed to decode
    pub key: String,
    /// Underlying decode error
    pub error: DecodeError,
}

/// Optional observer invoked once per decode failure
#[derive(Default)]
pub struct FailureReporter {
    callback: Option<Box<dyn Fn(&DecodeFailure)>>,
}

impl FailureReporter {
    /// A reporter that absorbs failures silently
    pub fn silent() -> Self {
        Self { callback: None }
    }

    pub fn new(callback: impl Fn(&DecodeFailure) + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    /// Whether a callback is registered
    pub fn is_active(&self) -> bool {
        self.callback.is_some()
    }

    pub(crate) fn report(&self, failure: &DecodeFailure) {
        if let Some(callback) = &self.callback {
            if panic::catch_unwind(AssertUnwindSafe(|| callback(failure))).is_err() {
                warn!(key = %failure.key, "Decode failure callback panicked");
            }
        }
    }
}

impl fmt::Debug for FailureReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailureReporter")
            .field("active", &self.is_active())
            .finish()
    }
}

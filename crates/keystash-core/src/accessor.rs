//! Typed accessor over a storage medium
//!
//! The `Accessor` wraps a [`StorageInstance`] and a [`Codec`] and exposes
//! has/get/get_or/set/append_to_array/modify for any serde type, chosen per
//! call.
//!
//! ## Failure policy
//!
//! Reads recover, writes don't. A persisted string that fails to decode is
//! reported to the [`FailureReporter`], logged, and replaced by the caller's
//! fallback; the entry itself is left untouched. A write the medium rejects
//! comes back as [`AccessError::Write`].
//!
//! ## Concurrency
//!
//! There is no locking. `modify` and `append_to_array` are a plain read
//! followed by a write, so two accessors sharing a medium can lose each
//! other's updates; last write wins.
//!
//! ```
//! use keystash_core::{Accessor, MemoryStorage};
//!
//! let ls = Accessor::new(MemoryStorage::new());
//! ls.set("count", 1).unwrap();
//! ls.modify("count", 0, |n: i64| n + 1).unwrap();
//! assert_eq!(ls.get("count", 0), 2);
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::codec::{Codec, DecodeError, JsonCodec};
use crate::error::{AccessError, AccessResult};
use crate::reporter::{DecodeFailure, FailureReporter};
use crate::storage::StorageInstance;

/// Typed facade over a string key-value medium
#[derive(Debug)]
pub struct Accessor<S, C = JsonCodec> {
    storage: S,
    codec: C,
    reporter: FailureReporter,
}

impl<S: StorageInstance> Accessor<S> {
    /// Create an accessor with the JSON codec and no failure callback
    pub fn new(storage: S) -> Self {
        Self::builder(storage).build()
    }

    /// Start configuring an accessor
    pub fn builder(storage: S) -> AccessorBuilder<S> {
        AccessorBuilder {
            storage,
            codec: JsonCodec,
            reporter: FailureReporter::silent(),
        }
    }
}

impl<S: StorageInstance, C: Codec> Accessor<S, C> {
    /// Get the underlying medium
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Whether the medium holds any persisted string for `key`
    pub fn has(&self, key: &str) -> bool {
        self.storage.get_item(key).is_some()
    }

    /// Read `key`, falling back to `default` if absent or undecodable
    pub fn get<V: DeserializeOwned>(&self, key: &str, default: V) -> V {
        self.get_or(key, || default)
    }

    /// Read `key`, calling `supply` only if absent or undecodable
    ///
    /// `supply` may call back into this accessor, e.g. to `set` the value it
    /// returns. `get_or` never writes on its own.
    pub fn get_or<V, F>(&self, key: &str, supply: F) -> V
    where
        V: DeserializeOwned,
        F: FnOnce() -> V,
    {
        match self.read(key) {
            Some(value) => value,
            None => supply(),
        }
    }

    /// Encode and store `value`, returning it for chaining
    pub fn set<V: Serialize>(&self, key: &str, value: V) -> AccessResult<V> {
        self.write(key, &value)?;
        Ok(value)
    }

    /// Append `values` to the sequence stored under `key`
    ///
    /// - absent: `values` becomes the stored sequence as-is
    /// - a sequence: existing elements, then `values`
    /// - a single element: wrapped into a one-element sequence, then `values`
    /// - undecodable: reported, treated as empty, so `values` is stored
    pub fn append_to_array<T>(&self, key: &str, values: Vec<T>) -> AccessResult<Vec<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        let Some(raw) = self.storage.get_item(key) else {
            return self.set(key, values);
        };

        let mut combined: Vec<T> = match self.codec.decode::<Vec<T>>(&raw) {
            Ok(existing) => existing,
            Err(seq_err) => match self.codec.decode::<T>(&raw) {
                Ok(single) => vec![single],
                Err(_) => {
                    self.report(key, seq_err);
                    Vec::new()
                }
            },
        };
        combined.extend(values);

        self.set(key, combined)
    }

    /// Read `key` (or `default`), apply `modifier`, store and return the result
    pub fn modify<V, F>(&self, key: &str, default: V, modifier: F) -> AccessResult<V>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce(V) -> V,
    {
        let current = self.get(key, default);
        self.set(key, modifier(current))
    }

    /// Decode the entry at `key`; `None` if absent or undecodable
    fn read<V: DeserializeOwned>(&self, key: &str) -> Option<V> {
        let raw = self.storage.get_item(key)?;
        match self.codec.decode(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                self.report(key, error);
                None
            }
        }
    }

    fn write<V: Serialize + ?Sized>(&self, key: &str, value: &V) -> AccessResult<()> {
        let encoded = self.codec.encode(value).map_err(|source| AccessError::Encode {
            key: key.to_string(),
            source,
        })?;

        debug!(key, bytes = encoded.len(), "Writing entry");
        self.storage.set_item(key, &encoded).map_err(|source| {
            warn!(key, error = %source, "Storage rejected write");
            AccessError::Write {
                key: key.to_string(),
                source,
            }
        })
    }

    fn report(&self, key: &str, error: DecodeError) {
        warn!(key, error = %error, "Stored value failed to decode, using fallback");
        self.reporter.report(&DecodeFailure {
            key: key.to_string(),
            error,
        });
    }
}

/// Builder for [`Accessor`]
pub struct AccessorBuilder<S, C = JsonCodec> {
    storage: S,
    codec: C,
    reporter: FailureReporter,
}

impl<S: StorageInstance, C: Codec> AccessorBuilder<S, C> {
    /// Use a different codec
    pub fn codec<C2: Codec>(self, codec: C2) -> AccessorBuilder<S, C2> {
        AccessorBuilder {
            storage: self.storage,
            codec,
            reporter: self.reporter,
        }
    }

    /// Register a callback fired once per decode failure
    pub fn on_decode_failure(mut self, callback: impl Fn(&DecodeFailure) + 'static) -> Self {
        self.reporter = FailureReporter::new(callback);
        self
    }

    pub fn reporter(mut self, reporter: FailureReporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn build(self) -> Accessor<S, C> {
        Accessor {
            storage: self.storage,
            codec: self.codec,
            reporter: self.reporter,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::codec::EncodeError;
    use crate::storage::{MemoryStorage, StorageError};
    use crate::storage::StorageResult;
    use serde::Deserialize;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::Rc;

    /// Collects keys of reported decode failures
    #[derive(Clone, Default)]
    pub(crate) struct RecordingReporter(pub Rc<RefCell<Vec<String>>>);

    impl RecordingReporter {
        pub(crate) fn reporter(&self) -> FailureReporter {
            let sink = Rc::clone(&self.0);
            FailureReporter::new(move |f| sink.borrow_mut().push(f.key.clone()))
        }

        pub(crate) fn keys(&self) -> Vec<String> {
            self.0.borrow().clone()
        }
    }

    fn recording(storage: MemoryStorage) -> (Accessor<MemoryStorage>, RecordingReporter) {
        let recorder = RecordingReporter::default();
        let ls = Accessor::builder(storage)
            .reporter(recorder.reporter())
            .build();
        (ls, recorder)
    }

    /// Medium that counts calls into the storage contract
    #[derive(Default)]
    struct CountingStorage {
        inner: MemoryStorage,
        reads: Cell<usize>,
        writes: Cell<usize>,
    }

    impl CountingStorage {
        fn counts(&self) -> (usize, usize) {
            (self.reads.get(), self.writes.get())
        }

        fn reset(&self) {
            self.reads.set(0);
            self.writes.set(0);
        }
    }

    impl StorageInstance for CountingStorage {
        fn get_item(&self, key: &str) -> Option<String> {
            self.reads.set(self.reads.get() + 1);
            self.inner.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
            self.writes.set(self.writes.get() + 1);
            self.inner.set_item(key, value)
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Prefs {
        theme: String,
        font_size: u8,
    }

    #[test]
    fn test_round_trip_struct() {
        let ls = Accessor::new(MemoryStorage::new());
        let prefs = Prefs {
            theme: "dark".to_string(),
            font_size: 14,
        };

        let returned = ls.set("prefs", prefs.clone()).unwrap();
        assert_eq!(returned, prefs);

        let fallback = Prefs {
            theme: "light".to_string(),
            font_size: 10,
        };
        assert_eq!(ls.get("prefs", fallback), prefs);
    }

    #[test]
    fn test_persisted_text_is_bare_json() {
        let ls = Accessor::new(MemoryStorage::new());
        ls.set("tags", vec!["a", "b"]).unwrap();

        assert_eq!(
            ls.storage().get_item("tags"),
            Some(r#"["a","b"]"#.to_string())
        );
    }

    #[test]
    fn test_absent_key_returns_default() {
        let (ls, recorder) = recording(MemoryStorage::new());

        assert_eq!(ls.get("missing", 7), 7);
        assert!(!ls.has("missing"));
        assert!(recorder.keys().is_empty());
    }

    #[test]
    fn test_has_after_set_and_append() {
        let ls = Accessor::new(MemoryStorage::new());

        ls.set("a", 1).unwrap();
        ls.append_to_array("b", vec![1]).unwrap();

        assert!(ls.has("a"));
        assert!(ls.has("b"));
    }

    #[test]
    fn test_has_ignores_decodability() {
        let storage = MemoryStorage::new();
        storage.insert_raw("junk", "{{{");
        let (ls, recorder) = recording(storage);

        assert!(ls.has("junk"));
        assert!(recorder.keys().is_empty());
    }

    #[test]
    fn test_malformed_text_reports_once_and_falls_back() {
        let storage = MemoryStorage::new();
        storage.insert_raw("count", "not-a-number");
        let (ls, recorder) = recording(storage);

        assert_eq!(ls.get("count", 5), 5);
        assert_eq!(recorder.keys(), vec!["count".to_string()]);
        // Entry is left untouched
        assert_eq!(
            ls.storage().get_item("count"),
            Some("not-a-number".to_string())
        );
    }

    #[test]
    fn test_wrong_shape_reports_and_falls_back() {
        let (ls, recorder) = recording(MemoryStorage::new());
        ls.set("name", "alice").unwrap();

        assert_eq!(ls.get("name", 0u32), 0);
        assert_eq!(recorder.keys(), vec!["name".to_string()]);
    }

    #[test]
    fn test_decode_failure_without_reporter_still_falls_back() {
        let storage = MemoryStorage::new();
        storage.insert_raw("k", "[1,");
        let ls = Accessor::new(storage);

        assert_eq!(ls.get("k", vec![9]), vec![9]);
    }

    #[test]
    fn test_get_or_supplies_lazily() {
        let ls = Accessor::new(MemoryStorage::new());
        ls.set("present", 3).unwrap();

        let value = ls.get_or("present", || -> i32 { panic!("supplier must not run") });
        assert_eq!(value, 3);

        let calls = RefCell::new(0);
        let value = ls.get_or("absent", || {
            *calls.borrow_mut() += 1;
            42
        });
        assert_eq!(value, 42);
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_get_or_does_not_write() {
        let ls = Accessor::new(MemoryStorage::new());

        assert!(ls.get_or("flag", || true));
        assert!(!ls.has("flag"));
    }

    #[test]
    fn test_get_or_supplier_may_set() {
        let ls = Accessor::new(MemoryStorage::new());

        let value = ls.get_or("flag", || ls.set("flag", true).unwrap());
        assert!(value);
        assert!(ls.has("flag"));
        assert!(ls.get("flag", false));
    }

    #[test]
    fn test_get_or_reports_decode_failure() {
        let storage = MemoryStorage::new();
        storage.insert_raw("flag", "yes");
        let (ls, recorder) = recording(storage);

        assert!(ls.get_or("flag", || true));
        assert_eq!(recorder.keys(), vec!["flag".to_string()]);
    }

    #[test]
    fn test_set_overwrites() {
        let ls = Accessor::new(MemoryStorage::new());
        ls.set("k", "first").unwrap();
        ls.set("k", "second").unwrap();

        assert_eq!(ls.get("k", String::new()), "second");
        assert_eq!(ls.storage().len(), 1);
    }

    #[test]
    fn test_counter_scenario() {
        let ls = Accessor::new(MemoryStorage::new());

        ls.set("count", 1).unwrap();
        assert_eq!(ls.get("count", 0), 1);

        let updated = ls.modify("count", 0, |n: i32| n + 1).unwrap();
        assert_eq!(updated, 2);
        assert_eq!(ls.get("count", 0), 2);
    }

    #[test]
    fn test_modify_matches_set_of_get() {
        let left = Accessor::new(MemoryStorage::new());
        let right = Accessor::new(MemoryStorage::new());
        left.set("xs", vec![1, 2]).unwrap();
        right.set("xs", vec![1, 2]).unwrap();

        let double = |xs: Vec<i32>| xs.into_iter().map(|x| x * 2).collect::<Vec<_>>();

        left.modify("xs", Vec::new(), double).unwrap();
        let current = right.get("xs", Vec::new());
        right.set("xs", double(current)).unwrap();

        assert_eq!(
            left.storage().get_item("xs"),
            right.storage().get_item("xs")
        );
    }

    #[test]
    fn test_modify_absent_uses_default() {
        let ls = Accessor::new(MemoryStorage::new());

        let value = ls.modify("visits", 10, |n: u32| n + 1).unwrap();
        assert_eq!(value, 11);
        assert!(ls.has("visits"));
    }

    #[test]
    fn test_modify_corrupt_uses_default_and_overwrites() {
        let storage = MemoryStorage::new();
        storage.insert_raw("visits", "garbage");
        let (ls, recorder) = recording(storage);

        let value = ls.modify("visits", 0, |n: u32| n + 1).unwrap();
        assert_eq!(value, 1);
        assert_eq!(recorder.keys(), vec!["visits".to_string()]);
        assert_eq!(ls.storage().get_item("visits"), Some("1".to_string()));
    }

    #[test]
    fn test_append_to_absent_stores_values_as_is() {
        let ls = Accessor::new(MemoryStorage::new());

        let stored = ls.append_to_array("tags", vec!["a".to_string()]).unwrap();
        assert_eq!(stored, vec!["a".to_string()]);
        assert_eq!(ls.get::<Vec<String>>("tags", vec![]), vec!["a".to_string()]);
    }

    #[test]
    fn test_append_concatenates_in_order() {
        let ls = Accessor::new(MemoryStorage::new());
        ls.set("tags", vec!["a"]).unwrap();

        let stored = ls.append_to_array("tags", vec!["b".to_string()]).unwrap();
        assert_eq!(stored, vec!["a".to_string(), "b".to_string()]);

        let stored = ls
            .append_to_array("tags", vec!["c".to_string(), "d".to_string()])
            .unwrap();
        assert_eq!(stored, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_append_wraps_single_existing_value() {
        let (ls, recorder) = recording(MemoryStorage::new());
        ls.set("ids", 1).unwrap();

        let stored = ls.append_to_array("ids", vec![2, 3]).unwrap();
        assert_eq!(stored, vec![1, 2, 3]);
        assert_eq!(ls.storage().get_item("ids"), Some("[1,2,3]".to_string()));
        assert!(recorder.keys().is_empty());
    }

    #[test]
    fn test_append_to_undecodable_reports_and_starts_fresh() {
        let storage = MemoryStorage::new();
        storage.insert_raw("ids", "[1, 2");
        let (ls, recorder) = recording(storage);

        let stored = ls.append_to_array("ids", vec![7]).unwrap();
        assert_eq!(stored, vec![7]);
        assert_eq!(recorder.keys(), vec!["ids".to_string()]);
    }

    #[test]
    fn test_append_empty_values() {
        let ls = Accessor::new(MemoryStorage::new());
        ls.set("xs", vec![1]).unwrap();

        assert_eq!(ls.append_to_array::<i32>("xs", vec![]).unwrap(), vec![1]);
    }

    #[test]
    fn test_write_failure_propagates() {
        let ls = Accessor::new(MemoryStorage::with_quota(12));
        ls.set("k", "short").unwrap();

        let err = ls.set("k", "this is far too long").unwrap_err();
        assert!(matches!(
            err,
            AccessError::Write {
                source: StorageError::QuotaExceeded { .. },
                ..
            }
        ));
        assert_eq!(err.key(), "k");
        // Previous value survives the rejected write
        assert_eq!(ls.get("k", String::new()), "short");
    }

    #[test]
    fn test_modify_and_append_propagate_write_failure() {
        let ls = Accessor::new(MemoryStorage::with_quota(8));
        ls.set("n", 1).unwrap();

        assert!(ls.modify("n", 0, |_: u64| u64::MAX).is_err());
        assert_eq!(ls.get("n", 0u64), 1);

        assert!(ls.append_to_array("list", vec![1000, 2000]).is_err());
        assert!(!ls.has("list"));
    }

    #[test]
    fn test_encode_failure_is_distinct() {
        let ls = Accessor::new(MemoryStorage::new());
        let mut weird = HashMap::new();
        weird.insert((1, 2), "tuple keys");

        let err = ls.set("weird", weird).unwrap_err();
        assert!(matches!(err, AccessError::Encode { .. }));
        assert!(err.storage_error().is_none());
        assert!(!ls.has("weird"));
    }

    #[test]
    fn test_custom_codec() {
        /// Stores everything upper-cased, to prove the codec is consulted
        struct ShoutCodec;

        impl Codec for ShoutCodec {
            fn encode<V: Serialize + ?Sized>(&self, value: &V) -> Result<String, EncodeError> {
                serde_json::to_string(value)
                    .map(|s| s.to_uppercase())
                    .map_err(EncodeError)
            }

            fn decode<V: DeserializeOwned>(&self, text: &str) -> Result<V, DecodeError> {
                serde_json::from_str(text).map_err(DecodeError)
            }
        }

        let ls = Accessor::builder(MemoryStorage::new())
            .codec(ShoutCodec)
            .build();
        ls.set("greeting", "hello").unwrap();

        assert_eq!(ls.get("greeting", String::new()), "HELLO");
    }

    #[test]
    fn test_accessors_sharing_medium_last_write_wins() {
        let storage = Rc::new(MemoryStorage::new());
        let first = Accessor::new(Rc::clone(&storage));
        let second = Accessor::new(Rc::clone(&storage));

        first.set("count", 0).unwrap();
        let stale: i32 = first.get("count", 0);
        second.modify("count", 0, |n: i32| n + 10).unwrap();
        first.set("count", stale + 1).unwrap();

        // second's update is lost
        assert_eq!(second.get("count", 0), 1);
    }

    #[test]
    fn test_each_operation_touches_medium_once() {
        let ls = Accessor::new(CountingStorage::default());

        ls.set("n", 1).unwrap();
        assert_eq!(ls.storage().counts(), (0, 1));

        ls.storage().reset();
        assert_eq!(ls.get("n", 0), 1);
        assert_eq!(ls.storage().counts(), (1, 0));

        ls.storage().reset();
        assert_eq!(ls.get("absent", 7), 7);
        assert_eq!(ls.storage().counts(), (1, 0));

        ls.storage().reset();
        assert_eq!(ls.get_or("n", || 0), 1);
        assert_eq!(ls.get_or("absent", || 3), 3);
        assert_eq!(ls.storage().counts(), (2, 0));

        ls.storage().reset();
        assert!(ls.has("n"));
        assert_eq!(ls.storage().counts(), (1, 0));

        ls.storage().reset();
        ls.modify("n", 0, |n: i32| n + 1).unwrap();
        assert_eq!(ls.storage().counts(), (1, 1));

        ls.storage().reset();
        ls.append_to_array("list", vec![1]).unwrap();
        assert_eq!(ls.storage().counts(), (1, 1));

        ls.storage().reset();
        ls.append_to_array("list", vec![2, 3]).unwrap();
        assert_eq!(ls.storage().counts(), (1, 1));
        assert_eq!(ls.get("list", Vec::<i32>::new()), vec![1, 2, 3]);
    }

    #[test]
    fn test_panicking_callback_still_falls_back() {
        let storage = MemoryStorage::new();
        storage.insert_raw("k", "{oops");
        let ls = Accessor::builder(storage)
            .on_decode_failure(|_| panic!("observer bug"))
            .build();

        assert_eq!(ls.get("k", 1), 1);
        assert_eq!(ls.modify("k", 1, |n: i32| n + 1).unwrap(), 2);
    }
}

//! Compile-time key schema
//!
//! A schema is a set of key types, each naming its storage key and the
//! logical type stored under it. It only exists for the type checker: the
//! accessor still stores bare text and never validates beyond decode
//! success or failure.
//!
//! ```
//! use keystash_core::{schema_keys, Accessor, MemoryStorage};
//!
//! schema_keys! {
//!     /// Number of app launches
//!     pub Launches: "launches" => u32;
//!     pub RecentFiles: "recent_files" => Vec<String>;
//! }
//!
//! let ls = Accessor::new(MemoryStorage::new());
//! ls.modify_key(Launches, 0, |n| n + 1).unwrap();
//! ls.append_key(RecentFiles, vec!["notes.md".to_string()]).unwrap();
//! assert_eq!(ls.get_key(Launches, 0), 1);
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::accessor::Accessor;
use crate::codec::Codec;
use crate::error::AccessResult;
use crate::storage::StorageInstance;

/// A known key and the type stored under it
pub trait SchemaKey {
    type Value: Serialize + DeserializeOwned;

    /// The storage key string
    const NAME: &'static str;
}

/// Declare unit structs implementing [`SchemaKey`]
#[macro_export]
macro_rules! schema_keys {
    ($($(#[$meta:meta])* $vis:vis $name:ident : $key:literal => $ty:ty;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            $vis struct $name;

            impl $crate::schema::SchemaKey for $name {
                type Value = $ty;
                const NAME: &'static str = $key;
            }
        )*
    };
}

impl<S: StorageInstance, C: Codec> Accessor<S, C> {
    pub fn has_key<K: SchemaKey>(&self, _key: K) -> bool {
        self.has(K::NAME)
    }

    pub fn get_key<K: SchemaKey>(&self, _key: K, default: K::Value) -> K::Value {
        self.get(K::NAME, default)
    }

    pub fn get_or_key<K, F>(&self, _key: K, supply: F) -> K::Value
    where
        K: SchemaKey,
        F: FnOnce() -> K::Value,
    {
        self.get_or(K::NAME, supply)
    }

    pub fn set_key<K: SchemaKey>(&self, _key: K, value: K::Value) -> AccessResult<K::Value> {
        self.set(K::NAME, value)
    }

    pub fn modify_key<K, F>(&self, _key: K, default: K::Value, modifier: F) -> AccessResult<K::Value>
    where
        K: SchemaKey,
        F: FnOnce(K::Value) -> K::Value,
    {
        self.modify(K::NAME, default, modifier)
    }

    /// Typed `append_to_array`, only for keys holding a `Vec`
    pub fn append_key<K, T>(&self, _key: K, values: Vec<T>) -> AccessResult<Vec<T>>
    where
        K: SchemaKey<Value = Vec<T>>,
        T: Serialize + DeserializeOwned,
    {
        self.append_to_array(K::NAME, values)
    }
}

//! Cached, observable handle over one key
//!
//! A `Binding` pairs an accessor with a single key and keeps the last known
//! value in memory, so UI code can read it without touching the medium and
//! be told when it changes. Every operation delegates to the matching
//! accessor operation, then replaces the cached copy and notifies
//! observers. Observers only fire after a successful write or refresh.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::accessor::Accessor;
use crate::codec::Codec;
use crate::error::AccessResult;
use crate::storage::StorageInstance;

type Observer<'a, V> = Box<dyn FnMut(&V) + 'a>;

/// Locally cached copy of one key's value
pub struct Binding<'a, S, C, V> {
    accessor: &'a Accessor<S, C>,
    key: String,
    value: V,
    observers: Vec<Observer<'a, V>>,
}

impl<S: StorageInstance, C: Codec> Accessor<S, C> {
    /// Bind `key`, persisting `initial` if nothing decodable is stored yet
    pub fn bind<V>(&self, key: impl Into<String>, initial: V) -> Binding<'_, S, C, V>
    where
        V: Serialize + DeserializeOwned + Clone,
    {
        let key = key.into();
        let value = self.get_or(&key, || match self.set(&key, initial.clone()) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(key = %key, error = %err, "Failed to persist initial value");
                initial
            }
        });

        Binding {
            accessor: self,
            key,
            value,
            observers: Vec::new(),
        }
    }
}

impl<'a, S, C, V> Binding<'a, S, C, V>
where
    S: StorageInstance,
    C: Codec,
    V: Serialize + DeserializeOwned + Clone,
{
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Last known value
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Clone of the cached value; does not read the medium
    pub fn get(&self) -> V {
        self.value.clone()
    }

    /// Register a callback fired with the new value on every change
    pub fn subscribe(&mut self, observer: impl FnMut(&V) + 'a) {
        self.observers.push(Box::new(observer));
    }

    pub fn has(&self) -> bool {
        self.accessor.has(&self.key)
    }

    /// Re-read from the medium, calling `supply` if absent or undecodable
    pub fn get_or<F: FnOnce() -> V>(&mut self, supply: F) -> V {
        let value = self.accessor.get_or(&self.key, supply);
        self.replace(value.clone());
        value
    }

    /// Store `value` and update the cache
    pub fn set(&mut self, value: V) -> AccessResult<V> {
        let stored = self.accessor.set(&self.key, value)?;
        self.replace(stored.clone());
        Ok(stored)
    }

    /// Store the result of applying `updater` to the cached value
    pub fn update<F: FnOnce(&V) -> V>(&mut self, updater: F) -> AccessResult<V> {
        let next = updater(&self.value);
        self.set(next)
    }

    /// Accessor `modify` with the cached value as the default
    pub fn modify<F: FnOnce(V) -> V>(&mut self, modifier: F) -> AccessResult<V> {
        let stored = self
            .accessor
            .modify(&self.key, self.value.clone(), modifier)?;
        self.replace(stored.clone());
        Ok(stored)
    }

    fn replace(&mut self, value: V) {
        self.value = value;
        for observer in &mut self.observers {
            observer(&self.value);
        }
    }
}

impl<'a, S, C, T> Binding<'a, S, C, Vec<T>>
where
    S: StorageInstance,
    C: Codec,
    T: Serialize + DeserializeOwned + Clone,
{
    /// Accessor `append_to_array`, then cache the combined sequence
    pub fn append_to_array(&mut self, extra: Vec<T>) -> AccessResult<Vec<T>> {
        let stored = self.accessor.append_to_array(&self.key, extra)?;
        self.replace(stored.clone());
        Ok(stored)
    }
}

//! Key-value storage trait backing the cache indices.
//!
//! The cache persists every index record through this trait. Implementations
//! range from an in-process map to a network cache, which is why the trait is
//! async. The contract is deliberately minimal: no iteration, no TTL, no
//! multi-key atomicity. Engine operations that touch several keys document
//! that a mid-operation failure leaves partial mutation in place.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};

/// Flat mapping from string key to JSON record.
#[async_trait]
pub trait KvStore: Debug + Send + Sync {
    /// Read the record at `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write `value` at `key`, replacing any existing record.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Delete the record at `key`.
    ///
    /// Deleting a missing key succeeds; only actual backend failures error.
    async fn delete(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl<T: KvStore + ?Sized> KvStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        (**self).set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key).await
    }
}

/// In-memory `KvStore` for tests and embedded use.
///
/// Clones share the same underlying map, so a test can hand one handle to
/// the engine and inspect the other.
#[derive(Clone, Debug, Default)]
pub struct MemoryKvStore {
    entries: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryKvStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().expect("RwLock poisoned").len()
    }

    /// Check whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all keys, sorted. Intended for test assertions.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .expect("RwLock poisoned")
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self
            .entries
            .read()
            .expect("RwLock poisoned")
            .get(key)
            .cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries
            .write()
            .expect("RwLock poisoned")
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().expect("RwLock poisoned").remove(key);
        Ok(())
    }
}

/// A store whose every operation fails, for exercising backend-error paths.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingKvStore;

#[async_trait]
impl KvStore for FailingKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Err(Error::backend(format!("get {key}: store unavailable")))
    }

    async fn set(&self, key: &str, _value: Value) -> Result<()> {
        Err(Error::backend(format!("set {key}: store unavailable")))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        Err(Error::backend(format!("delete {key}: store unavailable")))
    }
}

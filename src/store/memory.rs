//! In-memory key/value store.
//!
//! A single mutex guards entries and counters, so every operation is
//! trivially atomic. Nothing survives the process.

use super::{KvStore, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

#[derive(Default)]
struct Inner {
    entries: BTreeMap<String, Vec<u8>>,
    counters: HashMap<String, u64>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries (counters excluded).
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.inner.lock().entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8], overwrite: bool) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !overwrite && inner.entries.contains_key(key) {
            return Err(StoreError::KeyExists(key.to_string()));
        }
        inner.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn put_batch(
        &self,
        entries: &[(String, Vec<u8>)],
        overwrite: bool,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !overwrite
            && let Some((key, _)) = entries.iter().find(|(k, _)| inner.entries.contains_key(k))
        {
            return Err(StoreError::KeyExists(key.clone()));
        }
        for (key, value) in entries {
            inner.entries.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match self.inner.lock().entries.remove(key) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Option<&[u8]>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        if inner.entries.get(key).map(Vec::as_slice) != expected {
            return Ok(false);
        }
        match new {
            Some(value) => {
                inner.entries.insert(key.to_string(), value.to_vec());
            }
            None => {
                inner.entries.remove(key);
            }
        }
        Ok(true)
    }

    async fn fetch_add(&self, key: &str, delta: u64) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock();
        let counter = inner.counters.entry(key.to_string()).or_insert(0);
        *counter = counter
            .checked_add(delta)
            .ok_or_else(|| StoreError::CounterOverflow(key.to_string()))?;
        Ok(*counter)
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock();
        let doomed: Vec<String> = inner
            .entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &doomed {
            inner.entries.remove(key);
        }
        Ok(doomed.len())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.counters.clear();
        Ok(())
    }
}

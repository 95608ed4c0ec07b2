//! Key/value store abstraction.
//!
//! The ACL store persists everything through [`KvStore`]. Engines:
//! - [`memory::MemoryStore`]: in-process `BTreeMap`, for tests and ephemeral deployments
//! - [`redb::RedbStore`]: durable embedded database
//!
//! Beyond plain get/put/delete the contract offers the atomic primitives the
//! authorization service needs to stay race-free under concurrent callers:
//! batch puts, compare-and-swap and an increment-and-fetch counter.

use crate::config::{DatabaseBackend, DatabaseConfig};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub mod memory;
pub mod redb;

pub use memory::MemoryStore;
pub use self::redb::{OpenOptions, RedbStore};

/// Errors from a key/value engine.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key already exists: {0}")]
    KeyExists(String),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("counter overflow: {0}")]
    CounterOverflow(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] ::redb::DatabaseError),

    #[error("transaction error: {0}")]
    Transaction(#[from] ::redb::TransactionError),

    #[error("table error: {0}")]
    Table(#[from] ::redb::TableError),

    #[error("storage error: {0}")]
    Storage(#[from] ::redb::StorageError),

    #[error("commit error: {0}")]
    Commit(#[from] ::redb::CommitError),
}

/// A key/value engine.
///
/// Keys are UTF-8 strings, values opaque bytes. Counters live in a separate
/// namespace from entries.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Whether `key` holds a value.
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Store `value` under `key`. Fails with `KeyExists` when `overwrite` is
    /// false and the key is occupied.
    async fn put(&self, key: &str, value: &[u8], overwrite: bool) -> Result<(), StoreError>;

    /// Store every entry atomically: either all are written or none.
    async fn put_batch(
        &self,
        entries: &[(String, Vec<u8>)],
        overwrite: bool,
    ) -> Result<(), StoreError>;

    /// Remove `key`. Fails with `NotFound` when absent.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Replace the value under `key` with `new` only if it currently equals
    /// `expected` (`None` meaning absent). `new = None` deletes the key.
    /// Returns whether the swap happened.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Option<&[u8]>,
    ) -> Result<bool, StoreError>;

    /// Atomically add `delta` to the counter `key` (initially 0) and return
    /// the new value.
    async fn fetch_add(&self, key: &str, delta: u64) -> Result<u64, StoreError>;

    /// Remove every entry whose key starts with `prefix`. Returns the count.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, StoreError>;

    /// Remove all entries and counters.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Open the store selected by the database configuration.
pub fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn KvStore>, StoreError> {
    match config.backend {
        DatabaseBackend::Redb => {
            info!(path = %config.path, clear = config.clear, recover = config.recover, "Opening redb store");
            let store = RedbStore::open(
                &config.path,
                OpenOptions {
                    clear: config.clear,
                    recover: config.recover,
                },
            )?;
            Ok(Arc::new(store))
        }
        DatabaseBackend::Memory => {
            info!("Using in-memory store. ACL state will not survive restarts.");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

//! Redb-backed persistent key/value store.
//!
//! Each mutating call runs in its own write transaction. Redb serializes
//! write transactions, which gives the batch, compare-and-swap and counter
//! operations their atomicity.
//!
//! # Schema
//!
//! ```text
//! ENTRIES:  key -> opaque bytes
//! COUNTERS: key -> u64
//! ```

use super::{KvStore, StoreError};
use async_trait::async_trait;
use redb::backends::InMemoryBackend;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

const ENTRIES: TableDefinition<&str, &[u8]> = TableDefinition::new("entries");
const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Startup behavior for an on-disk store.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenOptions {
    /// Delete any existing database file before opening.
    pub clear: bool,
    /// Run redb's integrity check and repair after opening.
    pub recover: bool,
}

pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &str, options: OpenOptions) -> Result<Self, StoreError> {
        let file = Path::new(path);
        if let Some(parent) = file.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(path = %parent.display(), error = %e, "Failed to create database directory");
        }

        if options.clear && file.exists() {
            std::fs::remove_file(file)?;
            info!(path = %path, "Cleared existing database");
        }

        let mut db = Database::create(file)?;

        if options.recover {
            let intact = db.check_integrity()?;
            if intact {
                info!(path = %path, "Database integrity check passed");
            } else {
                warn!(path = %path, "Database integrity check repaired damaged pages");
            }
        }

        Self::with_database(db)
    }

    /// A non-persistent redb database, used by tests.
    pub fn in_memory() -> Result<Self, StoreError> {
        let db = Database::builder().create_with_backend(InMemoryBackend::new())?;
        Self::with_database(db)
    }

    fn with_database(db: Database) -> Result<Self, StoreError> {
        // Ensure tables exist so read transactions can open them.
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ENTRIES)?;
            let _ = write_txn.open_table(COUNTERS)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Abort `txn` and return `err`.
    fn abort_with<T>(txn: WriteTransaction, err: StoreError) -> Result<T, StoreError> {
        txn.abort()?;
        Err(err)
    }
}

#[async_trait]
impl KvStore for RedbStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES)?;
        Ok(table.get(key)?.map(|v| v.value().to_vec()))
    }

    async fn put(&self, key: &str, value: &[u8], overwrite: bool) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        let occupied = {
            let mut table = write_txn.open_table(ENTRIES)?;
            let occupied = !overwrite && table.get(key)?.is_some();
            if !occupied {
                table.insert(key, value)?;
            }
            occupied
        };
        if occupied {
            return Self::abort_with(write_txn, StoreError::KeyExists(key.to_string()));
        }
        write_txn.commit()?;
        Ok(())
    }

    async fn put_batch(
        &self,
        entries: &[(String, Vec<u8>)],
        overwrite: bool,
    ) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        let collision = {
            let mut table = write_txn.open_table(ENTRIES)?;
            let mut collision = None;
            for (key, value) in entries {
                if !overwrite && table.get(key.as_str())?.is_some() {
                    collision = Some(key.clone());
                    break;
                }
                table.insert(key.as_str(), value.as_slice())?;
            }
            collision
        };
        if let Some(key) = collision {
            return Self::abort_with(write_txn, StoreError::KeyExists(key));
        }
        write_txn.commit()?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(ENTRIES)?;
            table.remove(key)?.is_some()
        };
        if !removed {
            return Self::abort_with(write_txn, StoreError::NotFound(key.to_string()));
        }
        write_txn.commit()?;
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Option<&[u8]>,
    ) -> Result<bool, StoreError> {
        let write_txn = self.db.begin_write()?;
        let swapped = {
            let mut table = write_txn.open_table(ENTRIES)?;
            let current = table.get(key)?.map(|v| v.value().to_vec());
            if current.as_deref() == expected {
                match new {
                    Some(value) => {
                        table.insert(key, value)?;
                    }
                    None => {
                        table.remove(key)?;
                    }
                }
                true
            } else {
                false
            }
        };
        if !swapped {
            write_txn.abort()?;
            return Ok(false);
        }
        write_txn.commit()?;
        Ok(true)
    }

    async fn fetch_add(&self, key: &str, delta: u64) -> Result<u64, StoreError> {
        let write_txn = self.db.begin_write()?;
        let next = {
            let mut table = write_txn.open_table(COUNTERS)?;
            let current = table.get(key)?.map(|v| v.value()).unwrap_or(0);
            let next = current.checked_add(delta);
            if let Some(next) = next {
                table.insert(key, next)?;
            }
            next
        };
        match next {
            Some(next) => {
                write_txn.commit()?;
                Ok(next)
            }
            None => Self::abort_with(write_txn, StoreError::CounterOverflow(key.to_string())),
        }
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        let write_txn = self.db.begin_write()?;
        let count = {
            let mut table = write_txn.open_table(ENTRIES)?;
            let mut doomed = Vec::new();
            for item in table.range(prefix..)? {
                let (k, _v) = item?;
                let key = k.value();
                if !key.starts_with(prefix) {
                    break;
                }
                doomed.push(key.to_string());
            }
            for key in &doomed {
                table.remove(key.as_str())?;
            }
            doomed.len()
        };
        write_txn.commit()?;
        Ok(count)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut entries = write_txn.open_table(ENTRIES)?;
            entries.retain(|_, _| false)?;
            let mut counters = write_txn.open_table(COUNTERS)?;
            counters.retain(|_, _| false)?;
        }
        write_txn.commit()?;
        info!("Store cleared");
        Ok(())
    }
}

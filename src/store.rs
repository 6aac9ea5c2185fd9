//! Store Facade
//!
//! The public operation surface of durakv. A [`Store`] owns the in-memory
//! engine, the snapshot path, and the configured limits; every operation
//! validates its input before touching shared state, and every mutation is
//! mirrored to disk before the call returns.
//!
//! ## Architecture
//!
//! ```text
//! Caller
//!   │
//!   ▼
//! ┌─────────────────┐
//! │     Store       │  validate → execute → flush
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐      ┌──────────────────┐
//! │ StorageEngine   │      │ snapshot::save   │
//! │ (table + queue) │      │ (tmp + rename)   │
//! └─────────────────┘      └──────────────────┘
//! ```
//!
//! The store is a cheap-to-clone handle; clones share one engine and one
//! snapshot file. The background sweeper holds a clone like any other
//! caller.

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::persistence;
use crate::storage::{Entry, StorageEngine};
use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Internal shared state for the store.
struct StoreInner {
    config: StoreConfig,
    engine: StorageEngine,
    /// Serializes snapshot writes; the table is exported only after this
    /// lock is held, so the last completed save carries the newest state.
    save_lock: Mutex<()>,

    /// Statistics: total successful create operations
    create_count: AtomicU64,
    /// Statistics: total read operations
    read_count: AtomicU64,
    /// Statistics: total successful delete operations
    delete_count: AtomicU64,
    /// Statistics: entries removed by sweep cycles
    reaped_count: AtomicU64,
    /// Statistics: completed snapshot saves
    save_count: AtomicU64,
}

/// A file-backed key-value store with per-entry TTL.
///
/// # Example
///
/// ```no_run
/// use durakv::{Store, StoreConfig};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), durakv::StoreError> {
///     let store = Store::open(StoreConfig::new("/tmp/durakv.db")).await;
///
///     store.create("session", "abc123", Some(Duration::from_secs(60))).await?;
///     let value = store.read("session")?;
///     assert_eq!(&value[..], b"abc123");
///
///     store.delete("session").await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Opens the store backed by the snapshot file in `config`.
    ///
    /// Runs exactly once before any operation is accepted. A missing file
    /// starts an empty store; an unreadable or undecodable file is logged
    /// and also starts empty (availability over recovery; the snapshot
    /// will be rewritten on the next mutation). Reloaded entries that are
    /// already expired are dropped, and the expiry queue is rebuilt from
    /// the survivors.
    pub async fn open(config: StoreConfig) -> Self {
        let now = SystemTime::now();
        let engine = match persistence::load(&config.path).await {
            Ok(Some(entries)) => {
                let total = entries.len();
                let (engine, dropped) = StorageEngine::from_entries(entries, now);
                info!(
                    loaded = total - dropped,
                    dropped,
                    path = %config.path.display(),
                    "Snapshot loaded"
                );
                engine
            }
            Ok(None) => {
                info!(path = %config.path.display(), "No snapshot found, starting empty");
                StorageEngine::new()
            }
            Err(err) => {
                warn!(
                    error = %err,
                    path = %config.path.display(),
                    "Snapshot unreadable, starting empty"
                );
                StorageEngine::new()
            }
        };

        Self {
            inner: Arc::new(StoreInner {
                config,
                engine,
                save_lock: Mutex::new(()),
                create_count: AtomicU64::new(0),
                read_count: AtomicU64::new(0),
                delete_count: AtomicU64::new(0),
                reaped_count: AtomicU64::new(0),
                save_count: AtomicU64::new(0),
            }),
        }
    }

    /// Creates an entry, optionally expiring `ttl` from now.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidKey`] if the key exceeds the configured
    ///   maximum length.
    /// - [`StoreError::ValueTooLarge`] if the value exceeds the configured
    ///   maximum size.
    /// - [`StoreError::KeyExists`] if a live entry holds the key. An
    ///   expired entry counts as absent and is overwritten wholesale.
    /// - [`StoreError::Persistence`] if the snapshot save fails; the entry
    ///   stays in memory and is saved again on the next successful flush.
    pub async fn create(
        &self,
        key: &str,
        value: impl Into<Bytes>,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let value = value.into();
        let max_key = self.inner.config.max_key_len;
        if key.len() > max_key {
            return Err(StoreError::InvalidKey {
                len: key.len(),
                max: max_key,
            });
        }
        let max_value = self.inner.config.max_value_size;
        if value.len() > max_value {
            return Err(StoreError::ValueTooLarge {
                len: value.len(),
                max: max_value,
            });
        }

        let now = SystemTime::now();
        let entry = match ttl {
            Some(ttl) => Entry::with_ttl(value, ttl, now),
            None => Entry::new(value),
        };
        if !self.inner.engine.insert_if_vacant(key, entry, now) {
            return Err(StoreError::KeyExists(key.to_string()));
        }
        self.inner.create_count.fetch_add(1, Ordering::Relaxed);

        self.flush().await
    }

    /// Reads the value for a key.
    ///
    /// An expired-but-not-yet-swept entry behaves exactly like an absent
    /// one. The read does not mutate the table; removal stays with the
    /// sweeper.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the key is absent or expired.
    pub fn read(&self, key: &str) -> Result<Bytes, StoreError> {
        self.inner.read_count.fetch_add(1, Ordering::Relaxed);

        self.inner
            .engine
            .get_live(key, SystemTime::now())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    /// Deletes a key.
    ///
    /// The entry's expiry pair (if any) is left in the queue as a stale
    /// pair; the next sweep discards it harmlessly.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] under the same condition as [`read`], and
    /// [`StoreError::Persistence`] if the save fails (the in-memory delete
    /// stands).
    ///
    /// [`read`]: Store::read
    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let now = SystemTime::now();
        if !self.inner.engine.remove_live(key, now) {
            return Err(StoreError::NotFound(key.to_string()));
        }
        self.inner.delete_count.fetch_add(1, Ordering::Relaxed);

        self.flush().await
    }

    /// Runs one eager expiration cycle and persists the result.
    ///
    /// Called by the background sweeper on its interval; exposed so hosts
    /// and tests can force a cycle. The save runs whether or not anything
    /// was removed.
    ///
    /// # Returns
    ///
    /// The number of entries removed.
    pub async fn reap(&self) -> Result<usize, StoreError> {
        let reaped = self.inner.engine.reap_expired(SystemTime::now());
        if reaped > 0 {
            self.inner
                .reaped_count
                .fetch_add(reaped as u64, Ordering::Relaxed);
            debug!(reaped, "Expired entries reaped");
        }

        self.flush().await?;
        Ok(reaped)
    }

    /// Writes the current table to the snapshot file.
    ///
    /// Saves are serialized: concurrent flush requests queue on the save
    /// lock and each exports the table after acquiring it, so the file
    /// never runs backwards.
    async fn flush(&self) -> Result<(), StoreError> {
        let _guard = self.inner.save_lock.lock().await;
        let entries = self.inner.engine.export();
        persistence::save(&self.inner.config.path, &entries).await?;
        self.inner.save_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Returns the number of entries in the table.
    ///
    /// May transiently include expired entries the sweeper has not removed
    /// yet.
    pub fn len(&self) -> usize {
        self.inner.engine.len()
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.engine.is_empty()
    }

    /// The configuration this store was opened with.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            keys: self.inner.engine.len() as u64,
            creates: self.inner.create_count.load(Ordering::Relaxed),
            reads: self.inner.read_count.load(Ordering::Relaxed),
            deletes: self.inner.delete_count.load(Ordering::Relaxed),
            reaped: self.inner.reaped_count.load(Ordering::Relaxed),
            saves: self.inner.save_count.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.inner.config.path)
            .field("keys", &self.inner.engine.len())
            .finish()
    }
}

/// Store statistics.
#[derive(Debug, Clone, Copy)]
pub struct StoreStats {
    /// Number of entries currently in the table
    pub keys: u64,
    /// Total successful create operations
    pub creates: u64,
    /// Total read operations
    pub reads: u64,
    /// Total successful delete operations
    pub deletes: u64,
    /// Total entries removed by sweep cycles
    pub reaped: u64,
    /// Total completed snapshot saves
    pub saves: u64,
}

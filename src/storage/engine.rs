//! Entry Table with Expiry Index
//!
//! This module implements the in-memory core of durakv: a key-value table
//! with per-entry TTL support and an ordered expiry queue that lets the
//! background sweeper find due keys without scanning the whole table.
//!
//! ## Design Decisions
//!
//! 1. **One Lock, Two Structures**: The table and the expiry queue mutate
//!    together under a single `RwLock`, so the cross-structure invariant
//!    (every queued pair was pushed for an entry with that deadline) can
//!    never be observed half-updated.
//! 2. **Lazy Expiry**: Keys are checked for expiry on access; removal is
//!    the sweeper's job. An expired-but-unswept entry behaves as absent.
//! 3. **Stale Pairs Are Skipped**: Deleting or overwriting a key leaves
//!    its old queue pair behind. A popped pair only authorizes deletion
//!    when the live entry still carries exactly that deadline.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                StorageEngine                  │
//! │  ┌─────────────────────────────────────────┐  │
//! │  │ RwLock                                  │  │
//! │  │   entries:      HashMap<String, Entry>  │  │
//! │  │   expiry_queue: BinaryHeap (min-first)  │  │
//! │  └─────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Readers share the lock; every mutation (create, delete, reap) takes it
//! exclusively.

use bytes::Bytes;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::RwLock;
use std::time::{Duration, SystemTime};

/// Represents a stored value with optional expiry time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The actual value stored
    pub value: Bytes,
    /// When this entry expires (None = never expires)
    pub expires_at: Option<SystemTime>,
}

impl Entry {
    /// Creates a new entry without expiry.
    pub fn new(value: Bytes) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// Creates a new entry expiring `ttl` from `now`.
    pub fn with_ttl(value: Bytes, ttl: Duration, now: SystemTime) -> Self {
        Self {
            value,
            expires_at: Some(now + ttl),
        }
    }

    /// Checks if this entry has expired at `now`.
    ///
    /// Entries without a deadline never expire. The boundary is inclusive:
    /// an entry is expired at exactly its deadline.
    #[inline]
    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expires_at.map(|exp| now >= exp).unwrap_or(false)
    }
}

/// Table state guarded by a single lock.
///
/// Invariant: every `(deadline, key)` pair in `expiry_queue` was pushed for
/// an insert of `key` with that exact deadline. Pairs outlive their entries
/// (delete and overwrite leave them behind) and are re-validated on pop.
#[derive(Debug, Default)]
struct TableState {
    entries: HashMap<String, Entry>,
    expiry_queue: BinaryHeap<Reverse<(SystemTime, String)>>,
}

/// The in-memory entry table for durakv.
///
/// Holds every live key-value pair plus a min-ordered queue of expiry
/// deadlines. All operations are thread-safe; the engine is designed to sit
/// behind the [`Store`](crate::Store) facade, shared via `Arc`.
#[derive(Debug, Default)]
pub struct StorageEngine {
    state: RwLock<TableState>,
}

impl StorageEngine {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an engine from reloaded entries.
    ///
    /// Entries already expired at `now` are dropped rather than inserted;
    /// every surviving entry with a deadline is pushed into the expiry
    /// queue.
    ///
    /// # Returns
    ///
    /// The engine and the number of entries dropped as pre-expired.
    pub fn from_entries(entries: HashMap<String, Entry>, now: SystemTime) -> (Self, usize) {
        let mut live = HashMap::with_capacity(entries.len());
        let mut expiry_queue = BinaryHeap::new();
        let mut dropped = 0usize;

        for (key, entry) in entries {
            if entry.is_expired(now) {
                dropped += 1;
                continue;
            }
            if let Some(deadline) = entry.expires_at {
                expiry_queue.push(Reverse((deadline, key.clone())));
            }
            live.insert(key, entry);
        }

        let engine = Self {
            state: RwLock::new(TableState {
                entries: live,
                expiry_queue,
            }),
        };
        (engine, dropped)
    }

    /// Gets the value for a key.
    ///
    /// Returns `None` if the key is absent or its entry has expired at
    /// `now`. The expired entry is left in place for the sweeper.
    pub fn get_live(&self, key: &str, now: SystemTime) -> Option<Bytes> {
        let state = self.state.read().unwrap();
        state
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone())
    }

    /// Inserts an entry unless a live one already holds the key.
    ///
    /// An existing expired entry is treated as absent and overwritten
    /// wholesale; its old queue pair goes stale. If the new entry carries a
    /// deadline, a pair is pushed into the expiry queue.
    ///
    /// # Returns
    ///
    /// Returns `true` if the entry was inserted, `false` if a live entry
    /// holds the key.
    pub fn insert_if_vacant(&self, key: &str, entry: Entry, now: SystemTime) -> bool {
        let mut state = self.state.write().unwrap();

        if state
            .entries
            .get(key)
            .is_some_and(|existing| !existing.is_expired(now))
        {
            return false;
        }

        if let Some(deadline) = entry.expires_at {
            state.expiry_queue.push(Reverse((deadline, key.to_string())));
        }
        state.entries.insert(key.to_string(), entry);
        true
    }

    /// Removes a key if it holds a live entry.
    ///
    /// The corresponding expiry pair (if any) is not removed; it goes stale
    /// and is discarded by the next sweep.
    ///
    /// # Returns
    ///
    /// Returns `true` if the key was removed, `false` if it was absent or
    /// already expired.
    pub fn remove_live(&self, key: &str, now: SystemTime) -> bool {
        let mut state = self.state.write().unwrap();

        if state
            .entries
            .get(key)
            .is_some_and(|existing| !existing.is_expired(now))
        {
            state.entries.remove(key);
            true
        } else {
            false
        }
    }

    /// Drains every due pair from the expiry queue, removing matching
    /// entries from the table.
    ///
    /// A popped pair deletes its entry only when the entry still carries
    /// exactly the popped deadline; otherwise the key was overwritten or
    /// deleted since the pair was pushed, and the pair is discarded without
    /// touching the table. Stops at the first pair with a future deadline.
    ///
    /// # Returns
    ///
    /// Returns the number of entries removed.
    pub fn reap_expired(&self, now: SystemTime) -> usize {
        let mut state = self.state.write().unwrap();
        let mut reaped = 0usize;

        while let Some(Reverse((deadline, _))) = state.expiry_queue.peek() {
            if *deadline > now {
                break;
            }
            let Some(Reverse((deadline, key))) = state.expiry_queue.pop() else {
                break;
            };

            let matches = state
                .entries
                .get(&key)
                .is_some_and(|entry| entry.expires_at == Some(deadline));
            if matches {
                state.entries.remove(&key);
                reaped += 1;
            }
        }

        reaped
    }

    /// Clones the current table contents for snapshot encoding.
    ///
    /// Values are `Bytes`, so the clone is cheap. Expired-but-unswept
    /// entries are included as-is; the reload path drops them.
    pub fn export(&self) -> HashMap<String, Entry> {
        let state = self.state.read().unwrap();
        state.entries.clone()
    }

    /// Returns the number of entries in the table.
    ///
    /// May transiently include expired entries the sweeper has not removed
    /// yet.
    pub fn len(&self) -> usize {
        self.state.read().unwrap().entries.len()
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of pairs currently queued, stale ones included.
    #[cfg(test)]
    fn queue_len(&self) -> usize {
        self.state.read().unwrap().expiry_queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> SystemTime {
        SystemTime::now()
    }

    #[test]
    fn test_insert_and_get() {
        let engine = StorageEngine::new();
        let t = now();

        assert!(engine.insert_if_vacant("key", Entry::new(Bytes::from("value")), t));
        assert_eq!(engine.get_live("key", t), Some(Bytes::from("value")));
    }

    #[test]
    fn test_get_nonexistent() {
        let engine = StorageEngine::new();
        assert_eq!(engine.get_live("nonexistent", now()), None);
    }

    #[test]
    fn test_insert_refused_while_live() {
        let engine = StorageEngine::new();
        let t = now();

        assert!(engine.insert_if_vacant("key", Entry::new(Bytes::from("first")), t));
        assert!(!engine.insert_if_vacant("key", Entry::new(Bytes::from("second")), t));
        assert_eq!(engine.get_live("key", t), Some(Bytes::from("first")));
    }

    #[test]
    fn test_insert_overwrites_expired() {
        let engine = StorageEngine::new();
        let t = now();

        let short = Entry::with_ttl(Bytes::from("old"), Duration::from_millis(10), t);
        assert!(engine.insert_if_vacant("key", short, t));

        // Past the deadline the slot counts as vacant.
        let later = t + Duration::from_millis(20);
        assert!(engine.insert_if_vacant("key", Entry::new(Bytes::from("new")), later));
        assert_eq!(engine.get_live("key", later), Some(Bytes::from("new")));
    }

    #[test]
    fn test_remove_live() {
        let engine = StorageEngine::new();
        let t = now();

        engine.insert_if_vacant("key", Entry::new(Bytes::from("value")), t);
        assert!(engine.remove_live("key", t));
        assert_eq!(engine.get_live("key", t), None);
        assert!(!engine.remove_live("key", t)); // Already removed
    }

    #[test]
    fn test_remove_expired_counts_as_absent() {
        let engine = StorageEngine::new();
        let t = now();

        let entry = Entry::with_ttl(Bytes::from("value"), Duration::from_millis(10), t);
        engine.insert_if_vacant("key", entry, t);

        let later = t + Duration::from_millis(20);
        assert!(!engine.remove_live("key", later));
        // Entry is still physically present until a sweep runs.
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let t = now();
        let entry = Entry::with_ttl(Bytes::from("v"), Duration::from_secs(1), t);

        assert!(!entry.is_expired(t));
        assert!(entry.is_expired(t + Duration::from_secs(1)));
        assert!(entry.is_expired(t + Duration::from_secs(2)));
    }

    #[test]
    fn test_entry_without_ttl_never_expires() {
        let entry = Entry::new(Bytes::from("v"));
        assert!(!entry.is_expired(now() + Duration::from_secs(3600)));
    }

    #[test]
    fn test_reap_removes_due_entries() {
        let engine = StorageEngine::new();
        let t = now();

        for i in 0..5 {
            let entry = Entry::with_ttl(
                Bytes::from(format!("v{}", i)),
                Duration::from_millis(10),
                t,
            );
            engine.insert_if_vacant(&format!("key{}", i), entry, t);
        }
        engine.insert_if_vacant("persistent", Entry::new(Bytes::from("stays")), t);

        let later = t + Duration::from_millis(50);
        assert_eq!(engine.reap_expired(later), 5);
        assert_eq!(engine.len(), 1);
        assert_eq!(
            engine.get_live("persistent", later),
            Some(Bytes::from("stays"))
        );
    }

    #[test]
    fn test_reap_stops_at_future_deadline() {
        let engine = StorageEngine::new();
        let t = now();

        let due = Entry::with_ttl(Bytes::from("due"), Duration::from_millis(10), t);
        let pending = Entry::with_ttl(Bytes::from("pending"), Duration::from_secs(60), t);
        engine.insert_if_vacant("due", due, t);
        engine.insert_if_vacant("pending", pending, t);

        let later = t + Duration::from_millis(20);
        assert_eq!(engine.reap_expired(later), 1);
        assert_eq!(engine.get_live("pending", later), Some(Bytes::from("pending")));
        assert_eq!(engine.queue_len(), 1);
    }

    #[test]
    fn test_reap_skips_stale_pair_after_overwrite() {
        let engine = StorageEngine::new();
        let t = now();

        // Insert with a short TTL, let it lapse, then overwrite with a
        // fresh TTL right before the old pair's sweep.
        let old = Entry::with_ttl(Bytes::from("old"), Duration::from_millis(10), t);
        engine.insert_if_vacant("key", old, t);

        let later = t + Duration::from_millis(20);
        let fresh = Entry::with_ttl(Bytes::from("fresh"), Duration::from_secs(60), later);
        assert!(engine.insert_if_vacant("key", fresh, later));

        // The old pair is due, but the live entry carries a different
        // deadline, so the sweep must leave it alone.
        assert_eq!(engine.reap_expired(later), 0);
        assert_eq!(engine.get_live("key", later), Some(Bytes::from("fresh")));
    }

    #[test]
    fn test_reap_skips_stale_pair_after_delete() {
        let engine = StorageEngine::new();
        let t = now();

        let entry = Entry::with_ttl(Bytes::from("value"), Duration::from_secs(60), t);
        engine.insert_if_vacant("key", entry, t);
        assert!(engine.remove_live("key", t));

        // Recreate the key without a TTL; the leftover pair must not take
        // the new entry down when its deadline arrives.
        assert!(engine.insert_if_vacant("key", Entry::new(Bytes::from("keep")), t));
        let later = t + Duration::from_secs(120);
        assert_eq!(engine.reap_expired(later), 0);
        assert_eq!(engine.get_live("key", later), Some(Bytes::from("keep")));
        assert_eq!(engine.queue_len(), 0);
    }

    #[test]
    fn test_from_entries_drops_pre_expired() {
        let t = now();
        let mut entries = HashMap::new();
        entries.insert("live".to_string(), Entry::new(Bytes::from("a")));
        entries.insert(
            "ttl".to_string(),
            Entry::with_ttl(Bytes::from("b"), Duration::from_secs(60), t),
        );
        entries.insert(
            "dead".to_string(),
            Entry {
                value: Bytes::from("c"),
                expires_at: Some(t - Duration::from_secs(1)),
            },
        );

        let (engine, dropped) = StorageEngine::from_entries(entries, t);
        assert_eq!(dropped, 1);
        assert_eq!(engine.len(), 2);
        assert_eq!(engine.get_live("live", t), Some(Bytes::from("a")));
        assert_eq!(engine.get_live("ttl", t), Some(Bytes::from("b")));
        assert_eq!(engine.get_live("dead", t), None);
        // Only the surviving TTL entry is indexed.
        assert_eq!(engine.queue_len(), 1);
    }

    #[test]
    fn test_export_round_trips_entries() {
        let engine = StorageEngine::new();
        let t = now();

        engine.insert_if_vacant("a", Entry::new(Bytes::from("1")), t);
        engine.insert_if_vacant(
            "b",
            Entry::with_ttl(Bytes::from("2"), Duration::from_secs(60), t),
            t,
        );

        let exported = engine.export();
        assert_eq!(exported.len(), 2);
        assert_eq!(exported["a"].value, Bytes::from("1"));
        assert!(exported["b"].expires_at.is_some());
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;
        use std::thread;

        let engine = Arc::new(StorageEngine::new());
        let mut handles = vec![];

        for i in 0..10 {
            let engine = Arc::clone(&engine);
            handles.push(thread::spawn(move || {
                let t = SystemTime::now();
                for j in 0..100 {
                    let key = format!("key-{}-{}", i, j);
                    engine.insert_if_vacant(&key, Entry::new(Bytes::from("value")), t);
                    engine.get_live(&key, t);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.len(), 1000);
    }
}

//! # durakv - A Lightweight File-Backed Key-Value Store
//!
//! durakv is a single-process key-value store with per-entry expiration,
//! durably mirrored to a single snapshot file. It is meant for lightweight
//! local persistence where a full database is unnecessary: a process keeps
//! a bounded set of small values, each optionally expiring.
//!
//! ## Features
//!
//! - **TTL Support**: Entries can expire, lazily on access and actively
//!   via a background sweeper
//! - **File-Backed**: Every mutation is mirrored to disk with atomic
//!   whole-file replacement (write temp, fsync, rename)
//! - **Crash-Safe Reload**: A missing snapshot starts empty; a corrupt one
//!   is logged and skipped rather than refusing to start
//! - **Async**: Built on Tokio; the sweeper is a cancellable background
//!   task
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                            durakv                              │
//! │                                                                │
//! │  ┌─────────────┐        ┌──────────────────────────────────┐   │
//! │  │   Store     │───────>│          StorageEngine           │   │
//! │  │  (facade)   │        │  ┌────────────────────────────┐  │   │
//! │  └──────┬──────┘        │  │ RwLock                     │  │   │
//! │         │               │  │   entries (HashMap)        │  │   │
//! │         │ flush         │  │   expiry_queue (min-heap)  │  │   │
//! │         ▼               │  └────────────────────────────┘  │   │
//! │  ┌─────────────┐        └──────────────────────────────────┘   │
//! │  │  snapshot   │                        ▲                      │
//! │  │ (tmp+rename)│                        │                      │
//! │  └─────────────┘        ┌───────────────┴───────────────┐      │
//! │                         │         ExpirySweeper         │      │
//! │                         │     (Background Tokio Task)   │      │
//! │                         └───────────────────────────────┘      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use durakv::{start_expiry_sweeper, Store, StoreConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), durakv::StoreError> {
//!     // Open the store (loads the snapshot if one exists)
//!     let store = Store::open(StoreConfig::new("/tmp/durakv.db")).await;
//!
//!     // Start the background expiry sweeper
//!     let _sweeper = start_expiry_sweeper(&store);
//!
//!     // Create, read, delete
//!     store.create("name", "Ariz", None).await?;
//!     let value = store.read("name")?;
//!     assert_eq!(&value[..], b"Ariz");
//!
//!     // Create with a 60 second TTL
//!     store
//!         .create("session", "abc123", Some(Duration::from_secs(60)))
//!         .await?;
//!
//!     store.delete("name").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`store`]: The public operation surface (create, read, delete)
//! - [`storage`]: Entry table, expiry queue, and background sweeper
//! - [`persistence`]: Snapshot encoding and atomic file replacement
//! - [`config`]: Store limits and paths
//! - [`error`]: Typed operation errors
//!
//! ## Design Highlights
//!
//! ### Lazy + Active Expiry
//!
//! Entries with TTL are expired in two ways:
//! 1. **Lazy**: On access, an expired entry behaves as absent
//! 2. **Active**: A background task drains due deadlines from an ordered
//!    queue and removes the matching entries
//!
//! Both paths share one expiry predicate, so a reader and the sweeper can
//! never disagree about whether an entry is live.
//!
//! ### Flush on Every Mutation
//!
//! `create` and `delete` return only after the snapshot save completes, so
//! a crash loses at most the mutation whose save was still in flight. A
//! failed save is surfaced to the caller, but the in-memory state stands:
//! memory is authoritative until the next successful save.

pub mod config;
pub mod error;
pub mod persistence;
pub mod storage;
pub mod store;

// Re-export commonly used types for convenience
pub use config::{
    StoreConfig, DEFAULT_CLEANUP_INTERVAL, DEFAULT_MAX_KEY_LEN, DEFAULT_MAX_VALUE_SIZE,
};
pub use error::StoreError;
pub use persistence::PersistenceError;
pub use storage::{start_expiry_sweeper, Entry, ExpirySweeper, StorageEngine};
pub use store::{Store, StoreStats};

/// Version of durakv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

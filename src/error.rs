//! Store error types.
//!
//! Every public operation returns a typed error. Validation failures
//! (`InvalidKey`, `ValueTooLarge`, `KeyExists`, `NotFound`) reflect
//! caller-supplied state and are never retried internally. `Persistence`
//! wraps a snapshot load or save failure; on save it is surfaced to the
//! mutating caller while the in-memory state is kept (memory stays
//! authoritative until the next successful save).

use crate::persistence::PersistenceError;
use thiserror::Error;

/// Errors returned by [`Store`](crate::Store) operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The key exceeds the configured maximum length.
    #[error("invalid key: {len} bytes (max {max})")]
    InvalidKey { len: usize, max: usize },

    /// The serialized value exceeds the configured maximum size.
    #[error("value too large: {len} bytes (max {max})")]
    ValueTooLarge { len: usize, max: usize },

    /// A live (non-expired) entry already holds the key.
    #[error("key already exists: {0}")]
    KeyExists(String),

    /// The key is absent, or its entry has expired.
    #[error("key not found: {0}")]
    NotFound(String),

    /// A snapshot load or save failed.
    #[error("persistence failure: {0}")]
    Persistence(#[from] PersistenceError),
}

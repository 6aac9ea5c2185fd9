//! Persistence Layer
//!
//! Durability for durakv is a whole-file snapshot: every mutation and every
//! sweep cycle rewrites the complete table to a single file, replacing it
//! atomically. There is no append log and no incremental format; reload is
//! a single decode.
//!
//! ## Durability Guarantee
//!
//! The in-memory table is authoritative. A save failure is reported to the
//! caller that triggered it but never rolls the mutation back; a crash
//! between a mutation and its save loses at most that unsaved delta.
//!
//! ## Format
//!
//! The snapshot is a bincode-encoded map of key to
//! `{ value, expires_at_ms }`, with deadlines as absolute epoch
//! milliseconds. No header, no versioning: same schema forever.

pub mod snapshot;

use thiserror::Error;

/// Errors raised by snapshot load and save.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Reading or writing the snapshot file failed.
    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding the snapshot failed.
    #[error("snapshot codec: {0}")]
    Codec(#[from] bincode::Error),
}

pub use snapshot::{load, save};

//! Snapshot encoding and atomic file replacement.
//!
//! Saves write the encoded table to a sibling `.tmp` file, fsync it, and
//! rename it over the snapshot path, so a reader of the file never observes
//! a torn write. Loads tolerate a missing file (fresh store) and surface
//! everything else as a [`PersistenceError`] for the caller to decide on.

use super::PersistenceError;
use crate::storage::Entry;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// On-disk form of an entry: raw value bytes plus the absolute deadline in
/// epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedEntry {
    value: Vec<u8>,
    expires_at_ms: Option<u64>,
}

impl PersistedEntry {
    fn from_entry(entry: &Entry) -> Self {
        Self {
            value: entry.value.to_vec(),
            expires_at_ms: entry.expires_at.map(epoch_millis),
        }
    }

    fn into_entry(self) -> Entry {
        Entry {
            value: Bytes::from(self.value),
            expires_at: self
                .expires_at_ms
                .map(|ms| UNIX_EPOCH + Duration::from_millis(ms)),
        }
    }
}

fn epoch_millis(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Sibling temp path for the two-step atomic write.
fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Writes the complete table to `path`, replacing any previous snapshot.
///
/// The encoded bytes go to `<path>.tmp` first, are fsynced, and are then
/// renamed into place. Concurrent readers of the file see either the old
/// snapshot or the new one, never a mix.
pub async fn save(
    path: &Path,
    entries: &HashMap<String, Entry>,
) -> Result<(), PersistenceError> {
    let persisted: HashMap<&String, PersistedEntry> = entries
        .iter()
        .map(|(key, entry)| (key, PersistedEntry::from_entry(entry)))
        .collect();
    let encoded = bincode::serialize(&persisted)?;

    let tmp = temp_path(path);
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(&encoded).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(&tmp, path).await?;

    debug!(
        entries = entries.len(),
        bytes = encoded.len(),
        path = %path.display(),
        "Snapshot written"
    );
    Ok(())
}

/// Loads the snapshot at `path`.
///
/// Returns `Ok(None)` when no snapshot file exists (a fresh store). An
/// unreadable or undecodable file is an error; the facade recovers from it
/// by starting empty.
pub async fn load(path: &Path) -> Result<Option<HashMap<String, Entry>>, PersistenceError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let persisted: HashMap<String, PersistedEntry> = bincode::deserialize(&bytes)?;
    let entries = persisted
        .into_iter()
        .map(|(key, entry)| (key, entry.into_entry()))
        .collect();
    Ok(Some(entries))
}

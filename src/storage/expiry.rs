//! Background Expiry Sweeper
//!
//! This module implements a background task that periodically drains the
//! expiry queue and removes the entries it finds due. This is "active
//! expiry", as opposed to "lazy expiry" (which happens on access).
//!
//! ## Why Do We Need This?
//!
//! Lazy expiry (checking on access) is efficient but has a problem:
//! if a key expires and is never accessed again, it stays in memory (and
//! in the snapshot file) forever. The sweeper reclaims it.
//!
//! ## Design
//!
//! The sweeper runs as a Tokio task and:
//! 1. Sleeps for the configured interval (default: 60 seconds)
//! 2. Wakes up and pops every due pair from the expiry queue
//! 3. Persists the resulting table, whether or not anything was removed
//!
//! The queue-driven drain means a cycle touches only the keys that are
//! actually due, never the whole table. A popped pair whose deadline no
//! longer matches the live entry is stale (the key was overwritten or
//! deleted since) and is discarded without touching the table.

use crate::store::Store;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

/// A handle to the running expiry sweeper.
///
/// When this handle is dropped, the sweeper task will be stopped. A cycle
/// already in flight finishes, including its snapshot save, before the
/// loop observes the signal, so shutdown never tears a snapshot.
#[derive(Debug)]
pub struct ExpirySweeper {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
}

impl ExpirySweeper {
    /// Starts the expiry sweeper as a background task.
    ///
    /// # Arguments
    ///
    /// * `store` - A handle to the store to sweep
    /// * `interval` - Fixed delay between sweep cycles
    ///
    /// # Returns
    ///
    /// Returns a handle that can be used to stop the sweeper.
    /// The sweeper will automatically stop when the handle is dropped.
    pub fn start(store: Store, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(sweeper_loop(store, interval, shutdown_rx));

        info!(
            interval_ms = interval.as_millis() as u64,
            "Background expiry sweeper started"
        );

        Self { shutdown_tx }
    }

    /// Stops the expiry sweeper.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
        info!("Background expiry sweeper stopped");
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The main sweeper loop.
async fn sweeper_loop(store: Store, interval: Duration, mut shutdown_rx: watch::Receiver<bool>) {
    loop {
        // Wait for the interval or shutdown signal
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper received shutdown signal");
                    return;
                }
            }
        }

        match store.reap().await {
            Ok(reaped) if reaped > 0 => {
                debug!(
                    reaped,
                    keys_remaining = store.len(),
                    "Expired keys cleaned up"
                );
            }
            Ok(_) => trace!("Sweep cycle found nothing to reap"),
            // Memory stays authoritative; the next cycle saves again.
            Err(err) => warn!(error = %err, "Sweep cycle failed to persist"),
        }
    }
}

/// Starts the expiry sweeper on the store's configured cleanup interval.
///
/// This is a convenience function for simple use cases.
pub fn start_expiry_sweeper(store: &Store) -> ExpirySweeper {
    ExpirySweeper::start(store.clone(), store.config().cleanup_interval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::persistence;
    use bytes::Bytes;
    use tempfile::TempDir;

    async fn open_temp(interval: Duration) -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let config =
            StoreConfig::new(dir.path().join("store.db")).with_cleanup_interval(interval);
        let store = Store::open(config).await;
        (dir, store)
    }

    #[tokio::test]
    async fn test_sweeper_cleans_expired_keys() {
        let (_dir, store) = open_temp(Duration::from_millis(10)).await;

        for i in 0..10 {
            store
                .create(&format!("key{}", i), "value", Some(Duration::from_millis(50)))
                .await
                .unwrap();
        }
        store.create("persistent", "value", None).await.unwrap();
        assert_eq!(store.len(), 11);

        let _sweeper = start_expiry_sweeper(&store);

        // Wait for keys to expire and be cleaned up
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(store.len(), 1);
        assert_eq!(store.read("persistent").unwrap(), Bytes::from("value"));
    }

    #[tokio::test]
    async fn test_sweeper_persists_after_cycle() {
        let (_dir, store) = open_temp(Duration::from_millis(10)).await;

        store
            .create("gone", "v", Some(Duration::from_millis(50)))
            .await
            .unwrap();
        store.create("stays", "v", None).await.unwrap();

        let _sweeper = start_expiry_sweeper(&store);
        tokio::time::sleep(Duration::from_millis(300)).await;

        // The snapshot on disk reflects the sweep, not just memory.
        let on_disk = persistence::load(&store.config().path)
            .await
            .unwrap()
            .unwrap();
        assert!(!on_disk.contains_key("gone"));
        assert!(on_disk.contains_key("stays"));
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_drop() {
        let (_dir, store) = open_temp(Duration::from_millis(10)).await;

        {
            let _sweeper = start_expiry_sweeper(&store);
            tokio::time::sleep(Duration::from_millis(50)).await;
            // Sweeper is dropped here
        }

        store
            .create("key", "value", Some(Duration::from_millis(10)))
            .await
            .unwrap();

        // Wait - the entry should NOT be swept since the sweeper stopped
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.len(), 1);

        // But a read still refuses the expired entry (lazy expiry)
        assert!(store.read("key").is_err());
    }
}

//! Store configuration.
//!
//! The store consumes its limits from configuration rather than hard-coding
//! them: snapshot file path, maximum key length, maximum value size, and the
//! interval of the background expiry sweeper.
//!
//! # Example
//!
//! ```
//! use durakv::StoreConfig;
//! use std::time::Duration;
//!
//! let config = StoreConfig::new("/tmp/durakv.db")
//!     .with_max_key_len(64)
//!     .with_cleanup_interval(Duration::from_secs(30));
//! ```

use std::path::PathBuf;
use std::time::Duration;

/// Default maximum key length in bytes.
pub const DEFAULT_MAX_KEY_LEN: usize = 32;

/// Default maximum value size in bytes (16 KiB).
pub const DEFAULT_MAX_VALUE_SIZE: usize = 16 * 1024;

/// Default interval between expiry sweeps.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for a [`Store`](crate::Store).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the snapshot file.
    pub path: PathBuf,

    /// Maximum key length in bytes (default: 32).
    pub max_key_len: usize,

    /// Maximum serialized value size in bytes (default: 16384).
    pub max_value_size: usize,

    /// Interval between background expiry sweeps (default: 60 seconds).
    pub cleanup_interval: Duration,
}

impl StoreConfig {
    /// Creates a configuration for a store backed by the given snapshot file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_key_len: DEFAULT_MAX_KEY_LEN,
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }

    /// Sets the maximum key length in bytes.
    pub fn with_max_key_len(mut self, max: usize) -> Self {
        self.max_key_len = max;
        self
    }

    /// Sets the maximum serialized value size in bytes.
    pub fn with_max_value_size(mut self, max: usize) -> Self {
        self.max_value_size = max;
        self
    }

    /// Sets the interval between background expiry sweeps.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let config = StoreConfig::new("store.db");
        assert_eq!(config.max_key_len, 32);
        assert_eq!(config.max_value_size, 16384);
        assert_eq!(config.cleanup_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_builder_chaining() {
        let config = StoreConfig::new("store.db")
            .with_max_key_len(64)
            .with_max_value_size(1024)
            .with_cleanup_interval(Duration::from_secs(5));
        assert_eq!(config.max_key_len, 64);
        assert_eq!(config.max_value_size, 1024);
        assert_eq!(config.cleanup_interval, Duration::from_secs(5));
    }
}

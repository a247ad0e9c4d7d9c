//! Durable key-value persistence used by the personalization cache.
//!
//! The host environment decides where bytes actually live. Three backends ship
//! with the crate:
//!
//! - `MemoryStore`: session-local, nothing survives the process
//! - `FileStore`: one file per key under a directory
//! - `SqliteStore`: a single key/value table in a SQLite database
//!
//! Stores deal in raw bytes. Serialization is the caller's concern.

mod file;
mod memory;
mod sqlite;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use thiserror::Error;

/// Failure reading or writing a durable store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value persistence capability provided by the host.
pub trait DurableStore: Send + Sync {
    /// Read the value stored under `key`. `Ok(None)` when nothing was ever written.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

/// Current time as Unix timestamp (seconds).
pub(crate) fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

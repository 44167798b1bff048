//! Persistence for saved maps and characters.
//!
//! DESIGN
//! ======
//! Documents are JSON values addressed by `(collection, id)`, with at most one
//! active id per collection (the character currently worn, the map currently
//! open). Every write goes to a [`LocalStore`] first; that write is the source
//! of truth and its error is the caller's error. Replication to a
//! [`RemoteStore`] then runs as a spawned task. A remote failure is logged and
//! reported on the [`SyncTicket`], and never rolls the local write back.

pub mod local;
pub mod remote;
pub mod sync;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ErrorCode;

pub use local::{FileStore, MemoryStore};
pub use remote::{HttpRemote, OfflineRemote};
pub use sync::{SyncTicket, SyncedStore};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("remote request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote returned HTTP {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("invalid key {0:?}: use letters, digits, '-' or '_'")]
    InvalidKey(String),

    #[error("sync task aborted: {0}")]
    SyncAborted(String),
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "E_STORE_IO",
            Self::Json(_) => "E_STORE_JSON",
            Self::Http(_) => "E_REMOTE_HTTP",
            Self::RemoteStatus { .. } => "E_REMOTE_STATUS",
            Self::NotFound { .. } => "E_NOT_FOUND",
            Self::InvalidKey(_) => "E_INVALID_KEY",
            Self::SyncAborted(_) => "E_SYNC_ABORTED",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::SyncAborted(_) => true,
            Self::RemoteStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Fast, synchronous storage on this device.
pub trait LocalStore: Send + Sync {
    fn put(&self, collection: &str, id: &str, value: &Value) -> Result<(), StoreError>;

    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// Remove a document. Returns whether it existed. Clears the active id if it pointed here.
    fn remove(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

    /// Ids in `collection`, sorted.
    fn list(&self, collection: &str) -> Result<Vec<String>, StoreError>;

    fn set_active(&self, collection: &str, id: Option<&str>) -> Result<(), StoreError>;

    fn active(&self, collection: &str) -> Result<Option<String>, StoreError>;
}

/// Best-effort replication target.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    async fn put(&self, collection: &str, id: &str, value: &Value) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    async fn set_active(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

/// Reject keys that could escape a directory or need URL escaping.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let ok = !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok { Ok(()) } else { Err(StoreError::InvalidKey(key.to_owned())) }
}

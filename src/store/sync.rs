//! Local-first writes with fire-and-forget remote replication.

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{LocalStore, RemoteStore, StoreError, validate_key};
use crate::error::ErrorCode;

/// Pending remote sync. Await it to learn the outcome, or drop it to detach.
#[derive(Debug)]
pub struct SyncTicket {
    handle: JoinHandle<Result<(), StoreError>>,
}

impl SyncTicket {
    /// Wait for the remote sync to finish.
    pub async fn wait(self) -> Result<(), StoreError> {
        self.handle.await.map_err(|e| StoreError::SyncAborted(e.to_string()))?
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

#[derive(Debug, Clone)]
enum SyncOp {
    Put { collection: String, id: String, value: Value },
    Delete { collection: String, id: String },
    Activate { collection: String, id: String },
}

impl SyncOp {
    fn kind(&self) -> &'static str {
        match self {
            Self::Put { .. } => "put",
            Self::Delete { .. } => "delete",
            Self::Activate { .. } => "activate",
        }
    }

    fn key(&self) -> (&str, &str) {
        match self {
            Self::Put { collection, id, .. } | Self::Delete { collection, id } | Self::Activate { collection, id } => {
                (collection, id)
            }
        }
    }
}

/// A local store replicated to a remote one.
///
/// Mutating calls must run inside a tokio runtime; the sync is spawned onto it.
pub struct SyncedStore<L, R: ?Sized> {
    local: L,
    remote: Arc<R>,
}

impl<L, R> SyncedStore<L, R>
where
    L: LocalStore,
    R: RemoteStore + ?Sized + 'static,
{
    pub fn new(local: L, remote: Arc<R>) -> Self {
        Self { local, remote }
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    pub fn remote_name(&self) -> &'static str {
        self.remote.name()
    }

    /// Write locally, then replicate.
    pub fn save<T: Serialize>(&self, collection: &str, id: &str, value: &T) -> Result<SyncTicket, StoreError> {
        validate_key(collection)?;
        validate_key(id)?;
        let value = serde_json::to_value(value)?;
        self.local.put(collection, id, &value)?;
        Ok(self.spawn_sync(SyncOp::Put { collection: collection.to_owned(), id: id.to_owned(), value }))
    }

    /// Delete locally, then replicate. A document missing locally is still deleted remotely.
    pub fn delete(&self, collection: &str, id: &str) -> Result<SyncTicket, StoreError> {
        validate_key(collection)?;
        validate_key(id)?;
        if !self.local.remove(collection, id)? {
            debug!(collection, id, "delete of missing local document");
        }
        Ok(self.spawn_sync(SyncOp::Delete { collection: collection.to_owned(), id: id.to_owned() }))
    }

    /// Mark a locally stored document active, then replicate.
    pub fn set_active(&self, collection: &str, id: &str) -> Result<SyncTicket, StoreError> {
        validate_key(collection)?;
        validate_key(id)?;
        if self.local.get(collection, id)?.is_none() {
            return Err(StoreError::NotFound { collection: collection.to_owned(), id: id.to_owned() });
        }
        self.local.set_active(collection, Some(id))?;
        Ok(self.spawn_sync(SyncOp::Activate { collection: collection.to_owned(), id: id.to_owned() }))
    }

    pub fn load<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>, StoreError> {
        match self.local.get(collection, id)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn list(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        self.local.list(collection)
    }

    pub fn active(&self, collection: &str) -> Result<Option<String>, StoreError> {
        self.local.active(collection)
    }

    fn spawn_sync(&self, op: SyncOp) -> SyncTicket {
        let remote = Arc::clone(&self.remote);
        let handle = tokio::spawn(async move {
            let result = match &op {
                SyncOp::Put { collection, id, value } => remote.put(collection, id, value).await,
                SyncOp::Delete { collection, id } => remote.delete(collection, id).await,
                SyncOp::Activate { collection, id } => remote.set_active(collection, id).await,
            };
            let (collection, id) = op.key();
            match &result {
                Ok(()) => debug!(op = op.kind(), remote = remote.name(), collection, id, "remote sync ok"),
                Err(e) => warn!(
                    op = op.kind(),
                    remote = remote.name(),
                    collection,
                    id,
                    code = e.error_code(),
                    retryable = e.retryable(),
                    error = %e,
                    "remote sync failed; local copy kept"
                ),
            }
            result
        });
        SyncTicket { handle }
    }
}

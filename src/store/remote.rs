//! Remote replication targets.
//!
//! `HttpRemote` maps each operation onto a plain JSON endpoint:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | put | `PUT {base}/api/{collection}/{id}` with the document as body |
//! | delete | `DELETE {base}/api/{collection}/{id}` |
//! | set active | `PUT {base}/api/{collection}/active` with `{"id": …}` |

#[cfg(test)]
#[path = "remote_test.rs"]
mod remote_test;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{RemoteStore, StoreError};

#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemote {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/api/{collection}/{id}", self.base_url)
    }

    fn active_url(&self, collection: &str) -> String {
        format!("{}/api/{collection}/active", self.base_url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(), StoreError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::RemoteStatus { status: status.as_u16(), body })
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn put(&self, collection: &str, id: &str, value: &Value) -> Result<(), StoreError> {
        self.send(self.client.put(self.document_url(collection, id)).json(value)).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.send(self.client.delete(self.document_url(collection, id))).await
    }

    async fn set_active(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let body = serde_json::json!({ "id": id });
        self.send(self.client.put(self.active_url(collection)).json(&body)).await
    }
}

/// Used when no API is configured. Every sync succeeds without leaving the device.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRemote;

#[async_trait]
impl RemoteStore for OfflineRemote {
    fn name(&self) -> &'static str {
        "offline"
    }

    async fn put(&self, collection: &str, id: &str, _value: &Value) -> Result<(), StoreError> {
        tracing::debug!(collection, id, "offline; remote put skipped");
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        tracing::debug!(collection, id, "offline; remote delete skipped");
        Ok(())
    }

    async fn set_active(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        tracing::debug!(collection, id, "offline; remote activate skipped");
        Ok(())
    }
}

//! Remote store adapter.
//!
//! The shared document lives in a hosted JSON blob store exposed over
//! plain HTTP GET/PUT with a static credential header. The whole document
//! is one opaque resource: no partial updates, no conditional headers, no
//! conflict detection. Last writer wins; retry policy belongs to the sync
//! engine, not this layer.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::config::SyncConfig;
use crate::models::Document;

/// Header carrying the shared static credential.
const CREDENTIAL_HEADER: &str = "X-Master-Key";

/// Errors from reading the remote blob. No retry at this layer; polling
/// is naturally retried by its own period.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server returned status {0}")]
    Status(StatusCode),
    #[error("response body was not JSON: {0}")]
    Decode(String),
}

/// Errors from overwriting the remote blob. Rate-limit responses are
/// tagged separately so the engine can tune its backoff.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("rate limited by the remote store")]
    RateLimited,
    #[error("server returned status {0}")]
    Status(StatusCode),
}

impl PushError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, PushError::RateLimited)
    }
}

/// Sync is not configured: the endpoint URL or credential is missing.
#[derive(Debug, Error)]
#[error("Sync not configured. Add sync_url and api_key to config.")]
pub struct NotConfigured;

/// The two operations the sync engine needs from the store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Reads the full document blob.
    async fn fetch(&self) -> Result<Value, FetchError>;

    /// Overwrites the full document blob.
    async fn push(&self, document: &Document) -> Result<(), PushError>;
}

/// HTTP implementation against a hosted blob endpoint.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpRemote {
    /// Creates a remote from config.
    ///
    /// Returns an error if sync is not configured.
    pub fn from_config(config: &SyncConfig) -> Result<Self, NotConfigured> {
        let endpoint = config.sync_url.clone().ok_or(NotConfigured)?;
        let api_key = config.api_key.clone().ok_or(NotConfigured)?;
        Ok(Self::new(endpoint, api_key))
    }

    /// Creates a remote with explicit parameters.
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            endpoint,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Returns the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn fetch(&self) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .header(CREDENTIAL_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(unwrap_envelope(value))
    }

    async fn push(&self, document: &Document) -> Result<(), PushError> {
        let response = self
            .client
            .put(&self.endpoint)
            .header(CREDENTIAL_HEADER, &self.api_key)
            .json(document)
            .send()
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::TOO_MANY_REQUESTS => Err(PushError::RateLimited),
            status => Err(PushError::Status(status)),
        }
    }
}

/// jsonbin-style stores wrap the blob in a `record` envelope on reads;
/// strip it so callers always see the document itself.
fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("record") => {
            map.remove("record").unwrap_or(Value::Null)
        }
        other => other,
    }
}

//! HTTP(S) transport backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::trace;

use crate::domain::errors::{LoadError, LoadResult, TransportError};
use crate::domain::ports::TransportPort;

const USER_AGENT: &str = concat!("image-loader/", env!("CARGO_PKG_VERSION"));

/// Plain GET transport. Timeouts are applied per request.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with a default client.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new() -> LoadResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LoadError::fetch(format!("Failed to create HTTP client: {e}"), 0))?;
        Ok(Self { client })
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl TransportPort for HttpTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<Bytes, TransportError> {
        let mut request = self.client.get(url);
        if !timeout.is_zero() {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(classify_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::from_status(
                status.as_u16(),
                status.canonical_reason(),
            ));
        }

        let bytes = response.bytes().await.map_err(classify_error)?;
        trace!(url = %url, size = bytes.len(), "Downloaded response body");
        Ok(bytes)
    }
}

fn classify_error(e: reqwest::Error) -> TransportError {
    if e.is_builder() {
        TransportError::permanent(format!("Invalid request: {e}"))
    } else if e.is_timeout() {
        TransportError::transient(format!("Request timed out: {e}"))
    } else {
        TransportError::transient(format!("Request failed: {e}"))
    }
}

//! Port definition for single network attempts.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::errors::TransportError;

/// Port performing one GET of a URL. Retry policy lives above this port.
#[async_trait]
pub trait TransportPort: Send + Sync {
    /// Downloads the full body of `url`.
    /// A zero `timeout` means the attempt is not time-limited.
    async fn get(&self, url: &str, timeout: Duration) -> Result<Bytes, TransportError>;
}

//! Network fetch with per-attempt timeout and retry on transient failures.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::entities::{CacheKey, RawBytes};
use crate::domain::errors::{LoadError, LoadResult, TransportError};
use crate::domain::ports::TransportPort;

/// Delay before the first retry.
pub const RETRY_DELAY_BASE: Duration = Duration::from_millis(250);
/// Upper bound for a single retry delay.
pub const RETRY_DELAY_MAX: Duration = Duration::from_secs(8);

/// Downloads image bytes, retrying transient transport failures.
pub struct Fetcher {
    transport: Arc<dyn TransportPort>,
    delay_base: Duration,
    delay_max: Duration,
}

impl Fetcher {
    /// Creates a fetcher over the given transport with default backoff.
    #[must_use]
    pub fn new(transport: Arc<dyn TransportPort>) -> Self {
        Self {
            transport,
            delay_base: RETRY_DELAY_BASE,
            delay_max: RETRY_DELAY_MAX,
        }
    }

    /// Overrides the retry backoff.
    #[must_use]
    pub const fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.delay_base = base;
        self.delay_max = max;
        self
    }

    /// Fetches the bytes for `key`.
    ///
    /// Makes at most `max_retries + 1` attempts, each bounded by
    /// `timeout_seconds` (zero disables the bound). Permanent failures stop
    /// immediately.
    ///
    /// # Errors
    /// Returns `LoadError::Fetch` carrying the last cause and the attempt count.
    pub async fn fetch(
        &self,
        key: &CacheKey,
        timeout_seconds: u64,
        max_retries: u32,
    ) -> LoadResult<RawBytes> {
        let timeout = Duration::from_secs(timeout_seconds);
        let max_attempts = max_retries.saturating_add(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.attempt(key, timeout).await {
                Ok(bytes) => {
                    debug!(key = %key, attempt = attempt, size = bytes.len(), "Fetched image bytes");
                    return Ok(RawBytes::new(key.clone(), bytes));
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.backoff_delay(attempt - 1);
                    debug!(
                        key = %key,
                        attempt = attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Transient fetch failure, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => {
                    warn!(key = %key, attempts = attempt, error = %e, "Fetch failed");
                    return Err(LoadError::fetch(e.message, attempt));
                }
            }
        }
    }

    /// Runs one transport attempt, bounded by `timeout` unless it is zero.
    async fn attempt(&self, key: &CacheKey, timeout: Duration) -> Result<bytes::Bytes, TransportError> {
        let request = self.transport.get(key.as_str(), timeout);
        if timeout.is_zero() {
            return request.await;
        }
        tokio::time::timeout(timeout, request)
            .await
            .unwrap_or_else(|_| Err(TransportError::transient("Request timed out")))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn backoff_delay(&self, retry: u32) -> Duration {
        let base_delay = self.delay_base.as_millis() as u64;
        let max_delay = self.delay_max.as_millis() as u64;

        let exponential_delay = base_delay.saturating_mul(2_u64.saturating_pow(retry.min(6)));
        let capped_delay = exponential_delay.min(max_delay);

        let jitter = rand_jitter(base_delay / 2);

        Duration::from_millis(capped_delay.saturating_add(jitter))
    }
}

fn rand_jitter(max: u64) -> u64 {
    use std::time::SystemTime;

    if max == 0 {
        return 0;
    }

    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_nanos()))
        .unwrap_or(0);

    nanos % max
}

//! Port definition for persistent raw byte storage.

use async_trait::async_trait;

use crate::domain::entities::{CacheKey, RawBytes};
use crate::domain::errors::LoadResult;

/// Port for durable storage of downloaded bytes keyed by URL.
#[async_trait]
pub trait ByteStorePort: Send + Sync {
    /// Checks if bytes are stored for the key.
    async fn has(&self, key: &CacheKey) -> bool;

    /// Reads stored bytes. `Ok(None)` is a miss.
    async fn read(&self, key: &CacheKey) -> LoadResult<Option<RawBytes>>;

    /// Stores bytes under their key. Readers never observe a partial entry.
    async fn write(&self, raw: &RawBytes) -> LoadResult<()>;

    /// Removes the entry for the key, if any.
    async fn remove(&self, key: &CacheKey) -> LoadResult<()>;

    /// Removes every entry.
    async fn clear(&self) -> LoadResult<()>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use bytes::Bytes;
    use parking_lot::Mutex;

    use crate::domain::errors::LoadError;

    /// In-memory byte store with switchable failures.
    #[derive(Default)]
    pub struct InMemoryByteStore {
        entries: Mutex<HashMap<CacheKey, Bytes>>,
        fail_reads: bool,
        fail_writes: bool,
        clear_delay: Duration,
        writes: AtomicUsize,
    }

    impl InMemoryByteStore {
        /// Creates empty store.
        pub fn new() -> Self {
            Self::default()
        }

        /// Preloads an entry.
        #[must_use]
        pub fn with_entry(self, key: CacheKey, bytes: impl Into<Bytes>) -> Self {
            self.entries.lock().insert(key, bytes.into());
            self
        }

        /// Makes every read fail.
        #[must_use]
        pub fn failing_reads(mut self) -> Self {
            self.fail_reads = true;
            self
        }

        /// Makes every write fail.
        #[must_use]
        pub fn failing_writes(mut self) -> Self {
            self.fail_writes = true;
            self
        }

        /// Makes `clear` take at least `delay`.
        #[must_use]
        pub fn with_clear_delay(mut self, delay: Duration) -> Self {
            self.clear_delay = delay;
            self
        }

        /// Returns the number of successful writes.
        pub fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ByteStorePort for InMemoryByteStore {
        async fn has(&self, key: &CacheKey) -> bool {
            self.entries.lock().contains_key(key)
        }

        async fn read(&self, key: &CacheKey) -> LoadResult<Option<RawBytes>> {
            if self.fail_reads {
                return Err(LoadError::store_io("mock read failure"));
            }
            Ok(self
                .entries
                .lock()
                .get(key)
                .map(|bytes| RawBytes::new(key.clone(), bytes.clone())))
        }

        async fn write(&self, raw: &RawBytes) -> LoadResult<()> {
            if self.fail_writes {
                return Err(LoadError::store_io("mock write failure"));
            }
            self.entries
                .lock()
                .insert(raw.key().clone(), raw.bytes().clone());
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn remove(&self, key: &CacheKey) -> LoadResult<()> {
            self.entries.lock().remove(key);
            Ok(())
        }

        async fn clear(&self) -> LoadResult<()> {
            if !self.clear_delay.is_zero() {
                tokio::time::sleep(self.clear_delay).await;
            }
            self.entries.lock().clear();
            Ok(())
        }
    }
}

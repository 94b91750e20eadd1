//! Async image loading orchestrator.
//!
//! Implements a three-tier cache: Memory -> Disk -> Network. Concurrent loads
//! of one key share a single in-flight operation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{RwLock, Semaphore, mpsc, watch};
use tracing::{debug, info, trace, warn};

use crate::domain::entities::{
    CacheKey, DEFAULT_MEMORY_CACHE_CAPACITY, ImageSource, LoadConfig, LoadedImage, RawBytes,
};
use crate::domain::errors::{LoadError, LoadResult};
use crate::domain::ports::{
    ByteStorePort, DecodeOptions, DecoderPort, ImageCachePort, TextureAdapterPort,
};

use super::decoder::ImageDecoder;
use super::disk_cache::DiskImageCache;
use super::fetcher::Fetcher;
use super::http_transport::HttpTransport;
use super::memory_cache::{CacheStats, MemoryImageCache};

/// Message sent when a prefetched image finishes loading.
#[derive(Debug, Clone)]
pub struct ImageLoadedEvent {
    /// The requested URL.
    pub url: String,
    /// The loaded image, or the reason it failed.
    pub result: LoadResult<LoadedImage>,
}

/// Configuration for the image loader.
#[derive(Debug, Clone)]
pub struct ImageLoaderConfig {
    /// Maximum concurrent network fetches.
    pub max_concurrent_downloads: usize,
    /// Initial memory cache budget in bytes.
    pub memory_cache_capacity_bytes: u64,
}

impl Default for ImageLoaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: 4,
            memory_cache_capacity_bytes: DEFAULT_MEMORY_CACHE_CAPACITY,
        }
    }
}

type LoadCell = Option<LoadResult<LoadedImage>>;
type PendingMap = Mutex<HashMap<CacheKey, watch::Receiver<LoadCell>>>;

/// Orchestrates image loading from memory, disk, and network.
///
/// Cheap to clone; clones share caches and in-flight loads.
#[derive(Clone)]
pub struct ImageLoader {
    inner: Arc<LoaderInner>,
}

struct LoaderInner {
    memory_cache: MemoryImageCache,
    byte_store: Arc<dyn ByteStorePort>,
    fetcher: Fetcher,
    decoder: Arc<dyn DecoderPort>,
    pending_loads: PendingMap,
    load_gate: RwLock<()>,
    download_permits: Semaphore,
    config: ImageLoaderConfig,
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("config", &self.inner.config)
            .field("pending", &self.inner.pending_loads.lock().len())
            .finish_non_exhaustive()
    }
}

impl ImageLoader {
    /// Creates a new image loader over the given collaborators.
    #[must_use]
    pub fn new(
        config: ImageLoaderConfig,
        byte_store: Arc<dyn ByteStorePort>,
        fetcher: Fetcher,
        decoder: Arc<dyn DecoderPort>,
    ) -> Self {
        let memory_cache = MemoryImageCache::new(config.memory_cache_capacity_bytes);
        let download_permits = Semaphore::new(config.max_concurrent_downloads.max(1));

        Self {
            inner: Arc::new(LoaderInner {
                memory_cache,
                byte_store,
                fetcher,
                decoder,
                pending_loads: Mutex::new(HashMap::new()),
                load_gate: RwLock::new(()),
                download_permits,
                config,
            }),
        }
    }

    /// Creates a loader with HTTP transport, default disk location and
    /// the raster decoder.
    ///
    /// # Errors
    /// Returns error if disk cache or HTTP client cannot be created.
    pub async fn with_defaults() -> LoadResult<Self> {
        let disk_cache = Arc::new(DiskImageCache::default_location().await?);
        let fetcher = Fetcher::new(Arc::new(HttpTransport::new()?));
        Ok(Self::new(
            ImageLoaderConfig::default(),
            disk_cache,
            fetcher,
            Arc::new(ImageDecoder::new()),
        ))
    }

    /// Loads an image, checking caches first.
    ///
    /// Concurrent calls for the same URL share one fetch and one decode and
    /// all receive the same result. Failures are not cached.
    ///
    /// # Errors
    /// Returns error if the URL is empty, the fetch fails after retries or the
    /// bytes cannot be decoded.
    pub async fn load(&self, url: &str, config: &LoadConfig) -> LoadResult<LoadedImage> {
        let key = CacheKey::parse(url)?;

        if config.use_memory_cache
            && let Some(artifact) = self.inner.memory_cache.get(&key).await
        {
            trace!(key = %key, "Memory cache hit");
            return Ok(LoadedImage::new(key, artifact, ImageSource::MemoryCache));
        }

        self.attach_or_start(key, config).await.wait().await
    }

    /// Loads an image and converts it through an engine adapter.
    ///
    /// # Errors
    /// Returns error if the load fails.
    pub async fn load_with<A>(
        &self,
        url: &str,
        config: &LoadConfig,
        adapter: &A,
    ) -> LoadResult<A::Texture>
    where
        A: TextureAdapterPort,
    {
        let loaded = self.load(url, config).await?;
        Ok(adapter.create_texture(Arc::clone(&loaded.artifact)))
    }

    /// Starts loads for many URLs. Each URL yields exactly one event.
    pub fn prefetch_batch<I>(&self, urls: I, config: &LoadConfig) -> mpsc::UnboundedReceiver<ImageLoadedEvent>
    where
        I: IntoIterator<Item = String>,
    {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        for url in urls {
            let loader = self.clone();
            let config = config.clone();
            let event_tx = event_tx.clone();
            tokio::spawn(async move {
                let result = loader.load(&url, &config).await;
                if event_tx.send(ImageLoadedEvent { url, result }).is_err() {
                    trace!("Prefetch receiver dropped");
                }
            });
        }

        event_rx
    }

    /// Joins the in-flight load for `key` or starts a new one.
    async fn attach_or_start(&self, key: CacheKey, config: &LoadConfig) -> PendingLoad {
        let _gate = self.inner.load_gate.read().await;

        let rx = {
            let mut pending = self.inner.pending_loads.lock();
            if let Some(rx) = pending.get(&key) {
                trace!(key = %key, "Joining in-flight load");
                return PendingLoad { rx: rx.clone() };
            }
            let (tx, rx) = watch::channel(None);
            pending.insert(key.clone(), rx.clone());
            let guard = PendingGuard {
                key,
                tx,
                inner: Arc::clone(&self.inner),
            };
            let config = config.clone();
            tokio::spawn(async move {
                let result = guard.inner.run_load(&guard.key, &config).await;
                guard.resolve(result);
            });
            rx
        };

        PendingLoad { rx }
    }

    /// Clears memory and disk caches.
    ///
    /// New loads wait until the clear finishes. Loads already in flight are
    /// not canceled and may repopulate the caches.
    ///
    /// # Errors
    /// Returns error if the disk cache cannot be cleared.
    pub async fn clear_cache(&self) -> LoadResult<()> {
        let _gate = self.inner.load_gate.write().await;

        self.inner.memory_cache.clear().await;
        if let Err(e) = self.inner.byte_store.clear().await {
            warn!(error = %e, "Failed to clear disk cache");
            return Err(e);
        }

        info!("Cleared all image caches");
        Ok(())
    }

    /// Returns true if the decoded image is in the memory cache.
    pub async fn memory_contains(&self, url: &str) -> bool {
        match CacheKey::parse(url) {
            Ok(key) => self.inner.memory_cache.contains(&key).await,
            Err(_) => false,
        }
    }

    /// Returns true if raw bytes for the URL are in the disk cache.
    pub async fn disk_contains(&self, url: &str) -> bool {
        match CacheKey::parse(url) {
            Ok(key) => self.inner.byte_store.has(&key).await,
            Err(_) => false,
        }
    }

    /// Returns true if a load for the URL is in flight.
    #[must_use]
    pub fn is_loading(&self, url: &str) -> bool {
        CacheKey::parse(url).is_ok_and(|key| self.inner.pending_loads.lock().contains_key(&key))
    }

    /// Returns the number of in-flight loads.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending_loads.lock().len()
    }

    /// Returns memory cache statistics.
    #[must_use]
    pub fn memory_cache_stats(&self) -> CacheStats {
        self.inner.memory_cache.stats()
    }
}

impl LoaderInner {
    async fn run_load(&self, key: &CacheKey, config: &LoadConfig) -> LoadResult<LoadedImage> {
        // A load for this key may have finished between the caller's miss and now.
        if config.use_memory_cache
            && let Some(artifact) = self.memory_cache.peek(key).await
        {
            return Ok(LoadedImage::new(key.clone(), artifact, ImageSource::MemoryCache));
        }

        let (raw, source) = self.obtain_bytes(key, config).await?;

        let decoder = Arc::clone(&self.decoder);
        let options = DecodeOptions::from(config);
        let decoded = tokio::task::spawn_blocking(move || decoder.decode(&raw, options))
            .await
            .map_err(|e| LoadError::decode(format!("Decode task panicked: {e}")))?;

        let artifact = match decoded {
            Ok(artifact) => Arc::new(artifact),
            Err(e) => {
                if source == ImageSource::DiskCache {
                    warn!(key = %key, error = %e, "Cached bytes failed to decode, removing entry");
                    if let Err(remove_err) = self.byte_store.remove(key).await {
                        warn!(key = %key, error = %remove_err, "Failed to remove corrupt disk entry");
                    }
                }
                return Err(e);
            }
        };

        if config.use_memory_cache {
            self.memory_cache
                .set_capacity(config.memory_cache_capacity_bytes)
                .await;
            self.memory_cache
                .put(key.clone(), Arc::clone(&artifact))
                .await;
        }

        debug!(
            key = %key,
            source = %source,
            width = artifact.width(),
            height = artifact.height(),
            "Image loaded successfully"
        );

        Ok(LoadedImage::new(key.clone(), artifact, source))
    }

    /// Reads bytes from disk, falling back to the network.
    async fn obtain_bytes(
        &self,
        key: &CacheKey,
        config: &LoadConfig,
    ) -> LoadResult<(RawBytes, ImageSource)> {
        if config.use_disk_cache {
            match self.byte_store.read(key).await {
                Ok(Some(raw)) => {
                    debug!(key = %key, size = raw.len(), "Disk cache hit");
                    return Ok((raw, ImageSource::DiskCache));
                }
                Ok(None) => trace!(key = %key, "Disk cache miss"),
                Err(e) => warn!(key = %key, error = %e, "Disk cache read failed, fetching from network"),
            }
        }

        let raw = {
            let _permit = self
                .download_permits
                .acquire()
                .await
                .map_err(|_| LoadError::Interrupted)?;
            debug!(key = %key, "Downloading image from network");
            self.fetcher
                .fetch(key, config.timeout_seconds, config.max_retries)
                .await?
        };

        if config.use_disk_cache
            && let Err(e) = self.byte_store.write(&raw).await
        {
            warn!(key = %key, error = %e, "Failed to cache to disk");
        }

        Ok((raw, ImageSource::Network))
    }
}

/// Caller-side handle on an in-flight load.
struct PendingLoad {
    rx: watch::Receiver<LoadCell>,
}

impl PendingLoad {
    async fn wait(mut self) -> LoadResult<LoadedImage> {
        match self.rx.wait_for(Option::is_some).await {
            Ok(cell) => Option::clone(&cell).unwrap_or(Err(LoadError::Interrupted)),
            Err(_) => Err(LoadError::Interrupted),
        }
    }
}

/// Owner side of an in-flight load.
///
/// Resolving removes the pending entry and publishes the result under the
/// map lock. Dropping unresolved publishes `LoadError::Interrupted`.
struct PendingGuard {
    key: CacheKey,
    tx: watch::Sender<LoadCell>,
    inner: Arc<LoaderInner>,
}

impl PendingGuard {
    fn resolve(&self, result: LoadResult<LoadedImage>) {
        let mut pending = self.inner.pending_loads.lock();
        pending.remove(&self.key);
        self.tx.send_replace(Some(result));
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut pending = self.inner.pending_loads.lock();
        if self.tx.borrow().is_none() {
            pending.remove(&self.key);
            self.tx.send_replace(Some(Err(LoadError::Interrupted)));
            warn!(key = %self.key, "Load ended without a result");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    use crate::domain::entities::ImageArtifact;
    use crate::domain::errors::TransportError;
    use crate::domain::ports::TransportPort;
    use crate::domain::ports::mocks::{
        CountingDecoder, InMemoryByteStore, MockDecoderPort, ScriptedTransport,
    };

    const URL: &str = "https://example.com/avatar.png";

    fn loader(
        transport: Arc<dyn TransportPort>,
        store: Arc<InMemoryByteStore>,
        decoder: Arc<dyn DecoderPort>,
    ) -> ImageLoader {
        ImageLoader::new(
            ImageLoaderConfig::default(),
            store,
            Fetcher::new(transport).with_backoff(Duration::ZERO, Duration::ZERO),
            decoder,
        )
    }

    fn memory_only() -> LoadConfig {
        LoadConfig::default().with_disk_cache(false)
    }

    #[tokio::test]
    async fn test_second_load_hits_memory_with_same_artifact() {
        let transport = Arc::new(ScriptedTransport::always_ok(vec![1u8; 1024]));
        let decoder = Arc::new(CountingDecoder::new(64, 64));
        let loader = loader(transport.clone(), Arc::new(InMemoryByteStore::new()), decoder.clone());

        let first = loader.load(URL, &memory_only()).await.unwrap();
        assert_eq!(first.artifact.width(), 64);
        assert_eq!(first.artifact.height(), 64);
        assert_eq!(first.source, ImageSource::Network);

        let second = loader.load(URL, &memory_only()).await.unwrap();
        assert_eq!(second.source, ImageSource::MemoryCache);
        assert!(Arc::ptr_eq(&first.artifact, &second.artifact));
        assert_eq!(transport.calls(), 1);
        assert_eq!(decoder.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_fetch_and_decode() {
        let transport = Arc::new(
            ScriptedTransport::always_ok(vec![1u8; 16]).with_delay(Duration::from_millis(50)),
        );
        let decoder = Arc::new(CountingDecoder::new(8, 8));
        let loader = loader(transport.clone(), Arc::new(InMemoryByteStore::new()), decoder.clone());
        let config = memory_only();

        let (a, b) = tokio::join!(loader.load(URL, &config), loader.load(URL, &config));

        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a.artifact, &b.artifact));
        assert_eq!(transport.calls(), 1);
        assert_eq!(decoder.calls(), 1);
        assert_eq!(loader.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_waiters_share_failure() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .then(Err(TransportError::from_status(404, Some("Not Found"))))
                .with_delay(Duration::from_millis(30)),
        );
        let loader = loader(
            transport.clone(),
            Arc::new(InMemoryByteStore::new()),
            Arc::new(CountingDecoder::new(4, 4)),
        );
        let config = memory_only();

        let (a, b) = tokio::join!(loader.load(URL, &config), loader.load(URL, &config));

        assert_eq!(a.unwrap_err(), b.unwrap_err());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_attempt_count() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .then(Err(TransportError::transient("timeout")))
                .then(Err(TransportError::transient("timeout")))
                .then(Err(TransportError::transient("timeout"))),
        );
        let loader = loader(
            transport.clone(),
            Arc::new(InMemoryByteStore::new()),
            Arc::new(CountingDecoder::new(4, 4)),
        );

        let err = assert_err!(
            loader
                .load(URL, &memory_only().with_max_retries(2))
                .await
        );

        assert!(matches!(err, LoadError::Fetch { attempts: 3, .. }));
        assert!(err.is_network_error());
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let transport = Arc::new(
            ScriptedTransport::always_ok(vec![1u8; 16])
                .then(Err(TransportError::permanent("HTTP 404: Not Found"))),
        );
        let loader = loader(
            transport.clone(),
            Arc::new(InMemoryByteStore::new()),
            Arc::new(CountingDecoder::new(4, 4)),
        );

        assert_err!(loader.load(URL, &memory_only()).await);
        assert!(!loader.is_loading(URL));
        assert_eq!(loader.pending_count(), 0);

        let loaded = assert_ok!(loader.load(URL, &memory_only()).await);
        assert_eq!(loaded.source, ImageSource::Network);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_clear_forces_refetch() {
        let transport = Arc::new(ScriptedTransport::always_ok(vec![1u8; 16]));
        let store = Arc::new(InMemoryByteStore::new());
        let loader = loader(transport.clone(), store, Arc::new(CountingDecoder::new(4, 4)));
        let config = LoadConfig::default();

        loader.load(URL, &config).await.unwrap();
        assert!(loader.memory_contains(URL).await);
        assert!(loader.disk_contains(URL).await);

        loader.clear_cache().await.unwrap();
        assert!(!loader.memory_contains(URL).await);
        assert!(!loader.disk_contains(URL).await);

        let loaded = loader.load(URL, &config).await.unwrap();
        assert_eq!(loaded.source, ImageSource::Network);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_load_waits_for_running_clear() {
        let transport = Arc::new(ScriptedTransport::always_ok(vec![1u8; 16]));
        let store = Arc::new(InMemoryByteStore::new().with_clear_delay(Duration::from_millis(200)));
        let loader = loader(transport.clone(), store, Arc::new(CountingDecoder::new(4, 4)));

        let clearing = tokio::spawn({
            let loader = loader.clone();
            async move { loader.clear_cache().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let loading = tokio::spawn({
            let loader = loader.clone();
            async move { loader.load(URL, &LoadConfig::default()).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!clearing.is_finished());
        assert_eq!(transport.calls(), 0);
        assert!(!loader.is_loading(URL));

        assert_ok!(clearing.await.unwrap());
        let loaded = assert_ok!(loading.await.unwrap());
        assert_eq!(loaded.source, ImageSource::Network);
        assert_eq!(transport.calls(), 1);
        assert!(loader.disk_contains(URL).await);
    }

    #[tokio::test]
    async fn test_disk_tier_serves_fresh_loader() {
        let store = Arc::new(InMemoryByteStore::new());
        let first = loader(
            Arc::new(ScriptedTransport::always_ok(vec![1u8; 16])),
            store.clone(),
            Arc::new(CountingDecoder::new(4, 4)),
        );
        first.load(URL, &LoadConfig::default()).await.unwrap();
        assert_eq!(store.writes(), 1);

        let offline = Arc::new(ScriptedTransport::new());
        let second = loader(offline.clone(), store, Arc::new(CountingDecoder::new(4, 4)));
        let loaded = second.load(URL, &LoadConfig::default()).await.unwrap();

        assert_eq!(loaded.source, ImageSource::DiskCache);
        assert_eq!(offline.calls(), 0);
    }

    #[tokio::test]
    async fn test_disk_read_failure_degrades_to_network() {
        let transport = Arc::new(ScriptedTransport::always_ok(vec![1u8; 16]));
        let loader = loader(
            transport.clone(),
            Arc::new(InMemoryByteStore::new().failing_reads()),
            Arc::new(CountingDecoder::new(4, 4)),
        );

        let loaded = loader.load(URL, &LoadConfig::default()).await.unwrap();

        assert_eq!(loaded.source, ImageSource::Network);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_disk_write_failure_does_not_fail_load() {
        let store = Arc::new(InMemoryByteStore::new().failing_writes());
        let loader = loader(
            Arc::new(ScriptedTransport::always_ok(vec![1u8; 16])),
            store.clone(),
            Arc::new(CountingDecoder::new(4, 4)),
        );

        assert_ok!(loader.load(URL, &LoadConfig::default()).await);
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_disk_disabled_skips_store() {
        let store = Arc::new(InMemoryByteStore::new());
        let loader = loader(
            Arc::new(ScriptedTransport::always_ok(vec![1u8; 16])),
            store.clone(),
            Arc::new(CountingDecoder::new(4, 4)),
        );

        loader.load(URL, &memory_only()).await.unwrap();

        assert_eq!(store.writes(), 0);
        assert!(!loader.disk_contains(URL).await);
    }

    #[tokio::test]
    async fn test_corrupt_disk_entry_is_removed() {
        let key = CacheKey::parse(URL).unwrap();
        let store = Arc::new(InMemoryByteStore::new().with_entry(key, Bytes::new()));
        let transport = Arc::new(ScriptedTransport::always_ok(vec![1u8; 16]));
        let loader = loader(transport.clone(), store, Arc::new(CountingDecoder::new(4, 4)));

        let err = loader.load(URL, &LoadConfig::default()).await.unwrap_err();
        assert!(err.is_decode_error());
        assert!(!loader.disk_contains(URL).await);

        let loaded = loader.load(URL, &LoadConfig::default()).await.unwrap();
        assert_eq!(loaded.source, ImageSource::Network);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_decode_failure_is_not_retried() {
        let mut decoder = MockDecoderPort::new();
        decoder
            .expect_decode()
            .times(1)
            .returning(|_, _| Err(LoadError::decode("bad header")));
        let transport = Arc::new(ScriptedTransport::always_ok(vec![1u8; 16]));
        let loader = loader(
            transport.clone(),
            Arc::new(InMemoryByteStore::new()),
            Arc::new(decoder),
        );

        let err = loader.load(URL, &memory_only()).await.unwrap_err();

        assert_eq!(err, LoadError::decode("bad header"));
        assert_eq!(transport.calls(), 1);
        assert!(!loader.memory_contains(URL).await);
    }

    #[tokio::test]
    async fn test_decode_options_follow_load_config() {
        let mut decoder = MockDecoderPort::new();
        decoder
            .expect_decode()
            .withf(|_, options| options.memory_optimized && !options.generate_mip_maps)
            .times(1)
            .returning(|_, _| Ok(ImageArtifact::new(1, 1, false, vec![0; 4])));
        let loader = loader(
            Arc::new(ScriptedTransport::always_ok(vec![1u8; 16])),
            Arc::new(InMemoryByteStore::new()),
            Arc::new(decoder),
        );
        let config = memory_only()
            .with_memory_optimized(true)
            .with_mip_maps(false);

        assert_ok!(loader.load(URL, &config).await);
    }

    #[tokio::test]
    async fn test_memory_cache_disabled_always_loads() {
        let transport = Arc::new(ScriptedTransport::always_ok(vec![1u8; 16]));
        let loader = loader(
            transport.clone(),
            Arc::new(InMemoryByteStore::new()),
            Arc::new(CountingDecoder::new(4, 4)),
        );
        let config = memory_only().with_memory_cache(false);

        loader.load(URL, &config).await.unwrap();
        loader.load(URL, &config).await.unwrap();

        assert_eq!(transport.calls(), 2);
        assert!(!loader.memory_contains(URL).await);
    }

    #[tokio::test]
    async fn test_memory_capacity_applied_per_load() {
        let loader = loader(
            Arc::new(ScriptedTransport::always_ok(vec![1u8; 16])),
            Arc::new(InMemoryByteStore::new()),
            Arc::new(CountingDecoder::new(4, 4)),
        );
        // Each artifact is 4x4 RGBA8 = 64 bytes.
        let config = memory_only().with_memory_capacity(100);

        loader.load("https://example.com/a.png", &config).await.unwrap();
        loader.load("https://example.com/b.png", &config).await.unwrap();

        assert!(!loader.memory_contains("https://example.com/a.png").await);
        assert!(loader.memory_contains("https://example.com/b.png").await);
        assert_eq!(loader.memory_cache_stats().size, 1);
    }

    #[tokio::test]
    async fn test_dropped_waiter_does_not_cancel_load() {
        let transport = Arc::new(
            ScriptedTransport::always_ok(vec![1u8; 16]).with_delay(Duration::from_millis(100)),
        );
        let loader = loader(
            transport.clone(),
            Arc::new(InMemoryByteStore::new()),
            Arc::new(CountingDecoder::new(4, 4)),
        );

        let waiter = tokio::spawn({
            let loader = loader.clone();
            async move { loader.load(URL, &memory_only()).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(loader.is_loading(URL));
        waiter.abort();

        let loaded = loader.load(URL, &memory_only()).await.unwrap();

        assert_eq!(loaded.source, ImageSource::Network);
        assert_eq!(transport.calls(), 1);
        assert!(!loader.is_loading(URL));
    }

    #[tokio::test]
    async fn test_unresolved_guard_interrupts_waiters() {
        let loader = loader(
            Arc::new(ScriptedTransport::new()),
            Arc::new(InMemoryByteStore::new()),
            Arc::new(CountingDecoder::new(4, 4)),
        );
        let key = CacheKey::parse(URL).unwrap();
        let (tx, rx) = watch::channel(None);
        loader
            .inner
            .pending_loads
            .lock()
            .insert(key.clone(), rx.clone());
        let guard = PendingGuard {
            key,
            tx,
            inner: Arc::clone(&loader.inner),
        };
        assert!(loader.is_loading(URL));

        drop(guard);

        let err = PendingLoad { rx }.wait().await.unwrap_err();
        assert_eq!(err, LoadError::Interrupted);
        assert_eq!(loader.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let transport = Arc::new(ScriptedTransport::always_ok(vec![1u8; 16]));
        let loader = loader(
            transport.clone(),
            Arc::new(InMemoryByteStore::new()),
            Arc::new(CountingDecoder::new(4, 4)),
        );

        let err = loader.load("   ", &LoadConfig::default()).await.unwrap_err();

        assert!(matches!(err, LoadError::InvalidKey { .. }));
        assert_eq!(transport.calls(), 0);
        assert!(!loader.memory_contains("   ").await);
    }

    struct SizeAdapter;

    impl TextureAdapterPort for SizeAdapter {
        type Texture = (u32, u32, usize);

        fn create_texture(&self, artifact: Arc<ImageArtifact>) -> Self::Texture {
            (artifact.width(), artifact.height(), artifact.mip_count())
        }
    }

    #[tokio::test]
    async fn test_load_with_adapter() {
        let loader = loader(
            Arc::new(ScriptedTransport::always_ok(vec![1u8; 16])),
            Arc::new(InMemoryByteStore::new()),
            Arc::new(CountingDecoder::new(12, 8)),
        );

        let texture = loader
            .load_with(URL, &memory_only(), &SizeAdapter)
            .await
            .unwrap();

        assert_eq!(texture, (12, 8, 1));
    }

    #[tokio::test]
    async fn test_prefetch_batch_reports_every_url() {
        let loader = loader(
            Arc::new(ScriptedTransport::always_ok(vec![1u8; 16])),
            Arc::new(InMemoryByteStore::new()),
            Arc::new(CountingDecoder::new(4, 4)),
        );
        let urls = vec![
            "https://example.com/1.png".to_string(),
            "https://example.com/2.png".to_string(),
            String::new(),
        ];

        let mut events = loader.prefetch_batch(urls, &memory_only());
        let mut ok = 0;
        let mut failed = 0;
        for _ in 0..3 {
            let event = events.recv().await.unwrap();
            match event.result {
                Ok(loaded) => {
                    assert_eq!(loaded.key.as_str(), event.url);
                    ok += 1;
                }
                Err(e) => {
                    assert!(matches!(e, LoadError::InvalidKey { .. }));
                    failed += 1;
                }
            }
        }

        assert_eq!((ok, failed), (2, 1));
        assert!(loader.memory_contains("https://example.com/1.png").await);
    }

    #[derive(Default)]
    struct PeakTransport {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl TransportPort for PeakTransport {
        async fn get(&self, _url: &str, _timeout: Duration) -> Result<Bytes, TransportError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Bytes::from_static(b"data"))
        }
    }

    #[tokio::test]
    async fn test_downloads_bounded_by_permits() {
        let transport = Arc::new(PeakTransport::default());
        let loader = ImageLoader::new(
            ImageLoaderConfig {
                max_concurrent_downloads: 2,
                ..ImageLoaderConfig::default()
            },
            Arc::new(InMemoryByteStore::new()),
            Fetcher::new(transport.clone()),
            Arc::new(CountingDecoder::new(4, 4)),
        );
        let config = memory_only();

        let loads = (0..6).map(|i| {
            let loader = loader.clone();
            let config = config.clone();
            async move { loader.load(&format!("https://example.com/{i}.png"), &config).await }
        });
        let results = futures_util::future::join_all(loads).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(transport.peak.load(Ordering::SeqCst), 2);
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 10, 10, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn test_end_to_end_with_disk_cache_and_decoder() {
        let temp_dir = TempDir::new().unwrap();
        let disk = Arc::new(
            DiskImageCache::new(temp_dir.path().to_path_buf(), 10 * 1024 * 1024)
                .await
                .unwrap(),
        );
        let online = ImageLoader::new(
            ImageLoaderConfig::default(),
            disk.clone(),
            Fetcher::new(Arc::new(ScriptedTransport::always_ok(png_bytes(32, 16)))),
            Arc::new(ImageDecoder::new()),
        );

        let first = online.load(URL, &LoadConfig::default()).await.unwrap();
        assert_eq!((first.artifact.width(), first.artifact.height()), (32, 16));
        assert_eq!(first.artifact.mip_levels().len(), 5);
        assert!(online.disk_contains(URL).await);

        let offline = ImageLoader::new(
            ImageLoaderConfig::default(),
            disk,
            Fetcher::new(Arc::new(ScriptedTransport::new())),
            Arc::new(ImageDecoder::new()),
        );
        let second = offline.load(URL, &LoadConfig::default()).await.unwrap();

        assert_eq!(second.source, ImageSource::DiskCache);
        assert_eq!(second.artifact.pixels(), first.artifact.pixels());
    }
}

//! Disk-based byte cache for persistence across sessions.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use crate::domain::entities::{CacheKey, RawBytes};
use crate::domain::errors::{LoadError, LoadResult};
use crate::domain::ports::ByteStorePort;
use crate::domain::size::format_size_auto;
use crate::infrastructure::config::app_config::{APP_NAME, APP_ORGANIZATION, APP_QUALIFIER};

/// Maximum disk cache size in bytes (200 MB default).
pub const DEFAULT_MAX_CACHE_SIZE: u64 = 200 * 1024 * 1024;

const ENTRY_EXTENSION: &str = "img";
const TEMP_PREFIX: &str = ".partial-";

/// Disk-based cache that persists raw downloaded bytes, one file per key.
///
/// Files are named by the SHA-256 of the normalized URL. Writes land in a
/// temporary file that is renamed into place, so readers never observe a
/// partially written entry.
pub struct DiskImageCache {
    cache_dir: PathBuf,
    max_size: u64,
    current_size: AtomicU64,
    item_count: AtomicUsize,
    mutation_lock: Mutex<()>,
}

impl DiskImageCache {
    /// Creates a new disk cache in the specified directory.
    ///
    /// # Errors
    /// Returns error if cache directory cannot be created or scanned.
    pub async fn new(cache_dir: PathBuf, max_size: u64) -> LoadResult<Self> {
        fs::create_dir_all(&cache_dir)
            .await
            .map_err(|e| LoadError::store_io(format!("Failed to create cache dir: {e}")))?;
        let mut total_size = 0u64;
        let mut count = 0usize;

        let mut entries = fs::read_dir(&cache_dir)
            .await
            .map_err(|e| LoadError::store_io(format!("Failed to read cache dir: {e}")))?;

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if is_temp_file(&path) {
                if let Err(e) = fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %e, "Failed to remove stale partial file");
                }
                continue;
            }
            if is_entry_file(&path)
                && let Ok(meta) = entry.metadata().await
            {
                total_size += meta.len();
                count += 1;
            }
        }

        debug!(
            dir = %cache_dir.display(),
            entries = count,
            size = %format_size_auto(total_size),
            "Opened disk cache"
        );

        let cache = Self {
            cache_dir,
            max_size,
            current_size: AtomicU64::new(total_size),
            item_count: AtomicUsize::new(count),
            mutation_lock: Mutex::new(()),
        };

        cache.cleanup_if_needed().await;

        Ok(cache)
    }

    /// Creates a cache in the default location (e.g. ~/.cache/image-loader/images/).
    ///
    /// # Errors
    /// Returns error if cache directory cannot be created.
    pub async fn default_location() -> LoadResult<Self> {
        Self::new(default_cache_dir(), DEFAULT_MAX_CACHE_SIZE).await
    }

    /// Returns the cache root.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path for a cached entry.
    fn cache_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{ENTRY_EXTENSION}", key.file_stem()))
    }

    /// Gets raw bytes from disk cache. `Ok(None)` is a miss.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read.
    pub async fn get_bytes(&self, key: &CacheKey) -> LoadResult<Option<Bytes>> {
        let path = self.cache_path(key);
        match fs::read(&path).await {
            Ok(bytes) => {
                trace!(key = %key, path = %path.display(), "Disk cache hit");
                Ok(Some(Bytes::from(bytes)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                trace!(key = %key, "Disk cache miss");
                Ok(None)
            }
            Err(e) => Err(LoadError::store_io(format!(
                "Failed to read cache file {}: {e}",
                path.display()
            ))),
        }
    }

    /// Stores raw bytes in the disk cache.
    ///
    /// # Errors
    /// Returns error if the temporary file cannot be written or published.
    pub async fn put_bytes(&self, key: &CacheKey, bytes: Bytes) -> LoadResult<()> {
        let path = self.cache_path(key);
        let dir = self.cache_dir.clone();
        let new_size = bytes.len() as u64;

        let temp_file = tokio::task::spawn_blocking(move || -> std::io::Result<_> {
            let mut temp_file = tempfile::Builder::new()
                .prefix(TEMP_PREFIX)
                .tempfile_in(&dir)?;
            temp_file.write_all(&bytes)?;
            temp_file.as_file().sync_all()?;
            Ok(temp_file)
        })
        .await
        .map_err(|e| LoadError::store_io(format!("Cache write task failed: {e}")))?
        .map_err(|e| LoadError::store_io(format!("Failed to write cache file: {e}")))?;

        {
            let _guard = self.mutation_lock.lock().await;
            let old_size = fs::metadata(&path).await.map(|m| m.len()).ok();

            temp_file
                .persist(&path)
                .map_err(|e| LoadError::store_io(format!("Failed to publish cache file: {}", e.error)))?;

            if let Some(old) = old_size {
                if new_size > old {
                    self.current_size
                        .fetch_add(new_size - old, Ordering::Relaxed);
                } else {
                    self.current_size
                        .fetch_sub(old - new_size, Ordering::Relaxed);
                }
            } else {
                self.current_size.fetch_add(new_size, Ordering::Relaxed);
                self.item_count.fetch_add(1, Ordering::Relaxed);
            }
        }

        debug!(key = %key, path = %path.display(), size = new_size, "Stored bytes in disk cache");

        self.cleanup_if_needed().await;

        Ok(())
    }

    /// Removes an entry from disk cache.
    pub async fn evict(&self, key: &CacheKey) {
        let path = self.cache_path(key);
        let _guard = self.mutation_lock.lock().await;
        let size = fs::metadata(&path).await.map(|m| m.len()).ok();
        if let Err(e) = fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(key = %key, error = %e, "Failed to evict from disk cache");
            }
        } else if let Some(s) = size {
            self.current_size.fetch_sub(s, Ordering::Relaxed);
            self.item_count.fetch_sub(1, Ordering::Relaxed);
            debug!(key = %key, "Evicted from disk cache");
        }
    }

    /// Clears the entire disk cache.
    ///
    /// # Errors
    /// Returns error if cache directory cannot be read.
    pub async fn clear(&self) -> LoadResult<()> {
        let _guard = self.mutation_lock.lock().await;
        let mut entries = fs::read_dir(&self.cache_dir)
            .await
            .map_err(|e| LoadError::store_io(format!("Failed to read cache dir: {e}")))?;

        let mut kept_size = 0u64;
        let mut kept_count = 0usize;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LoadError::store_io(format!("Failed to read entry: {e}")))?
        {
            let path = entry.path();
            if !is_entry_file(&path) {
                continue;
            }
            let size = entry.metadata().await.map(|m| m.len()).unwrap_or(0);
            if let Err(e) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "Failed to remove cache file");
                kept_size += size;
                kept_count += 1;
            }
        }

        // Survivors stay accounted so later evictions subtract real sizes.
        self.current_size.store(kept_size, Ordering::Relaxed);
        self.item_count.store(kept_count, Ordering::Relaxed);
        debug!(kept = kept_count, "Cleared disk cache");
        Ok(())
    }

    /// Returns the current cache size in bytes.
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size.load(Ordering::Relaxed)
    }

    /// Returns the number of cached files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.item_count.load(Ordering::Relaxed)
    }

    /// Returns true if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cleans up old cache entries if over size limit.
    async fn cleanup_if_needed(&self) {
        if self.current_size() <= self.max_size {
            return;
        }

        let _guard = self.mutation_lock.lock().await;
        let current_size = self.current_size();
        if current_size <= self.max_size {
            return;
        }

        debug!(
            current_size = current_size,
            max_size = self.max_size,
            "Disk cache over limit, cleaning up"
        );

        let Ok(mut entries) = fs::read_dir(&self.cache_dir).await else {
            return;
        };

        let mut files: Vec<(PathBuf, std::time::SystemTime, u64)> = Vec::new();

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if !is_entry_file(&path) {
                continue;
            }

            if let Ok(meta) = entry.metadata().await {
                let touched = meta
                    .accessed()
                    .or_else(|_| meta.modified())
                    .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
                files.push((path, touched, meta.len()));
            }
        }

        files.sort_by_key(|(_, time, _)| *time);

        let mut freed_size = 0u64;
        let mut freed_count = 0usize;
        let target = current_size - self.max_size + (self.max_size / 10);

        for (path, _, size) in files {
            if freed_size >= target {
                break;
            }

            if let Err(e) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "Failed to remove old cache file");
            } else {
                trace!(path = %path.display(), "Removed old cache file");
                freed_size += size;
                freed_count += 1;
            }
        }
        self.current_size.fetch_sub(freed_size, Ordering::Relaxed);
        self.item_count.fetch_sub(freed_count, Ordering::Relaxed);

        debug!(
            freed_size = freed_size,
            freed_count = freed_count,
            "Disk cache cleanup complete"
        );
    }

    /// Checks if an entry is cached.
    pub async fn contains(&self, key: &CacheKey) -> bool {
        let path = self.cache_path(key);
        fs::try_exists(&path).await.unwrap_or(false)
    }
}

#[async_trait]
impl ByteStorePort for DiskImageCache {
    async fn has(&self, key: &CacheKey) -> bool {
        self.contains(key).await
    }

    async fn read(&self, key: &CacheKey) -> LoadResult<Option<RawBytes>> {
        Ok(self
            .get_bytes(key)
            .await?
            .map(|bytes| RawBytes::new(key.clone(), bytes)))
    }

    async fn write(&self, raw: &RawBytes) -> LoadResult<()> {
        self.put_bytes(raw.key(), raw.bytes().clone()).await
    }

    async fn remove(&self, key: &CacheKey) -> LoadResult<()> {
        self.evict(key).await;
        Ok(())
    }

    async fn clear(&self) -> LoadResult<()> {
        Self::clear(self).await
    }
}

fn is_entry_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION)
}

fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(TEMP_PREFIX))
}

/// Returns the default cache directory path.
#[must_use]
pub fn default_cache_dir() -> PathBuf {
    directories::ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME).map_or_else(
        || {
            std::env::temp_dir()
                .join(APP_NAME)
                .join("cache")
                .join("images")
        },
        |dirs| dirs.cache_dir().join("images"),
    )
}

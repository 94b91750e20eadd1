//! Cache inspection and clearing.

use tracing::info;

use crate::application::dto::CacheStatus;
use crate::domain::errors::LoadResult;
use crate::infrastructure::image::ImageLoader;

/// Queries and clears the loader's caches.
#[derive(Debug, Clone)]
pub struct CacheMaintenanceUseCase {
    loader: ImageLoader,
}

impl CacheMaintenanceUseCase {
    /// Creates new maintenance use case.
    #[must_use]
    pub const fn new(loader: ImageLoader) -> Self {
        Self { loader }
    }

    /// Reports where the URL is cached.
    pub async fn status(&self, url: &str) -> CacheStatus {
        CacheStatus {
            url: url.to_string(),
            in_memory: self.loader.memory_contains(url).await,
            on_disk: self.loader.disk_contains(url).await,
        }
    }

    /// Clears memory and disk caches.
    ///
    /// # Errors
    /// Returns error if the disk cache cannot be cleared.
    pub async fn clear(&self) -> LoadResult<()> {
        self.loader.clear_cache().await?;
        info!("Image caches cleared");
        Ok(())
    }
}

//! Port definition for the decoded image cache.

use std::sync::Arc;

use crate::domain::entities::{CacheKey, ImageArtifact};

/// Port for in-memory caching of decoded artifacts.
/// Implementations must be thread-safe.
#[async_trait::async_trait]
pub trait ImageCachePort: Send + Sync {
    /// Attempts to get an artifact from the cache, refreshing its recency.
    /// Returns None if not cached.
    async fn get(&self, key: &CacheKey) -> Option<Arc<ImageArtifact>>;

    /// Stores an artifact, evicting older entries if over budget.
    async fn put(&self, key: CacheKey, artifact: Arc<ImageArtifact>);

    /// Removes an artifact from the cache.
    async fn evict(&self, key: &CacheKey);

    /// Returns the current number of cached artifacts.
    fn len(&self) -> usize;

    /// Returns true if the cache is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all artifacts from the cache.
    async fn clear(&self);
}

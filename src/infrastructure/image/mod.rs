//! Image handling infrastructure.
//!
//! This module provides:
//! - Memory caching with LRU eviction
//! - Disk caching for persistence
//! - Network fetching with retry
//! - Raster decoding with mip chains
//! - Async image loading pipeline

pub mod decoder;
pub mod disk_cache;
pub mod fetcher;
pub mod http_transport;
pub mod loader;
pub mod memory_cache;

pub use decoder::ImageDecoder;
pub use disk_cache::{DEFAULT_MAX_CACHE_SIZE, DiskImageCache, default_cache_dir};
pub use fetcher::Fetcher;
pub use http_transport::HttpTransport;
pub use loader::{ImageLoadedEvent, ImageLoader, ImageLoaderConfig};
pub use memory_cache::{CacheStats, MemoryImageCache};

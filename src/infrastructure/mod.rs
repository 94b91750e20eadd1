//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// Image handling (caching, fetching, decoding, loading).
pub mod image;

pub use config::{AppConfig, CliArgs, Command, ConfigError, ConfigLoad, LogLevel, StorageManager};
pub use image::{
    CacheStats, DiskImageCache, Fetcher, HttpTransport, ImageDecoder, ImageLoadedEvent,
    ImageLoader, ImageLoaderConfig, MemoryImageCache,
};

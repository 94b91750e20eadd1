//! Domain entity definitions.

mod cache_key;
mod image;
mod load_config;

pub use cache_key::CacheKey;
pub use image::{ImageArtifact, ImageSource, LoadedImage, MipLevel, RawBytes, StorageHint};
pub use load_config::{DEFAULT_MEMORY_CACHE_CAPACITY, LoadConfig};

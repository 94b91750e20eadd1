//! Domain types for fetched and decoded images.

use std::sync::Arc;

use bytes::Bytes;

use super::CacheKey;
use crate::domain::size::is_block_aligned;

/// Raw image payload as downloaded or read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBytes {
    key: CacheKey,
    bytes: Bytes,
}

impl RawBytes {
    /// Wraps a payload for the given key.
    #[must_use]
    pub fn new(key: CacheKey, bytes: impl Into<Bytes>) -> Self {
        Self {
            key,
            bytes: bytes.into(),
        }
    }

    /// Returns the key the payload was fetched for.
    #[must_use]
    pub const fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Returns the payload.
    #[must_use]
    pub const fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Returns the payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// How an engine adapter may store the base level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageHint {
    /// Both dimensions are multiples of the compression block size.
    BlockCompressible,
    /// Dimensions are not block aligned; keep pixels uncompressed.
    Uncompressed,
}

/// One reduced level of a mip chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipLevel {
    /// Level width in pixels.
    pub width: u32,
    /// Level height in pixels.
    pub height: u32,
    /// RGBA8 pixels, row-major.
    pub pixels: Vec<u8>,
}

/// Decoded, engine-independent image.
///
/// Pixels are always RGBA8. Once built an artifact is never mutated and is
/// shared through `Arc` between every caller of the same key.
#[derive(Debug, PartialEq, Eq)]
pub struct ImageArtifact {
    width: u32,
    height: u32,
    has_alpha: bool,
    pixels: Vec<u8>,
    mip_levels: Vec<MipLevel>,
    storage_hint: StorageHint,
    byte_size: u64,
}

impl ImageArtifact {
    /// Bytes per RGBA8 pixel.
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Creates an artifact without mip levels.
    #[must_use]
    pub fn new(width: u32, height: u32, has_alpha: bool, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * Self::BYTES_PER_PIXEL
        );
        let storage_hint = if is_block_aligned(width, height) {
            StorageHint::BlockCompressible
        } else {
            StorageHint::Uncompressed
        };
        let byte_size = pixels.len() as u64;
        Self {
            width,
            height,
            has_alpha,
            pixels,
            mip_levels: Vec::new(),
            storage_hint,
            byte_size,
        }
    }

    /// Attaches the reduced levels of the mip chain.
    #[must_use]
    pub fn with_mip_levels(mut self, levels: Vec<MipLevel>) -> Self {
        self.byte_size = self.pixels.len() as u64
            + levels.iter().map(|l| l.pixels.len() as u64).sum::<u64>();
        self.mip_levels = levels;
        self
    }

    /// Width of the base level.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the base level.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Whether the source image carried an alpha channel.
    #[must_use]
    pub const fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// RGBA8 pixels of the base level.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Reduced levels, largest first. Empty when mip maps were not generated.
    #[must_use]
    pub fn mip_levels(&self) -> &[MipLevel] {
        &self.mip_levels
    }

    /// Total level count including the base level.
    #[must_use]
    pub fn mip_count(&self) -> usize {
        self.mip_levels.len() + 1
    }

    /// Returns true if a mip chain was generated.
    #[must_use]
    pub fn has_mip_maps(&self) -> bool {
        !self.mip_levels.is_empty()
    }

    /// Storage hint for the texture adapter.
    #[must_use]
    pub const fn storage_hint(&self) -> StorageHint {
        self.storage_hint
    }

    /// Size estimate used by memory cache accounting.
    #[must_use]
    pub const fn byte_size(&self) -> u64 {
        self.byte_size
    }
}

/// Where an image was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Served from the in-memory LRU cache.
    MemoryCache,
    /// Decoded from bytes in the disk cache.
    DiskCache,
    /// Downloaded from the network.
    Network,
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MemoryCache => write!(f, "memory"),
            Self::DiskCache => write!(f, "disk"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// Result of a successful load.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// Key the image was requested under.
    pub key: CacheKey,
    /// The shared decoded artifact.
    pub artifact: Arc<ImageArtifact>,
    /// Tier that satisfied the request.
    pub source: ImageSource,
}

impl LoadedImage {
    /// Creates a loaded image record.
    #[must_use]
    pub const fn new(key: CacheKey, artifact: Arc<ImageArtifact>, source: ImageSource) -> Self {
        Self {
            key,
            artifact,
            source,
        }
    }
}

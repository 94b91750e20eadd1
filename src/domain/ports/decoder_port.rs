//! Port definition for image decoding.

use crate::domain::entities::{ImageArtifact, LoadConfig, RawBytes};
use crate::domain::errors::LoadResult;

/// Decode options derived from a [`LoadConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Build the full mip chain.
    pub generate_mip_maps: bool,
    /// Skip the intermediate full-resolution copy.
    pub memory_optimized: bool,
}

impl From<&LoadConfig> for DecodeOptions {
    fn from(config: &LoadConfig) -> Self {
        Self {
            generate_mip_maps: config.generate_mip_maps,
            memory_optimized: config.memory_optimized,
        }
    }
}

/// Port converting raw bytes into a decoded artifact.
///
/// Decoding is CPU-bound and synchronous; callers run it on a blocking pool.
#[cfg_attr(test, mockall::automock)]
pub trait DecoderPort: Send + Sync {
    /// Decodes `raw`. Malformed input yields `LoadError::Decode`.
    ///
    /// # Errors
    /// Returns error if the payload is not a supported image.
    fn decode(&self, raw: &RawBytes, options: DecodeOptions) -> LoadResult<ImageArtifact>;
}

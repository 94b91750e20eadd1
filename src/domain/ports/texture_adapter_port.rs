//! Port definition for engine texture construction.

use std::sync::Arc;

use crate::domain::entities::ImageArtifact;

/// Converts a decoded artifact into an engine-native texture.
///
/// Format selection, compression and upload belong to the implementor.
pub trait TextureAdapterPort: Send + Sync {
    /// Engine texture type.
    type Texture;

    /// Builds a texture from the shared artifact.
    fn create_texture(&self, artifact: Arc<ImageArtifact>) -> Self::Texture;
}

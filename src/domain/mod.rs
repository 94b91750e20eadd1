//! Domain layer with core entities, errors and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;
/// Size formatting and dimension helpers.
pub mod size;

pub use entities::{CacheKey, ImageArtifact, ImageSource, LoadConfig, LoadedImage, RawBytes};
pub use errors::{LoadError, LoadResult, TransportError};
pub use ports::{ByteStorePort, DecoderPort, ImageCachePort, TextureAdapterPort, TransportPort};

mod byte_store_port;
mod decoder_port;
mod image_cache_port;
mod texture_adapter_port;
mod transport_port;

pub use byte_store_port::ByteStorePort;
pub use decoder_port::{DecodeOptions, DecoderPort};
pub use image_cache_port::ImageCachePort;
pub use texture_adapter_port::TextureAdapterPort;
pub use transport_port::TransportPort;

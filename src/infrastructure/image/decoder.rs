//! Raster decoding into RGBA8 artifacts.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageDecoder as _, ImageReader, RgbaImage};
use tracing::trace;

use crate::domain::entities::{ImageArtifact, MipLevel, RawBytes};
use crate::domain::errors::{LoadError, LoadResult};
use crate::domain::ports::{DecodeOptions, DecoderPort};
use crate::domain::size::is_power_of_two;

/// Decoder for PNG, JPEG and WebP payloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageDecoder;

impl ImageDecoder {
    /// Creates decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decodes through an intermediate `DynamicImage` and copies to RGBA8.
    fn decode_buffered(raw: &RawBytes) -> LoadResult<(RgbaImage, bool)> {
        let image = image::load_from_memory(raw.bytes()).map_err(|e| LoadError::decode(e.to_string()))?;
        let has_alpha = image.color().has_alpha();
        Ok((image.to_rgba8(), has_alpha))
    }

    /// Decodes straight from the format decoder, converting in place.
    fn decode_direct(raw: &RawBytes) -> LoadResult<(RgbaImage, bool)> {
        let reader = ImageReader::new(Cursor::new(&raw.bytes()[..]))
            .with_guessed_format()
            .map_err(|e| LoadError::decode(e.to_string()))?;
        let decoder = reader
            .into_decoder()
            .map_err(|e| LoadError::decode(e.to_string()))?;
        let has_alpha = decoder.color_type().has_alpha();
        let image = DynamicImage::from_decoder(decoder).map_err(|e| LoadError::decode(e.to_string()))?;
        Ok((image.into_rgba8(), has_alpha))
    }
}

impl DecoderPort for ImageDecoder {
    fn decode(&self, raw: &RawBytes, options: DecodeOptions) -> LoadResult<ImageArtifact> {
        if raw.is_empty() {
            return Err(LoadError::decode("empty payload"));
        }

        let (rgba, has_alpha) = if options.memory_optimized {
            Self::decode_direct(raw)?
        } else {
            Self::decode_buffered(raw)?
        };

        let mip_levels = if options.generate_mip_maps {
            build_mip_chain(&rgba)
        } else {
            Vec::new()
        };

        let (width, height) = rgba.dimensions();
        trace!(
            key = %raw.key(),
            width = width,
            height = height,
            mips = mip_levels.len(),
            power_of_two = is_power_of_two(width) && is_power_of_two(height),
            "Decoded image"
        );

        Ok(ImageArtifact::new(width, height, has_alpha, rgba.into_raw()).with_mip_levels(mip_levels))
    }
}

/// Builds every reduced level, halving each side (min 1) down to 1x1.
fn build_mip_chain(base: &RgbaImage) -> Vec<MipLevel> {
    let mut levels = Vec::new();
    let mut previous: Option<RgbaImage> = None;

    loop {
        let source = previous.as_ref().unwrap_or(base);
        let (width, height) = source.dimensions();
        if width <= 1 && height <= 1 {
            break;
        }
        let next = imageops::resize(
            source,
            (width / 2).max(1),
            (height / 2).max(1),
            FilterType::Triangle,
        );
        if let Some(done) = previous.replace(next) {
            levels.push(into_mip_level(done));
        }
    }

    levels.extend(previous.map(into_mip_level));
    levels
}

fn into_mip_level(image: RgbaImage) -> MipLevel {
    let (width, height) = image.dimensions();
    MipLevel {
        width,
        height,
        pixels: image.into_raw(),
    }
}

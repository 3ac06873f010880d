//! Post-generation image processing.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageProcessingError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// CPU-bound transform applied to freshly generated image bytes.
pub trait ImageProcessor: Send + Sync {
    fn process(&self, bytes: &[u8]) -> Result<ProcessedImage, ImageProcessingError>;
}

/// Bounds the longest edge and re-encodes as JPEG.
#[derive(Debug, Clone, Copy)]
pub struct ResizeJpegProcessor {
    pub max_dimension: u32,
    pub quality: u8,
}

impl ImageProcessor for ResizeJpegProcessor {
    fn process(&self, bytes: &[u8]) -> Result<ProcessedImage, ImageProcessingError> {
        let img = image::load_from_memory(bytes).map_err(ImageProcessingError::Decode)?;

        let (w, h) = img.dimensions();
        let img = if w > self.max_dimension || h > self.max_dimension {
            img.resize(self.max_dimension, self.max_dimension, FilterType::Lanczos3)
        } else {
            img
        };

        // JPEG has no alpha channel.
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        let mut out = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut out, self.quality.clamp(1, 100));
        rgb.write_with_encoder(encoder)
            .map_err(ImageProcessingError::Encode)?;

        Ok(ProcessedImage {
            bytes: out.into_inner(),
            content_type: "image/jpeg",
        })
    }
}

/// Leaves bytes untouched; used when compression is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughProcessor;

impl ImageProcessor for PassthroughProcessor {
    fn process(&self, bytes: &[u8]) -> Result<ProcessedImage, ImageProcessingError> {
        Ok(ProcessedImage {
            bytes: bytes.to_vec(),
            content_type: sniff_content_type(bytes),
        })
    }
}

/// Best-effort content type from magic bytes.
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Png) => "image/png",
        Ok(image::ImageFormat::Jpeg) => "image/jpeg",
        _ => "application/octet-stream",
    }
}

//! Source images and the encoder collaborator.
//!
//! The builder never looks at pixels itself. It deduplicates [`ImageExport`]
//! descriptors and hands each unique one to an [`ImageEncoder`] at bake time.
//! [`RasterImageEncoder`] is the default encoder, built on the `image` crate.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageBuffer, RgbaImage};

use crate::error::{Error, Result};
pub use crate::settings::ImageFormat;

pub const MIME_PNG: &str = "image/png";
pub const MIME_JPEG: &str = "image/jpeg";

/// Pixels, or bytes that are already in a glTF-compatible container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Row-major RGBA, 8 bits per channel, top row first.
    Rgba8 { width: u32, height: u32, pixels: Vec<u8> },
    /// Pre-encoded PNG/JPEG that bypasses the encoder.
    Encoded { bytes: Vec<u8>, mime_type: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub name: Option<String>,
    pub source: ImageSource,
}

impl SourceImage {
    /// Wrap raw RGBA pixels, checking the byte count against the dimensions.
    pub fn rgba8(name: Option<String>, width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(Error::InvalidImageData {
                name: name.unwrap_or_default(),
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            name,
            source: ImageSource::Rgba8 { width, height, pixels },
        })
    }

    #[must_use]
    pub fn encoded(name: Option<String>, bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            name,
            source: ImageSource::Encoded {
                bytes,
                mime_type: mime_type.into(),
            },
        }
    }

    /// `true` when any pixel is not fully opaque. Pre-encoded images report `false`.
    #[must_use]
    pub fn has_transparency(&self) -> bool {
        match &self.source {
            ImageSource::Rgba8 { pixels, .. } => pixels.chunks_exact(4).any(|p| p[3] < 255),
            ImageSource::Encoded { .. } => false,
        }
    }
}

/// An image paired with the encoding requested for it.
///
/// Two descriptors are equal when they reference the same source image and
/// ask for the same format, i.e. when they would produce identical bytes.
#[derive(Debug, Clone)]
pub struct ImageExport {
    pub image: Arc<SourceImage>,
    pub format: ImageFormat,
}

impl ImageExport {
    #[must_use]
    pub fn new(image: Arc<SourceImage>, format: ImageFormat) -> Self {
        Self { image, format }
    }
}

impl PartialEq for ImageExport {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.image, &other.image) && self.format == other.format
    }
}

impl Eq for ImageExport {}

impl Hash for ImageExport {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.image).hash(state);
        self.format.hash(state);
    }
}

/// Bytes ready to be embedded or written next to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl EncodedImage {
    /// File extension matching the MIME type.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            MIME_PNG => "png",
            MIME_JPEG => "jpg",
            "image/ktx2" => "ktx2",
            "image/webp" => "webp",
            _ => "bin",
        }
    }
}

/// Encoder collaborator: turns a source image into file bytes.
pub trait ImageEncoder: Send + Sync {
    fn encode(&self, image: &SourceImage, format: ImageFormat) -> Result<EncodedImage>;
}

/// PNG/JPEG encoder backed by the `image` crate.
#[derive(Debug, Clone, Copy)]
pub struct RasterImageEncoder {
    pub jpeg_quality: u8,
}

impl Default for RasterImageEncoder {
    fn default() -> Self {
        Self { jpeg_quality: 90 }
    }
}

impl RasterImageEncoder {
    #[must_use]
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    fn encode_png(name: &str, img: &RgbaImage) -> Result<Vec<u8>> {
        let mut png_data = Vec::new();
        let encoder = PngEncoder::new(&mut png_data);
        img.write_with_encoder(encoder).map_err(|e| Error::ImageEncodeFailed {
            name: name.to_string(),
            message: e.to_string(),
        })?;
        Ok(png_data)
    }

    fn encode_jpeg(&self, name: &str, img: RgbaImage) -> Result<Vec<u8>> {
        let rgb = DynamicImage::ImageRgba8(img).to_rgb8();
        let mut jpeg_data = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut jpeg_data, self.jpeg_quality);
        rgb.write_with_encoder(encoder).map_err(|e| Error::ImageEncodeFailed {
            name: name.to_string(),
            message: e.to_string(),
        })?;
        Ok(jpeg_data)
    }
}

impl ImageEncoder for RasterImageEncoder {
    fn encode(&self, image: &SourceImage, format: ImageFormat) -> Result<EncodedImage> {
        let name = image.name.as_deref().unwrap_or("image");
        let (width, height, pixels) = match &image.source {
            ImageSource::Encoded { bytes, mime_type } => {
                return Ok(EncodedImage {
                    bytes: bytes.clone(),
                    mime_type: mime_type.clone(),
                });
            }
            ImageSource::Rgba8 { width, height, pixels } => (*width, *height, pixels),
        };

        let format = match format {
            ImageFormat::Unknown if image.has_transparency() => ImageFormat::Png,
            ImageFormat::Unknown => ImageFormat::Jpg,
            other => other,
        };

        let img: RgbaImage =
            ImageBuffer::from_raw(width, height, pixels.clone()).ok_or_else(|| Error::InvalidImageData {
                name: name.to_string(),
                expected: width as usize * height as usize * 4,
                actual: pixels.len(),
            })?;

        tracing::debug!("Encoding image {name} ({width}x{height}) as {format:?}");
        match format {
            ImageFormat::Jpg => Ok(EncodedImage {
                bytes: self.encode_jpeg(name, img)?,
                mime_type: MIME_JPEG.to_string(),
            }),
            _ => Ok(EncodedImage {
                bytes: Self::encode_png(name, &img)?,
                mime_type: MIME_PNG.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn checker(alpha: u8) -> SourceImage {
        let pixels = [[255, 0, 0, alpha], [0, 255, 0, 255], [0, 0, 255, 255], [255, 255, 255, 255]]
            .concat();
        SourceImage::rgba8(Some("checker".into()), 2, 2, pixels).unwrap()
    }

    #[test]
    fn test_rejects_wrong_pixel_count() {
        let err = SourceImage::rgba8(None, 2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, Error::InvalidImageData { expected: 16, actual: 15, .. }));
    }

    #[test]
    fn test_unknown_format_picks_png_for_alpha() {
        let encoder = RasterImageEncoder::default();
        let png = encoder.encode(&checker(128), ImageFormat::Unknown).unwrap();
        assert_eq!(png.mime_type, MIME_PNG);
        assert_eq!(&png.bytes[1..4], b"PNG");
        let jpg = encoder.encode(&checker(255), ImageFormat::Unknown).unwrap();
        assert_eq!(jpg.mime_type, MIME_JPEG);
        assert_eq!(&jpg.bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(jpg.extension(), "jpg");
    }

    #[test]
    fn test_encoded_bypasses_encoder() {
        let source = SourceImage::encoded(None, vec![1, 2, 3], "image/ktx2");
        let out = RasterImageEncoder::default().encode(&source, ImageFormat::Png).unwrap();
        assert_eq!(out.bytes, vec![1, 2, 3]);
        assert_eq!(out.extension(), "ktx2");
    }

    #[test]
    fn test_export_equality_is_identity_plus_format() {
        let a = Arc::new(checker(255));
        let b = Arc::new(checker(255));
        let mut set = HashSet::new();
        set.insert(ImageExport::new(Arc::clone(&a), ImageFormat::Png));
        assert!(set.contains(&ImageExport::new(Arc::clone(&a), ImageFormat::Png)));
        assert!(!set.contains(&ImageExport::new(Arc::clone(&a), ImageFormat::Jpg)));
        assert!(!set.contains(&ImageExport::new(b, ImageFormat::Png)));
    }
}

//! Image normalization: re-encode as JPEG until the payload fits a byte budget.

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tracing::{debug, trace, warn};

use ideacap_core::defaults::{IMAGE_MIN_QUALITY_TENTHS, IMAGE_START_QUALITY_TENTHS};
use ideacap_core::{Error, Result};

/// Encodes an image at a given quality in `(0.0, 1.0]`.
pub trait QualityEncoder: Send + Sync {
    fn encode(&self, quality: f32) -> Result<Vec<u8>>;
}

/// A decoded bitmap that encodes to JPEG.
#[derive(Debug, Clone)]
pub struct RawImage {
    image: DynamicImage,
}

impl RawImage {
    /// Decode any format supported by the `image` crate.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| Error::EncodingFailed(format!("Failed to decode image: {}", e)))?;
        Ok(Self { image })
    }

    /// Read and decode an image file.
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::decode(&bytes)
    }

    pub fn from_image(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

impl QualityEncoder for RawImage {
    fn encode(&self, quality: f32) -> Result<Vec<u8>> {
        let quality = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
        // JPEG has no alpha channel.
        let rgb = self.image.to_rgb8();

        let mut buf = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
        encoder
            .encode_image(&rgb)
            .map_err(|e| Error::EncodingFailed(format!("JPEG encoding failed: {}", e)))?;
        Ok(buf)
    }
}

/// Encode at decreasing quality until the output fits in `max_bytes`.
///
/// Starts at 0.8 and steps down by 0.1, never below 0.1. If the budget is
/// unattainable the 0.1 attempt is returned. Only a failed or empty first
/// encode is an error; a later failure keeps the last good output.
pub fn normalize(encoder: &dyn QualityEncoder, max_bytes: usize) -> Result<Vec<u8>> {
    let mut tenths = IMAGE_START_QUALITY_TENTHS;
    let mut data = encoder.encode(quality_of(tenths))?;
    if data.is_empty() {
        return Err(Error::EncodingFailed("encoder produced no output".to_string()));
    }
    trace!(quality = tenths, image_bytes = data.len(), "Initial encode");

    while data.len() > max_bytes && tenths > IMAGE_MIN_QUALITY_TENTHS {
        tenths -= 1;
        match encoder.encode(quality_of(tenths)) {
            Ok(next) if !next.is_empty() => {
                trace!(quality = tenths, image_bytes = next.len(), "Re-encoded");
                data = next;
            }
            Ok(_) => {
                warn!(quality = tenths, "Re-encode produced no output, keeping previous");
                break;
            }
            Err(e) => {
                warn!(quality = tenths, error = %e, "Re-encode failed, keeping previous");
                break;
            }
        }
    }

    debug!(
        quality = tenths,
        image_bytes = data.len(),
        max_bytes,
        within_budget = data.len() <= max_bytes,
        "Image normalized"
    );
    Ok(data)
}

fn quality_of(tenths: u8) -> f32 {
    f32::from(tenths) / 10.0
}

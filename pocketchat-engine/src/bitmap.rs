// Image normalization for attachments: bound the size, re-encode as JPEG, base64.

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use pocketchat_core::media::{JPEG_QUALITY, MAX_IMAGE_HEIGHT, MAX_IMAGE_WIDTH};

/// Target dimensions for a `width`×`height` image under the given bound.
///
/// Images that already fit are left alone. Otherwise the longer side (width wins ties
/// only when strictly larger) is clamped and the other side follows the aspect ratio.
/// Integer arithmetic keeps exact ratios exact (1600×1200 → 800×600).
pub fn fit_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }
    if width == 0 || height == 0 {
        return (width, height);
    }

    let (w, h) = if width > height {
        let h = u64::from(max_width) * u64::from(height) / u64::from(width);
        (max_width, h as u32)
    } else {
        let w = u64::from(max_height) * u64::from(width) / u64::from(height);
        (w as u32, max_height)
    };

    // Extreme aspect ratios must not collapse to an empty image.
    (w.max(1), h.max(1))
}

/// Downscale to the attachment bound using a smoothing filter.
pub fn downscale(img: DynamicImage) -> DynamicImage {
    let (w, h) = fit_dimensions(img.width(), img.height(), MAX_IMAGE_WIDTH, MAX_IMAGE_HEIGHT);
    if (w, h) == (img.width(), img.height()) {
        return img;
    }
    img.resize_exact(w, h, FilterType::Triangle)
}

pub fn encode_jpeg(img: &DynamicImage) -> anyhow::Result<Vec<u8>> {
    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    rgb.write_with_encoder(encoder).context("encode JPEG")?;
    Ok(out)
}

pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

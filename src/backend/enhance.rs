//! Tone and quality passes: enhance, auto-level, auto-gamma.
//!
//! Auto-level and auto-gamma are computed over all colour channels together
//! (alpha excluded) and applied through a 256-entry lookup table, so hue is
//! preserved and each pass costs one read and one write per pixel.

use image::{DynamicImage, GenericImageView};
use imageproc::filter::median_filter;
use tracing::debug;

/// Noise-reduction pass used after an upscale (3×3 median).
pub fn enhance(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(median_filter(&buf, 1, 1)),
        DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(median_filter(&buf, 1, 1)),
        other => DynamicImage::ImageRgba8(median_filter(&other.to_rgba8(), 1, 1)),
    }
}

/// Linearly stretch the colour range so the darkest sample maps to 0 and the
/// brightest to 255. Flat images are returned unchanged.
pub fn auto_level(image: DynamicImage) -> DynamicImage {
    let Some((min, max)) = color_extrema(&image) else {
        return image;
    };
    if max <= min || (min == 0 && max == 255) {
        return image;
    }
    debug!(min, max, "Auto-level");

    let range = (max - min) as f32;
    let mut lut = [0u8; 256];
    for (v, slot) in lut.iter_mut().enumerate() {
        let stretched = (v as f32 - min as f32) * 255.0 / range;
        *slot = stretched.round().clamp(0.0, 255.0) as u8;
    }
    apply_lut(image, &lut)
}

/// Gamma-correct so that the mean colour sample moves to mid-scale.
///
/// `gamma = ln(mean) / ln(0.5)` and every sample becomes
/// `255 · (v / 255)^(1 / gamma)`.
pub fn auto_gamma(image: DynamicImage) -> DynamicImage {
    let Some(mean) = color_mean(&image) else {
        return image;
    };
    let normalised = mean / 255.0;
    if normalised <= 0.0 || normalised >= 1.0 {
        return image;
    }
    let gamma = normalised.ln() / 0.5f64.ln();
    if !gamma.is_finite() || gamma <= 0.0 || (gamma - 1.0).abs() < 1e-3 {
        return image;
    }
    debug!(mean, gamma, "Auto-gamma");

    let mut lut = [0u8; 256];
    for (v, slot) in lut.iter_mut().enumerate() {
        let corrected = 255.0 * (v as f64 / 255.0).powf(1.0 / gamma);
        *slot = corrected.round().clamp(0.0, 255.0) as u8;
    }
    apply_lut(image, &lut)
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// Colour samples of `image` as 8-bit values (alpha excluded).
fn color_samples(image: &DynamicImage) -> Vec<u8> {
    if image.color().has_color() {
        image.to_rgb8().into_raw()
    } else {
        image.to_luma8().into_raw()
    }
}

fn color_extrema(image: &DynamicImage) -> Option<(u8, u8)> {
    if image.dimensions() == (0, 0) {
        return None;
    }
    let samples = color_samples(image);
    let min = samples.iter().copied().min()?;
    let max = samples.iter().copied().max()?;
    Some((min, max))
}

fn color_mean(image: &DynamicImage) -> Option<f64> {
    let samples = color_samples(image);
    if samples.is_empty() {
        return None;
    }
    let sum: u64 = samples.iter().map(|&s| s as u64).sum();
    Some(sum as f64 / samples.len() as f64)
}

/// Map every colour sample through `lut`, leaving alpha untouched.
fn apply_lut(image: DynamicImage, lut: &[u8; 256]) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(mut buf) => {
            for p in buf.pixels_mut() {
                p.0[0] = lut[p.0[0] as usize];
            }
            DynamicImage::ImageLuma8(buf)
        }
        DynamicImage::ImageLumaA8(mut buf) => {
            for p in buf.pixels_mut() {
                p.0[0] = lut[p.0[0] as usize];
            }
            DynamicImage::ImageLumaA8(buf)
        }
        DynamicImage::ImageRgb8(mut buf) => {
            for p in buf.pixels_mut() {
                for c in p.0.iter_mut() {
                    *c = lut[*c as usize];
                }
            }
            DynamicImage::ImageRgb8(buf)
        }
        other => {
            let mut buf = other.to_rgba8();
            for p in buf.pixels_mut() {
                for c in p.0[..3].iter_mut() {
                    *c = lut[*c as usize];
                }
            }
            DynamicImage::ImageRgba8(buf)
        }
    }
}

//! Aspect-preserving resize with a minimum-width floor.
//!
//! Exactly one dimension is authoritative per call ([`ResizeTarget`]); the
//! other is derived from the source aspect ratio, rounded to the nearest
//! pixel and never below 1.
//!
//! The [`MIN_IMAGE_WIDTH`] floor guards widths supplied by callers. Internal
//! resizes computed by the homogenizer go through [`scaled_dimensions`] and
//! the backend directly.

use crate::backend::{ImageHandle, ImageOps};
use crate::config::MIN_IMAGE_WIDTH;
use crate::error::ComposeError;
use crate::pipeline::orientation::classify;
use crate::types::Orientation;
use tracing::debug;

/// The authoritative dimension of a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeTarget {
    Width(u32),
    Height(u32),
}

/// Size of a `width × height` image resized to `target`.
pub fn scaled_dimensions(width: u32, height: u32, target: ResizeTarget) -> (u32, u32) {
    let scale = |num: u32, to: u32, from: u32| -> u32 {
        if from == 0 {
            return 1;
        }
        ((num as f64 * to as f64 / from as f64).round() as u32).max(1)
    };
    match target {
        ResizeTarget::Width(w) => (w, scale(height, w, width)),
        ResizeTarget::Height(h) => (scale(width, h, height), h),
    }
}

/// Check a caller-supplied width against the floor.
pub fn check_width(name: &'static str, width: u32) -> Result<(), ComposeError> {
    if width < MIN_IMAGE_WIDTH {
        return Err(ComposeError::WidthBelowMinimum {
            name,
            width,
            min: MIN_IMAGE_WIDTH,
        });
    }
    Ok(())
}

/// Resize `image` to `target`, preserving its aspect ratio.
///
/// Fails with [`ComposeError::WidthBelowMinimum`] for a width below
/// [`MIN_IMAGE_WIDTH`] and [`ComposeError::InvalidSettings`] for a zero
/// height.
pub fn resize<O: ImageOps>(
    ops: &O,
    image: O::Image,
    target: ResizeTarget,
) -> Result<O::Image, ComposeError> {
    match target {
        ResizeTarget::Width(w) => check_width("target width", w)?,
        ResizeTarget::Height(0) => {
            return Err(ComposeError::InvalidSettings(
                "Target height must be ≥ 1".into(),
            ))
        }
        ResizeTarget::Height(_) => {}
    }
    let (w, h) = scaled_dimensions(image.width(), image.height(), target);
    debug!(?target, width = w, height = h, "Proportional resize");
    ops.resize(image, w, h)
}

/// Orientation policy: landscape (and square) images are resized by width,
/// portrait images by height, both to `size`. `size` is held to the width
/// floor either way.
pub fn resize_by_orientation<O: ImageOps>(
    ops: &O,
    image: O::Image,
    size: u32,
) -> Result<O::Image, ComposeError> {
    check_width("target width", size)?;
    let target = match classify(image.width(), image.height()) {
        Orientation::Landscape => ResizeTarget::Width(size),
        Orientation::Portrait => ResizeTarget::Height(size),
    };
    resize(ops, image, target)
}

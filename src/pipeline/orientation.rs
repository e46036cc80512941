//! Orientation classification and correction.

use crate::backend::{ImageHandle, ImageOps};
use crate::types::{Orientation, OrientationTag};
use tracing::debug;

/// Geometric orientation of a `width × height` image. Squares are landscape.
pub fn classify(width: u32, height: u32) -> Orientation {
    if width >= height {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    }
}

/// Geometric orientation of a decoded image.
pub fn orientation_of<I: ImageHandle>(image: &I) -> Orientation {
    classify(image.width(), image.height())
}

/// `true` when `tag` asks for a 90° rotation of a `width × height` image.
///
/// A square never conflicts with either tag.
pub fn needs_rotation(width: u32, height: u32, tag: OrientationTag) -> bool {
    match tag {
        OrientationTag::Portrait => width > height,
        OrientationTag::Landscape => width < height,
        OrientationTag::NotApplicable => false,
    }
}

/// Rotate `image` 90° clockwise when its geometry conflicts with `tag`.
///
/// Applying this twice with the same tag is the same as applying it once:
/// after one rotation the conflict no longer holds.
pub fn correct<O: ImageOps>(ops: &O, image: O::Image, tag: OrientationTag) -> O::Image {
    if needs_rotation(image.width(), image.height(), tag) {
        debug!(
            ?tag,
            width = image.width(),
            height = image.height(),
            "Orientation conflicts with declared tag; rotating"
        );
        ops.rotate90(image)
    } else {
        image
    }
}

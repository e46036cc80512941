//! Collection homogenizer.
//!
//! Tiles are grouped by geometric orientation. The larger group (landscape on
//! a tie) is *predominant*, and its maximum width and height become the
//! reference extent:
//!
//! * a strictly wide tile narrower than the reference width is upscaled to
//!   it, then enhanced;
//! * any other tile taller than the reference height is scaled down to it,
//!   then enhanced.
//!
//! Every tile then gets auto-level followed by auto-gamma, resized or not.

use crate::backend::{ImageHandle, ImageOps};
use crate::error::ComposeError;
use crate::pipeline::orientation::orientation_of;
use crate::pipeline::resize::{scaled_dimensions, ResizeTarget};
use crate::types::Orientation;
use tracing::{debug, info};

/// Reference extent computed from the predominant group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub orientation: Orientation,
    pub max_width: u32,
    pub max_height: u32,
}

/// Predominant orientation and its maximum extent, or `None` for an empty
/// batch.
pub fn predominant_extent<I: ImageHandle>(images: &[I]) -> Option<Extent> {
    if images.is_empty() {
        return None;
    }
    let landscape = images
        .iter()
        .filter(|i| orientation_of(*i) == Orientation::Landscape)
        .count();
    let portrait = images.len() - landscape;
    let orientation = if landscape >= portrait {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    };

    let group = images.iter().filter(|i| orientation_of(*i) == orientation);
    let (max_width, max_height) = group.fold((0, 0), |(w, h), i| {
        (w.max(i.width()), h.max(i.height()))
    });

    debug!(landscape, portrait, ?orientation, max_width, max_height, "Predominant group");
    Some(Extent {
        orientation,
        max_width,
        max_height,
    })
}

/// Homogenize `images`, preserving their order.
pub fn homogenize<O: ImageOps>(
    ops: &O,
    images: Vec<O::Image>,
) -> Result<Vec<O::Image>, ComposeError> {
    let Some(extent) = predominant_extent(&images) else {
        return Ok(images);
    };
    info!(
        count = images.len(),
        orientation = ?extent.orientation,
        max_width = extent.max_width,
        max_height = extent.max_height,
        "Homogenizing collection"
    );

    images
        .into_iter()
        .map(|img| -> Result<O::Image, ComposeError> {
            let img = match_extent(ops, img, &extent)?;
            let img = ops.auto_level(img);
            Ok(ops.auto_gamma(img))
        })
        .collect()
}

fn match_extent<O: ImageOps>(
    ops: &O,
    img: O::Image,
    extent: &Extent,
) -> Result<O::Image, ComposeError> {
    let (w, h) = (img.width(), img.height());
    let target = if w > h {
        (w < extent.max_width).then_some(ResizeTarget::Width(extent.max_width))
    } else {
        (h > extent.max_height).then_some(ResizeTarget::Height(extent.max_height))
    };
    let Some(target) = target else {
        return Ok(img);
    };

    let (nw, nh) = scaled_dimensions(w, h, target);
    debug!(from_w = w, from_h = h, width = nw, height = nh, "Matching predominant extent");
    Ok(ops.enhance(ops.resize(img, nw, nh)?))
}

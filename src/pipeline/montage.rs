//! Grid montage of a homogenized batch.
//!
//! Cell geometry comes from the first tile's bounding box; the grid has the
//! requested column count and a white background. The composite is then
//! resized to the fixed collage width regardless of the tile sizes.

use crate::backend::{ImageHandle, ImageOps, MontageLayout};
use crate::error::ComposeError;
use crate::pipeline::resize::{resize, ResizeTarget};
use tracing::info;

/// Layout derived from the first tile, or `None` for an empty batch.
pub fn layout_for<O: ImageOps>(ops: &O, tiles: &[O::Image], columns: u32) -> Option<MontageLayout> {
    let first = tiles.first()?;
    Some(MontageLayout {
        tile: ops.bounding_box(first),
        columns,
        background: MontageLayout::WHITE,
    })
}

/// Compose `tiles` into one image `width` pixels wide, tagged with `quality`.
///
/// Returns `Ok(None)` for an empty batch.
pub fn compose<O: ImageOps>(
    ops: &O,
    tiles: &[O::Image],
    columns: u32,
    width: u32,
    quality: u8,
) -> Result<Option<O::Image>, ComposeError> {
    let Some(layout) = layout_for(ops, tiles, columns) else {
        return Ok(None);
    };
    let (grid_columns, rows) = layout.grid(tiles.len());
    info!(
        tiles = tiles.len(),
        columns = grid_columns,
        rows,
        tile_w = layout.tile.width,
        tile_h = layout.tile.height,
        "Composing montage"
    );

    let composite = ops.montage(tiles, &layout)?;
    let mut composite = resize(ops, composite, ResizeTarget::Width(width))?;
    composite.set_quality(quality);
    Ok(Some(composite))
}

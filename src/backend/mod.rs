//! Imaging backends.
//!
//! The composition algorithms in [`crate::pipeline`] never touch pixels
//! directly. They drive an [`ImageOps`] implementation, which owns decoding,
//! geometric transforms, enhancement passes, compositing and encoding. This
//! keeps homogenisation and montage layout testable against an in-memory
//! fake while the production path runs on [`raster::RasterOps`].
//!
//! ```text
//! bytes ──▶ decode / rasterize_pdf ──▶ rotate · resize · enhance ──▶ montage ──▶ encode
//!           (image / pdfium)            (image / imageproc)                      (image / lopdf)
//! ```

pub mod enhance;
pub mod pdf_writer;
pub mod pdfium;
pub mod raster;

use crate::config::ColorMode;
use crate::error::ComposeError;
use std::path::Path;

/// A decoded raster image owned by the operation that decoded it.
pub trait ImageHandle {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Lossy output quality hint (0–100), if one was assigned.
    fn quality(&self) -> Option<u8>;
    fn set_quality(&mut self, quality: u8);
}

/// A rectangle: size plus offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

impl Geometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            x: 0,
            y: 0,
        }
    }
}

/// Grid layout for [`ImageOps::montage`].
///
/// Every tile is fitted (aspect preserved) into a `tile.width × tile.height`
/// cell, centred, with `tile.x` / `tile.y` pixels of background on each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MontageLayout {
    pub tile: Geometry,
    pub columns: u32,
    pub background: [u8; 3],
}

impl MontageLayout {
    pub const WHITE: [u8; 3] = [255, 255, 255];

    /// `(columns, rows)` actually used for `count` tiles.
    pub fn grid(&self, count: usize) -> (u32, u32) {
        if count == 0 {
            return (0, 0);
        }
        let count = count as u32;
        let columns = self.columns.max(1).min(count);
        (columns, count.div_ceil(columns))
    }

    fn cell_size(&self) -> (u32, u32) {
        (
            self.tile.width + 2 * self.tile.x,
            self.tile.height + 2 * self.tile.y,
        )
    }

    /// Size of the composite canvas for `count` tiles.
    pub fn canvas_size(&self, count: usize) -> (u32, u32) {
        let (columns, rows) = self.grid(count);
        let (cell_w, cell_h) = self.cell_size();
        (columns * cell_w, rows * cell_h)
    }

    /// Size a `width × height` tile takes once fitted into its cell.
    pub fn fit(&self, width: u32, height: u32) -> (u32, u32) {
        if width == 0 || height == 0 {
            return (0, 0);
        }
        let scale = f64::min(
            self.tile.width as f64 / width as f64,
            self.tile.height as f64 / height as f64,
        );
        (
            ((width as f64 * scale).round() as u32).clamp(1, self.tile.width.max(1)),
            ((height as f64 * scale).round() as u32).clamp(1, self.tile.height.max(1)),
        )
    }

    /// Top-left corner of tile `index` (row-major) once fitted to
    /// `fitted_w × fitted_h`.
    pub fn placement(&self, index: usize, count: usize, fitted_w: u32, fitted_h: u32) -> (u32, u32) {
        let (columns, _) = self.grid(count);
        let (cell_w, cell_h) = self.cell_size();
        let col = index as u32 % columns.max(1);
        let row = index as u32 / columns.max(1);
        (
            col * cell_w + self.tile.x + (self.tile.width.saturating_sub(fitted_w)) / 2,
            row * cell_h + self.tile.y + (self.tile.height.saturating_sub(fitted_h)) / 2,
        )
    }
}

/// Rasterisation parameters for PDF sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterizeOptions {
    /// Dots per inch.
    pub density: u32,
    pub color_mode: ColorMode,
}

/// Encoded output format of a single image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Format for a file path, JPEG unless the extension is `.png`.
    pub fn from_path(path: &Path) -> Self {
        if crate::types::has_extension(path, "png") {
            Self::Png
        } else {
            Self::Jpeg
        }
    }
}

/// Capability interface over the imaging engine.
///
/// Transforms consume the image and return the result so that a batch is
/// always exclusively owned by the call that decoded it and dropped on every
/// exit path.
pub trait ImageOps {
    type Image: ImageHandle;

    /// Decode a raster image (`path` is used for error reporting only).
    fn decode(&self, path: &Path, bytes: &[u8]) -> Result<Self::Image, ComposeError>;

    /// Rasterise every page of a PDF, in page order.
    fn rasterize_pdf(
        &self,
        path: &Path,
        bytes: &[u8],
        options: &RasterizeOptions,
    ) -> Result<Vec<Self::Image>, ComposeError>;

    /// Rotate 90° clockwise.
    fn rotate90(&self, image: Self::Image) -> Self::Image;

    /// Resize to exactly `width × height`.
    ///
    /// Fails with [`ComposeError::ResourceLimitExceeded`] when the result
    /// would not fit the engine memory budget.
    fn resize(
        &self,
        image: Self::Image,
        width: u32,
        height: u32,
    ) -> Result<Self::Image, ComposeError>;

    /// Noise-reducing quality pass applied after an upscale.
    fn enhance(&self, image: Self::Image) -> Self::Image;

    /// Stretch the colour range to the full 0–255 scale.
    fn auto_level(&self, image: Self::Image) -> Self::Image;

    /// Gamma-correct so that mean brightness lands mid-scale.
    fn auto_gamma(&self, image: Self::Image) -> Self::Image;

    /// Drop embedded colour profiles.
    ///
    /// PDF pages come back from [`ImageOps::rasterize_pdf`] carrying the
    /// document's output-intent profile, if it has one; this removes it.
    fn strip(&self, image: Self::Image) -> Self::Image;

    /// Bounding box of the non-background content.
    fn bounding_box(&self, image: &Self::Image) -> Geometry;

    /// Tile `tiles` into a single image.
    fn montage(
        &self,
        tiles: &[Self::Image],
        layout: &MontageLayout,
    ) -> Result<Self::Image, ComposeError>;

    /// Encode a single image.
    fn encode_image(
        &self,
        image: &Self::Image,
        format: OutputFormat,
        path: &Path,
    ) -> Result<Vec<u8>, ComposeError>;

    /// Encode `pages` as one multi-page PDF, one image per page.
    fn encode_pdf(&self, pages: &[Self::Image], path: &Path) -> Result<Vec<u8>, ComposeError>;
}

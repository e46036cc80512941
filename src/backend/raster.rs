//! Production backend built on the `image` and `imageproc` crates, with
//! pdfium for PDF sources and `lopdf` for PDF output.

use crate::backend::enhance;
use crate::backend::pdf_writer::{self, JpegPage};
use crate::backend::pdfium::{output_intent_profile, PdfRasterizer};
use crate::backend::{
    Geometry, ImageHandle, ImageOps, MontageLayout, OutputFormat, RasterizeOptions,
};
use crate::error::ComposeError;
use crate::governor::ResourceGovernor;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder, ImageReader, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Quality used when an image reaches an encoder without one assigned.
pub const DEFAULT_QUALITY: u8 = 75;

/// A decoded image plus the attributes the encoders need.
#[derive(Debug, Clone)]
pub struct RasterImage {
    image: DynamicImage,
    quality: Option<u8>,
    icc_profile: Option<Vec<u8>>,
}

impl RasterImage {
    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self {
            image,
            quality: None,
            icc_profile: None,
        }
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the handle and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    pub fn icc_profile(&self) -> Option<&[u8]> {
        self.icc_profile.as_deref()
    }

    fn map(self, f: impl FnOnce(DynamicImage) -> DynamicImage) -> Self {
        Self {
            image: f(self.image),
            ..self
        }
    }
}

impl ImageHandle for RasterImage {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn quality(&self) -> Option<u8> {
        self.quality
    }

    fn set_quality(&mut self, quality: u8) {
        self.quality = Some(quality.min(100));
    }
}

/// [`ImageOps`] over real pixels.
#[derive(Debug, Clone)]
pub struct RasterOps {
    governor: ResourceGovernor,
    rasterizer: PdfRasterizer,
}

impl RasterOps {
    pub fn new(governor: ResourceGovernor, rasterizer: PdfRasterizer) -> Self {
        Self {
            governor,
            rasterizer,
        }
    }

    pub fn rasterizer(&self) -> &PdfRasterizer {
        &self.rasterizer
    }
}

impl ImageOps for RasterOps {
    type Image = RasterImage;

    #[instrument(skip(self, bytes), fields(path = %path.display(), len = bytes.len()))]
    fn decode(&self, path: &Path, bytes: &[u8]) -> Result<RasterImage, ComposeError> {
        let decode_err = |detail: String| ComposeError::DecodeFailed {
            path: path.to_path_buf(),
            detail,
        };

        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| decode_err(e.to_string()))?;
        reader.limits(self.governor.decode_limits());

        let mut decoder = reader
            .into_decoder()
            .map_err(|e| decode_err(e.to_string()))?;
        let icc_profile = decoder.icc_profile().ok().flatten();
        let image = DynamicImage::from_decoder(decoder).map_err(|e| decode_err(e.to_string()))?;

        debug!(
            width = image.width(),
            height = image.height(),
            "Image decoded"
        );
        Ok(RasterImage {
            image,
            quality: None,
            icc_profile,
        })
    }

    fn rasterize_pdf(
        &self,
        path: &Path,
        bytes: &[u8],
        options: &RasterizeOptions,
    ) -> Result<Vec<RasterImage>, ComposeError> {
        let pages = self
            .rasterizer
            .rasterize(path, bytes, options, &self.governor)?;
        let icc_profile = output_intent_profile(bytes);
        Ok(pages
            .into_iter()
            .map(|image| RasterImage {
                image,
                quality: None,
                icc_profile: icc_profile.clone(),
            })
            .collect())
    }

    fn rotate90(&self, image: RasterImage) -> RasterImage {
        debug!(from_w = image.width(), from_h = image.height(), "Rotating 90°");
        image.map(|img| img.rotate90())
    }

    fn resize(
        &self,
        image: RasterImage,
        width: u32,
        height: u32,
    ) -> Result<RasterImage, ComposeError> {
        if image.width() == width && image.height() == height {
            return Ok(image);
        }
        self.governor
            .check_allocation(width, height, image.image.color().bytes_per_pixel())?;
        debug!(
            from_w = image.width(),
            from_h = image.height(),
            width,
            height,
            "Resizing image"
        );
        Ok(image.map(|img| img.resize_exact(width.max(1), height.max(1), FilterType::Lanczos3)))
    }

    fn enhance(&self, image: RasterImage) -> RasterImage {
        image.map(enhance::enhance)
    }

    fn auto_level(&self, image: RasterImage) -> RasterImage {
        image.map(enhance::auto_level)
    }

    fn auto_gamma(&self, image: RasterImage) -> RasterImage {
        image.map(enhance::auto_gamma)
    }

    fn strip(&self, image: RasterImage) -> RasterImage {
        RasterImage {
            icc_profile: None,
            ..image
        }
    }

    fn bounding_box(&self, image: &RasterImage) -> Geometry {
        content_bounds(&image.image)
    }

    #[instrument(skip_all, fields(tiles = tiles.len(), columns = layout.columns))]
    fn montage(
        &self,
        tiles: &[RasterImage],
        layout: &MontageLayout,
    ) -> Result<RasterImage, ComposeError> {
        let (canvas_w, canvas_h) = layout.canvas_size(tiles.len());
        self.governor.check_allocation(canvas_w, canvas_h, 4)?;
        let [r, g, b] = layout.background;
        let mut canvas = RgbaImage::from_pixel(canvas_w, canvas_h, Rgba([r, g, b, 255]));

        for (idx, tile) in tiles.iter().enumerate() {
            let (fit_w, fit_h) = layout.fit(tile.width(), tile.height());
            let (x, y) = layout.placement(idx, tiles.len(), fit_w, fit_h);
            let fitted = if (fit_w, fit_h) == (tile.width(), tile.height()) {
                tile.image.to_rgba8()
            } else {
                imageops::resize(&tile.image.to_rgba8(), fit_w, fit_h, FilterType::Lanczos3)
            };
            imageops::overlay(&mut canvas, &fitted, x as i64, y as i64);
        }

        info!(width = canvas_w, height = canvas_h, "Montage composed");
        Ok(RasterImage::from_dynamic(DynamicImage::ImageRgba8(canvas)))
    }

    fn encode_image(
        &self,
        image: &RasterImage,
        format: OutputFormat,
        path: &Path,
    ) -> Result<Vec<u8>, ComposeError> {
        let encode_err = |detail: String| ComposeError::EncodeFailed {
            path: path.to_path_buf(),
            detail,
        };
        let mut buf = Vec::new();
        match format {
            OutputFormat::Jpeg => {
                let quality = image.quality.unwrap_or(DEFAULT_QUALITY);
                let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.max(1));
                if let Some(icc) = &image.icc_profile {
                    encoder.set_icc_profile(icc.clone()).ok();
                }
                let (data, color) = jpeg_samples(&image.image);
                encoder
                    .write_image(&data, image.width(), image.height(), color)
                    .map_err(|e| encode_err(e.to_string()))?;
            }
            OutputFormat::Png => {
                let mut encoder = PngEncoder::new(&mut buf);
                if let Some(icc) = &image.icc_profile {
                    encoder.set_icc_profile(icc.clone()).ok();
                }
                let rgba = image.image.to_rgba8();
                encoder
                    .write_image(rgba.as_raw(), image.width(), image.height(), ExtendedColorType::Rgba8)
                    .map_err(|e| encode_err(e.to_string()))?;
            }
        }
        debug!(bytes = buf.len(), ?format, "Image encoded");
        Ok(buf)
    }

    fn encode_pdf(&self, pages: &[RasterImage], path: &Path) -> Result<Vec<u8>, ComposeError> {
        let mut jpeg_pages = Vec::with_capacity(pages.len());
        for page in pages {
            let jpeg = self.encode_image(page, OutputFormat::Jpeg, path)?;
            jpeg_pages.push(JpegPage {
                jpeg,
                width: page.width(),
                height: page.height(),
                grayscale: !page.image.color().has_color(),
            });
        }
        pdf_writer::write_pdf(jpeg_pages).map_err(|detail| ComposeError::EncodeFailed {
            path: path.to_path_buf(),
            detail,
        })
    }
}

/// 8-bit samples JPEG can carry: luma for grey images, RGB otherwise.
fn jpeg_samples(image: &DynamicImage) -> (Vec<u8>, ExtendedColorType) {
    if image.color().has_color() {
        (image.to_rgb8().into_raw(), ExtendedColorType::Rgb8)
    } else {
        (image.to_luma8().into_raw(), ExtendedColorType::L8)
    }
}

/// Bounding box of the pixels that differ from the top-left corner colour.
/// A uniform image yields its full extent.
fn content_bounds(image: &DynamicImage) -> Geometry {
    let rgba = image.to_rgba8();
    let (w, h) = rgba.dimensions();
    if w == 0 || h == 0 {
        return Geometry::new(w, h);
    }
    let background = *rgba.get_pixel(0, 0);

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (w, h, 0, 0);
    for (x, y, p) in rgba.enumerate_pixels() {
        if *p != background {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if min_x > max_x || min_y > max_y {
        return Geometry::new(w, h);
    }
    Geometry {
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
        x: min_x,
        y: min_y,
    }
}

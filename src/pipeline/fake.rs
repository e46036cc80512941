//! In-memory [`ImageOps`] used by unit tests.
//!
//! Sources are plain text: an image file holds `WxH`, a PDF holds one
//! `WxH` per page separated by commas. Every transform is appended to the
//! image's `history`, and encoders emit a readable summary so assertions can
//! check page order without real pixels.

use crate::backend::{
    Geometry, ImageHandle, ImageOps, MontageLayout, OutputFormat, RasterizeOptions,
};
use crate::error::ComposeError;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct FakeImage {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub quality: Option<u8>,
    pub history: Vec<&'static str>,
}

impl FakeImage {
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            quality: None,
            history: Vec::new(),
        }
    }

    fn with(mut self, op: &'static str) -> Self {
        self.history.push(op);
        self
    }
}

impl ImageHandle for FakeImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn quality(&self) -> Option<u8> {
        self.quality
    }

    fn set_quality(&mut self, quality: u8) {
        self.quality = Some(quality);
    }
}

#[derive(Debug, Default)]
pub struct FakeOps;

fn parse_size(path: &Path, text: &str) -> Result<(u32, u32), ComposeError> {
    let bad = || ComposeError::DecodeFailed {
        path: path.to_path_buf(),
        detail: format!("not a WxH size: {text:?}"),
    };
    let (w, h) = text.trim().split_once('x').ok_or_else(bad)?;
    Ok((
        w.parse().map_err(|_| bad())?,
        h.parse().map_err(|_| bad())?,
    ))
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl ImageOps for FakeOps {
    type Image = FakeImage;

    fn decode(&self, path: &Path, bytes: &[u8]) -> Result<FakeImage, ComposeError> {
        let (w, h) = parse_size(path, &String::from_utf8_lossy(bytes))?;
        Ok(FakeImage::new(&stem(path), w, h))
    }

    fn rasterize_pdf(
        &self,
        path: &Path,
        bytes: &[u8],
        _options: &RasterizeOptions,
    ) -> Result<Vec<FakeImage>, ComposeError> {
        let text = String::from_utf8_lossy(bytes);
        text.split(',')
            .enumerate()
            .map(|(i, page)| {
                let (w, h) = parse_size(path, page)?;
                Ok(FakeImage::new(&format!("{}-p{}", stem(path), i + 1), w, h))
            })
            .collect()
    }

    fn rotate90(&self, image: FakeImage) -> FakeImage {
        let (w, h) = (image.width, image.height);
        FakeImage {
            width: h,
            height: w,
            ..image.with("rotate")
        }
    }

    fn resize(&self, image: FakeImage, width: u32, height: u32) -> Result<FakeImage, ComposeError> {
        Ok(FakeImage {
            width,
            height,
            ..image.with("resize")
        })
    }

    fn enhance(&self, image: FakeImage) -> FakeImage {
        image.with("enhance")
    }

    fn auto_level(&self, image: FakeImage) -> FakeImage {
        image.with("auto_level")
    }

    fn auto_gamma(&self, image: FakeImage) -> FakeImage {
        image.with("auto_gamma")
    }

    fn strip(&self, image: FakeImage) -> FakeImage {
        image.with("strip")
    }

    fn bounding_box(&self, image: &FakeImage) -> Geometry {
        Geometry::new(image.width, image.height)
    }

    fn montage(
        &self,
        tiles: &[FakeImage],
        layout: &MontageLayout,
    ) -> Result<FakeImage, ComposeError> {
        let (w, h) = layout.canvas_size(tiles.len());
        let names: Vec<&str> = tiles.iter().map(|t| t.name.as_str()).collect();
        Ok(FakeImage::new(&names.join("+"), w, h).with("montage"))
    }

    fn encode_image(
        &self,
        image: &FakeImage,
        format: OutputFormat,
        _path: &Path,
    ) -> Result<Vec<u8>, ComposeError> {
        Ok(format!(
            "{:?} {} {}x{} q{}",
            format,
            image.name,
            image.width,
            image.height,
            image.quality.unwrap_or(0)
        )
        .into_bytes())
    }

    fn encode_pdf(&self, pages: &[FakeImage], _path: &Path) -> Result<Vec<u8>, ComposeError> {
        let lines: Vec<String> = pages
            .iter()
            .map(|p| format!("{} {}x{}", p.name, p.width, p.height))
            .collect();
        Ok(lines.join("\n").into_bytes())
    }
}

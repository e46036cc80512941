//! PDF rasterisation: render every page to a `DynamicImage` via pdfium.
//!
//! ## Library discovery
//!
//! A rasterizer directory may be configured. It is used only when the
//! directory exists *and* holds the platform library
//! (`libpdfium.so` / `libpdfium.dylib` / `pdfium.dll`); otherwise the system
//! library is bound. Binding happens per call: a `Pdfium` instance owns the
//! loaded library and is released together with the rendered batch.
//!
//! ## Density
//!
//! PDF user space is 72 points per inch, so rendering at `density` DPI
//! scales each page by `density / 72`. Each page's projected bitmap size is
//! checked against the engine memory budget before pdfium renders it.
//!
//! ## Colour profile
//!
//! [`output_intent_profile`] reads the ICC profile a PDF declares in its
//! `/OutputIntents`. Rendered pages carry it until they are stripped.

use crate::backend::RasterizeOptions;
use crate::config::ColorMode;
use crate::error::ComposeError;
use crate::governor::ResourceGovernor;
use image::DynamicImage;
use lopdf::{Document, Object};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Binds pdfium and renders PDF pages.
#[derive(Debug, Clone, Default)]
pub struct PdfRasterizer {
    library_path: Option<PathBuf>,
}

impl PdfRasterizer {
    /// Resolve the library location from an optional rasterizer directory.
    pub fn new(rasterizer_directory: Option<&Path>) -> Self {
        let library_path = rasterizer_directory.and_then(|dir| {
            if !dir.is_dir() {
                warn!(dir = %dir.display(), "Rasterizer directory does not exist; using system pdfium");
                return None;
            }
            let lib = Pdfium::pdfium_platform_library_name_at_path(dir);
            if lib.is_file() {
                info!(library = %lib.display(), "Using pdfium from rasterizer directory");
                Some(lib)
            } else {
                warn!(library = %lib.display(), "pdfium library not found; using system pdfium");
                None
            }
        });
        Self { library_path }
    }

    /// Library file bound by this rasterizer, or `None` for the system library.
    pub fn library_path(&self) -> Option<&Path> {
        self.library_path.as_deref()
    }

    /// `true` when a pdfium library can be bound right now.
    pub fn is_available(&self) -> bool {
        self.bind().is_ok()
    }

    fn bind(&self) -> Result<Pdfium, ComposeError> {
        let bindings = match &self.library_path {
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| ComposeError::RasterizerUnavailable(e.to_string()))?;
        Ok(Pdfium::new(bindings))
    }

    /// Rasterise all pages of the PDF in `bytes`, in page order.
    pub fn rasterize(
        &self,
        path: &Path,
        bytes: &[u8],
        options: &RasterizeOptions,
        governor: &ResourceGovernor,
    ) -> Result<Vec<DynamicImage>, ComposeError> {
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| ComposeError::RasterisationFailed {
                path: path.to_path_buf(),
                page: 0,
                detail: format!("{:?}", e),
            })?;

        let pages = document.pages();
        info!(path = %path.display(), pages = pages.len(), "PDF loaded");

        let scale = options.density as f32 / 72.0;
        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);

        let mut results = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            // pdfium renders into a 4-byte BGRA bitmap.
            let (width, height) = projected_size(page.width().value, page.height().value, scale);
            governor.check_allocation(width, height, 4)?;

            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                ComposeError::RasterisationFailed {
                    path: path.to_path_buf(),
                    page: idx + 1,
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            let image = match options.color_mode {
                ColorMode::Grayscale => DynamicImage::ImageLuma8(image.to_luma8()),
                ColorMode::Color => image,
            };
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );
            results.push(image);
        }

        Ok(results)
    }
}

/// Pixel size of a `width_pt × height_pt` page rendered at `scale`.
fn projected_size(width_pt: f32, height_pt: f32, scale: f32) -> (u32, u32) {
    let px = |pt: f32| (pt * scale).round().max(1.0).min(u32::MAX as f32) as u32;
    (px(width_pt), px(height_pt))
}

/// ICC profile of the first `/OutputIntents` entry carrying a
/// `/DestOutputProfile`, if the document declares one.
pub fn output_intent_profile(bytes: &[u8]) -> Option<Vec<u8>> {
    let doc = Document::load_mem(bytes).ok()?;
    let intents = doc.catalog().ok()?.get(b"OutputIntents").ok()?;
    let (_, intents) = doc.dereference(intents).ok()?;

    intents.as_array().ok()?.iter().find_map(|intent| {
        let (_, intent) = doc.dereference(intent).ok()?;
        let profile = intent.as_dict().ok()?.get(b"DestOutputProfile").ok()?;
        match doc.dereference(profile).ok()? {
            (_, Object::Stream(stream)) if stream.dict.has(b"Filter") => {
                stream.decompressed_content().ok()
            }
            (_, Object::Stream(stream)) => Some(stream.content.clone()),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_directory_falls_back_to_system() {
        let r = PdfRasterizer::new(Some(Path::new("/definitely/not/here")));
        assert!(r.library_path().is_none());
    }

    #[test]
    fn directory_without_library_falls_back_to_system() {
        let dir = TempDir::new().unwrap();
        let r = PdfRasterizer::new(Some(dir.path()));
        assert!(r.library_path().is_none());
    }

    #[test]
    fn directory_with_library_is_used() {
        let dir = TempDir::new().unwrap();
        let lib = Pdfium::pdfium_platform_library_name_at_path(dir.path());
        std::fs::write(&lib, b"not really a library").unwrap();
        let r = PdfRasterizer::new(Some(dir.path()));
        assert_eq!(r.library_path(), Some(lib.as_path()));
        // A fake library file cannot be bound.
        assert!(!r.is_available());
    }

    #[test]
    fn projected_size_follows_density() {
        // US Letter at 150 DPI.
        assert_eq!(projected_size(612.0, 792.0, 150.0 / 72.0), (1275, 1650));
        assert_eq!(projected_size(0.0, 10.0, 1.0), (1, 10));
    }

    fn pdf_with_output_intent(profile: &[u8]) -> Vec<u8> {
        use lopdf::{dictionary, Stream};

        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 100.into(), 100.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let icc_id = doc.add_object(Stream::new(dictionary! { "N" => 3 }, profile.to_vec()));
        let intent_id = doc.add_object(dictionary! {
            "Type" => "OutputIntent",
            "S" => "GTS_PDFA1",
            "DestOutputProfile" => icc_id,
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "OutputIntents" => vec![intent_id.into()],
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn output_intent_profile_is_read() {
        let bytes = pdf_with_output_intent(b"fake icc profile");
        assert_eq!(
            output_intent_profile(&bytes).as_deref(),
            Some(&b"fake icc profile"[..])
        );
    }

    #[test]
    fn pdf_without_output_intent_has_no_profile() {
        let pages = vec![crate::backend::pdf_writer::JpegPage {
            jpeg: vec![0xFF, 0xD8, 0xFF, 0xD9],
            width: 10,
            height: 10,
            grayscale: true,
        }];
        let bytes = crate::backend::pdf_writer::write_pdf(pages).unwrap();
        assert!(output_intent_profile(&bytes).is_none());
        assert!(output_intent_profile(b"not a pdf").is_none());
    }
}

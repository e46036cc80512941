//! Configuration types for collage and PDF composition.
//!
//! Engine-wide behaviour lives in [`EngineConfig`], built via its
//! [`EngineConfigBuilder`] and validated once. Per-call output options live
//! in [`CollageSettings`] and [`PdfSettings`], which are validated at the top
//! of each composer entry point, before any file is decoded.

use crate::backend::OutputFormat;
use crate::error::ComposeError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Minimum accepted width for any width-based resize, in pixels.
pub const MIN_IMAGE_WIDTH: u32 = 600;

/// MIME type of every artifact produced by the document path.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Extensions (lowercase, no dot) that never take part in the collage or
/// resize paths. `.xml` sidecars are skipped everywhere; `.pdf` sources are
/// only handled by the document path.
pub const EXCLUDED_EXTENSIONS: [&str; 2] = ["xml", "pdf"];

/// Colour mode used when rasterising PDF pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Single-channel luma. (default)
    #[default]
    Grayscale,
    /// Keep the rendered RGB(A) pixels.
    Color,
}

/// Engine configuration shared by every composer call.
///
/// Built via [`EngineConfig::builder()`]; immutable afterwards.
///
/// # Example
/// ```rust
/// use edgequake_collage::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .collage_image_width(1200)
///     .collage_image_quality(80)
///     .collage_pdf_density(200)
///     .build()
///     .unwrap();
/// assert_eq!(config.collage_image_width, 1200);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Cap on decoder memory as a percentage of system memory. Default: 0.
    ///
    /// `0` leaves the engine default (half of system memory) untouched.
    /// Negative values are rejected by [`EngineConfigBuilder::build`].
    pub limit_memory_percentage: i32,

    /// Width every collage tile is normalised to, and the fixed width of the
    /// final collage. Also the default width of the resize operation.
    /// Default: 1200. Must be ≥ [`MIN_IMAGE_WIDTH`].
    pub collage_image_width: u32,

    /// Lossy output quality (0–100) for collage and PDF pages. Default: 75.
    pub collage_image_quality: u8,

    /// Rasterisation density in DPI for PDF sources. Default: 150.
    ///
    /// Higher values give sharper text at the cost of bigger pages.
    pub collage_pdf_density: u32,

    /// Colour mode of rasterised PDF pages. Default: [`ColorMode::Grayscale`].
    #[serde(default)]
    pub pdf_color_mode: ColorMode,

    /// Directory holding the platform pdfium library. Default: None.
    ///
    /// Used only when the directory exists and contains the expected library
    /// file; otherwise the system library is bound.
    #[serde(default)]
    pub rasterizer_directory: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            limit_memory_percentage: 0,
            collage_image_width: 1200,
            collage_image_quality: 75,
            collage_pdf_density: 150,
            pdf_color_mode: ColorMode::default(),
            rasterizer_directory: None,
        }
    }
}

impl EngineConfig {
    /// Create a new builder for `EngineConfig`.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Re-run the builder checks, e.g. on a config deserialised from JSON.
    pub fn validate(&self) -> Result<(), ComposeError> {
        if self.limit_memory_percentage < 0 {
            return Err(ComposeError::NegativeMemoryPercentage(
                self.limit_memory_percentage,
            ));
        }
        if self.collage_image_width < MIN_IMAGE_WIDTH {
            return Err(ComposeError::WidthBelowMinimum {
                name: "collage image width",
                width: self.collage_image_width,
                min: MIN_IMAGE_WIDTH,
            });
        }
        if self.collage_image_quality > 100 {
            return Err(ComposeError::InvalidConfig(format!(
                "Image quality must be 0–100, got {}",
                self.collage_image_quality
            )));
        }
        if self.collage_pdf_density == 0 {
            return Err(ComposeError::InvalidConfig(
                "PDF density must be ≥ 1 DPI".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn limit_memory_percentage(mut self, pct: i32) -> Self {
        self.config.limit_memory_percentage = pct;
        self
    }

    pub fn collage_image_width(mut self, width: u32) -> Self {
        self.config.collage_image_width = width;
        self
    }

    pub fn collage_image_quality(mut self, quality: u8) -> Self {
        self.config.collage_image_quality = quality;
        self
    }

    pub fn collage_pdf_density(mut self, dpi: u32) -> Self {
        self.config.collage_pdf_density = dpi;
        self
    }

    pub fn pdf_color_mode(mut self, mode: ColorMode) -> Self {
        self.config.pdf_color_mode = mode;
        self
    }

    pub fn rasterizer_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.rasterizer_directory = Some(dir.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<EngineConfig, ComposeError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ── Per-call settings ────────────────────────────────────────────────────

/// Output options for [`crate::Composer::create_collage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollageSettings {
    /// Tiles per row. Must be > 0.
    pub columns: u32,
    /// MIME type recorded on the descriptor; also selects the encoder
    /// (`image/jpeg` or `image/png`).
    pub mime_type: String,
    pub filename: String,
    pub output_folder: PathBuf,
    pub base_url: String,
}

impl CollageSettings {
    pub fn validate(&self) -> Result<(), ComposeError> {
        if self.columns == 0 {
            return Err(ComposeError::InvalidSettings(
                "Column count must be ≥ 1".into(),
            ));
        }
        if self.mime_type.trim().is_empty() {
            return Err(ComposeError::MissingArgument { name: "mime_type" });
        }
        if self.filename.trim().is_empty() {
            return Err(ComposeError::MissingArgument { name: "filename" });
        }
        if crate::types::is_blank(&self.output_folder) {
            return Err(ComposeError::MissingArgument {
                name: "output_folder",
            });
        }
        self.output_format()?;
        Ok(())
    }

    /// Encoder selected by [`CollageSettings::mime_type`].
    pub fn output_format(&self) -> Result<OutputFormat, ComposeError> {
        OutputFormat::from_mime(&self.mime_type).ok_or_else(|| {
            ComposeError::InvalidSettings(format!(
                "Unsupported collage MIME type '{}'",
                self.mime_type
            ))
        })
    }
}

/// Output options for [`crate::Composer::create_pdf`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfSettings {
    pub filename: String,
    pub output_folder: PathBuf,
    pub base_url: String,
    /// Common page width; [`MIN_IMAGE_WIDTH`] when absent.
    #[serde(default)]
    pub resize_document_width: Option<u32>,
}

impl PdfSettings {
    pub fn validate(&self) -> Result<(), ComposeError> {
        if self.filename.trim().is_empty() {
            return Err(ComposeError::MissingArgument { name: "filename" });
        }
        if crate::types::is_blank(&self.output_folder) {
            return Err(ComposeError::MissingArgument {
                name: "output_folder",
            });
        }
        if let Some(width) = self.resize_document_width {
            if width < MIN_IMAGE_WIDTH {
                return Err(ComposeError::WidthBelowMinimum {
                    name: "document width",
                    width,
                    min: MIN_IMAGE_WIDTH,
                });
            }
        }
        Ok(())
    }

    /// Width every page is resized to.
    pub fn effective_width(&self) -> u32 {
        self.resize_document_width.unwrap_or(MIN_IMAGE_WIDTH)
    }
}

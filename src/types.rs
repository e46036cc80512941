//! Input records for the collage, resize and document paths.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Orientation declared by the caller for a single input.
///
/// This is a *request*, not a measurement: the geometric orientation of the
/// decoded pixels is computed separately by
/// [`crate::pipeline::orientation::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationTag {
    Portrait,
    Landscape,
    /// Leave the image as decoded; never rotated.
    #[default]
    NotApplicable,
}

/// Geometric orientation derived from width vs. height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// `width >= height` (squares count as landscape).
    Landscape,
    /// `width < height`.
    Portrait,
}

/// One tile of a collage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollageImage {
    pub filename: PathBuf,
    #[serde(default)]
    pub orientation: OrientationTag,
}

impl CollageImage {
    pub fn new(filename: impl Into<PathBuf>, orientation: OrientationTag) -> Self {
        Self {
            filename: filename.into(),
            orientation,
        }
    }
}

/// One source of a composed PDF: an image (one page) or a PDF (all pages).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInput {
    pub filename: PathBuf,
    /// Ascending sort key; ties keep their input order.
    #[serde(default)]
    pub sort_priority: i32,
    #[serde(default)]
    pub orientation: OrientationTag,
}

impl DocumentInput {
    pub fn new(filename: impl Into<PathBuf>, sort_priority: i32, orientation: OrientationTag) -> Self {
        Self {
            filename: filename.into(),
            sort_priority,
            orientation,
        }
    }

    /// `true` when the source has a `.pdf` extension (case-insensitive).
    pub fn is_pdf(&self) -> bool {
        has_extension(&self.filename, "pdf")
    }
}

/// A file hosted under a public base URL. Rewritten in place by
/// [`crate::Composer::resize_media_files`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedFile {
    pub filename: PathBuf,
    #[serde(default)]
    pub url: Option<String>,
}

impl HostedFile {
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            url: None,
        }
    }
}

/// Case-insensitive extension comparison; `ext` is given without the dot.
pub(crate) fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// `true` for a path that is empty or only whitespace.
pub(crate) fn is_blank(path: &Path) -> bool {
    path.as_os_str().to_string_lossy().trim().is_empty()
}

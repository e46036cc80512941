//! # edgequake-collage
//!
//! Compose grid collages and multi-page PDFs from mixed image and PDF
//! sources.
//!
//! ## Pipeline Overview
//!
//! ```text
//! collage:   images ─▶ orient ─▶ resize (width) ─▶ homogenize ─▶ montage ─▶ resize ─▶ JPEG/PNG
//! document:  images ─▶ orient ─▶ resize (width) ──┐
//!            PDFs ───▶ rasterise (pdfium) ─▶ strip ─▶ resize (width) ─▶ PDF (lopdf)
//! resize:    images ─▶ resize (longest side) ─▶ {stem}_resized.{ext}
//! ```
//!
//! Every image passes through [`pipeline::orientation`] and
//! [`pipeline::resize`] before aggregation. A width below
//! [`MIN_IMAGE_WIDTH`] (600 px) is always rejected.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_collage::{
//!     CollageImage, CollageSettings, Composer, EngineConfig, OrientationTag,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let composer = Composer::new(EngineConfig::default())?;
//!     let images = vec![
//!         CollageImage::new("a.jpg", OrientationTag::Landscape),
//!         CollageImage::new("b.jpg", OrientationTag::Portrait),
//!     ];
//!     let settings = CollageSettings {
//!         columns: 2,
//!         mime_type: "image/jpeg".into(),
//!         filename: "collage.jpg".into(),
//!         output_folder: "out".into(),
//!         base_url: "https://cdn.example.com/media".into(),
//!     };
//!     match composer.create_collage(&images, &settings)? {
//!         Some(media) => println!("{}", media.url),
//!         None => eprintln!("nothing to compose"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `collage` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-collage = { version = "0.1", default-features = false }
//! ```
//!
//! ## PDF sources
//!
//! PDF pages are rasterised with pdfium. Point
//! [`EngineConfig::rasterizer_directory`] at a folder holding the platform
//! library, or install it where the system loader finds it.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod compose;
pub mod config;
pub mod error;
pub mod fs;
pub mod governor;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod types;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{ImageHandle, ImageOps};
pub use compose::Composer;
pub use config::{
    CollageSettings, ColorMode, EngineConfig, EngineConfigBuilder, PdfSettings, MIN_IMAGE_WIDTH,
    PDF_MIME_TYPE,
};
pub use error::{ComposeError, ErrorKind};
pub use fs::{FileSystem, LocalFileSystem};
pub use governor::ResourceGovernor;
pub use output::MediaDescriptor;
pub use progress::{BatchKind, ComposeProgressCallback, NoopProgressCallback, ProgressCallback};
pub use types::{CollageImage, DocumentInput, HostedFile, Orientation, OrientationTag};

//! Composer entry points: collage, batch resize and PDF document.
//!
//! Every entry point follows the same order:
//!
//! 1. validate arguments and settings (contract errors, no I/O),
//! 2. filter out excluded extensions,
//! 3. return `None` for an empty batch,
//! 4. check the output folder, then read and decode sources in input order,
//! 5. encode and write the artifact atomically.
//!
//! A source that cannot be read or decoded fails the whole call before
//! anything is written.

use crate::backend::pdfium::PdfRasterizer;
use crate::backend::raster::RasterOps;
use crate::backend::{ImageHandle, ImageOps, OutputFormat, RasterizeOptions};
use crate::config::{CollageSettings, EngineConfig, PdfSettings, EXCLUDED_EXTENSIONS, PDF_MIME_TYPE};
use crate::error::ComposeError;
use crate::fs::{FileSystem, LocalFileSystem};
use crate::governor::ResourceGovernor;
use crate::output::{join_url, MediaDescriptor};
use crate::pipeline::resize::{check_width, resize, resize_by_orientation, ResizeTarget};
use crate::pipeline::{homogenize, montage, orientation};
use crate::progress::{BatchKind, NoopProgressCallback, ProgressCallback};
use crate::types::{has_extension, is_blank, CollageImage, DocumentInput, HostedFile};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Composes collages and PDF documents.
///
/// Generic over the imaging backend and file system so the algorithms can
/// run against in-memory fakes; [`Composer::new`] wires the production
/// [`RasterOps`] and [`LocalFileSystem`].
pub struct Composer<O: ImageOps = RasterOps, F: FileSystem = LocalFileSystem> {
    config: EngineConfig,
    governor: ResourceGovernor,
    ops: O,
    fs: F,
    progress: ProgressCallback,
}

impl Composer {
    /// Validate `config`, install the memory cap and bind the production
    /// backend.
    ///
    /// Installing the memory cap is a process-wide side effect; construct
    /// composers from one thread when they carry different percentages.
    pub fn new(config: EngineConfig) -> Result<Self, ComposeError> {
        let governor = ResourceGovernor::new(&config)?;
        let rasterizer = PdfRasterizer::new(config.rasterizer_directory.as_deref());
        let ops = RasterOps::new(governor.clone(), rasterizer);
        Self::with_parts(config, governor, ops, LocalFileSystem)
    }
}

impl<O: ImageOps, F: FileSystem> Composer<O, F> {
    /// Assemble a composer from explicit collaborators.
    pub fn with_parts(
        config: EngineConfig,
        governor: ResourceGovernor,
        ops: O,
        fs: F,
    ) -> Result<Self, ComposeError> {
        config.validate()?;
        Ok(Self {
            config,
            governor,
            ops,
            fs,
            progress: Arc::new(NoopProgressCallback),
        })
    }

    /// Attach a progress callback.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn governor(&self) -> &ResourceGovernor {
        &self.governor
    }

    pub fn ops(&self) -> &O {
        &self.ops
    }

    /// Build a grid collage from `images`.
    ///
    /// Each tile is loaded, orientation-corrected against its declared tag
    /// and resized to the configured collage width; the batch is then
    /// homogenized and tiled into `settings.columns` columns on white. The
    /// composite is resized to the collage width and written to
    /// `settings.output_folder / settings.filename`.
    ///
    /// Returns `Ok(None)` when no tile is left after filtering out `.xml`
    /// and `.pdf` sources.
    pub fn create_collage(
        &self,
        images: &[CollageImage],
        settings: &CollageSettings,
    ) -> Result<Option<MediaDescriptor>, ComposeError> {
        // ── Step 1: Validate ─────────────────────────────────────────────
        if images.iter().any(|i| is_blank(&i.filename)) {
            return Err(ComposeError::EmptyFilename {
                name: "collage_images",
            });
        }
        settings.validate()?;
        let format = settings.output_format()?;
        let width = self.config.collage_image_width;

        // ── Step 2: Filter ───────────────────────────────────────────────
        let sources: Vec<&CollageImage> = images
            .iter()
            .filter(|i| !is_excluded(&i.filename))
            .collect();
        info!(
            inputs = images.len(),
            tiles = sources.len(),
            columns = settings.columns,
            "Creating collage"
        );
        if sources.is_empty() {
            self.progress.on_batch_complete(BatchKind::Collage, None);
            return Ok(None);
        }
        self.require_folder(&settings.output_folder)?;
        self.progress.on_batch_start(BatchKind::Collage, sources.len());

        // ── Step 3: Load, orient, normalise width ────────────────────────
        let mut tiles = Vec::with_capacity(sources.len());
        for (idx, source) in sources.iter().enumerate() {
            let image = self.load(&source.filename)?;
            let image = orientation::correct(&self.ops, image, source.orientation);
            // Every declared tag normalises by width here, portrait and
            // untagged tiles included.
            let image = resize(&self.ops, image, ResizeTarget::Width(width))?;
            tiles.push(image);
            self.progress
                .on_item_complete(idx + 1, sources.len(), &source.filename);
        }

        // ── Step 4: Homogenize and compose ───────────────────────────────
        let tiles = homogenize::homogenize(&self.ops, tiles)?;
        let Some(collage) = montage::compose(
            &self.ops,
            &tiles,
            settings.columns,
            width,
            self.config.collage_image_quality,
        )?
        else {
            self.progress.on_batch_complete(BatchKind::Collage, None);
            return Ok(None);
        };
        drop(tiles);

        // ── Step 5: Write ────────────────────────────────────────────────
        let target = settings.output_folder.join(&settings.filename);
        let bytes = self.ops.encode_image(&collage, format, &target)?;
        self.fs.write_atomic(&target, &bytes)?;
        info!(
            path = %target.display(),
            width = collage.width(),
            height = collage.height(),
            bytes = bytes.len(),
            "Collage written"
        );
        self.progress
            .on_batch_complete(BatchKind::Collage, Some(&target));

        Ok(Some(MediaDescriptor::new(
            &settings.mime_type,
            &settings.output_folder,
            &settings.filename,
            &settings.base_url,
        )))
    }

    /// Write a resized copy of every hosted image and point the records at
    /// the copies.
    ///
    /// Every copy is encoded in memory before the first one is written, so a
    /// source that fails to load leaves `output_folder` untouched.
    ///
    /// Landscape images are resized by width, portrait images by height, to
    /// `width` or the configured collage width. Each copy is named
    /// `{stem}_resized.{ext}`, made unique within `output_folder`, and the
    /// record's URL becomes `{base_url}/{name}`. Records with excluded
    /// extensions pass through unchanged. Input order is preserved.
    pub fn resize_media_files(
        &self,
        files: Vec<HostedFile>,
        output_folder: &Path,
        base_url: &str,
        width: Option<u32>,
    ) -> Result<Vec<HostedFile>, ComposeError> {
        if files.iter().any(|f| is_blank(&f.filename)) {
            return Err(ComposeError::EmptyFilename {
                name: "media_files",
            });
        }
        if is_blank(output_folder) {
            return Err(ComposeError::MissingArgument {
                name: "output_folder",
            });
        }
        self.require_folder(output_folder)?;
        if let Some(w) = width {
            check_width("resize width", w)?;
        }
        let width = width.unwrap_or(self.config.collage_image_width);

        let total = files.len();
        info!(files = total, width, "Resizing media files");
        self.progress.on_batch_start(BatchKind::Resize, total);

        // ── Encode every copy before writing any ─────────────────────────
        let mut encoded: Vec<(HostedFile, Option<Vec<u8>>)> = Vec::with_capacity(total);
        for (idx, file) in files.into_iter().enumerate() {
            if is_excluded(&file.filename) {
                debug!(path = %file.filename.display(), "Excluded from resize");
                encoded.push((file, None));
                continue;
            }

            let image = self.load(&file.filename)?;
            let mut image = resize_by_orientation(&self.ops, image, width)?;
            image.set_quality(self.config.collage_image_quality);
            let bytes = self.ops.encode_image(
                &image,
                OutputFormat::from_path(&file.filename),
                &file.filename,
            )?;
            self.progress.on_item_complete(idx + 1, total, &file.filename);
            encoded.push((file, Some(bytes)));
        }

        // ── Write ────────────────────────────────────────────────────────
        let mut written: Vec<std::path::PathBuf> = Vec::new();
        let mut resized = Vec::with_capacity(total);
        for (mut file, bytes) in encoded {
            let Some(bytes) = bytes else {
                resized.push(file);
                continue;
            };
            let name = self
                .fs
                .unique_name(output_folder, &resized_name(&file.filename));
            let target = output_folder.join(&name);
            if let Err(e) = self.fs.write_atomic(&target, &bytes) {
                for path in &written {
                    self.fs.remove(path);
                }
                return Err(e);
            }
            debug!(
                from = %file.filename.display(),
                to = %target.display(),
                "Resized copy written"
            );
            written.push(target.clone());

            file.filename = target;
            file.url = Some(join_url(base_url, &name));
            resized.push(file);
        }

        self.progress.on_batch_complete(BatchKind::Resize, None);
        Ok(resized)
    }

    /// Assemble a multi-page PDF from images and PDFs.
    ///
    /// `.xml` sources are skipped and the rest are processed in ascending
    /// `sort_priority` (ties keep input order). PDF sources contribute every
    /// page, rasterised at the configured density and colour mode with
    /// profiles stripped; image sources are orientation-corrected against
    /// their declared tag and contribute one page. Every page is resized to
    /// [`PdfSettings::effective_width`] and tagged with the configured
    /// quality.
    ///
    /// Returns `Ok(None)` when there is nothing to render.
    pub fn create_pdf(
        &self,
        inputs: &[DocumentInput],
        settings: &PdfSettings,
    ) -> Result<Option<MediaDescriptor>, ComposeError> {
        // ── Step 1: Validate ─────────────────────────────────────────────
        if inputs.iter().any(|i| is_blank(&i.filename)) {
            return Err(ComposeError::EmptyFilename {
                name: "document_inputs",
            });
        }
        settings.validate()?;
        let width = settings.effective_width();
        let quality = self.config.collage_image_quality;

        // ── Step 2: Filter and order ─────────────────────────────────────
        let mut sources: Vec<&DocumentInput> = inputs
            .iter()
            .filter(|i| !has_extension(&i.filename, "xml"))
            .collect();
        sources.sort_by_key(|i| i.sort_priority);
        info!(inputs = inputs.len(), sources = sources.len(), width, "Creating PDF");
        if sources.is_empty() {
            self.progress.on_batch_complete(BatchKind::Document, None);
            return Ok(None);
        }
        self.require_folder(&settings.output_folder)?;
        self.progress
            .on_batch_start(BatchKind::Document, sources.len());

        // ── Step 3: Collect pages ────────────────────────────────────────
        let options = RasterizeOptions {
            density: self.config.collage_pdf_density,
            color_mode: self.config.pdf_color_mode,
        };
        let mut pages = Vec::new();
        for (idx, source) in sources.iter().enumerate() {
            let bytes = self.fs.read_all_bytes(&source.filename)?;
            if source.is_pdf() {
                let rendered = self.ops.rasterize_pdf(&source.filename, &bytes, &options)?;
                debug!(path = %source.filename.display(), pages = rendered.len(), "PDF source rasterised");
                for page in rendered {
                    let page = self.ops.strip(page);
                    let mut page = resize(&self.ops, page, ResizeTarget::Width(width))?;
                    page.set_quality(quality);
                    pages.push(page);
                }
            } else {
                let image = self.ops.decode(&source.filename, &bytes)?;
                let image = orientation::correct(&self.ops, image, source.orientation);
                let mut image = resize(&self.ops, image, ResizeTarget::Width(width))?;
                image.set_quality(quality);
                pages.push(image);
            }
            self.progress
                .on_item_complete(idx + 1, sources.len(), &source.filename);
        }

        if pages.is_empty() {
            self.progress.on_batch_complete(BatchKind::Document, None);
            return Ok(None);
        }

        // ── Step 4: Write ────────────────────────────────────────────────
        let target = settings.output_folder.join(&settings.filename);
        let bytes = self.ops.encode_pdf(&pages, &target)?;
        self.fs.write_atomic(&target, &bytes)?;
        info!(
            path = %target.display(),
            pages = pages.len(),
            bytes = bytes.len(),
            "PDF written"
        );
        self.progress
            .on_batch_complete(BatchKind::Document, Some(&target));

        Ok(Some(MediaDescriptor::new(
            PDF_MIME_TYPE,
            &settings.output_folder,
            &settings.filename,
            &settings.base_url,
        )))
    }

    fn require_folder(&self, folder: &Path) -> Result<(), ComposeError> {
        if self.fs.dir_exists(folder) {
            Ok(())
        } else {
            Err(ComposeError::OutputFolderNotFound {
                path: folder.to_path_buf(),
            })
        }
    }

    fn load(&self, path: &Path) -> Result<O::Image, ComposeError> {
        let bytes = self.fs.read_all_bytes(path)?;
        self.ops.decode(path, &bytes)
    }
}

/// `true` for `.xml` and `.pdf` sources (case-insensitive).
fn is_excluded(path: &Path) -> bool {
    EXCLUDED_EXTENSIONS
        .iter()
        .any(|ext| has_extension(path, ext))
}

/// `photo.JPG` → `photo_resized.JPG`.
fn resized_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => format!("{stem}_resized.{}", ext.to_string_lossy()),
        None => format!("{stem}_resized"),
    }
}

impl<O: ImageOps, F: FileSystem> std::fmt::Debug for Composer<O, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("config", &self.config)
            .field("governor", &self.governor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pipeline::fake::FakeOps;
    use crate::progress::ComposeProgressCallback;
    use crate::types::OrientationTag;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn composer() -> Composer<FakeOps> {
        let governor = ResourceGovernor::with_system_memory(0, 1 << 30).unwrap();
        Composer::with_parts(EngineConfig::default(), governor, FakeOps, LocalFileSystem).unwrap()
    }

    /// Write a fake source holding its own size, e.g. `"1600x1200"`.
    fn source(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn collage_settings(dir: &Path) -> CollageSettings {
        CollageSettings {
            columns: 2,
            mime_type: "image/jpeg".into(),
            filename: "collage.jpg".into(),
            output_folder: dir.to_path_buf(),
            base_url: "https://cdn.example.com/m".into(),
        }
    }

    fn pdf_settings(dir: &Path) -> PdfSettings {
        PdfSettings {
            filename: "doc.pdf".into(),
            output_folder: dir.to_path_buf(),
            base_url: "https://cdn.example.com/m/".into(),
            resize_document_width: None,
        }
    }

    #[test]
    fn collage_of_four_landscape_and_one_portrait() {
        let dir = TempDir::new().unwrap();
        let mut images: Vec<CollageImage> = (0..4)
            .map(|i| {
                CollageImage::new(
                    source(dir.path(), &format!("l{i}.jpg"), "1600x1200"),
                    OrientationTag::Landscape,
                )
            })
            .collect();
        images.push(CollageImage::new(
            source(dir.path(), "p.jpg", "900x1600"),
            OrientationTag::Portrait,
        ));

        let media = composer()
            .create_collage(&images, &collage_settings(dir.path()))
            .unwrap()
            .expect("collage produced");

        assert_eq!(media.mime_type, "image/jpeg");
        assert_eq!(media.filename, dir.path().join("collage.jpg"));
        assert_eq!(media.url, "https://cdn.example.com/m/collage.jpg");
        // 2 × 3 grid of 1200 × 900 cells, scaled to the 1200 collage width.
        let written = std::fs::read_to_string(dir.path().join("collage.jpg")).unwrap();
        assert_eq!(written, "Jpeg l0+l1+l2+l3+p 1200x1350 q75");
    }

    #[test]
    fn collage_skips_excluded_extensions() {
        let dir = TempDir::new().unwrap();
        let images = vec![
            CollageImage::new(source(dir.path(), "a.jpg", "1600x1200"), OrientationTag::NotApplicable),
            CollageImage::new(source(dir.path(), "meta.XML", "<x/>"), OrientationTag::NotApplicable),
            CollageImage::new(source(dir.path(), "scan.pdf", "%PDF"), OrientationTag::NotApplicable),
        ];
        composer()
            .create_collage(&images, &collage_settings(dir.path()))
            .unwrap()
            .unwrap();
        let written = std::fs::read_to_string(dir.path().join("collage.jpg")).unwrap();
        assert!(written.starts_with("Jpeg a "), "got {written}");
    }

    #[test]
    fn collage_of_only_excluded_files_is_none() {
        let dir = TempDir::new().unwrap();
        let images = vec![
            CollageImage::new("a.xml", OrientationTag::NotApplicable),
            CollageImage::new("b.pdf", OrientationTag::Portrait),
        ];
        let out = composer()
            .create_collage(&images, &collage_settings(dir.path()))
            .unwrap();
        assert!(out.is_none());
        assert!(!dir.path().join("collage.jpg").exists());
    }

    #[test]
    fn empty_inputs_produce_no_artifact() {
        let dir = TempDir::new().unwrap();
        let c = composer();
        assert!(c.create_collage(&[], &collage_settings(dir.path())).unwrap().is_none());
        assert!(c.create_pdf(&[], &pdf_settings(dir.path())).unwrap().is_none());
    }

    #[test]
    fn pdf_of_only_xml_inputs_is_none() {
        let dir = TempDir::new().unwrap();
        let inputs = vec![
            DocumentInput::new("meta.xml", 0, OrientationTag::NotApplicable),
            DocumentInput::new("other.XML", 1, OrientationTag::Portrait),
        ];
        // The output folder is never consulted for an empty batch.
        let settings = pdf_settings(&dir.path().join("missing"));
        let out = composer().create_pdf(&inputs, &settings).unwrap();
        assert!(out.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn collage_contract_errors_come_before_io() {
        let c = composer();
        let settings = CollageSettings {
            columns: 0,
            ..collage_settings(Path::new("/definitely/missing"))
        };
        let err = c
            .create_collage(&[CollageImage::new("nope.jpg", OrientationTag::Portrait)], &settings)
            .unwrap_err();
        assert!(matches!(err, ComposeError::InvalidSettings(_)));

        let err = c
            .create_collage(
                &[CollageImage::new(" ", OrientationTag::Portrait)],
                &collage_settings(Path::new("/tmp")),
            )
            .unwrap_err();
        assert!(matches!(err, ComposeError::EmptyFilename { .. }));
    }

    #[test]
    fn collage_into_missing_folder_fails() {
        let dir = TempDir::new().unwrap();
        let images = vec![CollageImage::new(
            source(dir.path(), "a.jpg", "1600x1200"),
            OrientationTag::Landscape,
        )];
        let err = composer()
            .create_collage(&images, &collage_settings(&dir.path().join("missing")))
            .unwrap_err();
        assert!(matches!(err, ComposeError::OutputFolderNotFound { .. }));
        assert_eq!(err.kind(), ErrorKind::Resource);
    }

    #[test]
    fn corrupt_tile_fails_whole_collage() {
        let dir = TempDir::new().unwrap();
        let images = vec![
            CollageImage::new(source(dir.path(), "a.jpg", "1600x1200"), OrientationTag::Landscape),
            CollageImage::new(source(dir.path(), "b.jpg", "garbage"), OrientationTag::Landscape),
        ];
        let err = composer()
            .create_collage(&images, &collage_settings(dir.path()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Processing);
        assert!(!dir.path().join("collage.jpg").exists());
    }

    #[test]
    fn pdf_pages_follow_sort_priority() {
        let dir = TempDir::new().unwrap();
        let inputs = vec![
            DocumentInput::new(
                source(dir.path(), "scan.pdf", "1200x1600,1200x1600"),
                2,
                OrientationTag::NotApplicable,
            ),
            DocumentInput::new(
                source(dir.path(), "photo.jpg", "1600x1200"),
                1,
                OrientationTag::Landscape,
            ),
            DocumentInput::new("sidecar.xml", 0, OrientationTag::NotApplicable),
        ];
        let media = composer()
            .create_pdf(&inputs, &pdf_settings(dir.path()))
            .unwrap()
            .unwrap();

        assert_eq!(media.mime_type, "application/pdf");
        assert_eq!(media.url, "https://cdn.example.com/m/doc.pdf");
        let written = std::fs::read_to_string(dir.path().join("doc.pdf")).unwrap();
        let pages: Vec<&str> = written.lines().collect();
        assert_eq!(pages, vec!["photo 600x450", "scan-p1 600x800", "scan-p2 600x800"]);
    }

    #[test]
    fn pdf_equal_priorities_keep_input_order() {
        let dir = TempDir::new().unwrap();
        let inputs: Vec<DocumentInput> = ["c", "a", "b"]
            .iter()
            .map(|n| {
                DocumentInput::new(
                    source(dir.path(), &format!("{n}.png"), "800x600"),
                    5,
                    OrientationTag::NotApplicable,
                )
            })
            .collect();
        composer().create_pdf(&inputs, &pdf_settings(dir.path())).unwrap();
        let written = std::fs::read_to_string(dir.path().join("doc.pdf")).unwrap();
        let names: Vec<&str> = written.lines().map(|l| &l[..1]).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn pdf_image_pages_are_orientation_corrected() {
        let dir = TempDir::new().unwrap();
        let inputs = vec![DocumentInput::new(
            source(dir.path(), "wide.jpg", "1600x1200"),
            0,
            OrientationTag::Portrait,
        )];
        let settings = PdfSettings {
            resize_document_width: Some(900),
            ..pdf_settings(dir.path())
        };
        composer().create_pdf(&inputs, &settings).unwrap();
        let written = std::fs::read_to_string(dir.path().join("doc.pdf")).unwrap();
        assert_eq!(written, "wide 900x1200");
    }

    #[test]
    fn pdf_width_below_floor_is_rejected() {
        let dir = TempDir::new().unwrap();
        let settings = PdfSettings {
            resize_document_width: Some(599),
            ..pdf_settings(dir.path())
        };
        let err = composer()
            .create_pdf(&[DocumentInput::new("a.jpg", 0, OrientationTag::Portrait)], &settings)
            .unwrap_err();
        assert!(matches!(err, ComposeError::WidthBelowMinimum { width: 599, .. }));
    }

    #[test]
    fn resize_media_files_rewrites_records() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        std::fs::write(out.join("wide_resized.jpg"), "taken").unwrap();

        let files = vec![
            HostedFile::new(source(dir.path(), "wide.jpg", "2400x1200")),
            HostedFile::new(source(dir.path(), "notes.xml", "<x/>")),
            HostedFile::new(source(dir.path(), "tall.png", "1000x2000")),
        ];
        let resized = composer()
            .resize_media_files(files, &out, "https://h/m", Some(800))
            .unwrap();

        assert_eq!(resized[0].filename, out.join("wide_resized(1).jpg"));
        assert_eq!(resized[0].url.as_deref(), Some("https://h/m/wide_resized(1).jpg"));
        assert_eq!(
            std::fs::read_to_string(&resized[0].filename).unwrap(),
            "Jpeg wide 800x400 q75"
        );

        assert_eq!(resized[1].filename, dir.path().join("notes.xml"));
        assert!(resized[1].url.is_none());

        assert_eq!(resized[2].filename, out.join("tall_resized.png"));
        assert_eq!(
            std::fs::read_to_string(&resized[2].filename).unwrap(),
            "Png tall 400x800 q75"
        );
    }

    #[test]
    fn failed_resize_batch_writes_no_copies() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        let files = vec![
            HostedFile::new(source(dir.path(), "a.jpg", "1600x1200")),
            HostedFile::new(source(dir.path(), "b.jpg", "garbage")),
        ];
        let err = composer()
            .resize_media_files(files, &out, "https://h/m", None)
            .unwrap_err();
        assert!(matches!(err, ComposeError::DecodeFailed { .. }));
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn resize_copies_with_same_stem_get_distinct_names() {
        let dir = TempDir::new().unwrap();
        let (a, b, out) = (dir.path().join("a"), dir.path().join("b"), dir.path().join("out"));
        for d in [&a, &b, &out] {
            std::fs::create_dir(d).unwrap();
        }
        let files = vec![
            HostedFile::new(source(&a, "photo.jpg", "1600x1200")),
            HostedFile::new(source(&b, "photo.jpg", "1200x1600")),
        ];
        let resized = composer()
            .resize_media_files(files, &out, "https://h/m", None)
            .unwrap();
        assert_eq!(resized[0].filename, out.join("photo_resized.jpg"));
        assert_eq!(resized[1].filename, out.join("photo_resized(1).jpg"));
    }

    #[test]
    fn resize_media_files_validates_before_reading() {
        let dir = TempDir::new().unwrap();
        let c = composer();
        let files = vec![HostedFile::new("missing.jpg")];

        let err = c
            .resize_media_files(files.clone(), dir.path(), "u", Some(500))
            .unwrap_err();
        assert!(matches!(err, ComposeError::WidthBelowMinimum { width: 500, .. }));

        let err = c
            .resize_media_files(files, &dir.path().join("nope"), "u", None)
            .unwrap_err();
        assert!(matches!(err, ComposeError::OutputFolderNotFound { .. }));
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl ComposeProgressCallback for Recorder {
        fn on_batch_start(&self, kind: BatchKind, total: usize) {
            self.0.lock().unwrap().push(format!("start {kind:?} {total}"));
        }

        fn on_item_complete(&self, index: usize, total: usize, _source: &Path) {
            self.0.lock().unwrap().push(format!("item {index}/{total}"));
        }

        fn on_batch_complete(&self, kind: BatchKind, output: Option<&Path>) {
            self.0
                .lock()
                .unwrap()
                .push(format!("done {kind:?} {}", output.is_some()));
        }
    }

    #[test]
    fn progress_events_follow_the_batch() {
        let dir = TempDir::new().unwrap();
        let recorder = Arc::new(Recorder::default());
        let c = composer().with_progress(recorder.clone());
        let inputs = vec![
            DocumentInput::new(source(dir.path(), "a.jpg", "800x600"), 0, OrientationTag::NotApplicable),
            DocumentInput::new(source(dir.path(), "b.jpg", "800x600"), 1, OrientationTag::NotApplicable),
        ];
        c.create_pdf(&inputs, &pdf_settings(dir.path())).unwrap();
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![
                "start Document 2",
                "item 1/2",
                "item 2/2",
                "done Document true"
            ]
        );
    }

    #[test]
    fn resized_names() {
        assert_eq!(resized_name(Path::new("/a/photo.JPG")), "photo_resized.JPG");
        assert_eq!(resized_name(Path::new("noext")), "noext_resized");
    }
}

//! CLI binary for edgequake-collage.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `EngineConfig` / per-call settings and prints the produced descriptor.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_collage::{
    BatchKind, CollageImage, CollageSettings, ColorMode, ComposeProgressCallback, Composer,
    DocumentInput, EngineConfig, HostedFile, MediaDescriptor, OrientationTag, PdfSettings,
    ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Renders a progress bar over the sources of one batch.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    /// The bar stays undrawn until a batch starts, so runs that return
    /// before reading any source print nothing.
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: ProgressBar::new(0),
        })
    }
}

impl ComposeProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, kind: BatchKind, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        self.bar.set_length(total as u64);
        self.bar.set_style(style);
        self.bar.set_prefix(match kind {
            BatchKind::Collage => "Collage",
            BatchKind::Resize => "Resize",
            BatchKind::Document => "Document",
        });
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_item_complete(&self, _index: usize, _total: usize, source: &Path) {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.bar.println(format!("  {} {}", green("✓"), dim(&name)));
        self.bar.set_message(name);
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _kind: BatchKind, output: Option<&Path>) {
        self.bar.finish_and_clear();
        if let Some(path) = output {
            eprintln!("{} {}", green("✔"), bold(&path.display().to_string()));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # 2-column collage; tags after '=' request a rotation
  collage collage a.jpg=landscape b.jpg=portrait c.jpg -o out/collage.jpg

  # PDF from mixed sources; FILE=PRIORITY[,TAG]
  collage pdf scan.pdf=2 photo.jpg=1,portrait -o out/report.pdf --page-width 1200

  # Resized copies of every image, records printed as JSON
  collage resize a.jpg b.png --output-dir out --base-url https://cdn/m --json

  # Memory budget and pdfium availability
  collage inspect --memory-percentage 25

INPUT MANIFESTS:
  Instead of positional inputs, --manifest reads a JSON array of
  CollageImage / DocumentInput / HostedFile records.

ENVIRONMENT VARIABLES:
  COLLAGE_CONFIG             JSON file with an EngineConfig
  COLLAGE_MEMORY_PERCENTAGE  Decoder memory cap (% of system memory, 0 = default)
  COLLAGE_WIDTH              Collage tile / output width (≥ 600)
  COLLAGE_QUALITY            Lossy output quality (0–100)
  COLLAGE_DENSITY            PDF rasterisation DPI
  COLLAGE_PDF_COLOR          grayscale | color
  COLLAGE_RASTERIZER_DIR     Folder holding the platform pdfium library
  RUST_LOG                   Overrides the log filter
"#;

/// Compose image collages and multi-page PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "collage",
    version,
    about = "Compose image collages and multi-page PDFs from images and PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    engine: EngineArgs,

    /// Print results as JSON on stdout.
    #[arg(long, global = true, env = "COLLAGE_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, global = true, env = "COLLAGE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "COLLAGE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "COLLAGE_QUIET")]
    quiet: bool,
}

/// Engine options; each overrides the `--config` file.
#[derive(Args, Debug)]
struct EngineArgs {
    /// JSON file with an `EngineConfig`.
    #[arg(long, global = true, env = "COLLAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Decoder memory cap as % of system memory (0 = engine default).
    #[arg(long, global = true, env = "COLLAGE_MEMORY_PERCENTAGE", allow_negative_numbers = true)]
    memory_percentage: Option<i32>,

    /// Collage tile and output width in pixels (≥ 600).
    #[arg(long, global = true, env = "COLLAGE_WIDTH")]
    width: Option<u32>,

    /// Lossy output quality (0–100).
    #[arg(long, global = true, env = "COLLAGE_QUALITY")]
    quality: Option<u8>,

    /// PDF rasterisation density in DPI.
    #[arg(long, global = true, env = "COLLAGE_DENSITY")]
    density: Option<u32>,

    /// Colour mode of rasterised PDF pages.
    #[arg(long, global = true, env = "COLLAGE_PDF_COLOR", value_enum)]
    pdf_color: Option<ColorArg>,

    /// Folder holding the platform pdfium library.
    #[arg(long, global = true, env = "COLLAGE_RASTERIZER_DIR")]
    rasterizer_dir: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ColorArg {
    Grayscale,
    Color,
}

impl From<ColorArg> for ColorMode {
    fn from(v: ColorArg) -> Self {
        match v {
            ColorArg::Grayscale => ColorMode::Grayscale,
            ColorArg::Color => ColorMode::Color,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tile images into a grid collage.
    Collage {
        /// Images as FILE or FILE=TAG (landscape, portrait, none).
        inputs: Vec<String>,

        /// JSON array of CollageImage records.
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Output file; its folder must exist.
        #[arg(short, long)]
        output: PathBuf,

        /// Tiles per row.
        #[arg(short, long, default_value_t = 2)]
        columns: u32,

        /// Output MIME type; inferred from the output extension when omitted.
        #[arg(long)]
        mime_type: Option<String>,

        /// Base URL recorded on the descriptor.
        #[arg(long, env = "COLLAGE_BASE_URL", default_value = "")]
        base_url: String,
    },

    /// Assemble a multi-page PDF from images and PDFs.
    Pdf {
        /// Sources as FILE, FILE=PRIORITY or FILE=PRIORITY,TAG.
        inputs: Vec<String>,

        /// JSON array of DocumentInput records.
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Output PDF; its folder must exist.
        #[arg(short, long)]
        output: PathBuf,

        /// Common page width in pixels (≥ 600, default 600).
        #[arg(long)]
        page_width: Option<u32>,

        /// Base URL recorded on the descriptor.
        #[arg(long, env = "COLLAGE_BASE_URL", default_value = "")]
        base_url: String,
    },

    /// Write `{stem}_resized` copies of images.
    Resize {
        /// Image files.
        inputs: Vec<PathBuf>,

        /// JSON array of HostedFile records.
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Existing folder receiving the copies.
        #[arg(long)]
        output_dir: PathBuf,

        /// Target size of the longest side (≥ 600); the engine width when omitted.
        #[arg(long)]
        size: Option<u32>,

        /// Base URL of the rewritten records.
        #[arg(long, env = "COLLAGE_BASE_URL", default_value = "")]
        base_url: String,
    },

    /// Print the memory budget and rasterizer status.
    Inspect,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO-level library logs are hidden while the progress bar is active.
    let show_progress =
        !cli.quiet && !cli.no_progress && !cli.json && !matches!(cli.command, Command::Inspect);
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build composer ───────────────────────────────────────────────────
    let config = build_config(&cli.engine)?;
    let mut composer = Composer::new(config).context("Failed to initialise composer")?;
    if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new();
        composer = composer.with_progress(cb);
    }

    match cli.command {
        Command::Collage {
            inputs,
            manifest,
            output,
            columns,
            mime_type,
            base_url,
        } => {
            let images: Vec<CollageImage> = match manifest {
                Some(path) => read_manifest(&path)?,
                None => inputs
                    .iter()
                    .map(|s| parse_collage_input(s))
                    .collect::<Result<_>>()?,
            };
            let (output_folder, filename) = split_output(&output)?;
            let mime_type = match mime_type {
                Some(m) => m,
                None => mime_for(&output)?,
            };
            let settings = CollageSettings {
                columns,
                mime_type,
                filename,
                output_folder,
                base_url,
            };
            let media = composer
                .create_collage(&images, &settings)
                .context("Collage failed")?;
            report(media, cli.json, cli.quiet)?;
        }

        Command::Pdf {
            inputs,
            manifest,
            output,
            page_width,
            base_url,
        } => {
            let documents: Vec<DocumentInput> = match manifest {
                Some(path) => read_manifest(&path)?,
                None => inputs
                    .iter()
                    .map(|s| parse_document_input(s))
                    .collect::<Result<_>>()?,
            };
            let (output_folder, filename) = split_output(&output)?;
            let settings = PdfSettings {
                filename,
                output_folder,
                base_url,
                resize_document_width: page_width,
            };
            let media = composer
                .create_pdf(&documents, &settings)
                .context("PDF composition failed")?;
            report(media, cli.json, cli.quiet)?;
        }

        Command::Resize {
            inputs,
            manifest,
            output_dir,
            size,
            base_url,
        } => {
            let files: Vec<HostedFile> = match manifest {
                Some(path) => read_manifest(&path)?,
                None => inputs.into_iter().map(HostedFile::new).collect(),
            };
            let resized = composer
                .resize_media_files(files, &output_dir, &base_url, size)
                .context("Resize failed")?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&resized).context("Failed to serialise output")?
                );
            } else if !cli.quiet {
                for file in &resized {
                    println!(
                        "{}  {}",
                        file.filename.display(),
                        dim(file.url.as_deref().unwrap_or("-"))
                    );
                }
            }
        }

        Command::Inspect => {
            let governor = composer.governor();
            let config = composer.config();
            let rasterizer = composer.ops().rasterizer();
            if cli.json {
                let value = serde_json::json!({
                    "system_memory": governor.system_memory(),
                    "engine_memory": governor.engine_memory(),
                    "limit_memory_percentage": governor.limit_memory_percentage(),
                    "config": config,
                    "pdfium_library": rasterizer.library_path(),
                    "pdfium_available": rasterizer.is_available(),
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&value).context("Failed to serialise output")?
                );
            } else {
                println!("System memory:   {}", format_bytes(governor.system_memory()));
                println!("Engine memory:   {}", format_bytes(governor.engine_memory()));
                println!("Memory limit:    {}%", governor.limit_memory_percentage());
                println!("Collage width:   {} px", config.collage_image_width);
                println!("Quality:         {}", config.collage_image_quality);
                println!("PDF density:     {} DPI ({:?})", config.collage_pdf_density, config.pdf_color_mode);
                match rasterizer.library_path() {
                    Some(p) => println!("pdfium library:  {}", p.display()),
                    None => println!("pdfium library:  system"),
                }
                println!("pdfium usable:   {}", rasterizer.is_available());
            }
        }
    }

    Ok(())
}

/// Merge `--config` with the individual flags.
fn build_config(args: &EngineArgs) -> Result<EngineConfig> {
    let base = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            serde_json::from_str::<EngineConfig>(&text)
                .with_context(|| format!("Invalid config file {:?}", path))?
        }
        None => EngineConfig::default(),
    };

    let mut builder = EngineConfig::builder()
        .limit_memory_percentage(args.memory_percentage.unwrap_or(base.limit_memory_percentage))
        .collage_image_width(args.width.unwrap_or(base.collage_image_width))
        .collage_image_quality(args.quality.unwrap_or(base.collage_image_quality))
        .collage_pdf_density(args.density.unwrap_or(base.collage_pdf_density))
        .pdf_color_mode(args.pdf_color.map(Into::into).unwrap_or(base.pdf_color_mode));

    if let Some(dir) = args.rasterizer_dir.clone().or(base.rasterizer_directory) {
        builder = builder.rasterizer_directory(dir);
    }

    builder.build().context("Invalid configuration")
}

fn read_manifest<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid manifest {:?}", path))
}

fn parse_tag(s: &str) -> Result<OrientationTag> {
    match s.trim().to_lowercase().as_str() {
        "landscape" | "l" => Ok(OrientationTag::Landscape),
        "portrait" | "p" => Ok(OrientationTag::Portrait),
        "none" | "na" | "" => Ok(OrientationTag::NotApplicable),
        other => bail!("Unknown orientation '{other}' (expected landscape, portrait or none)"),
    }
}

/// `FILE` or `FILE=TAG`.
fn parse_collage_input(s: &str) -> Result<CollageImage> {
    match s.rsplit_once('=') {
        Some((file, tag)) => Ok(CollageImage::new(file, parse_tag(tag)?)),
        None => Ok(CollageImage::new(s, OrientationTag::NotApplicable)),
    }
}

/// `FILE`, `FILE=PRIORITY` or `FILE=PRIORITY,TAG`.
fn parse_document_input(s: &str) -> Result<DocumentInput> {
    let Some((file, rest)) = s.rsplit_once('=') else {
        return Ok(DocumentInput::new(s, 0, OrientationTag::NotApplicable));
    };
    let (priority, tag) = match rest.split_once(',') {
        Some((p, t)) => (p, parse_tag(t)?),
        None => (rest, OrientationTag::NotApplicable),
    };
    let priority: i32 = priority
        .trim()
        .parse()
        .with_context(|| format!("Invalid sort priority in '{s}'"))?;
    Ok(DocumentInput::new(file, priority, tag))
}

/// Split `-o` into output folder and file name.
fn split_output(output: &Path) -> Result<(PathBuf, String)> {
    let filename = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("Output path has no file name")?;
    let folder = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((folder, filename))
}

fn mime_for(output: &Path) -> Result<String> {
    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => Ok("image/jpeg".into()),
        "png" => Ok("image/png".into()),
        _ => bail!("Cannot infer MIME type from '{}'; pass --mime-type", output.display()),
    }
}

fn report(media: Option<MediaDescriptor>, json: bool, quiet: bool) -> Result<()> {
    match media {
        Some(media) if json => println!(
            "{}",
            serde_json::to_string_pretty(&media).context("Failed to serialise output")?
        ),
        Some(media) if !quiet => {
            println!("{}", media.filename.display());
            println!("{}", dim(&media.url));
        }
        Some(_) => {}
        None if json => println!("null"),
        None if !quiet => eprintln!("Nothing to compose: no eligible inputs"),
        None => {}
    }
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
    format!("{:.1} GiB ({bytes} bytes)", bytes as f64 / GIB)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_is_configured_on_batch_start() {
        let cb = CliProgressCallback::new();
        assert_eq!(cb.bar.prefix(), "");
        cb.on_batch_start(BatchKind::Document, 3);
        assert_eq!(cb.bar.length(), Some(3));
        assert_eq!(cb.bar.prefix(), "Document");
        cb.on_batch_complete(BatchKind::Document, None);
        assert!(cb.bar.is_finished());
    }

    #[test]
    fn collage_input_tags() {
        let img = parse_collage_input("a.jpg=portrait").unwrap();
        assert_eq!(img.filename, PathBuf::from("a.jpg"));
        assert_eq!(img.orientation, OrientationTag::Portrait);
        let img = parse_collage_input("b.jpg").unwrap();
        assert_eq!(img.orientation, OrientationTag::NotApplicable);
        assert!(parse_collage_input("c.jpg=sideways").is_err());
    }

    #[test]
    fn document_input_priority_and_tag() {
        let d = parse_document_input("scan.pdf=2").unwrap();
        assert_eq!((d.sort_priority, d.orientation), (2, OrientationTag::NotApplicable));
        let d = parse_document_input("photo.jpg=-1,landscape").unwrap();
        assert_eq!((d.sort_priority, d.orientation), (-1, OrientationTag::Landscape));
        assert!(parse_document_input("x.jpg=abc").is_err());
    }

    #[test]
    fn output_split() {
        let (folder, name) = split_output(Path::new("out/c.jpg")).unwrap();
        assert_eq!((folder, name.as_str()), (PathBuf::from("out"), "c.jpg"));
        let (folder, _) = split_output(Path::new("c.jpg")).unwrap();
        assert_eq!(folder, PathBuf::from("."));
    }

    #[test]
    fn mime_inference() {
        assert_eq!(mime_for(Path::new("a.JPG")).unwrap(), "image/jpeg");
        assert_eq!(mime_for(Path::new("a.png")).unwrap(), "image/png");
        assert!(mime_for(Path::new("a.gif")).is_err());
    }

    #[test]
    fn cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

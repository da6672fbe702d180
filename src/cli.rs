//! Command line front end
//!
//! Usage examples:
//!   pagestitch simulate --content-height 5000 --device-pixel-ratio 2 -o page.png
//!   pagestitch simulate --inner-scroller --deliver analyze
//!   pagestitch stitch --manifest steps.json -o stitched.png
//!   pagestitch crop -i page.png --x 10 --y 10 --width 490 --height 290 -o crop.png
//!   pagestitch export -i page.png --pdf page.pdf
//!   pagestitch export -i capture.json --pdf page.pdf
//!   pagestitch config

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use image::RgbaImage;
use serde::Deserialize;

use pagestitch::capture::{CaptureMode, CaptureSession, FixedDelay, Immediate, StableFrame};
use pagestitch::config::Config;
use pagestitch::domain::{Bitmap, CaptureStep, Composite, Point, ScrollTarget, SelectionOutcome, Tool};
use pagestitch::editor::EditorSession;
use pagestitch::output::{self, FileResultSink, ResultSink};
use pagestitch::page::Position;
use pagestitch::page::synthetic::SyntheticPage;
use pagestitch::render::Compositor;

#[derive(Parser, Debug)]
#[command(name = "pagestitch", version, about = "Scroll-capture and stitch web pages into one image")]
pub struct Cli {
    /// Config file to use instead of the one in the user config directory
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full capture pipeline against an in-memory page
    Simulate(SimulateArgs),
    /// Composite captured frames listed in a JSON manifest
    Stitch {
        #[arg(short, long, value_name = "FILE")]
        manifest: PathBuf,
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
    /// Crop an image to a rectangle in native pixels
    Crop {
        /// PNG file or `.json` capture record
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        x: u32,
        #[arg(long)]
        y: u32,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Convert an image to a paginated PDF or a hand-off record
    Export {
        /// PNG file or `.json` capture record
        #[arg(short, long)]
        input: PathBuf,
        /// Write a paginated PDF
        #[arg(long, value_name = "FILE")]
        pdf: Option<PathBuf>,
        /// Write a `{ imageUri, timestampMillis }` record
        #[arg(long, value_name = "FILE")]
        record: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config {
        /// Print the config file location instead
        #[arg(long)]
        path: bool,
        /// Write the effective configuration to the config file
        #[arg(long, conflicts_with = "path")]
        write: bool,
    },
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[arg(long, default_value_t = 1280.0)]
    viewport_width: f64,
    #[arg(long, default_value_t = 800.0)]
    viewport_height: f64,
    #[arg(long, default_value_t = 4000.0)]
    content_height: f64,
    #[arg(long, default_value_t = 1.0)]
    device_pixel_ratio: f64,
    /// Put the content in an overflow:auto element instead of the document
    #[arg(long)]
    inner_scroller: bool,
    /// Height of a fixed header, 0 for none
    #[arg(long, default_value_t = 0.0)]
    header: f64,
    /// Change the content height by this much after the second scroll
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    grow: f64,
    /// Skip the settle delays
    #[arg(long)]
    instant: bool,
    #[arg(long, value_enum)]
    deliver: Option<Deliver>,
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Deliver {
    Analyze,
    Clipboard,
}

/// Frames captured elsewhere, with the offsets they were taken at
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    viewport_width: f64,
    viewport_height: f64,
    content_height: f64,
    #[serde(default = "default_ratio")]
    device_pixel_ratio: f64,
    steps: Vec<ManifestStep>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestStep {
    /// Image path, relative to the manifest
    file: PathBuf,
    actual_offset: f64,
    requested_offset: Option<f64>,
}

fn default_ratio() -> f64 {
    1.0
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    match cli.command {
        Command::Simulate(args) => simulate(&config, args).await,
        Command::Stitch { manifest, output } => stitch(&config, &manifest, &output),
        Command::Crop {
            input,
            x,
            y,
            width,
            height,
            output,
        } => crop(&config, &input, (x, y, width, height), &output),
        Command::Export { input, pdf, record } => export(&config, &input, pdf, record),
        Command::Config { path, write } => {
            if write {
                config.save();
            } else if path {
                match Config::default_path() {
                    Some(path) => println!("{}", path.display()),
                    None => bail!("Could not determine config directory"),
                }
            } else {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            Ok(())
        }
    }
}

async fn simulate(config: &Config, args: SimulateArgs) -> Result<()> {
    let page = if args.inner_scroller {
        SyntheticPage::inner_scroller(
            args.viewport_width,
            args.viewport_height,
            args.viewport_width * 0.9,
            args.viewport_height,
            args.content_height,
        )
    } else {
        SyntheticPage::document(args.viewport_width, args.viewport_height, args.content_height)
    };
    page.set_device_pixel_ratio(args.device_pixel_ratio);
    page.encode_frames(true);
    if args.header > 0.0 {
        page.add_fixed(0.0, args.header, Position::Fixed, None);
    }
    if args.grow != 0.0 {
        page.grow_after(2, args.grow);
    }

    let session = CaptureSession::new(config.clone());
    let composite = if args.instant {
        capture(&session, &page, Immediate).await?
    } else {
        capture(&session, &page, FixedDelay::from_config(&config.capture)).await?
    };
    println!(
        "Captured {} frames into {}x{}",
        page.capture_count(),
        composite.width(),
        composite.height()
    );

    if let Some(path) = &args.output {
        save_png(path, &composite.image)?;
    }

    if let Some(deliver) = args.deliver {
        let mode = match deliver {
            Deliver::Analyze => CaptureMode::Analyze,
            Deliver::Clipboard => CaptureMode::Clipboard,
        };
        let mut results = FileResultSink::new(
            FileResultSink::default_path().context("Could not determine data directory")?,
        );
        deliver_with_clipboard(&session, &composite, mode, &mut results)?;
    }
    Ok(())
}

async fn capture<S: StableFrame>(session: &CaptureSession, page: &SyntheticPage, settle: S) -> Result<Composite> {
    let mut handle = page.clone();
    let mut camera = page.clone();
    let composite = session
        .capture_full_page(&mut handle, &mut camera, settle, |percent| {
            log::info!("Capturing... {percent}%")
        })
        .await
        .map_err(|err| anyhow::anyhow!(err.user_message()))?;
    Ok(composite)
}

#[cfg(feature = "clipboard")]
fn deliver_with_clipboard(
    session: &CaptureSession,
    composite: &Composite,
    mode: CaptureMode,
    results: &mut FileResultSink,
) -> Result<()> {
    let mut clipboard = output::SystemClipboard;
    session.deliver(composite, mode, results, &mut clipboard)
}

#[cfg(not(feature = "clipboard"))]
fn deliver_with_clipboard(
    session: &CaptureSession,
    composite: &Composite,
    mode: CaptureMode,
    results: &mut FileResultSink,
) -> Result<()> {
    if mode == CaptureMode::Clipboard {
        bail!("Built without clipboard support");
    }
    let mut clipboard = output::MemoryClipboard::new(output::ClipboardFormat::Png);
    session.deliver(composite, mode, results, &mut clipboard)
}

fn stitch(config: &Config, manifest_path: &Path, output: &Path) -> Result<()> {
    let json = std::fs::read_to_string(manifest_path)
        .with_context(|| format!("Failed to read manifest: {}", manifest_path.display()))?;
    let manifest: Manifest = serde_json::from_str(&json)
        .with_context(|| format!("Invalid manifest: {}", manifest_path.display()))?;
    let base_dir = manifest_path.parent().unwrap_or(Path::new("."));

    let mut steps = Vec::with_capacity(manifest.steps.len());
    for step in &manifest.steps {
        let path = base_dir.join(&step.file);
        let bytes = std::fs::read(&path).with_context(|| format!("Failed to read frame: {}", path.display()))?;
        steps.push(CaptureStep {
            requested_offset: step.requested_offset.unwrap_or(step.actual_offset),
            actual_offset: step.actual_offset,
            bitmap: Bitmap::Encoded(bytes),
            captured_height: manifest.viewport_height,
        });
    }

    let target = ScrollTarget {
        container: None,
        content_height: manifest.content_height,
        viewport_height: manifest.viewport_height,
        viewport_width: manifest.viewport_width,
    };
    let composite = Compositor::new(&config.capture).composite(&target, &steps, manifest.device_pixel_ratio)?;
    save_png(output, &composite.image)?;
    println!("Stitched {} frames into {}x{}", steps.len(), composite.width(), composite.height());
    Ok(())
}

fn crop(config: &Config, input: &Path, rect: (u32, u32, u32, u32), output: &Path) -> Result<()> {
    let image = load_image(input)?;
    let mut editor = EditorSession::new(Composite::new(image, 1.0), &config.editor)?;
    let (x, y, width, height) = rect;

    editor.toggle_tool(Tool::Select);
    editor.begin_selection(Point::new(x as f32, y as f32));
    editor.update_selection(Point::new((x + width) as f32, (y + height) as f32));
    match editor.end_selection() {
        SelectionOutcome::Committed(selection) => log::debug!("Selection {}", selection.size_label()),
        SelectionOutcome::TooSmall => bail!(
            "Selection is smaller than {} pixels",
            config.editor.min_selection_size
        ),
        SelectionOutcome::Idle => bail!("No selection"),
    }
    editor.apply_crop()?;

    let merged = editor.merge_for_export(false)?;
    save_png(output, &merged)?;
    println!("Cropped to {}x{}", merged.width(), merged.height());
    Ok(())
}

fn export(config: &Config, input: &Path, pdf: Option<PathBuf>, record: Option<PathBuf>) -> Result<()> {
    if pdf.is_none() && record.is_none() {
        bail!("Nothing to export, pass --pdf and/or --record");
    }
    let image = load_image(input)?;

    if let Some(path) = pdf {
        let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        output::write_pdf(BufWriter::new(file), &image, config.output.pdf_page_aspect)?;
        println!("Saved {}", path.display());
    }
    if let Some(path) = record {
        let mut sink = FileResultSink::new(&path);
        sink.store_capture(&Composite::new(image, 1.0))?;
        sink.announce_result_ready();
        println!("Saved {}", path.display());
    }
    Ok(())
}

/// Read a PNG, or the image inside a `.json` hand-off record
fn load_image(path: &Path) -> Result<RgbaImage> {
    if path.extension().is_some_and(|ext| ext == "json") {
        let record = FileResultSink::new(path)
            .load()?
            .with_context(|| format!("No capture record at {}", path.display()))?;
        return Ok(output::from_data_uri(&record.image_uri)?);
    }
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(output::decode_image(&bytes)?)
}

fn save_png(path: &Path, image: &RgbaImage) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    output::write_png(BufWriter::new(file), image)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Saved {}", path.display());
    Ok(())
}

//! vidid - command-line front end for the three-pass identity pipeline.
//!
//! Two subcommands: `identify` runs the full pipeline over a video and a
//! coords file, `inspect` reports a video's decoded metadata without
//! running the pipeline.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use vidid_identify::{Config, CoordsFormat, IdentifyProgress, Identifier};
use vidid_media::VideoReader;

#[derive(Parser)]
#[command(name = "vidid")]
#[command(about = "Three-pass video person-identification pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the three-pass identification pipeline over a video.
    Identify {
        /// Input video file.
        video: PathBuf,
        /// Coords file with one detection rectangle per row/entry.
        coords: PathBuf,
        /// Directory to write per-identity and aggregate output into.
        #[arg(short, long, default_value = "vidid-output")]
        output: PathBuf,
        /// Coords file format.
        #[arg(short, long, value_enum, default_value_t = Format::Csv)]
        format: Format,
        /// Optional TOML config file overriding the compiled defaults.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Skip writing per-identity output streams.
        #[arg(long)]
        no_ident: bool,
        /// Skip writing the aggregate annotated output stream.
        #[arg(long)]
        no_aggregate: bool,
        /// Use the narrower default-portrait crop instead of the wider selfie crop.
        #[arg(long)]
        portrait: bool,
        /// Percent horizontal shift applied to per-identity crops, in (-100, 100).
        #[arg(long)]
        shift: Option<f32>,
        /// Per-identity gallery cap (images kept per identity).
        #[arg(long)]
        nb_images: Option<usize>,
        /// Minimum detection confidence accepted during discovery.
        #[arg(long)]
        face_min_confidence: Option<f32>,
        /// Width of per-identity letterboxed output frames.
        #[arg(long)]
        width: Option<u32>,
        /// Height of per-identity letterboxed output frames.
        #[arg(long)]
        height: Option<u32>,
        /// Length, in seconds, of the pass-3 smoothing window.
        #[arg(long)]
        pass3_window: Option<f64>,
    },
    /// Report decoded metadata for a video without running the pipeline.
    Inspect {
        /// Input video file.
        video: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Xra,
}

impl From<Format> for CoordsFormat {
    fn from(value: Format) -> Self {
        match value {
            Format::Csv => CoordsFormat::Csv,
            Format::Xra => CoordsFormat::Xra,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;

    match cli.command {
        Commands::Identify {
            video,
            coords,
            output,
            format,
            config,
            no_ident,
            no_aggregate,
            portrait,
            shift,
            nb_images,
            face_min_confidence,
            width,
            height,
            pass3_window,
        } => cmd_identify(
            video,
            coords,
            output,
            format.into(),
            config,
            no_ident,
            no_aggregate,
            portrait,
            shift,
            nb_images,
            face_min_confidence,
            width,
            height,
            pass3_window,
        ),
        Commands::Inspect { video } => cmd_inspect(video),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_identify(
    video: PathBuf,
    coords: PathBuf,
    output: PathBuf,
    format: CoordsFormat,
    config_path: Option<PathBuf>,
    no_ident: bool,
    no_aggregate: bool,
    portrait: bool,
    shift: Option<f32>,
    nb_images: Option<usize>,
    face_min_confidence: Option<f32>,
    width: Option<u32>,
    height: Option<u32>,
    pass3_window: Option<f64>,
) -> Result<()> {
    let mut config = Config::load(config_path.as_deref()).context("failed to load config")?;
    if no_ident {
        config.out_ident = false;
    }
    if no_aggregate {
        config.out_aggregate = false;
    }
    if portrait {
        config.out_selfie = false;
    }
    if let Some(shift) = shift {
        config.out_shift = shift;
    }
    if let Some(nb_images) = nb_images {
        config.nb_images_recognizer = nb_images;
    }
    if let Some(face_min_confidence) = face_min_confidence {
        config.face_min_confidence = face_min_confidence;
    }
    if let Some(width) = width {
        config.out_width = width;
    }
    if let Some(height) = height {
        config.out_height = height;
    }
    if let Some(pass3_window) = pass3_window {
        config.pass3_window_seconds = pass3_window;
    }
    config.validate().context("invalid configuration")?;

    let mut identifier = Identifier::new(config);
    let summary = identifier
        .run(&video, &coords, format, &output, print_progress)
        .with_context(|| {
            format!(
                "identification run failed for {} / {}",
                video.display(),
                coords.display()
            )
        })?;
    println!();
    println!(
        "done: {} frames, {} identities, output in {}",
        summary.frames,
        summary.identities,
        output.display()
    );
    Ok(())
}

fn print_progress(progress: IdentifyProgress) {
    print!(
        "\r[{:>5.1}%] {}: {}",
        progress.overall_progress * 100.0,
        progress.stage.display_name(),
        progress.message
    );
    let _ = std::io::stdout().flush();
}

fn cmd_inspect(video: PathBuf) -> Result<()> {
    let reader = VideoReader::open(&video)
        .with_context(|| format!("failed to open {}", video.display()))?;
    println!("path:    {}", video.display());
    println!("width:   {}", reader.width());
    println!("height:  {}", reader.height());
    println!("fps:     {:.3}", reader.fps());
    let nframes = reader.nframes();
    if nframes == i64::MAX {
        println!("frames:  unknown (short clip, under-reported duration)");
    } else {
        println!("frames:  {nframes}");
    }
    Ok(())
}

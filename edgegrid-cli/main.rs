use clap::{Args, Parser, Subcommand, ValueEnum};
use edgegrid_cli::logging::init_tracing;
use edgegrid_cli::replay::{replay_all, StrokeScript};
use edgegrid_cli::{
    AnnotationSession, AnnotatorConfig, CommitPipeline, DatasetWriter, DirectoryImageSource, LabelFormat, SourceImage,
};
use edgegrid_spectral::{FeatureSource, SpectralExtractor, WindowFunction};
use image::GrayImage;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(name = "edgegrid", about = "Grid-based edge annotation with per-cell spectral features")]
struct Cli {
    /// Config file (.toml or .json); flags override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a stroke script over an image directory and write the dataset
    Annotate {
        /// Directory of source images
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Dataset root; images/ and labels/ are created below it
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON stroke script; images without an entry get no strokes
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Write an overlay preview per image into this directory
        #[arg(long)]
        preview: Option<PathBuf>,

        /// Label file encoding
        #[arg(long, value_enum)]
        format: Option<LabelFormat>,

        #[command(flatten)]
        grid: GridArgs,
    },
    /// Compute the feature image of a single image
    Features {
        /// Input image path (PNG, JPEG, BMP)
        input: PathBuf,

        /// Output PNG path
        #[arg(short, long, default_value = "features.png")]
        output: PathBuf,

        #[command(flatten)]
        grid: GridArgs,
    },
    /// Print the effective configuration, or write it to a file
    Config {
        /// Destination (.toml or .json); prints TOML when omitted
        #[arg(short, long)]
        write: Option<PathBuf>,

        #[command(flatten)]
        grid: GridArgs,
    },
}

#[derive(Args)]
struct GridArgs {
    /// Canvas side length in pixels
    #[arg(long)]
    canvas: Option<usize>,

    /// Cells per grid side; must divide the canvas size
    #[arg(long)]
    cells: Option<usize>,

    /// Window applied to each cell before the transform
    #[arg(long, value_enum)]
    window: Option<WindowArg>,

    /// Pixels fed to the transform
    #[arg(long, value_enum)]
    source: Option<SourceArg>,

    /// Disable ln(1 + |X|) compression
    #[arg(long)]
    linear: bool,

    /// Worker threads for feature extraction
    #[arg(short = 't', long)]
    threads: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum WindowArg {
    None,
    Hann,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Canvas,
    Original,
}

impl GridArgs {
    fn apply(&self, cfg: &mut AnnotatorConfig) {
        if let Some(canvas) = self.canvas {
            cfg.canvas_size = canvas;
        }
        if let Some(cells) = self.cells {
            cfg.cells_per_side = cells;
        }
        if let Some(window) = self.window {
            cfg.spectral.window = match window {
                WindowArg::None => WindowFunction::None,
                WindowArg::Hann => WindowFunction::Hann,
            };
        }
        if let Some(source) = self.source {
            cfg.spectral.source = match source {
                SourceArg::Canvas => FeatureSource::Canvas,
                SourceArg::Original => FeatureSource::Original,
            };
        }
        if self.linear {
            cfg.spectral.log_scale = false;
        }
        if let Some(threads) = self.threads {
            cfg.spectral.n_threads = threads;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let mut cfg = match &cli.config {
        Some(path) => AnnotatorConfig::load(path)?,
        None => AnnotatorConfig::default(),
    };

    match cli.command {
        Command::Annotate { input, output, script, preview, format, grid } => {
            grid.apply(&mut cfg);
            if let Some(input) = input {
                cfg.input_dir = input;
            }
            if let Some(output) = output {
                cfg.output_dir = output;
            }
            if let Some(format) = format {
                cfg.label_format = format;
            }
            let grid = cfg.validate()?;
            info!("{}", cfg.summary());

            let script = match script {
                Some(path) => StrokeScript::load(path)?,
                None => StrokeScript::default(),
            };
            let source = DirectoryImageSource::open(&cfg.input_dir, &cfg.extensions, grid.canvas_size())?;
            let writer = DatasetWriter::new(&cfg.output_dir, cfg.label_format)?;
            let pipeline = CommitPipeline::new(grid, cfg.spectral.clone())?;
            let mut session = AnnotationSession::new(source, writer, pipeline);

            let t0 = Instant::now();
            let reports = replay_all(&mut session, &script, preview.as_deref())?;
            let elapsed = t0.elapsed();

            let marked: usize = reports.iter().map(|r| r.marked_cells).sum();
            let (_, total) = session.progress();
            eprintln!(
                "Committed {} of {} images ({} marked cells) into {} in {:.2?}",
                reports.len(),
                total,
                marked,
                cfg.output_dir.display(),
                elapsed
            );
        }
        Command::Features { input, output, grid } => {
            grid.apply(&mut cfg);
            let grid = cfg.validate()?;
            let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("image").to_string();
            let src = SourceImage::from_dynamic(stem, image::open(&input)?, grid.canvas_size())?;
            let extractor = SpectralExtractor::new(grid, cfg.spectral.clone())?;

            let t0 = Instant::now();
            let features = extractor.extract_configured(
                &src.canvas_luma,
                &src.original_luma,
                src.original_width,
                src.original_height,
            )?;
            let elapsed = t0.elapsed();

            let size = features.size() as u32;
            let out = GrayImage::from_raw(size, size, features.into_raw())
                .ok_or("feature buffer does not match canvas size")?;
            out.save(&output)?;
            eprintln!("Saved {}x{} feature image to {} in {:.2?}", size, size, output.display(), elapsed);
        }
        Command::Config { write, grid } => {
            grid.apply(&mut cfg);
            cfg.validate()?;
            match write {
                Some(path) => {
                    cfg.save(&path)?;
                    eprintln!("Wrote configuration to {}", path.display());
                }
                None => print!("{}", cfg.to_toml()?),
            }
        }
    }

    Ok(())
}

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, WrapErr};
use outline::{SegmentCommand, Segmenter, render_overlay};
use sampling::{FfmpegSource, ScanWindow, VideoSource};
use scope_cli::{command_classifier, load_scan_config, parse_color, parse_window, schemas, write_output};
use scope_common::{CancelFlag, Point2D, utils::format_timestamp};
use std::path::{Path, PathBuf};
use timeline::{FrameAnalysisPipeline, ScanOutcome, TimelineReport};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SegmentMode {
    /// Colour-similarity region growing
    Seed,
    /// Classifier mask near the point
    Mask,
}

#[derive(Subcommand)]
enum Commands {
    /// Outline the region around a point of a still image and print it as GeoJSON
    Segment {
        /// Path to the input image
        #[arg(short, long)]
        image: PathBuf,
        #[arg(short)]
        x: f64,
        #[arg(short)]
        y: f64,
        #[arg(long, value_enum, default_value_t = SegmentMode::Seed)]
        mode: SegmentMode,
        /// Maximum RGB distance for region growing
        #[arg(long)]
        tolerance: Option<f64>,
        /// Target colour as r,g,b (defaults to the colour under the point)
        #[arg(long)]
        color: Option<String>,
        /// Simplification epsilon in pixels
        #[arg(long)]
        epsilon: Option<f64>,
        /// Save a PNG with the outline drawn on the image
        #[arg(long)]
        overlay: Option<PathBuf>,
        /// Classifier command for mask mode
        #[arg(long)]
        classifier: Option<String>,
        /// Scan configuration file (.toml or .json) for segmentation tunables
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Measure the region across a video and write a timeline report
    Scan {
        /// Path to the input video file
        #[arg(short, long)]
        input: PathBuf,
        /// Scan configuration file (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Where to write the JSON report (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also write the timeline as GeoJSON
        #[arg(long)]
        geojson: Option<PathBuf>,
        /// Classifier command, e.g. "python3 infer.py"
        #[arg(long)]
        classifier: Option<String>,
        /// Start of the scanned range (HH:MM:SS.mmm, MM:SS or seconds)
        #[arg(long, requires = "end")]
        start: Option<String>,
        /// End of the scanned range
        #[arg(long, requires = "start")]
        end: Option<String>,
    },
    /// Print the JSON schemas of the scan configuration and segment commands
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Segment {
            image,
            x,
            y,
            mode,
            tolerance,
            color,
            epsilon,
            overlay,
            classifier,
            config,
        } => {
            let target = color.as_deref().map(parse_color).transpose()?;
            let command = match mode {
                SegmentMode::Seed => SegmentCommand::BySeed { x, y, target, tolerance, epsilon },
                SegmentMode::Mask => SegmentCommand::ByMask { x, y, epsilon },
            };
            segment(&image, command, classifier.as_deref(), config.as_deref(), overlay.as_deref())?;
        }
        Commands::Scan {
            input,
            config,
            output,
            geojson,
            classifier,
            start,
            end,
        } => {
            let window = match (start, end) {
                (Some(start), Some(end)) => Some(parse_window(&start, &end)?),
                _ => None,
            };
            scan(input, config.as_deref(), output.as_deref(), geojson.as_deref(), classifier, window).await?;
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&schemas())?);
        }
    }

    Ok(())
}

fn segment(
    image_path: &Path,
    command: SegmentCommand,
    classifier: Option<&str>,
    config_path: Option<&Path>,
    overlay: Option<&Path>,
) -> Result<()> {
    let config = load_scan_config(config_path)?;
    let image = image::open(image_path)
        .wrap_err_with(|| format!("Cannot open image {}", image_path.display()))?
        .to_rgb8();

    let handle = match command {
        SegmentCommand::ByMask { .. } => command_classifier(classifier, config.retry.timeout()),
        _ => command_classifier(None, config.retry.timeout()),
    };
    let seed = match command {
        SegmentCommand::BySeed { x, y, .. } | SegmentCommand::ByMask { x, y, .. } => Some(Point2D::new(x, y)),
        SegmentCommand::WholeFrame => None,
    };

    info!("{}: {}", command, command.description());
    let segmenter = Segmenter::new(handle, config.segmentation);
    let outcome = segmenter.execute(&image, command)?;
    let polygon = outcome.polygon();
    info!(vertices = polygon.len(), area = polygon.area(), "outline ready");

    println!("{}", polygon.to_geojson_string()?);

    if let Some(path) = overlay {
        render_overlay(&image, polygon, seed)
            .save(path)
            .wrap_err_with(|| format!("Cannot write overlay {}", path.display()))?;
        info!("Overlay written to {}", path.display());
    }
    Ok(())
}

async fn scan(
    input: PathBuf,
    config_path: Option<&Path>,
    output: Option<&Path>,
    geojson: Option<&Path>,
    classifier: Option<String>,
    window: Option<ScanWindow>,
) -> Result<()> {
    let mut config = load_scan_config(config_path)?;
    if let Some(window) = window {
        config.window = window;
    }
    let handle = command_classifier(classifier.as_deref(), config.retry.timeout());

    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current frame");
            on_interrupt.cancel();
        }
    });

    let (outcome, report) = tokio::task::spawn_blocking(move || -> Result<(ScanOutcome, TimelineReport)> {
        let mut source = FfmpegSource::open(&input)?.with_timeout(config.retry.timeout());
        info!(
            "Scanning {} ({}, {}x{})",
            source.description(),
            format_timestamp(source.metadata().duration),
            source.metadata().width,
            source.metadata().height
        );

        let pipeline = FrameAnalysisPipeline::new(handle, config);
        let outcome = pipeline.run(&mut source, &cancel, |progress| {
            info!(
                "[{:>3.0}%] {}",
                progress.fraction() * 100.0,
                format_timestamp(progress.time.max(0.0))
            );
        })?;
        let report = pipeline.report(&outcome);
        Ok((outcome, report))
    })
    .await??;

    if outcome.cancelled {
        warn!("Scan cancelled, reporting {} measured frames", outcome.measurements.len());
    }
    if outcome.skipped > 0 {
        warn!("{} frames could not be measured", outcome.skipped);
    }

    let stats = &report.stats;
    match &stats.error {
        Some(error) => warn!("No statistics: {}", error),
        None => info!(
            "Obstruction {:.2}% (severity {}), smallest area {:.0} at {}, largest {:.0} at {}",
            stats.obstruction_percent,
            stats.severity_score,
            stats.smallest.as_ref().map_or(0.0, |r| r.area),
            stats.smallest.as_ref().map_or_else(String::new, |r| format_timestamp(r.time)),
            stats.largest.as_ref().map_or(0.0, |r| r.area),
            stats.largest.as_ref().map_or_else(String::new, |r| format_timestamp(r.time)),
        ),
    }

    let json = report.to_json()?;
    match output {
        Some(path) => {
            write_output(path, &json)?;
            info!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }

    if let Some(path) = geojson {
        write_output(path, &outcome.timeline.to_geojson_string()?)?;
        info!("Timeline GeoJSON written to {}", path.display());
    }

    Ok(())
}

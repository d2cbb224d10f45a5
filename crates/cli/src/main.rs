use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use odetect_core::detection::domain::detector_config::DetectorConfig;
use odetect_core::detection::domain::object_detector::ObjectDetector;
use odetect_core::detection::infrastructure::model_resolver;
use odetect_core::detection::infrastructure::registry::{self, DEFAULT_MODEL};
use odetect_core::pipeline::annotate_frames_use_case::AnnotateFramesUseCase;
use odetect_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use odetect_core::shared::capabilities::{CapabilityDescriptor, PixelFormat};
use odetect_core::shared::constants::IMAGE_EXTENSIONS;
use odetect_core::video::domain::frame_sink::FrameSink;
use odetect_core::video::domain::frame_source::FrameSource;
use odetect_core::video::infrastructure::image_file_sink::ImageFileSink;
use odetect_core::video::infrastructure::image_file_source::ImageFileSource;
use odetect_core::video::infrastructure::raw_frame_sink::RawFrameSink;
use odetect_core::video::infrastructure::raw_frame_source::RawFrameSource;

/// Annotates video frames with DNN face detections.
#[derive(Parser)]
#[command(name = "odetect")]
struct Cli {
    /// Input image, or raw frame dump (requires --width, --height, --pixel-format).
    input: Option<PathBuf>,

    /// Output image, or raw BGR24 frame dump for any non-image extension.
    output: Option<PathBuf>,

    /// Directory holding the ONNX model files.
    #[arg(short = 'd', long)]
    model_directory: Option<PathBuf>,

    /// Detection model to use (see --list-models).
    #[arg(long, default_value = DEFAULT_MODEL)]
    name: String,

    /// Confidence threshold; values outside (0, 1] fall back to the model default.
    #[arg(short = 't', long, default_value = "0.6")]
    threshold: f32,

    /// Frame width of a raw input dump.
    #[arg(long)]
    width: Option<u16>,

    /// Frame height of a raw input dump.
    #[arg(long)]
    height: Option<u16>,

    /// Pixel format of a raw input dump: bgr24 or yuyv.
    #[arg(long)]
    pixel_format: Option<PixelFormat>,

    /// List the available detection models and exit.
    #[arg(short = 'l', long)]
    list_models: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.list_models {
        list_models();
        return Ok(());
    }
    validate(&cli)?;

    let (Some(input), Some(output)) = (cli.input.as_deref(), cli.output.as_deref()) else {
        return Err("Input and output files are required".into());
    };

    let mut source = open_source(input, &cli)?;
    let metadata = source.open(input)?;

    let model_dir = model_resolver::resolve_model_dir(cli.model_directory.as_deref());
    let detector = registry::create_detector(
        &cli.name,
        &model_dir,
        metadata.capabilities,
        &DetectorConfig::new(cli.threshold),
    )?;
    log::info!(
        "Using {} on {} frame(s) from {}",
        detector.name(),
        metadata.total_frames,
        input.display()
    );

    let mut use_case = AnnotateFramesUseCase::new(
        source,
        open_sink(output),
        Box::new(detector),
        Some(Box::new(StdoutPipelineLogger::default())),
    );
    let summary = use_case.execute(&metadata)?;
    log::info!(
        "Annotated {} frame(s), skipped {}, output written to {}",
        summary.processed,
        summary.skipped,
        output.display()
    );
    Ok(())
}

fn list_models() {
    for entry in registry::entries() {
        let marker = if entry.name == DEFAULT_MODEL {
            " (default)"
        } else {
            ""
        };
        println!("{:24} {}{marker}", entry.name, entry.description);
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let Some(input) = cli.input.as_ref() else {
        return Err("Input file is required unless --list-models is used".into());
    };
    if !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }
    if cli.output.is_none() {
        return Err("Output file is required unless --list-models is used".into());
    }
    if registry::lookup(&cli.name).is_none() {
        return Err(format!(
            "Unknown model '{}', available: {}",
            cli.name,
            registry::model_names().join(", ")
        )
        .into());
    }
    if !is_image(input) {
        raw_capabilities(cli)?;
    }
    Ok(())
}

/// Capabilities of a raw dump, taken from the command line.
fn raw_capabilities(cli: &Cli) -> Result<CapabilityDescriptor, Box<dyn std::error::Error>> {
    match (cli.width, cli.height, cli.pixel_format) {
        (Some(w), Some(h), Some(format)) if w > 0 && h > 0 => {
            Ok(CapabilityDescriptor::new(w, h, format))
        }
        (Some(_), Some(_), Some(_)) => Err("--width and --height must be positive".into()),
        _ => Err("Raw input requires --width, --height and --pixel-format".into()),
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn open_source(input: &Path, cli: &Cli) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
    if is_image(input) {
        Ok(Box::new(ImageFileSource::new()))
    } else {
        Ok(Box::new(RawFrameSource::new(raw_capabilities(cli)?)))
    }
}

fn open_sink(output: &Path) -> Box<dyn FrameSink> {
    if is_image(output) {
        Box::new(ImageFileSink::new(output))
    } else {
        Box::new(RawFrameSink::new(output))
    }
}

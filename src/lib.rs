//! Annotool: an image annotation workbench.
//!
//! Annotool keeps the labelled shapes drawn on an image (rectangles, polygons
//! and instance masks) in a per-image [`Workspace`](workspace::Workspace),
//! persists them next to the image, and turns raw instance-segmentation
//! network output into mask shapes.
//!
//! # Modules
//!
//! - [`geometry`]: points, shape-type codes and coordinate-space tagged boxes
//! - [`mask`]: binary masks and the column-major RLE codec
//! - [`shape`]: annotation records with bounded undo history
//! - [`inference`]: letterboxing, NMS and segmentation post-processing
//! - [`workspace`]: the annotation store and its file formats
//! - [`validation`]: structural checks with a structured report
//! - [`carrier`]: the decoded image a workspace is built around
//! - [`error`]: error types for annotool operations

pub mod carrier;
pub mod error;
pub mod geometry;
pub mod inference;
pub mod mask;
pub mod shape;
pub mod validation;
pub mod workspace;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub use error::AnnotoolError;

use geometry::{Point, ShapeType};
use inference::{ProcessorConfig, RawOutput, ReplayEngine, SegmentationPipeline};
use workspace::Workspace;

/// The annotool CLI application.
#[derive(Parser)]
#[command(name = "annotool")]
#[command(version, author, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    /// `RUST_LOG` takes precedence when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Show the image, its companion files and a shape summary.
    Info(ImageArgs),
    /// List every shape with its index.
    List(ImageArgs),
    /// Add a shape and save the annotation file.
    Add(AddArgs),
    /// Remove the shape at an index and save the annotation file.
    Remove(RemoveArgs),
    /// Replace the label and points of a shape and save the annotation file.
    Update(UpdateArgs),
    /// Post-process exported segmentation tensors into mask shapes.
    Infer(InferArgs),
    /// Validate the shapes of an image's annotation file.
    Validate(ValidateArgs),
}

#[derive(clap::Args)]
struct ImageArgs {
    /// Image file (jpg, jpeg, png, bmp, tiff, tif).
    image: PathBuf,
}

#[derive(clap::Args)]
struct AddArgs {
    /// Image file (jpg, jpeg, png, bmp, tiff, tif).
    image: PathBuf,

    /// Shape label.
    label: String,

    /// Shape type: 'rectangle', 'polygon', 'mask', or the codes 0, 1, 2.
    #[arg(value_parser = parse_shape_type)]
    shape_type: ShapeType,

    /// Point coordinates as a flat list: x1 y1 x2 y2 ...
    #[arg(required = true, num_args = 2.., allow_negative_numbers = true)]
    coords: Vec<f64>,
}

#[derive(clap::Args)]
struct RemoveArgs {
    /// Image file (jpg, jpeg, png, bmp, tiff, tif).
    image: PathBuf,

    /// Index of the shape to remove.
    index: usize,
}

#[derive(clap::Args)]
struct UpdateArgs {
    /// Image file (jpg, jpeg, png, bmp, tiff, tif).
    image: PathBuf,

    /// Index of the shape to update.
    index: usize,

    /// New label.
    label: String,

    /// New point coordinates as a flat list: x1 y1 x2 y2 ...
    #[arg(required = true, num_args = 2.., allow_negative_numbers = true)]
    coords: Vec<f64>,
}

#[derive(clap::Args)]
struct InferArgs {
    /// Image file (jpg, jpeg, png, bmp, tiff, tif).
    image: PathBuf,

    /// Detection tensor (.npy), shaped [1,] F x N.
    #[arg(long)]
    detections: PathBuf,

    /// Mask prototype tensor (.npy), shaped [1,] C x H x W.
    #[arg(long)]
    prototypes: PathBuf,

    /// Processor configuration (YAML).
    #[arg(long, env = "ANNOTOOL_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ValidateArgs {
    /// Image file (jpg, jpeg, png, bmp, tiff, tif).
    image: PathBuf,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    output: ReportFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Run the annotool CLI, parsing arguments from the process.
pub fn run() -> Result<(), AnnotoolError> {
    run_cli(Cli::parse())
}

/// Run the annotool CLI with already-parsed arguments.
///
/// `main.rs` parses first so it can configure logging from `--verbose`.
pub fn run_cli(cli: Cli) -> Result<(), AnnotoolError> {
    match cli.command {
        Some(Commands::Info(args)) => run_info(args),
        Some(Commands::List(args)) => run_list(args),
        Some(Commands::Add(args)) => run_add(args),
        Some(Commands::Remove(args)) => run_remove(args),
        Some(Commands::Update(args)) => run_update(args),
        Some(Commands::Infer(args)) => run_infer(args),
        Some(Commands::Validate(args)) => run_validate(args),
        None => {
            println!("annotool {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Image annotation workbench.");
            println!();
            println!("Run 'annotool --help' for usage information.");
            Ok(())
        }
    }
}

fn parse_shape_type(value: &str) -> Result<ShapeType, String> {
    match value.to_ascii_lowercase().as_str() {
        "rectangle" | "rect" => Ok(ShapeType::Rectangle),
        "polygon" | "poly" => Ok(ShapeType::Polygon),
        "mask" => Ok(ShapeType::Mask),
        other => other
            .parse::<i64>()
            .ok()
            .and_then(ShapeType::from_code)
            .ok_or_else(|| {
                format!(
                    "'{}' (supported: rectangle, polygon, mask, 0, 1, 2)",
                    value
                )
            }),
    }
}

fn points_from_coords(coords: &[f64]) -> Result<Vec<Point>, AnnotoolError> {
    if coords.len() % 2 != 0 {
        return Err(AnnotoolError::InvalidArgument(format!(
            "expected x y pairs, got {} coordinate(s)",
            coords.len()
        )));
    }
    let points: Vec<Point> = coords
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect();
    if let Some(point) = points.iter().find(|p| !p.is_finite()) {
        return Err(AnnotoolError::InvalidArgument(format!(
            "coordinates must be finite, got {}",
            point
        )));
    }
    Ok(points)
}

fn format_points(points: &[Point]) -> String {
    points
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn run_info(args: ImageArgs) -> Result<(), AnnotoolError> {
    let ws = Workspace::open(&args.image)?;
    let paths = ws.paths();

    println!("Image:      {}", paths.image.display());
    println!("Size:       {}x{}", ws.image_width(), ws.image_height());
    println!(
        "Annotation: {}{}",
        paths.annotation.display(),
        if paths.annotation.exists() { "" } else { " (missing)" }
    );
    println!(
        "Mask:       {}{}",
        paths.mask.display(),
        match ws.binary_mask() {
            Some(mask) => format!(" ({} foreground pixel(s))", mask.foreground_count()),
            None => " (none)".to_string(),
        }
    );

    let mut counts = [0usize; 3];
    for shape in ws.shapes() {
        counts[shape.shape_type().code() as usize] += 1;
    }
    println!(
        "Shapes:     {} ({} rectangle, {} polygon, {} mask)",
        ws.len(),
        counts[0],
        counts[1],
        counts[2]
    );
    Ok(())
}

fn run_list(args: ImageArgs) -> Result<(), AnnotoolError> {
    let ws = Workspace::open(&args.image)?;
    if ws.is_empty() {
        println!("No shapes.");
        return Ok(());
    }
    for (index, shape) in ws.shapes().enumerate() {
        let segment = shape
            .segment()
            .map(|s| format!(" [class {}, {:.3}]", s.class_id, s.confidence))
            .unwrap_or_default();
        println!(
            "{:>3}: {} ({}){} [{}]",
            index,
            shape.label(),
            shape.shape_type(),
            segment,
            format_points(shape.points())
        );
    }
    Ok(())
}

fn run_add(args: AddArgs) -> Result<(), AnnotoolError> {
    let points = points_from_coords(&args.coords)?;
    let mut ws = Workspace::open(&args.image)?;
    ws.add_shape(args.label, points, args.shape_type);
    ws.save_to_annotation_file()?;
    println!("Added shape at index {}.", ws.len() - 1);
    Ok(())
}

fn run_remove(args: RemoveArgs) -> Result<(), AnnotoolError> {
    let mut ws = Workspace::open(&args.image)?;
    let removed = ws.remove_shape(args.index)?;
    ws.save_to_annotation_file()?;
    println!("Removed shape {} ('{}').", args.index, removed.label());
    Ok(())
}

fn run_update(args: UpdateArgs) -> Result<(), AnnotoolError> {
    let points = points_from_coords(&args.coords)?;
    let mut ws = Workspace::open(&args.image)?;
    ws.update_shape(args.index, args.label, points)?;
    ws.save_to_annotation_file()?;
    println!("Updated shape {}.", args.index);
    Ok(())
}

fn run_infer(args: InferArgs) -> Result<(), AnnotoolError> {
    let config = match &args.config {
        Some(path) => ProcessorConfig::from_yaml_file(path)?,
        None => ProcessorConfig::default(),
    };
    let raw = RawOutput::read_npy(&args.detections, &args.prototypes)?;
    let mut pipeline = SegmentationPipeline::new(ReplayEngine::new(raw), config);

    let mut ws = Workspace::open(&args.image)?;
    let added = ws.run_model_processor(&mut pipeline)?;
    ws.save_to_annotation_file()?;
    ws.save_binary_mask_as_png()?;

    println!(
        "Added {} shape(s); {} total. Mask written to {}.",
        added,
        ws.len(),
        ws.paths().mask.display()
    );
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), AnnotoolError> {
    let ws = Workspace::open(&args.image)?;
    let opts = validation::ValidateOptions {
        strict: args.strict,
        ..Default::default()
    };
    let report = validation::validate_workspace(&ws, &opts);

    match args.output {
        ReportFormat::Json => {
            let json = report
                .to_json_string()
                .map_err(|e| AnnotoolError::Io(e.into()))?;
            println!("{}", json);
        }
        ReportFormat::Text => print!("{}", report),
    }

    report.into_result(opts.strict)
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use overlay_engine::{Color, Point};

#[derive(Parser, Debug)]
#[command(
    name = "blueprint-render",
    version,
    about = "Render blueprint detections, print statistics and export results"
)]
pub struct Cli {
    /// JSON viewer config; flags and environment override it.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Detection service base URL.
    #[arg(long, global = true, env = "BLUEPRINT_API_URL")]
    pub api_url: Option<String>,

    /// TrueType/OpenType font for label text.
    #[arg(long, global = true, env = "BLUEPRINT_FONT_PATH")]
    pub font: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Draw the blueprint with its detection overlay to a PNG.
    Render(RenderArgs),
    /// Print detection statistics.
    Stats(StatsArgs),
    /// Write detections as indented JSON.
    Export(ExportArgs),
    /// Upload a PNG or JPEG blueprint to the service.
    Upload {
        file: PathBuf,
        /// Run detection right after the upload.
        #[arg(long)]
        detect: bool,
    },
}

/// Where detections come from.
#[derive(Args, Debug, Clone)]
pub struct DetectionSourceArgs {
    /// Detections JSON: an array or an object with a `detections` field.
    #[arg(long, value_name = "FILE")]
    pub detections: Option<PathBuf>,

    /// Blueprint id on the detection service.
    #[arg(long, value_name = "ID")]
    pub blueprint: Option<String>,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Blueprint image on disk; otherwise fetched with --blueprint.
    #[arg(long, value_name = "FILE")]
    pub image: Option<PathBuf>,

    #[command(flatten)]
    pub source: DetectionSourceArgs,

    /// Only draw detections with this label (case-insensitive).
    #[arg(long)]
    pub label: Option<String>,

    #[arg(long)]
    pub width: Option<f64>,

    #[arg(long)]
    pub height: Option<f64>,

    /// Wheel steps to replay: positive zooms in, negative zooms out.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub zoom: i32,

    /// Drag distance to replay, as `dx,dy` in screen pixels.
    #[arg(long, value_parser = parse_pan, allow_hyphen_values = true)]
    pub pan: Option<Point>,

    /// Background behind the image, `rrggbb` or `rrggbbaa`.
    #[arg(long, default_value = "ffffff", value_parser = parse_color)]
    pub background: Color,

    #[arg(short, long, default_value = "blueprint-annotated.png")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub source: DetectionSourceArgs,

    /// Print the statistics as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: DetectionSourceArgs,

    /// Output file, or a directory to write `blueprint-<id>.json` into.
    /// Prints to stdout when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn parse_pan(value: &str) -> Result<Point, String> {
    let (dx, dy) = value
        .split_once(',')
        .ok_or_else(|| format!("expected dx,dy, got {value:?}"))?;
    let dx: f64 = dx.trim().parse().map_err(|e| format!("bad dx {dx:?}: {e}"))?;
    let dy: f64 = dy.trim().parse().map_err(|e| format!("bad dy {dy:?}: {e}"))?;
    Ok(Point::new(dx, dy))
}

fn parse_color(value: &str) -> Result<Color, String> {
    Color::from_hex(value).ok_or_else(|| format!("expected rrggbb or rrggbbaa, got {value:?}"))
}

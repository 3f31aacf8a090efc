//! `render` subcommand: the viewer without a browser.
//!
//! Loads the image and detections, replays the requested drag and wheel
//! gestures through the viewer, paints both layers on raster surfaces and
//! composites them into one PNG.

use anyhow::{bail, Context, Result};
use detection_client::DetectionService;
use image::RgbaImage;
use overlay_engine::{decode_image, load_font, Point, Rect, RasterSurface, Size, Surface, Viewer, ViewerConfig};
use tracing::{info, warn};

use crate::cli::RenderArgs;
use crate::commands::{load_detections, service};

pub async fn run(args: RenderArgs, mut config: ViewerConfig) -> Result<()> {
    if let Some(width) = args.width {
        config.viewport_width = width;
    }
    if let Some(height) = args.height {
        config.viewport_height = height;
    }
    config.validate().context("invalid viewport")?;

    let font = match &config.font_path {
        Some(path) => Some(load_font(path).with_context(|| format!("failed to load font {}", path.display()))?),
        None => {
            warn!("No font configured, label chips are drawn without text");
            None
        }
    };

    let mut viewer: Viewer<RgbaImage> = Viewer::new(&config);

    let (url, bytes) = match (&args.image, &args.source.blueprint) {
        (Some(path), _) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            (path.display().to_string(), bytes)
        }
        (None, Some(id)) => {
            let service = service(&config)?;
            let bytes = service
                .blueprint_image(id)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e.user_message()))
                .with_context(|| format!("failed to download blueprint {}", id))?;
            (service.blueprint_url(id), bytes)
        }
        (None, None) => bail!("pass --image FILE or --blueprint ID"),
    };

    let ticket = viewer.begin_load(url);
    let decoded = tokio::task::spawn_blocking(move || decode_image(&bytes))
        .await
        .context("image decoder stopped unexpectedly")?;
    viewer
        .finish_load(ticket, decoded)
        .context("failed to load blueprint image")?;

    if args.source.detections.is_some() || args.source.blueprint.is_some() {
        viewer.set_detections(load_detections(&args.source, &config).await?);
    } else {
        warn!("No detections given, rendering the image only");
    }
    viewer.set_selected_label(args.label.clone());

    replay_gestures(&mut viewer, args.pan, args.zoom);

    let mut base = RasterSurface::new(viewer.viewport());
    let mut overlay = RasterSurface::new(Size::default()).with_font(font);
    let frame = viewer.render(&mut base, &mut overlay).context("render failed")?;

    let mut canvas = RasterSurface::new(viewer.viewport());
    canvas.fill_rect(Rect::from_origin_size(Point::ORIGIN, viewer.viewport()), args.background);
    canvas.composite(base.pixels(), Point::ORIGIN);
    if let Some(placement) = frame.placement {
        canvas.composite(overlay.pixels(), placement.origin());
    }
    canvas
        .save_png(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    if !frame.skipped.is_empty() {
        warn!("{} detections could not be drawn", frame.skipped.len());
    }
    info!(
        "Drew {} boxes at {}% zoom",
        frame.boxes.len(),
        viewer.zoom_percent().unwrap_or(100)
    );
    println!("{}", args.output.display());
    Ok(())
}

/// Drag from the viewport centre by `pan`, then turn the wheel `zoom` notches.
fn replay_gestures(viewer: &mut Viewer<RgbaImage>, pan: Option<Point>, zoom: i32) {
    if let Some(delta) = pan {
        let viewport = viewer.viewport();
        let start = Point::new(viewport.width / 2.0, viewport.height / 2.0);
        viewer.pointer_down(start);
        viewer.pointer_move(start + delta);
        viewer.pointer_up();
    }

    let delta_y = if zoom > 0 { -1.0 } else { 1.0 };
    for _ in 0..zoom.unsigned_abs() {
        viewer.wheel(delta_y);
    }
}

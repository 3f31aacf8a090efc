//! Coordinate and overlay engine for blueprint detection viewers.
//!
//! A decoded blueprint is fitted into a viewport, panned and zoomed by pointer
//! input, and drawn on two stacked surfaces: the image itself and a layer of
//! labelled bounding boxes. Both surfaces are painted from the same
//! [`Transform`], so boxes stay registered with the pixels they describe.
//!
//! Drawing goes through the [`Surface`] trait. The browser frontend implements
//! it over `<canvas>`; the `raster` feature provides [`RasterSurface`] for
//! headless output.

pub mod base;
pub mod config;
pub mod detection;
pub mod error;
pub mod export;
pub mod geometry;
pub mod interaction;
pub mod overlay;
pub mod palette;
#[cfg(feature = "raster")]
pub mod raster;
pub mod stats;
pub mod surface;
pub mod transform;
pub mod viewer;

#[cfg(test)]
mod test_support;

pub use base::{BaseRenderer, LoadTicket};
pub use config::ViewerConfig;
pub use detection::{detections_from_value, filter_by_label, parse_detections, BBox, Detection};
pub use error::{Result, ViewerError};
pub use export::{export_file_name, export_json, export_summary};
pub use geometry::{Point, Rect, Size};
pub use interaction::{DragState, InteractionController, WheelOutcome};
pub use overlay::{OverlayFrame, OverlayRenderer, OverlayStyle, PaintedBox};
pub use palette::Color;
#[cfg(feature = "raster")]
pub use raster::{decode_image, load_font, RasterSurface};
pub use stats::{DetectionStats, TypeShare};
pub use surface::{FontSpec, ImageDimensions, Surface};
pub use transform::{Transform, ZoomLimits};
pub use viewer::Viewer;

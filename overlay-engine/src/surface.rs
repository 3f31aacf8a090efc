//! Drawing abstraction shared by the base and overlay renderers.
//!
//! A surface is one layer: the browser backs it with a `<canvas>` 2D context,
//! headless rendering backs it with an RGBA buffer. Renderers only talk to
//! this trait, so the geometry is computed once and reused on every backend.

use crate::error::Result;
use crate::geometry::{Point, Rect, Size};
use crate::palette::Color;

/// Font used for label chips.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub size_px: f64,
    pub bold: bool,
    pub family: String,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            size_px: 14.0,
            bold: true,
            family: "Inter, sans-serif".to_string(),
        }
    }
}

impl FontSpec {
    /// CSS font shorthand, e.g. `bold 14px Inter, sans-serif`.
    pub fn to_css(&self) -> String {
        let weight = if self.bold { "bold " } else { "" };
        format!("{}{}px {}", weight, self.size_px, self.family)
    }
}

/// Anything with pixel dimensions that a surface can draw.
pub trait ImageDimensions {
    fn dimensions(&self) -> Size;
}

pub trait Surface {
    /// Decoded image handle this surface can paint.
    type Image: ImageDimensions;

    fn size(&self) -> Size;

    /// Resize the backing store. Fractional sizes are floored.
    fn resize(&mut self, size: Size) -> Result<()>;

    /// Reset every pixel to transparent.
    fn clear(&mut self);

    fn draw_image(&mut self, image: &Self::Image, dest: Rect) -> Result<()>;

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f64);

    /// Fill, blending with `color.a` as opacity.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    fn measure_text(&self, text: &str, font: &FontSpec) -> f64;

    /// Draw `text` with its top-left corner at `origin`.
    fn fill_text(&mut self, text: &str, origin: Point, font: &FontSpec, color: Color) -> Result<()>;
}

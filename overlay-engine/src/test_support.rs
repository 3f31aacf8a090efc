//! Surface that records draw calls, for asserting geometry without pixels.

use crate::error::{Result, ViewerError};
use crate::geometry::{Point, Rect, Size};
use crate::palette::Color;
use crate::surface::{FontSpec, ImageDimensions, Surface};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FakeImage(pub Size);

impl ImageDimensions for FakeImage {
    fn dimensions(&self) -> Size {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    Image(Rect),
    Stroke(Rect, Color),
    Fill(Rect, Color),
    Text(String, Point),
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub size: Size,
    pub ops: Vec<DrawOp>,
    /// Make `fill_text` fail for texts containing this marker.
    pub fail_text_containing: Option<String>,
}

impl RecordingSurface {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    pub fn strokes(&self) -> Vec<Rect> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Stroke(rect, _) => Some(*rect),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<String> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text(text, _) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    type Image = FakeImage;

    fn size(&self) -> Size {
        self.size
    }

    fn resize(&mut self, size: Size) -> Result<()> {
        self.size = Size::new(size.width.floor(), size.height.floor());
        Ok(())
    }

    fn clear(&mut self) {
        self.ops.clear();
        self.ops.push(DrawOp::Clear);
    }

    fn draw_image(&mut self, _image: &FakeImage, dest: Rect) -> Result<()> {
        self.ops.push(DrawOp::Image(dest));
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, _line_width: f64) {
        self.ops.push(DrawOp::Stroke(rect, color));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ops.push(DrawOp::Fill(rect, color));
    }

    fn measure_text(&self, text: &str, font: &FontSpec) -> f64 {
        text.chars().count() as f64 * font.size_px * 0.5
    }

    fn fill_text(&mut self, text: &str, origin: Point, _font: &FontSpec, _color: Color) -> Result<()> {
        if let Some(marker) = &self.fail_text_containing {
            if text.contains(marker.as_str()) {
                return Err(ViewerError::Surface(format!("cannot draw {text}")));
            }
        }
        self.ops.push(DrawOp::Text(text.to_string(), origin));
        Ok(())
    }
}

//! Detection overlay layer.
//!
//! The overlay surface covers exactly the scaled image: it is sized to
//! `image * scale` and placed at the transform offset. Boxes are painted in
//! surface-local coordinates, so adding the placement origin gives the screen
//! rectangle `offset + bbox * scale` the base layer uses for the same pixels.

use tracing::{debug, warn};

use crate::detection::Detection;
use crate::error::Result;
use crate::geometry::{Point, Rect, Size};
use crate::palette::{self, Color};
use crate::surface::{FontSpec, Surface};
use crate::transform::Transform;

/// Box and label chip styling.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
    pub line_width: f64,
    /// Opacity of the box fill, 0x20 ≈ 12%.
    pub fill_alpha: u8,
    pub font: FontSpec,
    pub chip_text_height: f64,
    pub chip_padding: f64,
    pub text_color: Color,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            line_width: 3.0,
            fill_alpha: 0x20,
            font: FontSpec::default(),
            chip_text_height: 20.0,
            chip_padding: 6.0,
            text_color: palette::LABEL_TEXT,
        }
    }
}

/// One detection as it was painted.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintedBox {
    /// Position in the list handed to [`OverlayRenderer::render`].
    pub index: usize,
    pub label: String,
    pub color: Color,
    /// Rectangle relative to the overlay surface.
    pub local: Rect,
    /// Rectangle in viewport coordinates.
    pub screen: Rect,
    /// Label chip relative to the overlay surface.
    pub chip: Rect,
}

/// Result of one overlay pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayFrame {
    /// Where the overlay surface sits in the viewport; `None` without a transform.
    pub placement: Option<Rect>,
    pub boxes: Vec<PaintedBox>,
    /// Detections without a drawable bbox, or whose paint call failed.
    pub skipped: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct OverlayRenderer {
    style: OverlayStyle,
}

impl OverlayRenderer {
    pub fn new(style: OverlayStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// Overlay surface placement for `transform` over an image of `image_size`.
    pub fn placement(transform: &Transform, image_size: Size) -> Rect {
        transform.image_rect(image_size)
    }

    /// Clear `surface` and paint `detections` over an image of `image_size`.
    ///
    /// With no transform the surface is only cleared. A detection that cannot
    /// be painted is recorded in [`OverlayFrame::skipped`] and the pass carries
    /// on with the next one.
    pub fn render<'a, S, I>(
        &self,
        surface: &mut S,
        transform: Option<&Transform>,
        image_size: Size,
        detections: I,
    ) -> Result<OverlayFrame>
    where
        S: Surface,
        I: IntoIterator<Item = &'a Detection>,
    {
        let Some(transform) = transform else {
            surface.clear();
            return Ok(OverlayFrame::default());
        };

        let placement = Self::placement(transform, image_size);
        surface.resize(placement.size())?;
        surface.clear();

        let mut frame = OverlayFrame {
            placement: Some(placement),
            ..Default::default()
        };

        for (index, detection) in detections.into_iter().enumerate() {
            let Some(bbox) = detection.bbox() else {
                debug!("Detection #{} ({}) has no drawable bbox", index, detection.label);
                frame.skipped.push(index);
                continue;
            };

            let local = transform.map_local(&bbox);
            match self.paint_box(surface, detection, local) {
                Ok((color, chip)) => frame.boxes.push(PaintedBox {
                    index,
                    label: detection.label.clone(),
                    color,
                    local,
                    screen: local.translated(transform.offset()),
                    chip,
                }),
                Err(e) => {
                    warn!("Failed to paint detection #{} ({}): {}", index, detection.label, e);
                    frame.skipped.push(index);
                }
            }
        }

        Ok(frame)
    }

    fn paint_box<S: Surface>(&self, surface: &mut S, detection: &Detection, rect: Rect) -> Result<(Color, Rect)> {
        let color = palette::color_for_label(&detection.label);

        surface.stroke_rect(rect, color, self.style.line_width);
        surface.fill_rect(rect, color.with_alpha(self.style.fill_alpha));

        let text = detection.chip_text();
        let text_width = surface.measure_text(&text, &self.style.font);
        let chip = self.chip_rect(rect.normalized().origin(), text_width, surface.size());

        surface.fill_rect(chip, color);
        let text_origin = Point::new(
            chip.x + self.style.chip_padding,
            chip.y + (chip.height - self.style.font.size_px) / 2.0,
        );
        surface.fill_text(&text, text_origin, &self.style.font, self.style.text_color)?;

        Ok((color, chip))
    }

    /// Chip anchored above `anchor`, pulled back inside the surface when it
    /// would overflow the top or right edge.
    pub fn chip_rect(&self, anchor: Point, text_width: f64, bounds: Size) -> Rect {
        let padding = self.style.chip_padding;
        let width = text_width + padding * 2.0;
        let height = self.style.chip_text_height + padding;

        let mut x = anchor.x;
        let mut y = anchor.y - height;

        if x + width > bounds.width {
            x = bounds.width - width;
        }
        x = x.max(0.0);
        y = y.max(0.0);

        Rect::new(x, y, width, height)
    }
}

use overlay_engine::{Color, FontSpec, ImageDimensions, Point, Rect, Size, Surface, ViewerError};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

/// Approximate glyph advance when the browser cannot measure text.
const FALLBACK_ADVANCE: f64 = 0.6;

pub fn js_error(value: JsValue) -> ViewerError {
    ViewerError::Surface(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
}

/// A decoded `<img>`. Only drawn once `onload` has fired.
#[derive(Debug, Clone)]
pub struct BrowserImage(pub HtmlImageElement);

impl ImageDimensions for BrowserImage {
    fn dimensions(&self) -> Size {
        Size::new(self.0.natural_width() as f64, self.0.natural_height() as f64)
    }
}

/// One `<canvas>` layer.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, ViewerError> {
        let context = canvas
            .get_context("2d")
            .map_err(js_error)?
            .ok_or_else(|| ViewerError::Surface("2d context unavailable".to_string()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| ViewerError::Surface("context is not 2d".to_string()))?;
        Ok(Self { canvas, context })
    }

    /// Move the canvas to `at` inside its positioned container.
    pub fn place(&self, at: Point) -> Result<(), ViewerError> {
        let style = self.canvas.style();
        style.set_property("left", &format!("{}px", at.x)).map_err(js_error)?;
        style.set_property("top", &format!("{}px", at.y)).map_err(js_error)?;
        Ok(())
    }
}

impl Surface for CanvasSurface {
    type Image = BrowserImage;

    fn size(&self) -> Size {
        Size::new(self.canvas.width() as f64, self.canvas.height() as f64)
    }

    fn resize(&mut self, size: Size) -> Result<(), ViewerError> {
        let width = size.width.max(0.0).floor() as u32;
        let height = size.height.max(0.0).floor() as u32;
        // Assigning a dimension wipes the canvas, so only do it on change.
        if self.canvas.width() != width {
            self.canvas.set_width(width);
        }
        if self.canvas.height() != height {
            self.canvas.set_height(height);
        }
        Ok(())
    }

    fn clear(&mut self) {
        let size = self.size();
        self.context.clear_rect(0.0, 0.0, size.width, size.height);
    }

    fn draw_image(&mut self, image: &BrowserImage, dest: Rect) -> Result<(), ViewerError> {
        self.context
            .draw_image_with_html_image_element_and_dw_and_dh(&image.0, dest.x, dest.y, dest.width, dest.height)
            .map_err(js_error)
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f64) {
        self.context.set_stroke_style(&color.to_hex().into());
        self.context.set_line_width(line_width);
        self.context.stroke_rect(rect.x, rect.y, rect.width, rect.height);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.context.set_fill_style(&color.to_hex().into());
        self.context.fill_rect(rect.x, rect.y, rect.width, rect.height);
    }

    fn measure_text(&self, text: &str, font: &FontSpec) -> f64 {
        self.context.set_font(&font.to_css());
        self.context
            .measure_text(text)
            .map(|metrics| metrics.width())
            .unwrap_or_else(|_| text.chars().count() as f64 * font.size_px * FALLBACK_ADVANCE)
    }

    fn fill_text(&mut self, text: &str, origin: Point, font: &FontSpec, color: Color) -> Result<(), ViewerError> {
        self.context.set_font(&font.to_css());
        self.context.set_fill_style(&color.to_hex().into());
        self.context.set_text_baseline("top");
        self.context.fill_text(text, origin.x, origin.y).map_err(js_error)
    }
}

//! Software surface over an RGBA buffer, for headless rendering.

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::imageops::{self, FilterType};
use image::{ImageFormat, Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use tracing::trace;

use crate::error::{Result, ViewerError};
use crate::geometry::{Point, Rect, Size};
use crate::palette::Color;
use crate::surface::{FontSpec, ImageDimensions, Surface};

/// Average glyph advance as a share of the font size, used without a font.
const FALLBACK_ADVANCE: f64 = 0.6;

impl ImageDimensions for RgbaImage {
    fn dimensions(&self) -> Size {
        Size::new(self.width() as f64, self.height() as f64)
    }
}

impl From<Color> for Rgba<u8> {
    fn from(color: Color) -> Self {
        Rgba([color.r, color.g, color.b, color.a])
    }
}

/// Decode PNG or JPEG bytes.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage> {
    let image = image::load_from_memory(bytes).map_err(|e| ViewerError::ImageLoad(e.to_string()))?;
    Ok(image.to_rgba8())
}

pub fn load_font(path: impl AsRef<Path>) -> Result<FontArc> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    FontArc::try_from_vec(data)
        .map_err(|e| ViewerError::InvalidConfig(format!("{} is not a usable font: {}", path.display(), e)))
}

pub struct RasterSurface {
    pixels: RgbaImage,
    font: Option<FontArc>,
}

impl RasterSurface {
    pub fn new(size: Size) -> Self {
        Self {
            pixels: RgbaImage::new(floor_px(size.width), floor_px(size.height)),
            font: None,
        }
    }

    /// Without a font, label text is measured approximately and not drawn.
    pub fn with_font(mut self, font: Option<FontArc>) -> Self {
        self.font = font;
        self
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    /// Alpha-composite `layer` with its top-left corner at `at`.
    pub fn composite(&mut self, layer: &RgbaImage, at: Point) {
        imageops::overlay(&mut self.pixels, layer, at.x.round() as i64, at.y.round() as i64);
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        self.pixels
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| ViewerError::Surface(e.to_string()))
    }
}

fn floor_px(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.floor() as u32
    } else {
        0
    }
}

impl Surface for RasterSurface {
    type Image = RgbaImage;

    fn size(&self) -> Size {
        ImageDimensions::dimensions(&self.pixels)
    }

    fn resize(&mut self, size: Size) -> Result<()> {
        let (width, height) = (floor_px(size.width), floor_px(size.height));
        if (width, height) != self.pixels.dimensions() {
            self.pixels = RgbaImage::new(width, height);
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.pixels.pixels_mut().for_each(|p| *p = Rgba([0, 0, 0, 0]));
    }

    fn draw_image(&mut self, image: &RgbaImage, dest: Rect) -> Result<()> {
        let (img_w, img_h) = image.dimensions();
        if img_w == 0 || img_h == 0 || dest.width <= 0.0 || dest.height <= 0.0 {
            return Ok(());
        }
        let scale_x = dest.width / img_w as f64;
        let scale_y = dest.height / img_h as f64;

        // Only resample the part of the image that lands on the surface.
        let bounds = self.size();
        let visible_x0 = dest.x.max(0.0);
        let visible_y0 = dest.y.max(0.0);
        let visible_x1 = dest.right().min(bounds.width);
        let visible_y1 = dest.bottom().min(bounds.height);
        if visible_x1 <= visible_x0 || visible_y1 <= visible_y0 {
            return Ok(());
        }

        let src_x0 = (((visible_x0 - dest.x) / scale_x).floor() as u32).min(img_w);
        let src_y0 = (((visible_y0 - dest.y) / scale_y).floor() as u32).min(img_h);
        let src_x1 = (((visible_x1 - dest.x) / scale_x).ceil() as u32).min(img_w);
        let src_y1 = (((visible_y1 - dest.y) / scale_y).ceil() as u32).min(img_h);
        if src_x1 <= src_x0 || src_y1 <= src_y0 {
            return Ok(());
        }

        let src_w = src_x1 - src_x0;
        let src_h = src_y1 - src_y0;
        let out_w = ((src_w as f64 * scale_x).round() as u32).max(1);
        let out_h = ((src_h as f64 * scale_y).round() as u32).max(1);

        let region = imageops::crop_imm(image, src_x0, src_y0, src_w, src_h).to_image();
        let scaled = imageops::resize(&region, out_w, out_h, FilterType::Triangle);
        let at = Point::new(dest.x + src_x0 as f64 * scale_x, dest.y + src_y0 as f64 * scale_y);
        self.composite(&scaled, at);
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f64) {
        let rect = rect.normalized();
        let x = rect.x.round() as i32;
        let y = rect.y.round() as i32;
        let width = rect.width.round() as i32;
        let height = rect.height.round() as i32;
        let line = line_width.round().max(1.0) as i32;

        // Centre the line on the path, like a canvas stroke.
        for step in 0..line {
            let inset = step - line / 2;
            let w = width - 2 * inset;
            let h = height - 2 * inset;
            if w < 1 || h < 1 {
                continue;
            }
            let ring = imageproc::rect::Rect::at(x + inset, y + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(&mut self.pixels, ring, color.into());
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let rect = rect.normalized();
        let (width, height) = self.pixels.dimensions();
        let x0 = rect.x.round().max(0.0) as u32;
        let y0 = rect.y.round().max(0.0) as u32;
        let x1 = (rect.right().round().max(0.0) as u32).min(width);
        let y1 = (rect.bottom().round().max(0.0) as u32).min(height);

        let paint: Rgba<u8> = color.into();
        for y in y0..y1 {
            for x in x0..x1 {
                self.pixels.get_pixel_mut(x, y).blend(&paint);
            }
        }
    }

    fn measure_text(&self, text: &str, font: &FontSpec) -> f64 {
        match &self.font {
            Some(face) => text_size(PxScale::from(font.size_px as f32), face, text).0 as f64,
            None => text.chars().count() as f64 * font.size_px * FALLBACK_ADVANCE,
        }
    }

    fn fill_text(&mut self, text: &str, origin: Point, font: &FontSpec, color: Color) -> Result<()> {
        let Some(face) = &self.font else {
            trace!("No font loaded, skipping label {:?}", text);
            return Ok(());
        };
        draw_text_mut(
            &mut self.pixels,
            color.into(),
            origin.x.round() as i32,
            origin.y.round() as i32,
            PxScale::from(font.size_px as f32),
            face,
            text,
        );
        Ok(())
    }
}

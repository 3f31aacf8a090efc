//! Image-space to screen-space mapping shared by the base and overlay layers.
//!
//! A [`Transform`] is created when an image finishes loading. `fit_scale` is
//! fixed for that image and viewport; `user_scale` and `offset` are changed by
//! the interaction controller. Both layers read the same value for a frame, so
//! a bounding box always lands at
//! `offset + bbox * fit_scale * user_scale`.

use serde::{Deserialize, Serialize};

use crate::detection::BBox;
use crate::error::{Result, ViewerError};
use crate::geometry::{Point, Rect, Size};

pub const MIN_USER_SCALE: f64 = 0.1;
pub const MAX_USER_SCALE: f64 = 5.0;
pub const ZOOM_STEP: f64 = 1.1;

/// Bounds and step for wheel zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    #[serde(default = "default_min")]
    pub min: f64,
    #[serde(default = "default_max")]
    pub max: f64,
    #[serde(default = "default_step")]
    pub step: f64,
}

fn default_min() -> f64 {
    MIN_USER_SCALE
}

fn default_max() -> f64 {
    MAX_USER_SCALE
}

fn default_step() -> f64 {
    ZOOM_STEP
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: MIN_USER_SCALE,
            max: MAX_USER_SCALE,
            step: ZOOM_STEP,
        }
    }
}

impl ZoomLimits {
    pub fn validate(&self) -> Result<()> {
        if !(self.min.is_finite() && self.min > 0.0) {
            return Err(ViewerError::InvalidConfig(format!(
                "zoom minimum must be positive, got {}",
                self.min
            )));
        }
        if !(self.max.is_finite() && self.max >= self.min) {
            return Err(ViewerError::InvalidConfig(format!(
                "zoom maximum {} is below minimum {}",
                self.max, self.min
            )));
        }
        if !(self.step.is_finite() && self.step > 1.0) {
            return Err(ViewerError::InvalidConfig(format!(
                "zoom step must be greater than 1, got {}",
                self.step
            )));
        }
        Ok(())
    }

    pub fn clamp(&self, scale: f64) -> f64 {
        scale.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    fit_scale: f64,
    user_scale: f64,
    offset: Point,
}

/// `min(vw/iw, vh/ih, 1.0)`: fit the image without ever upscaling it.
pub fn fit_scale(image: Size, viewport: Size) -> f64 {
    (viewport.width / image.width)
        .min(viewport.height / image.height)
        .min(1.0)
}

impl Transform {
    /// Fit `image` into `viewport` and centre it, at a user zoom of 1.
    pub fn fit(image: Size, viewport: Size) -> Result<Self> {
        if image.is_empty() {
            return Err(ViewerError::EmptyImage {
                width: image.width,
                height: image.height,
            });
        }
        if viewport.is_empty() {
            return Err(ViewerError::EmptyViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }

        let fit_scale = fit_scale(image, viewport);
        let scaled = image.scaled(fit_scale);
        let offset = Point::new(
            (viewport.width - scaled.width) / 2.0,
            (viewport.height - scaled.height) / 2.0,
        );

        Ok(Self {
            fit_scale,
            user_scale: 1.0,
            offset,
        })
    }

    pub fn fit_scale(&self) -> f64 {
        self.fit_scale
    }

    pub fn user_scale(&self) -> f64 {
        self.user_scale
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    /// Effective image-to-screen factor.
    pub fn scale(&self) -> f64 {
        self.fit_scale * self.user_scale
    }

    pub fn set_offset(&mut self, offset: Point) {
        self.offset = offset;
    }

    /// Set the user zoom, clamped to `limits`. Returns the stored value.
    pub fn set_user_scale(&mut self, user_scale: f64, limits: &ZoomLimits) -> f64 {
        self.user_scale = limits.clamp(user_scale);
        self.user_scale
    }

    pub fn to_screen(&self, point: Point) -> Point {
        let scale = self.scale();
        Point::new(self.offset.x + point.x * scale, self.offset.y + point.y * scale)
    }

    /// Scaled bbox relative to the overlay surface origin.
    pub fn map_local(&self, bbox: &BBox) -> Rect {
        let scale = self.scale();
        Rect::new(
            bbox.x * scale,
            bbox.y * scale,
            bbox.width * scale,
            bbox.height * scale,
        )
    }

    /// Scaled bbox in screen space.
    pub fn map_screen(&self, bbox: &BBox) -> Rect {
        self.map_local(bbox).translated(self.offset)
    }

    /// Where the whole image lands on screen.
    pub fn image_rect(&self, image: Size) -> Rect {
        Rect::from_origin_size(self.offset, image.scaled(self.scale()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_downscales_and_centres() {
        let transform = Transform::fit(Size::new(1000.0, 800.0), Size::new(500.0, 500.0)).unwrap();
        assert_eq!(transform.fit_scale(), 0.5);
        assert_eq!(transform.user_scale(), 1.0);
        assert_eq!(transform.offset(), Point::new(0.0, 50.0));
    }

    #[test]
    fn test_fit_never_upscales() {
        let transform = Transform::fit(Size::new(200.0, 100.0), Size::new(800.0, 600.0)).unwrap();
        assert_eq!(transform.fit_scale(), 1.0);
        assert_eq!(transform.offset(), Point::new(300.0, 250.0));
    }

    #[test]
    fn test_fit_matches_formula_across_shapes() {
        let cases = [
            (640.0, 480.0, 320.0, 400.0),
            (300.0, 900.0, 800.0, 600.0),
            (1920.0, 1080.0, 1024.0, 768.0),
            (50.0, 5000.0, 640.0, 640.0),
        ];

        for (iw, ih, vw, vh) in cases {
            let transform = Transform::fit(Size::new(iw, ih), Size::new(vw, vh)).unwrap();
            let expected = (vw / iw).min(vh / ih).min(1.0);
            assert!((transform.fit_scale() - expected).abs() < 1e-12);
            assert!((transform.offset().x - (vw - iw * expected) / 2.0).abs() < 1e-9);
            assert!((transform.offset().y - (vh - ih * expected) / 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_fit_rejects_empty_inputs() {
        assert!(matches!(
            Transform::fit(Size::new(0.0, 10.0), Size::new(10.0, 10.0)),
            Err(ViewerError::EmptyImage { .. })
        ));
        assert!(matches!(
            Transform::fit(Size::new(10.0, 10.0), Size::new(10.0, 0.0)),
            Err(ViewerError::EmptyViewport { .. })
        ));
    }

    #[test]
    fn test_map_screen_uses_combined_scale() {
        let mut transform = Transform::fit(Size::new(1000.0, 800.0), Size::new(500.0, 500.0)).unwrap();
        transform.set_user_scale(2.0, &ZoomLimits::default());
        transform.set_offset(Point::new(-20.0, 10.0));

        let rect = transform.map_screen(&BBox::new(100.0, 100.0, 50.0, 20.0));
        assert_eq!(rect, Rect::new(80.0, 110.0, 50.0, 20.0));
    }

    #[test]
    fn test_set_user_scale_clamps() {
        let mut transform = Transform::fit(Size::new(10.0, 10.0), Size::new(10.0, 10.0)).unwrap();
        let limits = ZoomLimits::default();
        assert_eq!(transform.set_user_scale(9.0, &limits), MAX_USER_SCALE);
        assert_eq!(transform.set_user_scale(0.01, &limits), MIN_USER_SCALE);
    }

    #[test]
    fn test_zoom_limits_validation() {
        assert!(ZoomLimits::default().validate().is_ok());
        let bad_step = ZoomLimits { step: 1.0, ..ZoomLimits::default() };
        assert!(bad_step.validate().is_err());
        let inverted = ZoomLimits { min: 2.0, max: 1.0, step: 1.1 };
        assert!(inverted.validate().is_err());
    }
}

//! The viewer owns the one [`Transform`] both layers draw with.
//!
//! Input handlers mutate it through the interaction controller; a render
//! copies it once and hands the same value to the base and overlay renderers,
//! so the two layers cannot disagree on scale or offset.

use tracing::debug;

use crate::base::{BaseRenderer, LoadTicket};
use crate::config::ViewerConfig;
use crate::detection::{filter_by_label, Detection};
use crate::error::{Result, ViewerError};
use crate::geometry::{Point, Size};
use crate::interaction::InteractionController;
use crate::overlay::{OverlayFrame, OverlayRenderer, OverlayStyle};
use crate::stats::DetectionStats;
use crate::surface::{ImageDimensions, Surface};
use crate::transform::Transform;

#[derive(Debug)]
pub struct Viewer<H> {
    viewport: Size,
    base: BaseRenderer<H>,
    overlay: OverlayRenderer,
    interaction: InteractionController,
    transform: Option<Transform>,
    detections: Vec<Detection>,
    selected_label: Option<String>,
}

impl<H: ImageDimensions> Viewer<H> {
    pub fn new(config: &ViewerConfig) -> Self {
        Self::with_style(config, OverlayStyle::default())
    }

    pub fn with_style(config: &ViewerConfig, style: OverlayStyle) -> Self {
        Self {
            viewport: config.viewport(),
            base: BaseRenderer::new(),
            overlay: OverlayRenderer::new(style),
            interaction: InteractionController::new(config.zoom),
            transform: None,
            detections: Vec::new(),
            selected_label: None,
        }
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    pub fn image(&self) -> Option<&H> {
        self.base.image()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.base.url()
    }

    pub fn is_loaded(&self) -> bool {
        self.transform.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.interaction.is_dragging()
    }

    /// Start showing a new image. The old transform is dropped right away.
    pub fn begin_load(&mut self, url: impl Into<String>) -> LoadTicket {
        self.transform = None;
        self.interaction.reset();
        self.base.begin_load(url)
    }

    /// Apply a finished load. Returns true when it was current and applied.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<H>) -> Result<bool> {
        match self.base.complete(ticket, result, self.viewport)? {
            Some(transform) => {
                self.transform = Some(transform);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Re-fit the image into a new viewport, keeping the user's zoom.
    pub fn resize(&mut self, viewport: Size) -> Result<()> {
        if viewport.is_empty() {
            return Err(ViewerError::EmptyViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        let Some(image_size) = self.base.image_size() else {
            self.viewport = viewport;
            return Ok(());
        };

        let user_scale = self.transform.map(|t| t.user_scale()).unwrap_or(1.0);
        let mut transform = Transform::fit(image_size, viewport)?;
        transform.set_user_scale(user_scale, self.interaction.limits());
        debug!(
            "Viewport resized to {}x{}, fit scale {:.3}",
            viewport.width,
            viewport.height,
            transform.fit_scale()
        );
        self.viewport = viewport;
        self.transform = Some(transform);
        Ok(())
    }

    pub fn set_detections(&mut self, detections: Vec<Detection>) {
        self.detections = detections;
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    /// Restrict the overlay to one label. Does not touch the transform.
    pub fn set_selected_label(&mut self, label: Option<String>) {
        self.selected_label = label.filter(|l| !l.is_empty());
    }

    pub fn selected_label(&self) -> Option<&str> {
        self.selected_label.as_deref()
    }

    pub fn visible_detections(&self) -> Vec<&Detection> {
        filter_by_label(&self.detections, self.selected_label.as_deref())
    }

    /// Statistics over every detection, ignoring the label filter.
    pub fn stats(&self) -> DetectionStats {
        DetectionStats::from_detections(&self.detections)
    }

    /// `round(scale * 100)`, for a "Zoom: N%" readout.
    pub fn zoom_percent(&self) -> Option<u32> {
        self.transform.map(|t| (t.scale() * 100.0).round() as u32)
    }

    pub fn pointer_down(&mut self, pointer: Point) {
        if let Some(transform) = &self.transform {
            self.interaction.pointer_down(pointer, transform);
        }
    }

    /// Returns true when a redraw is needed.
    pub fn pointer_move(&mut self, pointer: Point) -> bool {
        match self.transform.as_mut() {
            Some(transform) => self.interaction.pointer_move(pointer, transform),
            None => false,
        }
    }

    pub fn pointer_up(&mut self) {
        self.interaction.pointer_up();
    }

    pub fn pointer_leave(&mut self) {
        self.interaction.pointer_leave();
    }

    /// Returns true when a redraw is needed. Hosts suppress the page scroll
    /// for every wheel event over the viewer, loaded or not.
    pub fn wheel(&mut self, delta_y: f64) -> bool {
        match self.transform.as_mut() {
            Some(transform) => self.interaction.wheel(delta_y, transform).changed,
            None => false,
        }
    }

    /// Paint both layers from a single snapshot of the transform.
    pub fn render<B, O>(&self, base: &mut B, overlay: &mut O) -> Result<OverlayFrame>
    where
        B: Surface<Image = H>,
        O: Surface,
    {
        let transform = self.transform;
        let image_size = self.base.image_size().unwrap_or_default();

        match &transform {
            Some(t) => self.base.paint(base, t)?,
            None => base.clear(),
        }

        self.overlay
            .render(overlay, transform.as_ref(), image_size, self.visible_detections())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::test_support::{DrawOp, FakeImage, RecordingSurface};

    fn config(width: f64, height: f64) -> ViewerConfig {
        ViewerConfig {
            viewport_width: width,
            viewport_height: height,
            ..ViewerConfig::default()
        }
    }

    fn loaded_viewer() -> Viewer<FakeImage> {
        let mut viewer = Viewer::new(&config(500.0, 500.0));
        let ticket = viewer.begin_load("/blueprints/abc");
        assert!(viewer
            .finish_load(ticket, Ok(FakeImage(Size::new(1000.0, 800.0))))
            .unwrap());
        viewer.set_detections(vec![
            Detection::new("wall", 0.95, [0.0, 0.0, 1000.0, 20.0]),
            Detection::new("door", 0.89, [100.0, 100.0, 50.0, 20.0]),
        ]);
        viewer
    }

    fn surfaces() -> (RecordingSurface, RecordingSurface) {
        (
            RecordingSurface::new(Size::new(500.0, 500.0)),
            RecordingSurface::default(),
        )
    }

    #[test]
    fn test_layers_share_transform_after_pan_and_zoom() {
        let mut viewer = loaded_viewer();
        viewer.pointer_down(Point::new(200.0, 200.0));
        assert!(viewer.pointer_move(Point::new(260.0, 180.0)));
        viewer.pointer_up();
        assert!(viewer.wheel(-100.0));
        assert!(viewer.wheel(-100.0));

        let (mut base, mut overlay) = surfaces();
        let frame = viewer.render(&mut base, &mut overlay).unwrap();

        let transform = viewer.transform().unwrap();
        let image_rect = match base.ops[1] {
            DrawOp::Image(rect) => rect,
            ref other => panic!("expected image draw, got {other:?}"),
        };
        assert_eq!(image_rect, transform.image_rect(Size::new(1000.0, 800.0)));
        assert_eq!(frame.placement, Some(image_rect));

        let door = &frame.boxes[1];
        let scale = transform.scale();
        let expected = Rect::new(
            image_rect.x + 100.0 * scale,
            image_rect.y + 100.0 * scale,
            50.0 * scale,
            20.0 * scale,
        );
        assert!(door.screen.approx_eq(&expected, 1e-9));
    }

    #[test]
    fn test_selected_label_filters_without_refit() {
        let mut viewer = loaded_viewer();
        viewer.wheel(-1.0);
        let before = *viewer.transform().unwrap();

        viewer.set_selected_label(Some("DOOR".to_string()));
        let visible = viewer.visible_detections();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].label, "door");
        assert_eq!(*viewer.transform().unwrap(), before);

        let (mut base, mut overlay) = surfaces();
        let frame = viewer.render(&mut base, &mut overlay).unwrap();
        assert_eq!(frame.boxes.len(), 1);
        assert_eq!(viewer.stats().total, 2);
    }

    #[test]
    fn test_new_image_resets_transform() {
        let mut viewer = loaded_viewer();
        viewer.wheel(-1.0);
        viewer.pointer_down(Point::new(1.0, 1.0));

        let ticket = viewer.begin_load("/blueprints/next");
        assert!(viewer.transform().is_none());
        assert!(!viewer.is_dragging());
        assert!(!viewer.wheel(-1.0));

        viewer
            .finish_load(ticket, Ok(FakeImage(Size::new(250.0, 250.0))))
            .unwrap();
        let transform = viewer.transform().unwrap();
        assert_eq!(transform.user_scale(), 1.0);
        assert_eq!(transform.fit_scale(), 1.0);
        assert_eq!(transform.offset(), Point::new(125.0, 125.0));
    }

    #[test]
    fn test_stale_load_does_not_replace_newer_image() {
        let mut viewer: Viewer<FakeImage> = Viewer::new(&config(500.0, 500.0));
        let first = viewer.begin_load("/blueprints/first");
        let second = viewer.begin_load("/blueprints/second");

        assert!(viewer
            .finish_load(second, Ok(FakeImage(Size::new(100.0, 100.0))))
            .unwrap());
        assert!(!viewer
            .finish_load(first, Ok(FakeImage(Size::new(5000.0, 5000.0))))
            .unwrap());

        assert_eq!(viewer.image_url(), Some("/blueprints/second"));
        assert_eq!(viewer.transform().unwrap().fit_scale(), 1.0);
    }

    #[test]
    fn test_render_before_load_clears_both_layers() {
        let mut viewer: Viewer<FakeImage> = Viewer::new(&config(500.0, 500.0));
        viewer.set_detections(vec![Detection::new("wall", 0.9, [0.0, 0.0, 1.0, 1.0])]);
        viewer.pointer_down(Point::new(1.0, 1.0));
        assert!(!viewer.is_dragging());

        let (mut base, mut overlay) = surfaces();
        let frame = viewer.render(&mut base, &mut overlay).unwrap();
        assert_eq!(base.ops, vec![DrawOp::Clear]);
        assert_eq!(overlay.ops, vec![DrawOp::Clear]);
        assert!(frame.placement.is_none());
        assert_eq!(viewer.zoom_percent(), None);
    }

    #[test]
    fn test_resize_refits_and_keeps_zoom() {
        let mut viewer = loaded_viewer();
        viewer.wheel(-1.0);
        let user_scale = viewer.transform().unwrap().user_scale();

        viewer.resize(Size::new(250.0, 250.0)).unwrap();
        let transform = viewer.transform().unwrap();
        assert_eq!(transform.fit_scale(), 0.25);
        assert_eq!(transform.user_scale(), user_scale);
        assert_eq!(transform.offset(), Point::new(0.0, 25.0));
    }

    #[test]
    fn test_rejected_resize_keeps_viewport_and_transform() {
        let mut viewer = loaded_viewer();
        let before = *viewer.transform().unwrap();

        assert!(matches!(
            viewer.resize(Size::new(0.0, 300.0)),
            Err(ViewerError::EmptyViewport { .. })
        ));
        assert_eq!(viewer.viewport(), Size::new(500.0, 500.0));
        assert_eq!(*viewer.transform().unwrap(), before);
    }

    #[test]
    fn test_zoom_percent() {
        let mut viewer = loaded_viewer();
        assert_eq!(viewer.zoom_percent(), Some(50));
        viewer.wheel(-1.0);
        assert_eq!(viewer.zoom_percent(), Some(55));
    }
}

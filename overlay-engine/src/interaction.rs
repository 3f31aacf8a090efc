//! Pointer and wheel handling.
//!
//! Two states: `Idle` and `Dragging`. Pointer-down captures the anchor
//! `pointer - offset`; while dragging the offset follows `pointer - anchor`.
//! Wheel events scale `user_scale` by the zoom step in either state. The
//! controller never owns the transform, it mutates the one it is handed.

use crate::geometry::Point;
use crate::transform::{Transform, ZoomLimits};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        anchor: Point,
    },
}

/// What the host should do after a wheel event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelOutcome {
    /// The transform changed and both layers need a redraw.
    pub changed: bool,
    /// The host must stop the page from scrolling.
    pub suppress_default: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    state: DragState,
    limits: ZoomLimits,
}

impl InteractionController {
    pub fn new(limits: ZoomLimits) -> Self {
        Self {
            state: DragState::Idle,
            limits,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn limits(&self) -> &ZoomLimits {
        &self.limits
    }

    pub fn pointer_down(&mut self, pointer: Point, transform: &Transform) {
        self.state = DragState::Dragging {
            anchor: pointer - transform.offset(),
        };
    }

    /// Returns true when the offset moved.
    pub fn pointer_move(&mut self, pointer: Point, transform: &mut Transform) -> bool {
        match self.state {
            DragState::Dragging { anchor } => {
                let offset = pointer - anchor;
                let moved = offset != transform.offset();
                transform.set_offset(offset);
                moved
            }
            DragState::Idle => false,
        }
    }

    pub fn pointer_up(&mut self) {
        self.state = DragState::Idle;
    }

    pub fn pointer_leave(&mut self) {
        self.state = DragState::Idle;
    }

    /// Negative `delta_y` (wheel up) zooms in, positive zooms out, zero is ignored.
    pub fn wheel(&mut self, delta_y: f64, transform: &mut Transform) -> WheelOutcome {
        let factor = if delta_y < 0.0 {
            self.limits.step
        } else if delta_y > 0.0 {
            1.0 / self.limits.step
        } else {
            return WheelOutcome {
                changed: false,
                suppress_default: true,
            };
        };

        let before = transform.user_scale();
        let after = transform.set_user_scale(before * factor, &self.limits);

        WheelOutcome {
            changed: after != before,
            suppress_default: true,
        }
    }

    /// Forget any drag in progress.
    pub fn reset(&mut self) {
        self.state = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::transform::{MAX_USER_SCALE, MIN_USER_SCALE};

    fn transform() -> Transform {
        Transform::fit(Size::new(1000.0, 800.0), Size::new(500.0, 500.0)).unwrap()
    }

    #[test]
    fn test_drag_moves_offset_by_pointer_delta() {
        let mut controller = InteractionController::default();
        let mut transform = transform();

        controller.pointer_down(Point::new(100.0, 100.0), &transform);
        assert!(controller.is_dragging());
        assert_eq!(
            controller.state(),
            DragState::Dragging {
                anchor: Point::new(100.0, 50.0)
            }
        );

        assert!(controller.pointer_move(Point::new(130.0, 90.0), &mut transform));
        assert_eq!(transform.offset(), Point::new(30.0, 40.0));

        controller.pointer_up();
        assert!(!controller.pointer_move(Point::new(500.0, 500.0), &mut transform));
        assert_eq!(transform.offset(), Point::new(30.0, 40.0));
    }

    #[test]
    fn test_drag_keeps_scale() {
        let mut controller = InteractionController::default();
        let mut transform = transform();
        let scale = transform.scale();

        controller.pointer_down(Point::new(0.0, 0.0), &transform);
        controller.pointer_move(Point::new(-250.0, 75.0), &mut transform);

        assert_eq!(transform.scale(), scale);
    }

    #[test]
    fn test_pointer_leave_ends_drag() {
        let mut controller = InteractionController::default();
        let transform = transform();
        controller.pointer_down(Point::new(1.0, 1.0), &transform);
        controller.pointer_leave();
        assert_eq!(controller.state(), DragState::Idle);
    }

    #[test]
    fn test_wheel_zoom_steps() {
        let mut controller = InteractionController::default();
        let mut transform = transform();

        let outcome = controller.wheel(-120.0, &mut transform);
        assert!(outcome.changed);
        assert!(outcome.suppress_default);
        assert!((transform.user_scale() - 1.1).abs() < 1e-12);

        controller.wheel(120.0, &mut transform);
        assert!((transform.user_scale() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_wheel_zoom_is_clamped() {
        let mut controller = InteractionController::default();
        let mut transform = transform();

        for _ in 0..200 {
            controller.wheel(-1.0, &mut transform);
            assert!(transform.user_scale() <= MAX_USER_SCALE);
        }
        assert_eq!(transform.user_scale(), MAX_USER_SCALE);
        assert!(!controller.wheel(-1.0, &mut transform).changed);

        for _ in 0..200 {
            controller.wheel(1.0, &mut transform);
            assert!(transform.user_scale() >= MIN_USER_SCALE);
        }
        assert_eq!(transform.user_scale(), MIN_USER_SCALE);
    }

    #[test]
    fn test_zero_wheel_delta_is_ignored() {
        let mut controller = InteractionController::default();
        let mut transform = transform();
        let outcome = controller.wheel(0.0, &mut transform);
        assert!(!outcome.changed);
        assert!(outcome.suppress_default);
        assert_eq!(transform.user_scale(), 1.0);
    }

    #[test]
    fn test_wheel_works_while_dragging() {
        let mut controller = InteractionController::default();
        let mut transform = transform();
        controller.pointer_down(Point::new(10.0, 10.0), &transform);
        controller.wheel(-1.0, &mut transform);
        assert!(controller.is_dragging());
        assert!(transform.user_scale() > 1.0);
    }
}

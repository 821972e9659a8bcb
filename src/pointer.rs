use crate::board_core::Point;
use leptos::web_sys::{MouseEvent, Touch, TouchEvent};

/// Normalizes mouse and touch input to a single client-space coordinate.
pub trait PointerInput {
    fn client_point(&self) -> Option<Point>;
}

impl PointerInput for MouseEvent {
    fn client_point(&self) -> Option<Point> {
        Some(Point::new(self.client_x() as f64, self.client_y() as f64))
    }
}

impl PointerInput for TouchEvent {
    // Follows the first active touch; `touchend` only lists lifted fingers
    // under `changedTouches`.
    fn client_point(&self) -> Option<Point> {
        self.touches()
            .item(0)
            .or_else(|| self.changed_touches().item(0))
            .map(|touch| touch_point(&touch))
    }
}

fn touch_point(touch: &Touch) -> Point {
    Point::new(touch.client_x() as f64, touch.client_y() as f64)
}

//! Viewport module for the on-screen zoom/scroll transform.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Zoom change per scroll-wheel notch.
pub const ZOOM_STEP: f64 = 0.05;

/// Smallest zoom the viewport allows.
pub const MIN_ZOOM: f64 = 0.1;

/// Viewport manages the presentation transform of the composited frame.
///
/// It only changes how the frame is shown; layer buffers always stay at
/// the canonical resolution. Screen points map to layer points as
/// `(screen + scroll) / zoom`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    /// Scroll offset in viewport pixels.
    pub scroll: Vec2,
    /// Current zoom factor (1.0 = one layer pixel per screen pixel).
    pub zoom: f64,
    /// Zoom change per notch.
    pub zoom_step: f64,
    /// Minimum allowed zoom. There is no maximum.
    pub min_zoom: f64,
    /// Size of the layer content in layer pixels.
    pub content_size: Size,
    /// Size of the on-screen widget, when known.
    pub viewport_size: Option<Size>,
}

impl Viewport {
    /// Create a viewport showing content of the given size at 100%.
    pub fn new(content_size: Size) -> Self {
        Self {
            scroll: Vec2::ZERO,
            zoom: 1.0,
            zoom_step: ZOOM_STEP,
            min_zoom: MIN_ZOOM,
            content_size,
            viewport_size: None,
        }
    }

    /// Override the zoom step and floor.
    pub fn with_zoom_limits(mut self, zoom_step: f64, min_zoom: f64) -> Self {
        self.zoom_step = zoom_step;
        self.min_zoom = min_zoom;
        self
    }

    /// Set the on-screen size and re-clamp the scroll offset.
    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport_size = Some(Size::new(width, height));
        self.clamp_scroll();
    }

    /// Transform from layer coordinates to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(-self.scroll) * Affine::scale(self.zoom)
    }

    /// Transform from screen coordinates to layer coordinates.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(self.scroll)
    }

    /// Convert a screen point to layer coordinates.
    pub fn screen_to_layer(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a layer point to screen coordinates.
    pub fn layer_to_screen(&self, layer_point: Point) -> Point {
        self.transform() * layer_point
    }

    /// Shift the scroll offset by a delta in viewport pixels.
    pub fn pan(&mut self, delta: Vec2) {
        self.scroll += delta;
        self.clamp_scroll();
    }

    /// Apply one scroll-wheel notch at `anchor` (screen space).
    ///
    /// A positive delta zooms in, a negative one zooms out, zero is
    /// ignored. The layer point under the anchor stays put.
    pub fn zoom_notch(&mut self, wheel_delta: f64, anchor: Point) {
        let new_zoom = if wheel_delta > 0.0 {
            self.zoom + self.zoom_step
        } else if wheel_delta < 0.0 {
            (self.zoom - self.zoom_step).max(self.min_zoom)
        } else {
            return;
        };
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let layer_point = self.screen_to_layer(anchor);
        self.zoom = new_zoom;

        // Re-anchor so the same layer point sits under the cursor.
        let drift = self.layer_to_screen(layer_point) - anchor;
        self.scroll += drift;
        self.clamp_scroll();
    }

    /// Layer-space rectangle currently visible on screen.
    pub fn visible_layer_rect(&self) -> Option<Rect> {
        let size = self.viewport_size?;
        let top_left = self.screen_to_layer(Point::ZERO);
        let bottom_right = self.screen_to_layer(Point::new(size.width, size.height));
        Some(Rect::from_points(top_left, bottom_right).intersect(self.content_size.to_rect()))
    }

    fn clamp_scroll(&mut self) {
        let Some(size) = self.viewport_size else {
            return;
        };
        let max_x = (self.content_size.width * self.zoom - size.width).max(0.0);
        let max_y = (self.content_size.height * self.zoom - size.height).max(0.0);
        self.scroll = Vec2::new(self.scroll.x.clamp(0.0, max_x), self.scroll.y.clamp(0.0, max_y));
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Size::new(
            f64::from(crate::CANVAS_WIDTH),
            f64::from(crate::CANVAS_HEIGHT),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_viewport() {
        let viewport = Viewport::default();
        assert_eq!(viewport.scroll, Vec2::ZERO);
        assert!((viewport.zoom - 1.0).abs() < f64::EPSILON);
        assert!(viewport.viewport_size.is_none());
    }

    #[test]
    fn test_screen_to_layer_identity() {
        let viewport = Viewport::default();
        let screen = Point::new(100.0, 200.0);
        let layer = viewport.screen_to_layer(screen);
        assert!((layer.x - screen.x).abs() < f64::EPSILON);
        assert!((layer.y - screen.y).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_layer_with_scroll_and_zoom() {
        let mut viewport = Viewport::default();
        viewport.scroll = Vec2::new(100.0, 40.0);
        viewport.zoom = 2.0;
        let layer = viewport.screen_to_layer(Point::new(100.0, 200.0));
        assert!((layer.x - 100.0).abs() < 1e-10);
        assert!((layer.y - 120.0).abs() < 1e-10);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut viewport = Viewport::default();
        viewport.scroll = Vec2::new(30.0, 20.0);
        viewport.zoom = 1.35;
        let original = Point::new(123.0, 456.0);
        let back = viewport.layer_to_screen(viewport.screen_to_layer(original));
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_zoom_out_clamps_at_floor() {
        let mut viewport = Viewport::default();
        for _ in 0..100 {
            viewport.zoom_notch(-1.0, Point::ZERO);
            assert!(viewport.zoom >= MIN_ZOOM - f64::EPSILON);
        }
        assert!((viewport.zoom - MIN_ZOOM).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_in_is_unbounded() {
        let mut viewport = Viewport::default();
        for _ in 0..1000 {
            viewport.zoom_notch(120.0, Point::ZERO);
        }
        assert!(viewport.zoom > 50.0);
        assert!((viewport.zoom - 51.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_wheel_delta_is_ignored() {
        let mut viewport = Viewport::default();
        viewport.zoom_notch(0.0, Point::ZERO);
        assert!((viewport.zoom - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut viewport = Viewport::default();
        let anchor = Point::new(400.0, 300.0);
        let before = viewport.screen_to_layer(anchor);
        viewport.zoom_notch(1.0, anchor);
        let after = viewport.screen_to_layer(anchor);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn test_pan_clamps_to_scrollable_range() {
        let mut viewport = Viewport::default();
        viewport.set_viewport_size(960.0, 540.0);
        viewport.pan(Vec2::new(5000.0, -20.0));
        assert!((viewport.scroll.x - 960.0).abs() < f64::EPSILON);
        assert!(viewport.scroll.y.abs() < f64::EPSILON);
    }

    #[test]
    fn test_pan_unclamped_without_viewport_size() {
        let mut viewport = Viewport::default();
        viewport.pan(Vec2::new(-15.0, 25.0));
        assert_eq!(viewport.scroll, Vec2::new(-15.0, 25.0));
    }

    #[test]
    fn test_visible_layer_rect() {
        let mut viewport = Viewport::default();
        viewport.set_viewport_size(960.0, 540.0);
        viewport.zoom = 2.0;
        viewport.scroll = Vec2::new(200.0, 100.0);
        let rect = viewport.visible_layer_rect().unwrap();
        assert_eq!(rect, Rect::new(100.0, 50.0, 580.0, 320.0));
    }
}

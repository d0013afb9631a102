//! Raster surfaces backing the map and annotation layers.
//!
//! A [`Surface`] is an RGBA buffer with straight (non-premultiplied) alpha.
//! All shape operations sample coverage at pixel centers and clip to the
//! buffer, so callers may pass coordinates that fall outside the surface.

use image::{Rgba, RgbaImage};
use kurbo::{Circle, Point, Rect, Vec2};

/// Fully transparent pixel.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// How covered pixels are combined with the existing surface content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Source-over: paint the color on top of what is there.
    #[default]
    Paint,
    /// Clear covered pixels to full transparency; the color is ignored.
    Clear,
}

/// Blend `src` over `dst` using straight alpha.
///
/// Exact at the extremes: an alpha of 0 returns `dst` untouched and an
/// alpha of 255 returns `src`.
pub fn blend_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = u32::from(src[3]);
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let src_weight = sa * 255;
    let dst_weight = u32::from(dst[3]) * (255 - sa);
    let total = src_weight + dst_weight;
    if total == 0 {
        return TRANSPARENT;
    }

    let mut out = [0u8; 4];
    for (i, channel) in out.iter_mut().take(3).enumerate() {
        let c = (u32::from(src[i]) * src_weight + u32::from(dst[i]) * dst_weight + total / 2) / total;
        *channel = c.min(255) as u8;
    }
    out[3] = ((total + 127) / 255).min(255) as u8;
    Rgba(out)
}

/// An in-memory RGBA bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    /// Create a fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, TRANSPARENT),
        }
    }

    /// Create a surface filled with a single color.
    pub fn filled(width: u32, height: u32, color: Rgba<u8>) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, color),
        }
    }

    /// Wrap an existing image.
    pub fn from_image(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Borrow the underlying image.
    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Read a pixel, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.pixels.get_pixel_checked(x, y).copied()
    }

    /// Overwrite a single pixel. Out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        if x < self.width() && y < self.height() {
            self.pixels.put_pixel(x, y, color);
        }
    }

    /// Check whether every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|p| p[3] == 0)
    }

    /// Full-buffer copy from another surface, reusing this allocation when
    /// the dimensions match.
    pub fn copy_from(&mut self, other: &Surface) {
        if self.pixels.dimensions() == other.pixels.dimensions() {
            self.pixels.copy_from_slice(other.pixels.as_raw());
        } else {
            self.pixels = other.pixels.clone();
        }
    }

    /// Draw a single square point of the given width.
    pub fn draw_point(&mut self, center: Point, width: u32, color: Rgba<u8>, mode: BlendMode) {
        self.draw_line(center, center, width, color, mode);
    }

    /// Draw a line segment with square caps.
    ///
    /// The stroke is the segment's rectangle of the given width, extended
    /// by half the width past both ends. A point is an axis-aligned square.
    /// Every covered pixel is blended exactly once, so translucent colors
    /// do not build up where the brush overlaps itself within a segment.
    pub fn draw_line(&mut self, from: Point, to: Point, width: u32, color: Rgba<u8>, mode: BlendMode) {
        if width == 0 {
            return;
        }
        let half = f64::from(width) / 2.0;
        let span = to - from;
        let length = span.hypot();
        let along = if length < f64::EPSILON {
            Vec2::new(1.0, 0.0)
        } else {
            span / length
        };
        let across = Vec2::new(-along.y, along.x);
        // The pixels under both endpoints are always covered, even for
        // hairline widths that would otherwise miss every pixel center.
        let ends = [pixel_under(from), pixel_under(to)];

        let reach = (half * std::f64::consts::SQRT_2).max(1.0);
        let bounds = Rect::from_points(from, to).inflate(reach, reach);
        let Some((x0, x1, y0, y1)) = self.pixel_bounds(bounds) else {
            return;
        };

        for y in y0..=y1 {
            for x in x0..=x1 {
                let offset = pixel_center(x, y) - from;
                let t = offset.dot(along);
                let s = offset.dot(across);
                let covered = (t >= -half && t < length + half && s >= -half && s < half)
                    || ends.contains(&Some((x, y)));
                if covered {
                    self.apply(x, y, color, mode);
                }
            }
        }
    }

    /// Fill an axis-aligned rectangle.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        let rect = rect.abs();
        let Some((x0, x1, y0, y1)) = self.pixel_bounds(rect) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                let sample = pixel_center(x, y);
                if sample.x >= rect.x0 && sample.x < rect.x1 && sample.y >= rect.y0 && sample.y < rect.y1 {
                    self.apply(x, y, color, BlendMode::Paint);
                }
            }
        }
    }

    /// Fill a circle.
    pub fn fill_circle(&mut self, circle: Circle, color: Rgba<u8>) {
        let r = circle.radius.abs();
        let bounds = Rect::from_center_size(circle.center, (2.0 * r, 2.0 * r));
        let Some((x0, x1, y0, y1)) = self.pixel_bounds(bounds) else {
            return;
        };
        let r_sq = r * r;
        for y in y0..=y1 {
            for x in x0..=x1 {
                if (pixel_center(x, y) - circle.center).hypot2() <= r_sq {
                    self.apply(x, y, color, BlendMode::Paint);
                }
            }
        }
    }

    /// Fill a triangle of either winding.
    pub fn fill_triangle(&mut self, corners: [Point; 3], color: Rgba<u8>) {
        let [a, b, c] = corners;
        let area = edge(a, b, c);
        if area.abs() < f64::EPSILON {
            return;
        }
        let bounds = Rect::from_points(a, b).union_pt(c);
        let Some((x0, x1, y0, y1)) = self.pixel_bounds(bounds) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                let p = pixel_center(x, y);
                let w0 = edge(b, c, p) * area.signum();
                let w1 = edge(c, a, p) * area.signum();
                let w2 = edge(a, b, p) * area.signum();
                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    self.apply(x, y, color, BlendMode::Paint);
                }
            }
        }
    }

    fn apply(&mut self, x: u32, y: u32, color: Rgba<u8>, mode: BlendMode) {
        let pixel = self.pixels.get_pixel_mut(x, y);
        *pixel = match mode {
            BlendMode::Paint => blend_over(*pixel, color),
            BlendMode::Clear => TRANSPARENT,
        };
    }

    /// Inclusive pixel index range whose centers may fall inside `rect`,
    /// clipped to the surface.
    fn pixel_bounds(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        let (x0, x1) = pixel_span(rect.x0, rect.x1, self.width())?;
        let (y0, y1) = pixel_span(rect.y0, rect.y1, self.height())?;
        Some((x0, x1, y0, y1))
    }
}

fn pixel_center(x: u32, y: u32) -> Point {
    Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5)
}

fn pixel_under(p: Point) -> Option<(u32, u32)> {
    if p.x >= 0.0 && p.y >= 0.0 && p.x.is_finite() && p.y.is_finite() {
        Some((p.x.floor() as u32, p.y.floor() as u32))
    } else {
        None
    }
}

fn pixel_span(min: f64, max: f64, limit: u32) -> Option<(u32, u32)> {
    if limit == 0 || !min.is_finite() || !max.is_finite() {
        return None;
    }
    let lo = (min - 0.5).floor().max(0.0);
    let hi = (max - 0.5).ceil().min(f64::from(limit - 1));
    if lo > hi {
        return None;
    }
    Some((lo as u32, hi as u32))
}

/// Twice the signed area of the triangle `a`, `b`, `p`.
fn edge(a: Point, b: Point, p: Point) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn covered(surface: &Surface) -> usize {
        surface.image().pixels().filter(|p| p[3] > 0).count()
    }

    #[test]
    fn test_new_surface_is_blank() {
        let surface = Surface::new(16, 8);
        assert_eq!(surface.width(), 16);
        assert_eq!(surface.height(), 8);
        assert!(surface.is_blank());
    }

    #[test]
    fn test_blend_extremes_are_exact() {
        let dst = Rgba([10, 20, 30, 255]);
        assert_eq!(blend_over(dst, Rgba([200, 100, 50, 0])), dst);
        assert_eq!(blend_over(dst, RED), RED);
        assert_eq!(blend_over(TRANSPARENT, Rgba([40, 50, 60, 128])), Rgba([40, 50, 60, 128]));
    }

    #[test]
    fn test_blend_half_alpha_over_opaque() {
        let out = blend_over(Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 128]));
        assert_eq!(out[3], 255);
        assert!((i32::from(out[0]) - 128).abs() <= 1);
    }

    #[test]
    fn test_hairline_point_covers_pixel_under_cursor() {
        let mut surface = Surface::new(10, 10);
        surface.draw_point(Point::new(4.5, 4.5), 1, RED, BlendMode::Paint);
        assert_eq!(surface.pixel(4, 4), Some(RED));
        assert_eq!(covered(&surface), 1);
    }

    #[test]
    fn test_wide_point_is_square() {
        let mut surface = Surface::new(40, 40);
        surface.draw_point(Point::new(20.0, 20.0), 10, RED, BlendMode::Paint);
        // Covers [15, 25) on both axes, corners included.
        assert_eq!(surface.pixel(15, 15), Some(RED));
        assert_eq!(surface.pixel(24, 24), Some(RED));
        assert_eq!(surface.pixel(25, 20), Some(TRANSPARENT));
        assert_eq!(surface.pixel(14, 20), Some(TRANSPARENT));
        assert_eq!(covered(&surface), 100);
    }

    #[test]
    fn test_line_has_square_caps() {
        let mut surface = Surface::new(60, 40);
        surface.draw_line(Point::new(20.0, 20.0), Point::new(40.0, 20.0), 6, RED, BlendMode::Paint);
        // Caps reach half the width past each end: x in [17, 43), y in [17, 23).
        assert_eq!(surface.pixel(17, 17), Some(RED));
        assert_eq!(surface.pixel(42, 22), Some(RED));
        assert_eq!(surface.pixel(16, 20), Some(TRANSPARENT));
        assert_eq!(surface.pixel(43, 20), Some(TRANSPARENT));
        assert_eq!(covered(&surface), 26 * 6);
    }

    #[test]
    fn test_diagonal_square_cap_reaches_past_end() {
        let mut surface = Surface::new(40, 40);
        let start = Point::new(10.0, 10.0);
        let end = Point::new(20.0, 20.0);
        surface.draw_line(start, end, 4, RED, BlendMode::Paint);
        assert_eq!(surface.pixel(20, 21), Some(RED));
        assert_eq!(surface.pixel(22, 22), Some(TRANSPARENT));
        assert_eq!(surface.pixel(9, 9), Some(RED));
        assert_eq!(surface.pixel(7, 7), Some(TRANSPARENT));
    }

    #[test]
    fn test_line_is_continuous() {
        let mut surface = Surface::new(50, 50);
        surface.draw_line(Point::new(2.0, 3.0), Point::new(40.0, 22.0), 1, RED, BlendMode::Paint);
        for x in 2..40 {
            let hit = (0..50).any(|y| surface.pixel(x, y) == Some(RED));
            assert!(hit, "column {x} has a gap");
        }
    }

    #[test]
    fn test_translucent_line_does_not_accumulate() {
        let mut surface = Surface::new(30, 30);
        let color = Rgba([0, 0, 255, 100]);
        surface.draw_line(Point::new(5.0, 15.0), Point::new(25.0, 15.0), 6, color, BlendMode::Paint);
        assert_eq!(surface.pixel(10, 15), Some(color));
        assert_eq!(surface.pixel(20, 14), Some(color));
    }

    #[test]
    fn test_clear_mode_erases() {
        let mut surface = Surface::filled(20, 20, RED);
        surface.draw_line(Point::new(0.0, 10.0), Point::new(20.0, 10.0), 4, RED, BlendMode::Clear);
        assert_eq!(surface.pixel(10, 10), Some(TRANSPARENT));
        assert_eq!(surface.pixel(10, 2), Some(RED));
    }

    #[test]
    fn test_out_of_bounds_is_clipped() {
        let mut surface = Surface::new(10, 10);
        surface.draw_line(Point::new(-50.0, -50.0), Point::new(-10.0, -10.0), 4, RED, BlendMode::Paint);
        assert!(surface.is_blank());
        surface.draw_point(Point::new(9.8, 9.8), 8, RED, BlendMode::Paint);
        assert_eq!(surface.pixel(9, 9), Some(RED));
        surface.set_pixel(100, 100, RED);
    }

    #[test]
    fn test_fill_rect_covers_exact_area() {
        let mut surface = Surface::new(20, 20);
        surface.fill_rect(Rect::new(12.0, 9.0, 2.0, 4.0), RED);
        assert_eq!(covered(&surface), 50);
        assert_eq!(surface.pixel(2, 4), Some(RED));
        assert_eq!(surface.pixel(11, 8), Some(RED));
        assert_eq!(surface.pixel(12, 8), Some(TRANSPARENT));
    }

    #[test]
    fn test_fill_circle() {
        let mut surface = Surface::new(40, 40);
        surface.fill_circle(Circle::new((20.0, 20.0), 10.0), RED);
        assert_eq!(surface.pixel(20, 11), Some(RED));
        assert_eq!(surface.pixel(20, 31), Some(TRANSPARENT));
        let count = covered(&surface) as f64;
        let expected = std::f64::consts::PI * 100.0;
        assert!((count - expected).abs() < 20.0);
    }

    #[test]
    fn test_fill_triangle_either_winding() {
        let corners = [Point::new(0.0, 0.0), Point::new(20.0, 0.0), Point::new(0.0, 20.0)];
        let mut a = Surface::new(20, 20);
        a.fill_triangle(corners, RED);
        let mut b = Surface::new(20, 20);
        b.fill_triangle([corners[0], corners[2], corners[1]], RED);
        assert_eq!(a, b);
        assert_eq!(a.pixel(1, 1), Some(RED));
        assert_eq!(a.pixel(18, 18), Some(TRANSPARENT));
    }

    #[test]
    fn test_degenerate_triangle_draws_nothing() {
        let mut surface = Surface::new(10, 10);
        surface.fill_triangle([Point::new(1.0, 1.0), Point::new(5.0, 5.0), Point::new(9.0, 9.0)], RED);
        assert!(surface.is_blank());
    }

    #[test]
    fn test_copy_from_restores_bits() {
        let mut original = Surface::new(12, 12);
        original.draw_point(Point::new(6.0, 6.0), 4, RED, BlendMode::Paint);
        let mut copy = Surface::new(12, 12);
        copy.copy_from(&original);
        assert_eq!(copy, original);

        let mut other_size = Surface::new(3, 3);
        other_size.copy_from(&original);
        assert_eq!(other_size, original);
    }
}

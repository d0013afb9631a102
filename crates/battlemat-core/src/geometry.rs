//! Measurement and spell-effect geometry.
//!
//! Pure functions over layer-space coordinates. Nothing here touches a
//! raster; the scene rasterizes whatever these return.

use kurbo::{Circle, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Number of feet represented by one measured unit.
pub const FEET_PER_UNIT: u32 = 5;

/// Spell effect footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SpellKind {
    Square,
    #[default]
    Circle,
    Cone,
}

impl SpellKind {
    /// Whether the effect needs an origin click before it can be previewed.
    pub fn needs_origin(self) -> bool {
        self == SpellKind::Cone
    }

    /// Display name for UI labels.
    pub fn name(self) -> &'static str {
        match self {
            SpellKind::Square => "Square",
            SpellKind::Circle => "Circle",
            SpellKind::Cone => "Cone",
        }
    }
}

/// A rasterizable spell footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpellShape {
    Square(Rect),
    Circle(Circle),
    Cone([Point; 3]),
}

/// Snap a measurement drag to a square anchored at `start`.
///
/// The axis with the larger delta decides the extent of both axes. Equal
/// magnitudes take the vertical branch, so `(0,0)→(50,-50)` snaps to
/// `(-50,-50)`.
pub fn snap_measure_square(start: Point, end: Point) -> Point {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let side = if dx.abs() > dy.abs() { dx } else { dy };
    start + Vec2::new(side, side)
}

/// Horizontal span of a snapped measurement, in whole pixels.
pub fn measured_unit(start: Point, snapped_end: Point) -> u32 {
    (snapped_end.x - start.x).abs().round() as u32
}

/// Axis-aligned square of side `size` centered on `center`.
pub fn square_preview(center: Point, size: f64) -> Rect {
    Rect::from_center_size(center, (size, size))
}

/// Circle of radius `radius` centered on `center`.
pub fn circle_preview(center: Point, radius: f64) -> Circle {
    Circle::new(center, radius)
}

/// Isosceles cone triangle with its apex at `origin`, aimed at `toward`.
///
/// The far edge is centered `length` away from the apex and is `length`
/// wide. When `toward` coincides with `origin` the cone points straight
/// down.
pub fn cone_preview(origin: Point, toward: Point, length: f64) -> [Point; 3] {
    let ray = toward - origin;
    let distance = ray.hypot();
    let direction = if distance < f64::EPSILON {
        Vec2::new(0.0, 1.0)
    } else {
        ray / distance
    };
    let midpoint = origin + direction * length;
    let half_width = Vec2::new(-direction.y, direction.x) * (length / 2.0);
    [origin, midpoint + half_width, midpoint - half_width]
}

/// Build the footprint for `kind` at the pointer.
///
/// `origin` is only consulted for cones; a cone without an origin has no
/// footprint yet.
pub fn spell_preview(kind: SpellKind, origin: Option<Point>, pointer: Point, size_px: u32) -> Option<SpellShape> {
    let size = f64::from(size_px);
    match kind {
        SpellKind::Square => Some(SpellShape::Square(square_preview(pointer, size))),
        SpellKind::Circle => Some(SpellShape::Circle(circle_preview(pointer, size))),
        SpellKind::Cone => origin.map(|origin| SpellShape::Cone(cone_preview(origin, pointer, size))),
    }
}

/// Convert a distance in feet to pixels given the measured five-foot unit.
///
/// Integer arithmetic throughout, so a unit that is not a multiple of five
/// loses its remainder on the partial-unit term.
pub fn feet_to_pixels(feet: u32, unit_px: u32) -> u32 {
    let whole = unit_px.saturating_mul(feet / FEET_PER_UNIT);
    let partial = (feet % FEET_PER_UNIT) * (unit_px / FEET_PER_UNIT);
    whole.saturating_add(partial)
}

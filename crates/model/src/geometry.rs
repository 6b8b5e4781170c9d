//! Point types and segment geometry.
//!
//! Two coordinate spaces are used throughout the workspace:
//! - Viewer space: origin at the top-left of the rendered page, pixel units,
//!   Y increases downward. All capture happens here.
//! - Page space: the PDF's native system, origin at the bottom-left, point
//!   units (1/72 inch), Y increases upward. Export output lives here.
//!
//! The Y flip between the two is applied at projection time only, never at
//! capture time.

use serde::{Deserialize, Serialize};

/// Coordinate on the drawing surface (viewer space, top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewerPoint {
    pub x: f32,
    pub y: f32,
}

impl ViewerPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &ViewerPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Translate by a uniform offset.
    pub fn offset_by(&self, offset: ViewerPoint) -> Self {
        Self { x: self.x + offset.x, y: self.y + offset.y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Coordinate in PDF page space (bottom-left origin, point units).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PagePoint {
    pub x: f32,
    pub y: f32,
}

impl PagePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Distance from `p` to the segment `a`-`b`.
///
/// Degenerate (zero-length) segments fall back to point-to-point distance.
pub fn distance_to_segment(p: &ViewerPoint, a: &ViewerPoint, b: &ViewerPoint) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx * dx + dy * dy;

    if length_sq < 1e-6 {
        return p.distance_to(a);
    }

    let t = ((p.x - a.x) * dx + (p.y - a.y) * dy) / length_sq;
    let t = t.clamp(0.0, 1.0);

    let closest = ViewerPoint::new(a.x + t * dx, a.y + t * dy);
    p.distance_to(&closest)
}

/// Interpolate `a`-`b` so consecutive samples are no farther apart than
/// `spacing`.
///
/// The output always starts with `a` and ends with `b` exactly; intermediate
/// points are evenly spaced. A non-positive `spacing` or a zero-length segment
/// yields just the two endpoints.
pub fn densify(a: ViewerPoint, b: ViewerPoint, spacing: f32) -> Vec<ViewerPoint> {
    let distance = a.distance_to(&b);

    if spacing <= 0.0 || distance <= spacing {
        return vec![a, b];
    }

    let steps = (distance / spacing).ceil() as usize;
    let mut points = Vec::with_capacity(steps + 1);
    points.push(a);

    for i in 1..steps {
        let t = i as f32 / steps as f32;
        points.push(ViewerPoint::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t));
    }

    points.push(b);
    points
}

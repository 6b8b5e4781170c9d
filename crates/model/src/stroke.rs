//! Stroke records and their color encoding.

use crate::geometry::{distance_to_segment, ViewerPoint};
use serde::{Deserialize, Serialize};

/// Opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255 };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#RRGGBB` string (leading `#` optional). Anything else is
    /// rejected.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

        Some(Self { r, g, b })
    }

    /// Normalized components in the 0.0-1.0 range used by PDF operators.
    pub fn to_normalized(&self) -> (f32, f32, f32) {
        (self.r as f32 / 255.0, self.g as f32 / 255.0, self.b as f32 / 255.0)
    }
}

/// One continuous annotation polyline, tagged with its target page.
///
/// Points are captured in viewer space. A stroke is seeded with a single
/// point on pointer-down and grows while the pointer moves; once finalized it
/// is never mutated again (the store enforces this by only ever extending the
/// most recent unfinalized stroke).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// 1-based page number this stroke belongs to.
    pub page: u32,

    /// `#RRGGBB` stroke color. An empty or malformed value renders black.
    #[serde(default)]
    pub color: String,

    /// Ordered polyline samples in viewer space. Never empty inside the store.
    pub points: Vec<ViewerPoint>,
}

impl Stroke {
    pub fn new(first: ViewerPoint, color: impl Into<String>, page: u32) -> Self {
        Self { page, color: color.into(), points: vec![first] }
    }

    /// Parsed color, falling back to black when unset or malformed.
    pub fn color_or_black(&self) -> Color {
        Color::from_hex(&self.color).unwrap_or(Color::BLACK)
    }

    /// True when `p` lies within `tolerance` of any segment of this stroke.
    ///
    /// A single-point stroke hit-tests against that point directly.
    pub fn hit_test(&self, p: &ViewerPoint, tolerance: f32) -> bool {
        match self.points.as_slice() {
            [] => false,
            [only] => only.distance_to(p) <= tolerance,
            points => points
                .windows(2)
                .any(|pair| distance_to_segment(p, &pair[0], &pair[1]) <= tolerance),
        }
    }
}

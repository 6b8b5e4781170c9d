//! Ordered stroke store.
//!
//! Insertion order is z-order: later strokes render on top. The store is the
//! single owner of all strokes; the only mutation it allows after insertion
//! is extending the most recent stroke while it is still open, which keeps
//! the single-writer invariant auditable.

use crate::geometry::{densify, ViewerPoint};
use crate::stroke::Stroke;

#[derive(Debug, Default)]
pub struct AnnotationStore {
    strokes: Vec<Stroke>,
    /// True while the last stroke is still being drawn and may be extended.
    active: bool,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new stroke seeded with a single point.
    pub fn begin_stroke(&mut self, point: ViewerPoint, color: impl Into<String>, page: u32) {
        if !point.is_finite() {
            return;
        }

        self.finalize_active_stroke();
        self.strokes.push(Stroke::new(point, color, page));
        self.active = true;
    }

    /// Append a point to the in-progress stroke, densifying the gap from the
    /// previous sample so pointer-move sampling holes stay bounded.
    ///
    /// No-op when no stroke is open.
    pub fn extend_active_stroke(&mut self, point: ViewerPoint, spacing: f32) {
        if !self.active || !point.is_finite() {
            return;
        }

        let Some(stroke) = self.strokes.last_mut() else {
            return;
        };
        let Some(&last) = stroke.points.last() else {
            return;
        };

        // densify repeats the start point; skip it.
        stroke.points.extend(densify(last, point, spacing).into_iter().skip(1));
    }

    /// Close the in-progress stroke, if any.
    ///
    /// A stroke that never grew past its seed point is dropped here so the
    /// store only ever holds strokes with at least one full segment.
    pub fn finalize_active_stroke(&mut self) {
        if !self.active {
            return;
        }

        self.active = false;

        if self.strokes.last().is_some_and(|stroke| stroke.points.len() < 2) {
            self.strokes.pop();
        }
    }

    /// Insert a finalized two-endpoint stroke from explicit coordinates.
    ///
    /// `offset` translates both endpoints before densification. Non-finite
    /// coordinates reject the whole insertion; nothing is partially added.
    /// Returns whether a stroke was inserted.
    pub fn add_explicit_stroke(
        &mut self,
        p1: ViewerPoint,
        p2: ViewerPoint,
        color: impl Into<String>,
        page: u32,
        offset: ViewerPoint,
        spacing: f32,
    ) -> bool {
        if !p1.is_finite() || !p2.is_finite() || !offset.is_finite() {
            return false;
        }

        let points = densify(p1.offset_by(offset), p2.offset_by(offset), spacing);
        self.push_finalized(Stroke { page, color: color.into(), points })
    }

    /// Insert an already-built stroke as finalized. Strokes with fewer than
    /// two points are rejected.
    pub fn push_finalized(&mut self, stroke: Stroke) -> bool {
        if stroke.points.len() < 2 || stroke.points.iter().any(|p| !p.is_finite()) {
            return false;
        }

        self.finalize_active_stroke();
        self.strokes.push(stroke);
        true
    }

    /// Remove the topmost stroke on `page` that hit-tests positive at `point`.
    ///
    /// A miss removes nothing: erase-on-miss is a deliberate no-op, not a
    /// pop-last fallback.
    pub fn erase_at(&mut self, point: ViewerPoint, page: u32, tolerance: f32) -> Option<Stroke> {
        let index = self
            .strokes
            .iter()
            .rposition(|stroke| stroke.page == page && stroke.hit_test(&point, tolerance))?;

        if index == self.strokes.len() - 1 {
            self.active = false;
        }

        Some(self.strokes.remove(index))
    }

    /// Remove the most recently inserted stroke regardless of position.
    pub fn erase_last(&mut self) -> Option<Stroke> {
        self.active = false;
        self.strokes.pop()
    }

    /// Strokes on `page` in insertion (render) order.
    pub fn strokes_for_page(&self, page: u32) -> Vec<&Stroke> {
        self.strokes.iter().filter(|stroke| stroke.page == page).collect()
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn has_active_stroke(&self) -> bool {
        self.active
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.active = false;
    }
}

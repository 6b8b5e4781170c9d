//! Drawing-session state machine and input handling.
//!
//! The session owns no strokes; it routes pointer events from a
//! [`PointerSurface`] into an [`AnnotationStore`] and tracks which of the
//! three phases (idle, drawing, erasing) the surface is in. All mutation is
//! synchronous and happens on the caller's event thread.

use redline_model::{AnnotationStore, ViewerPoint};

/// Narrow capability any drawing surface must satisfy: report the current
/// pointer position in surface-local viewer coordinates, or `None` when the
/// pointer is outside the surface. A `None` position short-circuits every
/// handler with no state mutation.
pub trait PointerSurface {
    fn pointer_position(&self) -> Option<ViewerPoint>;
}

/// Where the session currently sits in the input state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Drawing,
    Erasing,
}

/// Capture and erase tunables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Hit-test tolerance for the eraser, in viewer units.
    pub erase_tolerance: f32,

    /// Maximum gap between captured freehand samples, in viewer units.
    pub sample_spacing: f32,

    /// Uniform translation applied to explicit-coordinate input.
    pub origin_offset: ViewerPoint,

    /// Whether `origin_offset` also applies to freehand-captured points.
    /// Off by default; explicit coordinate entry always applies the offset.
    pub offset_applies_to_freehand: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            erase_tolerance: 10.0,
            sample_spacing: 4.0,
            origin_offset: ViewerPoint::new(0.0, 0.0),
            offset_applies_to_freehand: false,
        }
    }
}

/// Transient per-page drawing state. Reset to `Idle` on pointer-up or
/// pointer-leave; lives for one viewing session.
#[derive(Debug)]
pub struct DrawingSession {
    phase: SessionPhase,
    active_page: u32,
    config: SessionConfig,
}

impl DrawingSession {
    pub fn new(config: SessionConfig) -> Self {
        Self { phase: SessionPhase::Idle, active_page: 1, config }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn active_page(&self) -> u32 {
        self.active_page
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Switch the page subsequent strokes target. Finalizes any in-progress
    /// stroke first so a stroke can never span pages.
    pub fn set_active_page(&mut self, page: u32, store: &mut AnnotationStore) {
        if self.phase == SessionPhase::Drawing {
            store.finalize_active_stroke();
            self.phase = SessionPhase::Idle;
        }
        self.active_page = page.max(1);
    }

    pub fn pointer_down(
        &mut self,
        surface: &dyn PointerSurface,
        store: &mut AnnotationStore,
        color: &str,
    ) {
        let Some(position) = surface.pointer_position() else {
            return;
        };

        match self.phase {
            SessionPhase::Idle => {
                store.begin_stroke(self.captured(position), color, self.active_page);
                self.phase = SessionPhase::Drawing;
            }
            SessionPhase::Erasing => {
                store.erase_at(position, self.active_page, self.config.erase_tolerance);
            }
            SessionPhase::Drawing => {}
        }
    }

    pub fn pointer_move(&mut self, surface: &dyn PointerSurface, store: &mut AnnotationStore) {
        if self.phase != SessionPhase::Drawing {
            return;
        }

        let Some(position) = surface.pointer_position() else {
            return;
        };

        store.extend_active_stroke(self.captured(position), self.config.sample_spacing);
    }

    pub fn pointer_up(&mut self, store: &mut AnnotationStore) {
        if self.phase == SessionPhase::Drawing {
            store.finalize_active_stroke();
            self.phase = SessionPhase::Idle;
        }
    }

    /// Pointer leaving the surface mid-draw finalizes the stroke, identical
    /// to pointer-up. It never discards captured points.
    pub fn pointer_leave(&mut self, store: &mut AnnotationStore) {
        self.pointer_up(store);
    }

    /// Flip between erasing and the idle/drawing side of the machine. An
    /// in-progress stroke is finalized first so no mutable stroke is
    /// orphaned.
    pub fn toggle_eraser(&mut self, store: &mut AnnotationStore) {
        match self.phase {
            SessionPhase::Drawing => {
                store.finalize_active_stroke();
                self.phase = SessionPhase::Erasing;
            }
            SessionPhase::Idle => self.phase = SessionPhase::Erasing,
            SessionPhase::Erasing => self.phase = SessionPhase::Idle,
        }
    }

    fn captured(&self, position: ViewerPoint) -> ViewerPoint {
        if self.config.offset_applies_to_freehand {
            position.offset_by(self.config.origin_offset)
        } else {
            position
        }
    }
}

/// Raw text fields of the explicit line entry form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplicitLineInput {
    pub x1: String,
    pub y1: String,
    pub x2: String,
    pub y2: String,
}

impl ExplicitLineInput {
    /// Parse all four fields. `None` if any field is not a finite number;
    /// nothing is partially accepted.
    pub fn parse(&self) -> Option<(ViewerPoint, ViewerPoint)> {
        let x1 = parse_coordinate(&self.x1)?;
        let y1 = parse_coordinate(&self.y1)?;
        let x2 = parse_coordinate(&self.x2)?;
        let y2 = parse_coordinate(&self.y2)?;

        Some((ViewerPoint::new(x1, y1), ViewerPoint::new(x2, y2)))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn parse_coordinate(field: &str) -> Option<f32> {
    field.trim().parse::<f32>().ok().filter(|value| value.is_finite())
}

/// Build a stroke from the explicit coordinate form. Invalid input inserts
/// nothing and leaves the fields untouched; on success the form is reset.
/// Returns whether a stroke was inserted.
pub fn submit_explicit_line(
    input: &mut ExplicitLineInput,
    color: &str,
    page: u32,
    store: &mut AnnotationStore,
    config: &SessionConfig,
) -> bool {
    let Some((p1, p2)) = input.parse() else {
        return false;
    };

    let inserted = store.add_explicit_stroke(
        p1,
        p2,
        color,
        page,
        config.origin_offset,
        config.sample_spacing,
    );

    if inserted {
        input.reset();
    }

    inserted
}

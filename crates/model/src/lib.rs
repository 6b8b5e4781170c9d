//! Annotation data model
//!
//! Strokes captured in viewer space, the ordered store that owns them,
//! and the geometry helpers used for capture and hit testing.

pub mod geometry;
pub mod store;
pub mod stroke;

pub use geometry::{densify, distance_to_segment, PagePoint, ViewerPoint};
pub use store::AnnotationStore;
pub use stroke::{Color, Stroke};

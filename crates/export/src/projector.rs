//! Viewer-space to page-space projection.
//!
//! The viewer surface has its origin at the top-left with Y growing
//! downward; PDF pages put the origin at the bottom-left with Y growing
//! upward. The flip happens here, at projection time, and nowhere else, so
//! on-screen rendering stays in natural top-left coordinates.

use crate::ExportError;
use redline_engine::PageSize;
use redline_model::{AnnotationStore, PagePoint, Stroke, ViewerPoint};

/// Flip a viewer point into page space for a page of height `page_height`.
pub fn to_page_space(p: ViewerPoint, page_height: f32) -> PagePoint {
    PagePoint::new(p.x, page_height - p.y)
}

/// Inverse of [`to_page_space`]; the flip is its own inverse.
pub fn to_viewer_space(p: PagePoint, page_height: f32) -> ViewerPoint {
    ViewerPoint::new(p.x, page_height - p.y)
}

/// One page-space line segment ready to hand to a document mutator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineInstruction {
    /// 1-based target page.
    pub page: u32,
    pub start: PagePoint,
    pub end: PagePoint,
    /// Normalized 0-1 RGB.
    pub color: (f32, f32, f32),
    /// Stroke width in points.
    pub thickness: f32,
}

/// Project every stroke segment into page space.
///
/// Each consecutive point pair becomes one instruction; strokes are
/// projected independently and emission order carries no meaning for the
/// rendered result. A stroke pointing at a page without geometry fails the
/// whole projection so an export can never silently drop ink.
pub fn project(
    store: &AnnotationStore,
    page_sizes: &[PageSize],
    thickness: f32,
) -> Result<Vec<LineInstruction>, ExportError> {
    let mut instructions = Vec::new();

    for stroke in store.strokes() {
        instructions.extend(project_stroke(stroke, page_sizes, thickness)?);
    }

    Ok(instructions)
}

fn project_stroke(
    stroke: &Stroke,
    page_sizes: &[PageSize],
    thickness: f32,
) -> Result<Vec<LineInstruction>, ExportError> {
    let size = stroke
        .page
        .checked_sub(1)
        .and_then(|index| page_sizes.get(index as usize))
        .ok_or(ExportError::MissingPageGeometry { page: stroke.page })?;

    let color = stroke.color_or_black().to_normalized();

    Ok(stroke
        .points
        .windows(2)
        .map(|pair| LineInstruction {
            page: stroke.page,
            start: to_page_space(pair[0], size.height_pt),
            end: to_page_space(pair[1], size.height_pt),
            color,
            thickness,
        })
        .collect())
}

//! Export pipeline: project strokes out of viewer space and burn them into
//! a document, either as vector line operators or flattened into page
//! rasters.
//!
//! Exports are synchronous and atomic: any failure surfaces as an error and
//! no bytes are produced. Callers must not mutate the store while an export
//! is running; there is no background work and no locking.

pub mod projector;
pub mod raster;

pub use projector::{project, to_page_space, to_viewer_space, LineInstruction};
pub use raster::composite_strokes;

use redline_engine::{
    build_image_pdf, DocumentMutator, DocumentRenderer, EngineError, LopdfMutator,
    LopdfRenderer, OpenSource,
};
use redline_model::AnnotationStore;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("no page geometry for page {page}")]
    MissingPageGeometry { page: u32 },
    #[error("raster compositing failed: {0}")]
    Raster(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    /// Stroke width in points (vector) or viewer units (flattened).
    pub thickness: f32,

    /// Raster scale in pixels per point for the flattened path.
    pub scale: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { thickness: 2.0, scale: 1.0 }
    }
}

/// Burn strokes into the source document as vector line operators and
/// return the mutated document bytes.
pub fn export_vector(
    pdf_bytes: &[u8],
    store: &AnnotationStore,
    options: &ExportOptions,
) -> Result<Vec<u8>, ExportError> {
    let mut mutator = LopdfMutator::from_bytes(pdf_bytes)?;

    let page_sizes: Vec<_> = (1..=mutator.page_count())
        .map(|page| mutator.page_size(page))
        .collect::<Result<_, _>>()?;

    let instructions = project(store, &page_sizes, options.thickness)?;
    log::debug!("vector export: {} instructions across {} strokes", instructions.len(), store.len());

    for instruction in &instructions {
        mutator.draw_line(
            instruction.page,
            instruction.start,
            instruction.end,
            instruction.color,
            instruction.thickness,
        )?;
    }

    Ok(mutator.save()?)
}

/// Render every page, composite its strokes into the raster, and assemble
/// the result as an image-based PDF.
pub fn export_flattened(
    pdf_bytes: &[u8],
    store: &AnnotationStore,
    options: &ExportOptions,
) -> Result<Vec<u8>, ExportError> {
    let mut renderer = LopdfRenderer::new();
    let handle = renderer.open(OpenSource::Bytes(pdf_bytes.to_vec()))?;
    let page_count = renderer.page_count(handle)?;

    // Strokes on pages the document does not have fail up front, mirroring
    // the vector path.
    if let Some(stroke) = store.strokes().iter().find(|s| s.page == 0 || s.page > page_count) {
        renderer.close(handle)?;
        return Err(ExportError::MissingPageGeometry { page: stroke.page });
    }

    let mut pages = Vec::with_capacity(page_count as usize);
    for page_index in 0..page_count {
        let mut image = renderer.render_page(handle, page_index, options.scale)?;
        let strokes = store.strokes_for_page(page_index + 1);
        composite_strokes(&mut image, &strokes, options.scale, options.thickness)?;
        pages.push(image);
    }

    renderer.close(handle)?;

    log::debug!("flattened export: {} pages at scale {}", pages.len(), options.scale);
    Ok(build_image_pdf(&pages, options.scale)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};
    use redline_model::ViewerPoint;

    fn sample_pdf_bytes(page_count: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids: Vec<Object> = Vec::with_capacity(page_count);
        for _ in 0..page_count {
            let content =
                Content { operations: vec![Operation::new("q", vec![]), Operation::new("Q", vec![])] };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("content should encode"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
            }),
        );

        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("document should serialize");
        bytes
    }

    fn two_page_store() -> AnnotationStore {
        let mut store = AnnotationStore::new();
        store.add_explicit_stroke(
            ViewerPoint::new(10.0, 20.0),
            ViewerPoint::new(110.0, 20.0),
            "#FF0000",
            1,
            ViewerPoint::new(0.0, 0.0),
            1000.0,
        );
        store.add_explicit_stroke(
            ViewerPoint::new(50.0, 50.0),
            ViewerPoint::new(150.0, 150.0),
            "#0000FF",
            2,
            ViewerPoint::new(0.0, 0.0),
            1000.0,
        );
        store
    }

    #[test]
    fn vector_export_produces_a_valid_annotated_document() {
        let bytes =
            export_vector(&sample_pdf_bytes(2), &two_page_store(), &ExportOptions::default())
                .expect("export should succeed");

        let doc = Document::load_mem(&bytes).expect("output must reload");
        assert_eq!(doc.get_pages().len(), 2);

        let mut total_strokes = 0;
        for (_, page_id) in doc.get_pages() {
            let content = doc.get_page_content(page_id).expect("page content");
            let decoded = Content::decode(&content).expect("content should decode");
            total_strokes +=
                decoded.operations.iter().filter(|op| op.operator == "S").count();
        }
        assert_eq!(total_strokes, 2);
    }

    #[test]
    fn vector_export_fails_atomically_for_out_of_range_strokes() {
        let mut store = AnnotationStore::new();
        store.add_explicit_stroke(
            ViewerPoint::new(0.0, 0.0),
            ViewerPoint::new(10.0, 10.0),
            "",
            9,
            ViewerPoint::new(0.0, 0.0),
            100.0,
        );

        let err = export_vector(&sample_pdf_bytes(1), &store, &ExportOptions::default())
            .expect_err("page 9 does not exist");
        assert!(matches!(err, ExportError::MissingPageGeometry { page: 9 }));
    }

    #[test]
    fn flattened_export_keeps_page_count_and_dimensions() {
        let options = ExportOptions { scale: 1.0, ..ExportOptions::default() };
        let bytes = export_flattened(&sample_pdf_bytes(2), &two_page_store(), &options)
            .expect("export should succeed");

        let doc = Document::load_mem(&bytes).expect("output must reload");
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn flattened_export_rejects_strokes_beyond_the_document() {
        let mut store = AnnotationStore::new();
        store.add_explicit_stroke(
            ViewerPoint::new(0.0, 0.0),
            ViewerPoint::new(10.0, 10.0),
            "",
            5,
            ViewerPoint::new(0.0, 0.0),
            100.0,
        );

        let err = export_flattened(&sample_pdf_bytes(1), &store, &ExportOptions::default())
            .expect_err("page 5 does not exist");
        assert!(matches!(err, ExportError::MissingPageGeometry { page: 5 }));
    }

    #[test]
    fn export_with_empty_store_passes_the_document_through() {
        let store = AnnotationStore::new();
        let bytes = export_vector(&sample_pdf_bytes(1), &store, &ExportOptions::default())
            .expect("export should succeed");

        assert_eq!(Document::load_mem(&bytes).expect("valid PDF").get_pages().len(), 1);
    }
}

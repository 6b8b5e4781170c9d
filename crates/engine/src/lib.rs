//! Document engine: rendering and mutation contracts plus their lopdf
//! implementations.
//!
//! The renderer reports page geometry and produces page rasters for the
//! viewer; the mutator burns line-draw instructions into a loaded document
//! and serializes it back to bytes. Both treat the PDF binary format as the
//! library's problem, not ours.

pub mod flatten;
pub mod mutator;

pub use flatten::build_image_pdf;
pub use mutator::{DocumentMutator, LopdfMutator};

use image::{ImageBuffer, Rgba};
use lopdf::Document;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Page dimensions in PDF points, derived once from the MediaBox and cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

#[derive(Debug, Clone)]
pub enum OpenSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for OpenSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for OpenSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for OpenSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("invalid handle {0}")]
    InvalidHandle(u64),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("encrypted PDFs are not supported")]
    EncryptedUnsupported,
    #[error("backend error: {0}")]
    Backend(String),
}

/// Read-side contract: page count, per-page natural size, page rasters.
pub trait DocumentRenderer {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, EngineError>;
    fn page_count(&self, handle: DocumentHandle) -> Result<u32, EngineError>;

    /// Natural size of a page, `page_index` 0-based.
    fn page_size(&self, handle: DocumentHandle, page_index: u32)
        -> Result<PageSize, EngineError>;

    /// Rasterize a page at `scale` pixels per point.
    fn render_page(
        &self,
        handle: DocumentHandle,
        page_index: u32,
        scale: f32,
    ) -> Result<RgbaImage, EngineError>;

    fn close(&mut self, handle: DocumentHandle) -> Result<(), EngineError>;
}

/// MediaBox sizes for every page, defaulting to US Letter when absent.
pub(crate) fn media_box_sizes(doc: &Document) -> Result<Vec<PageSize>, EngineError> {
    let pages = doc.get_pages();
    let mut sizes = Vec::with_capacity(pages.len());

    for (_, object_id) in pages {
        let dict = doc.get_dictionary(object_id)?;
        let size = dict
            .get(b"MediaBox")
            .ok()
            .and_then(|obj| obj.as_array().ok())
            .and_then(|array| {
                if array.len() != 4 {
                    return None;
                }
                let x0 = array[0].as_float().ok()?;
                let y0 = array[1].as_float().ok()?;
                let x1 = array[2].as_float().ok()?;
                let y1 = array[3].as_float().ok()?;
                Some(PageSize { width_pt: (x1 - x0).abs(), height_pt: (y1 - y0).abs() })
            })
            .unwrap_or(PageSize { width_pt: 612.0, height_pt: 792.0 });

        sizes.push(size);
    }

    if sizes.is_empty() {
        return Err(EngineError::Backend("document has no pages".to_owned()));
    }

    Ok(sizes)
}

pub(crate) fn reject_encrypted(bytes: &[u8]) -> Result<(), EngineError> {
    if bytes.windows("/Encrypt".len()).any(|window| window == b"/Encrypt") {
        return Err(EngineError::EncryptedUnsupported);
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct DocumentRecord {
    page_sizes: Vec<PageSize>,
}

/// Default renderer backend.
///
/// Page geometry comes from lopdf; the raster is a plain white page with a
/// light border. Faithful glyph rasterization is a delegated concern and
/// lives behind the same trait when a real backend is wired in.
#[derive(Debug, Default)]
pub struct LopdfRenderer {
    next_handle: u64,
    docs: HashMap<DocumentHandle, DocumentRecord>,
}

impl LopdfRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, handle: DocumentHandle) -> Result<&DocumentRecord, EngineError> {
        self.docs.get(&handle).ok_or(EngineError::InvalidHandle(handle.raw()))
    }
}

impl DocumentRenderer for LopdfRenderer {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, EngineError> {
        let bytes = match source {
            OpenSource::Path(path) => fs::read(path)?,
            OpenSource::Bytes(bytes) => bytes,
        };

        reject_encrypted(&bytes)?;
        let doc = Document::load_mem(&bytes)?;
        let page_sizes = media_box_sizes(&doc)?;

        self.next_handle += 1;
        let handle = DocumentHandle(self.next_handle);
        log::debug!("opened document handle={} pages={}", handle.raw(), page_sizes.len());
        self.docs.insert(handle, DocumentRecord { page_sizes });

        Ok(handle)
    }

    fn page_count(&self, handle: DocumentHandle) -> Result<u32, EngineError> {
        Ok(self.record(handle)?.page_sizes.len() as u32)
    }

    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSize, EngineError> {
        let record = self.record(handle)?;
        record.page_sizes.get(page_index as usize).copied().ok_or(EngineError::PageOutOfRange {
            page: page_index,
            page_count: record.page_sizes.len() as u32,
        })
    }

    fn render_page(
        &self,
        handle: DocumentHandle,
        page_index: u32,
        scale: f32,
    ) -> Result<RgbaImage, EngineError> {
        let page_size = self.page_size(handle, page_index)?;
        let scale = if scale <= 0.0 { 1.0 } else { scale };

        let width = (page_size.width_pt * scale).round().max(1.0) as u32;
        let height = (page_size.height_pt * scale).round().max(1.0) as u32;

        let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        if width >= 4 && height >= 4 {
            for x in 0..width {
                image.put_pixel(x, 0, Rgba([220, 220, 220, 255]));
                image.put_pixel(x, height - 1, Rgba([220, 220, 220, 255]));
            }
            for y in 0..height {
                image.put_pixel(0, y, Rgba([220, 220, 220, 255]));
                image.put_pixel(width - 1, y, Rgba([220, 220, 220, 255]));
            }
        }

        Ok(image)
    }

    fn close(&mut self, handle: DocumentHandle) -> Result<(), EngineError> {
        self.docs.remove(&handle).map(|_| ()).ok_or(EngineError::InvalidHandle(handle.raw()))
    }
}

pub fn default_renderer() -> LopdfRenderer {
    LopdfRenderer::new()
}

//! Write-side contract: burn line-draw instructions into a document.
//!
//! Draw calls are buffered per page; `save` encodes one content stream per
//! touched page, appends it to that page's `Contents`, and serializes the
//! whole document. Nothing is written until `save`, so a failed export never
//! leaves a half-mutated byte stream behind.

use crate::{media_box_sizes, reject_encrypted, EngineError, PageSize};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream};
use redline_model::PagePoint;
use std::collections::BTreeMap;

pub trait DocumentMutator {
    fn page_count(&self) -> u32;

    /// Size of a page, `page` 1-based.
    fn page_size(&self, page: u32) -> Result<PageSize, EngineError>;

    /// Queue a stroked line on `page` (1-based). Coordinates are in page
    /// space, color components normalized 0-1, `width` in points.
    fn draw_line(
        &mut self,
        page: u32,
        start: PagePoint,
        end: PagePoint,
        color: (f32, f32, f32),
        width: f32,
    ) -> Result<(), EngineError>;

    /// Flush queued drawing into the document and serialize it.
    fn save(&mut self) -> Result<Vec<u8>, EngineError>;
}

pub struct LopdfMutator {
    doc: Document,
    page_ids: BTreeMap<u32, ObjectId>,
    sizes: Vec<PageSize>,
    pending: BTreeMap<u32, Vec<Operation>>,
}

impl LopdfMutator {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EngineError> {
        reject_encrypted(bytes)?;

        let doc = Document::load_mem(bytes)?;
        let page_ids = doc.get_pages();
        let sizes = media_box_sizes(&doc)?;

        Ok(Self { doc, page_ids, sizes, pending: BTreeMap::new() })
    }

    fn page_id(&self, page: u32) -> Result<ObjectId, EngineError> {
        self.page_ids.get(&page).copied().ok_or(EngineError::PageOutOfRange {
            page,
            page_count: self.sizes.len() as u32,
        })
    }

    /// Append an encoded content stream to a page, promoting a single
    /// `Contents` reference to an array when needed.
    fn append_content(&mut self, page_id: ObjectId, bytes: Vec<u8>) -> Result<(), EngineError> {
        let content_id = self.doc.add_object(Object::Stream(Stream::new(
            lopdf::Dictionary::new(),
            bytes,
        )));

        let page = self.doc.get_object_mut(page_id)?;
        let Object::Dictionary(dict) = page else {
            return Err(EngineError::Backend("page object is not a dictionary".to_owned()));
        };

        match dict.get(b"Contents").ok().cloned() {
            Some(Object::Reference(existing_id)) => {
                dict.set(
                    "Contents",
                    Object::Array(vec![
                        Object::Reference(existing_id),
                        Object::Reference(content_id),
                    ]),
                );
            }
            Some(Object::Array(mut array)) => {
                array.push(Object::Reference(content_id));
                dict.set("Contents", Object::Array(array));
            }
            _ => {
                dict.set("Contents", Object::Reference(content_id));
            }
        }

        Ok(())
    }
}

impl DocumentMutator for LopdfMutator {
    fn page_count(&self) -> u32 {
        self.sizes.len() as u32
    }

    fn page_size(&self, page: u32) -> Result<PageSize, EngineError> {
        self.page_id(page)?;
        Ok(self.sizes[(page - 1) as usize])
    }

    fn draw_line(
        &mut self,
        page: u32,
        start: PagePoint,
        end: PagePoint,
        color: (f32, f32, f32),
        width: f32,
    ) -> Result<(), EngineError> {
        self.page_id(page)?;

        let ops = self.pending.entry(page).or_default();
        ops.push(Operation::new("RG", vec![color.0.into(), color.1.into(), color.2.into()]));
        ops.push(Operation::new("w", vec![width.into()]));
        ops.push(Operation::new("m", vec![start.x.into(), start.y.into()]));
        ops.push(Operation::new("l", vec![end.x.into(), end.y.into()]));
        ops.push(Operation::new("S", vec![]));

        Ok(())
    }

    fn save(&mut self) -> Result<Vec<u8>, EngineError> {
        let pending = std::mem::take(&mut self.pending);

        for (page, ops) in pending {
            let page_id = self.page_id(page)?;

            let mut operations = Vec::with_capacity(ops.len() + 2);
            operations.push(Operation::new("q", vec![]));
            operations.extend(ops);
            operations.push(Operation::new("Q", vec![]));

            log::debug!("appending {} drawing ops to page {page}", operations.len());
            let bytes = Content { operations }.encode()?;
            self.append_content(page_id, bytes)?;
        }

        let mut bytes = Vec::new();
        self.doc.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

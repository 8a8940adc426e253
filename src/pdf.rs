//! Read-only document backend: page count and native page geometry.
//!
//! The editor never rasterizes page content itself - it only needs to know
//! how many pages exist and how large each one is in document space, so the
//! overlay can draw the page sheet and place elements on it. Parsing is done
//! with lopdf; the original bytes are retained for session creation and
//! export.

use std::path::Path;

use anyhow::{Context, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};

/// Native page dimensions in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// A loaded document: original bytes plus per-page geometry.
pub struct PdfDocument {
    bytes: Vec<u8>,
    /// `None` for a page whose geometry could not be read - the page is
    /// reported as unrenderable without failing the whole document.
    pages: Vec<Option<PageSize>>,
}

impl PdfDocument {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::load_bytes(bytes)
    }

    pub fn load_bytes(bytes: Vec<u8>) -> Result<Self> {
        let doc = Document::load_mem(&bytes).context("parsing PDF document")?;

        let mut pages = Vec::new();
        for (_, page_id) in doc.get_pages() {
            pages.push(resolve_page_size(&doc, page_id));
        }
        if pages.is_empty() {
            anyhow::bail!("document has no pages");
        }

        tracing::info!(pages = pages.len(), "document loaded");
        Ok(Self { bytes, pages })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page_size(&self, index: usize) -> Option<PageSize> {
        self.pages.get(index).copied().flatten()
    }

    /// The untouched source bytes, for session creation and export.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Resolve a page's MediaBox, walking up the page tree for inherited values.
fn resolve_page_size(doc: &Document, page_id: ObjectId) -> Option<PageSize> {
    let mut dict = doc.get_object(page_id).and_then(Object::as_dict).ok()?;
    // Parent chains in real documents are shallow; the bound guards cycles.
    for _ in 0..16 {
        if let Ok(media_box) = dict.get(b"MediaBox") {
            return media_box_size(doc, media_box);
        }
        dict = parent_dict(doc, dict)?;
    }
    None
}

fn parent_dict<'a>(doc: &'a Document, dict: &Dictionary) -> Option<&'a Dictionary> {
    let parent = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    doc.get_object(parent).and_then(Object::as_dict).ok()
}

fn media_box_size(doc: &Document, obj: &Object) -> Option<PageSize> {
    let obj = resolve(doc, obj)?;
    let rect = obj.as_array().ok()?;
    if rect.len() != 4 {
        return None;
    }
    let mut coords = [0.0f32; 4];
    for (slot, value) in coords.iter_mut().zip(rect) {
        *slot = number(resolve(doc, value)?)?;
    }
    let width = (coords[2] - coords[0]).abs();
    let height = (coords[3] - coords[1]).abs();
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some(PageSize { width, height })
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    /// Minimal two-page document; the second page inherits its MediaBox
    /// from the Pages node.
    fn sample_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let page_a = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        let page_b = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_a.into(), page_b.into()],
                "Count" => 2,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn loads_pages_with_native_dimensions() {
        let doc = PdfDocument::load_bytes(sample_pdf()).unwrap();
        assert_eq!(doc.page_count(), 2);

        let first = doc.page_size(0).unwrap();
        assert_eq!(first.width, 612.0);
        assert_eq!(first.height, 792.0);

        // Inherited from the Pages node
        let second = doc.page_size(1).unwrap();
        assert_eq!(second.width, 595.0);
        assert_eq!(second.height, 842.0);

        assert_eq!(doc.page_size(2), None);
    }

    #[test]
    fn loads_from_disk() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&sample_pdf()).unwrap();
        let doc = PdfDocument::load(file.path()).unwrap();
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn rejects_garbage_input() {
        assert!(PdfDocument::load_bytes(b"not a pdf".to_vec()).is_err());
    }

    #[test]
    fn keeps_original_bytes() {
        let bytes = sample_pdf();
        let doc = PdfDocument::load_bytes(bytes.clone()).unwrap();
        assert_eq!(doc.bytes(), &bytes[..]);
    }
}

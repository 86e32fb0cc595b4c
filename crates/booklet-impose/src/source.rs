//! Source document reading
//!
//! Opens the input PDF, rejects anything the engine cannot impose, and
//! records the geometry of every page so planning and composition never
//! need to touch the page tree again.

use crate::constants::DEFAULT_PAGE_DIMENSIONS;
use crate::types::*;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::{Path, PathBuf};

const PDF_HEADER: &[u8] = b"%PDF-";

/// Geometry of one source page
#[derive(Debug, Clone, PartialEq)]
pub struct PageInfo {
    /// 1-based page number
    pub number: usize,
    pub object_id: ObjectId,
    /// Lower-left corner of the MediaBox
    pub origin: (f32, f32),
    /// MediaBox size before `/Rotate` is applied
    pub size: Size,
    /// Intrinsic `/Rotate` of the page
    pub rotation: Rotation,
}

impl PageInfo {
    /// Size as the page is displayed, after its intrinsic rotation
    pub fn display_size(&self) -> Size {
        self.size.rotated(self.rotation)
    }
}

/// A parsed, validated input document
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub document: Document,
    pub pages: Vec<PageInfo>,
}

impl SourceDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Look up a page by its 1-based number
    pub fn page(&self, number: usize) -> Option<&PageInfo> {
        number.checked_sub(1).and_then(|idx| self.pages.get(idx))
    }

    /// Largest displayed width and height over all pages
    pub fn max_display_size(&self, auto_orient: bool) -> Size {
        self.pages.iter().fold(Size::default(), |acc, page| {
            let mut size = page.display_size();
            if auto_orient && size.is_landscape() {
                size = size.rotated(Rotation::Clockwise90);
            }
            Size::new(acc.width.max(size.width), acc.height.max(size.height))
        })
    }
}

/// Open and validate a source PDF
pub async fn open(path: impl AsRef<Path>) -> Result<SourceDocument> {
    let path = path.as_ref().to_owned();
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BookletError::NotFound(path));
        }
        Err(source) => return Err(BookletError::Unreadable { path, source }),
    };
    tokio::task::spawn_blocking(move || parse(path, &bytes)).await?
}

/// Parse PDF bytes that were read from `path`
pub fn parse(path: PathBuf, bytes: &[u8]) -> Result<SourceDocument> {
    if !has_pdf_header(bytes) {
        return Err(BookletError::NotAPdf(path));
    }
    if has_encrypt_marker(bytes) {
        return Err(BookletError::Encrypted(path));
    }

    let document = match Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(source) => return Err(BookletError::Corrupt { path, source }),
    };
    if document.is_encrypted() || document.trailer.get(b"Encrypt").is_ok() {
        return Err(BookletError::Encrypted(path));
    }

    let pages = read_pages(&document);
    if pages.is_empty() {
        return Err(BookletError::EmptyDocument(path));
    }

    log::debug!("Opened {} ({} pages)", path.display(), pages.len());
    Ok(SourceDocument {
        path,
        document,
        pages,
    })
}

/// The header may be preceded by a little garbage; readers accept it in
/// the first kilobyte.
fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(1024)];
    window.windows(PDF_HEADER.len()).any(|w| w == PDF_HEADER)
}

/// `/Encrypt` in a trailer is the only reliable signal before parsing,
/// since the parser may decrypt with an empty user password.
fn has_encrypt_marker(bytes: &[u8]) -> bool {
    const MARKER: &[u8] = b"/Encrypt";
    let tail = &bytes[bytes.len().saturating_sub(4096)..];
    tail.windows(MARKER.len()).any(|w| w == MARKER)
}

fn read_pages(document: &Document) -> Vec<PageInfo> {
    document
        .get_pages()
        .into_iter()
        .enumerate()
        .map(|(idx, (_, object_id))| {
            let media_box = inherited(document, object_id, b"MediaBox")
                .and_then(|obj| parse_box(&obj));
            let (origin, size) = media_box.unwrap_or((
                (0.0, 0.0),
                Size::new(DEFAULT_PAGE_DIMENSIONS.0, DEFAULT_PAGE_DIMENSIONS.1),
            ));
            let rotation = inherited(document, object_id, b"Rotate")
                .and_then(|obj| obj.as_i64().ok())
                .map(Rotation::from_degrees)
                .unwrap_or_default();

            PageInfo {
                number: idx + 1,
                object_id,
                origin,
                size,
                rotation,
            }
        })
        .collect()
}

/// Look up a page attribute, walking up the page tree for inheritable keys
pub(crate) fn inherited(document: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = document.get_dictionary(page_id).ok();
    // Bounded walk guards against cyclic Parent links
    for _ in 0..32 {
        let dict: &Dictionary = current?;
        if let Ok(value) = dict.get(key) {
            return resolve(document, value);
        }
        current = dict
            .get(b"Parent")
            .and_then(|p| p.as_reference())
            .and_then(|id| document.get_dictionary(id))
            .ok();
    }
    None
}

fn resolve(document: &Document, obj: &Object) -> Option<Object> {
    match obj {
        Object::Reference(id) => document.get_object(*id).ok().cloned(),
        other => Some(other.clone()),
    }
}

fn parse_box(obj: &Object) -> Option<((f32, f32), Size)> {
    let arr = obj.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let nums: Vec<f32> = arr.iter().filter_map(extract_number).collect();
    if nums.len() != 4 {
        return None;
    }
    let (x0, x1) = (nums[0].min(nums[2]), nums[0].max(nums[2]));
    let (y0, y1) = (nums[1].min(nums[3]), nums[1].max(nums[3]));
    if x1 - x0 <= 0.0 || y1 - y0 <= 0.0 {
        return None;
    }
    Some(((x0, y0), Size::new(x1 - x0, y1 - y0)))
}

/// Extract numeric value from a PDF object
pub(crate) fn extract_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

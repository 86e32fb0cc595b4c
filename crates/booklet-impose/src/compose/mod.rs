//! Sheet composition
//!
//! Each sheet face becomes two artifacts: a PDF content stream that draws
//! the source pages as Form XObjects, and a JPEG preview of the same face.
//! A [`SheetCompositor`] only reads shared, immutable data, so faces can be
//! composed concurrently.

mod placement;
mod preview;

pub use placement::{PagePlacement, Rect, fit_scale, half_rect, orientation_fix, place_page, sheet_size};
pub use preview::{orient_bitmap, render_preview, save_jpeg};

use crate::plan::SheetSide;
use crate::raster::PageImages;
use crate::source::PageInfo;
use crate::transform::TransformResolver;
use crate::types::*;
use std::path::PathBuf;

/// Where and how preview images are written
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewSettings {
    pub max_dimension: u32,
    pub quality: u8,
    /// Directory unique to one request
    pub dir: PathBuf,
}

/// A source page drawn on a composed face
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XObjectPlacement {
    /// Resource name without the leading slash
    pub name: String,
    pub page_number: usize,
}

/// Output of composing one sheet face
#[derive(Debug, Clone)]
pub struct ComposedSide {
    pub side: SheetSide,
    pub sheet_size: Size,
    pub content: Vec<u8>,
    pub placements: Vec<XObjectPlacement>,
    pub preview_path: PathBuf,
    /// Page drawn in the left half of the preview
    pub left_page: Option<usize>,
    /// Page drawn in the right half of the preview
    pub right_page: Option<usize>,
}

/// XObject resource name for content landing in `half`
pub fn xobject_name(half: Half) -> &'static str {
    match half {
        Half::Left => "P0",
        Half::Right => "P1",
    }
}

pub struct SheetCompositor {
    pub sheet: Size,
    pub resolver: TransformResolver,
    pub auto_orient: bool,
    pub pages: Vec<PageInfo>,
    pub images: PageImages,
    pub preview: PreviewSettings,
}

impl SheetCompositor {
    /// Resolve and place the non-blank slots of `side`
    pub fn placements(&self, side: &SheetSide) -> Result<Vec<PagePlacement>> {
        let mut placed = Vec::with_capacity(2);
        for half in [Half::Left, Half::Right] {
            let Slot::Page(number) = side.slot(half) else {
                continue;
            };
            let page = self.pages.get(number.wrapping_sub(1)).ok_or_else(|| {
                BookletError::Render {
                    page_number: side.page_number,
                    message: format!("source page {} does not exist", number),
                }
            })?;
            let spec = self.resolver.resolve(SlotPosition::new(side.face, half));
            placed.push(place_page(page, spec, self.sheet, self.auto_orient));
        }
        Ok(placed)
    }

    /// Compose one face: content stream plus preview file
    pub fn compose(&self, side: &SheetSide) -> Result<ComposedSide> {
        let placed = self.placements(side)?;

        let mut content = String::new();
        let mut placements = Vec::with_capacity(placed.len());
        let mut left_page = None;
        let mut right_page = None;

        for placement in &placed {
            let name = xobject_name(placement.half);
            content.push_str(&format!("q {} /{} Do Q\n", placement.matrix.to_cm(), name));
            placements.push(XObjectPlacement {
                name: name.to_string(),
                page_number: placement.page_number,
            });
            match placement.half {
                Half::Left => left_page = Some(placement.page_number),
                Half::Right => right_page = Some(placement.page_number),
            }
        }

        let mut bitmaps = Vec::with_capacity(placed.len());
        for placement in &placed {
            let image = self.images.get(placement.page_number).ok_or_else(|| {
                BookletError::Render {
                    page_number: side.page_number,
                    message: format!("no bitmap for source page {}", placement.page_number),
                }
            })?;
            bitmaps.push((placement, image));
        }

        let preview = render_preview(self.sheet, self.preview.max_dimension, &bitmaps);
        let preview_path = self.preview.dir.join(format!("{}.jpg", side.page_number));
        save_jpeg(&preview, &preview_path, self.preview.quality).map_err(|e| {
            BookletError::Render {
                page_number: side.page_number,
                message: format!("failed to write preview {}: {}", preview_path.display(), e),
            }
        })?;

        log::debug!(
            "Composed sheet {} {:?} (left {:?}, right {:?})",
            side.sheet_index,
            side.face,
            left_page,
            right_page
        );

        Ok(ComposedSide {
            side: *side,
            sheet_size: self.sheet,
            content: content.into_bytes(),
            placements,
            preview_path,
            left_page,
            right_page,
        })
    }
}

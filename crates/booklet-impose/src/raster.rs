//! Page rasterization for the preview gallery
//!
//! Source pages are rasterized once per request, before composition, into
//! a [`PageImages`] set that every compositor worker reads from.

use crate::constants::PLACEHOLDER_BORDER_GREY;
use crate::source::{PageInfo, SourceDocument};
use crate::types::*;
use image::{Rgba, RgbaImage};
use std::sync::Arc;

/// Renders source pages to bitmaps in their displayed orientation
/// (intrinsic `/Rotate` already applied).
pub trait PageRasterizer: Send + Sync {
    /// Render every page so its longest side is at most `max_dimension` pixels.
    fn rasterize(&self, source: &SourceDocument, max_dimension: u32) -> Result<PageImages>;

    fn name(&self) -> &'static str;
}

/// Rasterized pages of one source document, indexed by page number
#[derive(Debug, Clone, Default)]
pub struct PageImages {
    images: Vec<RgbaImage>,
}

impl PageImages {
    pub fn new(images: Vec<RgbaImage>) -> Self {
        Self { images }
    }

    /// Bitmap for the 1-based page `number`
    pub fn get(&self, number: usize) -> Option<&RgbaImage> {
        number.checked_sub(1).and_then(|idx| self.images.get(idx))
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Pixel size of a page scaled so its longest side is `max_dimension`
pub fn fit_pixels(size: Size, max_dimension: u32) -> (u32, u32) {
    let longest = size.width.max(size.height).max(f32::EPSILON);
    let scale = max_dimension as f32 / longest;
    (
        ((size.width * scale).round() as u32).max(1),
        ((size.height * scale).round() as u32).max(1),
    )
}

/// Draws each page as a white sheet with a grey outline.
///
/// Used when no native PDF renderer is available; the gallery still shows
/// where every page lands and how it is oriented by its aspect ratio.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderRasterizer;

impl PlaceholderRasterizer {
    fn render_page(page: &PageInfo, max_dimension: u32) -> RgbaImage {
        let (w, h) = fit_pixels(page.display_size(), max_dimension);
        let border = Rgba([
            PLACEHOLDER_BORDER_GREY,
            PLACEHOLDER_BORDER_GREY,
            PLACEHOLDER_BORDER_GREY,
            255,
        ]);
        RgbaImage::from_fn(w, h, |x, y| {
            if x == 0 || y == 0 || x + 1 == w || y + 1 == h {
                border
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }
}

impl PageRasterizer for PlaceholderRasterizer {
    fn rasterize(&self, source: &SourceDocument, max_dimension: u32) -> Result<PageImages> {
        Ok(PageImages::new(
            source
                .pages
                .iter()
                .map(|page| Self::render_page(page, max_dimension))
                .collect(),
        ))
    }

    fn name(&self) -> &'static str {
        "placeholder"
    }
}

#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumRasterizer;

#[cfg(feature = "pdfium")]
mod pdfium {
    use super::*;
    use pdfium_render::prelude::*;

    /// Renders pages with the native pdfium library.
    ///
    /// Bindings are created per call so the rasterizer stays `Send + Sync`.
    #[derive(Debug, Clone, Copy)]
    pub struct PdfiumRasterizer;

    impl PdfiumRasterizer {
        /// Check that pdfium can be bound in this environment
        pub fn bind() -> std::result::Result<Self, PdfiumError> {
            init_pdfium()?;
            Ok(Self)
        }
    }

    /// Bind to pdfium next to the executable, then the system library
    fn init_pdfium() -> std::result::Result<Pdfium, PdfiumError> {
        let bindings =
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library())?;
        Ok(Pdfium::new(bindings))
    }

    fn render_error(e: impl std::fmt::Display) -> BookletError {
        BookletError::Rasterize {
            rasterizer: "pdfium",
            message: e.to_string(),
        }
    }

    impl PageRasterizer for PdfiumRasterizer {
        fn rasterize(&self, source: &SourceDocument, max_dimension: u32) -> Result<PageImages> {
            let pdfium = init_pdfium().map_err(render_error)?;
            let document = pdfium
                .load_pdf_from_file(&source.path, None)
                .map_err(render_error)?;

            let config = PdfRenderConfig::new()
                .set_maximum_width(max_dimension as i32)
                .set_maximum_height(max_dimension as i32);

            let mut images = Vec::with_capacity(source.page_count());
            for page in document.pages().iter() {
                let bitmap = page.render_with_config(&config).map_err(render_error)?;
                let width = bitmap.width() as u32;
                let height = bitmap.height() as u32;
                let image = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes().to_vec())
                    .ok_or_else(|| render_error("bitmap size mismatch"))?;
                images.push(image);
            }

            Ok(PageImages::new(images))
        }

        fn name(&self) -> &'static str {
            "pdfium"
        }
    }
}

/// Pick the best rasterizer available in this build and environment
pub fn default_rasterizer() -> Arc<dyn PageRasterizer> {
    #[cfg(feature = "pdfium")]
    {
        match PdfiumRasterizer::bind() {
            Ok(rasterizer) => return Arc::new(rasterizer),
            Err(e) => log::warn!("pdfium unavailable, previews will show page outlines: {}", e),
        }
    }

    Arc::new(PlaceholderRasterizer)
}

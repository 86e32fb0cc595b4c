#![allow(dead_code)]

use booklet_impose::*;
use image::{Rgba, RgbaImage};
use lopdf::{Dictionary, Document, Object, Stream};
use std::path::{Path, PathBuf};

pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
pub const YELLOW: Rgba<u8> = Rgba([255, 255, 0, 255]);

pub fn create_test_pdf(num_pages: usize) -> Document {
    create_test_pdf_with(&vec![(612.0, 792.0, 0); num_pages])
}

/// One page per `(width, height, rotate)` entry
pub fn create_test_pdf_with(pages: &[(f32, f32, i64)]) -> Document {
    let mut doc = Document::with_version("1.7");

    // Create page tree root ID
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for (idx, &(width, height, rotate)) in pages.iter().enumerate() {
        let content = format!("BT /F1 12 Tf 72 72 Td (Page {}) Tj ET", idx + 1);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let mut page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(width),
                    Object::Real(height),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(content_id)),
        ]);
        if rotate != 0 {
            page.set("Rotate", Object::Integer(rotate));
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(pages.len() as i64)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));

    doc.trailer.set("Root", catalog_id);

    doc
}

pub fn save_test_pdf(mut doc: Document, path: &Path) {
    let mut writer = Vec::new();
    doc.save_to(&mut writer).unwrap();
    std::fs::write(path, writer).unwrap();
}

/// Write an `n`-page test PDF into `dir` and return its path
pub fn write_test_pdf(dir: &Path, num_pages: usize) -> PathBuf {
    let path = dir.join(format!("source-{}.pdf", num_pages));
    save_test_pdf(create_test_pdf(num_pages), &path);
    path
}

pub fn test_options(dir: &Path) -> BookletOptions {
    BookletOptions {
        preview_dir: dir.join("previews"),
        preview_max_dimension: 300,
        workers: Some(2),
        ..BookletOptions::default()
    }
}

/// Paints every page as four coloured quadrants:
///
/// ```text
/// red    | green
/// -------+-------
/// blue   | yellow
/// ```
pub struct QuadrantRasterizer;

impl PageRasterizer for QuadrantRasterizer {
    fn rasterize(&self, source: &SourceDocument, max_dimension: u32) -> Result<PageImages> {
        Ok(PageImages::new(
            source
                .pages
                .iter()
                .map(|page| {
                    let (w, h) = raster::fit_pixels(page.display_size(), max_dimension);
                    RgbaImage::from_fn(w, h, |x, y| match (x < w / 2, y < h / 2) {
                        (true, true) => RED,
                        (false, true) => GREEN,
                        (true, false) => BLUE,
                        (false, false) => YELLOW,
                    })
                })
                .collect(),
        ))
    }

    fn name(&self) -> &'static str {
        "quadrant"
    }
}

/// Closest of the four quadrant colours (or white) to a decoded JPEG pixel
pub fn classify(pixel: image::Rgb<u8>) -> &'static str {
    let [r, g, b] = pixel.0;
    let hi = |v: u8| v > 180;
    let lo = |v: u8| v < 80;
    match (hi(r), hi(g), hi(b)) {
        (true, true, true) => "white",
        (true, true, false) if lo(b) => "yellow",
        (true, false, false) if lo(g) && lo(b) => "red",
        (false, true, false) if lo(r) && lo(b) => "green",
        (false, false, true) if lo(r) && lo(g) => "blue",
        _ => "unknown",
    }
}

//! Geometry of a page inside its half of the sheet
//!
//! Every page goes through the same chain, in PDF space and in the preview:
//!
//! 1. intrinsic `/Rotate` (preview bitmaps arrive with it applied)
//! 2. quarter turn to match the half's orientation (`auto_orient`)
//! 3. mirror (flip horizontal / vertical)
//! 4. slot rotation from the resolver
//! 5. uniform scale to fit the half, centred

use crate::options::{BookletOptions, SheetSizePolicy};
use crate::source::{PageInfo, SourceDocument};
use crate::transform::{Affine, TransformSpec};
use crate::types::*;

/// A rectangular area in points (origin bottom-left)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Output sheet size for a request
pub fn sheet_size(source: &SourceDocument, options: &BookletOptions) -> Size {
    match options.sheet_size {
        SheetSizePolicy::Fixed(paper) => paper.landscape_pt(),
        SheetSizePolicy::DeriveFromSource => {
            let page = source.max_display_size(options.auto_orient);
            Size::new(page.width * 2.0, page.height)
        }
    }
}

/// Area of the sheet covered by one half
pub fn half_rect(sheet: Size, half: Half) -> Rect {
    let width = sheet.width / 2.0;
    match half {
        Half::Left => Rect::new(0.0, 0.0, width, sheet.height),
        Half::Right => Rect::new(width, 0.0, width, sheet.height),
    }
}

/// Quarter turn needed so a page's orientation matches its cell
pub fn orientation_fix(displayed: Size, cell: Size, auto_orient: bool) -> Rotation {
    if auto_orient && displayed.is_landscape() != cell.is_landscape() {
        Rotation::Clockwise90
    } else {
        Rotation::None
    }
}

/// Scale factor that fits `content` inside `cell`, preserving aspect
pub fn fit_scale(content: Size, cell: Size) -> f32 {
    if content.width <= 0.0 || content.height <= 0.0 {
        return 1.0;
    }
    (cell.width / content.width).min(cell.height / content.height)
}

/// Fully resolved placement of one source page
#[derive(Debug, Clone, PartialEq)]
pub struct PagePlacement {
    pub page_number: usize,
    pub half: Half,
    /// Quarter turn applied before mirroring
    pub orientation_fix: Rotation,
    pub spec: TransformSpec,
    /// Page box in XObject space → sheet space
    pub matrix: Affine,
    /// Sheet-space area covered by the placed page
    pub content_rect: Rect,
}

/// Place `page` into the half named by `spec`
pub fn place_page(page: &PageInfo, spec: TransformSpec, sheet: Size, auto_orient: bool) -> PagePlacement {
    let cell = half_rect(sheet, spec.half);
    let displayed = page.display_size();
    let fix = orientation_fix(displayed, cell.size(), auto_orient);
    let final_size = displayed.rotated(fix).rotated(spec.rotation);
    let scale = fit_scale(final_size, cell.size());
    let (cx, cy) = cell.center();

    let matrix = Affine::translate(
        -(page.origin.0 + page.size.width / 2.0),
        -(page.origin.1 + page.size.height / 2.0),
    )
    .then(Affine::rotate(page.rotation))
    .then(Affine::rotate(fix))
    .then(Affine::mirror(spec.flip_horizontal, spec.flip_vertical))
    .then(Affine::rotate(spec.rotation))
    .then(Affine::scale(scale))
    .then(Affine::translate(cx, cy));

    let placed_w = final_size.width * scale;
    let placed_h = final_size.height * scale;

    PagePlacement {
        page_number: page.number,
        half: spec.half,
        orientation_fix: fix,
        spec,
        matrix,
        content_rect: Rect::new(cx - placed_w / 2.0, cy - placed_h / 2.0, placed_w, placed_h),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(width: f32, height: f32, rotation: Rotation) -> PageInfo {
        PageInfo {
            number: 1,
            object_id: (1, 0),
            origin: (0.0, 0.0),
            size: Size::new(width, height),
            rotation,
        }
    }

    const A4_SHEET: Size = Size {
        width: 842.0,
        height: 595.0,
    };

    fn approx(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 0.01 && (a.1 - b.1).abs() < 0.01
    }

    #[test]
    fn test_identity_placement_centres_page() {
        let p = page(421.0, 595.0, Rotation::None);
        let placed = place_page(&p, TransformSpec::identity(Half::Right), A4_SHEET, true);
        assert!(approx(placed.matrix.apply(0.0, 0.0), (421.0, 0.0)));
        assert!(approx(placed.matrix.apply(421.0, 595.0), (842.0, 595.0)));
    }

    #[test]
    fn test_rotated_placement_maps_corners() {
        let p = page(421.0, 595.0, Rotation::None);
        let spec = TransformSpec {
            rotation: Rotation::Clockwise180,
            ..TransformSpec::identity(Half::Left)
        };
        let placed = place_page(&p, spec, A4_SHEET, true);
        // Bottom-left of the page ends up top-right of the half
        assert!(approx(placed.matrix.apply(0.0, 0.0), (421.0, 595.0)));
    }

    #[test]
    fn test_landscape_page_is_turned() {
        let p = page(595.0, 421.0, Rotation::None);
        let placed = place_page(&p, TransformSpec::identity(Half::Left), A4_SHEET, true);
        assert_eq!(placed.orientation_fix, Rotation::Clockwise90);
        assert!((placed.content_rect.width - 421.0).abs() < 0.5);

        let unturned = place_page(&p, TransformSpec::identity(Half::Left), A4_SHEET, false);
        assert_eq!(unturned.orientation_fix, Rotation::None);
        assert!(unturned.content_rect.width <= 421.0 + 0.01);
        assert!(unturned.content_rect.height < 595.0);
    }

    #[test]
    fn test_intrinsic_rotation_counts_toward_orientation() {
        // Landscape media box displayed portrait via /Rotate 90
        let p = page(595.0, 421.0, Rotation::Clockwise90);
        let placed = place_page(&p, TransformSpec::identity(Half::Left), A4_SHEET, true);
        assert_eq!(placed.orientation_fix, Rotation::None);
        assert!((placed.content_rect.height - 595.0).abs() < 0.5);
    }

    #[test]
    fn test_flip_keeps_content_rect() {
        let p = page(300.0, 500.0, Rotation::None);
        let plain = place_page(&p, TransformSpec::identity(Half::Left), A4_SHEET, true);
        let flipped = place_page(
            &p,
            TransformSpec {
                flip_horizontal: true,
                ..TransformSpec::identity(Half::Left)
            },
            A4_SHEET,
            true,
        );
        assert_eq!(plain.content_rect, flipped.content_rect);
        // Left edge of the page is now on the right
        let (x_plain, _) = plain.matrix.apply(0.0, 250.0);
        let (x_flipped, _) = flipped.matrix.apply(0.0, 250.0);
        assert!(x_flipped > x_plain);
    }
}

//! Shared constants for booklet imposition

// =============================================================================
// Unit Conversion
// =============================================================================

/// Points per millimeter (1 inch = 72 points, 1 inch = 25.4mm)
pub const POINTS_PER_MM: f32 = 72.0 / 25.4;

/// Convert millimeters to points
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

// =============================================================================
// Default Page Dimensions
// =============================================================================

/// Default page width in points (US Letter: 8.5" × 11")
pub const DEFAULT_PAGE_WIDTH_PT: f32 = 612.0;

/// Default page height in points (US Letter)
pub const DEFAULT_PAGE_HEIGHT_PT: f32 = 792.0;

/// Default page dimensions as tuple (width, height)
pub const DEFAULT_PAGE_DIMENSIONS: (f32, f32) = (DEFAULT_PAGE_WIDTH_PT, DEFAULT_PAGE_HEIGHT_PT);

// =============================================================================
// Booklet Geometry
// =============================================================================

/// Logical pages on one folded sheet (two faces × two halves)
pub const PAGES_PER_SHEET: usize = 4;

/// Printed faces per physical sheet
pub const FACES_PER_SHEET: usize = 2;

// =============================================================================
// Preview
// =============================================================================

/// Longest side of a preview bitmap in pixels
pub const DEFAULT_PREVIEW_MAX_DIMENSION: u32 = 1200;

/// JPEG quality used for preview files
pub const DEFAULT_PREVIEW_QUALITY: u8 = 90;

/// Directory name under the system temp dir that holds preview images
pub const PREVIEW_DIR_NAME: &str = "booklet-previews";

/// Grey used for placeholder page outlines
pub const PLACEHOLDER_BORDER_GREY: u8 = 190;

/// Suffix appended to the input stem when no output path is given
pub const OUTPUT_SUFFIX: &str = "_booklet";

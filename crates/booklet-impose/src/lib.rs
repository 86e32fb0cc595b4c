pub mod assemble;
pub mod booklet;
pub mod compose;
pub mod constants;
mod options;
pub mod plan;
pub mod raster;
pub mod report;
pub mod source;
mod stats;
pub mod transform;
mod types;

pub use assemble::{assemble, write_atomically};
pub use booklet::{
    BookletOutcome, compose_all, create_booklet, create_booklet_with, prune_previews, respond,
};
pub use compose::{ComposedSide, SheetCompositor};
pub use options::*;
pub use plan::{ImpositionPlan, SheetSide, plan};
pub use raster::{PageImages, PageRasterizer, PlaceholderRasterizer, default_rasterizer};
pub use report::{BookletRequest, BookletResponse, GalleryPageItem, Status, default_output_path, report};
pub use source::{PageInfo, SourceDocument};
pub use stats::{calculate_statistics, document_statistics};
pub use transform::{TransformFlags, TransformResolver, TransformSpec, resolve};
pub use types::*;

#[cfg(feature = "pdfium")]
pub use raster::PdfiumRasterizer;

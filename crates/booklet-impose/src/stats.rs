use crate::constants::PAGES_PER_SHEET;
use crate::plan::plan;
use crate::types::*;
use std::path::Path;

/// Calculate statistics for a booklet of `page_count` source pages
pub fn calculate_statistics(page_count: usize, padded: bool) -> Result<BookletStatistics> {
    let plan = plan(page_count, padded)?;

    Ok(BookletStatistics {
        source_pages: page_count,
        padded_pages: plan.padded_count,
        blank_pages_added: plan.blank_count(),
        sheets: plan.padded_count / PAGES_PER_SHEET,
        sheet_sides: plan.sides.len(),
    })
}

/// Open a PDF and calculate its booklet statistics
pub async fn document_statistics(path: impl AsRef<Path>, padded: bool) -> Result<BookletStatistics> {
    let source = crate::source::open(path).await?;
    calculate_statistics(source.page_count(), padded)
}

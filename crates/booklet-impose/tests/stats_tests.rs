mod common;

use booklet_impose::*;
use common::*;

#[test]
fn test_stats_no_pages() {
    let result = calculate_statistics(0, true);
    assert!(matches!(result, Err(BookletError::Planning(_))));
}

#[test]
fn test_stats_exact_sheets() {
    let stats = calculate_statistics(8, true).unwrap();
    assert_eq!(stats.source_pages, 8);
    assert_eq!(stats.padded_pages, 8);
    assert_eq!(stats.blank_pages_added, 0);
    assert_eq!(stats.sheets, 2);
    assert_eq!(stats.sheet_sides, 4);
}

#[test]
fn test_stats_with_padding() {
    let stats = calculate_statistics(10, true).unwrap();
    assert_eq!(stats.padded_pages, 12);
    assert_eq!(stats.blank_pages_added, 2);
    assert_eq!(stats.sheets, 3);
    assert_eq!(stats.sheet_sides, 6);
}

#[test]
fn test_stats_unpadded_single_page() {
    let padded = calculate_statistics(1, true).unwrap();
    assert_eq!(padded.sheet_sides, 2);

    let unpadded = calculate_statistics(1, false).unwrap();
    assert_eq!(unpadded.sheets, 1);
    assert_eq!(unpadded.sheet_sides, 1);
    assert_eq!(unpadded.blank_pages_added, 3);
}

#[tokio::test]
async fn test_document_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_test_pdf(dir.path(), 13);

    let stats = document_statistics(&path, true).await.unwrap();
    assert_eq!(stats.source_pages, 13);
    assert_eq!(stats.padded_pages, 16);
    assert_eq!(stats.sheets, 4);
}

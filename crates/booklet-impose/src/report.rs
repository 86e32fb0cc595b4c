//! Request and response contract
//!
//! These types are what a UI collaborator exchanges with the engine; with
//! the `serde` feature they serialise with camelCase keys.

use crate::compose::ComposedSide;
use crate::constants::OUTPUT_SUFFIX;
use crate::transform::TransformFlags;
use crate::types::*;
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One booklet creation request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct BookletRequest {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub rotate_all: bool,
    pub rotate: bool,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
}

impl BookletRequest {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            ..Self::default()
        }
    }

    pub fn flags(&self) -> TransformFlags {
        TransformFlags {
            rotate_all: self.rotate_all,
            rotate: self.rotate,
            flip_horizontal: self.flip_horizontal,
            flip_vertical: self.flip_vertical,
        }
    }

    /// Reject requests that cannot be served before touching the filesystem
    pub fn validate(&self) -> Result<()> {
        if self.input_path.as_os_str().is_empty() {
            return Err(BookletError::InvalidRequest(
                "No input PDF selected".to_string(),
            ));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(BookletError::InvalidRequest(
                "No output path specified".to_string(),
            ));
        }
        Ok(())
    }
}

/// `<dir>/<stem>_booklet.pdf` next to the input
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}{}.pdf", stem, OUTPUT_SUFFIX))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Status {
    Success,
    Error,
}

/// One preview in the gallery, in printer order
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct GalleryPageItem {
    pub image_path: PathBuf,
    /// 1-based position in printer order
    pub page_number: usize,
    pub is_back_side: bool,
    pub left_page_num: Option<usize>,
    pub right_page_num: Option<usize>,
}

/// Terminal response for one request
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct BookletResponse {
    pub status: Status,
    pub message: String,
    pub result_path: Option<PathBuf>,
    pub gallery_pages: Vec<GalleryPageItem>,
    pub total_pages: usize,
}

impl BookletResponse {
    pub fn from_error(error: &BookletError) -> Self {
        Self {
            status: Status::Error,
            message: error.to_string(),
            result_path: None,
            gallery_pages: Vec::new(),
            total_pages: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Gallery entry for a composed face
pub fn gallery_item(composed: &ComposedSide) -> GalleryPageItem {
    GalleryPageItem {
        image_path: composed.preview_path.clone(),
        page_number: composed.side.page_number,
        is_back_side: composed.side.is_back_side(),
        left_page_num: composed.left_page,
        right_page_num: composed.right_page,
    }
}

/// Build the success response for a written booklet.
///
/// `sides` must already be in printer order.
pub fn report(artifact_path: &Path, sides: &[ComposedSide]) -> BookletResponse {
    let gallery_pages: Vec<GalleryPageItem> = sides.iter().map(gallery_item).collect();
    BookletResponse {
        status: Status::Success,
        message: format!("Booklet created: {}", artifact_path.display()),
        result_path: Some(artifact_path.to_path_buf()),
        total_pages: gallery_pages.len(),
        gallery_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_messages() {
        let err = BookletRequest::new("", "out.pdf").validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid request: No input PDF selected");

        let err = BookletRequest::new("in.pdf", "").validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
        assert!(err.to_string().contains("No output path specified"));

        assert!(BookletRequest::new("in.pdf", "out.pdf").validate().is_ok());
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/docs/zine.pdf")),
            PathBuf::from("/docs/zine_booklet.pdf")
        );
    }

    #[test]
    fn test_error_response() {
        let response = BookletResponse::from_error(&BookletError::Planning("x".into()));
        assert!(!response.is_success());
        assert!(response.result_path.is_none());
        assert!(response.gallery_pages.is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_contract_keys() {
        let request: BookletRequest =
            serde_json::from_str(r#"{"inputPath":"a.pdf","outputPath":"b.pdf","rotateAll":true}"#)
                .unwrap();
        assert!(request.rotate_all);
        assert!(!request.flip_vertical);

        let response = BookletResponse {
            status: Status::Success,
            message: "ok".into(),
            result_path: Some(PathBuf::from("b.pdf")),
            gallery_pages: vec![GalleryPageItem {
                image_path: PathBuf::from("1.jpg"),
                page_number: 1,
                is_back_side: false,
                left_page_num: None,
                right_page_num: Some(1),
            }],
            total_pages: 1,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["resultPath"], "b.pdf");
        assert_eq!(json["galleryPages"][0]["isBackSide"], false);
        assert!(json["galleryPages"][0]["leftPageNum"].is_null());
        assert_eq!(json["galleryPages"][0]["rightPageNum"], 1);
    }
}

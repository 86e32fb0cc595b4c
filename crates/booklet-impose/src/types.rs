use std::path::PathBuf;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Error, Debug)]
pub enum BookletError {
    #[error("Input file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Cannot read input {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Not a PDF file: {}", .0.display())]
    NotAPdf(PathBuf),
    #[error("Corrupt PDF {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },
    #[error("Encrypted PDFs are not supported: {}", .0.display())]
    Encrypted(PathBuf),
    #[error("PDF has no pages: {}", .0.display())]
    EmptyDocument(PathBuf),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Imposition plan invariant violated: {0}")]
    Planning(String),
    #[error("Failed to render sheet side {page_number}: {message}")]
    Render { page_number: usize, message: String },
    #[error("Failed to rasterize source pages with {rasterizer}: {message}")]
    Rasterize {
        rasterizer: &'static str,
        message: String,
    },
    #[error("Cannot create output directory {}: {source}", path.display())]
    PathNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Coarse classification of [`BookletError`] for callers that only care
/// about which pipeline stage failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Planning,
    Render,
    Output,
    Config,
}

impl BookletError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookletError::NotFound(_)
            | BookletError::Unreadable { .. }
            | BookletError::NotAPdf(_)
            | BookletError::Corrupt { .. }
            | BookletError::Encrypted(_)
            | BookletError::EmptyDocument(_)
            | BookletError::InvalidRequest(_) => ErrorKind::Input,
            BookletError::Planning(_) => ErrorKind::Planning,
            BookletError::Render { .. }
            | BookletError::Rasterize { .. }
            | BookletError::Image(_)
            | BookletError::Pdf(_) => ErrorKind::Render,
            BookletError::PathNotWritable { .. } | BookletError::Write { .. } => ErrorKind::Output,
            BookletError::Config(_) => ErrorKind::Config,
            BookletError::Io(_) | BookletError::TaskJoin(_) => ErrorKind::Output,
        }
    }
}

pub type Result<T> = std::result::Result<T, BookletError>;

/// Which physical face of a printed sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Face {
    /// Printed first in duplex
    Front,
    /// Printed second in duplex
    Back,
}

/// Left or right half of a sheet face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Half {
    Left,
    Right,
}

impl Half {
    pub fn opposite(self) -> Self {
        match self {
            Half::Left => Half::Right,
            Half::Right => Half::Left,
        }
    }
}

/// One of the four page positions on a physical sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SlotPosition {
    pub face: Face,
    pub half: Half,
}

impl SlotPosition {
    pub const FRONT_LEFT: Self = Self::new(Face::Front, Half::Left);
    pub const FRONT_RIGHT: Self = Self::new(Face::Front, Half::Right);
    pub const BACK_LEFT: Self = Self::new(Face::Back, Half::Left);
    pub const BACK_RIGHT: Self = Self::new(Face::Back, Half::Right);

    pub const fn new(face: Face, half: Half) -> Self {
        Self { face, half }
    }
}

/// Content of one slot: a real source page (1-based) or padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Page(usize),
    Blank,
}

impl Slot {
    /// Slot for logical page `number`, blank when it lies past the source.
    pub fn for_page(number: usize, page_count: usize) -> Self {
        if number >= 1 && number <= page_count {
            Slot::Page(number)
        } else {
            Slot::Blank
        }
    }

    pub fn page(self) -> Option<usize> {
        match self {
            Slot::Page(n) => Some(n),
            Slot::Blank => None,
        }
    }

    pub fn is_blank(self) -> bool {
        matches!(self, Slot::Blank)
    }
}

/// Quarter-turn rotation, clockwise as seen on the printed sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl Rotation {
    pub fn degrees(self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 90,
            Rotation::Clockwise180 => 180,
            Rotation::Clockwise270 => 270,
        }
    }

    /// Normalise any multiple of 90 (negative allowed); other angles snap
    /// down to the previous quarter turn.
    pub fn from_degrees(degrees: i64) -> Self {
        match degrees.rem_euclid(360) / 90 {
            1 => Rotation::Clockwise90,
            2 => Rotation::Clockwise180,
            3 => Rotation::Clockwise270,
            _ => Rotation::None,
        }
    }

    /// Apply `other` after `self`.
    pub fn then(self, other: Rotation) -> Self {
        Self::from_degrees((self.degrees() + other.degrees()) as i64)
    }

    /// Whether width and height trade places under this rotation
    pub fn is_quarter_turn(self) -> bool {
        matches!(self, Rotation::Clockwise90 | Rotation::Clockwise270)
    }
}

/// Orientation-aware size of a page or sheet, in points
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn rotated(self, rotation: Rotation) -> Self {
        if rotation.is_quarter_turn() {
            Self::new(self.height, self.width)
        } else {
            self
        }
    }

    pub fn is_landscape(self) -> bool {
        self.width > self.height
    }
}

/// Standard paper sizes
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PaperSize {
    A3,
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: f32, height_mm: f32 },
}

impl PaperSize {
    /// Get base dimensions (always portrait: width < height for standard sizes)
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            PaperSize::A3 => (297.0, 420.0),
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A5 => (148.0, 210.0),
            PaperSize::Letter => (215.9, 279.4),
            PaperSize::Legal => (215.9, 355.6),
            PaperSize::Tabloid => (279.4, 431.8),
            PaperSize::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }

    /// Landscape sheet size in points; a booklet sheet holds two portrait halves.
    pub fn landscape_pt(self) -> Size {
        let (w, h) = self.dimensions_mm();
        let (short, long) = if w <= h { (w, h) } else { (h, w) };
        Size::new(
            crate::constants::mm_to_pt(long),
            crate::constants::mm_to_pt(short),
        )
    }
}

/// Statistics about a booklet imposition
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BookletStatistics {
    /// Pages in the source document
    pub source_pages: usize,
    /// Source pages rounded up to a whole number of sheets
    pub padded_pages: usize,
    /// Number of blank slots added for padding
    pub blank_pages_added: usize,
    /// Physical sheets of paper
    pub sheets: usize,
    /// Printed sheet faces (output PDF pages)
    pub sheet_sides: usize,
}

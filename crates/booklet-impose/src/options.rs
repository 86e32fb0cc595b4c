use crate::constants::{DEFAULT_PREVIEW_MAX_DIMENSION, DEFAULT_PREVIEW_QUALITY, PREVIEW_DIR_NAME};
use crate::types::*;
use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the output sheet size is chosen
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SheetSizePolicy {
    /// Two of the largest source pages side by side
    DeriveFromSource,
    /// A fixed landscape sheet; every page is scaled to fit its half
    Fixed(PaperSize),
}

/// Which slots the per-request `rotate` flag turns upside down
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RotateRule {
    /// Turn the whole back face: both back slots rotate 180° and trade halves.
    /// Needed for printers that duplex on the short edge.
    BackSide,
    /// Rotate the left slot of every face in place
    LeftSlots,
    /// Rotate exactly one slot position of every sheet in place
    Slot(SlotPosition),
}

/// Engine configuration that is not part of a single request
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BookletOptions {
    pub sheet_size: SheetSizePolicy,
    pub rotate_rule: RotateRule,

    /// Turn landscape pages a quarter turn so they fill a portrait half
    pub auto_orient: bool,

    /// Keep sheet faces whose two slots are both blank
    pub padded: bool,

    // Preview gallery
    pub preview_max_dimension: u32,
    pub preview_quality: u8,
    pub preview_dir: PathBuf,
    /// Earlier request directories kept under `preview_dir`. Callers that
    /// run requests concurrently on one `preview_dir` need at least one per
    /// concurrent request.
    pub preview_retention: usize,

    /// Composition workers; `None` uses every available core
    pub workers: Option<usize>,
}

impl Default for BookletOptions {
    fn default() -> Self {
        Self {
            sheet_size: SheetSizePolicy::Fixed(PaperSize::A4),
            rotate_rule: RotateRule::BackSide,
            auto_orient: true,
            padded: true,
            preview_max_dimension: DEFAULT_PREVIEW_MAX_DIMENSION,
            preview_quality: DEFAULT_PREVIEW_QUALITY,
            preview_dir: std::env::temp_dir().join(PREVIEW_DIR_NAME),
            preview_retention: 0,
            workers: None,
        }
    }
}

impl BookletOptions {
    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options: Self = serde_json::from_slice(&bytes)
            .map_err(|e| BookletError::Config(format!("Failed to parse config: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| BookletError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if let SheetSizePolicy::Fixed(paper) = self.sheet_size {
            let (w, h) = paper.dimensions_mm();
            if !(w > 0.0 && h > 0.0) {
                return Err(BookletError::Config(format!(
                    "Paper dimensions must be positive, got {} x {} mm",
                    w, h
                )));
            }
        }

        if self.preview_max_dimension == 0 {
            return Err(BookletError::Config(
                "Preview size must be at least 1 pixel".to_string(),
            ));
        }

        if !(1..=100).contains(&self.preview_quality) {
            return Err(BookletError::Config(format!(
                "Preview quality must be between 1 and 100, got {}",
                self.preview_quality
            )));
        }

        if self.workers == Some(0) {
            return Err(BookletError::Config(
                "Worker count must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Number of sheet faces composed concurrently
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

//! Saddle-stitch page ordering
//!
//! A booklet of `P` pages (padded to a multiple of 4) is printed on `P/4`
//! sheets. Sheet `k` (0 = outermost) carries:
//!
//! ```text
//!            left        right
//! front   P - 2k       2k + 1
//! back    2k + 2       P - 2k - 1
//! ```
//!
//! e.g. for 8 pages:
//!
//! ```text
//! sheet 0   front [8, 1]   back [2, 7]
//! sheet 1   front [6, 3]   back [4, 5]
//! ```
//!
//! Padding is appended after the last real page, so blanks always land on
//! the outermost sheet and page 1 is always front-right of sheet 0.

use crate::constants::{FACES_PER_SHEET, PAGES_PER_SHEET};
use crate::types::*;

/// One printed face of one physical sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetSide {
    /// 0-based physical sheet, in stacking order
    pub sheet_index: usize,
    pub face: Face,
    pub left: Slot,
    pub right: Slot,
    /// 1-based position in printer order (front 0, back 0, front 1, ...)
    pub page_number: usize,
}

impl SheetSide {
    pub fn is_back_side(&self) -> bool {
        self.face == Face::Back
    }

    pub fn slot(&self, half: Half) -> Slot {
        match half {
            Half::Left => self.left,
            Half::Right => self.right,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.left.is_blank() && self.right.is_blank()
    }

    /// Sort key restoring printer order after out-of-order processing
    pub fn order_key(&self) -> (usize, Face) {
        (self.sheet_index, self.face)
    }
}

/// Sheet faces in printer order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpositionPlan {
    pub page_count: usize,
    pub padded_count: usize,
    pub sides: Vec<SheetSide>,
}

impl ImpositionPlan {
    pub fn sheet_count(&self) -> usize {
        self.padded_count / PAGES_PER_SHEET
    }

    pub fn blank_count(&self) -> usize {
        self.padded_count - self.page_count
    }

    /// Simulate nesting the sheets (sheet 0 outside), folding the stack and
    /// turning the pages of the resulting booklet one by one.
    ///
    /// Reading goes inward along the right-hand leaves (front-right, then
    /// back-left of each sheet) and back out along the left-hand leaves
    /// (back-right, then front-left), innermost sheet first.
    pub fn fold_and_read(&self) -> Vec<Slot> {
        let sheets = self.sheets();
        let mut pages = Vec::with_capacity(self.padded_count);

        for (front, back) in &sheets {
            pages.push(front.map_or(Slot::Blank, |s| s.right));
            pages.push(back.map_or(Slot::Blank, |s| s.left));
        }
        for (front, back) in sheets.iter().rev() {
            pages.push(back.map_or(Slot::Blank, |s| s.right));
            pages.push(front.map_or(Slot::Blank, |s| s.left));
        }

        pages
    }

    /// Check that the folded booklet reads `1..=page_count` followed only
    /// by blanks.
    pub fn verify(&self) -> Result<()> {
        let read = self.fold_and_read();
        if read.len() != self.padded_count {
            return Err(BookletError::Planning(format!(
                "folded booklet has {} pages, expected {}",
                read.len(),
                self.padded_count
            )));
        }

        for (idx, slot) in read.iter().enumerate() {
            let expected = Slot::for_page(idx + 1, self.page_count);
            if *slot != expected {
                return Err(BookletError::Planning(format!(
                    "reading position {} holds {:?}, expected {:?}",
                    idx + 1,
                    slot,
                    expected
                )));
            }
        }

        Ok(())
    }

    /// Group faces by physical sheet; a face omitted by trimming is `None`
    fn sheets(&self) -> Vec<(Option<&SheetSide>, Option<&SheetSide>)> {
        let mut sheets = vec![(None, None); self.sheet_count()];
        for side in &self.sides {
            if let Some(entry) = sheets.get_mut(side.sheet_index) {
                match side.face {
                    Face::Front => entry.0 = Some(side),
                    Face::Back => entry.1 = Some(side),
                }
            }
        }
        sheets
    }
}

/// Round a page count up to a whole number of sheets
pub fn padded_page_count(page_count: usize) -> usize {
    page_count.div_ceil(PAGES_PER_SHEET) * PAGES_PER_SHEET
}

/// Compute the printer-order sheet faces for `page_count` pages.
///
/// With `padded` every sheet keeps both faces; without it, a face whose two
/// slots are both blank is dropped.
pub fn plan(page_count: usize, padded: bool) -> Result<ImpositionPlan> {
    if page_count == 0 {
        return Err(BookletError::Planning(
            "cannot plan a booklet with no pages".to_string(),
        ));
    }

    let padded_count = padded_page_count(page_count);
    let sheets = padded_count / PAGES_PER_SHEET;
    let mut sides = Vec::with_capacity(sheets * FACES_PER_SHEET);

    for k in 0..sheets {
        let outer_high = padded_count - 2 * k;
        let inner_low = 2 * k + 1;

        let front = SheetSide {
            sheet_index: k,
            face: Face::Front,
            left: Slot::for_page(outer_high, page_count),
            right: Slot::for_page(inner_low, page_count),
            page_number: 0,
        };
        let back = SheetSide {
            sheet_index: k,
            face: Face::Back,
            left: Slot::for_page(inner_low + 1, page_count),
            right: Slot::for_page(outer_high - 1, page_count),
            page_number: 0,
        };

        for side in [front, back] {
            if padded || !side.is_blank() {
                sides.push(side);
            }
        }
    }

    for (idx, side) in sides.iter_mut().enumerate() {
        side.page_number = idx + 1;
    }

    Ok(ImpositionPlan {
        page_count,
        padded_count,
        sides,
    })
}

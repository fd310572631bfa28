//! Static paper profiles for the supported book formats.
//!
//! A profile maps a paper size to the character budget of one page. The
//! budgets are calibrated against typical typeset output (words-per-page
//! counts for each trim size at standard body type), not measured glyph by
//! glyph — capacity is an editorial budget, and the reflow engine treats it
//! as exact.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Paper size enum
// ────────────────────────────────────────────────────────────────────────────

/// The five supported trim sizes, matching the formats the composition
/// templates ship with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperSize {
    /// 4.25" × 6.87" mass-market paperback.
    Pocket,
    /// 5" × 8" standard novel.
    Novel,
    /// 6" × 9" trade paperback.
    Trade,
    /// 6.14" × 9.21" hardcover.
    Hardcover,
    /// 8.5" × 11" manuscript / workbook format.
    Manuscript,
}

// ────────────────────────────────────────────────────────────────────────────
// Paper profile
// ────────────────────────────────────────────────────────────────────────────

/// A named paper size with its per-page character budget.
///
/// `capacity` bounds the *effective* (markup-stripped) length of one page's
/// content; markup never counts against the budget.
#[derive(Debug, Clone, Serialize)]
pub struct PaperProfile {
    pub size: PaperSize,
    pub name: &'static str,
    /// Trim size label, e.g. `5" × 8"`.
    pub trim: &'static str,
    /// Maximum stripped characters on one page.
    pub capacity: usize,
}

static POCKET_PROFILE: PaperProfile = PaperProfile {
    size: PaperSize::Pocket,
    name: "Pocket",
    trim: "4.25\" × 6.87\"",
    capacity: 1_100,
};

static NOVEL_PROFILE: PaperProfile = PaperProfile {
    size: PaperSize::Novel,
    name: "Novel",
    trim: "5\" × 8\"",
    capacity: 1_500,
};

static TRADE_PROFILE: PaperProfile = PaperProfile {
    size: PaperSize::Trade,
    name: "Trade",
    trim: "6\" × 9\"",
    capacity: 2_100,
};

static HARDCOVER_PROFILE: PaperProfile = PaperProfile {
    size: PaperSize::Hardcover,
    name: "Hardcover",
    trim: "6.14\" × 9.21\"",
    capacity: 2_400,
};

static MANUSCRIPT_PROFILE: PaperProfile = PaperProfile {
    size: PaperSize::Manuscript,
    name: "Manuscript",
    trim: "8.5\" × 11\"",
    capacity: 3_600,
};

/// Returns the static profile for a given paper size.
pub fn get_profile(size: PaperSize) -> &'static PaperProfile {
    match size {
        PaperSize::Pocket => &POCKET_PROFILE,
        PaperSize::Novel => &NOVEL_PROFILE,
        PaperSize::Trade => &TRADE_PROFILE,
        PaperSize::Hardcover => &HARDCOVER_PROFILE,
        PaperSize::Manuscript => &MANUSCRIPT_PROFILE,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

//! Safe split-point search for over-capacity page content.
//!
//! A split point must never land inside a markup tag and never inside a
//! word. The search walks the effective characters (the same scanner the
//! capacity measurements use) and keeps the latest word start whose head
//! still fits the budget. Content with no word boundary in range — a single
//! run longer than the whole budget — falls back to a hard cut at exactly
//! `budget` effective characters, still outside any tag, so the reflow
//! cascade always terminates.

use crate::pagination::capacity::effective_chars;

/// How a split point was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitKind {
    /// Cut at the start of a word; the preceding whitespace stays in the head.
    WordBoundary,
    /// No word boundary fit — cut mid-word at exactly `budget` characters.
    HardCut,
}

/// A byte index into the content where the head/tail split happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPoint {
    pub index: usize,
    pub kind: SplitKind,
}

/// Finds the latest safe split point keeping `content[..index]` within
/// `budget` effective characters. Returns `None` when the whole content
/// already fits.
pub fn find_split(content: &str, budget: usize) -> Option<SplitPoint> {
    debug_assert!(budget > 0, "split budget must be positive");

    let mut consumed = 0usize; // effective chars before the current one
    let mut last_word_start: Option<usize> = None;
    let mut prev_was_whitespace = true;

    for e in effective_chars(content) {
        if consumed == budget {
            // `content[..e.start]` holds exactly `budget` effective chars.
            return Some(match last_word_start {
                Some(index) => SplitPoint {
                    index,
                    kind: SplitKind::WordBoundary,
                },
                None => SplitPoint {
                    index: e.start,
                    kind: SplitKind::HardCut,
                },
            });
        }
        if prev_was_whitespace && !e.ch.is_whitespace() && consumed > 0 {
            last_word_start = Some(e.start);
        }
        prev_was_whitespace = e.ch.is_whitespace();
        consumed += 1;
    }

    None
}

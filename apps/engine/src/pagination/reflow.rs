//! Reflow engine — restores the capacity invariant by moving overflow
//! forward across pages.
//!
//! # Architecture
//! - `reflow_from` is the iterative cascade run after a single page changed.
//!   Only the edited page may be over capacity on entry; pages before it are
//!   never touched, and content only ever moves forward. Termination is
//!   structural: each step leaves the current page within capacity and either
//!   advances to an existing next page or appends a brand-new tail page.
//! - `split_document` is the full split used on chapter open and on a
//!   paper-profile change (flatten, then re-split from page 1).
//!
//! The engine never merges underfull pages backward; shrinking the page
//! count happens only through explicit deletion.

use tracing::debug;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::models::page::Page;
use crate::models::paper::PaperProfile;
use crate::pagination::boundary::find_split;
use crate::pagination::capacity::{effective_length, seam_has_whitespace};

/// Splits a flattened chapter body into page-content chunks for `capacity`.
///
/// The chunks partition the body exactly: their concatenation is
/// character-identical to the input. An effectively empty body still yields
/// one (empty) chunk, since a chapter always has at least one page.
pub fn split_document(body: &str, capacity: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = body;
    while let Some(split) = find_split(rest, capacity) {
        chunks.push(rest[..split.index].to_string());
        rest = &rest[split.index..];
    }
    chunks.push(rest.to_string());
    chunks
}

/// Joins an overflow remainder onto the next page's existing content.
///
/// No separator is invented when the seam already carries whitespace (the
/// normal case: a word-boundary split leaves the head's trailing whitespace
/// behind, and the remainder ends where the old page ended). A bare seam
/// gets a single space so two words are never glued together.
fn join_overflow(overflow: &str, existing: &str) -> String {
    if existing.is_empty() {
        return overflow.to_string();
    }
    if seam_has_whitespace(overflow, existing) {
        format!("{overflow}{existing}")
    } else {
        format!("{overflow} {existing}")
    }
}

/// Runs the forward cascade starting at 1-based page `start`.
///
/// Precondition: every page except `start` is within capacity. Returns the
/// 1-based numbers of every page whose content changed, in ascending order.
pub fn reflow_from(
    pages: &mut Vec<Page>,
    start: u32,
    chapter_id: Uuid,
    profile: &PaperProfile,
    config: &EngineConfig,
) -> Vec<u32> {
    let mut changed = Vec::new();
    let mut idx = (start - 1) as usize;

    loop {
        let Some(split) = find_split(pages[idx].content(), profile.capacity) else {
            break; // current page fits — cascade over
        };

        let content = pages[idx].content();
        let head = content[..split.index].to_string();
        let tail = content[split.index..].to_string();
        pages[idx].set_content(head, profile, config);
        push_changed(&mut changed, pages[idx].number());

        if idx + 1 == pages.len() {
            let number = pages.len() as u32 + 1;
            debug!(page = number, "reflow appending overflow page");
            pages.push(Page::empty(chapter_id, number));
        }

        let merged = join_overflow(&tail, pages[idx + 1].content());
        pages[idx + 1].set_content(merged, profile, config);
        push_changed(&mut changed, pages[idx + 1].number());

        idx += 1;
    }

    changed
}

fn push_changed(changed: &mut Vec<u32>, number: u32) {
    if changed.last() != Some(&number) {
        changed.push(number);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

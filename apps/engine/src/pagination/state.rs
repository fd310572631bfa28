//! Pagination state — the ordered page collection for one open chapter and
//! every operation on it: navigation, editing (with reflow), deletion with
//! renumbering, paper-profile changes, and flattening for persistence.
//!
//! All mutations run on a single logical writer (the session serializes
//! them), so the methods here are plain `&mut self` with no locking. Each
//! completed operation re-establishes the structural invariants; a violation
//! detected afterwards is a programming defect and panics in debug builds
//! rather than corrupting later reflow runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::models::page::Page;
use crate::models::paper::{get_profile, PaperProfile, PaperSize};
use crate::pagination::capacity::{effective_length, seam_has_whitespace};
use crate::pagination::reflow::{reflow_from, split_document};

pub const MIN_ZOOM_PERCENT: u16 = 25;
pub const MAX_ZOOM_PERCENT: u16 = 400;
const DEFAULT_ZOOM_PERCENT: u16 = 100;

/// How the host renders the page list. Session-local, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// One page at a time.
    Single,
    /// Facing pages, like an open book.
    Spread,
}

/// In-session pagination state for one chapter.
#[derive(Debug)]
pub struct PaginationState {
    chapter_id: Uuid,
    pages: Vec<Page>,
    current_page: u32,
    paper_size: PaperSize,
    view_mode: ViewMode,
    zoom_percent: u16,
    is_dirty: bool,
    last_saved_at: Option<DateTime<Utc>>,
    /// Monotonic content revision. A save captures the revision it flattened;
    /// completion only clears the dirty flag if no edit landed in between.
    revision: u64,
}

impl PaginationState {
    /// Opens a chapter: splits the persisted flattened body into pages
    /// against the active profile. The freshly split state matches the
    /// persisted snapshot, so it starts clean.
    pub fn open(
        chapter_id: Uuid,
        body: &str,
        paper_size: PaperSize,
        config: &EngineConfig,
    ) -> Self {
        let profile = get_profile(paper_size);
        let pages = Self::pages_from_body(chapter_id, body, profile, config);
        info!(
            %chapter_id,
            pages = pages.len(),
            paper = profile.name,
            "opened chapter"
        );
        let state = Self {
            chapter_id,
            pages,
            current_page: 1,
            paper_size,
            view_mode: ViewMode::Single,
            zoom_percent: DEFAULT_ZOOM_PERCENT,
            is_dirty: false,
            last_saved_at: None,
            revision: 0,
        };
        state.assert_invariants();
        state
    }

    fn pages_from_body(
        chapter_id: Uuid,
        body: &str,
        profile: &PaperProfile,
        config: &EngineConfig,
    ) -> Vec<Page> {
        split_document(body, profile.capacity)
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                Page::with_content(chapter_id, i as u32 + 1, chunk, profile, config)
            })
            .collect()
    }

    // ── read access ─────────────────────────────────────────────────────────

    pub fn chapter_id(&self) -> Uuid {
        self.chapter_id
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn total_pages(&self) -> u32 {
        self.pages.len() as u32
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page(&self, number: u32) -> Option<&Page> {
        self.pages.get(number.checked_sub(1)? as usize)
    }

    pub fn paper_size(&self) -> PaperSize {
        self.paper_size
    }

    pub fn profile(&self) -> &'static PaperProfile {
        get_profile(self.paper_size)
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn zoom_percent(&self) -> u16 {
        self.zoom_percent
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ── navigation ──────────────────────────────────────────────────────────

    /// Selects page `n`. Navigating one step past the last page appends a
    /// new empty page and selects it; anything further is rejected.
    pub fn navigate_to(&mut self, n: u32, config: &EngineConfig) -> Result<(), EngineError> {
        let total = self.total_pages();
        if n == 0 || n > total + 1 {
            return Err(EngineError::Validation(format!(
                "cannot navigate to page {n}: chapter has {total} pages"
            )));
        }
        if n == total + 1 {
            // An empty page adds nothing to the flattened body, so this does
            // not dirty the document.
            self.pages.push(Page::empty(self.chapter_id, n));
            info!(page = n, "appended page on navigation past the end");
        }
        self.current_page = n;
        self.assert_invariants();
        Ok(())
    }

    // ── editing ─────────────────────────────────────────────────────────────

    /// Replaces page `n`'s content with the surface's markup string and runs
    /// the reflow cascade. Returns the numbers of all pages whose content
    /// changed (ascending; empty if the content was byte-identical).
    pub fn edit_page(
        &mut self,
        n: u32,
        content: String,
        config: &EngineConfig,
    ) -> Result<Vec<u32>, EngineError> {
        let total = self.total_pages();
        let idx = self.page_index(n)?;
        if self.pages[idx].content() == content {
            return Ok(Vec::new());
        }

        let profile = self.profile();
        self.pages[idx].set_content(content, profile, config);
        let mut changed = reflow_from(&mut self.pages, n, self.chapter_id, profile, config);
        if changed.is_empty() {
            changed.push(n);
        }
        if self.total_pages() > total {
            info!(
                from = total,
                to = self.total_pages(),
                "edit overflow extended the chapter"
            );
        }
        self.mark_dirty();
        self.assert_invariants();
        Ok(changed)
    }

    // ── deletion ────────────────────────────────────────────────────────────

    /// Deletes page `n`, renumbering every subsequent page down by one. The
    /// sole remaining page can never be deleted.
    pub fn delete_page(&mut self, n: u32, config: &EngineConfig) -> Result<(), EngineError> {
        if self.total_pages() == 1 {
            return Err(EngineError::Validation(
                "cannot delete the only page of a chapter".to_string(),
            ));
        }
        let idx = self.page_index(n)?;
        let removed = self.pages.remove(idx);
        for page in &mut self.pages[idx..] {
            page.set_number(page.number() - 1);
        }
        // A pointer past the removed page follows its page down one number; a
        // pointer on it stays put and now shows the successor, clamped when
        // the removed page was the last.
        if self.current_page > n {
            self.current_page -= 1;
        }
        self.current_page = self.current_page.min(self.total_pages());

        // Deleting a page that rendered no text leaves the flattened body
        // unchanged.
        if !removed.is_effectively_empty() {
            self.mark_dirty();
        }
        info!(
            page = n,
            remaining = self.total_pages(),
            "deleted page"
        );
        self.assert_invariants();
        Ok(())
    }

    // ── view settings ───────────────────────────────────────────────────────

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub fn set_zoom(&mut self, percent: u16) -> Result<(), EngineError> {
        if !(MIN_ZOOM_PERCENT..=MAX_ZOOM_PERCENT).contains(&percent) {
            return Err(EngineError::Validation(format!(
                "zoom {percent}% is outside {MIN_ZOOM_PERCENT}–{MAX_ZOOM_PERCENT}%"
            )));
        }
        self.zoom_percent = percent;
        Ok(())
    }

    /// Switches the paper profile: flattens the whole chapter and re-splits
    /// it from page 1 against the new capacity, exactly as on open. The
    /// persisted body is unchanged, so this does not dirty the document.
    pub fn set_paper_size(&mut self, size: PaperSize, config: &EngineConfig) {
        if size == self.paper_size {
            return;
        }
        let body = self.flatten();
        self.paper_size = size;
        let profile = get_profile(size);
        self.pages = Self::pages_from_body(self.chapter_id, &body, profile, config);
        self.current_page = self.current_page.min(self.total_pages());
        info!(
            paper = profile.name,
            pages = self.total_pages(),
            "re-split chapter for new paper profile"
        );
        self.assert_invariants();
    }

    // ── persistence support ─────────────────────────────────────────────────

    /// Flattens the chapter into the single persisted document body: pages in
    /// order, effectively empty pages skipped, a blank-line separator
    /// inserted only where the seam carries no whitespace of its own (so a
    /// capacity split re-joins without mutating the text).
    pub fn flatten(&self) -> String {
        let mut body = String::new();
        for page in self.pages.iter().filter(|p| !p.is_effectively_empty()) {
            if !body.is_empty() && !seam_has_whitespace(&body, page.content()) {
                body.push_str("\n\n");
            }
            body.push_str(page.content());
        }
        body
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.is_dirty = true;
        self.revision += 1;
    }

    /// Records a successful write of the body captured at `revision`. The
    /// dirty flag clears only if no edit landed while the write was in
    /// flight; `last_saved_at` always advances.
    pub(crate) fn mark_saved(&mut self, revision: u64, at: DateTime<Utc>) {
        if self.revision == revision {
            self.is_dirty = false;
        }
        self.last_saved_at = Some(at);
    }

    fn page_index(&self, n: u32) -> Result<usize, EngineError> {
        if n == 0 || n > self.total_pages() {
            return Err(EngineError::Validation(format!(
                "page {n} does not exist (chapter has {} pages)",
                self.total_pages()
            )));
        }
        Ok((n - 1) as usize)
    }

    // ── invariants ──────────────────────────────────────────────────────────

    /// Debug sweep of the structural invariants. A failure here means an
    /// operation completed while leaving the state corrupt, which would
    /// poison every later reflow — panic instead of tolerating it.
    pub(crate) fn assert_invariants(&self) {
        if !cfg!(debug_assertions) {
            return;
        }
        assert!(!self.pages.is_empty(), "a chapter must keep at least one page");
        for (i, page) in self.pages.iter().enumerate() {
            assert_eq!(
                page.number(),
                i as u32 + 1,
                "page numbering must be contiguous 1..N"
            );
        }
        assert!(
            self.current_page >= 1 && self.current_page <= self.total_pages(),
            "current page {} outside 1..={}",
            self.current_page,
            self.total_pages()
        );
        let capacity = self.profile().capacity;
        for page in &self.pages {
            let length = effective_length(page.content());
            assert!(
                length <= capacity,
                "page {} over capacity: {length} > {capacity}",
                page.number()
            );
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

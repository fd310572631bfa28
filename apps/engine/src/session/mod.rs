//! Editor session — the single owned entry point for one open chapter.
//!
//! # Architecture
//! - All state mutations are serialized through one `Arc<Mutex<SessionCore>>`
//!   (single logical writer): an edit and the reflow it triggers complete
//!   inside the same critical section, so the next edit's overflow check
//!   never sees stale content.
//! - Generation is the one concurrent actor. `generate` holds no lock across
//!   the provider round trip; it takes a ticket first and merges the result
//!   only if the ticket is still current, so cancellation or supersession
//!   leaves the target page byte-identical.
//! - The autosave debounce task is armed (cancel-and-reschedule) on every
//!   dirty mark and drained on `close`.
//!
//! The session is `Clone` — cheap handles over shared `Arc`s, one instance
//! per open chapter, owned and passed by the caller (no globals).

pub mod keys;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::generation::provider::{GenerationMode, GenerationProvider};
use crate::generation::{build_request, check_precondition, merge_generated, GenerationTicket};
use crate::models::page::PageStatus;
use crate::models::paper::{PaperProfile, PaperSize};
use crate::pagination::state::{PaginationState, ViewMode};
use crate::session::keys::KeyCommand;
use crate::store::ChapterStore;
use crate::sync::{self, SaveTarget};

// ────────────────────────────────────────────────────────────────────────────
// Core and outcome types
// ────────────────────────────────────────────────────────────────────────────

/// Everything behind the session lock: the pagination state plus the
/// in-flight generation ticket and the armed autosave handle.
pub(crate) struct SessionCore {
    pub(crate) state: PaginationState,
    pub(crate) generation: Option<GenerationTicket>,
    pub(crate) autosave_task: Option<JoinHandle<()>>,
}

impl SessionCore {
    pub(crate) fn new(state: PaginationState) -> Self {
        Self {
            state,
            generation: None,
            autosave_task: None,
        }
    }
}

/// One page as exposed to the host for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub number: u32,
    pub content: String,
    pub word_count: usize,
    pub status: PageStatus,
}

/// Full read snapshot of the session, serializable for the host.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub chapter_id: Uuid,
    pub pages: Vec<PageView>,
    pub current_page: u32,
    pub total_pages: u32,
    pub paper: PaperProfile,
    pub view_mode: ViewMode,
    pub zoom_percent: u16,
    pub is_dirty: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
    /// Page currently locked by an in-flight generation, if any.
    pub generating_page: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditOutcome {
    pub changed_pages: Vec<u32>,
    pub total_pages: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub page_number: u32,
    pub mode: GenerationMode,
    pub changed_pages: Vec<u32>,
    pub total_pages: u32,
}

// ────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct EditorSession {
    chapter_id: Uuid,
    chapter_title: String,
    config: EngineConfig,
    core: Arc<Mutex<SessionCore>>,
    store: Arc<dyn ChapterStore>,
    provider: Arc<dyn GenerationProvider>,
}

impl EditorSession {
    /// Opens a chapter: loads the persisted body (empty if the chapter has
    /// none yet) and splits it into pages against the given paper profile.
    pub async fn open(
        chapter_id: Uuid,
        chapter_title: impl Into<String>,
        paper_size: PaperSize,
        store: Arc<dyn ChapterStore>,
        provider: Arc<dyn GenerationProvider>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let body = store
            .load_body(chapter_id)
            .await
            .map_err(EngineError::Persistence)?
            .unwrap_or_default();
        let state = PaginationState::open(chapter_id, &body, paper_size, &config);
        Ok(Self {
            chapter_id,
            chapter_title: chapter_title.into(),
            config,
            core: Arc::new(Mutex::new(SessionCore::new(state))),
            store,
            provider,
        })
    }

    pub fn chapter_id(&self) -> Uuid {
        self.chapter_id
    }

    /// Full read snapshot for the host. The host applies page content to the
    /// editing surface only while the surface is unfocused, so in-flight
    /// keystrokes are never clobbered.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let core = self.core.lock().await;
        let state = &core.state;
        SessionSnapshot {
            chapter_id: self.chapter_id,
            pages: state
                .pages()
                .iter()
                .map(|p| PageView {
                    number: p.number(),
                    content: p.content().to_string(),
                    word_count: p.word_count(),
                    status: p.status(),
                })
                .collect(),
            current_page: state.current_page(),
            total_pages: state.total_pages(),
            paper: state.profile().clone(),
            view_mode: state.view_mode(),
            zoom_percent: state.zoom_percent(),
            is_dirty: state.is_dirty(),
            last_saved_at: state.last_saved_at(),
            generating_page: core.generation.as_ref().map(|t| t.page_number),
        }
    }

    // ── navigation ──────────────────────────────────────────────────────────

    pub async fn navigate_to(&self, n: u32) -> Result<u32, EngineError> {
        let mut core = self.core.lock().await;
        core.state.navigate_to(n, &self.config)?;
        Ok(core.state.current_page())
    }

    /// Next page; one step past the end appends a fresh page.
    pub async fn next_page(&self) -> Result<u32, EngineError> {
        let mut core = self.core.lock().await;
        let n = core.state.current_page() + 1;
        core.state.navigate_to(n, &self.config)?;
        Ok(n)
    }

    /// Previous page; a no-op on page 1.
    pub async fn previous_page(&self) -> Result<u32, EngineError> {
        let mut core = self.core.lock().await;
        let n = core.state.current_page().saturating_sub(1).max(1);
        core.state.navigate_to(n, &self.config)?;
        Ok(n)
    }

    // ── editing ─────────────────────────────────────────────────────────────

    /// Applies the surface's markup for page `n` and reflows. Rejected for
    /// the page an in-flight generation is targeting.
    pub async fn edit_page(&self, n: u32, content: String) -> Result<EditOutcome, EngineError> {
        let mut core = self.core.lock().await;
        if let Some(ticket) = &core.generation {
            if ticket.page_number == n {
                return Err(EngineError::Validation(format!(
                    "page {n} is locked by an in-flight generation"
                )));
            }
        }
        let changed = core.state.edit_page(n, content, &self.config)?;
        if !changed.is_empty() {
            self.arm_autosave(&mut core);
        }
        Ok(EditOutcome {
            changed_pages: changed,
            total_pages: core.state.total_pages(),
        })
    }

    pub async fn delete_page(&self, n: u32) -> Result<(), EngineError> {
        let mut core = self.core.lock().await;
        if core.generation.is_some() {
            return Err(EngineError::Validation(
                "cannot delete pages while a generation is in flight".to_string(),
            ));
        }
        let revision = core.state.revision();
        core.state.delete_page(n, &self.config)?;
        if core.state.revision() != revision {
            self.arm_autosave(&mut core);
        }
        Ok(())
    }

    // ── view settings ───────────────────────────────────────────────────────

    pub async fn set_view_mode(&self, mode: ViewMode) {
        self.core.lock().await.state.set_view_mode(mode);
    }

    pub async fn set_zoom(&self, percent: u16) -> Result<(), EngineError> {
        self.core.lock().await.state.set_zoom(percent)
    }

    /// Switches paper profile and re-splits the whole chapter. Rejected while
    /// a generation is in flight (the re-split would move its target).
    pub async fn set_paper_size(&self, size: PaperSize) -> Result<(), EngineError> {
        let mut core = self.core.lock().await;
        if core.generation.is_some() {
            return Err(EngineError::Validation(
                "cannot change paper size while a generation is in flight".to_string(),
            ));
        }
        core.state.set_paper_size(size, &self.config);
        Ok(())
    }

    // ── generation ──────────────────────────────────────────────────────────

    /// Generates into the current page with the given mode. The provider
    /// round trip runs without holding the session lock; navigation, edits
    /// to other pages, and the autosave timer continue meanwhile.
    pub async fn generate(
        &self,
        mode: GenerationMode,
        instructions: Option<String>,
    ) -> Result<GenerationOutcome, EngineError> {
        // Phase 1: validate, take the ticket, assemble the request.
        let (ticket, request) = {
            let mut core = self.core.lock().await;
            if let Some(inflight) = &core.generation {
                return Err(EngineError::Validation(format!(
                    "a generation is already in flight on page {}",
                    inflight.page_number
                )));
            }
            let page_number = core.state.current_page();
            let content = core
                .state
                .page(page_number)
                .map(|p| p.content())
                .unwrap_or_default();
            check_precondition(mode, content)?;

            let ticket = GenerationTicket::new(page_number);
            core.generation = Some(ticket);
            let request = build_request(
                &core.state,
                &self.chapter_title,
                mode,
                page_number,
                instructions,
                &self.config,
            );
            (ticket, request)
        };

        info!(
            chapter = %self.chapter_id,
            page = ticket.page_number,
            ?mode,
            "generation started"
        );

        // Phase 2: the provider round trip, lock-free.
        let produced = self.provider.generate(&request).await;

        // Phase 3: merge under the lock, but only if the ticket survived.
        let mut core = self.core.lock().await;
        let still_current = core.generation.map(|t| t.id) == Some(ticket.id);
        if !still_current {
            info!(
                chapter = %self.chapter_id,
                page = ticket.page_number,
                "generation cancelled; discarding result"
            );
            return Err(EngineError::Generation(
                "generation was cancelled".to_string(),
            ));
        }
        core.generation = None;

        let produced = match produced {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    chapter = %self.chapter_id,
                    page = ticket.page_number,
                    error = %e,
                    "generation failed; page left untouched"
                );
                return Err(e);
            }
        };

        let current = core
            .state
            .page(ticket.page_number)
            .map(|p| p.content().to_string())
            .unwrap_or_default();
        let merged = merge_generated(mode, &current, &produced);
        // Same content-setting path as a manual edit: reflow applies
        // uniformly, so a long response cascades into new pages.
        let changed = core
            .state
            .edit_page(ticket.page_number, merged, &self.config)?;
        if !changed.is_empty() {
            self.arm_autosave(&mut core);
        }
        info!(
            chapter = %self.chapter_id,
            page = ticket.page_number,
            changed = changed.len(),
            total = core.state.total_pages(),
            "generation merged"
        );
        Ok(GenerationOutcome {
            page_number: ticket.page_number,
            mode,
            changed_pages: changed,
            total_pages: core.state.total_pages(),
        })
    }

    /// Cancels the in-flight generation, if any. The awaiting `generate`
    /// call observes the retired ticket and discards the provider's result,
    /// leaving the page byte-identical. Returns whether one was cancelled.
    pub async fn cancel_generation(&self) -> bool {
        let mut core = self.core.lock().await;
        match core.generation.take() {
            Some(ticket) => {
                info!(
                    chapter = %self.chapter_id,
                    page = ticket.page_number,
                    "generation cancel requested"
                );
                true
            }
            None => false,
        }
    }

    // ── persistence ─────────────────────────────────────────────────────────

    /// Immediate save, bypassing the debounce window. A clean session is a
    /// no-op; a failed write keeps the dirty flag for the next retry.
    pub async fn save_now(&self) -> Result<(), EngineError> {
        {
            let mut core = self.core.lock().await;
            if let Some(task) = core.autosave_task.take() {
                task.abort();
            }
        }
        sync::flush(&self.save_target()).await
    }

    /// Tears the session down: aborts the pending autosave and performs a
    /// final flush so no edit is silently lost.
    pub async fn close(self) -> Result<(), EngineError> {
        {
            let mut core = self.core.lock().await;
            if let Some(task) = core.autosave_task.take() {
                task.abort();
            }
        }
        let result = sync::flush(&self.save_target()).await;
        info!(chapter = %self.chapter_id, "session closed");
        result
    }

    // ── keyboard contract ───────────────────────────────────────────────────

    /// Dispatches a resolved key command. `Generate` picks its mode from the
    /// current page: `new` on an empty page, `continue` otherwise.
    pub async fn handle_key(&self, command: KeyCommand) -> Result<(), EngineError> {
        match command {
            KeyCommand::Save => self.save_now().await,
            KeyCommand::PreviousPage => self.previous_page().await.map(|_| ()),
            KeyCommand::NextPage => self.next_page().await.map(|_| ()),
            KeyCommand::Generate => {
                let mode = {
                    let core = self.core.lock().await;
                    let empty = core
                        .state
                        .page(core.state.current_page())
                        .map(|p| p.is_effectively_empty())
                        .unwrap_or(true);
                    if empty {
                        GenerationMode::New
                    } else {
                        GenerationMode::Continue
                    }
                };
                self.generate(mode, None).await.map(|_| ())
            }
        }
    }

    // ── internals ───────────────────────────────────────────────────────────

    fn save_target(&self) -> SaveTarget {
        SaveTarget {
            chapter_id: self.chapter_id,
            window: self.config.autosave_idle,
            core: self.core.clone(),
            store: self.store.clone(),
        }
    }

    /// Cancel-and-reschedule: every dirty mark resets the idle window.
    fn arm_autosave(&self, core: &mut SessionCore) {
        if let Some(task) = core.autosave_task.take() {
            task.abort();
        }
        core.autosave_task = Some(sync::spawn_autosave(self.save_target()));
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::paper::get_profile;
    use crate::pagination::capacity::effective_length;
    use crate::store::InMemoryChapterStore;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Provider that returns a fixed string immediately.
    struct FixedProvider(String);

    #[async_trait]
    impl GenerationProvider for FixedProvider {
        async fn generate(
            &self,
            _request: &crate::generation::GenerationRequest,
        ) -> Result<String, EngineError> {
            Ok(self.0.clone())
        }
    }

    /// Provider that waits (paused-clock) before answering, so tests can
    /// interleave commands with an in-flight generation.
    struct SlowProvider {
        text: String,
        delay: Duration,
    }

    #[async_trait]
    impl GenerationProvider for SlowProvider {
        async fn generate(
            &self,
            _request: &crate::generation::GenerationRequest,
        ) -> Result<String, EngineError> {
            tokio::time::sleep(self.delay).await;
            Ok(self.text.clone())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl GenerationProvider for FailingProvider {
        async fn generate(
            &self,
            _request: &crate::generation::GenerationRequest,
        ) -> Result<String, EngineError> {
            Err(EngineError::Generation("provider unavailable".to_string()))
        }
    }

    async fn make_session(
        body: &str,
        provider: Arc<dyn GenerationProvider>,
    ) -> (EditorSession, Arc<InMemoryChapterStore>, Uuid) {
        let chapter_id = Uuid::new_v4();
        let store = Arc::new(InMemoryChapterStore::with_body(chapter_id, body));
        let session = EditorSession::open(
            chapter_id,
            "Test Chapter",
            PaperSize::Novel,
            store.clone(),
            provider,
            EngineConfig::default(),
        )
        .await
        .unwrap();
        (session, store, chapter_id)
    }

    fn capacity() -> usize {
        get_profile(PaperSize::Novel).capacity
    }

    async fn page_content(session: &EditorSession, n: u32) -> String {
        session.snapshot().await.pages[(n - 1) as usize].content.clone()
    }

    /// Yields until the in-flight generation has taken its ticket.
    async fn wait_for_generation_start(session: &EditorSession) {
        for _ in 0..100 {
            if session.snapshot().await.generating_page.is_some() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("generation never started");
    }

    // ── open ────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_open_splits_persisted_body() {
        let body = "word ".repeat(700); // 3500 chars → 3 pages at Novel
        let (session, _, _) = make_session(&body, Arc::new(FailingProvider)).await;
        let snapshot = session.snapshot().await;
        assert!(snapshot.total_pages >= 3);
        assert!(!snapshot.is_dirty);
        assert_eq!(snapshot.current_page, 1);
    }

    #[tokio::test]
    async fn test_open_missing_chapter_starts_empty() {
        let store = Arc::new(InMemoryChapterStore::new());
        let session = EditorSession::open(
            Uuid::new_v4(),
            "Fresh",
            PaperSize::Novel,
            store,
            Arc::new(FailingProvider),
            EngineConfig::default(),
        )
        .await
        .unwrap();
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.total_pages, 1);
        assert_eq!(snapshot.pages[0].status, PageStatus::Empty);
    }

    // ── editing through the session ─────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_edit_cascades_and_reports_changed_pages() {
        let (session, _, _) = make_session("", Arc::new(FailingProvider)).await;
        let outcome = session
            .edit_page(1, "a".repeat(capacity() + 9))
            .await
            .unwrap();
        assert_eq!(outcome.changed_pages, vec![1, 2]);
        assert_eq!(outcome.total_pages, 2);
        assert!(session.snapshot().await.is_dirty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_coalesces_rapid_edits_into_one_write() {
        let (session, store, chapter_id) = make_session("", Arc::new(FailingProvider)).await;

        for content in ["draft one", "draft one two", "draft one two three"] {
            session.edit_page(1, content.to_string()).await.unwrap();
            tokio::time::advance(Duration::from_millis(500)).await;
        }
        assert_eq!(store.write_count(), 0, "window must reset on every mark");

        tokio::time::sleep(Duration::from_millis(2_500)).await;

        assert_eq!(store.write_count(), 1, "one coalesced flush");
        assert_eq!(store.body_of(chapter_id).unwrap(), "draft one two three");
        assert!(!session.snapshot().await.is_dirty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_now_bypasses_debounce() {
        let (session, store, chapter_id) = make_session("", Arc::new(FailingProvider)).await;
        session.edit_page(1, "immediate".to_string()).await.unwrap();

        session.save_now().await.unwrap();

        assert_eq!(store.write_count(), 1);
        assert_eq!(store.body_of(chapter_id).unwrap(), "immediate");
        let snapshot = session.snapshot().await;
        assert!(!snapshot.is_dirty);
        assert!(snapshot.last_saved_at.is_some());

        // Clean save is a no-op.
        session.save_now().await.unwrap();
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_write_keeps_dirty_then_retries() {
        let (session, store, _) = make_session("", Arc::new(FailingProvider)).await;
        session.edit_page(1, "precious words".to_string()).await.unwrap();
        store.set_failing(true);

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(store.write_count(), 0);
        assert!(session.snapshot().await.is_dirty, "edits are never discarded locally");

        store.set_failing(false);
        session.save_now().await.unwrap();
        assert_eq!(store.write_count(), 1);
        assert!(!session.snapshot().await.is_dirty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_drains_pending_autosave() {
        let (session, store, chapter_id) = make_session("", Arc::new(FailingProvider)).await;
        session.edit_page(1, "about to close".to_string()).await.unwrap();
        assert_eq!(store.write_count(), 0);

        session.close().await.unwrap();

        assert_eq!(store.write_count(), 1);
        assert_eq!(store.body_of(chapter_id).unwrap(), "about to close");
    }

    // ── generation ──────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_scenario_b_long_generation_cascades_to_three_pages() {
        let c = capacity();
        let provider = Arc::new(FixedProvider("b".repeat(3 * c)));
        let (session, _, _) = make_session("", provider).await;

        let outcome = session.generate(GenerationMode::New, None).await.unwrap();

        assert_eq!(outcome.total_pages, 3);
        assert_eq!(outcome.changed_pages, vec![1, 2, 3]);
        let snapshot = session.snapshot().await;
        assert_eq!(effective_length(&snapshot.pages[0].content), c);
        assert_eq!(effective_length(&snapshot.pages[1].content), c);
        assert_eq!(effective_length(&snapshot.pages[2].content), c);
        assert!(snapshot.is_dirty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_continue_appends_after_existing() {
        let provider = Arc::new(FixedProvider("<p>and then it rained.</p>".to_string()));
        let (session, _, _) = make_session("<p>It was dusk.</p>", provider).await;

        session.generate(GenerationMode::Continue, None).await.unwrap();

        assert_eq!(
            page_content(&session, 1).await,
            "<p>It was dusk.</p>\n\n<p>and then it rained.</p>"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_on_nonempty_page_rejected_without_change() {
        let provider = Arc::new(FixedProvider("replacement".to_string()));
        let (session, _, _) = make_session("existing prose", provider).await;

        let err = session.generate(GenerationMode::New, None).await.unwrap_err();

        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(page_content(&session, 1).await, "existing prose");
        assert!(!session.snapshot().await.is_dirty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rewrite_on_empty_page_rejected_without_change() {
        let provider = Arc::new(FixedProvider("anything".to_string()));
        let (session, _, _) = make_session("", provider).await;

        let err = session
            .generate(GenerationMode::Rewrite, None)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(page_content(&session, 1).await, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_failure_leaves_page_untouched_and_clean() {
        let (session, _, _) = make_session("safe text", Arc::new(FailingProvider)).await;

        let err = session
            .generate(GenerationMode::Rewrite, None)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Generation(_)));
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.pages[0].content, "safe text");
        assert!(!snapshot.is_dirty, "a failed generation does not dirty the document");
        assert!(snapshot.generating_page.is_none(), "ticket must be retired");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_leaves_page_byte_identical() {
        let provider = Arc::new(SlowProvider {
            text: "<p>late arrival</p>".to_string(),
            delay: Duration::from_secs(60),
        });
        let (session, _, _) = make_session("untouchable draft", provider).await;

        let task = tokio::spawn({
            let session = session.clone();
            async move { session.generate(GenerationMode::Continue, None).await }
        });
        wait_for_generation_start(&session).await;

        assert!(session.cancel_generation().await);
        let result = task.await.unwrap();

        assert!(matches!(result, Err(EngineError::Generation(_))));
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.pages[0].content, "untouchable draft");
        assert!(!snapshot.is_dirty);
        assert!(snapshot.generating_page.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_with_nothing_in_flight_is_false() {
        let (session, _, _) = make_session("", Arc::new(FailingProvider)).await;
        assert!(!session.cancel_generation().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_target_page_locked_while_generating() {
        let provider = Arc::new(SlowProvider {
            text: "text".to_string(),
            delay: Duration::from_secs(60),
        });
        let body = format!("{}tail", "a".repeat(capacity())); // 2 pages
        let (session, _, _) = make_session(&body, provider).await;

        let task = tokio::spawn({
            let session = session.clone();
            async move { session.generate(GenerationMode::Continue, None).await }
        });
        wait_for_generation_start(&session).await;

        // The target page rejects edits; other pages and navigation work.
        let err = session.edit_page(1, "blocked".to_string()).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        session.edit_page(2, "other pages stay editable".to_string()).await.unwrap();
        session.navigate_to(2).await.unwrap();
        let err = session.delete_page(2).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        session.cancel_generation().await;
        let _ = task.await.unwrap();
        session.edit_page(1, "unlocked again".to_string()).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_generation_while_in_flight_rejected() {
        let provider = Arc::new(SlowProvider {
            text: "text".to_string(),
            delay: Duration::from_secs(60),
        });
        let (session, _, _) = make_session("", provider).await;

        let task = tokio::spawn({
            let session = session.clone();
            async move { session.generate(GenerationMode::New, None).await }
        });
        wait_for_generation_start(&session).await;

        let err = session.generate(GenerationMode::New, None).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        session.cancel_generation().await;
        let _ = task.await.unwrap();
    }

    // ── navigation and keyboard contract ────────────────────────────────────

    #[tokio::test]
    async fn test_next_page_past_end_appends() {
        let (session, _, _) = make_session("one page", Arc::new(FailingProvider)).await;
        assert_eq!(session.next_page().await.unwrap(), 2);
        assert_eq!(session.snapshot().await.total_pages, 2);
    }

    #[tokio::test]
    async fn test_previous_page_clamps_at_one() {
        let (session, _, _) = make_session("one page", Arc::new(FailingProvider)).await;
        assert_eq!(session.previous_page().await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_key_save_and_navigation() {
        let (session, store, _) = make_session("", Arc::new(FailingProvider)).await;
        session.edit_page(1, "keyboard save".to_string()).await.unwrap();

        session.handle_key(KeyCommand::Save).await.unwrap();
        assert_eq!(store.write_count(), 1);

        session.handle_key(KeyCommand::NextPage).await.unwrap();
        assert_eq!(session.snapshot().await.current_page, 2);
        session.handle_key(KeyCommand::PreviousPage).await.unwrap();
        assert_eq!(session.snapshot().await.current_page, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_key_generate_picks_mode_from_page() {
        // Empty page → `new`.
        let provider = Arc::new(FixedProvider("<p>opening line</p>".to_string()));
        let (session, _, _) = make_session("", provider).await;
        session.handle_key(KeyCommand::Generate).await.unwrap();
        assert_eq!(page_content(&session, 1).await, "<p>opening line</p>");

        // Non-empty page → `continue`.
        session.handle_key(KeyCommand::Generate).await.unwrap();
        assert_eq!(
            page_content(&session, 1).await,
            "<p>opening line</p>\n\n<p>opening line</p>"
        );
    }

    // ── view settings ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_zoom_and_view_mode() {
        let (session, _, _) = make_session("", Arc::new(FailingProvider)).await;
        session.set_zoom(150).await.unwrap();
        session.set_view_mode(ViewMode::Spread).await;
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.zoom_percent, 150);
        assert_eq!(snapshot.view_mode, ViewMode::Spread);
        assert!(session.set_zoom(1_000).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_paper_size_change_resplits_without_dirtying() {
        let body = "word ".repeat(800);
        let (session, _, _) = make_session(&body, Arc::new(FailingProvider)).await;
        let before = session.snapshot().await.total_pages;

        session.set_paper_size(PaperSize::Pocket).await.unwrap();

        let snapshot = session.snapshot().await;
        assert!(snapshot.total_pages > before);
        assert!(!snapshot.is_dirty);
        assert_eq!(snapshot.paper.size, PaperSize::Pocket);
    }
}

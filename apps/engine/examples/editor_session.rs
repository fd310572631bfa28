//! End-to-end demo: open a chapter, type past a page boundary, generate a
//! page of text, and watch the autosave land in the store.
//!
//! Runs entirely offline — an in-memory store and a canned provider stand in
//! for Postgres and the model API.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use folio_engine::{
    ChapterStore, EditorSession, EngineConfig, EngineError, GenerationMode, GenerationProvider,
    GenerationRequest, InMemoryChapterStore, PaperSize,
};

/// Stand-in provider that "writes" a page of filler prose.
struct CannedProvider;

#[async_trait]
impl GenerationProvider for CannedProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, EngineError> {
        info!(
            page = request.page_number,
            mode = ?request.mode,
            budget = request.word_budget,
            "provider asked for text"
        );
        Ok("<p>The tide carried the rowboat past the breakwater, and for a while \
            nobody on the shore said anything at all.</p>"
            .repeat(12))
    }
}

#[tokio::main]
async fn main() -> Result<(), EngineError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let chapter_id = uuid::Uuid::new_v4();
    let store = Arc::new(InMemoryChapterStore::new());
    store
        .replace_body(chapter_id, "<p>It began, as these things do, with a letter.</p>")
        .await
        .map_err(EngineError::Persistence)?;

    let session = EditorSession::open(
        chapter_id,
        "Chapter One — The Letter",
        PaperSize::Novel,
        store.clone(),
        Arc::new(CannedProvider),
        EngineConfig::default(),
    )
    .await?;

    // Type enough to overflow page 1.
    let long_paragraph = "<p>The letter said very little and implied a great deal. </p>".repeat(40);
    let outcome = session.edit_page(1, long_paragraph).await?;
    info!(
        changed = ?outcome.changed_pages,
        total = outcome.total_pages,
        "edit reflowed"
    );

    // Generate onto a fresh page at the end.
    let last = session.snapshot().await.total_pages;
    session.navigate_to(last + 1).await?;
    let generated = session.generate(GenerationMode::New, None).await?;
    info!(
        page = generated.page_number,
        total = generated.total_pages,
        "generation merged"
    );

    // Save immediately and tear down.
    session.save_now().await?;
    let snapshot = session.snapshot().await;
    info!(
        pages = snapshot.total_pages,
        dirty = snapshot.is_dirty,
        saved_at = ?snapshot.last_saved_at,
        "final state"
    );
    session.close().await?;

    let body = store.body_of(chapter_id).unwrap_or_default();
    info!(bytes = body.len(), "persisted chapter body");
    Ok(())
}

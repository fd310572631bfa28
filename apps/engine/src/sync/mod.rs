//! Persistence synchronizer — debounced write of the flattened chapter body.
//!
//! The autosave timer is an explicit task handle, not an implicit closure:
//! every dirty mark aborts the armed task and spawns a fresh one
//! (cancel-and-reschedule, so the window truly resets instead of
//! throttling). Tests drive it with `tokio::time::pause`/`advance` — no
//! wall-clock sleeps.
//!
//! A flush captures the flattened body and its revision under the session
//! lock, writes without holding the lock, then clears the dirty flag only if
//! no edit landed in between. A failed write leaves the dirty flag set; the
//! next dirty mark or a manual flush retries it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::EngineError;
use crate::session::SessionCore;
use crate::store::ChapterStore;

/// Everything an autosave task needs to flush one chapter.
#[derive(Clone)]
pub(crate) struct SaveTarget {
    pub(crate) chapter_id: Uuid,
    pub(crate) window: Duration,
    pub(crate) core: Arc<Mutex<SessionCore>>,
    pub(crate) store: Arc<dyn ChapterStore>,
}

/// Arms one debounce cycle: sleep the idle window, then flush. The caller
/// aborts the previous handle before arming a new one.
pub(crate) fn spawn_autosave(target: SaveTarget) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(target.window).await;
        if let Err(e) = flush(&target).await {
            // Dirty flag is still set; the next dirty mark or manual save
            // retries the write.
            warn!(
                chapter = %target.chapter_id,
                error = %e,
                "autosave write failed; will retry"
            );
        }
    })
}

/// Writes the flattened body if the chapter is dirty. No-op when clean.
pub(crate) async fn flush(target: &SaveTarget) -> Result<(), EngineError> {
    let (body, revision) = {
        let core = target.core.lock().await;
        if !core.state.is_dirty() {
            return Ok(());
        }
        (core.state.flatten(), core.state.revision())
    };

    target
        .store
        .replace_body(target.chapter_id, &body)
        .await
        .map_err(EngineError::Persistence)?;

    let mut core = target.core.lock().await;
    core.state.mark_saved(revision, Utc::now());
    debug!(
        chapter = %target.chapter_id,
        bytes = body.len(),
        "flushed chapter body"
    );
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

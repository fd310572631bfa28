//! Persisted chapter store seam.
//!
//! The engine persists exactly one flattened markup document per chapter,
//! via an idempotent replace-whole-body write. The remote side is
//! last-write-wins; there is no partial-update API. `PgChapterStore` is the
//! production backend; `InMemoryChapterStore` backs tests and demos and can
//! simulate write failures for the retry paths.

pub mod postgres;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Backing store for chapter bodies.
///
/// Carried by the session as `Arc<dyn ChapterStore>`. Errors are opaque
/// (`anyhow`) — the synchronizer only cares that the write failed and must
/// be retried.
#[async_trait]
pub trait ChapterStore: Send + Sync {
    /// Replaces the chapter's whole document body. Idempotent.
    async fn replace_body(&self, chapter_id: Uuid, body: &str) -> Result<()>;

    /// Loads the chapter's current body; `None` if the chapter has no body
    /// yet.
    async fn load_body(&self, chapter_id: Uuid) -> Result<Option<String>>;
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory store
// ────────────────────────────────────────────────────────────────────────────

/// HashMap-backed store for tests, examples, and offline use.
#[derive(Default)]
pub struct InMemoryChapterStore {
    bodies: Mutex<HashMap<Uuid, String>>,
    write_count: AtomicUsize,
    fail_writes: AtomicBool,
}

impl InMemoryChapterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(chapter_id: Uuid, body: &str) -> Self {
        let store = Self::default();
        store
            .bodies
            .lock()
            .expect("chapter store lock poisoned")
            .insert(chapter_id, body.to_string());
        store
    }

    /// Number of successful writes observed. Lets tests assert debounce
    /// coalescing ("N dirty marks, one flush").
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    /// When set, every `replace_body` fails until cleared.
    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    pub fn body_of(&self, chapter_id: Uuid) -> Option<String> {
        self.bodies
            .lock()
            .expect("chapter store lock poisoned")
            .get(&chapter_id)
            .cloned()
    }
}

#[async_trait]
impl ChapterStore for InMemoryChapterStore {
    async fn replace_body(&self, chapter_id: Uuid, body: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("simulated write failure");
        }
        self.bodies
            .lock()
            .expect("chapter store lock poisoned")
            .insert(chapter_id, body.to_string());
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_body(&self, chapter_id: Uuid) -> Result<Option<String>> {
        Ok(self
            .bodies
            .lock()
            .expect("chapter store lock poisoned")
            .get(&chapter_id)
            .cloned())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

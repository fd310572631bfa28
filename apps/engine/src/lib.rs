//! folio-engine — the paginated-document engine behind the chapter editor.
//!
//! A chapter is persisted as one continuous rich-text document but edited as
//! a sequence of fixed-capacity pages matching a chosen paper format. This
//! crate owns the hard part of that arrangement: the capacity model, the
//! reflow cascade that keeps every page within budget under arbitrary edits
//! and AI generation, the page lifecycle (navigation, creation, deletion,
//! renumbering), and the debounced synchronization back to the chapter
//! store.
//!
//! Hosts construct one [`EditorSession`] per open chapter, wire in a
//! [`ChapterStore`] and a [`GenerationProvider`] (the shipped
//! [`LlmClient`](llm_client::LlmClient) or their own), and drive it through
//! the command surface; [`EditorSession::snapshot`] exposes the full read
//! state for rendering.

pub mod config;
pub mod errors;
pub mod generation;
pub mod llm_client;
pub mod models;
pub mod pagination;
pub mod session;
pub mod store;

pub(crate) mod sync;

pub use config::EngineConfig;
pub use errors::EngineError;
pub use generation::{GenerationMode, GenerationProvider, GenerationRequest};
pub use models::{Page, PageStatus, PaperProfile, PaperSize};
pub use pagination::{PaginationState, ViewMode};
pub use session::keys::{resolve as resolve_key, KeyChord, KeyCommand};
pub use session::{EditOutcome, EditorSession, GenerationOutcome, PageView, SessionSnapshot};
pub use store::{ChapterStore, InMemoryChapterStore};

// Pagination core: capacity measurement, split-point search, the reflow
// cascade, and the per-chapter page state. All CPU-bound and synchronous —
// the session layer serializes access.

pub mod boundary;
pub mod capacity;
pub mod reflow;
pub mod state;

// Re-export the public API consumed by the session layer and by hosts.
pub use capacity::{classify, complete_threshold, effective_length, strip_markup, word_count};
pub use reflow::{reflow_from, split_document};
pub use state::{PaginationState, ViewMode, MAX_ZOOM_PERCENT, MIN_ZOOM_PERCENT};

//! Page model. `word_count` and `status` are derived from `content` by the
//! single `set_content` path and are never writable on their own.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::models::paper::PaperProfile;
use crate::pagination::capacity;

/// Completion status of a page, derived from its stripped content length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    Empty,
    Draft,
    Complete,
}

/// One bounded-capacity page of a chapter.
///
/// Fields are private: `content` changes only through [`Page::set_content`],
/// which recomputes the derived `word_count` and `status` in the same step.
/// Serializes for host consumption; never deserialized — pages are re-derived
/// from the flattened chapter body on every session open.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    id: Uuid,
    chapter_id: Uuid,
    number: u32,
    content: String,
    word_count: usize,
    status: PageStatus,
}

impl Page {
    /// Creates an empty page with the given 1-based number.
    pub fn empty(chapter_id: Uuid, number: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            chapter_id,
            number,
            content: String::new(),
            word_count: 0,
            status: PageStatus::Empty,
        }
    }

    pub fn with_content(
        chapter_id: Uuid,
        number: u32,
        content: String,
        profile: &PaperProfile,
        config: &EngineConfig,
    ) -> Self {
        let mut page = Self::empty(chapter_id, number);
        page.set_content(content, profile, config);
        page
    }

    /// The single content-setting path: replaces the markup string and
    /// recomputes both derived fields.
    pub(crate) fn set_content(
        &mut self,
        content: String,
        profile: &PaperProfile,
        config: &EngineConfig,
    ) {
        self.word_count = capacity::word_count(&content);
        self.status = capacity::classify(&content, profile, config);
        self.content = content;
    }

    pub(crate) fn set_number(&mut self, number: u32) {
        self.number = number;
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn chapter_id(&self) -> Uuid {
        self.chapter_id
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn status(&self) -> PageStatus {
        self.status
    }

    /// True when the stripped content is empty. Such pages stay in the page
    /// list but are skipped when the chapter is flattened for persistence.
    pub fn is_effectively_empty(&self) -> bool {
        capacity::effective_length(&self.content) == 0
    }
}

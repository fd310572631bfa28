//! Generation provider seam.
//!
//! The engine never talks to a model API directly — it hands a
//! [`GenerationRequest`] to whatever `Arc<dyn GenerationProvider>` the host
//! wired in at session construction. The shipped implementation is
//! `llm_client::LlmClient`; tests substitute scripted providers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::EngineError;

/// How externally produced text is merged into the target page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Replace wholesale — only valid on a page with no content.
    New,
    /// Append after the existing content, separated by a blank line.
    Continue,
    /// Replace with an improved version — only valid on a non-empty page.
    Rewrite,
}

/// Everything a provider needs to produce text for one target page.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub chapter_id: Uuid,
    pub chapter_title: String,
    pub mode: GenerationMode,
    pub page_number: u32,
    /// The target page's current markup content (empty for `New`).
    pub page_content: String,
    /// Stripped tail of the previous page, for narrative continuity.
    pub previous_tail: String,
    /// Soft word budget derived from the page capacity left to fill.
    pub word_budget: usize,
    /// Optional author instructions for this request.
    pub instructions: Option<String>,
}

/// Asynchronous text producer. One round trip per request; a failure leaves
/// the target page untouched (the session guarantees it, providers need not
/// care).
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_serde_names() {
        assert_eq!(serde_json::to_string(&GenerationMode::New).unwrap(), "\"new\"");
        assert_eq!(
            serde_json::to_string(&GenerationMode::Continue).unwrap(),
            "\"continue\""
        );
        assert_eq!(
            serde_json::to_string(&GenerationMode::Rewrite).unwrap(),
            "\"rewrite\""
        );
        let back: GenerationMode = serde_json::from_str("\"rewrite\"").unwrap();
        assert_eq!(back, GenerationMode::Rewrite);
    }
}

/// LLM Client — the single point of entry for all Claude API calls in the
/// engine.
///
/// ARCHITECTURAL RULE: no other module may call the Anthropic API directly.
/// The session sees this client only through the `GenerationProvider` trait,
/// so tests and alternative backends swap in without touching the engine.
///
/// Model: claude-sonnet-4-5 (hardcoded — do not make configurable to prevent drift)
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::generation::provider::{GenerationMode, GenerationProvider, GenerationRequest};
use prompts::{
    CONTINUE_PROMPT_TEMPLATE, CONTINUE_SYSTEM, NEW_PROMPT_TEMPLATE, NEW_SYSTEM,
    REWRITE_PROMPT_TEMPLATE, REWRITE_SYSTEM, SHARED_OUTPUT_RULES,
};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all generation calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl ApiResponse {
    /// Extracts the text content from the first text block.
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Anthropic-backed generation provider.
/// Wraps the Messages API with retry logic and mode-specific prompts.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String, config: &EngineConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(config.generation_timeout)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    /// Makes a raw call to the Claude API, returning the response text.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    async fn call(&self, prompt: &str, system: &str) -> Result<String, ProviderError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error: Option<ProviderError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Generation call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(ProviderError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Generation API returned {}: {}", status, body);
                last_error = Some(ProviderError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                // Try to parse the structured error message
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(ProviderError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let api_response: ApiResponse = response.json().await?;

            debug!(
                "Generation call succeeded: input_tokens={}, output_tokens={}",
                api_response.usage.input_tokens, api_response.usage.output_tokens
            );

            let text = api_response.text().ok_or(ProviderError::EmptyContent)?;
            return Ok(text.to_string());
        }

        Err(last_error.unwrap_or(ProviderError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl GenerationProvider for LlmClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, EngineError> {
        let (prompt, system) = build_prompt(request);
        self.call(&prompt, system)
            .await
            .map_err(|e| EngineError::Generation(format!("provider call failed: {e}")))
    }
}

/// Fills the mode's template with the request fields.
pub(crate) fn build_prompt(request: &GenerationRequest) -> (String, &'static str) {
    let (template, system) = match request.mode {
        GenerationMode::New => (NEW_PROMPT_TEMPLATE, NEW_SYSTEM),
        GenerationMode::Continue => (CONTINUE_PROMPT_TEMPLATE, CONTINUE_SYSTEM),
        GenerationMode::Rewrite => (REWRITE_PROMPT_TEMPLATE, REWRITE_SYSTEM),
    };

    let instructions = request
        .instructions
        .as_deref()
        .unwrap_or("none")
        .to_string();

    let prompt = template
        .replace("{chapter_title}", &request.chapter_title)
        .replace("{page_number}", &request.page_number.to_string())
        .replace("{previous_tail}", &request.previous_tail)
        .replace("{page_content}", &request.page_content)
        .replace("{word_budget}", &request.word_budget.to_string())
        .replace("{instructions}", &instructions)
        .replace("{output_rules}", SHARED_OUTPUT_RULES);

    (prompt, system)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn make_request(mode: GenerationMode) -> GenerationRequest {
        GenerationRequest {
            chapter_id: Uuid::new_v4(),
            chapter_title: "The Lighthouse".to_string(),
            mode,
            page_number: 4,
            page_content: "<p>The keeper climbed the stairs.</p>".to_string(),
            previous_tail: "the storm had finally broken.".to_string(),
            word_budget: 180,
            instructions: Some("keep the tone ominous".to_string()),
        }
    }

    #[test]
    fn test_build_prompt_continue_includes_page_content() {
        let (prompt, system) = build_prompt(&make_request(GenerationMode::Continue));
        assert!(prompt.contains("The keeper climbed the stairs."));
        assert!(prompt.contains("the storm had finally broken."));
        assert!(prompt.contains("180"));
        assert!(prompt.contains("keep the tone ominous"));
        assert_eq!(system, CONTINUE_SYSTEM);
    }

    #[test]
    fn test_build_prompt_new_uses_new_template() {
        let (prompt, system) = build_prompt(&make_request(GenerationMode::New));
        assert!(prompt.contains("The Lighthouse"));
        assert!(prompt.contains("from scratch"));
        assert_eq!(system, NEW_SYSTEM);
    }

    #[test]
    fn test_build_prompt_rewrite_uses_rewrite_template() {
        let (prompt, system) = build_prompt(&make_request(GenerationMode::Rewrite));
        assert!(prompt.contains("Rewrite this page"));
        assert_eq!(system, REWRITE_SYSTEM);
    }

    #[test]
    fn test_build_prompt_missing_instructions_say_none() {
        let mut request = make_request(GenerationMode::New);
        request.instructions = None;
        let (prompt, _) = build_prompt(&request);
        assert!(prompt.contains("Author instructions: none"));
    }

    #[test]
    fn test_no_unfilled_placeholders_remain() {
        for mode in [
            GenerationMode::New,
            GenerationMode::Continue,
            GenerationMode::Rewrite,
        ] {
            let (prompt, _) = build_prompt(&make_request(mode));
            assert!(
                !prompt.contains('{') && !prompt.contains('}'),
                "unfilled placeholder in {mode:?} prompt: {prompt}"
            );
        }
    }
}

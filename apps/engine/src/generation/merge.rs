//! Mode preconditions and merge rules for generated text.
//!
//! `check_precondition` runs synchronously before any state change or
//! provider call; `merge_generated` produces the markup string that then
//! flows through the same content-setting path as a manual edit.

use crate::errors::EngineError;
use crate::generation::provider::GenerationMode;
use crate::pagination::capacity::effective_length;

/// Validates that `mode` may be applied to a page currently holding
/// `content`. Rejection happens before any state mutation.
pub fn check_precondition(mode: GenerationMode, content: &str) -> Result<(), EngineError> {
    let has_text = effective_length(content) > 0;
    match mode {
        GenerationMode::New if has_text => Err(EngineError::Validation(
            "'new' generation requires an empty page; use 'continue' or 'rewrite'".to_string(),
        )),
        GenerationMode::Rewrite if !has_text => Err(EngineError::Validation(
            "'rewrite' generation requires existing content; use 'new'".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Merges the produced text into the page's current content per the mode.
pub fn merge_generated(mode: GenerationMode, content: &str, produced: &str) -> String {
    let produced = produced.trim();
    match mode {
        GenerationMode::New | GenerationMode::Rewrite => produced.to_string(),
        GenerationMode::Continue => {
            if effective_length(content) == 0 {
                produced.to_string()
            } else {
                format!("{content}\n\n{produced}")
            }
        }
    }
}

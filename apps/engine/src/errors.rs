use thiserror::Error;

/// Engine-level error type returned by every fallible session command.
///
/// All three variants are rejected or surfaced *before* any state is lost:
/// `Validation` is raised synchronously before mutation, `Generation` leaves
/// the target page untouched, and `Persistence` keeps the dirty flag set so
/// the write is retried.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("generation error: {0}")]
    Generation(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] anyhow::Error),
}

impl EngineError {
    /// True if this error left the document dirty and eligible for retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Persistence(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = EngineError::Validation("page 9 does not exist".to_string());
        assert_eq!(err.to_string(), "validation error: page 9 does not exist");
    }

    #[test]
    fn test_only_persistence_is_retryable() {
        assert!(EngineError::Persistence(anyhow::anyhow!("connection reset")).is_retryable());
        assert!(!EngineError::Validation("bad".to_string()).is_retryable());
        assert!(!EngineError::Generation("provider down".to_string()).is_retryable());
    }
}

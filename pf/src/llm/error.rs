//! LLM error types

use thiserror::Error;

/// Errors that can occur during LLM operations
///
/// Every failure is terminal for that attempt: there are no automatic
/// retries anywhere in the refinement flow. The caller decides whether
/// to surface the error or to degrade (the suggestion path does).
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = LlmError::ApiError {
            status: 500,
            message: "Server error".to_string(),
        };
        assert_eq!(err.to_string(), "API error 500: Server error");
    }
}

//! Store error types

use thiserror::Error;

/// Errors from plan document storage
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),

    #[error("Invalid plan document: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Check if this is a transport-level failure (as opposed to a bad document)
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Io(_))
    }
}

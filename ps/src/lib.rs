//! PlanStore - per-account plan document storage
//!
//! Each account owns at most one plan document, stored as a JSON blob
//! keyed by account id. The store is deliberately dumb: it knows nothing
//! about the document's shape beyond "valid JSON". Higher layers decide
//! what a plan looks like.
//!
//! Two implementations are provided:
//!
//! - [`SqliteStore`] - durable, one row per account
//! - [`MemoryStore`] - ephemeral, for tests and dry runs

mod error;
mod store;

pub use error::StoreError;
pub use store::{MemoryStore, PlanStore, SqliteStore};

/// Current Unix timestamp in milliseconds
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms_is_positive() {
        assert!(now_ms() > 0);
    }
}

//! State manager messages
//!
//! Commands and responses for the actor pattern.

use thiserror::Error;
use tokio::sync::{broadcast, oneshot};

use crate::domain::DailyPlan;

/// Errors from state operations
#[derive(Debug, Clone, Error)]
pub enum StateError {
    #[error("Plan store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Stored plan document is invalid: {0}")]
    InvalidPlan(String),

    #[error("State channel closed")]
    ChannelError,
}

impl From<planstore::StoreError> for StateError {
    fn from(err: planstore::StoreError) -> Self {
        if err.is_unavailable() {
            StateError::StoreUnavailable(err.to_string())
        } else {
            StateError::InvalidPlan(err.to_string())
        }
    }
}

/// Response from state operations
pub type StateResponse<T> = Result<T, StateError>;

/// Broadcast when an account's plan changes
#[derive(Debug, Clone)]
pub struct PlanEvent {
    pub account: String,
    pub plan: Option<DailyPlan>,
}

/// A live subscription to one account's plan
///
/// The current value is delivered immediately via `current`; later
/// changes arrive through [`PlanSubscription::next`]. Dropping the
/// subscription releases it.
pub struct PlanSubscription {
    pub account: String,
    pub current: Option<DailyPlan>,
    pub(crate) rx: broadcast::Receiver<PlanEvent>,
}

impl std::fmt::Debug for PlanSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanSubscription")
            .field("account", &self.account)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl PlanSubscription {
    /// Wait for the next change to this account's plan
    ///
    /// Returns `None` once the state manager has shut down. Snapshots
    /// replace local state unconditionally - last writer wins.
    pub async fn next(&mut self) -> Option<Option<DailyPlan>> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.account == self.account => return Some(event.plan),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Only the most recent snapshot matters
                    tracing::warn!(skipped, "plan subscription lagged, catching up");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Commands sent to the StateManager actor
#[derive(Debug)]
pub enum StateCommand {
    SavePlan {
        account: String,
        plan: Option<DailyPlan>,
        reply: oneshot::Sender<StateResponse<()>>,
    },
    LoadPlan {
        account: String,
        reply: oneshot::Sender<StateResponse<Option<DailyPlan>>>,
    },
    Subscribe {
        account: String,
        reply: oneshot::Sender<StateResponse<PlanSubscription>>,
    },
    Shutdown,
}

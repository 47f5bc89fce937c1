//! Persistent plan state behind an actor
//!
//! [`StateManager`] owns the [`planstore::PlanStore`] and serializes all
//! access through a command channel; subscribers receive plan snapshots
//! over a broadcast channel with last-writer-wins semantics.

mod manager;
mod messages;

pub use manager::StateManager;
pub use messages::{PlanEvent, PlanSubscription, StateCommand, StateError, StateResponse};

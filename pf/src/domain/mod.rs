//! Domain types for planforge
//!
//! The data model for goal refinement and daily plans:
//!
//! - [`MicroTask`] - one AI-suggested sub-step under review
//! - [`RefinedGoalGroup`] - the micro-tasks for one goal
//! - [`FinalizedTask`] - a micro-task that survived review
//! - [`DailyPlan`] - the persisted per-account plan

mod id;
mod plan;
mod task;

pub use id::generate_id;
pub use plan::{CompletedTask, DailyPlan, MissedTask};
pub use task::{FinalizedTask, MicroTask, RefinedGoalGroup, TaskStatus, needs_clarification};

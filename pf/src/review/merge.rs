//! Plan Merger
//!
//! Combines newly approved micro-tasks with a previously finalized plan
//! into one canonical DailyPlan. Existing tasks come first, unchanged;
//! new tasks follow in the order they were approved. Rejected and
//! unresolved-edited items were already dropped by the session - that
//! discard is user-visible at review time, not an error here.

use tracing::info;

use crate::domain::{DailyPlan, FinalizedTask};

/// Merge existing plan tasks with newly approved ones
///
/// No deduplication is performed: duplicate goal strings across the
/// existing and new sets stay as separate entries.
pub fn merge(existing: &[FinalizedTask], approved: Vec<FinalizedTask>) -> Vec<FinalizedTask> {
    let mut tasks = Vec::with_capacity(existing.len() + approved.len());
    tasks.extend_from_slice(existing);
    tasks.extend(approved);
    tasks
}

/// Commit merged tasks as the new daily plan
///
/// Stamps the plan with the current timestamp; the caller's write
/// overwrites any previous plan for the account. Calling twice with the
/// same tasks produces the same stored document, only the timestamp
/// differs. An empty task list is a valid plan.
pub fn finalize(tasks: Vec<FinalizedTask>) -> DailyPlan {
    info!(task_count = tasks.len(), "Finalizing daily plan");
    DailyPlan::finalize(tasks)
}

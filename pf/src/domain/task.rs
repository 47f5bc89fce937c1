//! Micro-task types and review status
//!
//! A MicroTask is one AI-suggested sub-step of a user goal. It lives
//! only inside a review session; the persisted shape is [`FinalizedTask`].

use serde::{Deserialize, Serialize};

use super::id::generate_id;

/// Review status of a micro-task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Awaiting the user's verdict
    #[default]
    Pending,
    /// Accepted into the plan
    Approved,
    /// Discarded from the plan
    Rejected,
    /// Text being rewritten; must be re-approved
    Edited,
}

impl TaskStatus {
    /// Review is final per item: approved and rejected accept no further transitions
    pub fn is_reviewed(&self) -> bool {
        matches!(self, TaskStatus::Approved | TaskStatus::Rejected)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::Edited => write!(f, "edited"),
        }
    }
}

/// Check whether a candidate's text is really a question back to the user
///
/// The refinement prompt asks the model to embed clarifying questions as
/// micro-task items; such an item must be rewritten before it can enter
/// the plan.
pub fn needs_clarification(text: &str) -> bool {
    text.contains('?')
}

/// One AI-suggested sub-step of a goal, under review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MicroTask {
    /// Unique identifier, stable for the lifetime of the review session
    pub id: String,

    /// Current text (possibly user-edited)
    pub text: String,

    /// Immutable snapshot of the model's candidate
    pub original_text: String,

    /// Review status
    pub status: TaskStatus,

    /// The goal this was refined from (back-reference, not ownership)
    pub original_goal: String,
}

impl MicroTask {
    /// Create a micro-task from a model candidate
    ///
    /// A candidate that is itself a clarifying question starts in
    /// `Edited`: it has to be rewritten before it can be approved.
    pub fn from_candidate(text: impl Into<String>, original_goal: impl Into<String>) -> Self {
        let text = text.into();
        let status = if needs_clarification(&text) {
            TaskStatus::Edited
        } else {
            TaskStatus::Pending
        };
        Self {
            id: generate_id("task", &text),
            original_text: text.clone(),
            text,
            status,
            original_goal: original_goal.into(),
        }
    }

    /// Convert to the persisted shape (only meaningful once approved)
    pub fn to_finalized(&self) -> FinalizedTask {
        FinalizedTask {
            id: self.id.clone(),
            text: self.text.clone(),
            original_task: self.original_goal.clone(),
        }
    }
}

/// The ordered micro-tasks for one goal, inside a review session
#[derive(Debug, Clone)]
pub struct RefinedGoalGroup {
    /// The user-entered goal
    pub goal: String,

    /// Micro-tasks in model output order
    pub micro_tasks: Vec<MicroTask>,
}

/// A micro-task that survived review; the only review-time shape that is persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedTask {
    pub id: String,

    pub text: String,

    /// The originating goal string
    #[serde(rename = "originalTask")]
    pub original_task: String,
}

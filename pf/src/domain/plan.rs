//! DailyPlan and daily-review types
//!
//! A DailyPlan is the per-account persisted document: the tasks that
//! survived review, stamped with the finalization time. A plan with
//! zero tasks is a valid terminal state.

use std::collections::HashMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::task::FinalizedTask;

/// The persisted daily plan for one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPlan {
    /// ISO-8601 timestamp of finalization
    pub date: String,

    /// Finalized tasks, in plan order
    pub tasks: Vec<FinalizedTask>,
}

impl DailyPlan {
    /// Create a plan from finalized tasks, stamping `date` with the current time
    pub fn finalize(tasks: Vec<FinalizedTask>) -> Self {
        Self {
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            tasks,
        }
    }

    /// Create a plan with an explicit timestamp (tests, recovery)
    pub fn with_date(date: impl Into<String>, tasks: Vec<FinalizedTask>) -> Self {
        Self {
            date: date.into(),
            tasks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Distinct originating goals, in first-appearance order
    pub fn goals(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for task in &self.tasks {
            if !seen.contains(&task.original_task) {
                seen.push(task.original_task.clone());
            }
        }
        seen
    }

    /// Serialize to the stored document shape
    pub fn to_document(&self) -> serde_json::Value {
        serde_json::json!({
            "date": self.date,
            "tasks": self.tasks,
        })
    }

    /// Parse from a stored document
    pub fn from_document(doc: &serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(doc.clone())
    }

    /// Split the plan into completed and missed tasks for the daily review
    ///
    /// `completed_ids` holds the ids the user checked off; `reasons` maps a
    /// missed task id to the user's explanation, defaulting when absent.
    pub fn split_review(
        &self,
        completed_ids: &[String],
        reasons: &HashMap<String, String>,
    ) -> (Vec<CompletedTask>, Vec<MissedTask>) {
        let mut completed = Vec::new();
        let mut missed = Vec::new();

        for task in &self.tasks {
            if completed_ids.contains(&task.id) {
                completed.push(CompletedTask {
                    id: task.id.clone(),
                    text: task.text.clone(),
                });
            } else {
                missed.push(MissedTask {
                    id: task.id.clone(),
                    text: task.text.clone(),
                    reason: reasons
                        .get(&task.id)
                        .cloned()
                        .unwrap_or_else(|| "No reason provided".to_string()),
                });
            }
        }

        (completed, missed)
    }
}

/// A plan task the user completed; input to the suggestion call only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedTask {
    pub id: String,
    pub text: String,
}

/// A plan task the user missed, with their reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissedTask {
    pub id: String,
    pub text: String,
    pub reason: String,
}

//! Planforge - LLM-assisted daily micro-task planner
//!
//! Planforge turns a handful of high-level goals into a reviewed,
//! persisted daily plan. An LLM decomposes each goal into actionable
//! micro-tasks; the user approves, rejects, or rewrites each suggestion;
//! approved items become the account's daily plan. A second flow reviews
//! what got done and asks the model for coaching suggestions.
//!
//! # Core flow
//!
//! goals -> [`refine::Refiner`] -> [`refine::RefinementResult`] ->
//! [`review::ReviewSession`] -> [`review::merge`] ->
//! [`state::StateManager`] -> persisted [`domain::DailyPlan`]
//!
//! # Modules
//!
//! - [`refine`] - upstream LLM calls, response normalization, wire payloads
//! - [`review`] - the per-item review state machine and plan merger
//! - [`state`] - plan persistence behind an actor
//! - [`llm`] - LLM client trait and Anthropic implementation
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod llm;
pub mod prompts;
pub mod refine;
pub mod review;
pub mod state;

// Re-export commonly used types
pub use config::{Config, LlmConfig};
pub use domain::{CompletedTask, DailyPlan, FinalizedTask, MicroTask, MissedTask, RefinedGoalGroup, TaskStatus};
pub use llm::{AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError};
pub use refine::{
    FALLBACK_SUGGESTION, MalformedResponse, RefineError, RefineOutcome, RefinedGoal, RefinementResult, Refiner,
    normalize,
};
pub use review::{ReviewSession, ReviewVerdict, finalize, merge, run_review};
pub use state::{PlanEvent, PlanSubscription, StateError, StateManager};

//! Refiner - the two upstream LLM operations
//!
//! `refine` turns user goals into candidate micro-tasks; `suggest` turns
//! a daily review into coaching suggestions. Refinement failures surface
//! to the caller; suggestion failures degrade to a fallback message,
//! since suggestions are non-critical.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use super::normalizer::{self, MalformedResponse, RefinementResult};
use crate::domain::{CompletedTask, MissedTask};
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message};
use crate::prompts::{PromptLoader, RefineContext, SuggestContext};

/// Shown when the suggestion call fails for any reason
pub const FALLBACK_SUGGESTION: &str = "We couldn't generate suggestions at this time. Please try again later.";

/// Errors from the refinement call
#[derive(Debug, Error)]
pub enum RefineError {
    /// The upstream call itself failed
    #[error("Upstream refinement call failed: {0}")]
    Upstream(#[from] LlmError),

    /// The model answered, but not with anything usable
    #[error(transparent)]
    Malformed(#[from] MalformedResponse),

    /// A prompt template failed to load or render
    #[error("Prompt template error: {0}")]
    Template(String),
}

/// Result of a refinement request
#[derive(Debug, Clone)]
pub enum RefineOutcome {
    /// Fresh goals were refined
    Refined(RefinementResult),

    /// Every goal was already planned; nothing was sent upstream
    NothingNew,
}

/// Drives the refine and suggest calls against an injected LLM client
pub struct Refiner {
    llm: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    max_tokens: u32,
}

impl Refiner {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: PromptLoader, max_tokens: u32) -> Self {
        Self { llm, prompts, max_tokens }
    }

    /// Refine goals into candidate micro-tasks
    ///
    /// Goals already present in `existing` (exact string match) are not
    /// sent for refinement. When nothing remains after filtering, the
    /// model is not called at all.
    pub async fn refine(&self, goals: &[String], existing: &[String]) -> Result<RefineOutcome, RefineError> {
        let fresh: Vec<String> = goals.iter().filter(|g| !existing.contains(g)).cloned().collect();

        if fresh.is_empty() {
            info!("refine: every goal is already planned, skipping upstream call");
            return Ok(RefineOutcome::NothingNew);
        }

        let request = CompletionRequest {
            system_prompt: self
                .prompts
                .refine_system()
                .map_err(|e| RefineError::Template(e.to_string()))?,
            messages: vec![Message::user(
                self.prompts
                    .refine_user(&RefineContext { goals: fresh.clone() })
                    .map_err(|e| RefineError::Template(e.to_string()))?,
            )],
            max_tokens: self.max_tokens,
        };

        let response = self.llm.complete(request).await?;
        info!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            goal_count = fresh.len(),
            "refine: completed"
        );

        let raw = response
            .content
            .ok_or_else(|| LlmError::InvalidResponse("empty completion".to_string()))?;

        let result = normalizer::normalize(&raw, &fresh)?;
        Ok(RefineOutcome::Refined(result))
    }

    /// Request coaching suggestions from the daily review
    ///
    /// Never fails: any upstream or parse error degrades to a
    /// single-element fallback message.
    pub async fn suggest(&self, completed: &[CompletedTask], missed: &[MissedTask]) -> Vec<String> {
        match self.try_suggest(completed, missed).await {
            Ok(suggestions) if !suggestions.is_empty() => suggestions,
            Ok(_) => {
                warn!("suggest: model returned no suggestions, using fallback");
                vec![FALLBACK_SUGGESTION.to_string()]
            }
            Err(e) => {
                warn!(error = %e, "suggest: degrading to fallback");
                vec![FALLBACK_SUGGESTION.to_string()]
            }
        }
    }

    async fn try_suggest(&self, completed: &[CompletedTask], missed: &[MissedTask]) -> Result<Vec<String>, RefineError> {
        let context = SuggestContext {
            completed: completed.to_vec(),
            missed: missed.to_vec(),
        };

        let request = CompletionRequest {
            system_prompt: self
                .prompts
                .suggest_system()
                .map_err(|e| RefineError::Template(e.to_string()))?,
            messages: vec![Message::user(
                self.prompts
                    .suggest_user(&context)
                    .map_err(|e| RefineError::Template(e.to_string()))?,
            )],
            max_tokens: self.max_tokens,
        };

        let response = self.llm.complete(request).await?;
        let raw = response
            .content
            .ok_or_else(|| LlmError::InvalidResponse("empty completion".to_string()))?;

        parse_suggestions(&raw)
            .ok_or_else(|| MalformedResponse::new("no suggestions array in model output", &raw).into())
    }
}

/// Leniently extract a suggestions list from model output
///
/// Accepts `{"suggestions": [...]}` or a bare array, with the same
/// fenced/balanced extraction fallbacks as the refinement normalizer.
fn parse_suggestions(raw: &str) -> Option<Vec<String>> {
    let value = serde_json::from_str::<serde_json::Value>(raw.trim())
        .ok()
        .or_else(|| {
            normalizer::extract_fenced(raw).and_then(|b| serde_json::from_str(b).ok())
        })
        .or_else(|| {
            normalizer::extract_balanced(raw).and_then(|s| serde_json::from_str(s).ok())
        })?;

    let array = match &value {
        serde_json::Value::Array(items) => items.clone(),
        serde_json::Value::Object(obj) => obj.get("suggestions")?.as_array()?.clone(),
        _ => return None,
    };

    let suggestions: Vec<String> = array
        .iter()
        .filter_map(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(String::from)
        .collect();

    if suggestions.is_empty() { None } else { Some(suggestions) }
}

//! Response Normalizer
//!
//! Takes raw model output (text or already-parsed JSON) and produces a
//! validated [`RefinementResult`], tolerating markdown-fenced JSON and
//! schema drift. Anything that cannot be validated is a
//! [`MalformedResponse`] - the normalizer never repairs silently and
//! never retries.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Candidate micro-tasks for one requested goal, in model output order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinedGoal {
    pub goal: String,
    pub micro_tasks: Vec<String>,
}

/// Validated output of the refinement call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinementResult {
    /// Goal groups, preserving the model's output order
    pub refined: Vec<RefinedGoal>,

    /// The model's own clarification flag
    pub clarification_needed: bool,
}

impl RefinementResult {
    /// Whether any candidate text is itself a question back to the user
    ///
    /// This is the per-item signal derived from content, independent of
    /// the model's own flag. The two can disagree; callers surface that
    /// conflict instead of picking a winner silently.
    pub fn derived_clarification(&self) -> bool {
        self.refined
            .iter()
            .any(|g| g.micro_tasks.iter().any(|t| crate::domain::needs_clarification(t)))
    }

    /// Serialize back to the `refinedTasks`/`clarificationNeeded` shape
    pub fn to_payload_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        for group in &self.refined {
            map.insert(
                group.goal.clone(),
                Value::Array(group.micro_tasks.iter().cloned().map(Value::String).collect()),
            );
        }
        serde_json::json!({
            "refinedTasks": map,
            "clarificationNeeded": self.clarification_needed,
        })
    }
}

/// The normalizer could not extract a valid refinement from model output
#[derive(Debug, Error)]
#[error("Malformed refinement response: {reason}")]
pub struct MalformedResponse {
    pub reason: String,

    /// Raw model output, kept for diagnostics
    pub raw: String,
}

impl MalformedResponse {
    pub(crate) fn new(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            raw: raw.into(),
        }
    }
}

/// Normalize raw model text into a validated [`RefinementResult`]
///
/// Attempts, in order: direct JSON parse, a fenced code block, the first
/// balanced `{...}` span. `requested` is the goal list that was sent to
/// the model; every requested goal must appear in the result.
pub fn normalize(raw: &str, requested: &[String]) -> Result<RefinementResult, MalformedResponse> {
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
        debug!("normalize: direct parse succeeded");
        return normalize_value(&value, requested, raw);
    }

    if let Some(block) = extract_fenced(raw) {
        debug!("normalize: extracted fenced block");
        return match serde_json::from_str::<Value>(block) {
            Ok(value) => normalize_value(&value, requested, raw),
            Err(e) => Err(MalformedResponse::new(
                format!("fenced code block is not valid JSON: {}", e),
                raw,
            )),
        };
    }

    if let Some(span) = extract_balanced(raw) {
        debug!("normalize: extracted balanced span");
        return match serde_json::from_str::<Value>(span) {
            Ok(value) => normalize_value(&value, requested, raw),
            Err(e) => Err(MalformedResponse::new(
                format!("balanced JSON span does not parse: {}", e),
                raw,
            )),
        };
    }

    Err(MalformedResponse::new("no JSON object found in model output", raw))
}

/// Validate an already-parsed value against the expected shape
pub fn normalize_value(value: &Value, requested: &[String], raw: &str) -> Result<RefinementResult, MalformedResponse> {
    let obj = value
        .as_object()
        .ok_or_else(|| MalformedResponse::new("model output is not a JSON object", raw))?;

    let tasks = obj
        .get("refinedTasks")
        .ok_or_else(|| MalformedResponse::new("missing 'refinedTasks' field", raw))?
        .as_object()
        .ok_or_else(|| MalformedResponse::new("'refinedTasks' is not an object", raw))?;

    let mut refined = Vec::with_capacity(tasks.len());
    for (goal, candidates) in tasks {
        if goal.trim().is_empty() {
            return Err(MalformedResponse::new("empty goal key in 'refinedTasks'", raw));
        }

        let items = candidates
            .as_array()
            .ok_or_else(|| MalformedResponse::new(format!("micro-tasks for '{}' are not an array", goal), raw))?;

        let mut micro_tasks = Vec::with_capacity(items.len());
        for item in items {
            match item.as_str() {
                Some(text) if !text.trim().is_empty() => micro_tasks.push(text.to_string()),
                _ => {
                    return Err(MalformedResponse::new(
                        format!("micro-task under '{}' is not a non-empty string", goal),
                        raw,
                    ));
                }
            }
        }

        if !requested.is_empty() && !requested.contains(goal) {
            // The model invented a goal key; keep it, the user reviews it anyway
            warn!(%goal, "normalize: model returned a goal that was not requested");
        }

        refined.push(RefinedGoal {
            goal: goal.clone(),
            micro_tasks,
        });
    }

    for goal in requested {
        if !refined.iter().any(|g| &g.goal == goal) {
            return Err(MalformedResponse::new(
                format!("requested goal '{}' missing from refinement", goal),
                raw,
            ));
        }
    }

    let clarification_needed = match obj.get("clarificationNeeded") {
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            return Err(MalformedResponse::new("'clarificationNeeded' is not a boolean", raw));
        }
        None => {
            warn!("normalize: 'clarificationNeeded' missing from model output, defaulting to false");
            false
        }
    };

    Ok(RefinementResult {
        refined,
        clarification_needed,
    })
}

/// Extract the body of the first fenced code block
pub(crate) fn extract_fenced(raw: &str) -> Option<&str> {
    let start = raw.find("```")?;
    let after = &raw[start + 3..];
    // Skip the optional language tag to end of line
    let nl = after.find('\n')?;
    let body = &after[nl + 1..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// Extract the first balanced `{...}` span, honoring JSON string escapes
pub(crate) fn extract_balanced(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in raw.as_bytes().iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
        } else {
            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&raw[start..=i]);
                    }
                }
                _ => {}
            }
        }
    }

    None
}

//! Embedded fallback prompts
//!
//! These are compiled into the binary and used when template files are
//! not found.

/// System prompt for goal refinement
pub const REFINE_SYSTEM: &str = r#"You are a task refinement expert. Your job is to take a list of high-level goals and break them down into smaller, actionable micro-tasks.

Return a JSON object where each key is the original goal, and the value is an array of refined micro-tasks. Ensure that the micro-tasks are specific, measurable, achievable, relevant, and time-bound (SMART).
Also include a boolean named clarificationNeeded, and set it to true if any of the goals require further clarification from the user. If you set clarificationNeeded to true, the micro-tasks should include a question to ask the user.

Example:
{
  "refinedTasks": {
    "Learn a new language": ["Sign up for a Duolingo course (15 minutes)", "Practice Spanish vocabulary for 20 minutes", "What kind of language do you want to learn?"],
    "Get in shape": ["Go for a 30-minute jog in the park", "Do a 15-minute bodyweight workout", "Prepare a healthy lunch"]
  },
  "clarificationNeeded": true
}

Ensure that the JSON is valid and can be parsed without errors. Output only the JSON object.
"#;

/// User message template for goal refinement
pub const REFINE_USER: &str = r#"Here are the goals:
{{#each goals}}- {{{this}}}
{{/each}}
"#;

/// System prompt for targeted suggestions
pub const SUGGEST_SYSTEM: &str = r#"You are a personal improvement assistant. Provide targeted suggestions to the user based on their completed and missed tasks.

Return a JSON object with a single key "suggestions" whose value is an array of suggestion strings. Output only the JSON object.
"#;

/// User message template for targeted suggestions
pub const SUGGEST_USER: &str = r#"Completed Tasks:
{{#each completed}}
- {{{this.text}}}
{{/each}}

Missed Tasks:
{{#each missed}}
- Task: {{{this.text}}}, Reason: {{{this.reason}}}
{{/each}}
"#;

/// Look up an embedded template by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    match name {
        "refine-system" => Some(REFINE_SYSTEM),
        "refine-user" => Some(REFINE_USER),
        "suggest-system" => Some(SUGGEST_SYSTEM),
        "suggest-user" => Some(SUGGEST_USER),
        _ => None,
    }
}

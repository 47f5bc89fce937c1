//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;
use crate::domain::{CompletedTask, MissedTask};

/// Context for rendering the refine user message
#[derive(Debug, Clone, Serialize)]
pub struct RefineContext {
    /// Goals to decompose, after the already-planned ones are filtered out
    pub goals: Vec<String>,
}

/// Context for rendering the suggestion user message
#[derive(Debug, Clone, Serialize)]
pub struct SuggestContext {
    pub completed: Vec<CompletedTask>,
    pub missed: Vec<MissedTask>,
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.planforge/prompts/`)
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a new prompt loader rooted at the given directory
    ///
    /// Templates in `{root}/.planforge/prompts/{name}.pmt` override the
    /// embedded defaults.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let user_dir = root.as_ref().join(".planforge/prompts");
        Self {
            hbs: Handlebars::new(),
            user_dir: if user_dir.exists() { Some(user_dir) } else { None },
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        Self {
            hbs: Handlebars::new(),
            user_dir: None,
        }
    }

    /// Load a template by name, preferring the user override
    fn load_template(&self, name: &str) -> Result<String> {
        if let Some(ref user_dir) = self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!("Loading prompt from user override: {:?}", path);
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read user prompt {}: {}", path.display(), e));
            }
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!("Using embedded prompt: {}", name);
            return Ok(content.to_string());
        }

        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    fn render<C: Serialize>(&self, template_name: &str, context: &C) -> Result<String> {
        let template = self.load_template(template_name)?;
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// System prompt for goal refinement
    pub fn refine_system(&self) -> Result<String> {
        self.load_template("refine-system")
    }

    /// User message for goal refinement
    pub fn refine_user(&self, context: &RefineContext) -> Result<String> {
        self.render("refine-user", context)
    }

    /// System prompt for targeted suggestions
    pub fn suggest_system(&self) -> Result<String> {
        self.load_template("suggest-system")
    }

    /// User message for targeted suggestions
    pub fn suggest_user(&self, context: &SuggestContext) -> Result<String> {
        self.render("suggest-user", context)
    }
}

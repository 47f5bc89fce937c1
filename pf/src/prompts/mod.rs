//! Prompt templates for the refinement and suggestion calls

pub mod embedded;
mod loader;

pub use loader::{PromptLoader, RefineContext, SuggestContext};

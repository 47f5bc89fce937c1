//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use eyre::{Result, bail};
use std::path::PathBuf;

use crate::config::PlanningConfig;

/// Planforge - LLM-assisted daily micro-task planner
#[derive(Parser)]
#[command(
    name = "pf",
    about = "Turn high-level goals into a reviewed, persisted daily plan",
    version,
    after_help = "Logs are written to: ~/.local/share/planforge/logs/planforge.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Account id (overrides config)
    #[arg(short, long, global = true, help = "Account id (overrides config)")]
    pub account: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Create a daily plan: refine goals, review suggestions, finalize
    Plan {
        /// Goals to refine (prompted interactively when omitted)
        goals: Vec<String>,
    },

    /// Add goals to the existing plan
    Add {
        /// Goals to refine and merge into the current plan
        goals: Vec<String>,
    },

    /// Show the current plan
    Show {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Refine goals and print the encoded review payload (no review)
    Refine {
        /// Goals to refine
        goals: Vec<String>,
    },

    /// Review a payload produced by `refine`, then finalize
    Review {
        /// Percent-encoded refinement payload
        #[arg(long)]
        data: String,

        /// Percent-encoded existing tasks to merge with
        #[arg(long)]
        existing: Option<String>,
    },

    /// Review today's plan and get coaching suggestions
    DailyReview,

    /// Watch the stored plan for changes until interrupted
    Watch,

    /// Start a new day (clear the stored plan)
    Reset,
}

/// Output format for show
#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Validate goal entries against the configured limits
///
/// The limits live at this boundary deliberately: the review core
/// accepts whatever it is given.
pub fn validate_goals(goals: &[String], planning: &PlanningConfig) -> Result<()> {
    if goals.is_empty() {
        bail!("No goals entered. Please enter at least one goal.");
    }
    if goals.len() > planning.max_goals {
        bail!(
            "Too many goals: {} entered, at most {} per plan.",
            goals.len(),
            planning.max_goals
        );
    }
    for goal in goals {
        if goal.trim().chars().count() < planning.min_goal_chars {
            bail!(
                "Goal '{}' is too short: goals must be at least {} characters.",
                goal,
                planning.min_goal_chars
            );
        }
    }
    Ok(())
}

/// Path to the log file
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("planforge")
        .join("logs")
        .join("planforge.log")
}

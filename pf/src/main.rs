//! Planforge - LLM-assisted daily micro-task planner
//!
//! CLI entry point: refine goals into micro-tasks, review them, and
//! manage the persisted daily plan.

use std::fs;
use std::io::{self, BufRead, Write as IoWrite};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, bail};
use tracing::info;

use planforge::cli::{Cli, Command, OutputFormat, get_log_path, validate_goals};
use planforge::config::{Config, PlanningConfig};
use planforge::domain::DailyPlan;
use planforge::llm::create_client;
use planforge::prompts::PromptLoader;
use planforge::refine::{RefineError, RefineOutcome, Refiner, wire};
use planforge::review::{ReviewSession, ReviewVerdict, finalize, merge, run_review};
use planforge::state::StateManager;
use planstore::SqliteStore;

fn setup_logging(verbose: bool) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Write to the log file, not stdout/stderr - the terminal belongs to the user
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let account = cli.account.unwrap_or_else(|| config.account.id.clone());

    info!(
        "Planforge loaded config: provider={}, model={}, account={}",
        config.llm.provider, config.llm.model, account
    );

    match cli.command {
        Some(Command::Plan { goals }) => cmd_plan(&config, &account, goals).await,
        Some(Command::Add { goals }) => cmd_add(&config, &account, goals).await,
        Some(Command::Show { format }) => cmd_show(&config, &account, format).await,
        Some(Command::Refine { goals }) => cmd_refine(&config, goals).await,
        Some(Command::Review { data, existing }) => cmd_review(&config, &account, &data, existing.as_deref()).await,
        Some(Command::DailyReview) => cmd_daily_review(&config, &account).await,
        Some(Command::Watch) => cmd_watch(&config, &account).await,
        Some(Command::Reset) => cmd_reset(&config, &account).await,
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

/// Open the plan store and spawn the state actor
fn open_state(config: &Config) -> Result<StateManager> {
    let store = SqliteStore::open(PathBuf::from(&config.storage.store_path)).context("Failed to open plan store")?;
    Ok(StateManager::spawn(store))
}

/// Build the refiner against the configured LLM provider
fn build_refiner(config: &Config) -> Result<Refiner> {
    config.validate()?;
    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let prompts = PromptLoader::new(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    Ok(Refiner::new(llm, prompts, config.llm.max_tokens))
}

/// Create a plan from scratch: refine, review, finalize
async fn cmd_plan(config: &Config, account: &str, goals: Vec<String>) -> Result<()> {
    let goals = if goals.is_empty() {
        prompt_goals(&config.planning)?
    } else {
        goals
    };
    validate_goals(&goals, &config.planning)?;

    let refiner = build_refiner(config)?;
    println!("Refining {} goal(s)...", goals.len());

    let result = match refiner.refine(&goals, &[]).await {
        Ok(RefineOutcome::Refined(result)) => result,
        Ok(RefineOutcome::NothingNew) => {
            println!("Nothing to refine.");
            return Ok(());
        }
        Err(RefineError::Malformed(e)) => {
            tracing::error!(reason = %e.reason, raw = %e.raw, "Malformed refinement response");
            bail!("Could not read suggestion data. It might be corrupted. Please try again.");
        }
        Err(e) => bail!("Failed to get suggestions from AI: {}", e),
    };

    let mut session = ReviewSession::new(&result);
    if run_review(&mut session)? == ReviewVerdict::Cancelled {
        return Ok(());
    }

    let approved = session.approved_tasks();
    if approved.is_empty() {
        println!("No micro-tasks approved. An empty plan is fine, but approving at least one works better!");
    }

    let plan = finalize(merge(&[], approved));
    let state = open_state(config)?;
    save_with_retry(&state, account, plan.clone()).await?;

    println!("{}", "Plan finalized! Your daily plan has been saved.".green());
    print_plan(&plan);
    Ok(())
}

/// Add goals onto the existing plan
async fn cmd_add(config: &Config, account: &str, goals: Vec<String>) -> Result<()> {
    let state = open_state(config)?;

    let Some(existing_plan) = state.load_plan(account).await? else {
        println!("No current plan - creating a new one.");
        return cmd_plan(config, account, goals).await;
    };

    let existing_goals = existing_plan.goals();
    let remaining = config.planning.max_goals.saturating_sub(existing_goals.len());
    if remaining == 0 {
        bail!(
            "Your plan already covers the maximum of {} goals. Start a new day with 'pf reset'.",
            config.planning.max_goals
        );
    }

    let limits = PlanningConfig {
        max_goals: remaining,
        ..config.planning.clone()
    };
    let goals = if goals.is_empty() { prompt_goals(&limits)? } else { goals };
    validate_goals(&goals, &limits)?;

    let refiner = build_refiner(config)?;
    println!("Refining {} goal(s)...", goals.len());

    let result = match refiner.refine(&goals, &existing_goals).await {
        Ok(RefineOutcome::Refined(result)) => result,
        Ok(RefineOutcome::NothingNew) => {
            println!("Those goals are already in your plan.");
            print_plan(&existing_plan);
            return Ok(());
        }
        Err(RefineError::Malformed(e)) => {
            tracing::error!(reason = %e.reason, raw = %e.raw, "Malformed refinement response");
            bail!("Could not read suggestion data. It might be corrupted. Please try again.");
        }
        Err(e) => bail!("Failed to get suggestions from AI: {}", e),
    };

    let mut session = ReviewSession::new(&result);
    if run_review(&mut session)? == ReviewVerdict::Cancelled {
        return Ok(());
    }

    let plan = finalize(merge(&existing_plan.tasks, session.approved_tasks()));
    save_with_retry(&state, account, plan.clone()).await?;

    println!("{}", "Tasks added! Your daily plan has been updated.".green());
    print_plan(&plan);
    Ok(())
}

/// Show the current plan
async fn cmd_show(config: &Config, account: &str, format: OutputFormat) -> Result<()> {
    let state = open_state(config)?;
    let plan = state.load_plan(account).await?;

    match (plan, format) {
        (None, OutputFormat::Json) => println!("null"),
        (None, OutputFormat::Text) => {
            println!("No plan yet. Run 'pf plan' to create one.");
        }
        (Some(plan), OutputFormat::Json) => {
            println!("{}", serde_json::to_string_pretty(&plan.to_document())?);
        }
        (Some(plan), OutputFormat::Text) => print_plan(&plan),
    }
    Ok(())
}

/// Refine goals and print the encoded review payload
async fn cmd_refine(config: &Config, goals: Vec<String>) -> Result<()> {
    let goals = if goals.is_empty() {
        prompt_goals(&config.planning)?
    } else {
        goals
    };
    validate_goals(&goals, &config.planning)?;

    let refiner = build_refiner(config)?;
    let result = match refiner.refine(&goals, &[]).await {
        Ok(RefineOutcome::Refined(result)) => result,
        Ok(RefineOutcome::NothingNew) => {
            println!("Nothing to refine.");
            return Ok(());
        }
        Err(RefineError::Malformed(e)) => {
            tracing::error!(reason = %e.reason, raw = %e.raw, "Malformed refinement response");
            bail!("Could not read suggestion data. It might be corrupted. Please try again.");
        }
        Err(e) => bail!("Failed to get suggestions from AI: {}", e),
    };

    println!("{}", wire::encode_refinement(&result));
    eprintln!("Review with: pf review --data <payload>");
    Ok(())
}

/// Review a payload produced by `refine`
async fn cmd_review(config: &Config, account: &str, data: &str, existing: Option<&str>) -> Result<()> {
    let result = wire::decode_refinement(data).map_err(|e| {
        tracing::error!(reason = %e.reason, "Corrupted review payload");
        eyre::eyre!("Could not read suggestion data. It might be corrupted. Please try again.")
    })?;

    let existing_tasks = match existing {
        Some(payload) => wire::decode_existing(payload).map_err(|e| {
            tracing::error!(reason = %e.reason, "Corrupted existing-tasks payload");
            eyre::eyre!("Could not read the existing tasks payload. It might be corrupted.")
        })?,
        None => Vec::new(),
    };

    let mut session = ReviewSession::new(&result);
    if run_review(&mut session)? == ReviewVerdict::Cancelled {
        return Ok(());
    }

    let plan = finalize(merge(&existing_tasks, session.approved_tasks()));
    let state = open_state(config)?;
    save_with_retry(&state, account, plan.clone()).await?;

    println!("{}", "Plan finalized! Your daily plan has been saved.".green());
    print_plan(&plan);
    Ok(())
}

/// Walk through today's plan, then ask for coaching suggestions
async fn cmd_daily_review(config: &Config, account: &str) -> Result<()> {
    let state = open_state(config)?;
    let Some(plan) = state.load_plan(account).await? else {
        println!("Nothing to review. Start by creating a plan with 'pf plan'.");
        return Ok(());
    };

    println!("Daily Review - plan from {}", plan.date);
    println!("Check off what you completed and explain what you missed.");
    println!();

    let mut completed_ids = Vec::new();
    let mut reasons = std::collections::HashMap::new();

    for task in &plan.tasks {
        if confirm(&format!("Did you complete: {}?", task.text))? {
            completed_ids.push(task.id.clone());
        } else {
            let reason = prompt_line("Why was this task missed? (enter to skip): ")?;
            if !reason.is_empty() {
                reasons.insert(task.id.clone(), reason);
            }
        }
    }

    let (completed, missed) = plan.split_review(&completed_ids, &reasons);
    info!(
        completed = completed.len(),
        missed = missed.len(),
        "Daily review submitted"
    );

    println!("\nAnalyzing your day...");
    let refiner = build_refiner(config)?;
    let suggestions = refiner.suggest(&completed, &missed).await;

    println!();
    println!("{}", "Targeted Suggestions".bold());
    for suggestion in &suggestions {
        println!("  - {}", suggestion);
    }
    Ok(())
}

/// Watch the stored plan until interrupted
async fn cmd_watch(config: &Config, account: &str) -> Result<()> {
    let state = open_state(config)?;
    let mut subscription = state.subscribe(account).await?;

    match &subscription.current {
        Some(plan) => print_plan(plan),
        None => println!("No plan stored."),
    }
    println!("Watching for changes. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            changed = subscription.next() => {
                match changed {
                    Some(Some(plan)) => {
                        println!();
                        println!("{}", "Plan updated:".bold());
                        print_plan(&plan);
                    }
                    Some(None) => println!("Plan was cleared."),
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

/// Clear the stored plan
async fn cmd_reset(config: &Config, account: &str) -> Result<()> {
    let state = open_state(config)?;
    state.reset_plan(account).await?;
    println!("Started a new day. Your plan is empty.");
    Ok(())
}

/// Save, offering retries so a reviewed plan is never lost to a store hiccup
async fn save_with_retry(state: &StateManager, account: &str, plan: DailyPlan) -> Result<()> {
    loop {
        match state.save_plan(account, Some(plan.clone())).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                eprintln!("{}", format!("Could not save plan: {}", e).red());
                // The reviewed plan is still in memory; the user decides
                if !confirm("Retry saving?")? {
                    bail!("Plan was not saved.");
                }
            }
        }
    }
}

/// Prompt for goals, one per line, up to the configured maximum
fn prompt_goals(planning: &PlanningConfig) -> Result<Vec<String>> {
    println!(
        "Enter up to {} goal(s), one per line (empty line to finish):",
        planning.max_goals
    );

    let mut goals = Vec::new();
    while goals.len() < planning.max_goals {
        let line = prompt_line(&format!("Goal #{}: ", goals.len() + 1))?;
        if line.is_empty() {
            break;
        }
        goals.push(line);
    }
    Ok(goals)
}

/// Read one trimmed line from stdin
fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Ask a yes/no question, defaulting to no
fn confirm(prompt: &str) -> Result<bool> {
    let answer = prompt_line(&format!("{} [y/N]: ", prompt))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

/// Print a plan grouped by goal
fn print_plan(plan: &DailyPlan) {
    println!("Plan from {}", plan.date);
    if plan.is_empty() {
        println!("  (no tasks)");
        return;
    }

    for goal in plan.goals() {
        println!("{}", goal.bold());
        for task in plan.tasks.iter().filter(|t| t.original_task == goal) {
            println!("  - {}", task.text);
        }
    }
}

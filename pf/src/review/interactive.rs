//! Interactive review loop
//!
//! A rustyline-driven loop over one ReviewSession: the user approves,
//! rejects, or rewrites each suggested micro-task, then finalizes once
//! everything is reviewed.

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use super::session::ReviewSession;
use crate::domain::TaskStatus;

/// How the review loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewVerdict {
    /// All items reviewed and the user chose to finalize
    Finalized,
    /// The user bailed out; nothing should be persisted
    Cancelled,
}

/// Run the review loop until the user finalizes or cancels
pub fn run_review(session: &mut ReviewSession) -> Result<ReviewVerdict> {
    print_alerts(session);
    print_tasks(session);
    print_help();

    let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

    loop {
        let readline = rl.readline(&format!("{} ", ">".bright_green()));

        let line = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!();
                return Ok(ReviewVerdict::Cancelled);
            }
            Err(err) => return Err(eyre::eyre!("Readline error: {}", err)),
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(input);

        match handle_command(session, input) {
            CommandResult::Continue => {}
            CommandResult::Finalize => return Ok(ReviewVerdict::Finalized),
            CommandResult::Quit => {
                println!("Review cancelled. Nothing was saved.");
                return Ok(ReviewVerdict::Cancelled);
            }
        }
    }
}

enum CommandResult {
    Continue,
    Finalize,
    Quit,
}

fn handle_command(session: &mut ReviewSession, input: &str) -> CommandResult {
    let mut parts = input.splitn(3, char::is_whitespace);
    let command = parts.next().unwrap_or_default();

    match command {
        "a" | "approve" => {
            with_task(session, parts.next(), |session, id| {
                if session.approve(&id) {
                    println!("Approved.");
                } else {
                    println!("That item is already reviewed.");
                }
            });
        }
        "r" | "reject" => {
            with_task(session, parts.next(), |session, id| {
                if session.reject(&id) {
                    println!("Rejected.");
                } else {
                    println!("Only pending items can be rejected.");
                }
            });
        }
        "e" | "edit" => {
            with_task(session, parts.next(), |session, id| {
                if session.begin_edit(&id) {
                    println!("Editing. Use 't <n> <new text>' then 'c <n>' to commit.");
                } else {
                    println!("Only pending items can be edited.");
                }
            });
        }
        "t" | "text" => {
            let index = parts.next();
            let Some(new_text) = parts.next() else {
                println!("Usage: t <n> <new text>");
                return CommandResult::Continue;
            };
            with_task(session, index, |session, id| {
                if session.update_text(&id, new_text.trim()) {
                    println!("Text updated.");
                } else {
                    println!("That item is not being edited.");
                }
            });
        }
        "c" | "commit" => {
            with_task(session, parts.next(), |session, id| {
                if session.commit_edit(&id) {
                    println!("Approved.");
                } else if let Some(task) = session.task(&id) {
                    if task.status == TaskStatus::Edited {
                        println!("Still unresolved: rewrite the text (it must change and not be a question).");
                    } else {
                        println!("That item is not being edited.");
                    }
                }
            });
        }
        "list" | "l" => print_tasks(session),
        "done" | "finalize" => {
            if session.all_reviewed() {
                return CommandResult::Finalize;
            }
            let (pending, _, _, edited) = session.status_counts();
            println!(
                "Not finished: {} pending, {} being edited. Every item needs a verdict first.",
                pending, edited
            );
        }
        "quit" | "q" | "exit" => return CommandResult::Quit,
        "help" | "h" => print_help(),
        _ => println!("Unknown command '{}'. Type 'help' for commands.", command),
    }

    CommandResult::Continue
}

/// Resolve a 1-based display index and run `f` with the task's id
fn with_task<F>(session: &mut ReviewSession, index: Option<&str>, f: F)
where
    F: FnOnce(&mut ReviewSession, String),
{
    let Some(raw) = index else {
        println!("Missing item number.");
        return;
    };
    let Ok(n) = raw.parse::<usize>() else {
        println!("'{}' is not an item number.", raw);
        return;
    };
    let Some(task) = session.iter().nth(n.wrapping_sub(1)) else {
        println!("No item {}.", n);
        return;
    };
    let id = task.id.clone();
    f(session, id);
}

fn print_alerts(session: &ReviewSession) {
    if session.model_clarification() {
        println!(
            "{}",
            "Some of your goals were unclear. Questions were added to help you clarify them - edit those items below."
                .yellow()
        );
    }
    if session.clarification_conflict() {
        println!(
            "{}",
            "Note: the model's clarification flag disagrees with the suggestions themselves; check items containing questions."
                .yellow()
        );
    }
}

fn print_tasks(session: &ReviewSession) {
    let mut index = 0;
    for group in session.groups() {
        println!();
        println!("{}", group.goal.bold());
        for task in &group.micro_tasks {
            index += 1;
            let status = match task.status {
                TaskStatus::Pending => "pending".dimmed(),
                TaskStatus::Approved => "approved".green(),
                TaskStatus::Rejected => "rejected".red(),
                TaskStatus::Edited => "edited".blue(),
            };
            println!("  {:>2}. [{}] {}", index, status, task.text);
        }
    }
    println!();
}

fn print_help() {
    println!("Commands:");
    println!("  a <n>          approve item n");
    println!("  r <n>          reject item n");
    println!("  e <n>          start editing item n");
    println!("  t <n> <text>   replace item n's text while editing");
    println!("  c <n>          commit the edit (approves if resolved)");
    println!("  list           show all items");
    println!("  done           finalize the plan (once all items are reviewed)");
    println!("  quit           cancel without saving");
}

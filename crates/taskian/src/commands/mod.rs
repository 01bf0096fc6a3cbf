use std::fs;
use std::io::Write;

use anyhow::{Context, Result, bail};
use taskian_app::{Session, SessionService, StateStore};
use taskian_core::Completion;
use taskian_store::lines;
use tracing::info;

use crate::Command;
use crate::render::Renderer;

mod args;

pub use args::{CompleteTarget, DayArg, Selector};

/// Execute one command, persist the session if it changed, and print the
/// outcome.
pub fn run<S: StateStore>(
    command: Command,
    service: &mut SessionService<S>,
    renderer: &Renderer,
    out: &mut impl Write,
) -> Result<()> {
    let mutating = command.is_mutating();
    let message = apply(command, service.session_mut(), renderer)?;
    if mutating {
        service.save()?;
    }
    if !message.is_empty() {
        writeln!(out, "{message}")?;
    }
    Ok(())
}

fn apply(command: Command, session: &mut Session, renderer: &Renderer) -> Result<String> {
    let message = match command {
        Command::Ls { view } => match view {
            Some(view) => renderer.view(session, view),
            None => renderer.smart(session),
        },

        Command::Add {
            description,
            due,
            repeat,
        } => {
            let due = due.map(|day| day.resolve(session.today()));
            let position = session.add_task(description.join(" "), due, repeat);
            format!("  Task added at position {position}.")
        }
        Command::Remove {
            target: Selector::All,
        } => format!("  Removed {} tasks.", session.clear_tasks()),
        Command::Remove {
            target: Selector::At(position),
        } => {
            let task = session.delete_task(position)?;
            format!(
                "  Deleted '{}'. Enter 'undo' or 'u' to restore.",
                task.description
            )
        }
        Command::Complete {
            target: CompleteTarget::Today,
        } => complete_today(session),
        Command::Complete {
            target: CompleteTarget::At(position),
        } => match session.complete_task(position)? {
            Completion::Removed(_) => {
                "  Task marked as complete. Enter 'uncheck' or 'uc' to restore.".to_owned()
            }
            Completion::Rolled { next_due, .. } => format!(
                "  Task marked as complete, next due {next_due}. Enter 'uncheck' or 'uc' to restore."
            ),
        },
        Command::Edit {
            position,
            description,
        } => {
            session.edit_task(position, description.join(" "))?;
            format!("  Task {position} updated.")
        }
        Command::ChangeDate { position, date } => {
            let due = date.resolve(session.today());
            let moved = session.reschedule_task(position, due)?;
            format!("  Task now due {due} at position {moved}.")
        }
        Command::AddRepeat { position, rule } => {
            session.set_recurrence(position, rule.clone())?;
            format!("  Task {position} repeats: {rule}.")
        }
        Command::RemoveRepeat { position } => {
            session.clear_recurrence(position)?;
            format!("  Task {position} no longer repeats.")
        }

        Command::Subtask {
            position,
            description,
        } => {
            session.add_subtask(position, description.join(" "))?;
            format!("  Subtask added to task {position}.")
        }
        Command::CompSubtask { position, subtask } => {
            session.complete_subtask(position, subtask)?;
            format!("  Subtask {subtask} of task {position} done.")
        }
        Command::UncheckSubtask { position, subtask } => {
            session.uncomplete_subtask(position, subtask)?;
            format!("  Subtask {subtask} of task {position} reopened.")
        }
        Command::RemoveSubtask { position, subtask } => {
            session.delete_subtask(position, subtask)?;
            format!("  Subtask {subtask} removed from task {position}.")
        }
        Command::EditSubtask {
            position,
            subtask,
            description,
        } => {
            session.edit_subtask(position, subtask, description.join(" "))?;
            format!("  Subtask {subtask} of task {position} updated.")
        }

        Command::AddGoal {
            description,
            target,
            percent,
        } => {
            let position = session.add_goal(description.join(" "), target, percent)?;
            format!("  Goal added at position {position}.")
        }
        Command::RemoveGoal {
            target: Selector::All,
        } => format!("  Removed {} goals.", session.clear_goals()),
        Command::RemoveGoal {
            target: Selector::At(position),
        } => {
            let goal = session.delete_goal(position)?;
            format!(
                "  Deleted '{}'. Enter 'undo-goal' or 'ug' to restore.",
                goal.description
            )
        }
        Command::CompleteGoal { position } => {
            session.complete_goal(position)?;
            "  Goal marked as complete. Enter 'uncheck-goal' or 'ucg' to restore.".to_owned()
        }
        Command::EditGoal {
            position,
            description,
        } => {
            session.edit_goal(position, description.join(" "))?;
            format!("  Goal {position} updated.")
        }
        Command::ChangeTarget { position, target } => {
            let target = Some(target.join(" ")).filter(|text| !text.trim().is_empty());
            let cleared = target.is_none();
            session.set_goal_target(position, target)?;
            if cleared {
                format!("  Target of goal {position} cleared.")
            } else {
                format!("  Target of goal {position} updated.")
            }
        }
        Command::SetPercent { position, percent } => {
            session.set_goal_percent(position, percent)?;
            format!("  Goal {position} is {percent}% done.")
        }

        Command::Undo => format!("  Restored task {}.", session.undo_delete_task()?),
        Command::Uncheck => format!("  Reopened task {}.", session.uncheck_task()?),
        Command::UndoGoal => format!("  Restored goal {}.", session.undo_delete_goal()?),
        Command::UncheckGoal => format!("  Reopened goal {}.", session.uncheck_goal()?),

        Command::Import { path } => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let tasks = lines::parse(&text, session.today())
                .with_context(|| format!("Failed to import {}", path.display()))?;
            let added = session.import_tasks(tasks);
            info!(added, path = %path.display(), "Imported tasks");
            format!("  Imported {added} tasks.")
        }
        Command::Export { path } => {
            let text = lines::format(session.tasks().tasks())?;
            match path {
                Some(path) => {
                    fs::write(&path, text)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    format!(
                        "  Exported {} tasks to {}.",
                        session.tasks().len(),
                        path.display()
                    )
                }
                None => text.trim_end().to_owned(),
            }
        }

        Command::Shell => bail!("Already in an interactive session"),
    };
    Ok(message)
}

fn complete_today(session: &mut Session) -> String {
    let outcome = session.complete_all_due_today();
    let mut report = vec![format!(
        "  Completed {} tasks due today. Enter 'uncheck' or 'uc' to restore them one by one.",
        outcome.completed.len()
    )];
    for (task, err) in &outcome.failed {
        report.push(format!("  Skipped '{}': {err}", task.description));
    }
    report.join("\n")
}

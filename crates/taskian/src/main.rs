//! CLI entry point for taskian.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use taskian_app::{AppConfig, SessionService, local_today};
use taskian_core::Recurrence;
use taskian_store::JsonStore;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

use commands::{CompleteTarget, DayArg, Selector};
use render::{Renderer, View};

mod commands;
mod render;
mod shell;

/// Dated tasks, recurring chores, and long-running goals in the terminal.
#[derive(Parser, Debug)]
#[command(
    name = "taskian",
    version,
    about = "taskian: a terminal task and goal tracker with undo and recurring tasks"
)]
struct Cli {
    /// Configuration file (defaults to <config dir>/taskian/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data file, overriding the configured one.
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Show tasks and goals. Without a view, shows overdue, today and tomorrow.
    Ls {
        #[arg(value_enum)]
        view: Option<View>,
    },

    /// Add a task.
    #[command(visible_alias = "a")]
    Add {
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
        /// Due date: YYYY-MM-DD, `t` for today, `tm` for tomorrow.
        #[arg(short, long)]
        due: Option<DayArg>,
        /// Repeat rule: a day count or weekdays such as `mon,thu`.
        #[arg(short, long)]
        repeat: Option<Recurrence>,
    },

    /// Add a goal.
    #[command(visible_alias = "ag")]
    AddGoal {
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
        #[arg(short, long)]
        target: Option<String>,
        #[arg(short, long, allow_negative_numbers = true)]
        percent: Option<i64>,
    },

    /// Delete a task, or every task with `all`.
    #[command(visible_alias = "rm")]
    Remove { target: Selector },

    /// Delete a goal, or every goal with `all`.
    #[command(visible_alias = "rmg")]
    RemoveGoal { target: Selector },

    /// Complete a task, or everything due today with `today`.
    #[command(visible_alias = "c")]
    Complete { target: CompleteTarget },

    /// Complete a goal.
    #[command(visible_alias = "cg")]
    CompleteGoal { position: usize },

    /// Replace a task's description.
    #[command(visible_aliases = ["e", "ed"])]
    Edit {
        position: usize,
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
    },

    /// Replace a goal's description.
    #[command(visible_alias = "eg")]
    EditGoal {
        position: usize,
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
    },

    /// Move a task to another day.
    #[command(visible_alias = "cd")]
    ChangeDate { position: usize, date: DayArg },

    /// Set a goal's target. No text clears it.
    #[command(visible_alias = "ct")]
    ChangeTarget {
        position: usize,
        target: Vec<String>,
    },

    /// Set a goal's progress in percent.
    #[command(visible_alias = "sp")]
    SetPercent {
        position: usize,
        #[arg(allow_negative_numbers = true)]
        percent: i64,
    },

    /// Make a task repeat.
    #[command(visible_alias = "ar")]
    AddRepeat { position: usize, rule: Recurrence },

    /// Stop a task from repeating.
    #[command(visible_alias = "rr")]
    RemoveRepeat { position: usize },

    /// Add a subtask to a task.
    #[command(visible_alias = "s")]
    Subtask {
        position: usize,
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
    },

    /// Check off a subtask.
    #[command(visible_alias = "cs")]
    CompSubtask { position: usize, subtask: usize },

    /// Reopen a checked-off subtask.
    #[command(visible_alias = "ucs")]
    UncheckSubtask { position: usize, subtask: usize },

    /// Delete a subtask.
    #[command(visible_alias = "rs")]
    RemoveSubtask { position: usize, subtask: usize },

    /// Replace a subtask's description.
    #[command(visible_alias = "es")]
    EditSubtask {
        position: usize,
        subtask: usize,
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
    },

    /// Restore the most recently deleted task.
    #[command(visible_alias = "u")]
    Undo,

    /// Restore the most recently completed task.
    #[command(visible_alias = "uc")]
    Uncheck,

    /// Restore the most recently deleted goal.
    #[command(visible_alias = "ug")]
    UndoGoal,

    /// Restore the most recently completed goal.
    #[command(visible_alias = "ucg")]
    UncheckGoal,

    /// Add tasks from a `description|YYYY-MM-DD|repeat|subtasks` file.
    Import { path: PathBuf },

    /// Write tasks as `description|YYYY-MM-DD|repeat|subtasks` lines.
    Export {
        /// Output file; standard output when omitted.
        path: Option<PathBuf>,
    },

    /// Start an interactive session.
    Shell,
}

impl Command {
    /// Whether the command changes session state and must be saved.
    const fn is_mutating(&self) -> bool {
        !matches!(self, Self::Ls { .. } | Self::Export { .. } | Self::Shell)
    }
}

fn main() -> Result<()> {
    let Cli { config, data, cmd } = Cli::parse();
    install_tracing();

    let config = AppConfig::load(config.as_deref())?;
    let data_path = match data {
        Some(path) => path,
        None => config.data_path()?,
    };
    let mut service = SessionService::open(JsonStore::new(data_path), local_today(), &config)?;
    let renderer = Renderer::new(config.display);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cmd.unwrap_or(Command::Ls { view: None }) {
        Command::Shell => shell::run(&mut service, &renderer, io::stdin().lock(), &mut out)?,
        other => commands::run(other, &mut service, &renderer, &mut out)?,
    }
    out.flush()?;
    Ok(())
}

fn install_tracing() {
    // RUST_LOG overrides; command output stays clean by default.
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Weekday;
    use time::macros::date;

    #[test]
    fn parse_add_with_flags() {
        let cli = Cli::parse_from([
            "taskian", "a", "buy", "milk", "--due", "2024-05-01", "--repeat", "mon,thu",
        ]);

        match cli.cmd {
            Some(Command::Add {
                description,
                due,
                repeat,
            }) => {
                assert_eq!(description, vec!["buy", "milk"]);
                assert_eq!(due, Some(DayArg::On(date!(2024 - 05 - 01))));
                assert_eq!(
                    repeat,
                    Some(Recurrence::WeekdayCycle(vec![Weekday::Monday, Weekday::Thursday]))
                );
            }
            other => panic!("expected add command, got {other:?}"),
        }
    }

    #[test]
    fn parse_aliases() {
        let cases: [(&[&str], Command); 8] = [
            (&["taskian", "rm", "all"], Command::Remove {
                target: Selector::All,
            }),
            (&["taskian", "c", "today"], Command::Complete {
                target: CompleteTarget::Today,
            }),
            (&["taskian", "cd", "2", "tm"], Command::ChangeDate {
                position: 2,
                date: DayArg::Tomorrow,
            }),
            (&["taskian", "ucs", "1", "3"], Command::UncheckSubtask {
                position: 1,
                subtask: 3,
            }),
            (&["taskian", "ucg"], Command::UncheckGoal),
            (&["taskian", "rmg", "a"], Command::RemoveGoal {
                target: Selector::All,
            }),
            (&["taskian", "ed", "1", "new", "text"], Command::Edit {
                position: 1,
                description: vec!["new".into(), "text".into()],
            }),
            (&["taskian", "ls", "at"], Command::Ls {
                view: Some(View::AllTasks),
            }),
        ];
        for (args, expected) in cases {
            let cli = Cli::parse_from(args.iter().copied());
            assert_eq!(cli.cmd, Some(expected));
        }
    }

    #[test]
    fn parse_global_data_flag_after_subcommand() {
        let cli = Cli::parse_from(["taskian", "ls", "--data", "/tmp/tasks.json"]);
        assert_eq!(cli.data, Some(PathBuf::from("/tmp/tasks.json")));
        assert_eq!(cli.cmd, Some(Command::Ls { view: None }));
    }

    #[test]
    fn negative_percent_reaches_validation() {
        let cli = Cli::parse_from(["taskian", "sp", "1", "-5"]);
        assert_eq!(
            cli.cmd,
            Some(Command::SetPercent {
                position: 1,
                percent: -5,
            })
        );
    }

    #[test]
    fn invalid_repeat_rule_is_rejected() {
        assert!(Cli::try_parse_from(["taskian", "ar", "1", "0"]).is_err());
        assert!(Cli::try_parse_from(["taskian", "ar", "1", "mon,mon"]).is_err());
        assert!(Cli::try_parse_from(["taskian", "rm", "first"]).is_err());
    }

    #[test]
    fn read_only_commands_are_not_saved() {
        assert!(!Command::Ls { view: None }.is_mutating());
        assert!(!Command::Export { path: None }.is_mutating());
        assert!(Command::Undo.is_mutating());
    }
}

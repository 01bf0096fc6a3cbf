//! Interactive line-oriented session.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use taskian_app::{SessionService, StateStore};
use tracing::debug;

use crate::Command;
use crate::commands;
use crate::render::Renderer;

const PROMPT: &str = "taskian> ";

/// One line typed at the prompt, parsed with the same grammar as the CLI.
#[derive(Parser, Debug)]
#[command(name = "taskian", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    cmd: Command,
}

enum Flow {
    Continue,
    Quit,
}

/// Read commands from `input` until it ends or the user quits.
///
/// Every state-changing command is saved immediately and followed by the
/// smart display. Failed commands are reported and the loop carries on.
pub fn run<S: StateStore>(
    service: &mut SessionService<S>,
    renderer: &Renderer,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    writeln!(out, "{}", renderer.smart(service.session()))?;
    prompt(out)?;
    for line in input.lines() {
        let line = line.context("Failed to read input")?;
        match step(&line, service, renderer, out) {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(err) => writeln!(out, "  {err:#}")?,
        }
        prompt(out)?;
    }
    writeln!(out)?;
    Ok(())
}

fn step<S: StateStore>(
    line: &str,
    service: &mut SessionService<S>,
    renderer: &Renderer,
    out: &mut impl Write,
) -> Result<Flow> {
    let words = shell_words::split(line).map_err(|err| anyhow!("Cannot parse input: {err}"))?;
    let Some(first) = words.first() else {
        return Ok(Flow::Continue);
    };
    if matches!(first.as_str(), "q" | "quit" | "exit") {
        return Ok(Flow::Quit);
    }

    let command = match ShellLine::try_parse_from(&words) {
        Ok(parsed) => parsed.cmd,
        Err(err) => {
            // Covers `help` as well as usage errors.
            write!(out, "{}", err.render())?;
            return Ok(Flow::Continue);
        }
    };
    debug!(?command, "Shell command");
    if matches!(command, Command::Shell) {
        writeln!(out, "  Already in the shell.")?;
        return Ok(Flow::Continue);
    }

    let mutating = command.is_mutating();
    commands::run(command, service, renderer, out)?;
    if mutating {
        writeln!(out, "{}", renderer.smart(service.session()))?;
    }
    Ok(Flow::Continue)
}

fn prompt(out: &mut impl Write) -> Result<()> {
    write!(out, "{PROMPT}")?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io::Cursor;
    use taskian_app::{AppConfig, DisplayConfig};
    use taskian_store::SessionState;
    use time::macros::date;

    #[derive(Default)]
    struct MemoryStore {
        state: RefCell<SessionState>,
        saves: RefCell<usize>,
    }

    impl StateStore for MemoryStore {
        type Error = std::convert::Infallible;

        fn load_state(&self) -> Result<SessionState, Self::Error> {
            Ok(self.state.borrow().clone())
        }

        fn save_state(&self, state: &SessionState) -> Result<(), Self::Error> {
            *self.state.borrow_mut() = state.clone();
            *self.saves.borrow_mut() += 1;
            Ok(())
        }
    }

    fn run_script(script: &str) -> Result<(String, SessionService<MemoryStore>)> {
        let mut service = SessionService::open(
            MemoryStore::default(),
            date!(2024 - 07 - 01),
            &AppConfig::default(),
        )?;
        let renderer = Renderer::new(DisplayConfig {
            color: false,
            strike_through: false,
        });
        let mut out = Vec::new();
        run(&mut service, &renderer, Cursor::new(script), &mut out)?;
        Ok((String::from_utf8(out)?, service))
    }

    #[test]
    fn quoted_words_and_saves_per_mutation() -> Result<()> {
        let script = "a \"water the plants\" -r 3\ns 1 fetch can\ncs 1 1\nls\nq\nls goals\n";
        let (output, service) = run_script(script)?;
        assert!(output.contains("1 | water the plants"));
        assert!(output.contains("1) fetch can [Done]"));
        // `ls` does not save and nothing after `q` runs.
        assert_eq!(*service.store().saves.borrow(), 3);
        assert!(!output.contains("GOALS"));
        Ok(())
    }

    #[test]
    fn errors_do_not_end_the_session() -> Result<()> {
        let (output, service) = run_script("rm 4\nnonsense\nadd still works\n")?;
        assert!(output.contains("no task at position 4 (list has 0)"));
        assert!(output.contains("unrecognized subcommand"));
        assert_eq!(service.session().tasks().len(), 1);
        Ok(())
    }

    #[test]
    fn unbalanced_quotes_are_reported() -> Result<()> {
        let (output, service) = run_script("add \"oops\nshell\n")?;
        assert!(output.contains("Cannot parse input"));
        assert!(output.contains("Already in the shell."));
        assert!(service.session().tasks().is_empty());
        Ok(())
    }
}

//! Process execution and terminal output.
//!
//! # Design goals
//!
//! - **Pass-through by default.** `borgbackup create`, `list` and `prune` write straight to the
//!   wrapper's stdout/stderr; operators see borg's own progress and stats.
//! - **Captured when parsed.** `nagios-check-age` needs `borgbackup info --json` as text.  Only
//!   stdout is piped, behind a spinner drawn on stderr, so borg's warnings still reach the terminal.
//! - **Fail fast.** Any non-zero exit is an error carrying the child's status; nothing after it
//!   runs.
//! - **Testable without borg.** Actions talk to an [`Executor`], so tests can record invocations
//!   instead of spawning processes.

use std::{
    process::{Command, ExitStatus, Stdio},
    time::Duration,
};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    runner::Invocation,
};

/// Braille spinner frames, as in indicatif's default.
static SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Shell used for hooks.
const HOOK_SHELL: &str = "sh";

// ─── Executor ─────────────────────────────────────────────────────────────────

/// Runs external commands on behalf of the actions.
///
/// All calls block until the child exits.  A non-zero exit is an error.
pub trait Executor {
    /// Run with stdout and stderr inherited.
    fn run(&mut self, invocation: &Invocation) -> Result<()>;

    /// Run with stdout captured and returned as text.  stderr is inherited.
    fn capture(&mut self, invocation: &Invocation) -> Result<String>;

    /// Run a hook command line through the shell.
    fn run_hook(&mut self, hook: &str) -> Result<()>;
}

/// [`Executor`] backed by real child processes.
#[derive(Debug, Default)]
pub struct SystemExecutor;

impl SystemExecutor {
    fn command(invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).envs(&invocation.env);
        cmd
    }
}

impl Executor for SystemExecutor {
    fn run(&mut self, invocation: &Invocation) -> Result<()> {
        info!("running {}", invocation.display());

        let status = Self::command(invocation)
            .status()
            .map_err(|source| Error::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        check_status(status, || invocation.display())
    }

    fn capture(&mut self, invocation: &Invocation) -> Result<String> {
        info!("running {} (capturing stdout)", invocation.display());

        let spinner = make_spinner(&invocation.display());
        let output = Self::command(invocation)
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output();
        spinner.finish_and_clear();

        let output = output.map_err(|source| Error::Spawn {
            program: invocation.program.clone(),
            source,
        })?;
        check_status(output.status, || invocation.display())?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("captured {} bytes of stdout", stdout.len());
        Ok(stdout)
    }

    fn run_hook(&mut self, hook: &str) -> Result<()> {
        info!("running hook: {hook}");

        let status = Command::new(HOOK_SHELL)
            .arg("-c")
            .arg(hook)
            .status()
            .map_err(|source| Error::Spawn {
                program: HOOK_SHELL.into(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Hook {
                hook: hook.to_string(),
                code: exit_code(status),
            })
        }
    }
}

fn check_status(status: ExitStatus, command: impl FnOnce() -> String) -> Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(Error::ExternalCommand {
            command: command(),
            code: exit_code(status),
        })
    }
}

/// The child's exit code, or `1` when it was killed by a signal.
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

// ─── Spinner ──────────────────────────────────────────────────────────────────

/// Create and start an indeterminate spinner for `label`.
///
/// indicatif draws to stderr and stays hidden when stderr is not a terminal,
/// so cron and Nagios runs see no spinner output at all.
fn make_spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("  {spinner:.cyan}  {msg}") {
        pb.set_style(template.tick_chars(SPINNER_CHARS));
    }
    pb.set_message(format!("{}", style(label).dim()));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

// ─── Messages ─────────────────────────────────────────────────────────────────

/// Print a fatal error (with its cause chain) to stderr.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {err:#}", style("Error:").red().bold());
}

// ─── Tests ────────────────────────────────────────────────────────────────────

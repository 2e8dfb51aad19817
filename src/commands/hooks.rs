//! `before` / `after` shell hooks.
//!
//! Hooks run one at a time, in declaration order, each through `sh -c`.  The
//! first failing hook aborts the whole run.  Under `--dry-run` nothing is
//! executed; each hook is announced on stdout instead.

use tracing::debug;

use crate::{error::Result, ui::Executor};

/// Which hook list is being run.  Only used for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Before,
    After,
}

impl Phase {
    const fn label(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

pub fn run_hooks(
    phase: Phase,
    hooks: &[String],
    dry_run: bool,
    exec: &mut dyn Executor,
) -> Result<()> {
    debug!("{} hooks: {}", phase.label(), hooks.len());

    for hook in hooks {
        if dry_run {
            println!("{}", dry_run_message(hook));
        } else {
            exec.run_hook(hook)?;
        }
    }
    Ok(())
}

/// Stand-in line printed for a hook skipped by `--dry-run`.
pub fn dry_run_message(hook: &str) -> String {
    format!("Not running hook \"{hook}\" as dry run is enabled.")
}

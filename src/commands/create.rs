//! `borgwrap create`: the backup sequence.
//!
//! # Sequence
//!
//! | # | Step          | Skipped by    |
//! |---|---------------|---------------|
//! | 1 | `before` hooks | `--dry-run` (announced instead) |
//! | 2 | `borgbackup create` | -        |
//! | 3 | `after` hooks  | `--dry-run` (announced instead) |
//! | 4 | `borgbackup prune` | `--no-prune` |
//!
//! Steps run strictly in order and the first failure aborts the rest.  Side
//! effects of steps that already ran are left as they are.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    commands::{
        hooks::{self, Phase},
        prune,
    },
    config::Config,
    error::Result,
    runner::{CREATE_FLAGS, Invocation, borg_invocation, build_flags},
    ui::Executor,
};

pub fn run(cfg: &Config, dry_run: bool, no_prune: bool, exec: &mut dyn Executor) -> Result<()> {
    // Surface config errors before any hook has a chance to run.
    cfg.remote.require_prefix()?;
    build_create_flags(cfg, dry_run)?;
    let prune_invocation = if no_prune {
        None
    } else {
        Some(prune::build_prune_invocation(cfg, dry_run)?)
    };

    hooks::run_hooks(Phase::Before, &cfg.hooks.before, dry_run, exec)?;

    exec.run(&build_create_invocation(cfg, dry_run, Utc::now())?)?;

    hooks::run_hooks(Phase::After, &cfg.hooks.after, dry_run, exec)?;

    match prune_invocation {
        Some(invocation) => exec.run(&invocation)?,
        None => info!("skipping prune (--no-prune)"),
    }
    Ok(())
}

/// Flags for `borgbackup create`, before the archive argument.
pub fn build_create_flags(cfg: &Config, dry_run: bool) -> Result<Vec<String>> {
    let mut flags = build_flags(cfg, CREATE_FLAGS)?;
    if dry_run {
        flags.push("--dry-run".into());
    }
    Ok(flags)
}

/// `borgbackup create … <repository>::<prefix>-<now> <sources…>`.
pub fn build_create_invocation(
    cfg: &Config,
    dry_run: bool,
    now: DateTime<Utc>,
) -> Result<Invocation> {
    borg_invocation(
        "create",
        cfg,
        Some(now),
        build_create_flags(cfg, dry_run)?,
        cfg.location.source.to_vec(),
    )
}

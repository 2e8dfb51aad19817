//! `borgwrap prune`: apply the retention policy.
//!
//! ```text
//! borgbackup prune --stats --list --prefix <prefix> [--dry-run] [--keep-* <n>…] <repository>
//! ```
//!
//! Retention values are forwarded untouched, in the order last, within,
//! hourly, daily, weekly, monthly, yearly.  A config with no `retention` keys
//! produces a prune with no `--keep-*` flag at all; what that does is up to
//! borg.

use crate::{
    config::Config,
    error::Result,
    runner::{Invocation, RETENTION_FLAGS, borg_invocation, build_flags},
    ui::Executor,
};

pub fn run(cfg: &Config, dry_run: bool, exec: &mut dyn Executor) -> Result<()> {
    exec.run(&build_prune_invocation(cfg, dry_run)?)
}

/// Flags for `borgbackup prune`, before the repository argument.
pub fn build_prune_flags(cfg: &Config, dry_run: bool) -> Result<Vec<String>> {
    let mut flags: Vec<String> = vec![
        "--stats".into(),
        "--list".into(),
        "--prefix".into(),
        cfg.remote.require_prefix()?.to_string(),
    ];
    if dry_run {
        flags.push("--dry-run".into());
    }
    flags.extend(build_flags(cfg, RETENTION_FLAGS)?);
    Ok(flags)
}

pub fn build_prune_invocation(cfg: &Config, dry_run: bool) -> Result<Invocation> {
    borg_invocation("prune", cfg, None, build_prune_flags(cfg, dry_run)?, vec![])
}

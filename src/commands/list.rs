//! `borgwrap list`: list the repository's archives.
//!
//! Output streams straight from `borgbackup list`.  `--dry-run` has no effect
//! here.

use crate::{
    config::Config,
    error::Result,
    runner::{Invocation, borg_invocation},
    ui::Executor,
};

pub fn run(cfg: &Config, exec: &mut dyn Executor) -> Result<()> {
    exec.run(&build_list_invocation(cfg)?)
}

pub fn build_list_invocation(cfg: &Config) -> Result<Invocation> {
    borg_invocation("list", cfg, None, vec![], vec![])
}

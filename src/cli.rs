//! Command-line interface definition.
//!
//! All argument parsing lives here so the rest of the codebase can stay
//! agnostic to `clap`.  The `Cli` struct is parsed once in `main` and then
//! passed (by reference) into the action handlers.

use std::path::PathBuf;

use clap::Parser;

/// Top-level CLI arguments, shared across every subcommand.
#[derive(Parser, Debug)]
#[command(
    name    = "borgwrap",
    about   = "A borgbackup wrapper driven by a YAML config",
    version,
    // Show a compact two-column help layout.
    help_template = "\
{before-help}{name} {version}
{about}

{usage-heading} {usage}

{all-args}{after-help}"
)]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long)]
    pub config: PathBuf,

    /// Show what would happen without changing the repository.
    ///
    /// Hooks are announced instead of run, and `--dry-run` is passed to
    /// `borgbackup create` and `borgbackup prune`.  `list` and
    /// `nagios-check-age` are unaffected.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Increase log verbosity (`-v` info, `-vv` debug).  `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Action to run.
    #[command(subcommand)]
    pub command: Subcommand,
}

#[derive(clap::Subcommand, Debug, PartialEq, Eq)]
pub enum Subcommand {
    /// Run `before` hooks, create an archive, run `after` hooks, then prune.
    Create {
        /// Skip the prune step after creating the archive.
        #[arg(long)]
        no_prune: bool,
    },

    /// List archives in the repository.
    List,

    /// Delete archives not matched by the retention policy.
    Prune,

    /// Nagios-style check that the latest archive is recent and large enough.
    ///
    /// Exits 0 and prints `BORGBACKUP OK` when both checks pass; exits 1 with
    /// a `BORGBACKUP WARNING` otherwise.
    #[command(name = "nagios-check-age")]
    NagiosCheckAge {
        /// Maximum age of the latest archive, in hours.
        #[arg(long)]
        max_age: u64,

        /// Minimum original size of the latest archive, in MiB.
        #[arg(long)]
        min_size: Option<u64>,
    },
}

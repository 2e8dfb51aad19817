//! `borgwrap`: a borgbackup wrapper driven by a YAML config.
//!
//! # Overview
//!
//! This binary is a thin orchestration layer around
//! [`borgbackup`](https://www.borgbackup.org).  It turns one YAML file into
//! the right `borgbackup` command lines, runs user hooks around archive
//! creation, and doubles as a Nagios probe for the latest archive.
//!
//! # Usage
//!
//! ```text
//! borgwrap -c borg.yaml create              # hooks, create, hooks, prune
//! borgwrap -c borg.yaml create --no-prune   # skip prune
//! borgwrap -c borg.yaml -n create           # dry run
//! borgwrap -c borg.yaml list
//! borgwrap -c borg.yaml prune
//! borgwrap -c borg.yaml nagios-check-age --max-age 26 --min-size 100
//! ```
//!
//! # Module layout
//!
//! | Module                   | Responsibility                              |
//! |--------------------------|---------------------------------------------|
//! | [`cli`]                  | Argument types parsed by clap               |
//! | [`config`]               | `Config` struct + YAML loader               |
//! | [`error`]                | Error enum and exit-code mapping            |
//! | [`runner`]               | Argument construction, flag tables          |
//! | [`ui`]                   | Process execution, spinner, error output    |
//! | [`commands`]             | One handler per action                      |

mod cli;
mod commands;
mod config;
mod error;
mod runner;
mod ui;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Subcommand};
use commands::check_age::Thresholds;
use tracing_subscriber::EnvFilter;
use ui::SystemExecutor;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            ui::print_error(&err);
            let code = err
                .downcast_ref::<error::Error>()
                .map_or(1, error::Error::exit_code);
            ExitCode::from(code)
        },
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let cfg = config::load_config(&cli.config)?;
    let mut exec = SystemExecutor;

    match &cli.command {
        // ── borgwrap create ───────────────────────────────────────────────────
        Subcommand::Create { no_prune } => {
            commands::create::run(&cfg, cli.dry_run, *no_prune, &mut exec)
                .context("create failed")?;
        },

        // ── borgwrap list ─────────────────────────────────────────────────────
        Subcommand::List => {
            commands::list::run(&cfg, &mut exec).context("list failed")?;
        },

        // ── borgwrap prune ────────────────────────────────────────────────────
        Subcommand::Prune => {
            commands::prune::run(&cfg, cli.dry_run, &mut exec).context("prune failed")?;
        },

        // ── borgwrap nagios-check-age ─────────────────────────────────────────
        Subcommand::NagiosCheckAge { max_age, min_size } => {
            let thresholds = Thresholds::from_cli(*max_age, *min_size);
            let outcome = commands::check_age::run(&cfg, &thresholds, &mut exec)
                .context("nagios-check-age failed")?;
            println!("{outcome}");
            return Ok(ExitCode::from(outcome.exit_status()));
        },
    }

    Ok(ExitCode::SUCCESS)
}

/// Log to stderr so stdout stays reserved for borg's output and probe status.
///
/// `RUST_LOG` wins; otherwise `-v` picks the level for this crate.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("borgwrap={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

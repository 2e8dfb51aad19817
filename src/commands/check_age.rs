//! `borgwrap nagios-check-age`: monitoring probe for the latest archive.
//!
//! Runs `borgbackup info --last 1 --json <repository>` and checks the newest
//! archive against two thresholds:
//!
//! 1. its start time must be no older than `--max-age` hours;
//! 2. its original size must be at least `--min-size` MiB, when given.
//!
//! The result is reported Nagios-style: exit code plus one status text on
//! stdout.
//!
//! | Outcome    | Exit | stdout                                         |
//! |------------|------|------------------------------------------------|
//! | OK         | 0    | `BORGBACKUP OK`                                |
//! | too old    | 1    | `BORGBACKUP WARNING: last backup too old`, blank line, start time |
//! | too small  | 1    | `BORGBACKUP WARNING: last backup too small`, blank line, `<size>B < <min>B` |
//! | no archive | 1    | `BORGBACKUP WARNING: no backup found`          |
//!
//! Archive start times are borg's naive local timestamps
//! (`2024-05-01T03:00:12.345678`) and are compared with the local wall clock.

use std::fmt;

use chrono::{Local, NaiveDateTime, TimeDelta};
use serde::Deserialize;
use tracing::debug;

use crate::{
    config::Config,
    error::{Error, Result},
    runner::{INFO_LAST_ARCHIVE_FLAGS, Invocation, borg_invocation},
    ui::Executor,
};

const START_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const MIB: u64 = 1024 * 1024;

// ─── borg info --json ─────────────────────────────────────────────────────────

/// The part of `borgbackup info --json` the probe reads.
#[derive(Debug, Deserialize)]
pub struct InfoReport {
    pub archives: Vec<ArchiveInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ArchiveInfo {
    pub start: String,
    pub stats: ArchiveStats,
}

#[derive(Debug, Deserialize)]
pub struct ArchiveStats {
    /// Bytes before compression and deduplication.
    pub original_size: u64,
}

// ─── Thresholds ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// `None` when the requested age does not fit a `TimeDelta`; such an age
    /// can never be exceeded.
    pub max_age: Option<TimeDelta>,
    /// Minimum size in bytes.
    pub min_size: Option<u64>,
}

impl Thresholds {
    /// Build from the CLI units: hours and MiB.  A minimum of `0` disables the
    /// size check.
    pub fn from_cli(max_age_hours: u64, min_size_mib: Option<u64>) -> Self {
        Self {
            max_age: i64::try_from(max_age_hours)
                .ok()
                .and_then(TimeDelta::try_hours),
            min_size: min_size_mib
                .filter(|mib| *mib > 0)
                .map(|mib| mib.saturating_mul(MIB)),
        }
    }
}

// ─── Outcome ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Ok,
    TooOld { start: String },
    TooSmall { size: u64, min_size: u64 },
    NoArchives,
}

impl ProbeOutcome {
    /// Nagios status: `0` OK, `1` WARNING.
    pub const fn exit_status(&self) -> u8 {
        match self {
            Self::Ok => 0,
            _ => 1,
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "BORGBACKUP OK"),
            Self::TooOld { start } => {
                write!(f, "BORGBACKUP WARNING: last backup too old\n\n{start}")
            },
            Self::TooSmall { size, min_size } => write!(
                f,
                "BORGBACKUP WARNING: last backup too small\n\n{size}B < {min_size}B"
            ),
            Self::NoArchives => write!(f, "BORGBACKUP WARNING: no backup found"),
        }
    }
}

// ─── Probe ────────────────────────────────────────────────────────────────────

pub fn run(
    cfg: &Config,
    thresholds: &Thresholds,
    exec: &mut dyn Executor,
) -> Result<ProbeOutcome> {
    let stdout = exec.capture(&build_info_invocation(cfg)?)?;
    let report: InfoReport = serde_json::from_str(&stdout)?;
    evaluate(&report, thresholds, Local::now().naive_local())
}

pub fn build_info_invocation(cfg: &Config) -> Result<Invocation> {
    let flags = INFO_LAST_ARCHIVE_FLAGS
        .iter()
        .map(|f| (*f).to_string())
        .collect();
    borg_invocation("info", cfg, None, flags, vec![])
}

/// Check the newest archive in `report` against `thresholds` at `now`.
///
/// Age is checked first; only the first violation is reported.
pub fn evaluate(
    report: &InfoReport,
    thresholds: &Thresholds,
    now: NaiveDateTime,
) -> Result<ProbeOutcome> {
    let Some(last) = report.archives.first() else {
        return Ok(ProbeOutcome::NoArchives);
    };

    let start = NaiveDateTime::parse_from_str(&last.start, START_FORMAT).map_err(|source| {
        Error::Timestamp {
            value: last.start.clone(),
            source,
        }
    })?;
    let age = now.signed_duration_since(start);
    debug!(
        "last archive started {} ({}s ago), original size {}B",
        last.start,
        age.num_seconds(),
        last.stats.original_size
    );

    if thresholds.max_age.is_some_and(|max| age > max) {
        return Ok(ProbeOutcome::TooOld {
            start: last.start.clone(),
        });
    }

    match thresholds.min_size {
        Some(min_size) if last.stats.original_size < min_size => Ok(ProbeOutcome::TooSmall {
            size: last.stats.original_size,
            min_size,
        }),
        _ => Ok(ProbeOutcome::Ok),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

//! Configuration types and loading logic.
//!
//! `Config` is a direct mapping of the YAML file passed via `--config`.  The
//! `remote` and `location` sections are required; `retention` and `hooks` may
//! be omitted entirely.
//!
//! # File format
//!
//! ```yaml
//! remote:
//!   repository: ssh://backup@nas/./borg
//!   prefix: laptop
//!   compression: lz4            # optional
//!   rsh: ssh -i /root/.ssh/borg # optional, exported as BORG_RSH
//!
//! location:
//!   source: [/etc, /home]       # a single string is fine too
//!   one_file_system: yes
//!   exclude_caches: true
//!   exclude_if_present: [.nobackup]
//!   exclude: ["*.tmp", "/home/*/.cache"]
//!
//! retention:
//!   keep_within: 2d
//!   keep_daily: 7
//!   keep_weekly: 4
//!
//! hooks:
//!   before: ["pg_dumpall > /var/backups/pg.sql"]
//!   after:  ["rm /var/backups/pg.sql"]
//! ```
//!
//! Switches, compression, retention values and exclude lists are kept as raw
//! [`serde_yaml::Value`]s: operators write `yes`, `true`, `1`, `7` or `2d`
//! interchangeably, and [`crate::runner`] decides how each one turns into a
//! flag.

use std::path::Path;

use serde::Deserialize;
use serde_yaml::Value;
use tracing::debug;

use crate::error::{Error, Result};

// ─── Top-level ────────────────────────────────────────────────────────────────

/// Root configuration object, deserialised from the YAML file.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Repository location and transport settings.
    pub remote: RemoteConfig,

    /// What to back up and what to leave out.
    pub location: LocationConfig,

    /// Archive retention policy applied by `prune`.
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Shell commands run around `create`.
    #[serde(default)]
    pub hooks: HooksConfig,
}

// ─── remote ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RemoteConfig {
    /// Anything `borgbackup` accepts as a repository, e.g. `/srv/borg` or
    /// `ssh://user@host/./repo`.
    pub repository: String,

    /// Archive name prefix.  Archives are named `<prefix>-<UTC timestamp>` and
    /// `prune` only considers archives carrying this prefix.
    #[serde(default)]
    pub prefix: Option<String>,

    /// Passed verbatim to `--compression`.
    #[serde(default)]
    pub compression: Option<Value>,

    /// Remote shell command, exported to `borgbackup` as `BORG_RSH`.
    #[serde(default)]
    pub rsh: Option<String>,
}

impl RemoteConfig {
    /// The archive prefix, for actions that cannot run without one.
    pub fn require_prefix(&self) -> Result<&str> {
        self.prefix
            .as_deref()
            .ok_or(Error::MissingKey("remote.prefix"))
    }
}

// ─── location ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LocationConfig {
    /// One path or a list of paths to archive.
    pub source: Sources,

    #[serde(default)]
    pub one_file_system: Option<Value>,

    #[serde(default)]
    pub exclude_caches: Option<Value>,

    /// Marker file names; directories containing one are skipped.
    #[serde(default)]
    pub exclude_if_present: Option<Value>,

    /// borg exclude patterns, applied in order.
    #[serde(default)]
    pub exclude: Option<Value>,
}

/// `location.source` accepts either a single path or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Sources {
    One(String),
    Many(Vec<String>),
}

impl Sources {
    /// The source paths in declaration order.
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(path) => vec![path.clone()],
            Self::Many(paths) => paths.clone(),
        }
    }
}

// ─── retention ────────────────────────────────────────────────────────────────

/// `--keep-*` values for `borgbackup prune`.
///
/// Each value is forwarded as-is, so `keep_within: 2d` and `keep_daily: 7`
/// both work.  Keys that are absent produce no flag at all.
#[derive(Debug, Default, Deserialize)]
pub struct RetentionConfig {
    #[serde(default)]
    pub keep_last: Option<Value>,
    #[serde(default)]
    pub keep_within: Option<Value>,
    #[serde(default)]
    pub keep_hourly: Option<Value>,
    #[serde(default)]
    pub keep_daily: Option<Value>,
    #[serde(default)]
    pub keep_weekly: Option<Value>,
    #[serde(default)]
    pub keep_monthly: Option<Value>,
    #[serde(default)]
    pub keep_yearly: Option<Value>,
}

// ─── hooks ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct HooksConfig {
    /// Run through `sh -c` before `create`, in order.
    #[serde(default)]
    pub before: Vec<String>,

    /// Run through `sh -c` after `create` and before `prune`, in order.
    #[serde(default)]
    pub after: Vec<String>,
}

// ─── Loader ───────────────────────────────────────────────────────────────────

/// Read and parse a `Config` from `path`.
///
/// Unlike a missing optional section, a missing or unparsable file is fatal:
/// nothing has run yet, so the caller aborts before touching the repository.
pub fn load_config(path: &Path) -> Result<Config> {
    debug!("loading config from {}", path.display());

    let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    serde_yaml::from_str(&text).map_err(|source| Error::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

// ─── Tests ────────────────────────────────────────────────────────────────────

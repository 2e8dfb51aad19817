//! Error taxonomy shared by every module.
//!
//! Three families matter to the operator:
//!
//! - **Config**: the YAML file is missing, malformed, or lacks a key an action needs.  Raised before
//!   any hook or `borgbackup` process has been started.
//! - **External command**: `borgbackup` or a hook exited non-zero.  The child's exit code is carried
//!   so `main` can exit with it.
//! - **Probe input**: `borgbackup info --json` produced something `nagios-check-age` cannot
//!   interpret.
//!
//! A threshold breach in `nagios-check-age` is *not* an error; it is a
//! [`crate::commands::check_age::ProbeOutcome`].

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("reading config {}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parsing config {}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("missing required config key `{0}`")]
    MissingKey(&'static str),

    #[error("config key `{key}` must be a scalar value")]
    InvalidValue { key: &'static str },

    #[error("failed to spawn `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with status {code}")]
    ExternalCommand { command: String, code: i32 },

    #[error("hook `{hook}` exited with status {code}")]
    Hook { hook: String, code: i32 },

    #[error("could not parse `borgbackup info` output")]
    InfoOutput(#[from] serde_json::Error),

    #[error("invalid archive start timestamp `{value}`")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Process exit code for this error.
    ///
    /// Tool and hook failures hand the child's own status back to the caller
    /// (cron, a Nagios host, a shell script).  Statuses that do not fit a
    /// process exit code, and every other error, map to `1`.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ExternalCommand { code, .. } | Self::Hook { code, .. } => {
                u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(1)
            },
            _ => 1,
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

//! Command argument construction helpers.
//!
//! This module is responsible for *building* the `borgbackup` command lines.
//! It deliberately does **not** execute anything; process execution lives in
//! [`crate::ui`] behind the [`crate::ui::Executor`] trait.  Every function
//! here is pure and unit-testable without spawning a child process.
//!
//! # Command shape
//!
//! ```text
//! borgbackup <subcommand> <flags…> <repository>[::<prefix>-<YYYY-MM-DDTHH:MM:SSZ>] <trailing…>
//! ```
//!
//! # Flag tables
//!
//! Optional config keys become flags through a [`FlagRule`] table consumed
//! by [`build_flags`].  A rule names the key, the flag, how the value is
//! emitted and where to find it, so ordering and presence rules live in one
//! place instead of a chain of `if let`s per action.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_yaml::Value;

use crate::{
    config::Config,
    error::{Error, Result},
};

/// The wrapped tool.
pub const BORG: &str = "borgbackup";

/// Environment variable `borgbackup` reads its remote shell command from.
pub const BORG_RSH: &str = "BORG_RSH";

// ─── Invocation ───────────────────────────────────────────────────────────────

/// A fully-built command line plus the environment overrides it needs.
///
/// The child inherits the wrapper's environment; `env` is applied on top of
/// it for that one child only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl Invocation {
    /// Human-readable command line, used in logs and error messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Build a `borgbackup` invocation.
///
/// When `archive_time` is set the repository argument is suffixed with
/// `::<prefix>-<timestamp>`; callers pass `Utc::now()` at the moment they
/// build the command so every archive gets its own fresh name.
pub fn borg_invocation(
    subcommand: &str,
    cfg: &Config,
    archive_time: Option<DateTime<Utc>>,
    flags: Vec<String>,
    trailing: Vec<String>,
) -> Result<Invocation> {
    let target = match archive_time {
        Some(at) => format!(
            "{}::{}",
            cfg.remote.repository,
            archive_name(cfg.remote.require_prefix()?, at)
        ),
        None => cfg.remote.repository.clone(),
    };

    let mut args = Vec::with_capacity(flags.len() + trailing.len() + 2);
    args.push(subcommand.to_string());
    args.extend(flags);
    args.push(target);
    args.extend(trailing);

    Ok(Invocation {
        program: BORG.into(),
        args,
        env: borg_env(cfg),
    })
}

/// `<prefix>-<YYYY-MM-DDTHH:MM:SSZ>` in UTC.
pub fn archive_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{prefix}-{}", at.format("%Y-%m-%dT%H:%M:%SZ"))
}

/// Environment overrides for `borgbackup`: `BORG_RSH` when `remote.rsh` is set.
pub fn borg_env(cfg: &Config) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    if let Some(rsh) = &cfg.remote.rsh {
        env.insert(BORG_RSH.to_string(), rsh.clone());
    }
    env
}

// ─── Value coercion ───────────────────────────────────────────────────────────

/// Loose boolean reading of a config value.
///
/// True for `true`, the strings `yes`/`true` in any case, and the number `1`.
/// Everything else, including `"0"`, `"no"`, `2` and `null`, is false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("yes") || s.eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_i64() == Some(1) || n.as_f64() == Some(1.0),
        _ => false,
    }
}

/// Render a scalar for the command line.  `None` for `null`.
fn scalar_to_arg(key: &'static str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Tagged(tagged) => scalar_to_arg(key, &tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => Err(Error::InvalidValue { key }),
    }
}

// ─── Flag table ───────────────────────────────────────────────────────────────

/// How a present config value is turned into command-line tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    /// `<flag> <value>`.
    Value,
    /// `<flag>` alone, when the value is truthy.
    Switch,
    /// `<flag> <item>` once per list item, in order.  A scalar counts as a
    /// one-item list.
    Each,
}

/// One optional config key and the flag it produces.
pub struct FlagRule {
    /// Dotted config path, used in error messages.
    pub key: &'static str,
    pub flag: &'static str,
    pub emit: Emit,
    pub lookup: fn(&Config) -> Option<&Value>,
}

/// Flags for `borgbackup create`, in emission order.
pub const CREATE_FLAGS: &[FlagRule] = &[
    FlagRule {
        key: "remote.compression",
        flag: "--compression",
        emit: Emit::Value,
        lookup: |c| c.remote.compression.as_ref(),
    },
    FlagRule {
        key: "location.one_file_system",
        flag: "--one-file-system",
        emit: Emit::Switch,
        lookup: |c| c.location.one_file_system.as_ref(),
    },
    FlagRule {
        key: "location.exclude_caches",
        flag: "--exclude-caches",
        emit: Emit::Switch,
        lookup: |c| c.location.exclude_caches.as_ref(),
    },
    FlagRule {
        key: "location.exclude_if_present",
        flag: "--exclude-if-present",
        emit: Emit::Each,
        lookup: |c| c.location.exclude_if_present.as_ref(),
    },
    FlagRule {
        key: "location.exclude",
        flag: "--exclude",
        emit: Emit::Each,
        lookup: |c| c.location.exclude.as_ref(),
    },
];

/// `--keep-*` flags for `borgbackup prune`, in emission order.
pub const RETENTION_FLAGS: &[FlagRule] = &[
    FlagRule {
        key: "retention.keep_last",
        flag: "--keep-last",
        emit: Emit::Value,
        lookup: |c| c.retention.keep_last.as_ref(),
    },
    FlagRule {
        key: "retention.keep_within",
        flag: "--keep-within",
        emit: Emit::Value,
        lookup: |c| c.retention.keep_within.as_ref(),
    },
    FlagRule {
        key: "retention.keep_hourly",
        flag: "--keep-hourly",
        emit: Emit::Value,
        lookup: |c| c.retention.keep_hourly.as_ref(),
    },
    FlagRule {
        key: "retention.keep_daily",
        flag: "--keep-daily",
        emit: Emit::Value,
        lookup: |c| c.retention.keep_daily.as_ref(),
    },
    FlagRule {
        key: "retention.keep_weekly",
        flag: "--keep-weekly",
        emit: Emit::Value,
        lookup: |c| c.retention.keep_weekly.as_ref(),
    },
    FlagRule {
        key: "retention.keep_monthly",
        flag: "--keep-monthly",
        emit: Emit::Value,
        lookup: |c| c.retention.keep_monthly.as_ref(),
    },
    FlagRule {
        key: "retention.keep_yearly",
        flag: "--keep-yearly",
        emit: Emit::Value,
        lookup: |c| c.retention.keep_yearly.as_ref(),
    },
];

/// Flags for `borgbackup info` when probing the latest archive.
pub const INFO_LAST_ARCHIVE_FLAGS: &[&str] = &["--last", "1", "--json"];

/// Apply `rules` to `cfg` in table order.
///
/// Absent keys and `null` values contribute nothing.
pub fn build_flags(cfg: &Config, rules: &[FlagRule]) -> Result<Vec<String>> {
    let mut flags = Vec::new();

    for rule in rules {
        let Some(value) = (rule.lookup)(cfg) else {
            continue;
        };

        match rule.emit {
            Emit::Switch => {
                if is_truthy(value) {
                    flags.push(rule.flag.to_string());
                }
            },
            Emit::Value => {
                if let Some(arg) = scalar_to_arg(rule.key, value)? {
                    flags.extend([rule.flag.to_string(), arg]);
                }
            },
            Emit::Each => {
                let items = match value {
                    Value::Sequence(items) => items.as_slice(),
                    scalar => std::slice::from_ref(scalar),
                };
                for item in items {
                    if let Some(arg) = scalar_to_arg(rule.key, item)? {
                        flags.extend([rule.flag.to_string(), arg]);
                    }
                }
            },
        }
    }

    Ok(flags)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

//! Integration tests for the `borgwrap` binary.
//!
//! These tests spawn the compiled binary with a fake `borgbackup` shell
//! script first on `PATH`.  The fake appends one line per call to a log file
//! (`<args> | rsh=<BORG_RSH>`), prints a canned `info --json` document (plus
//! one warning line on stderr) when asked for `info`, and exits with `$FAKE_BORG_EXIT`.  Hooks in the test
//! configs append to the same log, so the log shows the exact sequence of
//! side effects.
//!
//! # Running
//!
//! ```sh
//! cargo test --test integration
//! ```

#![cfg(unix)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    process::Command,
};

use chrono::{Local, NaiveDateTime, TimeDelta, Utc};

const BIN: &str = env!("CARGO_BIN_EXE_borgwrap");

const FAKE_BORG: &str = r#"#!/bin/sh
printf '%s | rsh=%s\n' "$*" "${BORG_RSH-unset}" >> "$FAKE_BORG_LOG"
if [ "$1" = info ]; then
    cat "$FAKE_BORG_INFO"
    echo "fake-borg: info warning on stderr" >&2
fi
exit "${FAKE_BORG_EXIT:-0}"
"#;

// ─── Fixture ──────────────────────────────────────────────────────────────────

struct Fixture {
    root: tempfile::TempDir,
    bin_dir: PathBuf,
    log: PathBuf,
    info: PathBuf,
    config: PathBuf,
}

struct Outcome {
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl Fixture {
    /// A fixture whose config is the base remote/location sections plus `extra`.
    fn new(extra: &str) -> Self {
        let root = tempfile::tempdir().unwrap();
        let bin_dir = root.path().join("bin");
        fs::create_dir(&bin_dir).unwrap();

        let borg = bin_dir.join("borgbackup");
        fs::write(&borg, FAKE_BORG).unwrap();
        fs::set_permissions(&borg, fs::Permissions::from_mode(0o755)).unwrap();

        let config = root.path().join("borg.yaml");
        fs::write(
            &config,
            format!(
                "remote:\n  repository: /srv/borg\n  prefix: testprefix\nlocation:\n  source: [/data/a, /data/b]\n{extra}"
            ),
        )
        .unwrap();

        Self {
            log: root.path().join("calls.log"),
            info: root.path().join("info.json"),
            bin_dir,
            config,
            root,
        }
    }

    fn write_config(&self, content: &str) {
        fs::write(&self.config, content).unwrap();
    }

    fn write_info(&self, start: NaiveDateTime, original_size: u64) {
        fs::write(
            &self.info,
            format!(
                r#"{{"archives": [{{"name": "testprefix-x", "start": "{}", "stats": {{"original_size": {original_size}}}}}]}}"#,
                start.format("%Y-%m-%dT%H:%M:%S%.6f")
            ),
        )
        .unwrap();
    }

    fn run(&self, args: &[&str]) -> Outcome {
        self.run_with_exit(args, 0)
    }

    /// Run `borgwrap -c <config> <args…>` with the fake borg exiting `borg_exit`.
    fn run_with_exit(&self, args: &[&str], borg_exit: i32) -> Outcome {
        self.spawn(args, borg_exit, None)
    }

    /// Like [`Fixture::run`], with `BORG_RSH` already set in the parent.
    fn run_with_parent_rsh(&self, args: &[&str], rsh: &str) -> Outcome {
        self.spawn(args, 0, Some(rsh))
    }

    fn spawn(&self, args: &[&str], borg_exit: i32, parent_rsh: Option<&str>) -> Outcome {
        let path = format!(
            "{}:{}",
            self.bin_dir.display(),
            std::env::var("PATH").unwrap_or_default()
        );
        let mut cmd = Command::new(BIN);
        cmd.arg("--config")
            .arg(&self.config)
            .args(args)
            .current_dir(self.root.path())
            .env("PATH", path)
            .env("FAKE_BORG_LOG", &self.log)
            .env("FAKE_BORG_INFO", &self.info)
            .env("FAKE_BORG_EXIT", borg_exit.to_string())
            .env_remove("RUST_LOG");
        match parent_rsh {
            Some(rsh) => cmd.env("BORG_RSH", rsh),
            None => cmd.env_remove("BORG_RSH"),
        };
        let out = cmd
            .output()
            .unwrap_or_else(|e| panic!("failed to spawn {BIN}: {e}"));

        Outcome {
            code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        }
    }

    /// Logged lines, in call order.  Empty if nothing ran.
    fn calls(&self) -> Vec<String> {
        read_lines(&self.log)
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

// ─── --help / argument errors ─────────────────────────────────────────────────

#[test]
fn help_exits_zero() {
    let out = Command::new(BIN).arg("--help").output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("nagios-check-age"));
}

#[test]
fn missing_config_flag_is_usage_error() {
    let out = Command::new(BIN).arg("list").output().unwrap();
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn missing_subcommand_is_usage_error() {
    let fx = Fixture::new("");
    let out = fx.run(&[]);
    assert_eq!(out.code, Some(2));
    assert!(fx.calls().is_empty());
}

// ─── config errors ────────────────────────────────────────────────────────────

#[test]
fn missing_config_file_fails_before_running_anything() {
    let fx = Fixture::new("");
    fs::remove_file(&fx.config).unwrap();

    let out = fx.run(&["list"]);
    assert_eq!(out.code, Some(1));
    assert!(out.stderr.contains("reading config"), "stderr: {}", out.stderr);
    assert!(fx.calls().is_empty());
}

#[test]
fn malformed_config_fails_before_running_anything() {
    let fx = Fixture::new("");
    fx.write_config("remote: [unterminated\n");

    let out = fx.run(&["create"]);
    assert_eq!(out.code, Some(1));
    assert!(out.stderr.contains("parsing config"), "stderr: {}", out.stderr);
    assert!(fx.calls().is_empty());
}

#[test]
fn missing_prefix_fails_before_hooks() {
    let fx = Fixture::new("");
    fx.write_config(
        "remote:\n  repository: /srv/borg\nlocation:\n  source: /data\nhooks:\n  before: [\"echo hook >> \\\"$FAKE_BORG_LOG\\\"\"]\n",
    );

    let out = fx.run(&["create"]);
    assert_eq!(out.code, Some(1));
    assert!(out.stderr.contains("remote.prefix"), "stderr: {}", out.stderr);
    assert!(fx.calls().is_empty());
}

// ─── list / prune ─────────────────────────────────────────────────────────────

#[test]
fn list_runs_bare_list() {
    let fx = Fixture::new("");
    let out = fx.run(&["list"]);
    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);
    assert_eq!(fx.calls(), vec!["list /srv/borg | rsh=unset"]);
}

#[test]
fn list_ignores_dry_run() {
    let fx = Fixture::new("");
    fx.run(&["--dry-run", "list"]);
    assert_eq!(fx.calls(), vec!["list /srv/borg | rsh=unset"]);
}

#[test]
fn prune_passes_retention_in_fixed_order() {
    let fx = Fixture::new("retention:\n  keep_weekly: 4\n  keep_daily: 7\n");
    let out = fx.run(&["prune"]);
    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);
    assert_eq!(fx.calls(), vec![
        "prune --stats --list --prefix testprefix --keep-daily 7 --keep-weekly 4 /srv/borg | rsh=unset"
    ]);
}

#[test]
fn rsh_is_exported_to_borg() {
    let fx = Fixture::new("");
    fx.write_config(
        "remote:\n  repository: /srv/borg\n  rsh: ssh -p 2222\nlocation:\n  source: /data\n",
    );
    fx.run(&["list"]);
    assert_eq!(fx.calls(), vec!["list /srv/borg | rsh=ssh -p 2222"]);
}

#[test]
fn configured_rsh_overrides_parent_environment() {
    let fx = Fixture::new("");
    fx.write_config(
        "remote:\n  repository: /srv/borg\n  rsh: ssh -i /root/.ssh/backup\nlocation:\n  source: /data\n",
    );
    fx.run_with_parent_rsh(&["list"], "parent");
    assert_eq!(fx.calls(), vec!["list /srv/borg | rsh=ssh -i /root/.ssh/backup"]);
}

#[test]
fn parent_rsh_passes_through_without_config() {
    let fx = Fixture::new("");
    fx.run_with_parent_rsh(&["list"], "parent");
    assert_eq!(fx.calls(), vec!["list /srv/borg | rsh=parent"]);
}

#[test]
fn borg_exit_code_is_propagated() {
    let fx = Fixture::new("");
    let out = fx.run_with_exit(&["list"], 2);
    assert_eq!(out.code, Some(2));
    assert!(out.stderr.contains("Error:"), "stderr: {}", out.stderr);
}

// ─── create ───────────────────────────────────────────────────────────────────

const HOOKS: &str = r#"hooks:
  before: ['echo before-1 >> "$FAKE_BORG_LOG"', 'echo before-2 >> "$FAKE_BORG_LOG"']
  after: ['echo after-1 >> "$FAKE_BORG_LOG"']
"#;

#[test]
fn create_runs_hooks_create_and_prune_in_order() {
    let fx = Fixture::new(HOOKS);
    let out = fx.run(&["create"]);
    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);

    let calls = fx.calls();
    assert_eq!(calls.len(), 5, "calls: {calls:#?}");
    assert_eq!(calls[0], "before-1");
    assert_eq!(calls[1], "before-2");
    assert!(calls[2].starts_with("create /srv/borg::testprefix-"));
    assert!(calls[2].ends_with(" /data/a /data/b | rsh=unset"));
    assert_eq!(calls[3], "after-1");
    assert_eq!(
        calls[4],
        "prune --stats --list --prefix testprefix /srv/borg | rsh=unset"
    );
}

#[test]
fn archive_name_carries_current_utc_time() {
    let fx = Fixture::new("");
    let before = Utc::now().naive_utc();
    fx.run(&["create", "--no-prune"]);
    let after = Utc::now().naive_utc();

    let calls = fx.calls();
    let target = calls[0].split(' ').nth(1).unwrap();
    let stamp = target
        .strip_prefix("/srv/borg::testprefix-")
        .expect("archive suffix");
    let at = NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%SZ").unwrap();

    assert!(at >= before - TimeDelta::seconds(1), "{at} < {before}");
    assert!(at <= after, "{at} > {after}");
}

#[test]
fn create_no_prune_skips_prune() {
    let fx = Fixture::new("");
    fx.run(&["create", "--no-prune"]);
    let calls = fx.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("create "));
}

#[test]
fn create_builds_exclusion_flags() {
    let fx = Fixture::new(
        "  one_file_system: yes\n  exclude_caches: 'no'\n  exclude: ['*.tmp', '*.log']\n",
    );
    fx.run(&["create", "--no-prune"]);
    let calls = fx.calls();
    assert!(
        calls[0].starts_with("create --one-file-system --exclude *.tmp --exclude *.log /srv/borg::"),
        "got: {}",
        calls[0]
    );
}

#[test]
fn dry_run_announces_hooks_and_flags_borg() {
    let fx = Fixture::new(HOOKS);
    let out = fx.run(&["-n", "create"]);
    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);

    assert!(out.stdout.contains(
        r#"Not running hook "echo before-1 >> "$FAKE_BORG_LOG"" as dry run is enabled."#
    ));
    assert_eq!(out.stdout.matches("Not running hook").count(), 3);

    let calls = fx.calls();
    assert_eq!(calls.len(), 2, "hooks must not run: {calls:#?}");
    assert!(calls[0].starts_with("create --dry-run /srv/borg::testprefix-"));
    assert_eq!(
        calls[1],
        "prune --stats --list --prefix testprefix --dry-run /srv/borg | rsh=unset"
    );
}

#[test]
fn failing_create_stops_the_sequence() {
    let fx = Fixture::new(HOOKS);
    let out = fx.run_with_exit(&["create"], 3);
    assert_eq!(out.code, Some(3));

    let calls = fx.calls();
    assert_eq!(calls.len(), 3, "calls: {calls:#?}");
    assert!(calls[2].starts_with("create "));
}

#[test]
fn failing_hook_stops_the_sequence() {
    let fx = Fixture::new("hooks:\n  before: ['exit 5', 'echo never >> \"$FAKE_BORG_LOG\"']\n");
    let out = fx.run(&["create"]);
    assert_eq!(out.code, Some(5));
    assert!(out.stderr.contains("exit 5"), "stderr: {}", out.stderr);
    assert!(fx.calls().is_empty());
}

// ─── nagios-check-age ─────────────────────────────────────────────────────────

#[test]
fn check_age_ok() {
    let fx = Fixture::new("");
    fx.write_info(Local::now().naive_local() - TimeDelta::hours(1), 200 * 1024 * 1024);

    let out = fx.run(&["nagios-check-age", "--max-age", "24", "--min-size", "100"]);
    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);
    assert_eq!(out.stdout, "BORGBACKUP OK\n");
    assert_eq!(fx.calls(), vec![
        "info --last 1 --json /srv/borg | rsh=unset"
    ]);
}

#[test]
fn check_age_too_old() {
    let fx = Fixture::new("");
    let start = Local::now().naive_local() - TimeDelta::hours(25);
    fx.write_info(start, 1);

    let out = fx.run(&["nagios-check-age", "--max-age", "24"]);
    assert_eq!(out.code, Some(1));
    assert_eq!(
        out.stdout,
        format!(
            "BORGBACKUP WARNING: last backup too old\n\n{}\n",
            start.format("%Y-%m-%dT%H:%M:%S%.6f")
        )
    );
}

#[test]
fn check_age_too_small() {
    let fx = Fixture::new("");
    fx.write_info(Local::now().naive_local() - TimeDelta::hours(1), 50 * 1024 * 1024);

    let out = fx.run(&["nagios-check-age", "--max-age", "24", "--min-size", "100"]);
    assert_eq!(out.code, Some(1));
    assert_eq!(
        out.stdout,
        "BORGBACKUP WARNING: last backup too small\n\n52428800B < 104857600B\n"
    );
}

#[test]
fn check_age_ignores_dry_run() {
    let fx = Fixture::new("");
    fx.write_info(Local::now().naive_local(), 1);

    let out = fx.run(&["--dry-run", "nagios-check-age", "--max-age", "1"]);
    assert_eq!(out.code, Some(0));
    assert_eq!(fx.calls().len(), 1);
}

#[test]
fn check_age_propagates_borg_failure() {
    let fx = Fixture::new("");
    fx.write_info(Local::now().naive_local(), 1);

    let out = fx.run_with_exit(&["nagios-check-age", "--max-age", "1"], 2);
    assert_eq!(out.code, Some(2));
    assert!(out.stdout.is_empty());
    assert!(
        out.stderr.contains("fake-borg: info warning on stderr"),
        "stderr: {}",
        out.stderr
    );
}

#[test]
fn check_age_lets_borg_stderr_through() {
    let fx = Fixture::new("");
    fx.write_info(Local::now().naive_local(), 1);

    let out = fx.run(&["nagios-check-age", "--max-age", "1"]);
    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);
    assert_eq!(out.stdout, "BORGBACKUP OK
");
    assert!(
        out.stderr.contains("fake-borg: info warning on stderr"),
        "stderr: {}",
        out.stderr
    );
}

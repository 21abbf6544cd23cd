//! Bounded-retry execution of external transfer/probe commands.
//!
//! Everything that leaves the node goes through an external tool (`ping`,
//! `rsync`, `curl`) run as a subprocess. This crate provides the single retry
//! primitive those tools share, plus thin builders for the two commands used
//! throughout the pipeline.
//!
//! A nonzero exit status and a failure to launch the command are treated the
//! same way: a retryable failure. The field node has no richer diagnostics
//! channel, so callers only ever see the exit status of the last attempt
//! (0 = success). No backoff is applied between attempts; callers that need
//! spacing must add their own.

use std::ffi::OsStr;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

/// Exit code reported when the command binary could not be launched at all
/// (shell convention for "command not found").
pub const SPAWN_FAILED: i32 = 127;

/// Default number of attempts for probes and copies.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Run `command`, retrying on any failure, up to `max_attempts` times.
///
/// Returns the exit status of the last attempt. A command terminated by a
/// signal reports `-1`; a command that could never be spawned reports
/// [`SPAWN_FAILED`].
pub fn run_with_retry(command: &mut Command, max_attempts: u32) -> i32 {
    let name = command.get_program().to_string_lossy().into_owned();
    let max_attempts = max_attempts.max(1);

    let mut return_code = SPAWN_FAILED;
    for attempt in 1..=max_attempts {
        match command.status() {
            Ok(status) => {
                return_code = status.code().unwrap_or(-1);
                if return_code == 0 {
                    break;
                }
                debug!(
                    command = %name,
                    attempt,
                    max_attempts,
                    code = return_code,
                    "command failed"
                );
            }
            Err(err) => {
                return_code = SPAWN_FAILED;
                warn!(
                    command = %name,
                    attempt,
                    max_attempts,
                    error = %err,
                    "could not launch command"
                );
            }
        }
    }

    return_code
}

/// Reachability-probe an address: one echo request, 3 second timeout,
/// retried up to `max_attempts` times.
pub fn ping(ip_address: &str, max_attempts: u32) -> i32 {
    let mut command = Command::new("ping");
    command
        .args(["-c", "1", "-W", "3", ip_address])
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    run_with_retry(&mut command, max_attempts)
}

/// Synchronize a file to a (possibly remote) destination with `rsync -avq`.
///
/// `remove_source` adds `--remove-source-files`, used by the LAN delivery
/// path where the transfer tool itself performs the source cleanup.
pub fn rsync(
    source: impl AsRef<OsStr>,
    destination: impl AsRef<OsStr>,
    remove_source: bool,
    max_attempts: u32,
) -> i32 {
    let mut command = Command::new("rsync");
    command.arg("-avq");
    if remove_source {
        command.arg("--remove-source-files");
    }
    command
        .arg(source)
        .arg(destination)
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    run_with_retry(&mut command, max_attempts)
}

/// Checksum-aware local archive copy: `rsync -auz`, tolerating resumed
/// partial transfers. Used by the archive writer and the receive->transmit
/// staging step.
pub fn rsync_archive(
    source: impl AsRef<OsStr>,
    destination: impl AsRef<OsStr>,
    max_attempts: u32,
) -> i32 {
    let mut command = Command::new("rsync");
    command
        .arg("-auz")
        .arg(source)
        .arg(destination)
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    run_with_retry(&mut command, max_attempts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_command_returns_zero_on_first_attempt() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "exit 0"]);
        assert_eq!(run_with_retry(&mut cmd, 3), 0);
    }

    #[test]
    fn failing_command_reports_last_exit_status() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "exit 7"]);
        assert_eq!(run_with_retry(&mut cmd, 3), 7);
    }

    #[test]
    fn failing_command_is_attempted_max_attempts_times() {
        let dir = tempfile::tempdir().unwrap();
        let counter = dir.path().join("attempts");
        let script = format!("echo x >> {}; exit 1", counter.display());

        let mut cmd = Command::new("sh");
        cmd.args(["-c", &script]);
        assert_ne!(run_with_retry(&mut cmd, 3), 0);

        let attempts = std::fs::read_to_string(&counter).unwrap().lines().count();
        assert_eq!(attempts, 3, "expected exactly three attempts");
    }

    #[test]
    fn command_succeeding_midway_stops_retrying() {
        let dir = tempfile::tempdir().unwrap();
        let counter = dir.path().join("attempts");
        // Fails on the first attempt, succeeds on the second.
        let script = format!(
            "echo x >> {c}; test $(wc -l < {c}) -ge 2",
            c = counter.display()
        );

        let mut cmd = Command::new("sh");
        cmd.args(["-c", &script]);
        assert_eq!(run_with_retry(&mut cmd, 5), 0);

        let attempts = std::fs::read_to_string(&counter).unwrap().lines().count();
        assert_eq!(attempts, 2, "should stop at the first success");
    }

    #[test]
    fn unlaunchable_command_reports_spawn_failure() {
        let mut cmd = Command::new("/nonexistent/vigil-test-binary");
        assert_eq!(run_with_retry(&mut cmd, 2), SPAWN_FAILED);
    }
}

//! Execution scheduler.
//!
//! Checks run either sequentially in declared order or as a parallel batch of
//! OS subprocesses, one thread driving each child. Either way the scheduler
//! is fail-slow: a failing check never prevents later checks from running,
//! because partial information outranks an early abort for a gate. Results
//! are always reported in declared order, not completion order, so two runs
//! over the same tree produce identical logs.

use crate::adapter::{ToolAdapter, ToolOutput};
use crate::error::GateError;
use crate::scope::ChangeScope;
use crate::types::{Finding, SkipReason, Tally, ToolStatus};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// What a timed-out check does to the gate. The scheduler only records the
/// timeout; whether it blocks is the caller's policy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutPolicy {
    /// Timeout degrades gracefully: recorded, never blocks on its own.
    #[default]
    Degrade,
    /// Timeout counts as a missing tool under `--require-tools`.
    Block,
}

/// Everything one check produced, immutable once built. Aggregation is a
/// pure fold over these.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub name: String,
    pub status: ToolStatus,
    pub skip_reason: Option<SkipReason>,
    pub tally: Tally,
    pub findings: Vec<Finding>,
    pub stdout: String,
    pub stderr: String,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl CheckOutcome {
    /// Outcome for an adapter that never ran.
    pub fn skipped(name: &str, reason: SkipReason) -> Self {
        let status = if reason == SkipReason::NotInstalled {
            ToolStatus::NotInstalled
        } else {
            ToolStatus::Skipped
        };
        Self {
            name: name.to_string(),
            status,
            skip_reason: Some(reason),
            tally: Tally::default(),
            findings: Vec::new(),
            stdout: String::new(),
            stderr: String::new(),
            error: None,
            elapsed_ms: 0,
        }
    }

    /// Whether this check counts against the shared failure total.
    pub fn failed(&self) -> bool {
        matches!(
            self.status,
            ToolStatus::Findings | ToolStatus::Error | ToolStatus::Timeout
        )
    }
}

/// Shared failure count across a set of outcomes. Nonzero iff any check
/// failed, irrespective of how many ran.
pub fn failure_count(outcomes: &[CheckOutcome]) -> usize {
    outcomes.iter().filter(|o| o.failed()).count()
}

pub struct Scheduler {
    repo: PathBuf,
    serial: bool,
    timeout: Duration,
}

impl Scheduler {
    pub fn new(repo: &Path, serial: bool, timeout: Duration) -> Self {
        Self {
            repo: repo.to_path_buf(),
            serial,
            timeout,
        }
    }

    /// Run one batch of checks. The batch fully completes before this
    /// returns; callers sequence dependent batches by calling again.
    pub fn run_batch(
        &self,
        scope: &ChangeScope,
        checks: &[&dyn ToolAdapter],
    ) -> Vec<CheckOutcome> {
        if self.serial || checks.len() <= 1 {
            return checks
                .iter()
                .map(|adapter| self.run_check(scope, *adapter))
                .collect();
        }

        thread::scope(|s| {
            let handles: Vec<_> = checks
                .iter()
                .map(|adapter| s.spawn(move || self.run_check(scope, *adapter)))
                .collect();

            // Joining in spawn order gives declared-order reporting no
            // matter which child finishes first.
            handles
                .into_iter()
                .map(|h| h.join().expect("check thread panicked"))
                .collect()
        })
    }

    fn run_check(&self, scope: &ChangeScope, adapter: &dyn ToolAdapter) -> CheckOutcome {
        let started = Instant::now();
        debug!(tool = adapter.name(), "check started");

        let mut command = adapter.command(scope);
        command
            .current_dir(&self.repo)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Own process group, so the timeout can kill the tool together with
        // anything it forked. Killing only the direct child would leave
        // grandchildren holding the pipe write ends open.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(tool = adapter.name(), error = %e, "failed to launch");
                let err = GateError::Spawn {
                    tool: adapter.binary().to_string(),
                    message: e.to_string(),
                };
                return CheckOutcome {
                    name: adapter.name().to_string(),
                    status: ToolStatus::Error,
                    skip_reason: None,
                    tally: Tally::default(),
                    findings: Vec::new(),
                    stdout: String::new(),
                    stderr: String::new(),
                    error: Some(err.to_string()),
                    elapsed_ms: started.elapsed().as_millis() as u64,
                };
            }
        };

        let (output, timed_out) = self.wait_with_timeout(child);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if timed_out {
            warn!(tool = adapter.name(), elapsed_ms, "check timed out");
            return CheckOutcome {
                name: adapter.name().to_string(),
                status: ToolStatus::Timeout,
                skip_reason: None,
                tally: Tally::default(),
                findings: Vec::new(),
                stdout: output.stdout,
                stderr: output.stderr,
                error: Some(format!("timed out after {}s", self.timeout.as_secs())),
                elapsed_ms,
            };
        }

        match adapter.parse(&output) {
            Ok(report) => {
                let status = if report.tally.total() == 0 {
                    ToolStatus::Pass
                } else {
                    ToolStatus::Findings
                };
                debug!(
                    tool = adapter.name(),
                    status = status.as_str(),
                    findings = report.tally.total(),
                    elapsed_ms,
                    "check finished"
                );
                CheckOutcome {
                    name: adapter.name().to_string(),
                    status,
                    skip_reason: None,
                    tally: report.tally,
                    findings: report.findings,
                    stdout: output.stdout,
                    stderr: output.stderr,
                    error: None,
                    elapsed_ms,
                }
            }
            Err(e) => {
                warn!(tool = adapter.name(), error = %e, "output unreadable");
                CheckOutcome {
                    name: adapter.name().to_string(),
                    status: ToolStatus::Error,
                    skip_reason: None,
                    tally: Tally::default(),
                    findings: Vec::new(),
                    stdout: output.stdout,
                    stderr: output.stderr,
                    error: Some(e.to_string()),
                    elapsed_ms,
                }
            }
        }
    }

    /// Drain the child's pipes on reader threads while polling for exit; kill
    /// on deadline. Readers drain concurrently so a chatty tool cannot
    /// deadlock on a full pipe buffer.
    fn wait_with_timeout(&self, mut child: Child) -> (ToolOutput, bool) {
        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let deadline = Instant::now() + self.timeout;
        let mut timed_out = false;
        let exit_code = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status.code(),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        timed_out = true;
                        kill_process_tree(&mut child);
                        let _ = child.wait();
                        break None;
                    }
                    thread::sleep(Duration::from_millis(25));
                }
                Err(_) => break None,
            }
        };

        let stdout = stdout_reader.map(join_reader).unwrap_or_default();
        let stderr = stderr_reader.map(join_reader).unwrap_or_default();

        (
            ToolOutput {
                stdout,
                stderr,
                exit_code,
            },
            timed_out,
        )
    }
}

/// Kill the check's whole process group. The child was spawned as a group
/// leader, so this reaches forked grandchildren too; otherwise the reader
/// threads would stay blocked until the last descendant exits.
#[cfg(unix)]
fn kill_process_tree(child: &mut Child) {
    let pgid = child.id() as libc::pid_t;
    unsafe {
        libc::killpg(pgid, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_process_tree(child: &mut Child) {
    let _ = child.kill();
}

fn spawn_reader<R: Read + Send + 'static>(mut source: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = source.read_to_end(&mut buf);
        buf
    })
}

fn join_reader(handle: thread::JoinHandle<Vec<u8>>) -> String {
    handle
        .join()
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::FakeAdapter;
    use tempfile::TempDir;

    fn scheduler(dir: &TempDir, serial: bool) -> Scheduler {
        Scheduler::new(dir.path(), serial, Duration::from_secs(10))
    }

    #[test]
    fn test_serial_batch_runs_in_declared_order() {
        let dir = TempDir::new().unwrap();
        let a = FakeAdapter::passing("alpha");
        let b = FakeAdapter::passing("beta");
        let outcomes = scheduler(&dir, true).run_batch(
            &ChangeScope::empty(),
            &[&a as &dyn ToolAdapter, &b as &dyn ToolAdapter],
        );
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].name, "alpha");
        assert_eq!(outcomes[1].name, "beta");
        assert_eq!(outcomes[0].status, ToolStatus::Pass);
    }

    #[test]
    fn test_failure_never_skips_later_checks() {
        let dir = TempDir::new().unwrap();
        let bad = FakeAdapter::erroring("bad");
        let good = FakeAdapter::passing("good");
        let outcomes = scheduler(&dir, true).run_batch(
            &ChangeScope::empty(),
            &[&bad as &dyn ToolAdapter, &good as &dyn ToolAdapter],
        );
        assert_eq!(outcomes[0].status, ToolStatus::Error);
        assert_eq!(outcomes[1].status, ToolStatus::Pass);
    }

    #[test]
    fn test_parallel_batch_reports_in_declared_order() {
        let dir = TempDir::new().unwrap();
        // First check finishes last; reporting order must not change.
        let slow = FakeAdapter::with_script("slowpoke", "sleep 0.3; echo 0 0 0 0");
        let fast = FakeAdapter::passing("quickie");
        let outcomes = scheduler(&dir, false).run_batch(
            &ChangeScope::empty(),
            &[&slow as &dyn ToolAdapter, &fast as &dyn ToolAdapter],
        );
        assert_eq!(outcomes[0].name, "slowpoke");
        assert_eq!(outcomes[1].name, "quickie");
        assert_eq!(outcomes[0].status, ToolStatus::Pass);
        assert_eq!(outcomes[1].status, ToolStatus::Pass);
    }

    #[test]
    fn test_findings_counted_from_script_output() {
        let dir = TempDir::new().unwrap();
        let noisy = FakeAdapter::with_script("noisy", "echo 2 1 0 0");
        let outcomes =
            scheduler(&dir, true).run_batch(&ChangeScope::empty(), &[&noisy as &dyn ToolAdapter]);
        assert_eq!(outcomes[0].status, ToolStatus::Findings);
        assert_eq!(outcomes[0].tally.critical, 2);
        assert_eq!(outcomes[0].tally.high, 1);
    }

    #[test]
    fn test_timeout_is_distinct_from_error() {
        let dir = TempDir::new().unwrap();
        let sleeper = FakeAdapter::with_script("sleeper", "sleep 30");
        let scheduler = Scheduler::new(dir.path(), true, Duration::from_millis(200));
        let started = Instant::now();
        let outcomes =
            scheduler.run_batch(&ChangeScope::empty(), &[&sleeper as &dyn ToolAdapter]);
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(outcomes[0].status, ToolStatus::Timeout);
        assert!(outcomes[0].error.as_deref().unwrap().contains("timed out"));
    }

    #[test]
    fn test_timeout_kills_forked_grandchildren() {
        let dir = TempDir::new().unwrap();
        // The background sleep inherits the pipes; the timeout must take it
        // down with the shell or the readers block for its full lifetime.
        let forker = FakeAdapter::with_script("forker", "sleep 30 & echo started; wait");
        let scheduler = Scheduler::new(dir.path(), true, Duration::from_millis(200));
        let started = Instant::now();
        let outcomes =
            scheduler.run_batch(&ChangeScope::empty(), &[&forker as &dyn ToolAdapter]);
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(outcomes[0].status, ToolStatus::Timeout);
    }

    #[test]
    fn test_unlaunchable_binary_is_error() {
        let dir = TempDir::new().unwrap();
        let ghost = FakeAdapter::with_binary("ghost", "changegate-no-such-binary-xyzzy");
        let outcomes =
            scheduler(&dir, true).run_batch(&ChangeScope::empty(), &[&ghost as &dyn ToolAdapter]);
        assert_eq!(outcomes[0].status, ToolStatus::Error);
        assert!(outcomes[0].error.as_deref().unwrap().contains("launch"));
    }

    #[test]
    fn test_failure_count_accumulates_across_batch() {
        let dir = TempDir::new().unwrap();
        let bad = FakeAdapter::erroring("bad");
        let noisy = FakeAdapter::with_script("noisy", "echo 1 0 0 0");
        let good = FakeAdapter::passing("good");
        let outcomes = scheduler(&dir, true).run_batch(
            &ChangeScope::empty(),
            &[
                &bad as &dyn ToolAdapter,
                &noisy as &dyn ToolAdapter,
                &good as &dyn ToolAdapter,
            ],
        );
        assert_eq!(failure_count(&outcomes), 2);
    }

    #[test]
    fn test_skipped_outcome_shapes() {
        let missing = CheckOutcome::skipped("trivy", SkipReason::NotInstalled);
        assert_eq!(missing.status, ToolStatus::NotInstalled);
        assert!(!missing.failed());

        let quick = CheckOutcome::skipped("gitleaks", SkipReason::SkippedQuickMode);
        assert_eq!(quick.status, ToolStatus::Skipped);
        assert_eq!(quick.skip_reason, Some(SkipReason::SkippedQuickMode));
    }

    #[test]
    fn test_stderr_captured_without_blocking() {
        let dir = TempDir::new().unwrap();
        let chatty = FakeAdapter::with_script("chatty", "echo oops >&2; echo 0 0 0 0");
        let outcomes =
            scheduler(&dir, true).run_batch(&ChangeScope::empty(), &[&chatty as &dyn ToolAdapter]);
        assert_eq!(outcomes[0].status, ToolStatus::Pass);
        assert!(outcomes[0].stderr.contains("oops"));
    }
}

//! Tool adapters.
//!
//! One adapter per external analysis tool, behind a uniform contract:
//! applicability, invocation, and normalization of the tool's native severity
//! vocabulary onto the fixed four-level taxonomy. The registry is a closed,
//! statically declared set iterated uniformly; every registered adapter ends
//! up in the run summary exactly once, whether it ran or not.

pub mod gitleaks;
pub mod gocyclo;
pub mod golangci;
pub mod gosec;
pub mod gotest;
pub mod semgrep;
pub mod trivy;

pub use gitleaks::Gitleaks;
pub use gocyclo::Gocyclo;
pub use golangci::GolangciLint;
pub use gosec::Gosec;
pub use gotest::GoTest;
pub use semgrep::Semgrep;
pub use trivy::Trivy;

use crate::config::Config;
use crate::error::{GateError, Result};
use crate::scope::ChangeScope;
use crate::types::{Finding, SkipReason, Tally};
use std::env;
use std::process::Command;

/// Execution phase. All `Analyze` checks complete before any `Test` check
/// starts, so test runners can rely on artifacts produced earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Analyze,
    Test,
}

/// Captured output of one tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// Normalized result of one tool run: severity tally plus any individual
/// finding records the tool's output format supports.
#[derive(Debug, Clone, Default)]
pub struct ToolReport {
    pub tally: Tally,
    pub findings: Vec<Finding>,
}

impl ToolReport {
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        Self {
            tally: Tally::from_findings(&findings),
            findings,
        }
    }
}

/// The engine's wrapper around one external analysis tool.
///
/// `parse` must verify structured output is actually readable before the
/// check can count as clean: an unreadable payload is an invocation error,
/// never a pass, regardless of exit code.
pub trait ToolAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    fn binary(&self) -> &'static str {
        self.name()
    }

    /// File extensions this tool cares about. Empty means whole-repository:
    /// the tool runs regardless of scope contents.
    fn extensions(&self) -> &'static [&'static str] {
        &[]
    }

    /// Slow tools (test runners, secret scanners) are skippable via `--quick`
    /// regardless of scope.
    fn slow(&self) -> bool {
        false
    }

    fn phase(&self) -> Phase {
        Phase::Analyze
    }

    fn command(&self, scope: &ChangeScope) -> Command;

    fn parse(&self, output: &ToolOutput) -> Result<ToolReport>;
}

/// The closed set of registered adapters, in declaration (and reporting)
/// order.
pub fn registry() -> Vec<Box<dyn ToolAdapter>> {
    vec![
        Box::new(Gitleaks),
        Box::new(Semgrep),
        Box::new(Gosec),
        Box::new(GolangciLint),
        Box::new(Gocyclo),
        Box::new(Trivy),
        Box::new(GoTest),
    ]
}

/// Decide, without executing anything, whether an adapter sits this run out.
/// Returns `None` when the tool should be invoked.
pub fn skip_reason(
    adapter: &dyn ToolAdapter,
    scope: &ChangeScope,
    quick: bool,
    gate: bool,
    config: &Config,
) -> Option<SkipReason> {
    if config.is_tool_skipped(adapter.name()) {
        return Some(SkipReason::DisabledInConfig);
    }
    if quick && adapter.slow() {
        return Some(SkipReason::SkippedQuickMode);
    }
    if gate && !adapter.extensions().is_empty() && !scope.has_any_extension(adapter.extensions()) {
        return Some(SkipReason::NoFilesInTarget);
    }
    if !binary_on_path(adapter.binary()) {
        return Some(SkipReason::NotInstalled);
    }
    None
}

/// PATH lookup for an adapter binary.
pub fn binary_on_path(binary: &str) -> bool {
    let Some(paths) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&paths).any(|dir| !dir.as_os_str().is_empty() && dir.join(binary).is_file())
}

pub(crate) fn unreadable(tool: &str, message: impl Into<String>) -> GateError {
    GateError::ToolOutput {
        tool: tool.to_string(),
        message: message.into(),
    }
}

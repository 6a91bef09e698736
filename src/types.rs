use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The four-level taxonomy every tool-native severity maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Per-run severity counts. Immutable once a check completes; aggregation
/// merges tallies as a pure fold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl Tally {
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }

    #[must_use]
    pub fn merged(self, other: Tally) -> Tally {
        Tally {
            critical: self.critical + other.critical,
            high: self.high + other.high,
            medium: self.medium + other.medium,
            low: self.low + other.low,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }

    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut tally = Tally::default();
        for finding in findings {
            tally.add(finding.severity);
        }
        tally
    }
}

/// A normalized defect unit. Some tools contribute only aggregate counts and
/// produce no individual records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub tool: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
    pub message: String,
}

/// Final status of one registered adapter. Every adapter produces exactly one
/// per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    /// Binary absent from PATH.
    NotInstalled,
    /// Not applicable for this run (scope or mode).
    Skipped,
    /// Ran and reported zero findings.
    Pass,
    /// Ran and reported at least one finding.
    Findings,
    /// Invocation crashed or structured output was unreadable. The true
    /// finding count is unknown, not zero.
    Error,
    /// Killed by the hard per-check timeout.
    Timeout,
}

impl ToolStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolStatus::NotInstalled => "not_installed",
            ToolStatus::Skipped => "skipped",
            ToolStatus::Pass => "pass",
            ToolStatus::Findings => "findings",
            ToolStatus::Error => "error",
            ToolStatus::Timeout => "timeout",
        }
    }

    /// Whether the tool actually executed this run.
    pub fn ran(&self) -> bool {
        matches!(
            self,
            ToolStatus::Pass | ToolStatus::Findings | ToolStatus::Error | ToolStatus::Timeout
        )
    }
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed reason for a skip; recorded so no adapter is ever silently omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    NoFilesInTarget,
    NotInstalled,
    SkippedQuickMode,
    DisabledInConfig,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NoFilesInTarget => "NO_FILES_IN_TARGET",
            SkipReason::NotInstalled => "NOT_INSTALLED",
            SkipReason::SkippedQuickMode => "SKIPPED_QUICK_MODE",
            SkipReason::DisabledInConfig => "DISABLED_IN_CONFIG",
        }
    }
}

/// Gate verdict for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateStatus {
    Pass,
    BlockedCritical,
    BlockedHigh,
    BlockedMissingTools,
}

impl GateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateStatus::Pass => "PASS",
            GateStatus::BlockedCritical => "BLOCKED_CRITICAL",
            GateStatus::BlockedHigh => "BLOCKED_HIGH",
            GateStatus::BlockedMissingTools => "BLOCKED_MISSING_TOOLS",
        }
    }
}

impl std::fmt::Display for GateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The structured, persisted result of one engine invocation. Written once at
/// the end of a run and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub version: String,
    pub timestamp: String,
    pub scope_mode: String,
    pub tools_run: usize,
    pub tools_skipped: usize,
    pub missing_tools: usize,
    pub tool_status: BTreeMap<String, ToolStatus>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub skip_reasons: BTreeMap<String, SkipReason>,
    pub tallies: Tally,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<Finding>,
    pub gate_status: GateStatus,
    pub exit_code: u8,
    pub output_dir: String,
    pub elapsed_ms: u64,
}

//! Finding aggregation.
//!
//! One pure fold from per-check outcomes to the run summary. Skipped and
//! errored checks never contribute to the tallies: an error's true finding
//! count is unknown, and unknown is not zero. Every registered adapter is
//! accounted for exactly once: `tools_run + tools_skipped` always equals the
//! registry size.

use crate::exec::{CheckOutcome, TimeoutPolicy};
use crate::policy;
use crate::scope::ScopeMode;
use crate::types::{RunSummary, Tally, ToolStatus};
use std::collections::BTreeMap;
use std::path::Path;

pub fn summarize(
    outcomes: &[CheckOutcome],
    scope_mode: ScopeMode,
    require_tools: bool,
    timeout_policy: TimeoutPolicy,
    output_dir: &Path,
    elapsed_ms: u64,
) -> RunSummary {
    let mut tool_status = BTreeMap::new();
    let mut skip_reasons = BTreeMap::new();
    let mut tallies = Tally::default();
    let mut findings = Vec::new();
    let mut tools_run = 0;
    let mut tools_skipped = 0;
    let mut missing_tools = 0;

    for outcome in outcomes {
        tool_status.insert(outcome.name.clone(), outcome.status);
        if let Some(reason) = outcome.skip_reason {
            skip_reasons.insert(outcome.name.clone(), reason);
        }

        if outcome.status.ran() {
            tools_run += 1;
        } else {
            tools_skipped += 1;
        }

        match outcome.status {
            ToolStatus::Findings => {
                tallies = tallies.merged(outcome.tally);
                findings.extend(outcome.findings.iter().cloned());
            }
            ToolStatus::NotInstalled | ToolStatus::Error => missing_tools += 1,
            ToolStatus::Timeout => {
                if timeout_policy == TimeoutPolicy::Block {
                    missing_tools += 1;
                }
            }
            ToolStatus::Pass | ToolStatus::Skipped => {}
        }
    }

    let decision = policy::decide(&tallies, require_tools, missing_tools);

    RunSummary {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        scope_mode: scope_mode.as_str().to_string(),
        tools_run,
        tools_skipped,
        missing_tools,
        tool_status,
        skip_reasons,
        tallies,
        findings,
        gate_status: decision.status,
        exit_code: decision.exit_code,
        output_dir: output_dir.display().to_string(),
        elapsed_ms,
    }
}

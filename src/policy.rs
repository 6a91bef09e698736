//! Gate policy.
//!
//! A pure function from aggregated tallies and mode flags to a verdict and
//! process exit code. The priority order matters: a run with zero findings
//! but missing required scanners must never read as a clean pass, because
//! "we didn't check" and "we checked and it's clean" are different failure
//! classes.

use crate::types::{GateStatus, Tally};

pub const EXIT_PASS: u8 = 0;
pub const EXIT_INTERNAL_ERROR: u8 = 1;
pub const EXIT_BLOCKED_CRITICAL: u8 = 2;
pub const EXIT_BLOCKED_HIGH: u8 = 3;
pub const EXIT_BLOCKED_MISSING_TOOLS: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateDecision {
    pub status: GateStatus,
    pub exit_code: u8,
}

/// Decide the gate, in priority order: critical findings, high findings,
/// missing required tools, pass.
pub fn decide(tallies: &Tally, require_tools: bool, missing_tools: usize) -> GateDecision {
    if tallies.critical > 0 {
        GateDecision {
            status: GateStatus::BlockedCritical,
            exit_code: EXIT_BLOCKED_CRITICAL,
        }
    } else if tallies.high > 0 {
        GateDecision {
            status: GateStatus::BlockedHigh,
            exit_code: EXIT_BLOCKED_HIGH,
        }
    } else if require_tools && missing_tools > 0 {
        GateDecision {
            status: GateStatus::BlockedMissingTools,
            exit_code: EXIT_BLOCKED_MISSING_TOOLS,
        }
    } else {
        GateDecision {
            status: GateStatus::Pass,
            exit_code: EXIT_PASS,
        }
    }
}

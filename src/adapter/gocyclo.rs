//! gocyclo adapter (cyclomatic complexity).
//!
//! gocyclo has no structured output mode, so this is the one adapter that
//! keeps a line-oriented text decoder. Severity table: every function over
//! the threshold maps to HIGH.

use super::{unreadable, ToolAdapter, ToolOutput, ToolReport};
use crate::error::Result;
use crate::scope::ChangeScope;
use crate::types::{Finding, Severity};
use regex::Regex;
use std::process::Command;
use std::sync::OnceLock;

/// Complexity above this blocks in the same band as a linter error.
pub const COMPLEXITY_THRESHOLD: u32 = 15;

pub struct Gocyclo;

// "17 mypkg buildPlan cmd/plan.go:88:1"
fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d+)\s+(\S+)\s+(\S+)\s+(.+?):(\d+):\d+$").unwrap()
    })
}

impl ToolAdapter for Gocyclo {
    fn name(&self) -> &'static str {
        "gocyclo"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn command(&self, scope: &ChangeScope) -> Command {
        let mut cmd = Command::new(self.binary());
        cmd.args(["-over", &COMPLEXITY_THRESHOLD.to_string()]);
        let files = scope.files_with_extensions(self.extensions());
        if files.is_empty() {
            cmd.arg(".");
        } else {
            cmd.args(files);
        }
        cmd
    }

    fn parse(&self, output: &ToolOutput) -> Result<ToolReport> {
        // With -over, an empty report means nothing crossed the threshold.
        let mut findings = Vec::new();
        for line in output.stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let captures = line_pattern()
                .captures(line)
                .ok_or_else(|| unreadable(self.name(), format!("unrecognized line: {line}")))?;

            let complexity = &captures[1];
            let function = &captures[3];
            findings.push(Finding {
                tool: self.name().to_string(),
                severity: Severity::High,
                file: Some(captures[4].to_string()),
                line: captures[5].parse().ok(),
                message: format!(
                    "cyclomatic complexity {complexity} of {function} exceeds {COMPLEXITY_THRESHOLD}"
                ),
            });
        }

        Ok(ToolReport::from_findings(findings))
    }
}

//! gitleaks adapter (secret scanner).
//!
//! Severity table: every confirmed leak is CRITICAL. A leaked credential has
//! no lesser grade.

use super::{unreadable, ToolAdapter, ToolOutput, ToolReport};
use crate::error::Result;
use crate::scope::ChangeScope;
use crate::types::{Finding, Severity};
use serde::Deserialize;
use std::process::Command;

pub struct Gitleaks;

#[derive(Debug, Deserialize)]
struct LeakEntry {
    #[serde(rename = "RuleID")]
    rule_id: String,
    #[serde(rename = "File")]
    file: String,
    #[serde(rename = "StartLine")]
    start_line: Option<u64>,
    #[serde(rename = "Description")]
    description: Option<String>,
}

impl ToolAdapter for Gitleaks {
    fn name(&self) -> &'static str {
        "gitleaks"
    }

    // Scans the whole worktree; a secret outside the diff is still a secret.
    fn slow(&self) -> bool {
        true
    }

    fn command(&self, _scope: &ChangeScope) -> Command {
        let mut cmd = Command::new(self.binary());
        cmd.args([
            "detect",
            "--no-banner",
            "--report-format",
            "json",
            "--report-path",
            "/dev/stdout",
            "--exit-code",
            "1",
        ]);
        cmd
    }

    fn parse(&self, output: &ToolOutput) -> Result<ToolReport> {
        // Exit 0 = clean, 1 = leaks found; anything else crashed.
        match output.exit_code {
            Some(0) | Some(1) => {}
            code => {
                return Err(unreadable(
                    self.name(),
                    format!("unexpected exit status {code:?}"),
                ));
            }
        }

        let entries: Vec<LeakEntry> = serde_json::from_str(output.stdout.trim())
            .map_err(|e| unreadable(self.name(), e.to_string()))?;

        let findings = entries
            .into_iter()
            .map(|entry| Finding {
                tool: self.name().to_string(),
                severity: Severity::Critical,
                file: Some(entry.file),
                line: entry.start_line,
                message: entry
                    .description
                    .unwrap_or_else(|| format!("secret detected by rule {}", entry.rule_id)),
            })
            .collect();

        Ok(ToolReport::from_findings(findings))
    }
}

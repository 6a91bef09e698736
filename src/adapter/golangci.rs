//! golangci-lint adapter (style linter).
//!
//! Severity table: error-level issues map to HIGH, everything else (warnings
//! and issues with no declared severity) to MEDIUM.

use super::{unreadable, ToolAdapter, ToolOutput, ToolReport};
use crate::error::Result;
use crate::scope::ChangeScope;
use crate::types::{Finding, Severity};
use serde::Deserialize;
use std::process::Command;

pub struct GolangciLint;

#[derive(Debug, Deserialize)]
struct LintDoc {
    #[serde(rename = "Issues", default)]
    issues: Vec<LintIssue>,
}

#[derive(Debug, Deserialize)]
struct LintIssue {
    #[serde(rename = "FromLinter")]
    from_linter: String,
    #[serde(rename = "Text")]
    text: String,
    #[serde(rename = "Severity", default)]
    severity: String,
    #[serde(rename = "Pos")]
    pos: LintPos,
}

#[derive(Debug, Deserialize)]
struct LintPos {
    #[serde(rename = "Filename")]
    filename: String,
    #[serde(rename = "Line")]
    line: u64,
}

fn map_severity(native: &str) -> Severity {
    if native.eq_ignore_ascii_case("error") {
        Severity::High
    } else {
        Severity::Medium
    }
}

impl ToolAdapter for GolangciLint {
    fn name(&self) -> &'static str {
        "golangci-lint"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn command(&self, _scope: &ChangeScope) -> Command {
        let mut cmd = Command::new(self.binary());
        cmd.args(["run", "--out-format", "json", "./..."]);
        cmd
    }

    fn parse(&self, output: &ToolOutput) -> Result<ToolReport> {
        let doc: LintDoc = serde_json::from_str(output.stdout.trim())
            .map_err(|e| unreadable(self.name(), e.to_string()))?;

        let findings = doc
            .issues
            .into_iter()
            .map(|issue| Finding {
                tool: self.name().to_string(),
                severity: map_severity(&issue.severity),
                file: Some(issue.pos.filename),
                line: Some(issue.pos.line),
                message: format!("{}: {}", issue.from_linter, issue.text),
            })
            .collect();

        Ok(ToolReport::from_findings(findings))
    }
}

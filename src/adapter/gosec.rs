//! gosec adapter (Go SAST).
//!
//! Severity table: gosec HIGH maps to CRITICAL, MEDIUM to HIGH, LOW to
//! MEDIUM. gosec grades exploitability, and its top grade on security-audit
//! rules blocks a merge outright.

use super::{unreadable, ToolAdapter, ToolOutput, ToolReport};
use crate::error::Result;
use crate::scope::ChangeScope;
use crate::types::{Finding, Severity};
use serde::Deserialize;
use std::process::Command;

pub struct Gosec;

#[derive(Debug, Deserialize)]
struct GosecDoc {
    #[serde(rename = "Issues", default)]
    issues: Vec<GosecIssue>,
}

#[derive(Debug, Deserialize)]
struct GosecIssue {
    severity: String,
    details: String,
    file: String,
    // gosec reports "10" or a "10-12" range.
    line: String,
}

fn map_severity(native: &str) -> Severity {
    match native {
        "HIGH" => Severity::Critical,
        "MEDIUM" => Severity::High,
        _ => Severity::Medium,
    }
}

fn first_line_number(raw: &str) -> Option<u64> {
    raw.split('-').next().and_then(|s| s.trim().parse().ok())
}

impl ToolAdapter for Gosec {
    fn name(&self) -> &'static str {
        "gosec"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn command(&self, _scope: &ChangeScope) -> Command {
        // gosec analyzes packages, not file lists; scope gates applicability
        // only.
        let mut cmd = Command::new(self.binary());
        cmd.args(["-fmt=json", "-quiet", "./..."]);
        cmd
    }

    fn parse(&self, output: &ToolOutput) -> Result<ToolReport> {
        let doc: GosecDoc = serde_json::from_str(output.stdout.trim())
            .map_err(|e| unreadable(self.name(), e.to_string()))?;

        let findings = doc
            .issues
            .into_iter()
            .map(|issue| Finding {
                tool: self.name().to_string(),
                severity: map_severity(&issue.severity),
                line: first_line_number(&issue.line),
                file: Some(issue.file),
                message: issue.details,
            })
            .collect();

        Ok(ToolReport::from_findings(findings))
    }
}

//! semgrep adapter (multi-language SAST).
//!
//! Severity table: rule severity ERROR maps to CRITICAL, WARNING to HIGH,
//! INFO to MEDIUM.

use super::{unreadable, ToolAdapter, ToolOutput, ToolReport};
use crate::error::Result;
use crate::scope::ChangeScope;
use crate::types::{Finding, Severity};
use serde::Deserialize;
use std::process::Command;

pub struct Semgrep;

#[derive(Debug, Deserialize)]
struct SemgrepDoc {
    results: Vec<SemgrepResult>,
}

#[derive(Debug, Deserialize)]
struct SemgrepResult {
    check_id: String,
    path: String,
    start: SemgrepPosition,
    extra: SemgrepExtra,
}

#[derive(Debug, Deserialize)]
struct SemgrepPosition {
    line: u64,
}

#[derive(Debug, Deserialize)]
struct SemgrepExtra {
    severity: String,
    message: String,
}

fn map_severity(native: &str) -> Severity {
    match native {
        "ERROR" => Severity::Critical,
        "WARNING" => Severity::High,
        _ => Severity::Medium,
    }
}

impl ToolAdapter for Semgrep {
    fn name(&self) -> &'static str {
        "semgrep"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[
            "go", "py", "js", "ts", "jsx", "tsx", "java", "rb", "rs", "c", "cpp", "sh", "yaml",
            "yml", "json", "tf",
        ]
    }

    fn command(&self, scope: &ChangeScope) -> Command {
        let mut cmd = Command::new(self.binary());
        cmd.args(["scan", "--quiet", "--json", "--config", "auto"]);
        if scope.is_empty() {
            cmd.arg(".");
        } else {
            let files = scope.files_with_extensions(self.extensions());
            if files.is_empty() {
                cmd.arg(".");
            } else {
                cmd.args(files);
            }
        }
        cmd
    }

    fn parse(&self, output: &ToolOutput) -> Result<ToolReport> {
        let doc: SemgrepDoc = serde_json::from_str(output.stdout.trim())
            .map_err(|e| unreadable(self.name(), e.to_string()))?;

        let findings = doc
            .results
            .into_iter()
            .map(|r| Finding {
                tool: self.name().to_string(),
                severity: map_severity(&r.extra.severity),
                file: Some(r.path),
                line: Some(r.start.line),
                message: format!("{}: {}", r.check_id, r.extra.message.trim()),
            })
            .collect();

        Ok(ToolReport::from_findings(findings))
    }
}

//! go test adapter (test runner).
//!
//! Consumes the `-json` event stream. Severity table: each failed test maps
//! to HIGH; a package that fails without any test-level failure (typically a
//! build failure) also maps to HIGH. A stream that is not parseable as JSON
//! events is an invocation error.

use super::{unreadable, Phase, ToolAdapter, ToolOutput, ToolReport};
use crate::error::Result;
use crate::scope::ChangeScope;
use crate::types::{Finding, Severity};
use serde::Deserialize;
use std::process::Command;

pub struct GoTest;

#[derive(Debug, Deserialize)]
struct TestEvent {
    #[serde(rename = "Action")]
    action: String,
    #[serde(rename = "Package", default)]
    package: String,
    #[serde(rename = "Test")]
    test: Option<String>,
}

impl ToolAdapter for GoTest {
    fn name(&self) -> &'static str {
        "go-test"
    }

    fn binary(&self) -> &'static str {
        "go"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn slow(&self) -> bool {
        true
    }

    // Runs after the analyzers so it can pick up anything they build.
    fn phase(&self) -> Phase {
        Phase::Test
    }

    fn command(&self, _scope: &ChangeScope) -> Command {
        let mut cmd = Command::new(self.binary());
        cmd.args(["test", "-json", "./..."]);
        cmd
    }

    fn parse(&self, output: &ToolOutput) -> Result<ToolReport> {
        let trimmed = output.stdout.trim();
        if trimmed.is_empty() {
            return Err(unreadable(self.name(), "empty event stream"));
        }

        let mut failed_tests = Vec::new();
        let mut failed_packages = Vec::new();
        for line in trimmed.lines() {
            let event: TestEvent = serde_json::from_str(line)
                .map_err(|e| unreadable(self.name(), format!("{e}: {line}")))?;
            if event.action != "fail" {
                continue;
            }
            match event.test {
                Some(test) => failed_tests.push((event.package, test)),
                None => failed_packages.push(event.package),
            }
        }

        let mut findings: Vec<Finding> = failed_tests
            .into_iter()
            .map(|(package, test)| Finding {
                tool: self.name().to_string(),
                severity: Severity::High,
                file: None,
                line: None,
                message: format!("{test} failed in {package}"),
            })
            .collect();

        // A package fail with zero failing tests means the package never ran
        // its tests (build failure or panic outside a test).
        if findings.is_empty() {
            findings.extend(failed_packages.into_iter().map(|package| Finding {
                tool: self.name().to_string(),
                severity: Severity::High,
                file: None,
                line: None,
                message: format!("package {package} failed without test-level results"),
            }));
        }

        Ok(ToolReport::from_findings(findings))
    }
}

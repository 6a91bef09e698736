//! trivy adapter (dependency vulnerability scanner).
//!
//! Severity table: trivy already speaks the gate's taxonomy, so
//! CRITICAL/HIGH/MEDIUM/LOW map 1:1; UNKNOWN is graded LOW.

use super::{unreadable, ToolAdapter, ToolOutput, ToolReport};
use crate::error::Result;
use crate::scope::ChangeScope;
use crate::types::{Finding, Severity};
use serde::Deserialize;
use std::process::Command;

pub struct Trivy;

#[derive(Debug, Deserialize)]
struct TrivyDoc {
    #[serde(rename = "Results", default)]
    results: Vec<TrivyResult>,
}

#[derive(Debug, Deserialize)]
struct TrivyResult {
    #[serde(rename = "Target")]
    target: String,
    #[serde(rename = "Vulnerabilities", default)]
    vulnerabilities: Vec<TrivyVulnerability>,
}

#[derive(Debug, Deserialize)]
struct TrivyVulnerability {
    #[serde(rename = "VulnerabilityID")]
    id: String,
    #[serde(rename = "PkgName")]
    package: String,
    #[serde(rename = "Severity")]
    severity: String,
}

fn map_severity(native: &str) -> Severity {
    match native {
        "CRITICAL" => Severity::Critical,
        "HIGH" => Severity::High,
        "MEDIUM" => Severity::Medium,
        _ => Severity::Low,
    }
}

impl ToolAdapter for Trivy {
    fn name(&self) -> &'static str {
        "trivy"
    }

    // Lockfiles matter even when they sit outside the diff.
    fn command(&self, _scope: &ChangeScope) -> Command {
        let mut cmd = Command::new(self.binary());
        cmd.args(["fs", "--quiet", "--format", "json", "--scanners", "vuln", "."]);
        cmd
    }

    fn parse(&self, output: &ToolOutput) -> Result<ToolReport> {
        let doc: TrivyDoc = serde_json::from_str(output.stdout.trim())
            .map_err(|e| unreadable(self.name(), e.to_string()))?;

        let findings = doc
            .results
            .into_iter()
            .flat_map(|result| {
                let target = result.target;
                result
                    .vulnerabilities
                    .into_iter()
                    .map(move |vuln| Finding {
                        tool: "trivy".to_string(),
                        severity: map_severity(&vuln.severity),
                        file: Some(target.clone()),
                        line: None,
                        message: format!("{} in {}", vuln.id, vuln.package),
                    })
            })
            .collect();

        Ok(ToolReport::from_findings(findings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(stdout: &str) -> ToolOutput {
        ToolOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    #[test]
    fn test_clean_run_without_results_key() {
        let report = Trivy
            .parse(&output(r#"{"SchemaVersion": 2, "ArtifactName": "."}"#))
            .unwrap();
        assert_eq!(report.tally.total(), 0);
    }

    #[test]
    fn test_severities_map_one_to_one() {
        let payload = r#"{"Results": [
            {"Target": "go.mod", "Vulnerabilities": [
                {"VulnerabilityID": "CVE-2024-0001", "PkgName": "golang.org/x/net",
                 "Severity": "CRITICAL"},
                {"VulnerabilityID": "CVE-2024-0002", "PkgName": "golang.org/x/crypto",
                 "Severity": "HIGH"},
                {"VulnerabilityID": "CVE-2024-0003", "PkgName": "gopkg.in/yaml.v2",
                 "Severity": "MEDIUM"},
                {"VulnerabilityID": "CVE-2024-0004", "PkgName": "leftover",
                 "Severity": "LOW"}
            ]}
        ]}"#;
        let report = Trivy.parse(&output(payload)).unwrap();
        assert_eq!(report.tally.critical, 1);
        assert_eq!(report.tally.high, 1);
        assert_eq!(report.tally.medium, 1);
        assert_eq!(report.tally.low, 1);
        assert_eq!(report.findings[0].file.as_deref(), Some("go.mod"));
        assert!(report.findings[0].message.contains("CVE-2024-0001"));
    }

    #[test]
    fn test_unknown_severity_is_low() {
        let payload = r#"{"Results": [
            {"Target": "go.mod", "Vulnerabilities": [
                {"VulnerabilityID": "CVE-2024-9999", "PkgName": "p", "Severity": "UNKNOWN"}
            ]}
        ]}"#;
        let report = Trivy.parse(&output(payload)).unwrap();
        assert_eq!(report.tally.low, 1);
    }

    #[test]
    fn test_result_without_vulnerabilities_key() {
        let payload = r#"{"Results": [{"Target": "go.mod"}]}"#;
        let report = Trivy.parse(&output(payload)).unwrap();
        assert_eq!(report.tally.total(), 0);
    }

    #[test]
    fn test_non_json_output_is_error() {
        assert!(Trivy.parse(&output("FATAL: unable to initialize scanner")).is_err());
    }
}

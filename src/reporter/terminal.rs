use crate::reporter::Reporter;
use crate::types::{Finding, RunSummary, Severity, ToolStatus};
use colored::Colorize;

pub struct TerminalReporter {
    verbose: bool,
}

impl TerminalReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn severity_label(&self, severity: Severity) -> colored::ColoredString {
        let label = format!("[{}]", severity);
        match severity {
            Severity::Critical => label.red().bold(),
            Severity::High => label.yellow().bold(),
            Severity::Medium => label.cyan(),
            Severity::Low => label.white(),
        }
    }

    fn status_label(&self, status: ToolStatus) -> colored::ColoredString {
        match status {
            ToolStatus::Pass => status.as_str().green(),
            ToolStatus::Findings => status.as_str().yellow().bold(),
            ToolStatus::Error => status.as_str().red().bold(),
            ToolStatus::Timeout => status.as_str().red(),
            ToolStatus::NotInstalled => status.as_str().dimmed(),
            ToolStatus::Skipped => status.as_str().dimmed(),
        }
    }

    fn format_finding(&self, finding: &Finding) -> String {
        let location = match (&finding.file, finding.line) {
            (Some(file), Some(line)) => format!("{file}:{line}"),
            (Some(file), None) => file.clone(),
            _ => "-".to_string(),
        };
        format!(
            "{} {} {}: {}\n",
            self.severity_label(finding.severity),
            finding.tool.bright_magenta(),
            location,
            finding.message
        )
    }
}

impl Reporter for TerminalReporter {
    fn report(&self, summary: &RunSummary) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            format!("changegate v{} - change validation gate", summary.version).bold()
        ));
        output.push_str(&format!("Scope: {}\n", summary.scope_mode));
        output.push_str(&format!(
            "Tools: {} run, {} skipped\n\n",
            summary.tools_run, summary.tools_skipped
        ));

        if self.verbose || summary.tools_run > 0 {
            for (name, status) in &summary.tool_status {
                if !self.verbose && !status.ran() {
                    continue;
                }
                output.push_str(&format!("  {:<16} {}\n", name, self.status_label(*status)));
            }
            output.push('\n');
        }

        if summary.findings.is_empty() {
            if summary.tallies.total() == 0 {
                output.push_str(&"No findings.\n".green().to_string());
            }
        } else {
            // Grouped by severity, worst first.
            let mut ordered: Vec<&Finding> = summary.findings.iter().collect();
            ordered.sort_by(|a, b| b.severity.cmp(&a.severity));
            for finding in ordered {
                output.push_str(&self.format_finding(finding));
            }
        }

        output.push_str(&format!("{}\n", "━".repeat(50)));
        output.push_str(&format!(
            "Summary: {} critical, {} high, {} medium, {} low\n",
            summary.tallies.critical.to_string().red().bold(),
            summary.tallies.high.to_string().yellow().bold(),
            summary.tallies.medium.to_string().cyan(),
            summary.tallies.low
        ));

        if summary.missing_tools > 0 {
            output.push_str(&format!(
                "Missing or failed tools: {}\n",
                summary.missing_tools.to_string().yellow()
            ));
        }

        let verdict = if summary.exit_code == 0 {
            summary.gate_status.as_str().green().bold()
        } else {
            summary.gate_status.as_str().red().bold()
        };
        output.push_str(&format!(
            "Gate: {} (exit code {})\n",
            verdict, summary.exit_code
        ));

        output
    }
}

#[cfg(test)]
pub mod fixtures {
    use crate::adapter::{Phase, ToolAdapter, ToolOutput, ToolReport};
    use crate::error::Result;
    use crate::scope::ChangeScope;
    use crate::types::{Finding, Severity, Tally};
    use std::process::Command;

    /// Shell-backed adapter for scheduler and engine tests. Its script prints
    /// four counts ("critical high medium low"); anything else parses as an
    /// invocation error, mirroring the structured-output contract.
    pub struct FakeAdapter {
        pub name: &'static str,
        pub binary: &'static str,
        pub script: String,
        pub exts: &'static [&'static str],
        pub slow: bool,
        pub phase: Phase,
    }

    impl FakeAdapter {
        pub fn with_script(name: &'static str, script: &str) -> Self {
            Self {
                name,
                binary: "sh",
                script: script.to_string(),
                exts: &[],
                slow: false,
                phase: Phase::Analyze,
            }
        }

        pub fn passing(name: &'static str) -> Self {
            Self::with_script(name, "echo 0 0 0 0")
        }

        pub fn erroring(name: &'static str) -> Self {
            Self::with_script(name, "echo not-a-tally")
        }

        pub fn with_binary(name: &'static str, binary: &'static str) -> Self {
            Self {
                binary,
                ..Self::passing(name)
            }
        }
    }

    impl ToolAdapter for FakeAdapter {
        fn name(&self) -> &'static str {
            self.name
        }

        fn binary(&self) -> &'static str {
            self.binary
        }

        fn extensions(&self) -> &'static [&'static str] {
            self.exts
        }

        fn slow(&self) -> bool {
            self.slow
        }

        fn phase(&self) -> Phase {
            self.phase
        }

        fn command(&self, _scope: &ChangeScope) -> Command {
            let mut cmd = Command::new(self.binary);
            cmd.args(["-c", &self.script]);
            cmd
        }

        fn parse(&self, output: &ToolOutput) -> Result<ToolReport> {
            let counts: Vec<usize> = output
                .stdout
                .split_whitespace()
                .map(|s| s.parse::<usize>())
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| crate::error::GateError::ToolOutput {
                    tool: self.name.to_string(),
                    message: e.to_string(),
                })?;
            if counts.len() != 4 {
                return Err(crate::error::GateError::ToolOutput {
                    tool: self.name.to_string(),
                    message: format!("expected 4 counts, got {}", counts.len()),
                });
            }
            Ok(ToolReport {
                tally: Tally {
                    critical: counts[0],
                    high: counts[1],
                    medium: counts[2],
                    low: counts[3],
                },
                findings: Vec::new(),
            })
        }
    }

    pub fn make_finding(tool: &str, severity: Severity, message: &str) -> Finding {
        Finding {
            tool: tool.to_string(),
            severity,
            file: Some("main.go".to_string()),
            line: Some(1),
            message: message.to_string(),
        }
    }
}

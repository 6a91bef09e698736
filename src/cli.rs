use crate::exec::TimeoutPolicy;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "changegate",
    version,
    about = "Validation gate for code changes",
    long_about = "changegate runs the installed analysis tools (linters, SAST, secret and \
                  CVE scanners, test runners) against a change and renders one \
                  deterministic pass/fail decision."
)]
pub struct Cli {
    /// Repository to validate
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub repo: PathBuf,

    /// Skip slow tools (test runners, secret scanners)
    #[arg(long)]
    pub quick: bool,

    /// Emit the machine-readable summary instead of the human log
    #[arg(long)]
    pub json: bool,

    /// Restrict analysis to the changed-file scope and fail on severity
    #[arg(long)]
    pub gate: bool,

    /// Treat missing or erroring tools as a gate failure (exit 4)
    #[arg(long)]
    pub require_tools: bool,

    /// Run checks one at a time instead of in parallel batches
    #[arg(long)]
    pub serial: bool,

    /// Hard per-check timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Whether a timed-out check degrades or blocks under --require-tools
    #[arg(long, value_enum, value_name = "POLICY")]
    pub timeout_policy: Option<TimeoutPolicy>,

    /// Base directory for run artifacts
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_values() {
        let cli = Cli::try_parse_from(["changegate"]).unwrap();
        assert_eq!(cli.repo, PathBuf::from("."));
        assert!(!cli.quick);
        assert!(!cli.json);
        assert!(!cli.gate);
        assert!(!cli.require_tools);
        assert!(!cli.serial);
        assert!(cli.timeout.is_none());
        assert!(cli.timeout_policy.is_none());
        assert!(cli.output_dir.is_none());
    }

    #[test]
    fn test_parse_gate_flags() {
        let cli =
            Cli::try_parse_from(["changegate", "--quick", "--gate", "--require-tools"]).unwrap();
        assert!(cli.quick);
        assert!(cli.gate);
        assert!(cli.require_tools);
    }

    #[test]
    fn test_parse_json_mode() {
        let cli = Cli::try_parse_from(["changegate", "--json"]).unwrap();
        assert!(cli.json);
    }

    #[test]
    fn test_parse_timeout_policy() {
        let cli = Cli::try_parse_from(["changegate", "--timeout", "60", "--timeout-policy", "block"])
            .unwrap();
        assert_eq!(cli.timeout, Some(60));
        assert_eq!(cli.timeout_policy, Some(TimeoutPolicy::Block));
    }

    #[test]
    fn test_parse_output_dir() {
        let cli = Cli::try_parse_from(["changegate", "--output-dir", "/tmp/runs"]).unwrap();
        assert_eq!(cli.output_dir, Some(PathBuf::from("/tmp/runs")));
    }

    #[test]
    fn test_parse_repo() {
        let cli = Cli::try_parse_from(["changegate", "--repo", "../service"]).unwrap();
        assert_eq!(cli.repo, PathBuf::from("../service"));
    }

    #[test]
    fn test_invalid_timeout_policy_rejected() {
        assert!(Cli::try_parse_from(["changegate", "--timeout-policy", "sometimes"]).is_err());
    }
}

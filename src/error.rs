//! Error types for changegate.
//!
//! Failures accumulate per check instead of aborting the run; the variants
//! here cover the engine's own plumbing (I/O, serialization, configuration),
//! not tool findings.

use crate::config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("Failed to launch {tool}: {message}")]
    Spawn { tool: String, message: String },

    #[error("{tool} produced unreadable output: {message}")]
    ToolOutput { tool: String, message: String },

    #[error("Failed to write artifact {path}")]
    Artifact {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_output_error_display() {
        let err = GateError::ToolOutput {
            tool: "semgrep".to_string(),
            message: "expected JSON, got a stack trace".to_string(),
        };
        assert!(err.to_string().contains("semgrep"));
        assert!(err.to_string().contains("unreadable output"));
    }

    #[test]
    fn test_spawn_error_display() {
        let err = GateError::Spawn {
            tool: "trivy".to_string(),
            message: "permission denied".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to launch trivy: permission denied");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: GateError = json_err.into();
        assert!(err.to_string().contains("JSON serialization error"));
    }
}

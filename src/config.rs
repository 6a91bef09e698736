//! Configuration loading.
//!
//! An optional `.changegate.{yaml,yml,json,toml}` file at the repository root
//! supplies defaults for knobs that are also available as CLI flags; flags
//! always win.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::exec::TimeoutPolicy;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {path}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML config: {path}")]
    ParseYaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to parse JSON config: {path}")]
    ParseJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse TOML config: {path}")]
    ParseToml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Unsupported config format: {0} ({1})")]
    UnsupportedFormat(String, String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Base directory for run artifacts.
    #[serde(default)]
    pub output_dir: Option<String>,

    /// Hard per-check timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Whether a timed-out check blocks the gate or degrades.
    #[serde(default)]
    pub timeout_policy: Option<TimeoutPolicy>,

    /// Treat missing or erroring tools as a gate failure.
    #[serde(default)]
    pub require_tools: Option<bool>,

    /// Adapters disabled by name.
    #[serde(default)]
    pub skip_tools: Vec<String>,
}

const CONFIG_FILENAMES: &[&str] = &[
    ".changegate.yaml",
    ".changegate.yml",
    ".changegate.json",
    ".changegate.toml",
];

impl Config {
    /// Load configuration from a file, dispatching on extension.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.display().to_string(),
            source: e,
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseYaml {
                path: path.display().to_string(),
                source: e,
            }),
            "json" => serde_json::from_str(&content).map_err(|e| ConfigError::ParseJson {
                path: path.display().to_string(),
                source: e,
            }),
            "toml" => toml::from_str(&content).map_err(|e| ConfigError::ParseToml {
                path: path.display().to_string(),
                source: e,
            }),
            _ => Err(ConfigError::UnsupportedFormat(
                path.display().to_string(),
                ext,
            )),
        }
    }

    /// Load configuration from the repository root, trying each supported
    /// filename in order. A missing file yields defaults; a present but
    /// malformed file is an error.
    pub fn load(repo_root: &Path) -> Result<Self, ConfigError> {
        for filename in CONFIG_FILENAMES {
            let path = repo_root.join(filename);
            if path.is_file() {
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    pub fn is_tool_skipped(&self, name: &str) -> bool {
        self.skip_tools.iter().any(|t| t == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_config_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.output_dir.is_none());
        assert!(config.timeout_secs.is_none());
        assert!(config.skip_tools.is_empty());
    }

    #[test]
    fn test_load_yaml_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".changegate.yaml"),
            "timeout_secs: 120\nskip_tools:\n  - trivy\n",
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.timeout_secs, Some(120));
        assert!(config.is_tool_skipped("trivy"));
        assert!(!config.is_tool_skipped("semgrep"));
    }

    #[test]
    fn test_load_toml_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".changegate.toml"),
            "require_tools = true\ntimeout_policy = \"block\"\n",
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.require_tools, Some(true));
        assert_eq!(config.timeout_policy, Some(TimeoutPolicy::Block));
    }

    #[test]
    fn test_load_json_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".changegate.json"),
            r#"{"output_dir": "/tmp/gate-runs"}"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.output_dir.as_deref(), Some("/tmp/gate-runs"));
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".changegate.yaml"), "timeout_secs: [nope").unwrap();

        assert!(Config::load(dir.path()).is_err());
    }

    #[test]
    fn test_unknown_field_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".changegate.toml"), "timeout_sec = 5\n").unwrap();

        assert!(Config::load(dir.path()).is_err());
    }

    #[test]
    fn test_unsupported_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        fs::write(&path, "a=1").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported config format"));
    }
}

//! Run artifact persistence.
//!
//! Every run owns a fresh directory named by UTC timestamp and scope mode,
//! never reused and never shared with another run; concurrent runs therefore
//! need no locking. Raw tool output lands as `<tool>.txt` (stdout) and
//! `<tool>.stderr.txt`, plus one `summary.json`. Artifact failures degrade:
//! a copy that cannot be written is logged and the reported result stands.

use crate::error::{GateError, Result};
use crate::exec::CheckOutcome;
use crate::scope::ScopeMode;
use crate::types::RunSummary;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const OUTPUT_DIR_ENV: &str = "CHANGEGATE_OUTPUT_DIR";
pub const DEFAULT_OUTPUT_DIR: &str = ".changegate/runs";

pub struct ArtifactWriter {
    base: PathBuf,
}

impl ArtifactWriter {
    pub fn new(base: &Path) -> Self {
        Self {
            base: base.to_path_buf(),
        }
    }

    /// Resolve the artifact base directory: flag, then environment, then
    /// config, then the default under the repository.
    pub fn resolve_base(
        repo: &Path,
        flag: Option<&Path>,
        config: Option<&str>,
    ) -> PathBuf {
        if let Some(dir) = flag {
            return dir.to_path_buf();
        }
        if let Some(dir) = std::env::var_os(OUTPUT_DIR_ENV) {
            return PathBuf::from(dir);
        }
        if let Some(dir) = config {
            return repo.join(dir);
        }
        repo.join(DEFAULT_OUTPUT_DIR)
    }

    /// Create a fresh run directory. A timestamp collision (two runs in the
    /// same second) gets a numeric suffix rather than reusing the directory.
    pub fn create_run_dir(&self, mode: ScopeMode) -> Result<PathBuf> {
        let run_id = format!(
            "{}-{}",
            chrono::Utc::now().format("%Y%m%dT%H%M%SZ"),
            mode.as_str()
        );

        fs::create_dir_all(&self.base).map_err(|e| GateError::Artifact {
            path: self.base.display().to_string(),
            source: e,
        })?;

        // create_dir, not create_dir_all: an existing directory must read as
        // a collision so two runs in the same second land on distinct
        // suffixes instead of sharing one directory.
        let mut attempt = 1;
        loop {
            let dir = if attempt == 1 {
                self.base.join(&run_id)
            } else {
                self.base.join(format!("{run_id}-{attempt}"))
            };
            match fs::create_dir(&dir) {
                Ok(()) => return Ok(dir),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => {
                    return Err(GateError::Artifact {
                        path: dir.display().to_string(),
                        source: e,
                    });
                }
            }
        }
    }

    /// Persist one check's raw output. Failures are logged, never fatal.
    pub fn write_outcome(&self, run_dir: &Path, outcome: &CheckOutcome) {
        if !outcome.status.ran() {
            return;
        }

        let stdout_path = run_dir.join(format!("{}.txt", outcome.name));
        if let Err(e) = fs::write(&stdout_path, &outcome.stdout) {
            warn!(path = %stdout_path.display(), error = %e, "artifact write failed");
        }

        if !outcome.stderr.is_empty() {
            let stderr_path = run_dir.join(format!("{}.stderr.txt", outcome.name));
            if let Err(e) = fs::write(&stderr_path, &outcome.stderr) {
                warn!(path = %stderr_path.display(), error = %e, "artifact write failed");
            }
        }
    }

    /// Persist the structured summary. Written once, at the end of the run.
    pub fn write_summary(&self, run_dir: &Path, summary: &RunSummary) -> Result<()> {
        let path = run_dir.join("summary.json");
        let json = serde_json::to_string_pretty(summary)?;
        fs::write(&path, json).map_err(|e| GateError::Artifact {
            path: path.display().to_string(),
            source: e,
        })
    }
}

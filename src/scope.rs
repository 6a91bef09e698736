//! Change scope resolution.
//!
//! A run is bounded to one file set, resolved once and never recomputed.
//! Precedence, first non-empty wins: staged diff, unstaged diff, files touched
//! by the most recent commit, empty. Running outside a repository (or in one
//! with no commits) is a valid degraded mode, not an error: whole-repository
//! tools still execute and extension-gated tools report a typed skip.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeMode {
    Staged,
    Unstaged,
    LastCommit,
    None,
}

impl ScopeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeMode::Staged => "staged",
            ScopeMode::Unstaged => "unstaged",
            ScopeMode::LastCommit => "last-commit",
            ScopeMode::None => "none",
        }
    }
}

impl std::fmt::Display for ScopeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The immutable file set under test for one run.
#[derive(Debug, Clone)]
pub struct ChangeScope {
    pub mode: ScopeMode,
    pub files: BTreeSet<PathBuf>,
    /// Lowercased extensions present in `files`, for applicability checks.
    extensions: FxHashSet<String>,
}

impl ChangeScope {
    pub fn new(mode: ScopeMode, files: BTreeSet<PathBuf>) -> Self {
        let extensions = files
            .iter()
            .filter_map(|p| p.extension())
            .filter_map(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .collect();
        Self {
            mode,
            files,
            extensions,
        }
    }

    /// Empty scope in degraded mode.
    pub fn empty() -> Self {
        Self::new(ScopeMode::None, BTreeSet::new())
    }

    /// The resolved mode with the file set dropped. Used when scope-gating is
    /// off: tools run whole-repo but the summary still reports how the scope
    /// resolved.
    pub fn unbounded(&self) -> Self {
        Self::new(self.mode, BTreeSet::new())
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Whether any scoped file carries one of the given extensions.
    pub fn has_any_extension(&self, extensions: &[&str]) -> bool {
        extensions
            .iter()
            .any(|e| self.extensions.contains(&e.to_lowercase()))
    }

    /// Scoped files carrying one of the given extensions, in deterministic
    /// order.
    pub fn files_with_extensions(&self, extensions: &[&str]) -> Vec<&Path> {
        self.files
            .iter()
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| {
                        let lower = e.to_lowercase();
                        extensions.iter().any(|x| x.to_lowercase() == lower)
                    })
                    .unwrap_or(false)
            })
            .map(PathBuf::as_path)
            .collect()
    }
}

/// Resolve the change scope for a repository. Exactly one strategy wins.
pub fn resolve(repo: &Path) -> ChangeScope {
    let strategies: [(ScopeMode, &[&str]); 3] = [
        (ScopeMode::Staged, &["diff", "--name-only", "--cached"]),
        (ScopeMode::Unstaged, &["diff", "--name-only"]),
        // --root makes a root commit diff against the empty tree; without it
        // a single-commit repository reads as no change at all.
        (
            ScopeMode::LastCommit,
            &[
                "diff-tree",
                "--no-commit-id",
                "--name-only",
                "-r",
                "--root",
                "HEAD",
            ],
        ),
    ];

    for (mode, args) in strategies {
        match git_file_list(repo, args) {
            Some(files) if !files.is_empty() => {
                debug!(mode = mode.as_str(), files = files.len(), "scope resolved");
                return ChangeScope::new(mode, files);
            }
            Some(_) => continue,
            // git missing, not a repository, or no commits yet: degrade.
            None => continue,
        }
    }

    debug!("scope resolution degraded to empty");
    ChangeScope::empty()
}

fn git_file_list(repo: &Path, args: &[&str]) -> Option<BTreeSet<PathBuf>> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Some(
        stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(PathBuf::from)
            .collect(),
    )
}

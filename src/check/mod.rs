//! Drift check: verify the vendored tree matches what is committed.
//!
//! After vendoring, a reproducible configuration leaves the working tree
//! exactly as committed. Any path with a non-unmodified index or working-tree
//! state, and any untracked path, is drift. Findings are data, not errors: the
//! check returns a [`DriftReport`] and the CLI converts a dirty report into a
//! single failure.
//!
//! # Examples
//!
//! ```rust,no_run
//! use chart_vendor::check::DriftChecker;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let report = DriftChecker::new(".").check().await?;
//! if !report.is_clean() {
//!     report.log();
//! }
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::core::ChartVendorError;
use crate::git::{FileStatus, GitCommand, parse_porcelain_status};

/// Inspects the version-control state of a working directory.
#[derive(Debug, Clone)]
pub struct DriftChecker {
    working_dir: PathBuf,
}

/// Result of a drift check: every dirty path reported by git.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriftReport {
    /// Paths that differ from the committed tree
    pub files: Vec<FileStatus>,
}

impl DriftChecker {
    /// Create a checker for `working_dir`.
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        Self {
            working_dir: working_dir.as_ref().to_path_buf(),
        }
    }

    /// Collect the drift report for the working directory.
    pub async fn check(&self) -> Result<DriftReport> {
        let output = GitCommand::status_porcelain().current_dir(&self.working_dir).execute().await?;
        let statuses = parse_porcelain_status(&output.stdout)?;
        Ok(DriftReport::from_statuses(statuses))
    }

    /// The working-tree diff, used as diagnostic output when drift is found.
    pub async fn diff(&self) -> Result<String> {
        Ok(GitCommand::diff().current_dir(&self.working_dir).execute().await?.stdout)
    }

    /// Run the check, log the findings, and fail with
    /// [`ChartVendorError::DriftDetected`] when the tree is dirty.
    pub async fn verify(&self) -> Result<()> {
        let report = self.check().await?;
        if report.is_clean() {
            tracing::info!("No uncommitted changes or untracked files.");
            return Ok(());
        }

        report.log();
        match self.diff().await {
            Ok(diff) if !diff.trim().is_empty() => tracing::info!("Diff output:\n{}", diff),
            Ok(_) => {}
            Err(e) => tracing::error!("Failed to get git diff: {e:#}"),
        }

        Err(report.into_error().into())
    }
}

impl DriftReport {
    /// Keep only dirty entries from a status listing.
    pub fn from_statuses(statuses: impl IntoIterator<Item = FileStatus>) -> Self {
        Self {
            files: statuses.into_iter().filter(FileStatus::is_dirty).collect(),
        }
    }

    /// Whether no file is modified or untracked.
    pub fn is_clean(&self) -> bool {
        self.files.is_empty()
    }

    /// Tracked files with index or working-tree changes.
    pub fn changed(&self) -> impl Iterator<Item = &FileStatus> {
        self.files.iter().filter(|status| !status.is_untracked())
    }

    /// Untracked files.
    pub fn untracked(&self) -> impl Iterator<Item = &FileStatus> {
        self.files.iter().filter(|status| status.is_untracked())
    }

    /// Log every dirty file.
    pub fn log(&self) {
        for status in self.changed() {
            tracing::warn!("Changed file: {}", status.path);
        }
        for status in self.untracked() {
            tracing::warn!("Untracked file: {}", status.path);
        }
    }

    /// Convert the report into the error raised at the CLI boundary.
    pub fn into_error(self) -> ChartVendorError {
        ChartVendorError::DriftDetected {
            files: self.files.into_iter().map(|status| status.path).collect(),
        }
    }
}

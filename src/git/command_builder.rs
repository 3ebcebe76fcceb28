//! Type-safe Git command builder for consistent command execution
//!
//! This module provides a fluent API for building and executing Git commands with
//! uniform logging and error mapping.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::core::ChartVendorError;

/// Builder for constructing and executing Git commands.
///
/// # Examples
///
/// ```rust,no_run
/// use chart_vendor::git::GitCommand;
///
/// # async fn example() -> anyhow::Result<()> {
/// let output = GitCommand::new()
///     .args(["status", "--porcelain=v1", "-z"])
///     .current_dir("/path/to/repo")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
///
/// New commands capture stdout and stderr and run in the current process
/// directory unless [`current_dir`](Self::current_dir) is set, in which case
/// `git -C <dir>` is used.
#[derive(Debug, Default)]
pub struct GitCommand {
    /// Command arguments to pass to Git
    args: Vec<String>,

    /// Working directory for command execution (passed with `-C`)
    current_dir: Option<PathBuf>,

    /// Optional context string for log messages
    context: Option<String>,
}

/// Captured output of a successful Git command.
#[derive(Debug, Clone)]
pub struct GitCommandOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl GitCommand {
    /// Creates a new Git command builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the working directory for Git command execution.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Adds a single argument to the Git command.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Adds multiple arguments to the Git command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds a context label used in log messages.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Execute the command and return its output.
    ///
    /// A non-zero exit status is reported as [`ChartVendorError::GitCommandError`];
    /// a missing git executable as [`ChartVendorError::GitNotFound`].
    pub async fn execute(self) -> Result<GitCommandOutput> {
        let mut full_args = Vec::new();
        if let Some(ref dir) = self.current_dir {
            full_args.push("-C".to_string());
            full_args.push(dir.display().to_string());
        }
        full_args.extend(self.args.iter().cloned());

        let context = self.context.as_deref().unwrap_or("git");
        tracing::debug!(target: "git", "({}) Executing command: git {}", context, full_args.join(" "));

        let output = match Command::new("git")
            .args(&full_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ChartVendorError::GitNotFound.into());
            }
            Err(e) => {
                return Err(e).context(format!("Failed to execute git {}", full_args.join(" ")));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            tracing::debug!(
                target: "git",
                "({}) Command failed with exit code: {:?}",
                context,
                output.status.code()
            );
            return Err(ChartVendorError::GitCommandError {
                operation: self.args.first().cloned().unwrap_or_else(|| "unknown".to_string()),
                stderr,
            }
            .into());
        }

        if !stderr.is_empty() {
            tracing::debug!(target: "git", "({}) {}", context, stderr.trim());
        }

        Ok(GitCommandOutput {
            stdout,
            stderr,
        })
    }

    /// Builder for `git status` in machine-readable form, NUL separated, listing
    /// every untracked file individually.
    pub fn status_porcelain() -> Self {
        Self::new()
            .args(["status", "--porcelain=v1", "-z", "--untracked-files=all"])
            .with_context("drift check")
    }

    /// Builder for `git diff` of the working tree. Output is captured, so git
    /// never starts a pager.
    pub fn diff() -> Self {
        Self::new().arg("diff").with_context("drift diff")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_arguments() {
        let cmd = GitCommand::new().arg("status").args(["--short", "-z"]).current_dir("/repo");
        assert_eq!(cmd.args, vec!["status", "--short", "-z"]);
        assert_eq!(cmd.current_dir, Some(PathBuf::from("/repo")));
    }

    #[test]
    fn test_status_porcelain_arguments() {
        let cmd = GitCommand::status_porcelain();
        assert_eq!(cmd.args, vec!["status", "--porcelain=v1", "-z", "--untracked-files=all"]);
    }

    #[tokio::test]
    async fn test_failure_maps_to_git_command_error() {
        if !super::super::is_git_installed() {
            return;
        }
        let temp = tempfile::tempdir().unwrap();
        // Not a repository
        let err = GitCommand::status_porcelain().current_dir(temp.path()).execute().await;
        let err = err.unwrap_err();
        match err.downcast_ref::<ChartVendorError>() {
            Some(ChartVendorError::GitCommandError { operation, .. }) => {
                assert_eq!(operation, "status");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

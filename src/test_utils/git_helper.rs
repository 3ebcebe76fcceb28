//! Git test helper utilities
//!
//! Provides a small synchronous wrapper around the `git` binary for setting up
//! repositories in tests. Production code goes through
//! [`GitCommand`](crate::git::GitCommand) instead.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;

/// A git repository used as a test fixture.
pub struct TestGit {
    repo_path: PathBuf,
}

impl TestGit {
    fn run_git_command(&self, args: &[&str], action: &str) -> Result<std::process::Output> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .output()
            .with_context(|| action.to_string())?;

        if !output.status.success() {
            bail!("{} failed: {}", action, String::from_utf8_lossy(&output.stderr));
        }

        Ok(output)
    }

    /// Wrap an existing directory.
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    /// `git init` plus a local identity, ready for commits.
    pub fn init(&self) -> Result<()> {
        self.run_git_command(&["init", "--quiet"], "Failed to initialize git repository")?;
        self.run_git_command(
            &["config", "user.email", "test@chart-vendor.example"],
            "Failed to configure git user email",
        )?;
        self.run_git_command(
            &["config", "user.name", "Test User"],
            "Failed to configure git user name",
        )?;
        self.run_git_command(
            &["config", "commit.gpgsign", "false"],
            "Failed to disable commit signing",
        )?;
        Ok(())
    }

    /// Stage everything.
    pub fn add_all(&self) -> Result<()> {
        self.run_git_command(&["add", "--all"], "Failed to add files to git")?;
        Ok(())
    }

    /// Commit the staged changes.
    pub fn commit(&self, message: &str) -> Result<()> {
        self.run_git_command(
            &["commit", "--quiet", "--allow-empty", "-m", message],
            "Failed to create git commit",
        )?;
        Ok(())
    }

    /// Stage and commit everything.
    pub fn commit_all(&self, message: &str) -> Result<()> {
        self.add_all()?;
        self.commit(message)
    }

    /// Path of the repository.
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }
}

//! Error handling for chart-vendor
//!
//! This module provides the typed errors raised by the vendoring pipeline and the
//! user-facing rendering used by the CLI. The error system follows two principles:
//! 1. **Strongly-typed errors** for precise handling in code and in tests
//! 2. **User-friendly messages** with actionable suggestions at the process boundary
//!
//! # Error Categories
//!
//! Failures are grouped the same way the vendoring pipeline fails:
//! - **Filesystem**: [`ChartVendorError::FileSystemError`] for remove/rename/write failures
//! - **External processes**: [`ChartVendorError::PatchStageFailed`] and
//!   [`ChartVendorError::ToolNotFound`], attributed to a [`PatchStage`]
//! - **Remote fetches**: [`ChartVendorError::ChartNotFound`],
//!   [`ChartVendorError::ChartDownloadFailed`], [`ChartVendorError::PatchFetchFailed`]
//! - **Rollback**: [`ChartVendorError::RollbackFailed`] keeps both the triggering
//!   fetch error and the error raised while restoring the previous directory
//! - **Drift**: [`ChartVendorError::DriftDetected`] is raised only at the CLI
//!   boundary, after the drift report has been logged
//!
//! Library functions return [`anyhow::Result`]; typed errors are raised with
//! `ChartVendorError::X { .. }.into()` and recovered with `downcast_ref`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use chart_vendor::core::{ChartVendorError, user_friendly_error};
//!
//! let error = anyhow::Error::from(ChartVendorError::ToolNotFound {
//!     tool: "filterdiff".to_string(),
//! });
//! let ctx = user_friendly_error(error);
//! ctx.display(); // Colored error with a suggestion on stderr
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use super::file_error::FileOperationError;

/// A stage of the patch-application pipeline.
///
/// Every external-process failure while patching is attributed to exactly one
/// stage so that "include filter failed", "exclude filter failed" and
/// "patch application failed" stay distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchStage {
    /// Restricts the diff to files inside the chart directory
    IncludeFilter,
    /// Removes protected files from the diff
    ExcludeFilter,
    /// Applies the filtered diff to the chart directory
    Apply,
}

impl PatchStage {
    /// Human readable label used in error messages and logs.
    pub const fn label(self) -> &'static str {
        match self {
            Self::IncludeFilter => "include filter",
            Self::ExcludeFilter => "exclude filter",
            Self::Apply => "patch application",
        }
    }
}

impl fmt::Display for PatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The main error type for chart-vendor operations.
///
/// Each variant describes one failure mode of the vendoring pipeline and carries
/// enough context (paths, chart coordinates, captured process output) to be
/// reported without the underlying error chain.
#[derive(Error, Debug, Clone)]
pub enum ChartVendorError {
    /// A filesystem operation (remove, rename, write) failed.
    #[error("File system error during {operation}: {path}")]
    FileSystemError {
        /// The operation that failed (e.g. "rename", "remove backup")
        operation: String,
        /// The path being operated on
        path: String,
        /// The underlying I/O error rendered as text
        reason: String,
    },

    /// A patch pipeline stage exited unsuccessfully or could not be driven.
    #[error("{stage} failed{}", status.map(|code| format!(" (exit status {code})")).unwrap_or_default())]
    PatchStageFailed {
        /// The stage that failed
        stage: PatchStage,
        /// The process exit code, when the process exited normally
        status: Option<i32>,
        /// Captured stdout/stderr of the failing stage
        output: String,
    },

    /// A required external tool is not installed.
    #[error("Required tool '{tool}' is not installed or not found in PATH")]
    ToolNotFound {
        /// The executable name (e.g. "filterdiff", "patch", "git")
        tool: String,
    },

    /// The chart repository index has no entry for the requested version.
    #[error("Could not find chart '{name}' with version '{version}' in {repository}")]
    ChartNotFound {
        /// Chart name
        name: String,
        /// Requested version
        version: String,
        /// Repository URL
        repository: String,
    },

    /// Downloading a chart (or its repository index) failed.
    #[error("Failed to download chart '{name}' from {url}: {reason}")]
    ChartDownloadFailed {
        /// Chart name, or "index" for repository index downloads
        name: String,
        /// The URL that was requested
        url: String,
        /// Why the download failed
        reason: String,
    },

    /// A downloaded chart archive is unusable.
    #[error("Invalid chart archive for '{name}': {reason}")]
    ArchiveInvalid {
        /// Chart name
        name: String,
        /// What is wrong with the archive
        reason: String,
    },

    /// Fetching a patch from the review system failed.
    #[error("Failed to fetch patch for change {change} from {host}: {reason}")]
    PatchFetchFailed {
        /// Review-system host instance
        host: String,
        /// Change identifier
        change: String,
        /// Why the fetch failed
        reason: String,
    },

    /// Restoring the previous chart directory after a failed fetch also failed.
    ///
    /// Both errors are preserved: the fetch error that triggered the rollback and
    /// the error raised by the rollback itself.
    #[error("Failed to restore '{directory}' after fetch error: {rollback_error} (fetch error: {fetch_error})")]
    RollbackFailed {
        /// The chart directory that could not be restored
        directory: String,
        /// The error returned by the chart fetch
        fetch_error: String,
        /// The error returned while undoing the directory swap
        rollback_error: String,
    },

    /// The working tree has modified or untracked files after vendoring.
    #[error("Uncommitted changes or untracked files found ({} files)", files.len())]
    DriftDetected {
        /// Every dirty path reported by version control
        files: Vec<String>,
    },

    /// Git is not available.
    #[error("Git is not installed or not found in PATH")]
    GitNotFound,

    /// A git command returned a non-zero exit status.
    #[error("Git operation failed: {operation}")]
    GitCommandError {
        /// The git subcommand that failed (e.g. "status", "diff")
        operation: String,
        /// The error output from git
        stderr: String,
    },

    /// The vendoring configuration could not be loaded or is invalid.
    #[error("Invalid configuration in {file}: {reason}")]
    ConfigError {
        /// The configuration file
        file: String,
        /// What is wrong with it
        reason: String,
    },

    /// Any other failure, with its full error chain rendered into the message.
    #[error("{message}")]
    Other {
        /// The error message
        message: String,
    },
}

/// Error wrapper carrying a user-facing suggestion and details.
///
/// Produced by [`user_friendly_error`] and printed by the binary before exiting
/// with a non-zero status.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ChartVendorError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: ChartVendorError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors.
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Convert any error into an [`ErrorContext`] suitable for display.
///
/// Typed [`ChartVendorError`]s anywhere in the chain get tailored suggestions;
/// anything else is reported as [`ChartVendorError::Other`] with the full
/// `Caused by:` chain so no context is lost.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(typed) = error.chain().find_map(|cause| cause.downcast_ref::<ChartVendorError>()) {
        let mut ctx = create_error_context(typed.clone());
        // Keep the outer context (which chart, which patch) visible. The chain
        // head is checked because `downcast_ref` sees through context layers.
        let wrapped = error.chain().next().is_some_and(|head| !head.is::<ChartVendorError>());
        if wrapped {
            let outer = error
                .chain()
                .take_while(|cause| cause.downcast_ref::<ChartVendorError>().is_none())
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(": ");
            ctx.details = Some(match ctx.details.take() {
                Some(details) => format!("{outer}\n{details}"),
                None => outer,
            });
        }
        return ctx;
    }

    if let Some(file_error) =
        error.chain().find_map(|cause| cause.downcast_ref::<FileOperationError>())
    {
        return ErrorContext::new(ChartVendorError::FileSystemError {
            operation: file_error.operation.to_string(),
            path: file_error.file_path.display().to_string(),
            reason: file_error.source.to_string(),
        })
        .with_suggestion(
            "Check permissions on the charts root and that no other process is using it",
        )
        .with_details(file_error.user_message());
    }

    let mut message = error.to_string();

    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(ChartVendorError::Other {
        message,
    })
}

fn create_error_context(error: ChartVendorError) -> ErrorContext {
    match &error {
        ChartVendorError::PatchStageFailed { stage, output, .. } => {
            let suggestion = match stage {
                PatchStage::IncludeFilter | PatchStage::ExcludeFilter => {
                    "Check that the patch is a valid unified diff with paths prefixed by the chart directory"
                }
                PatchStage::Apply => {
                    "The patch no longer applies to the upstream chart. Rebase the patch against the pinned chart version"
                }
            };
            let details = if output.trim().is_empty() {
                format!("The {stage} stage produced no output")
            } else {
                output.trim().to_string()
            };
            ErrorContext::new(error).with_suggestion(suggestion).with_details(details)
        }

        ChartVendorError::ToolNotFound { tool } => {
            let suggestion = format!(
                "Install '{tool}' (filterdiff ships with patchutils, patch with GNU patch) and make sure it is on PATH"
            );
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        ChartVendorError::ChartNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Check the chart name and version in the configuration against the repository index")
            .with_details("Versions are matched exactly; a leading 'v' in the repository index is ignored"),

        ChartVendorError::ChartDownloadFailed { .. } | ChartVendorError::PatchFetchFailed { .. } => {
            ErrorContext::new(error)
                .with_suggestion("Check your network connection and the repository URL, then run again")
                .with_details("Remote fetches are not retried; a transient failure fails the whole run")
        }

        ChartVendorError::RollbackFailed { directory, .. } => {
            let suggestion = format!(
                "Inspect '{directory}' and its versioned backup manually before running again"
            );
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        ChartVendorError::DriftDetected { files } => {
            let details = files.join("\n");
            ErrorContext::new(error)
                .with_suggestion("Commit the regenerated charts, or fix the configuration so vendoring is reproducible")
                .with_details(details)
        }

        ChartVendorError::GitNotFound => ErrorContext::new(error)
            .with_suggestion("Install git from https://git-scm.com/ or your package manager")
            .with_details("The drift check inspects the working tree with the git command line"),

        ChartVendorError::GitCommandError { stderr, .. } => {
            let details = stderr.trim().to_string();
            ErrorContext::new(error)
                .with_suggestion("Run the drift check from inside a git working tree")
                .with_details(details)
        }

        ChartVendorError::ConfigError { file, .. } => {
            let suggestion = format!("Fix {file}: every chart needs a name, version and repository url");
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        ChartVendorError::FileSystemError { reason, .. } => {
            let details = reason.clone();
            ErrorContext::new(error)
                .with_suggestion("Check permissions on the charts root and that no other process is using it")
                .with_details(details)
        }

        ChartVendorError::ArchiveInvalid { .. } | ChartVendorError::Other { .. } => {
            ErrorContext::new(error)
        }
    }
}

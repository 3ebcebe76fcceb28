//! Structured file system error handling
//!
//! Filesystem failures while vendoring are always fatal, so the useful part of
//! the error is the context: which operation, on which path, and why the path was
//! being touched. This module captures that context at the operation site rather
//! than parsing error messages afterwards.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Types of file operations performed while vendoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    /// Reading a file completely
    Read,
    /// Writing a file
    Write,
    /// Removing a file or directory tree
    Remove,
    /// Renaming a file or directory
    Rename,
    /// Creating a directory
    CreateDir,
    /// Listing directory entries
    List,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Read => write!(f, "reading"),
            FileOperation::Write => write!(f, "writing"),
            FileOperation::Remove => write!(f, "removing"),
            FileOperation::Rename => write!(f, "renaming"),
            FileOperation::CreateDir => write!(f, "creating directory"),
            FileOperation::List => write!(f, "listing"),
        }
    }
}

/// File operation error with full context
#[derive(Error, Debug)]
#[error("File operation failed: {operation} {} ({purpose})", file_path.display())]
pub struct FileOperationError {
    /// The type of operation that failed
    pub operation: FileOperation,
    /// The file path that was being accessed
    pub file_path: PathBuf,
    /// Why the file was being accessed
    pub purpose: String,
    /// The underlying IO error
    #[source]
    pub source: std::io::Error,
}

impl FileOperationError {
    /// Create a new file operation error
    pub fn new(
        operation: FileOperation,
        file_path: impl Into<PathBuf>,
        purpose: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self {
            operation,
            file_path: file_path.into(),
            purpose: purpose.into(),
            source,
        }
    }

    /// Whether the underlying error is "does not exist"
    pub fn is_not_found(&self) -> bool {
        self.source.kind() == std::io::ErrorKind::NotFound
    }

    /// Get a user-friendly error message with context
    pub fn user_message(&self) -> String {
        let mut message = format!(
            "Failed {} '{}' while {}",
            self.operation,
            self.file_path.display(),
            self.purpose
        );

        match self.source.kind() {
            std::io::ErrorKind::NotFound => {
                message.push_str("\n\nThe path does not exist.");
            }
            std::io::ErrorKind::PermissionDenied => {
                message.push_str(&format!(
                    "\n\nPermission denied. Check file/directory permissions for: {}",
                    self.file_path.display()
                ));
            }
            _ => {
                message.push_str(&format!("\n\nError details: {}", self.source));
            }
        }

        message
    }
}

/// Extension trait for Result types to add file operation context
pub trait FileResultExt<T> {
    /// Add file operation context to a Result
    fn with_file_context(
        self,
        operation: FileOperation,
        file_path: impl AsRef<Path>,
        purpose: impl Into<String>,
    ) -> Result<T, FileOperationError>;
}

impl<T> FileResultExt<T> for Result<T, std::io::Error> {
    fn with_file_context(
        self,
        operation: FileOperation,
        file_path: impl AsRef<Path>,
        purpose: impl Into<String>,
    ) -> Result<T, FileOperationError> {
        self.map_err(|io_error| {
            FileOperationError::new(operation, file_path.as_ref(), purpose, io_error)
        })
    }
}

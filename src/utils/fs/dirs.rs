//! Directory operations with "does not exist" tolerance.
//!
//! The fetch engine cleans up optimistically: a stale backup or a previous
//! dependency directory may or may not exist. Only `NotFound` is tolerated;
//! every other error is returned with its file context.

use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::Path;

use crate::core::{FileOperation, FileResultExt};

/// Ensures a directory exists, creating it and all parent directories if necessary.
///
/// Returns an error if the path exists but is not a directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_file_context(FileOperation::CreateDir, path, "creating directory")?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Removes a directory tree, treating a missing path as success.
///
/// Returns `true` when something was removed.
///
/// # Examples
///
/// ```rust,no_run
/// use chart_vendor::utils::fs::remove_dir_all_if_exists;
/// use std::path::Path;
///
/// # async fn example() -> anyhow::Result<()> {
/// let removed = remove_dir_all_if_exists(Path::new("charts/app-1.0.0"), "removing stale backup").await?;
/// # Ok(())
/// # }
/// ```
pub async fn remove_dir_all_if_exists(path: &Path, purpose: &str) -> Result<bool> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_file_context(FileOperation::Remove, path, purpose).map_err(Into::into),
    }
}

/// Renames `from` to `to`, treating a missing `from` as success.
///
/// Returns `true` when the rename happened.
pub async fn rename_if_exists(from: &Path, to: &Path, purpose: &str) -> Result<bool> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e)
            .with_file_context(FileOperation::Rename, from, purpose)
            .with_context(|| format!("Failed to rename {} to {}", from.display(), to.display())),
    }
}

//! Atomic file write operations using temp-and-rename strategy.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use super::dirs::ensure_dir;

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// This function ensures atomic writes by:
/// 1. Writing content to a temporary file in the target's directory
/// 2. Syncing the temporary file to disk
/// 3. Atomically renaming the temporary file to the target path
///
/// Readers never observe a partially written file, and an existing file is
/// fully replaced. Parent directories are created when missing. The file gets
/// the same permissions a plain [`std::fs::write`] would give it.
///
/// # Examples
///
/// ```rust,no_run
/// use chart_vendor::utils::fs::atomic_write;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// atomic_write(Path::new("charts/memcached/requirements.lock"), b"dependencies: []\n")?;
/// # Ok(())
/// # }
/// ```
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    // Same mode `fs::write` would create the target with, before the umask
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let mut temp = builder
        .tempfile_in(parent)
        .with_context(|| format!("Failed to create temp file in: {}", parent.display()))?;

    temp.write_all(content)
        .with_context(|| format!("Failed to write temp file for: {}", path.display()))?;
    temp.as_file().sync_all().with_context(|| "Failed to sync file to disk")?;

    temp.persist(path)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_creates_parents_and_replaces() {
        let temp = tempdir().unwrap();
        let target = temp.path().join("chart").join("requirements.lock");

        atomic_write(&target, b"first").unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"first");

        atomic_write(&target, b"second").unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"second");

        // No temporary files left next to the target
        let entries: Vec<_> = std::fs::read_dir(target.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_atomic_write_honors_umask_like_plain_write() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let target = temp.path().join("requirements.lock");
        let plain = temp.path().join("values.yaml");

        atomic_write(&target, b"dependencies: []\n").unwrap();
        std::fs::write(&plain, b"replicas: 1\n").unwrap();

        let mode = |path: &Path| std::fs::metadata(path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&target), mode(&plain));
    }
}

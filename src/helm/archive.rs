//! Chart archive verification and expansion.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::core::{ChartVendorError, FileOperation, FileResultExt};

/// Check `data` against an index digest (`<hex>` or `sha256:<hex>`).
pub fn verify_digest(name: &str, data: &[u8], expected: &str) -> Result<()> {
    let expected = expected.strip_prefix("sha256:").unwrap_or(expected);
    let actual = hex::encode(Sha256::digest(data));
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(ChartVendorError::ArchiveInvalid {
            name: name.to_string(),
            reason: format!("digest mismatch: expected {expected}, got {actual}"),
        }
        .into());
    }
    Ok(())
}

/// Expand a gzip'd chart archive into `<parent>/<directory>`.
///
/// The archive is unpacked into a staging directory inside `parent`; its
/// top-level `<name>/` directory is then renamed into place. Entries that
/// would escape the staging directory are skipped by the unpacker.
pub fn extract_chart(data: &[u8], name: &str, parent: &Path, directory: &str) -> Result<()> {
    std::fs::create_dir_all(parent).with_file_context(
        FileOperation::CreateDir,
        parent,
        "creating chart parent directory",
    )?;

    let staging = tempfile::Builder::new()
        .prefix(".chart-vendor-")
        .tempdir_in(parent)
        .with_context(|| format!("Failed to create staging directory in {}", parent.display()))?;

    let mut archive = tar::Archive::new(GzDecoder::new(data));
    archive.unpack(staging.path()).map_err(|e| ChartVendorError::ArchiveInvalid {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    let expanded = staging.path().join(name);
    if !expanded.is_dir() {
        return Err(ChartVendorError::ArchiveInvalid {
            name: name.to_string(),
            reason: format!("archive has no top-level '{name}/' directory"),
        }
        .into());
    }

    let destination = parent.join(directory);
    std::fs::rename(&expanded, &destination).with_file_context(
        FileOperation::Rename,
        &destination,
        "moving expanded chart into place",
    )?;

    tracing::debug!(chart = name, destination = %destination.display(), "expanded chart archive");
    Ok(())
}

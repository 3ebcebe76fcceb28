//! Patch ordering for one chart.
//!
//! Review-system patches come first: instances in sorted order, and within an
//! instance the changes in the order they are declared. Each change is applied
//! as soon as it is fetched. Local patch files from `<root>/patches/<chart>/`
//! follow, sorted by file name. The first failure aborts the remainder.

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};

use super::PatchApplier;
use crate::core::{FileOperation, FileResultExt};
use crate::gerrit::PatchProvider;
use crate::models::{ChangeId, ChartSpec, PatchSource};

/// A single patch to apply, in application order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchRef {
    /// A change on a review-system instance
    Review {
        /// Instance host name
        host: String,
        /// Change identifier
        change: ChangeId,
    },
    /// A patch file on disk
    Local(PathBuf),
}

impl fmt::Display for PatchRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Review {
                host,
                change,
            } => write!(f, "{host} change {change}"),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Review-system patches of a chart in application order.
pub fn review_patches(source: &PatchSource) -> Vec<PatchRef> {
    source
        .gerrit
        .iter()
        .flat_map(|(host, changes)| {
            changes.iter().map(move |change| PatchRef::Review {
                host: host.clone(),
                change: change.clone(),
            })
        })
        .collect()
}

/// Local patch files in `dir`, sorted lexicographically by path.
///
/// A missing directory yields no patches.
pub fn local_patches(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = PatchSource::local_pattern(dir);
    let mut patches = glob::glob(&pattern)
        .with_context(|| format!("Invalid local patch pattern: {pattern}"))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to list local patches in {}", dir.display()))?;
    patches.retain(|path| path.is_file());
    patches.sort();
    Ok(patches)
}

/// Fetch and apply every patch of `chart` to its vendored directory.
///
/// Returns the patches in the order they were applied.
pub async fn apply_chart_patches<P, A>(
    chart: &ChartSpec,
    root: &Path,
    provider: &P,
    applier: &A,
) -> Result<Vec<PatchRef>>
where
    P: PatchProvider,
    A: PatchApplier,
{
    let chart_dir = root.join(chart.directory());
    let patches = chart_patches(chart, root)?;

    // Each patch is fetched right before it is applied
    for patch in &patches {
        let diff = match patch {
            PatchRef::Review {
                host,
                change,
            } => {
                tracing::info!(instance = %host, change = %change, "Applying review patch");
                provider.get_patch(host, change).await?
            }
            PatchRef::Local(path) => {
                tracing::info!(patch = %path.display(), "Applying local patch");
                tokio::fs::read_to_string(path).await.with_file_context(
                    FileOperation::Read,
                    path,
                    "reading local patch",
                )?
            }
        };
        applier
            .apply(&diff, &chart_dir)
            .await
            .with_context(|| format!("Failed to apply {patch}"))?;
    }

    Ok(patches)
}

/// Every patch of `chart` in application order: review-system changes by host,
/// then local patch files.
pub fn chart_patches(chart: &ChartSpec, root: &Path) -> Result<Vec<PatchRef>> {
    let mut patches = review_patches(&chart.patches);
    patches.extend(local_patches(&chart.local_patches_dir(root))?.into_iter().map(PatchRef::Local));
    Ok(patches)
}

//! Patch application for vendored charts
//!
//! Patches come from upstream review systems and from local files, and are
//! written against the upstream repository layout: paths look like
//! `a/<chart>/templates/deployment.yaml`. Before a patch reaches the vendored
//! chart it is narrowed by two filters:
//!
//! 1. **Include filter**: only hunks under `<chart>/` survive
//! 2. **Exclude filter**: hunks touching `<chart>/Chart.yaml` or
//!    `<chart>/values_overrides/` are dropped, since those files are owned by
//!    the vendoring repository
//! 3. **Apply**: the remainder is applied inside the chart directory with two
//!    leading path components stripped
//!
//! The three steps run as one external process pipeline
//! (`filterdiff | filterdiff | patch`), see [`pipeline`].
//!
//! # Module Structure
//!
//! - [`pipeline`] - generic process chaining with supervised pipe draining
//! - [`resolver`] - ordering of review-system and local patches for a chart

pub mod pipeline;
pub mod resolver;

use anyhow::{Context, Result};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::constants::{FILTERDIFF_BINARY, PATCH_BINARY, PROTECTED_MANIFEST, PROTECTED_OVERRIDES_DIR};
use crate::core::{ChartVendorError, PatchStage};
use pipeline::{ProcessPipeline, Stage};

pub use resolver::{PatchRef, apply_chart_patches, chart_patches, local_patches, review_patches};

/// Something that applies a unified diff to a chart directory.
///
/// [`PatchPipeline`] is the production implementation. The trait exists so the
/// patch ordering logic can be exercised without the external tools.
pub trait PatchApplier {
    /// Apply `diff` to the chart expanded at `chart_dir`.
    fn apply(&self, diff: &str, chart_dir: &Path) -> impl Future<Output = Result<()>> + Send;
}

/// Locations of the external patch tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchTools {
    /// `filterdiff` from patchutils, used for both filter stages
    pub filterdiff: PathBuf,
    /// GNU `patch`
    pub patch: PathBuf,
}

impl Default for PatchTools {
    /// Bare program names, resolved through `PATH` when a stage starts.
    fn default() -> Self {
        Self {
            filterdiff: PathBuf::from(FILTERDIFF_BINARY),
            patch: PathBuf::from(PATCH_BINARY),
        }
    }
}

impl PatchTools {
    /// Resolve both tools through `PATH` up front.
    ///
    /// # Errors
    ///
    /// Returns [`ChartVendorError::ToolNotFound`] naming the first missing tool.
    pub fn locate() -> Result<Self> {
        let find = |tool: &str| {
            which::which(tool).map_err(|_| ChartVendorError::ToolNotFound {
                tool: tool.to_string(),
            })
        };
        Ok(Self {
            filterdiff: find(FILTERDIFF_BINARY)?,
            patch: find(PATCH_BINARY)?,
        })
    }
}

/// The filter-filter-apply pipeline for one chart directory at a time.
///
/// # Examples
///
/// ```rust,no_run
/// use chart_vendor::patch::{PatchApplier, PatchPipeline, PatchTools};
/// use std::path::Path;
///
/// # async fn example(diff: &str) -> anyhow::Result<()> {
/// let pipeline = PatchPipeline::new(PatchTools::locate()?);
/// pipeline.apply(diff, Path::new("charts/memcached")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PatchPipeline {
    tools: PatchTools,
}

impl PatchPipeline {
    /// Create a pipeline using the given tools.
    pub fn new(tools: PatchTools) -> Self {
        Self {
            tools,
        }
    }

    /// Patterns selecting the hunks that belong to the chart `base`.
    pub fn include_patterns(base: &str) -> Vec<String> {
        vec![format!("{base}/*")]
    }

    /// Patterns of chart files that patches may never touch.
    pub fn exclude_patterns(base: &str) -> Vec<String> {
        vec![
            format!("{base}/{PROTECTED_MANIFEST}"),
            format!("{base}/{PROTECTED_OVERRIDES_DIR}/*"),
        ]
    }

    /// The three stages for `chart_dir`, reading patterns from the given files.
    pub fn stages(&self, chart_dir: &Path, includes: &Path, excludes: &Path) -> Vec<Stage> {
        vec![
            Stage::new(PatchStage::IncludeFilter, &self.tools.filterdiff)
                .arg("-p1")
                .arg("-I")
                .arg(includes),
            Stage::new(PatchStage::ExcludeFilter, &self.tools.filterdiff)
                .arg("-p1")
                .arg("-X")
                .arg(excludes),
            // -F0: no fuzz, --forward: never guess a reversed patch,
            // --batch: never prompt
            Stage::new(PatchStage::Apply, &self.tools.patch)
                .arg("-p2")
                .arg("-d")
                .arg(chart_dir)
                .arg("-E")
                .arg("-F0")
                .arg("--forward")
                .arg("--batch"),
        ]
    }
}

impl PatchApplier for PatchPipeline {
    async fn apply(&self, diff: &str, chart_dir: &Path) -> Result<()> {
        if !chart_dir.is_dir() {
            anyhow::bail!("Chart directory {} does not exist", chart_dir.display());
        }
        let base = chart_dir
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("Invalid chart directory: {}", chart_dir.display()))?;

        let includes = pattern_file(&Self::include_patterns(base))?;
        let excludes = pattern_file(&Self::exclude_patterns(base))?;

        let pipeline =
            ProcessPipeline::new(self.stages(chart_dir, includes.path(), excludes.path()));
        let output = pipeline.run(diff.as_bytes().to_vec()).await?;

        for line in output.stdout.lines() {
            tracing::debug!(target: "patch", "{line}");
        }
        Ok(())
    }
}

/// Write one pattern per line to a temporary file that lives as long as the handle.
fn pattern_file(patterns: &[String]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new().context("Failed to create filter pattern file")?;
    for pattern in patterns {
        writeln!(file, "{pattern}").context("Failed to write filter pattern file")?;
    }
    file.flush().context("Failed to write filter pattern file")?;
    Ok(file)
}

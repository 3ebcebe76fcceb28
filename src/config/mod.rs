//! Vendoring configuration (`.charts.yml`)
//!
//! The configuration lists every chart vendored into the repository:
//!
//! ```yaml
//! charts:
//!   - name: rabbitmq-cluster-operator
//!     version: 2.6.6
//!     repository:
//!       url: https://charts.bitnami.com/bitnami
//!     directory: rabbitmq            # optional, defaults to name
//!     dependencies:
//!       - name: common
//!         version: 2.0.0
//!         repository: https://charts.bitnami.com/bitnami
//!     patches:
//!       gerrit:
//!         review.opendev.org:
//!           - 899867
//! ```
//!
//! Local patches are not configured here; they are discovered in
//! `<charts-root>/patches/<chart-name>/*.patch`.
//!
//! # Validation
//!
//! After parsing, [`Config::validate`] rejects configurations the fetch
//! engine cannot vendor safely:
//! - empty names, versions or repository URLs
//! - two charts resolving to the same directory
//! - two dependencies of one chart with the same name
//! - a directory override that is not a single path component

pub mod parser;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Component, Path};

use crate::core::ChartVendorError;
use crate::models::ChartSpec;
pub use parser::parse_config;

/// Parsed `.charts.yml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Every chart to vendor, in declaration order
    #[serde(default)]
    pub charts: Vec<ChartSpec>,
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = parse_config(path)?;
        config.validate().map_err(|reason| ChartVendorError::ConfigError {
            file: path.display().to_string(),
            reason,
        })?;
        tracing::debug!(path = %path.display(), charts = config.charts.len(), "loaded configuration");
        Ok(config)
    }

    /// Check the invariants the fetch engine relies on.
    ///
    /// Returns the first problem found as a human-readable reason.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let mut directories = HashSet::new();

        for chart in &self.charts {
            require("chart name", &chart.name, "")?;
            require("version", &chart.version, &chart.name)?;
            require("repository url", &chart.repository.url, &chart.name)?;

            if let Some(directory) = &chart.directory {
                if !is_single_component(directory) {
                    return Err(format!(
                        "chart '{}' has invalid directory '{directory}': must be a single path component",
                        chart.name
                    ));
                }
            }
            if !directories.insert(chart.directory()) {
                return Err(format!(
                    "directory '{}' is used by more than one chart",
                    chart.directory()
                ));
            }

            let mut dependency_names = HashSet::new();
            for dep in &chart.dependencies {
                require("dependency name", &dep.name, &chart.name)?;
                require("dependency version", &dep.version, &chart.name)?;
                require("dependency repository", &dep.repository, &chart.name)?;
                if !is_single_component(&dep.name) {
                    return Err(format!(
                        "chart '{}' has invalid dependency name '{}'",
                        chart.name, dep.name
                    ));
                }
                if !dependency_names.insert(dep.name.as_str()) {
                    return Err(format!(
                        "chart '{}' declares dependency '{}' more than once",
                        chart.name, dep.name
                    ));
                }
            }
        }
        Ok(())
    }

    /// Charts named in `names`, in configuration order; all charts when
    /// `names` is empty.
    ///
    /// Names that match no chart are logged and skipped.
    pub fn select(&self, names: &[String]) -> Vec<ChartSpec> {
        if names.is_empty() {
            return self.charts.clone();
        }

        for name in names {
            if !self.charts.iter().any(|chart| &chart.name == name) {
                tracing::warn!("Chart '{name}' is not configured");
            }
        }
        self.charts.iter().filter(|chart| names.contains(&chart.name)).cloned().collect()
    }
}

fn require(field: &str, value: &str, chart: &str) -> std::result::Result<(), String> {
    if !value.trim().is_empty() {
        return Ok(());
    }
    if chart.is_empty() {
        Err(format!("{field} must not be empty"))
    } else {
        Err(format!("chart '{chart}': {field} must not be empty"))
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}

//! Command-line interface for chart-vendor
//!
//! ```text
//! chart-vendor [OPTIONS] [CHARTS]...
//! ```
//!
//! Vendors every chart from the configuration file into the charts root, or
//! only the charts named on the command line.
//!
//! # Options
//!
//! - `--config-file <PATH>` - vendoring configuration (default `.charts.yml`)
//! - `--charts-root <PATH>` - directory charts are vendored into (default `charts`)
//! - `--check` - verify afterwards that the working tree has no uncommitted
//!   changes or untracked files
//! - `--verbose` / `--quiet` - log level `debug` / `error` (default `info`);
//!   `RUST_LOG` overrides both
//!
//! # Examples
//!
//! ```bash
//! # Vendor everything
//! chart-vendor
//!
//! # Re-vendor two charts and fail if anything changed
//! chart-vendor --check memcached rabbitmq-cluster-operator
//! ```
//!
//! Any failure, including drift found by `--check`, exits with status 1.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::check::DriftChecker;
use crate::config::Config;
use crate::constants::{DEFAULT_CHARTS_ROOT, DEFAULT_CONFIG_FILE};
use crate::patch::PatchTools;
use crate::vendor::ChartVendor;

/// Runtime settings derived from the global flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Default log filter, used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// The filter to install: `RUST_LOG` when set, the configured level otherwise.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level))
    }

    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// Does nothing if a subscriber is already installed.
    pub fn init_logging(&self) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter())
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Vendor pinned Helm charts into a repository.
#[derive(Debug, Parser)]
#[command(
    name = "chart-vendor",
    about = "Vendor pinned Helm charts with reproducible locks and patches",
    version
)]
pub struct Cli {
    /// Vendoring configuration file
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    config_file: PathBuf,

    /// Directory the charts are vendored into
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CHARTS_ROOT)]
    charts_root: PathBuf,

    /// Fail if vendoring leaves uncommitted changes or untracked files
    #[arg(long)]
    check: bool,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    /// Charts to vendor (default: all configured charts)
    #[arg(value_name = "CHARTS")]
    charts: Vec<String>,
}

impl Cli {
    /// Set up logging and run.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(config).await
    }

    /// Translate the verbosity flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        };
        CliConfig {
            log_level: log_level.to_string(),
        }
    }

    /// Vendor the selected charts, then run the drift check if requested.
    ///
    /// Logging must already be set up; `config` is accepted so callers that
    /// install their own subscriber go through the same path.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        tracing::debug!(log_level = %config.log_level, "starting");

        let vendoring = Config::load(&self.config_file)?;
        let charts = vendoring.select(&self.charts);

        let client = reqwest::Client::builder()
            .user_agent(concat!("chart-vendor/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        let vendor = ChartVendor::with_client(&self.charts_root, client, PatchTools::default());
        vendor.vendor_all(&charts).await?;

        if self.check {
            DriftChecker::new(".").verify().await?;
        }
        Ok(())
    }
}

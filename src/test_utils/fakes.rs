//! In-memory collaborators for exercising the fetch engine without network
//! access or external patch tools.

use anyhow::{Result, bail};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::gerrit::PatchProvider;
use crate::helm::ChartFetcher;
use crate::models::ChangeId;
use crate::patch::PatchApplier;

/// A [`ChartFetcher`] serving charts from memory.
///
/// Each fetch writes the registered files into `<parent>/<directory>` and is
/// recorded as `"<name>@<version>"`.
#[derive(Debug, Default)]
pub struct FakeFetcher {
    charts: HashMap<(String, String), Vec<(String, String)>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    /// Register a chart version with `(relative path, content)` files.
    pub fn with_chart(mut self, name: &str, version: &str, files: &[(&str, &str)]) -> Self {
        let files = files.iter().map(|(path, content)| (path.to_string(), content.to_string()));
        self.charts.insert((name.to_string(), version.to_string()), files.collect());
        self
    }

    /// Make every fetch of `name` fail after any configured delay.
    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Delay every successful fetch.
    pub fn with_delay_ms(mut self, millis: u64) -> Self {
        self.delay = Some(Duration::from_millis(millis));
        self
    }

    /// Fetches performed so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

impl ChartFetcher for FakeFetcher {
    async fn fetch(
        &self,
        _repository: &str,
        name: &str,
        version: &str,
        parent: &Path,
        directory: &str,
    ) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(format!("{name}@{version}"));
        }
        if self.failing.contains(name) {
            bail!("chart {name} {version} is unavailable");
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let Some(files) = self.charts.get(&(name.to_string(), version.to_string())) else {
            bail!("chart {name} {version} not found");
        };

        let destination = parent.join(directory);
        for (path, content) in files {
            let path = destination.join(path);
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::write(&path, content)?;
        }
        Ok(())
    }
}

/// A [`PatchProvider`] answering from a fixed table.
#[derive(Debug, Default)]
pub struct FakeGerrit {
    patches: HashMap<(String, String), String>,
}

impl FakeGerrit {
    /// Register the diff of `change` on `host`.
    pub fn with_patch(mut self, host: &str, change: &str, diff: &str) -> Self {
        self.patches.insert((host.to_string(), change.to_string()), diff.to_string());
        self
    }
}

impl PatchProvider for FakeGerrit {
    async fn get_patch(&self, host: &str, change: &ChangeId) -> Result<String> {
        match self.patches.get(&(host.to_string(), change.to_string())) {
            Some(diff) => Ok(diff.clone()),
            None => bail!("no patch for change {change} on {host}"),
        }
    }
}

/// A [`PatchApplier`] that only records what it was asked to apply.
#[derive(Debug, Default)]
pub struct RecordingApplier {
    applied: Mutex<Vec<(String, PathBuf)>>,
}

impl RecordingApplier {
    /// `(diff, chart directory)` pairs in application order.
    pub fn applied(&self) -> Vec<(String, PathBuf)> {
        self.applied.lock().map(|applied| applied.clone()).unwrap_or_default()
    }
}

impl PatchApplier for RecordingApplier {
    async fn apply(&self, diff: &str, chart_dir: &Path) -> Result<()> {
        if let Ok(mut applied) = self.applied.lock() {
            applied.push((diff.to_string(), chart_dir.to_path_buf()));
        }
        Ok(())
    }
}

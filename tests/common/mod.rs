//! Common test utilities and fixtures for chart-vendor integration tests
//!
//! - [`ChartRepoServer`] - a chart repository (index + tarballs) on a local mock server
//! - [`TestProject`] - a project directory with a `.charts.yml` and the binary to run in it
//! - [`snapshot`] - byte-level directory snapshots for rollback and idempotency checks

// Not every test module uses every helper
#![allow(dead_code)]

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chart_vendor::config::Config;
use chart_vendor::models::{ChartRepository, ChartSpec, DependencySpec, PatchSource};
use chart_vendor::test_utils::chart_archive;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One chart version published by a [`ChartRepoServer`].
pub struct PublishedChart<'a> {
    pub name: &'a str,
    pub version: &'a str,
    pub files: &'a [(&'a str, &'a str)],
}

/// A Helm chart repository served over HTTP.
pub struct ChartRepoServer {
    pub server: MockServer,
}

impl ChartRepoServer {
    /// Serve `charts` with an `index.yaml` using relative archive URLs.
    pub async fn start(charts: &[PublishedChart<'_>]) -> Self {
        let server = MockServer::start().await;
        let mut entries: BTreeMap<&str, Vec<serde_json::Value>> = BTreeMap::new();

        for chart in charts {
            let archive_name = format!("{}-{}.tgz", chart.name, chart.version);
            Mock::given(method("GET"))
                .and(path(format!("/{archive_name}")))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_bytes(chart_archive(chart.name, chart.files)),
                )
                .mount(&server)
                .await;

            entries.entry(chart.name).or_default().push(serde_json::json!({
                "name": chart.name,
                "version": chart.version,
                "urls": [archive_name],
            }));
        }

        let index = serde_yaml::to_string(&serde_json::json!({
            "apiVersion": "v1",
            "entries": entries,
        }))
        .expect("render index");
        Mock::given(method("GET"))
            .and(path("/index.yaml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(index))
            .mount(&server)
            .await;

        Self {
            server,
        }
    }

    /// Repository URL to put in the configuration.
    pub fn url(&self) -> String {
        self.server.uri()
    }
}

/// Serve `diff` as the current revision of `change` on a mock Gerrit instance.
pub async fn serve_gerrit_patch(server: &MockServer, change: &str, diff: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/changes/{change}/revisions/current/patch")))
        .respond_with(ResponseTemplate::new(200).set_body_string(STANDARD.encode(diff)))
        .mount(server)
        .await;
}

/// A project directory with a vendoring configuration.
pub struct TestProject {
    _temp_dir: TempDir, // Keep alive for RAII cleanup
    project_dir: PathBuf,
}

impl TestProject {
    /// Create an empty project directory.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().join("project");
        fs::create_dir_all(&project_dir)?;
        Ok(Self {
            _temp_dir: temp_dir,
            project_dir,
        })
    }

    /// The project directory.
    pub fn path(&self) -> &Path {
        &self.project_dir
    }

    /// The default charts root inside the project.
    pub fn charts_root(&self) -> PathBuf {
        self.project_dir.join("charts")
    }

    /// Write `.charts.yml` listing `charts`.
    pub fn write_config(&self, charts: Vec<ChartSpec>) -> Result<()> {
        let config = Config {
            charts,
        };
        let yaml = serde_yaml::to_string(&config)?;
        fs::write(self.project_dir.join(".charts.yml"), yaml).context("Failed to write config")
    }

    /// Write a file relative to the project directory.
    pub fn write_file(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.project_dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(())
    }

    /// Read a file relative to the project directory.
    pub fn read_file(&self, relative: &str) -> Result<String> {
        fs::read_to_string(self.project_dir.join(relative))
            .with_context(|| format!("Failed to read {relative}"))
    }

    /// The binary, ready to run inside the project.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::new(env!("CARGO_BIN_EXE_chart-vendor"));
        cmd.current_dir(&self.project_dir).env("NO_COLOR", "1").env_remove("RUST_LOG");
        cmd
    }
}

/// A chart entry without dependencies or patches.
pub fn chart_spec(name: &str, version: &str, repository: &str) -> ChartSpec {
    ChartSpec {
        name: name.to_string(),
        version: version.to_string(),
        repository: ChartRepository {
            url: repository.to_string(),
        },
        directory: None,
        dependencies: Vec::new(),
        patches: PatchSource::default(),
    }
}

/// A dependency entry.
pub fn dependency(name: &str, version: &str, repository: &str) -> DependencySpec {
    DependencySpec {
        name: name.to_string(),
        version: version.to_string(),
        repository: repository.to_string(),
    }
}

/// Every file below `root` with its content, keyed by relative path.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry.path().strip_prefix(root).expect("entry below root").to_path_buf();
            let content = fs::read(entry.path()).expect("read snapshot file");
            (relative, content)
        })
        .collect()
}

/// Whether all of `tools` are on `PATH`; logs the skip otherwise.
pub fn tools_available(tools: &[&str]) -> bool {
    for tool in tools {
        if which::which(tool).is_err() {
            eprintln!("skipping: {tool} not installed");
            return false;
        }
    }
    true
}

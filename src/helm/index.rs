//! Chart repository index (`index.yaml`) parsing and lookup.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;

use crate::constants::REPOSITORY_INDEX_FILE;

/// The parts of a repository index needed to locate a chart archive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositoryIndex {
    /// Chart name → published versions
    #[serde(default)]
    pub entries: HashMap<String, Vec<ChartEntry>>,
}

/// One published version of a chart.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChartEntry {
    /// Published version, sometimes with a leading `v`
    pub version: String,
    /// Archive locations, absolute or relative to the repository
    #[serde(default)]
    pub urls: Vec<String>,
    /// SHA-256 of the archive, when the repository publishes one
    #[serde(default)]
    pub digest: Option<String>,
}

impl RepositoryIndex {
    /// Parse an `index.yaml` document.
    pub fn parse(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("Failed to parse repository index")
    }

    /// Find `version` of chart `name`.
    ///
    /// An index version of `v1.2.3` matches a requested `1.2.3`.
    pub fn find(&self, name: &str, version: &str) -> Option<&ChartEntry> {
        self.entries.get(name)?.iter().find(|entry| {
            entry.version == version || entry.version.strip_prefix('v') == Some(version)
        })
    }
}

/// URL of the index of `repository`.
pub fn index_url(repository: &str) -> String {
    format!("{}/{REPOSITORY_INDEX_FILE}", repository.trim_end_matches('/'))
}

/// Resolve an archive URL from the index against its repository.
pub fn resolve_url(repository: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("{}/{}", repository.trim_end_matches('/'), url.trim_start_matches('/'))
    }
}

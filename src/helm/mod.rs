//! Chart repository client
//!
//! Resolves a pinned chart version through its repository's `index.yaml`,
//! downloads the archive and expands it into a directory of the caller's
//! choosing. Only HTTP(S) chart repositories are supported.
//!
//! # Resolution
//!
//! 1. `GET <repository>/index.yaml`, parsed once per repository and cached
//!    for the lifetime of the [`HelmRepository`]
//! 2. The entry whose version matches (a leading `v` in the index is ignored)
//! 3. The first archive URL of that entry, joined onto the repository URL when
//!    relative
//! 4. Download, verify the published digest if any, and expand
//!
//! The archive is expanded from memory, so nothing but the chart directory is
//! left behind in the destination.

pub mod archive;
pub mod index;

use anyhow::{Context, Result};
use dashmap::DashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use crate::core::ChartVendorError;
use index::RepositoryIndex;

/// Something that fetches a chart version into a directory.
pub trait ChartFetcher {
    /// Fetch `name` at `version` from `repository` and expand it into
    /// `<parent>/<directory>`, which must not exist yet.
    fn fetch(
        &self,
        repository: &str,
        name: &str,
        version: &str,
        parent: &Path,
        directory: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// HTTP chart repository client with a per-repository index cache.
///
/// # Examples
///
/// ```rust,no_run
/// use chart_vendor::helm::{ChartFetcher, HelmRepository};
/// use std::path::Path;
///
/// # async fn example() -> anyhow::Result<()> {
/// let helm = HelmRepository::new(reqwest::Client::new());
/// helm.fetch(
///     "https://charts.bitnami.com/bitnami",
///     "memcached",
///     "6.6.2",
///     Path::new("charts"),
///     "memcached",
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct HelmRepository {
    client: reqwest::Client,
    indexes: DashMap<String, Arc<RepositoryIndex>>,
}

impl HelmRepository {
    /// Create a client sharing the given HTTP client.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            indexes: DashMap::new(),
        }
    }

    /// The parsed index of `repository`, downloading it on first use.
    pub async fn index(&self, repository: &str) -> Result<Arc<RepositoryIndex>> {
        let key = repository.trim_end_matches('/').to_string();
        let cached = self.indexes.get(&key).map(|entry| Arc::clone(entry.value()));
        if let Some(index) = cached {
            return Ok(index);
        }

        let url = index::index_url(&key);
        tracing::debug!(target: "helm", %url, "downloading repository index");
        let data = self.download("index", &url).await?;
        let text = String::from_utf8_lossy(&data);
        let parsed = RepositoryIndex::parse(&text)
            .with_context(|| format!("Invalid repository index at {url}"))?;

        let index = Arc::new(parsed);
        self.indexes.insert(key, Arc::clone(&index));
        Ok(index)
    }

    async fn download(&self, name: &str, url: &str) -> Result<Vec<u8>> {
        let fail = |reason: String| ChartVendorError::ChartDownloadFailed {
            name: name.to_string(),
            url: url.to_string(),
            reason,
        };

        let response = self.client.get(url).send().await.map_err(|e| fail(e.to_string()))?;
        if !response.status().is_success() {
            return Err(fail(format!("HTTP {}", response.status())).into());
        }
        let body = response.bytes().await.map_err(|e| fail(e.to_string()))?;
        Ok(body.to_vec())
    }
}

impl ChartFetcher for HelmRepository {
    async fn fetch(
        &self,
        repository: &str,
        name: &str,
        version: &str,
        parent: &Path,
        directory: &str,
    ) -> Result<()> {
        if repository.starts_with("oci://") {
            return Err(ChartVendorError::ChartDownloadFailed {
                name: name.to_string(),
                url: repository.to_string(),
                reason: "OCI registries are not supported".to_string(),
            }
            .into());
        }

        tracing::info!(chart = name, version, "Looking up chart");
        let index = self.index(repository).await?;
        let entry = index.find(name, version).ok_or_else(|| ChartVendorError::ChartNotFound {
            name: name.to_string(),
            version: version.to_string(),
            repository: repository.to_string(),
        })?;
        let url = entry
            .urls
            .first()
            .map(|url| index::resolve_url(repository, url))
            .ok_or_else(|| ChartVendorError::ChartDownloadFailed {
                name: name.to_string(),
                url: index::index_url(repository),
                reason: "index entry has no download URL".to_string(),
            })?;

        tracing::info!(chart = name, version, %url, "Fetching chart");
        let data = self.download(name, &url).await?;
        if let Some(digest) = &entry.digest {
            archive::verify_digest(name, &data, digest)?;
        }

        let name = name.to_string();
        let parent = parent.to_path_buf();
        let directory = directory.to_string();
        tokio::task::spawn_blocking(move || {
            archive::extract_chart(&data, &name, &parent, &directory)
        })
        .await
        .context("Chart extraction task panicked")?
    }
}

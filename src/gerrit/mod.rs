//! Review-system patch retrieval
//!
//! Changes under review on a Gerrit instance are fetched as unified diffs
//! through its REST API:
//!
//! ```text
//! GET https://<instance>/changes/<change-id>/revisions/current/patch
//! ```
//!
//! Gerrit answers with the diff base64-encoded. Only the current revision of a
//! change is ever requested.

use anyhow::Result;
use base64::{Engine, engine::general_purpose::STANDARD};
use std::future::Future;

use crate::core::ChartVendorError;
use crate::models::ChangeId;

/// Source of unified diffs for review-system changes.
pub trait PatchProvider {
    /// Fetch the current revision of `change` on `host` as a unified diff.
    fn get_patch(
        &self,
        host: &str,
        change: &ChangeId,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// REST client for Gerrit instances.
#[derive(Debug, Clone, Default)]
pub struct GerritClient {
    client: reqwest::Client,
}

impl GerritClient {
    /// Create a client sharing the given HTTP client.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
        }
    }

    /// Base URL of an instance.
    ///
    /// Instances are configured as bare host names and reached over HTTPS. A
    /// value that already carries a scheme is used as given.
    pub fn base_url(host: &str) -> String {
        let host = host.trim_end_matches('/');
        if host.starts_with("https://") || host.starts_with("http://") {
            host.to_string()
        } else {
            format!("https://{host}")
        }
    }

    /// Endpoint returning the current revision of `change` as a patch.
    pub fn patch_url(host: &str, change: &ChangeId) -> String {
        // Project-qualified ids ("org/project~123") need their slashes escaped
        let change = change.as_str().replace('/', "%2F");
        format!("{}/changes/{change}/revisions/current/patch", Self::base_url(host))
    }
}

impl PatchProvider for GerritClient {
    async fn get_patch(&self, host: &str, change: &ChangeId) -> Result<String> {
        let fail = |reason: String| ChartVendorError::PatchFetchFailed {
            host: host.to_string(),
            change: change.to_string(),
            reason,
        };

        let url = Self::patch_url(host, change);
        tracing::debug!(target: "gerrit", %url, "requesting patch");

        let response =
            self.client.get(&url).send().await.map_err(|e| fail(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(fail(format!("HTTP {status}: {}", body.trim())).into());
        }

        let body = response.text().await.map_err(|e| fail(e.to_string()))?;
        let compact: String = body.split_whitespace().collect();
        let decoded = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| fail(format!("response is not base64: {e}")))?;

        String::from_utf8(decoded).map_err(|e| fail(format!("patch is not UTF-8: {e}")).into())
    }
}

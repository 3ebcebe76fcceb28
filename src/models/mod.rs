//! Data model for vendored charts
//!
//! These types are loaded from the vendoring configuration and stay read-only for
//! the lifetime of one invocation:
//! - [`ChartSpec`] - one chart pinned to a version, with its dependencies and patches
//! - [`DependencySpec`] - one dependency fetched into `<chart>/charts/<name>`
//! - [`PatchSource`] - review-system changes to apply on top of the upstream chart
//!
//! The serialized field order of [`DependencySpec`] (`name`, `version`,
//! `repository`) is part of the lock digest and must not change.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::constants::{LOCAL_PATCHES_DIR, LOCAL_PATCH_GLOB};

/// Location of a chart repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChartRepository {
    /// Base URL of the repository; `index.yaml` is resolved relative to it
    pub url: String,
}

/// A chart pinned to an exact version.
///
/// Identity is `(name, version)`. The chart is expanded into
/// `<charts-root>/<directory>`, where the directory defaults to the chart name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Chart name as published in the repository index
    pub name: String,
    /// Exact chart version
    pub version: String,
    /// Repository the chart is fetched from
    pub repository: ChartRepository,
    /// Optional directory name override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    /// Dependencies fetched into `charts/<name>` inside the chart directory
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
    /// Review-system patches applied after fetching
    #[serde(default)]
    pub patches: PatchSource,
}

impl ChartSpec {
    /// Directory name the chart is vendored into.
    pub fn directory(&self) -> &str {
        self.directory.as_deref().unwrap_or(&self.name)
    }

    /// Name of the rollback backup directory used while re-fetching.
    pub fn backup_directory(&self) -> String {
        format!("{}-{}", self.directory(), self.version)
    }

    /// Local patch directory for this chart: `<root>/patches/<chart-name>`.
    pub fn local_patches_dir(&self, root: &Path) -> PathBuf {
        root.join(LOCAL_PATCHES_DIR).join(&self.name)
    }
}

/// A chart dependency.
///
/// Dependencies are leaves: their own dependencies are never resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencySpec {
    /// Dependency chart name; also its directory name under `charts/`
    pub name: String,
    /// Exact version
    pub version: String,
    /// Repository URL
    pub repository: String,
}

/// Patches applied on top of a freshly fetched chart.
///
/// Review-system patches are declared per host instance; local patch files are
/// discovered by convention in `patches/<chart-name>/*.patch` under the charts root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSource {
    /// Host instance → change identifiers, applied in declared order
    #[serde(default)]
    pub gerrit: BTreeMap<String, Vec<ChangeId>>,
}

impl PatchSource {
    /// Glob pattern matching local patch files inside `dir`.
    pub fn local_pattern(dir: &Path) -> String {
        dir.join(LOCAL_PATCH_GLOB).to_string_lossy().into_owned()
    }

    /// Total number of review-system changes declared.
    pub fn change_count(&self) -> usize {
        self.gerrit.values().map(Vec::len).sum()
    }
}

/// A review-system change identifier.
///
/// Configuration files write these as numbers (`899867`) or as strings
/// (`"I8a3c..."`, `"project~899867"`); both are kept verbatim as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChangeId(String);

impl ChangeId {
    /// Create a change identifier from any textual form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as sent to the review system.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for ChangeId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for ChangeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for ChangeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ChangeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ChangeIdVisitor;

        impl Visitor<'_> for ChangeIdVisitor {
            type Value = ChangeId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a change number or change identifier string")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<ChangeId, E> {
                Ok(ChangeId::from(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<ChangeId, E> {
                if value < 0 {
                    return Err(E::invalid_value(de::Unexpected::Signed(value), &self));
                }
                Ok(ChangeId(value.to_string()))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<ChangeId, E> {
                if value.trim().is_empty() {
                    return Err(E::invalid_value(de::Unexpected::Str(value), &self));
                }
                Ok(ChangeId(value.to_string()))
            }
        }

        deserializer.deserialize_any(ChangeIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_defaults_to_name() {
        let mut chart: ChartSpec = serde_yaml::from_str(
            "name: memcached\nversion: 0.1.0\nrepository:\n  url: https://charts.example.com\n",
        )
        .unwrap();
        assert_eq!(chart.directory(), "memcached");
        assert_eq!(chart.backup_directory(), "memcached-0.1.0");
        assert!(chart.dependencies.is_empty());
        assert!(chart.patches.gerrit.is_empty());

        chart.directory = Some("cache".to_string());
        assert_eq!(chart.directory(), "cache");
        assert_eq!(chart.backup_directory(), "cache-0.1.0");
    }

    #[test]
    fn test_local_patches_dir_uses_chart_name() {
        let chart = ChartSpec {
            name: "memcached".to_string(),
            version: "0.1.0".to_string(),
            repository: ChartRepository {
                url: "https://charts.example.com".to_string(),
            },
            directory: Some("cache".to_string()),
            dependencies: Vec::new(),
            patches: PatchSource::default(),
        };
        assert_eq!(
            chart.local_patches_dir(Path::new("charts")),
            PathBuf::from("charts/patches/memcached")
        );
    }

    #[test]
    fn test_change_ids_accept_numbers_and_strings() {
        let patches: PatchSource = serde_yaml::from_str(
            "gerrit:\n  review.opendev.org:\n    - 899867\n    - \"I0123abcd\"\n",
        )
        .unwrap();
        let changes = &patches.gerrit["review.opendev.org"];
        assert_eq!(changes, &vec![ChangeId::from(899867), ChangeId::from("I0123abcd")]);
        assert_eq!(patches.change_count(), 2);
    }

    #[test]
    fn test_change_id_rejects_empty_string() {
        let result: Result<PatchSource, _> =
            serde_yaml::from_str("gerrit:\n  review.opendev.org:\n    - \"\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_dependency_json_field_order() {
        let dep = DependencySpec {
            name: "common".to_string(),
            version: "2.0.0".to_string(),
            repository: "https://charts.example.com".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&dep).unwrap(),
            r#"{"name":"common","version":"2.0.0","repository":"https://charts.example.com"}"#
        );
    }
}

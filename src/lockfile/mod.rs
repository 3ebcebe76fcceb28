//! Dependency lock generation (`requirements.lock`).
//!
//! A lock record pins the exact dependency list of a chart together with a
//! content digest. The record is a pure function of the dependency list:
//!
//! - the generation timestamp is always the zero time (`0001-01-01T00:00:00Z`),
//!   so the file is byte-identical across runs when dependencies are unchanged
//! - the digest is `sha256:` + hex SHA-256 of the compact JSON encoding of the
//!   two-element list `[dependencies, dependencies]`
//!
//! The duplicated list mirrors the digest convention of Helm's own lock files
//! (requirements and locked dependencies hashed together) and must be kept as is
//! so tools that re-verify the lock accept it. An absent dependency list is
//! hashed as an explicit empty list (`[[],[]]`).
//!
//! # Examples
//!
//! ```rust,no_run
//! use chart_vendor::lockfile::LockRecord;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let lock = LockRecord::generate(&[])?;
//! assert_eq!(
//!     lock.digest,
//!     "sha256:643d5437104296e21d906ecb15b2c96ad278f20cfc4af53b12bb6069bd853726"
//! );
//! lock.write(Path::new("charts/memcached/requirements.lock"))?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::core::{FileOperation, FileResultExt};
use crate::models::DependencySpec;
use crate::utils::{atomic_write, to_sorted_yaml};

/// A generated dependency lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Locked dependencies, in declaration order
    pub dependencies: Vec<DependencySpec>,
    /// `sha256:<hex>` digest of the dependency list
    pub digest: String,
    /// Generation time; always the zero time
    pub generated: DateTime<Utc>,
}

impl LockRecord {
    /// Build the lock record for a dependency list.
    pub fn generate(dependencies: &[DependencySpec]) -> Result<Self> {
        Ok(Self {
            dependencies: dependencies.to_vec(),
            digest: compute_digest(dependencies)?,
            generated: zero_time(),
        })
    }

    /// Render the record as YAML with sorted keys.
    ///
    /// The timestamp is written quoted (`generated: "0001-01-01T00:00:00Z"`),
    /// the form Helm's own lock files use, so existing locks stay byte-identical.
    pub fn to_yaml(&self) -> Result<String> {
        let yaml = to_sorted_yaml(self).context("Failed to serialize lock record")?;
        let timestamp = self.generated.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        // `generated` sorts last, so it is always the final line
        match yaml.strip_suffix(&format!("generated: {timestamp}\n")) {
            Some(head) => Ok(format!("{head}generated: \"{timestamp}\"\n")),
            None => Ok(yaml),
        }
    }

    /// Write the record to `path`, replacing any previous lock.
    pub fn write(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml()?;
        atomic_write(path, yaml.as_bytes())
            .with_context(|| format!("Failed to write lock file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), digest = %self.digest, "wrote lock file");
        Ok(())
    }

    /// Read a previously written lock file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_file_context(
            FileOperation::Read,
            path,
            "reading lock file",
        )?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse lock file: {}", path.display()))
    }

    /// Whether the stored digest matches a fresh computation over the stored dependencies.
    pub fn is_consistent(&self) -> Result<bool> {
        Ok(compute_digest(&self.dependencies)? == self.digest)
    }
}

/// Generate the lock for `dependencies` and write it to `path`.
pub fn write_lock(path: &Path, dependencies: &[DependencySpec]) -> Result<LockRecord> {
    let lock = LockRecord::generate(dependencies)?;
    lock.write(path)?;
    Ok(lock)
}

/// Compute the `sha256:<hex>` digest of a dependency list.
pub fn compute_digest(dependencies: &[DependencySpec]) -> Result<String> {
    let data = serde_json::to_vec(&[dependencies, dependencies])
        .context("Failed to encode dependencies for digest")?;
    let hash = Sha256::digest(&data);
    Ok(format!("sha256:{}", hex::encode(hash)))
}

/// The zero time used as the generation timestamp (`0001-01-01T00:00:00Z`).
pub fn zero_time() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

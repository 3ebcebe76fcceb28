//! Generic YAML file parsing with error context.

use anyhow::{Context, Result};
use std::path::Path;

/// Read and deserialize a YAML file.
///
/// Both failure modes name the file: a read failure and a parse failure.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: T = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

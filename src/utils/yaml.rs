//! YAML rendering with sorted mapping keys.
//!
//! Generated chart files are rendered through a JSON value first. Without the
//! `preserve_order` feature `serde_json` keeps object keys in a `BTreeMap`, so
//! every mapping comes out in lexical key order regardless of struct field
//! order. This matches the key order other Helm tooling writes and keeps the
//! output byte-stable across runs.

use anyhow::{Context, Result};
use serde::Serialize;

/// Serialize `value` as YAML with every mapping's keys sorted.
pub fn to_sorted_yaml<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_value(value).context("Failed to convert value for YAML output")?;
    serde_yaml::to_string(&json).context("Failed to serialize YAML")
}

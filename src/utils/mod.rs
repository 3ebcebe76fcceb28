//! Shared utilities
//!
//! - [`fs`] - filesystem operations used by the fetch engine: atomic writes,
//!   "not found is fine" cleanup, and rename helpers
//! - [`yaml`] - YAML rendering with sorted mapping keys for reproducible output

pub mod fs;
pub mod yaml;

pub use fs::{atomic_write, ensure_dir, remove_dir_all_if_exists, rename_if_exists};
pub use yaml::to_sorted_yaml;

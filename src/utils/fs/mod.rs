//! File system utilities for the vendoring pipeline
//!
//! Vendoring rewrites whole directory trees under the charts root. The helpers
//! here encode the two rules the fetch engine relies on:
//!
//! - **Optimistic cleanup**: removing or renaming a path that does not exist is
//!   not an error ([`remove_dir_all_if_exists`], [`rename_if_exists`])
//! - **Atomic writes**: generated files are written to a temporary sibling and
//!   renamed into place ([`atomic_write`]), so an interrupted run never leaves a
//!   half-written lock file behind
//!
//! Every other filesystem failure is fatal and carries a
//! [`FileOperationError`](crate::core::FileOperationError) with the operation,
//! path and purpose.
//!
//! # Examples
//!
//! ```rust,no_run
//! use chart_vendor::utils::fs::{atomic_write, remove_dir_all_if_exists};
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! remove_dir_all_if_exists(Path::new("charts/memcached-0.1.0"), "removing stale backup").await?;
//! atomic_write(Path::new("charts/memcached/requirements.lock"), b"dependencies: []\n")?;
//! # Ok(())
//! # }
//! ```

mod atomic;
mod dirs;

pub use atomic::atomic_write;
pub use dirs::{ensure_dir, remove_dir_all_if_exists, rename_if_exists};

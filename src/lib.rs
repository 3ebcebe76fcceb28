//! chart-vendor - vendor pinned Helm charts into a repository
//!
//! Charts are fetched at an exact version from their chart repository,
//! expanded into `<charts-root>/<directory>`, given a regenerated
//! `requirements.lock`, and patched with review-system changes and local patch
//! files. Running the tool twice with the same configuration produces the same
//! tree byte for byte, which is what the `--check` drift check relies on.
//!
//! # Architecture Overview
//!
//! For every configured chart, concurrently:
//!
//! 1. The existing chart directory is moved aside and the pinned version is
//!    fetched in its place; a failed fetch restores the previous directory
//! 2. Dependencies are fetched concurrently into `charts/<dependency>`
//! 3. `requirements.lock` files are regenerated with a digest that depends only
//!    on the dependency list
//! 4. Patches are narrowed to the chart's own files (never `Chart.yaml` or
//!    `values_overrides/`) and applied in a fixed order
//!
//! # Core Modules
//!
//! ## Vendoring
//! - [`vendor`] - fetch engine, atomic directory swap and concurrent fan-out
//! - [`helm`] - chart repository index lookup, download and archive expansion
//! - [`lockfile`] - deterministic `requirements.lock` generation
//!
//! ## Patching
//! - [`patch`] - the `filterdiff | filterdiff | patch` pipeline and patch ordering
//! - [`gerrit`] - review-system patch retrieval
//!
//! ## Verification
//! - [`check`] - drift check against the committed tree
//! - [`git`] - git command execution and status parsing
//!
//! ## Supporting Modules
//! - [`cli`] - command-line interface
//! - [`config`] - `.charts.yml` loading and validation
//! - [`core`] - error types and user-facing error rendering
//! - [`models`] - chart, dependency and patch source types
//! - [`utils`] - filesystem and YAML helpers
//!
//! # Configuration Format (.charts.yml)
//!
//! ```yaml
//! charts:
//!   - name: memcached
//!     version: 6.6.2
//!     repository:
//!       url: https://charts.bitnami.com/bitnami
//!     dependencies:
//!       - name: common
//!         version: 2.0.0
//!         repository: https://charts.bitnami.com/bitnami
//!     patches:
//!       gerrit:
//!         review.opendev.org:
//!           - 899867
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! # Vendor all charts into ./charts
//! chart-vendor
//!
//! # Vendor one chart and verify the tree is unchanged
//! chart-vendor --check memcached
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod models;

pub mod check;
pub mod git;

pub mod gerrit;
pub mod helm;
pub mod lockfile;
pub mod patch;
pub mod vendor;

pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

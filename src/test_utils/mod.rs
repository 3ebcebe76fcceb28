//! Test utilities for chart-vendor
//!
//! Helpers shared by the unit tests and the `integration` test target (which
//! enables the `test-utils` feature):
//!
//! - [`init_test_logging`] - one-time tracing setup writing through the test harness
//! - [`chart_archive`] - gzip'd chart tarballs built in memory
//! - [`FakeFetcher`], [`FakeGerrit`], [`RecordingApplier`] - in-memory collaborators
//! - [`TestGit`] - git repositories as fixtures for drift checks

pub mod archive;
pub mod fakes;
pub mod git_helper;

pub use archive::chart_archive;
pub use fakes::{FakeFetcher, FakeGerrit, RecordingApplier};
pub use git_helper::TestGit;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. `level` wins over `RUST_LOG`; with
/// neither set, logging stays off.
///
/// # Example
///
/// ```rust,no_run
/// use tracing::Level;
///
/// chart_vendor::test_utils::init_test_logging(Some(Level::DEBUG));
/// ```
///
/// To enable logging in tests via environment variable:
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

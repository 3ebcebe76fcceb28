//! Integration test suite for chart-vendor
//!
//! End-to-end tests running the vendoring pipeline against a chart repository
//! and a Gerrit instance served from local mock servers.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **vendor**: fetching, dependencies, lock files and rollback
//! - **patches**: review-system and local patch application (needs `filterdiff` and `patch`)
//! - **drift**: `--check` against a git working tree (needs `git`)
//!
//! Tests that need external tools skip themselves when the tool is missing.

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod drift;
mod patches;
mod vendor;

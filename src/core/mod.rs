//! Core types shared by every part of chart-vendor.
//!
//! This module currently hosts the error system:
//! - [`ChartVendorError`] - typed failures of the vendoring pipeline
//! - [`PatchStage`] - which patch pipeline stage a process failure belongs to
//! - [`ErrorContext`] / [`user_friendly_error`] - rendering for the CLI boundary
//! - [`file_error`] - filesystem error context attached at the operation site

pub mod error;
pub mod file_error;

pub use error::{ChartVendorError, ErrorContext, PatchStage, user_friendly_error};
pub use file_error::{FileOperation, FileOperationError, FileResultExt};

//! Git integration using the system `git` command.
//!
//! chart-vendor only needs git for the drift check: listing the modification
//! state of the working tree and rendering a diff for diagnostics. Like Cargo,
//! it shells out to the installed `git` rather than linking a git library, so
//! the user's git configuration (safe directories, attributes, excludes) applies.

pub mod command_builder;
pub mod status;

pub use command_builder::{GitCommand, GitCommandOutput};
pub use status::{FileState, FileStatus, parse_porcelain_status};

/// Whether a `git` executable is available on `PATH`.
pub fn is_git_installed() -> bool {
    which::which("git").is_ok()
}

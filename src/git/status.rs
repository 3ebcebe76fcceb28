//! Parsing of `git status --porcelain=v1 -z` output.

use anyhow::{Result, bail};

/// Modification state of a path in the index or the working tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// No change
    Unmodified,
    /// Content or type changed
    Modified,
    /// Newly added
    Added,
    /// Deleted
    Deleted,
    /// Renamed
    Renamed,
    /// Copied
    Copied,
    /// Unmerged
    UpdatedButUnmerged,
    /// Not tracked by git
    Untracked,
    /// Ignored by git
    Ignored,
}

impl FileState {
    fn from_code(code: char) -> Result<Self> {
        Ok(match code {
            ' ' => Self::Unmodified,
            'M' | 'T' => Self::Modified,
            'A' => Self::Added,
            'D' => Self::Deleted,
            'R' => Self::Renamed,
            'C' => Self::Copied,
            'U' => Self::UpdatedButUnmerged,
            '?' => Self::Untracked,
            '!' => Self::Ignored,
            other => bail!("Unknown git status code '{other}'"),
        })
    }
}

/// Status of one path as reported by git.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    /// Path relative to the repository root
    pub path: String,
    /// State in the index
    pub staging: FileState,
    /// State in the working tree
    pub worktree: FileState,
}

impl FileStatus {
    /// Whether the path is untracked.
    pub fn is_untracked(&self) -> bool {
        self.worktree == FileState::Untracked
    }

    /// Whether the path differs from what is committed.
    pub fn is_dirty(&self) -> bool {
        let dirty = |state: FileState| !matches!(state, FileState::Unmodified | FileState::Ignored);
        dirty(self.staging) || dirty(self.worktree)
    }
}

/// Parse NUL-separated porcelain v1 status output.
///
/// Rename and copy records carry a second path (the source) which is consumed
/// and discarded; the reported path is the destination.
pub fn parse_porcelain_status(output: &str) -> Result<Vec<FileStatus>> {
    let mut records = output.split('\0').filter(|record| !record.is_empty());
    let mut statuses = Vec::new();

    while let Some(record) = records.next() {
        let mut chars = record.chars();
        let (Some(x), Some(y), Some(' ')) = (chars.next(), chars.next(), chars.next()) else {
            bail!("Malformed git status record: {record:?}");
        };
        let path = chars.as_str().to_string();
        let staging = FileState::from_code(x)?;
        let worktree = FileState::from_code(y)?;

        if matches!(staging, FileState::Renamed | FileState::Copied)
            || matches!(worktree, FileState::Renamed | FileState::Copied)
        {
            records.next();
        }

        statuses.push(FileStatus {
            path,
            staging,
            worktree,
        });
    }

    Ok(statuses)
}

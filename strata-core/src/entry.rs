//! File system entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
    Missing,
}

/// Result of a stat query
///
/// Carries no ownership; a missing path is an entry with `exists == false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub exists: bool,
    pub is_directory: bool,
    pub read_only: bool,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl FileEntry {
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn file(size: u64) -> Self {
        Self { exists: true, size, ..Default::default() }
    }

    pub fn directory() -> Self {
        Self { exists: true, is_directory: true, ..Default::default() }
    }

    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn kind(&self) -> EntryKind {
        match (self.exists, self.is_directory) {
            (false, _) => EntryKind::Missing,
            (true, true) => EntryKind::Directory,
            (true, false) => EntryKind::File,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind() == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind() == EntryKind::Directory
    }
}

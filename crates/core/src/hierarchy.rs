//! Entries of remote, lazily listed hierarchies.

use serde::{Deserialize, Serialize};
use crate::id::TaskId;
use crate::Time;

/// What a hierarchy listing is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BrowsePurpose {
    /// Picking where a backup is written
    BackupTarget,
    /// Picking where a restore is written
    RestoreTarget,
    /// Inspecting the content of a task
    TaskContent,
}

impl BrowsePurpose {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowsePurpose::BackupTarget => "BACKUP_TARGET",
            BrowsePurpose::RestoreTarget => "RESTORE_TARGET",
            BrowsePurpose::TaskContent => "TASK_CONTENT",
        }
    }
}

impl std::fmt::Display for BrowsePurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for a listing call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOptions {
    /// Omit files from the listing
    #[serde(default)]
    pub only_directories: bool,

    /// Task whose content is listed (`TASK_CONTENT` only)
    #[serde(default)]
    pub task_id: Option<TaskId>,
}

impl ListOptions {
    /// Options for a target picker.
    pub fn targets(only_directories: bool) -> Self {
        Self {
            only_directories,
            task_id: None,
        }
    }

    /// Options for listing the content of one task.
    pub fn task_content(task_id: TaskId) -> Self {
        Self {
            only_directories: false,
            task_id: Some(task_id),
        }
    }
}

/// One item of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyEntry {
    /// Name relative to the listed path (may also be absolute, e.g. `C:`)
    pub name: String,

    /// Can be descended into
    pub is_directory: bool,

    /// Size, for files
    #[serde(default)]
    pub size_bytes: Option<u64>,

    /// Creation time, when the provider knows it
    #[serde(default)]
    pub created_at: Option<Time>,

    /// Last modification time, when the provider knows it
    #[serde(default)]
    pub updated_at: Option<Time>,
}

impl HierarchyEntry {
    /// A directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
            size_bytes: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// A file entry.
    pub fn file(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
            size_bytes: Some(size_bytes),
            created_at: None,
            updated_at: None,
        }
    }
}

/// Storage status of a file chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChunkStatus {
    /// Written to the target
    Stored,
    /// Not transferred yet
    Pending,
    /// Expected but absent on the target
    Missing,
    /// Present but failed verification
    Corrupt,
}

/// One chunk of a backed-up file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkEntry {
    /// Chunk identifier (content hash)
    pub chunk_id: String,
    /// Position within the file
    pub sequence: u64,
    /// Chunk length
    pub size_bytes: u64,
    /// Storage status
    pub status: ChunkStatus,
}

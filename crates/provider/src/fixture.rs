//! JSON fixture loading for [`MemoryProvider`].
//!
//! A fixture describes what the remote task manager would answer:
//!
//! ```json
//! {
//!   "trees": {
//!     "backupTarget": { "": [{ "name": "C:", "isDirectory": true }] },
//!     "taskContent": { "t-1": { "": [{ "name": "docs", "isDirectory": true }] } }
//!   },
//!   "chunks": [
//!     { "taskId": "t-1", "filePath": "docs/a.txt", "chunks": [] }
//!   ],
//!   "tasks": [
//!     { "timeline": [{ "taskId": "t-1", "state": "RUNNING", "observedAtEpochMs": 0 }] }
//!   ]
//! }
//! ```
//!
//! Tree keys are request paths; the empty key is the top level.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tokio::fs;
use vaultview_core::{BrowsePurpose, ChunkEntry, HierarchyEntry, TaskId, TaskSnapshot};

use crate::memory::MemoryProvider;

/// Errors that can occur while loading a fixture.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Well-formed but inconsistent document
    #[error("Invalid fixture: {0}")]
    Invalid(String),
}

/// Listings per purpose, keyed by request path.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeFixture {
    /// Backup target picker listings
    #[serde(default)]
    pub backup_target: BTreeMap<String, Vec<HierarchyEntry>>,
    /// Restore target picker listings
    #[serde(default)]
    pub restore_target: BTreeMap<String, Vec<HierarchyEntry>>,
    /// Task content listings, per task
    #[serde(default)]
    pub task_content: BTreeMap<TaskId, BTreeMap<String, Vec<HierarchyEntry>>>,
}

/// Chunks of one file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkFixture {
    /// Owning task
    pub task_id: TaskId,
    /// File request path
    pub file_path: String,
    /// Chunk table
    #[serde(default)]
    pub chunks: Vec<ChunkEntry>,
}

/// Scripted task.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskFixture {
    /// Snapshots answered by successive polls
    pub timeline: Vec<TaskSnapshot>,
}

/// A complete fixture document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    /// Directory trees
    #[serde(default)]
    pub trees: TreeFixture,
    /// Chunk tables
    #[serde(default)]
    pub chunks: Vec<ChunkFixture>,
    /// Tasks
    #[serde(default)]
    pub tasks: Vec<TaskFixture>,
}

impl Fixture {
    /// Parse a fixture document.
    pub fn from_json_str(json: &str) -> Result<Self, FixtureError> {
        let fixture: Fixture = serde_json::from_str(json)?;
        fixture.validate()?;
        Ok(fixture)
    }

    /// Read and parse a fixture file.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let json = fs::read_to_string(path).await?;
        Self::from_json_str(&json)
    }

    fn validate(&self) -> Result<(), FixtureError> {
        for (index, task) in self.tasks.iter().enumerate() {
            let Some(first) = task.timeline.first() else {
                return Err(FixtureError::Invalid(format!("task #{} has an empty timeline", index)));
            };
            if let Some(other) = task.timeline.iter().find(|s| s.task_id != first.task_id) {
                return Err(FixtureError::Invalid(format!(
                    "timeline of {} contains a snapshot of {}",
                    first.task_id, other.task_id
                )));
            }
        }
        Ok(())
    }

    /// Build a provider answering from this fixture.
    pub fn into_provider(self) -> MemoryProvider {
        let provider = MemoryProvider::new();

        let trees = [
            (BrowsePurpose::BackupTarget, self.trees.backup_target),
            (BrowsePurpose::RestoreTarget, self.trees.restore_target),
        ];
        for (purpose, tree) in trees {
            for (path, entries) in tree {
                provider.set_listing(purpose, root_as_none(&path), entries);
            }
        }

        for (task_id, tree) in self.trees.task_content {
            for (path, entries) in tree {
                provider.set_task_listing(task_id.clone(), root_as_none(&path), entries);
            }
        }

        for chunk in self.chunks {
            provider.set_chunks(chunk.task_id, chunk.file_path, chunk.chunks);
        }

        for task in self.tasks {
            provider.set_timeline(task.timeline);
        }

        provider
    }
}

fn root_as_none(path: &str) -> Option<&str> {
    (!path.is_empty()).then_some(path)
}

impl MemoryProvider {
    /// Load a provider from a fixture file.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        Ok(Fixture::from_json_file(path).await?.into_provider())
    }
}

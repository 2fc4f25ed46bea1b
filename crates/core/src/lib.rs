//! vaultview core data models.
//!
//! This crate defines the values exchanged between the console core and
//! the remote task manager: task snapshots, lifecycle events, and the
//! entries of browsable hierarchies.

#![warn(missing_docs)]

// Identities
mod id;

// Tasks and their lifecycle
mod task;
mod event;

// Browsable hierarchies
mod hierarchy;

// Re-exports
pub use id::*;

pub use task::{TaskSnapshot, TaskState, TaskKind, TaskFilter, TaskOrder};
pub use event::{TaskEvent, EventKind};
pub use hierarchy::{
    BrowsePurpose, ListOptions, HierarchyEntry, ChunkEntry, ChunkStatus,
};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;

//! Provider trait abstraction.

use async_trait::async_trait;
use vaultview_core::{
    BrowsePurpose, ChunkEntry, HierarchyEntry, ListOptions, SubscriptionId, TaskFilter, TaskId,
    TaskOrder, TaskSnapshot,
};

use crate::bus::Subscription;

/// Error type for provider calls.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors a provider call can reject with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Path or task does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Service could not be reached
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Service refused the request
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Source of browsable hierarchies.
///
/// Backed by the remote task manager; listings are never cached by callers.
#[async_trait]
pub trait HierarchyProvider: Send + Sync {
    /// List the entries under `path`. `None` asks for the provider's
    /// top level (volumes, buckets, or the task's root).
    async fn list(
        &self,
        path: Option<&str>,
        purpose: BrowsePurpose,
        options: ListOptions,
    ) -> Result<Vec<HierarchyEntry>>;

    /// List the stored chunks of one file of a task.
    async fn list_chunks(&self, task_id: &TaskId, file_path: &str) -> Result<Vec<ChunkEntry>>;
}

/// Source of task snapshots and lifecycle events.
#[async_trait]
pub trait TaskProvider: Send + Sync {
    /// Fetch a fresh snapshot of one task.
    async fn get_task_info(&self, task_id: &TaskId) -> Result<TaskSnapshot>;

    /// List task ids matching `filter`, one page at a time.
    async fn list_tasks(
        &self,
        filter: &TaskFilter,
        offset: usize,
        limit: usize,
        order_by: TaskOrder,
    ) -> Result<Vec<TaskId>>;

    /// Start receiving lifecycle events.
    fn subscribe(&self) -> Subscription;

    /// Stop delivering events to a subscription.
    fn unsubscribe(&self, id: SubscriptionId);
}

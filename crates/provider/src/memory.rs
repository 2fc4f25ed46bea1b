//! In-memory provider.
//!
//! Holds per-purpose directory trees, chunk tables and scripted task
//! timelines. Every `get_task_info` call answers with the current step of a
//! task's timeline and then moves one step forward, so a poller observes the
//! task progressing. Failures and latency can be injected per path or task.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use vaultview_core::{
    BrowsePurpose, ChunkEntry, HierarchyEntry, ListOptions, SubscriptionId, TaskEvent, TaskFilter,
    TaskId, TaskOrder, TaskSnapshot,
};

use crate::bus::{EventBus, Subscription};
use crate::trait_::{HierarchyProvider, ProviderError, Result, TaskProvider};

/// A recorded `list` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCall {
    /// Requested path
    pub path: Option<String>,
    /// Requested purpose
    pub purpose: BrowsePurpose,
    /// Requested options
    pub options: ListOptions,
}

#[derive(Debug)]
struct ScriptedTask {
    timeline: Vec<TaskSnapshot>,
    cursor: usize,
}

impl ScriptedTask {
    fn current(&self) -> &TaskSnapshot {
        &self.timeline[self.cursor]
    }

    fn advance(&mut self) -> TaskSnapshot {
        let snapshot = self.timeline[self.cursor].clone();
        if self.cursor + 1 < self.timeline.len() {
            self.cursor += 1;
        }
        snapshot
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    // keyed by purpose and, for task content, the task
    trees: HashMap<(BrowsePurpose, Option<TaskId>), BTreeMap<String, Vec<HierarchyEntry>>>,
    chunks: HashMap<(TaskId, String), Vec<ChunkEntry>>,
    // creation order
    tasks: Vec<(TaskId, ScriptedTask)>,
    list_failures: HashMap<(BrowsePurpose, String), ProviderError>,
    task_failures: HashMap<TaskId, ProviderError>,
    latency: HashMap<String, Duration>,
    list_calls: Vec<ListCall>,
}

impl MemoryState {
    fn task_mut(&mut self, id: &TaskId) -> Option<&mut ScriptedTask> {
        self.tasks.iter_mut().find(|(tid, _)| tid == id).map(|(_, t)| t)
    }
}

/// In-memory implementation of both provider traits.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    state: Mutex<MemoryState>,
    bus: EventBus,
}

fn tree_key(path: Option<&str>) -> String {
    path.unwrap_or_default().to_string()
}

impl MemoryProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Set the listing returned for `path` (`None` = top level).
    pub fn set_listing(&self, purpose: BrowsePurpose, path: Option<&str>, entries: Vec<HierarchyEntry>) {
        self.lock()
            .trees
            .entry((purpose, None))
            .or_default()
            .insert(tree_key(path), entries);
    }

    /// Set the content listing of one task at `path` (`None` = task root).
    pub fn set_task_listing(&self, task_id: TaskId, path: Option<&str>, entries: Vec<HierarchyEntry>) {
        self.lock()
            .trees
            .entry((BrowsePurpose::TaskContent, Some(task_id)))
            .or_default()
            .insert(tree_key(path), entries);
    }

    /// Set the chunks returned for one file of a task.
    pub fn set_chunks(&self, task_id: TaskId, file_path: impl Into<String>, chunks: Vec<ChunkEntry>) {
        self.lock().chunks.insert((task_id, file_path.into()), chunks);
    }

    /// Register a task with a single snapshot, or append to its timeline.
    pub fn push_snapshot(&self, snapshot: TaskSnapshot) {
        let mut state = self.lock();
        if let Some(task) = state.task_mut(&snapshot.task_id) {
            task.timeline.push(snapshot);
            return;
        }
        let id = snapshot.task_id.clone();
        state.tasks.push((
            id,
            ScriptedTask {
                timeline: vec![snapshot],
                cursor: 0,
            },
        ));
    }

    /// Register a task with a full timeline. Ignored if `timeline` is empty.
    pub fn set_timeline(&self, timeline: Vec<TaskSnapshot>) {
        let Some(first) = timeline.first() else {
            return;
        };
        let id = first.task_id.clone();
        let mut state = self.lock();
        state.tasks.retain(|(tid, _)| tid != &id);
        state.tasks.push((id, ScriptedTask { timeline, cursor: 0 }));
    }

    /// Forget a task.
    pub fn remove_task(&self, task_id: &TaskId) {
        self.lock().tasks.retain(|(tid, _)| tid != task_id);
    }

    /// Make `list` reject for one path.
    pub fn fail_list(&self, purpose: BrowsePurpose, path: Option<&str>, error: ProviderError) {
        self.lock().list_failures.insert((purpose, tree_key(path)), error);
    }

    /// Make `get_task_info` reject for one task.
    pub fn fail_task(&self, task_id: TaskId, error: ProviderError) {
        self.lock().task_failures.insert(task_id, error);
    }

    /// Remove every injected failure.
    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.list_failures.clear();
        state.task_failures.clear();
    }

    /// Delay answers for one path (listing path or chunk file path).
    pub fn set_latency(&self, path: Option<&str>, delay: Duration) {
        self.lock().latency.insert(tree_key(path), delay);
    }

    /// Calls made to `list`, oldest first.
    pub fn list_calls(&self) -> Vec<ListCall> {
        self.lock().list_calls.clone()
    }

    /// Publish a lifecycle event to all subscribers.
    pub fn publish(&self, event: TaskEvent) -> usize {
        self.bus.publish(event)
    }

    /// Number of live event subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.bus.listener_count()
    }

    fn delay_for(&self, key: &str) -> Option<Duration> {
        self.lock().latency.get(key).copied()
    }
}

#[async_trait]
impl HierarchyProvider for MemoryProvider {
    async fn list(
        &self,
        path: Option<&str>,
        purpose: BrowsePurpose,
        options: ListOptions,
    ) -> Result<Vec<HierarchyEntry>> {
        let key = tree_key(path);
        let only_directories = options.only_directories;
        let scope = match purpose {
            BrowsePurpose::TaskContent => options.task_id.clone(),
            _ => None,
        };

        // Lock is released before sleeping
        let answer = {
            let mut state = self.lock();
            state.list_calls.push(ListCall {
                path: path.map(str::to_string),
                purpose,
                options,
            });

            if let Some(err) = state.list_failures.get(&(purpose, key.clone())) {
                Err(err.clone())
            } else {
                state
                    .trees
                    .get(&(purpose, scope))
                    .and_then(|tree| tree.get(&key))
                    .map(|entries| {
                        entries
                            .iter()
                            .filter(|e| !only_directories || e.is_directory)
                            .cloned()
                            .collect::<Vec<_>>()
                    })
                    .ok_or_else(|| ProviderError::NotFound(format!("{} path '{}'", purpose, key)))
            }
        };

        if let Some(delay) = self.delay_for(&key) {
            tokio::time::sleep(delay).await;
        }

        debug!("list {:?} ({}) answered", path, purpose);
        answer
    }

    async fn list_chunks(&self, task_id: &TaskId, file_path: &str) -> Result<Vec<ChunkEntry>> {
        let answer = self
            .lock()
            .chunks
            .get(&(task_id.clone(), file_path.to_string()))
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("chunks of '{}' in {}", file_path, task_id)));

        if let Some(delay) = self.delay_for(file_path) {
            tokio::time::sleep(delay).await;
        }

        answer
    }
}

#[async_trait]
impl TaskProvider for MemoryProvider {
    async fn get_task_info(&self, task_id: &TaskId) -> Result<TaskSnapshot> {
        let answer = {
            let mut state = self.lock();
            if let Some(err) = state.task_failures.get(task_id) {
                Err(err.clone())
            } else {
                state
                    .task_mut(task_id)
                    .map(ScriptedTask::advance)
                    .ok_or_else(|| ProviderError::NotFound(format!("task {}", task_id)))
            }
        };

        if let Some(delay) = self.delay_for(task_id.as_str()) {
            tokio::time::sleep(delay).await;
        }

        answer
    }

    async fn list_tasks(
        &self,
        filter: &TaskFilter,
        offset: usize,
        limit: usize,
        order_by: TaskOrder,
    ) -> Result<Vec<TaskId>> {
        let state = self.lock();
        let matching = state
            .tasks
            .iter()
            .filter(|(_, task)| filter.matches(task.current()))
            .map(|(id, _)| id.clone());

        let ids: Vec<TaskId> = match order_by {
            TaskOrder::OldestFirst => matching.collect(),
            TaskOrder::NewestFirst => {
                let mut ids: Vec<_> = matching.collect();
                ids.reverse();
                ids
            }
        };

        Ok(ids.into_iter().skip(offset).take(limit).collect())
    }

    fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.bus.unsubscribe(id);
    }
}

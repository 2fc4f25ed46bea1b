//! Task snapshot model - what the task manager reports about a task.

use serde::{Deserialize, Serialize};
use crate::id::{PlanId, TaskId};
use crate::Time;

/// Lifecycle state of a task as reported by the task manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Queued, not started yet
    Pending,
    /// Transferring data
    Running,
    /// Paused by the user
    Paused,
    /// Pause requested, not yet acknowledged by the engine
    Pausing,
    /// Finished successfully
    Done,
    /// Finished with an error
    Failed,
}

impl TaskState {
    /// Whether the task will not change any more.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether the task belongs on the incomplete list.
    pub fn is_incomplete(&self) -> bool {
        !self.is_terminal()
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
            Self::Pausing => "PAUSING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of data movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    /// Source to target
    Backup,
    /// Target back to a local path
    Restore,
}

/// Immutable point-in-time view of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    /// Task this snapshot describes
    pub task_id: TaskId,

    /// Lifecycle state at observation time
    pub state: TaskState,

    /// Bytes transferred so far
    #[serde(default)]
    pub completed_bytes: u64,

    /// Bytes to transfer in total
    #[serde(default)]
    pub total_bytes: u64,

    /// Items (files) transferred so far
    #[serde(default)]
    pub completed_items: u64,

    /// Items to transfer in total
    #[serde(default)]
    pub total_items: u64,

    /// Observation time, epoch milliseconds
    pub observed_at_epoch_ms: i64,

    /// Plan that spawned the task, if any
    #[serde(default)]
    pub owner_plan_id: Option<PlanId>,

    /// Backup or restore
    #[serde(default)]
    pub kind: Option<TaskKind>,
}

impl TaskSnapshot {
    /// Create a snapshot with zeroed counters.
    pub fn new(task_id: TaskId, state: TaskState, observed_at_epoch_ms: i64) -> Self {
        Self {
            task_id,
            state,
            completed_bytes: 0,
            total_bytes: 0,
            completed_items: 0,
            total_items: 0,
            observed_at_epoch_ms,
            owner_plan_id: None,
            kind: None,
        }
    }

    /// Set byte counters.
    pub fn with_bytes(mut self, completed: u64, total: u64) -> Self {
        self.completed_bytes = completed;
        self.total_bytes = total;
        self
    }

    /// Set item counters.
    pub fn with_items(mut self, completed: u64, total: u64) -> Self {
        self.completed_items = completed;
        self.total_items = total;
        self
    }

    /// Set the owning plan.
    pub fn with_owner_plan(mut self, plan_id: PlanId) -> Self {
        self.owner_plan_id = Some(plan_id);
        self
    }

    /// Bytes still to transfer (zero once completed passes total).
    pub fn remaining_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.completed_bytes)
    }

    /// Observation time as a timestamp.
    pub fn observed_at(&self) -> Option<Time> {
        chrono::DateTime::from_timestamp_millis(self.observed_at_epoch_ms)
    }
}

/// Filter for listing tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Accepted states (empty = any)
    pub states: Vec<TaskState>,
    /// Only tasks owned by this plan
    pub owner_plan_id: Option<PlanId>,
    /// Only tasks of this kind
    pub kind: Option<TaskKind>,
}

impl TaskFilter {
    /// Tasks that still need attention.
    pub fn incomplete() -> Self {
        Self {
            states: vec![
                TaskState::Pending,
                TaskState::Running,
                TaskState::Pausing,
                TaskState::Paused,
            ],
            ..Default::default()
        }
    }

    /// Tasks that have finished, successfully or not.
    pub fn completed() -> Self {
        Self {
            states: vec![TaskState::Done, TaskState::Failed],
            ..Default::default()
        }
    }

    /// Check a snapshot against the filter.
    pub fn matches(&self, snapshot: &TaskSnapshot) -> bool {
        if !self.states.is_empty() && !self.states.contains(&snapshot.state) {
            return false;
        }
        if let Some(plan) = &self.owner_plan_id {
            if snapshot.owner_plan_id.as_ref() != Some(plan) {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if snapshot.kind != Some(kind) {
                return false;
            }
        }
        true
    }
}

/// Ordering of task listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskOrder {
    /// Most recently created first
    #[default]
    NewestFirst,
    /// Creation order
    OldestFirst,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(TaskState::Done.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(TaskState::Paused.is_incomplete());
        assert!(TaskState::Pausing.is_incomplete());
        assert!(!TaskState::Running.is_terminal());
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let json = r#"{
            "taskId": "t-1",
            "state": "RUNNING",
            "completedBytes": 10,
            "totalBytes": 40,
            "observedAtEpochMs": 1000
        }"#;
        let snapshot: TaskSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.task_id, TaskId::new("t-1"));
        assert_eq!(snapshot.state, TaskState::Running);
        assert_eq!(snapshot.remaining_bytes(), 30);
        assert_eq!(snapshot.completed_items, 0);
        assert!(snapshot.owner_plan_id.is_none());
    }

    #[test]
    fn test_remaining_bytes_saturates() {
        let snapshot = TaskSnapshot::new("t".into(), TaskState::Running, 0).with_bytes(50, 40);
        assert_eq!(snapshot.remaining_bytes(), 0);
    }

    #[test]
    fn test_filter_matches_owner_plan() {
        let owned = TaskSnapshot::new("t-1".into(), TaskState::Running, 0)
            .with_owner_plan(PlanId::new("p-1"));
        let orphan = TaskSnapshot::new("p-1".into(), TaskState::Running, 0);

        let filter = TaskFilter {
            owner_plan_id: Some(PlanId::new("p-1")),
            ..TaskFilter::incomplete()
        };

        assert!(filter.matches(&owned));
        // a task whose id happens to equal the plan id is not owned by it
        assert!(!filter.matches(&orphan));
    }

    #[test]
    fn test_filter_states() {
        let done = TaskSnapshot::new("t".into(), TaskState::Done, 0);
        assert!(TaskFilter::completed().matches(&done));
        assert!(!TaskFilter::incomplete().matches(&done));
        assert!(TaskFilter::default().matches(&done));
    }
}

//! Poll membership.

use std::collections::BTreeMap;

use tracing::debug;
use vaultview_core::{TaskId, TaskState};

/// Set of tasks polled on every tick.
///
/// A task joins when it is observed RUNNING. A member observed in any other
/// state stays until the next [`prune`](Self::prune), so its final snapshot
/// has already been delivered when it leaves.
#[derive(Debug, Clone, Default)]
pub struct PollSet {
    // last known state per member
    members: BTreeMap<TaskId, TaskState>,
}

impl PollSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the state a task was observed in.
    ///
    /// Returns true when the task joined the set.
    pub fn observe(&mut self, task_id: &TaskId, state: TaskState) -> bool {
        if let Some(last) = self.members.get_mut(task_id) {
            *last = state;
            return false;
        }

        if state == TaskState::Running {
            debug!("Task {} joins the poll set", task_id);
            self.members.insert(task_id.clone(), state);
            return true;
        }
        false
    }

    /// Drop members whose last known state is not RUNNING.
    pub fn prune(&mut self) -> Vec<TaskId> {
        let leaving: Vec<TaskId> = self
            .members
            .iter()
            .filter(|(_, state)| **state != TaskState::Running)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &leaving {
            debug!("Task {} leaves the poll set", id);
            self.members.remove(id);
        }
        leaving
    }

    /// Drop one task regardless of its state (it no longer exists).
    pub fn remove(&mut self, task_id: &TaskId) -> bool {
        self.members.remove(task_id).is_some()
    }

    /// Members to poll now.
    pub fn running(&self) -> Vec<TaskId> {
        self.members
            .iter()
            .filter(|(_, state)| **state == TaskState::Running)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Whether a task is a member.
    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.members.contains_key(task_id)
    }

    /// Last known state of a member.
    pub fn state_of(&self, task_id: &TaskId) -> Option<TaskState> {
        self.members.get(task_id).copied()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether nothing is polled.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.members.clear();
    }
}

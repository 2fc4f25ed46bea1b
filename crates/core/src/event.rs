//! Lifecycle events published by the task manager.

use crate::id::{PlanId, TargetId, TaskId};
use serde::{Deserialize, Serialize};

/// A typed lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum TaskEvent {
    /// A task was created
    CreateTask {
        /// Task concerned
        task_id: TaskId,
    },
    /// A task was paused
    PauseTask {
        /// Task concerned
        task_id: TaskId,
    },
    /// A paused task was resumed
    ResumeTask {
        /// Task concerned
        task_id: TaskId,
    },
    /// A task failed
    FailTask {
        /// Task concerned
        task_id: TaskId,
    },
    /// A task completed
    CompleteTask {
        /// Task concerned
        task_id: TaskId,
    },
    /// A task's metadata changed
    UpdateTask {
        /// Task concerned
        task_id: TaskId,
    },
    /// A task was removed from history
    RemoveTask {
        /// Task concerned
        task_id: TaskId,
    },
    /// A plan was created
    CreatePlan {
        /// Plan concerned
        plan_id: PlanId,
    },
    /// A plan was edited
    UpdatePlan {
        /// Plan concerned
        plan_id: PlanId,
    },
    /// A plan was deleted
    RemovePlan {
        /// Plan concerned
        plan_id: PlanId,
    },
    /// A target was registered
    CreateTarget {
        /// Target concerned
        target_id: TargetId,
    },
    /// A target was edited
    UpdateTarget {
        /// Target concerned
        target_id: TargetId,
    },
    /// A target was deleted
    RemoveTarget {
        /// Target concerned
        target_id: TargetId,
    },
}

/// Payload-free discriminant of [`TaskEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// CREATE_TASK
    CreateTask,
    /// PAUSE_TASK
    PauseTask,
    /// RESUME_TASK
    ResumeTask,
    /// FAIL_TASK
    FailTask,
    /// COMPLETE_TASK
    CompleteTask,
    /// UPDATE_TASK
    UpdateTask,
    /// REMOVE_TASK
    RemoveTask,
    /// CREATE_PLAN
    CreatePlan,
    /// UPDATE_PLAN
    UpdatePlan,
    /// REMOVE_PLAN
    RemovePlan,
    /// CREATE_TARGET
    CreateTarget,
    /// UPDATE_TARGET
    UpdateTarget,
    /// REMOVE_TARGET
    RemoveTarget,
}

impl EventKind {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::CreateTask => "CREATE_TASK",
            EventKind::PauseTask => "PAUSE_TASK",
            EventKind::ResumeTask => "RESUME_TASK",
            EventKind::FailTask => "FAIL_TASK",
            EventKind::CompleteTask => "COMPLETE_TASK",
            EventKind::UpdateTask => "UPDATE_TASK",
            EventKind::RemoveTask => "REMOVE_TASK",
            EventKind::CreatePlan => "CREATE_PLAN",
            EventKind::UpdatePlan => "UPDATE_PLAN",
            EventKind::RemovePlan => "REMOVE_PLAN",
            EventKind::CreateTarget => "CREATE_TARGET",
            EventKind::UpdateTarget => "UPDATE_TARGET",
            EventKind::RemoveTarget => "REMOVE_TARGET",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TaskEvent {
    /// The event's discriminant.
    pub fn kind(&self) -> EventKind {
        match self {
            TaskEvent::CreateTask { .. } => EventKind::CreateTask,
            TaskEvent::PauseTask { .. } => EventKind::PauseTask,
            TaskEvent::ResumeTask { .. } => EventKind::ResumeTask,
            TaskEvent::FailTask { .. } => EventKind::FailTask,
            TaskEvent::CompleteTask { .. } => EventKind::CompleteTask,
            TaskEvent::UpdateTask { .. } => EventKind::UpdateTask,
            TaskEvent::RemoveTask { .. } => EventKind::RemoveTask,
            TaskEvent::CreatePlan { .. } => EventKind::CreatePlan,
            TaskEvent::UpdatePlan { .. } => EventKind::UpdatePlan,
            TaskEvent::RemovePlan { .. } => EventKind::RemovePlan,
            TaskEvent::CreateTarget { .. } => EventKind::CreateTarget,
            TaskEvent::UpdateTarget { .. } => EventKind::UpdateTarget,
            TaskEvent::RemoveTarget { .. } => EventKind::RemoveTarget,
        }
    }

    /// The task this event is about, for task events.
    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            TaskEvent::CreateTask { task_id }
            | TaskEvent::PauseTask { task_id }
            | TaskEvent::ResumeTask { task_id }
            | TaskEvent::FailTask { task_id }
            | TaskEvent::CompleteTask { task_id }
            | TaskEvent::UpdateTask { task_id }
            | TaskEvent::RemoveTask { task_id } => Some(task_id),
            _ => None,
        }
    }
}

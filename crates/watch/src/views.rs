//! Rows and totals published by the coordinator.

use std::collections::BTreeMap;

use serde::Serialize;
use vaultview_core::{PlanId, TaskId, TaskSnapshot, TaskState};
use vaultview_progress::ProgressView;

/// Whether a row reflects a fresh answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowStatus {
    /// Last poll succeeded
    Ok,
    /// Last poll failed; the status is unknown
    Error(String),
}

/// One task as shown in a task list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRow {
    /// Task shown
    pub task_id: TaskId,
    /// Last known state; `None` if the task was never fetched successfully
    pub state: Option<TaskState>,
    /// Plan that spawned the task
    pub owner_plan_id: Option<PlanId>,
    /// Counters, speed and ETA
    pub progress: Option<ProgressView>,
    /// Freshness of the row
    pub status: RowStatus,
}

impl TaskRow {
    /// Whether the last poll failed.
    pub fn is_error(&self) -> bool {
        matches!(self.status, RowStatus::Error(_))
    }
}

/// Bytes held by finished tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionTotals {
    /// Bytes over all finished tasks
    pub total_bytes: u64,
    /// Finished tasks counted
    pub task_count: usize,
    /// Bytes per owning plan
    pub by_plan: BTreeMap<PlanId, u64>,
    /// Bytes of tasks with no owning plan
    pub unassigned_bytes: u64,
}

impl ConsumptionTotals {
    /// Add one finished task.
    pub fn add(&mut self, snapshot: &TaskSnapshot) {
        self.total_bytes += snapshot.completed_bytes;
        self.task_count += 1;
        match &snapshot.owner_plan_id {
            Some(plan) => *self.by_plan.entry(plan.clone()).or_default() += snapshot.completed_bytes,
            None => self.unassigned_bytes += snapshot.completed_bytes,
        }
    }

    /// Bytes attributed to one plan.
    pub fn for_plan(&self, plan_id: &PlanId) -> u64 {
        self.by_plan.get(plan_id).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumption_groups_by_plan() {
        let plan = PlanId::new("nightly");
        let mut totals = ConsumptionTotals::default();
        totals.add(
            &TaskSnapshot::new(TaskId::new("a"), TaskState::Done, 0)
                .with_bytes(300, 300)
                .with_owner_plan(plan.clone()),
        );
        totals.add(
            &TaskSnapshot::new(TaskId::new("b"), TaskState::Done, 0)
                .with_bytes(200, 200)
                .with_owner_plan(plan.clone()),
        );
        totals.add(&TaskSnapshot::new(TaskId::new("c"), TaskState::Failed, 0).with_bytes(50, 100));

        assert_eq!(totals.total_bytes, 550);
        assert_eq!(totals.task_count, 3);
        assert_eq!(totals.for_plan(&plan), 500);
        assert_eq!(totals.unassigned_bytes, 50);
        assert_eq!(totals.for_plan(&PlanId::new("other")), 0);
    }

    #[test]
    fn test_error_row_wire_shape() {
        let row = TaskRow {
            task_id: TaskId::new("t"),
            state: None,
            owner_plan_id: None,
            progress: None,
            status: RowStatus::Error("status unknown".into()),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["status"]["status"], "ERROR");
        assert_eq!(json["status"]["message"], "status unknown");
        assert!(row.is_error());
    }
}

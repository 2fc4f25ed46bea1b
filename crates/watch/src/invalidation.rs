//! Which views a lifecycle event invalidates.

use serde::Serialize;
use vaultview_core::EventKind;

/// A view collection maintained by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum View {
    /// Tasks not finished yet
    IncompleteTasks,
    /// Finished tasks, newest first
    CompletedTasks,
    /// Storage consumed by finished tasks
    Consumption,
}

const INCOMPLETE: &[View] = &[View::IncompleteTasks];
const INCOMPLETE_COMPLETED: &[View] = &[View::IncompleteTasks, View::CompletedTasks];
const ALL: &[View] = &[View::IncompleteTasks, View::CompletedTasks, View::Consumption];
const CONSUMPTION: &[View] = &[View::Consumption];

/// Views to recompute after an event of `kind`.
pub fn views_for(kind: EventKind) -> &'static [View] {
    match kind {
        EventKind::CreateTask | EventKind::PauseTask | EventKind::ResumeTask | EventKind::UpdateTask => {
            INCOMPLETE
        }
        EventKind::FailTask | EventKind::RemoveTask => INCOMPLETE_COMPLETED,
        EventKind::CompleteTask => ALL,
        EventKind::CreatePlan
        | EventKind::UpdatePlan
        | EventKind::RemovePlan
        | EventKind::CreateTarget
        | EventKind::UpdateTarget
        | EventKind::RemoveTarget => CONSUMPTION,
    }
}

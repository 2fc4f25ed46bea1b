//! Watch layer - poll membership, event-driven view refresh, and the
//! coordinator that feeds per-task progress estimators.

#![warn(missing_docs)]

pub mod config;
pub mod membership;
pub mod invalidation;
pub mod views;
pub mod coordinator;

pub use config::WatchConfig;
pub use membership::PollSet;
pub use invalidation::{views_for, View};
pub use views::{ConsumptionTotals, RowStatus, TaskRow};
pub use coordinator::{Step, TaskWatchCoordinator, TickSummary, WatchError, Result};

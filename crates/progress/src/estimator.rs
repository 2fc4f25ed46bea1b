//! Transfer speed and time-remaining estimation.
//!
//! The estimate is a single-step derivative over the two most recent
//! snapshots with distinct observation times, not a moving average.

use serde::Serialize;
use vaultview_core::{TaskId, TaskSnapshot, TaskState};

use crate::format::{format_eta, format_speed, format_transferred, UNKNOWN};

/// Two consecutive snapshots of the same task.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedSample {
    /// Earlier snapshot
    pub previous: TaskSnapshot,
    /// Later snapshot
    pub current: TaskSnapshot,
}

impl SpeedSample {
    /// Bytes moved between the two snapshots (negative if the counter went back).
    pub fn delta_bytes(&self) -> i128 {
        self.current.completed_bytes as i128 - self.previous.completed_bytes as i128
    }

    /// Seconds elapsed between the two snapshots.
    pub fn delta_seconds(&self) -> f64 {
        (self.current.observed_at_epoch_ms - self.previous.observed_at_epoch_ms) as f64 / 1000.0
    }

    /// Bytes per second, or `None` when no time elapsed.
    pub fn speed(&self) -> Option<f64> {
        let seconds = self.delta_seconds();
        if seconds <= 0.0 {
            return None;
        }
        Some(self.delta_bytes() as f64 / seconds)
    }
}

/// Rate and time remaining derived from one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    /// Bytes per second
    pub speed_bytes_per_sec: f64,
    /// Seconds until completion; `None` when unknown
    pub eta_seconds: Option<f64>,
}

impl Estimate {
    fn from_sample(sample: &SpeedSample) -> Option<Self> {
        let speed = sample.speed()?;
        Some(Self {
            speed_bytes_per_sec: speed,
            eta_seconds: eta_seconds(&sample.current, speed),
        })
    }
}

/// What the UI renders for one task.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    /// Task being shown
    pub task_id: TaskId,
    /// Last reported state
    pub state: TaskState,
    /// Bytes transferred so far
    pub completed_bytes: u64,
    /// Bytes to transfer
    pub total_bytes: u64,
    /// Items transferred so far
    pub completed_items: u64,
    /// Items to transfer
    pub total_items: u64,
    /// Bytes per second; `None` until two snapshots were seen
    pub speed_bytes_per_sec: Option<f64>,
    /// Seconds remaining; `None` when unknown
    pub eta_seconds: Option<f64>,
    /// Rate for display
    pub formatted_speed: String,
    /// Time remaining for display
    pub formatted_eta: String,
    /// Byte counters for display
    pub formatted_transferred: String,
    /// Completion percentage by bytes, when a total is known
    pub percent_complete: Option<f64>,
}

/// Per-task estimator fed by successive snapshots.
///
/// Callers deliver snapshots in non-decreasing observation order; the
/// estimator does not reorder them.
#[derive(Debug, Clone, Default)]
pub struct ProgressEstimator {
    // Most recent snapshot, drives counters and state
    latest: Option<TaskSnapshot>,
    // Snapshot the next delta is measured from
    anchor: Option<TaskSnapshot>,
    sample: Option<SpeedSample>,
    estimate: Option<Estimate>,
}

impl ProgressEstimator {
    /// Create an estimator that has seen nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next snapshot of the task.
    ///
    /// When no time elapsed since the previous sample the estimate is kept
    /// as is; only the counters move.
    pub fn update(&mut self, snapshot: TaskSnapshot) {
        self.latest = Some(snapshot.clone());

        let Some(anchor) = self.anchor.take() else {
            self.anchor = Some(snapshot);
            return;
        };

        let sample = SpeedSample {
            previous: anchor,
            current: snapshot,
        };

        match Estimate::from_sample(&sample) {
            Some(estimate) => {
                self.estimate = Some(estimate);
                self.anchor = Some(sample.current.clone());
                self.sample = Some(sample);
            }
            None => {
                self.anchor = Some(sample.previous);
            }
        }
    }

    /// Forget everything, e.g. when a task is restarted from scratch.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Current estimate, if two usable snapshots were seen.
    pub fn estimate(&self) -> Option<Estimate> {
        self.estimate
    }

    /// The sample the estimate was derived from.
    pub fn sample(&self) -> Option<&SpeedSample> {
        self.sample.as_ref()
    }

    /// The most recent snapshot.
    pub fn latest(&self) -> Option<&TaskSnapshot> {
        self.latest.as_ref()
    }

    /// Derived view value; `None` before the first snapshot.
    pub fn view(&self) -> Option<ProgressView> {
        let latest = self.latest.as_ref()?;
        let speed = self.estimate.map(|e| e.speed_bytes_per_sec);
        // the retained rate may predate the latest counters
        let eta = speed.and_then(|speed| eta_seconds(latest, speed));

        Some(ProgressView {
            task_id: latest.task_id.clone(),
            state: latest.state,
            completed_bytes: latest.completed_bytes,
            total_bytes: latest.total_bytes,
            completed_items: latest.completed_items,
            total_items: latest.total_items,
            speed_bytes_per_sec: speed,
            eta_seconds: eta,
            formatted_speed: speed.map(format_speed).unwrap_or_else(|| UNKNOWN.to_string()),
            formatted_eta: eta.map(format_eta).unwrap_or_else(|| UNKNOWN.to_string()),
            formatted_transferred: format_transferred(latest.completed_bytes, latest.total_bytes),
            percent_complete: percent_complete(latest),
        })
    }
}

/// Seconds left at `speed`; known only while bytes remain and data moves.
fn eta_seconds(snapshot: &TaskSnapshot, speed: f64) -> Option<f64> {
    (snapshot.total_bytes > snapshot.completed_bytes && speed > 0.0)
        .then(|| snapshot.remaining_bytes() as f64 / speed)
}

fn percent_complete(snapshot: &TaskSnapshot) -> Option<f64> {
    if snapshot.total_bytes > 0 {
        let ratio = snapshot.completed_bytes as f64 / snapshot.total_bytes as f64;
        Some((ratio * 100.0).min(100.0))
    } else if snapshot.state == TaskState::Done {
        Some(100.0)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(completed: u64, total: u64, t: i64) -> TaskSnapshot {
        TaskSnapshot::new(TaskId::new("t-1"), TaskState::Running, t).with_bytes(completed, total)
    }

    #[test]
    fn test_first_update_is_unknown() {
        let mut estimator = ProgressEstimator::new();
        assert!(estimator.view().is_none());

        estimator.update(snap(10, 1000, 0).with_items(1, 20));
        let view = estimator.view().unwrap();

        assert_eq!(view.completed_bytes, 10);
        assert_eq!(view.completed_items, 1);
        assert_eq!(view.total_items, 20);
        assert!(view.speed_bytes_per_sec.is_none());
        assert!(view.eta_seconds.is_none());
        assert_eq!(view.formatted_speed, UNKNOWN);
        assert_eq!(view.formatted_eta, UNKNOWN);
        assert!(estimator.sample().is_none());
    }

    #[test]
    fn test_half_done_in_five_seconds() {
        let mut estimator = ProgressEstimator::new();
        estimator.update(snap(0, 1000, 0));
        estimator.update(snap(500, 1000, 5000));

        let view = estimator.view().unwrap();
        assert_eq!(view.speed_bytes_per_sec, Some(100.0));
        assert_eq!(view.eta_seconds, Some(5.0));
        assert_eq!(view.formatted_speed, "100 B/s");
        assert_eq!(view.formatted_eta, "5s");
        assert_eq!(view.percent_complete, Some(50.0));
    }

    #[test]
    fn test_speed_is_exact_ratio() {
        let mut estimator = ProgressEstimator::new();
        estimator.update(snap(0, 10 * 1024 * 1024, 1_000));
        estimator.update(snap(4_194_304, 10 * 1024 * 1024, 3_000));

        let estimate = estimator.estimate().unwrap();
        assert_eq!(estimate.speed_bytes_per_sec, 4_194_304.0 / 2.0);
        assert_eq!(estimator.view().unwrap().formatted_speed, "2.00 MB/s");
    }

    #[test]
    fn test_only_latest_pair_is_kept() {
        let mut estimator = ProgressEstimator::new();
        estimator.update(snap(0, 10_000, 0));
        estimator.update(snap(1000, 10_000, 1000));
        estimator.update(snap(1100, 10_000, 2000));

        let sample = estimator.sample().unwrap();
        assert_eq!(sample.previous.completed_bytes, 1000);
        assert_eq!(sample.current.completed_bytes, 1100);
        assert_eq!(estimator.estimate().unwrap().speed_bytes_per_sec, 100.0);
    }

    #[test]
    fn test_duplicate_timestamp_keeps_estimate() {
        let mut estimator = ProgressEstimator::new();
        estimator.update(snap(0, 1000, 0));
        estimator.update(snap(500, 1000, 5000));
        let before = estimator.estimate();

        estimator.update(snap(600, 1000, 5000));

        assert_eq!(estimator.estimate(), before);
        // counters still follow the newest snapshot
        assert_eq!(estimator.view().unwrap().completed_bytes, 600);
    }

    #[test]
    fn test_completion_at_same_timestamp_clears_eta() {
        let mut estimator = ProgressEstimator::new();
        estimator.update(snap(0, 1000, 0));
        estimator.update(snap(500, 1000, 5000));
        estimator.update(TaskSnapshot::new(TaskId::new("t-1"), TaskState::Done, 5000).with_bytes(1000, 1000));

        // rate kept, but nothing is left to transfer
        let view = estimator.view().unwrap();
        assert_eq!(view.speed_bytes_per_sec, Some(100.0));
        assert!(view.eta_seconds.is_none());
        assert_eq!(view.formatted_eta, UNKNOWN);
        assert_eq!(view.percent_complete, Some(100.0));
    }

    #[test]
    fn test_eta_follows_latest_counters() {
        let mut estimator = ProgressEstimator::new();
        estimator.update(snap(0, 1000, 0));
        estimator.update(snap(500, 1000, 5000));
        estimator.update(snap(800, 1000, 5000));

        // 200 bytes left at the kept 100 B/s
        assert_eq!(estimator.view().unwrap().eta_seconds, Some(2.0));
        assert_eq!(estimator.view().unwrap().formatted_eta, "2s");
    }

    #[test]
    fn test_out_of_order_snapshot_keeps_estimate() {
        let mut estimator = ProgressEstimator::new();
        estimator.update(snap(0, 1000, 0));
        estimator.update(snap(500, 1000, 5000));
        let before = estimator.estimate();

        estimator.update(snap(200, 1000, 2000));
        assert_eq!(estimator.estimate(), before);

        // the next in-order snapshot is measured from the last accepted one
        estimator.update(snap(700, 1000, 7000));
        assert_eq!(estimator.estimate().unwrap().speed_bytes_per_sec, 100.0);
    }

    #[test]
    fn test_zero_time_before_any_estimate() {
        let mut estimator = ProgressEstimator::new();
        estimator.update(snap(0, 1000, 100));
        estimator.update(snap(10, 1000, 100));

        assert!(estimator.estimate().is_none());
        assert!(estimator.view().unwrap().eta_seconds.is_none());
        assert_eq!(estimator.view().unwrap().completed_bytes, 10);
    }

    #[test]
    fn test_stalled_transfer_has_unknown_eta() {
        let mut estimator = ProgressEstimator::new();
        estimator.update(snap(300, 1000, 0));
        estimator.update(snap(300, 1000, 1000));

        let view = estimator.view().unwrap();
        assert_eq!(view.speed_bytes_per_sec, Some(0.0));
        assert_eq!(view.formatted_speed, "0 B/s");
        assert!(view.eta_seconds.is_none());
        assert_eq!(view.formatted_eta, UNKNOWN);
    }

    #[test]
    fn test_counter_going_back_has_unknown_eta() {
        let mut estimator = ProgressEstimator::new();
        estimator.update(snap(800, 1000, 0));
        estimator.update(snap(100, 1000, 1000));

        let estimate = estimator.estimate().unwrap();
        assert_eq!(estimate.speed_bytes_per_sec, -700.0);
        assert!(estimate.eta_seconds.is_none());
    }

    #[test]
    fn test_finished_transfer_has_unknown_eta() {
        let mut estimator = ProgressEstimator::new();
        estimator.update(snap(0, 1000, 0));
        estimator.update(TaskSnapshot::new(TaskId::new("t-1"), TaskState::Done, 2000).with_bytes(1000, 1000));

        let view = estimator.view().unwrap();
        assert_eq!(view.state, TaskState::Done);
        assert_eq!(view.speed_bytes_per_sec, Some(500.0));
        assert!(view.eta_seconds.is_none());
        assert_eq!(view.percent_complete, Some(100.0));
    }

    #[test]
    fn test_long_eta_formatting() {
        let mut estimator = ProgressEstimator::new();
        estimator.update(snap(0, 10_000_000, 0));
        estimator.update(snap(1000, 10_000_000, 1000));

        // 9_999_000 bytes at 1000 B/s
        assert_eq!(estimator.view().unwrap().formatted_eta, "2h 46m");
    }

    #[test]
    fn test_reset() {
        let mut estimator = ProgressEstimator::new();
        estimator.update(snap(0, 1000, 0));
        estimator.update(snap(500, 1000, 5000));
        estimator.reset();

        assert!(estimator.view().is_none());
        assert!(estimator.estimate().is_none());
    }

    #[test]
    fn test_unknown_total() {
        let mut estimator = ProgressEstimator::new();
        estimator.update(snap(0, 0, 0));
        estimator.update(snap(2048, 0, 1000));

        let view = estimator.view().unwrap();
        assert_eq!(view.formatted_speed, "2.00 KB/s");
        assert!(view.eta_seconds.is_none());
        assert!(view.percent_complete.is_none());
    }
}

//! The task watch coordinator - keeps task lists and per-task progress
//! current from lifecycle events and a fixed-interval poll.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval, timeout, Duration, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use vaultview_core::{EventKind, PlanId, TaskEvent, TaskFilter, TaskId, TaskOrder, TaskSnapshot};
use vaultview_progress::ProgressEstimator;
use vaultview_provider::{ProviderError, Subscription, TaskProvider};

use crate::config::WatchConfig;
use crate::invalidation::{views_for, View};
use crate::membership::PollSet;
use crate::views::{ConsumptionTotals, RowStatus, TaskRow};

/// Error type for coordinator calls.
pub type Result<T> = std::result::Result<T, WatchError>;

/// Coordinator errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WatchError {
    /// `step` called before `start` or after `stop`
    #[error("Coordinator is not started")]
    NotStarted,

    /// A listing call failed
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Outcome of one poll tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Polls started
    pub polled: usize,
    /// Members skipped because their previous poll is still out
    pub skipped: usize,
    /// Tasks that left the poll set before polling
    pub dropped: Vec<TaskId>,
}

/// What woke the coordinator up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The poll timer fired and polls were started
    Tick(TickSummary),
    /// One poll answered and was applied
    Polled {
        /// Task polled
        task_id: TaskId,
        /// Whether the poll succeeded
        ok: bool,
    },
    /// A lifecycle event was handled
    Event(EventKind),
    /// The event stream ended; the coordinator stopped
    Closed,
}

type PollOutcome = (TaskId, std::result::Result<TaskSnapshot, ProviderError>);

enum Wake {
    Poll(PollOutcome),
    Event(Option<TaskEvent>),
    Tick,
}

/// Keeps the task views of the console current.
///
/// The coordinator is the only writer of its state. Every `get_task_info`
/// runs on its own task with its own deadline and reports back through a
/// channel; answers are applied one task at a time, as they arrive, so a
/// slow task never holds back the others, the timer or lifecycle events.
///
/// ```text
/// event ──▶ views_for(kind) ──▶ list ids ──▶ dispatch polls
/// tick  ──▶ prune ──▶ dispatch polls for RUNNING members
/// poll answer ──▶ estimator / row status ──▶ watch channels
/// ```
pub struct TaskWatchCoordinator<P: TaskProvider + ?Sized + 'static> {
    provider: Arc<P>,
    config: WatchConfig,
    subscription: Option<Subscription>,
    ticker: Option<Interval>,
    members: PollSet,
    estimators: HashMap<TaskId, ProgressEstimator>,
    failures: HashMap<TaskId, String>,
    incomplete_ids: Vec<TaskId>,
    completed_ids: Vec<TaskId>,
    // every finished task, and the terminal snapshots fetched for them
    consumption_ids: HashSet<TaskId>,
    finished: HashMap<TaskId, TaskSnapshot>,
    in_flight: HashSet<TaskId>,
    polls_tx: mpsc::UnboundedSender<PollOutcome>,
    polls_rx: mpsc::UnboundedReceiver<PollOutcome>,
    incomplete_tx: watch::Sender<Vec<TaskRow>>,
    completed_tx: watch::Sender<Vec<TaskRow>>,
    consumption_tx: watch::Sender<ConsumptionTotals>,
}

impl<P: TaskProvider + ?Sized + 'static> TaskWatchCoordinator<P> {
    /// Create a stopped coordinator.
    pub fn new(provider: Arc<P>, config: WatchConfig) -> Self {
        let (polls_tx, polls_rx) = mpsc::unbounded_channel();
        let (incomplete_tx, _) = watch::channel(Vec::new());
        let (completed_tx, _) = watch::channel(Vec::new());
        let (consumption_tx, _) = watch::channel(ConsumptionTotals::default());
        Self {
            provider,
            config,
            subscription: None,
            ticker: None,
            members: PollSet::new(),
            estimators: HashMap::new(),
            failures: HashMap::new(),
            incomplete_ids: Vec::new(),
            completed_ids: Vec::new(),
            consumption_ids: HashSet::new(),
            finished: HashMap::new(),
            in_flight: HashSet::new(),
            polls_tx,
            polls_rx,
            incomplete_tx,
            completed_tx,
            consumption_tx,
        }
    }

    /// Subscribe to lifecycle events, start the poll timer and load every
    /// view once. Calling it again while running does nothing.
    pub async fn start(&mut self) {
        if self.is_running() {
            debug!("Coordinator already started");
            return;
        }

        let subscription = self.provider.subscribe();
        info!(
            "Watching tasks (subscription {}, polling every {:?})",
            subscription.id(),
            self.config.poll_interval
        );
        self.subscription = Some(subscription);

        // a zero period would make interval() panic
        let mut ticker = interval(self.config.poll_interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.ticker = Some(ticker);

        for view in [View::IncompleteTasks, View::CompletedTasks, View::Consumption] {
            self.refresh_logged(view).await;
        }
    }

    /// Unsubscribe and stop the timer. Safe to call at any time, repeatedly.
    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.provider.unsubscribe(subscription.id());
            info!("Stopped watching tasks (subscription {})", subscription.id());
        }
        self.ticker = None;
    }

    /// Whether `start` was called and `stop` was not.
    pub fn is_running(&self) -> bool {
        self.subscription.is_some()
    }

    /// Wait for the next poll answer, lifecycle event or timer tick, in that
    /// order of preference, and handle it.
    pub async fn step(&mut self) -> Result<Step> {
        let wake = {
            let (Some(ticker), Some(subscription)) = (self.ticker.as_mut(), self.subscription.as_mut()) else {
                return Err(WatchError::NotStarted);
            };
            let polls = &mut self.polls_rx;
            tokio::select! {
                biased;
                Some(outcome) = polls.recv() => Wake::Poll(outcome),
                event = subscription.recv() => Wake::Event(event),
                _ = ticker.tick() => Wake::Tick,
            }
        };

        match wake {
            Wake::Poll((task_id, outcome)) => {
                let ok = self.apply_poll(task_id.clone(), outcome);
                Ok(Step::Polled { task_id, ok })
            }
            Wake::Event(Some(event)) => {
                self.handle_event(&event).await;
                Ok(Step::Event(event.kind()))
            }
            Wake::Event(None) => {
                info!("Event stream closed");
                self.stop();
                Ok(Step::Closed)
            }
            Wake::Tick => Ok(Step::Tick(self.tick())),
        }
    }

    /// Run one poll: drop members that already delivered a non-RUNNING
    /// snapshot, then start a poll for each remaining member. Returns
    /// without waiting for any answer.
    pub fn tick(&mut self) -> TickSummary {
        let dropped = self.members.prune();
        if !dropped.is_empty() {
            self.release_untracked();
        }

        let mut summary = TickSummary {
            dropped,
            ..Default::default()
        };
        for task_id in self.members.running() {
            if self.dispatch(task_id) {
                summary.polled += 1;
            } else {
                summary.skipped += 1;
            }
        }

        if summary.skipped > 0 {
            debug!("{} polls still outstanding", summary.skipped);
        }
        summary
    }

    /// Wait for the next poll answer and apply it.
    ///
    /// Returns the task and whether the poll succeeded, or `None` when no
    /// poll is outstanding.
    pub async fn next_poll(&mut self) -> Option<(TaskId, bool)> {
        if self.in_flight.is_empty() {
            return None;
        }

        // the coordinator keeps a sender, so the channel never closes here
        let (task_id, outcome) = self.polls_rx.recv().await?;
        let ok = self.apply_poll(task_id.clone(), outcome);
        Some((task_id, ok))
    }

    /// Apply poll answers until none is outstanding.
    pub async fn settle(&mut self) {
        while self.next_poll().await.is_some() {}
    }

    /// Recompute the views an event invalidates.
    pub async fn handle_event(&mut self, event: &TaskEvent) {
        let kind = event.kind();
        debug!("Handling {} for {:?}", kind, event.task_id());

        if let TaskEvent::RemoveTask { task_id } = event {
            self.forget(task_id);
        }

        for view in views_for(kind) {
            self.refresh_logged(*view).await;
        }
    }

    /// Recompute one view: list its ids and start the polls it needs.
    ///
    /// Finished tasks are fetched only until their terminal snapshot is
    /// held; it does not change afterwards.
    pub async fn refresh(&mut self, view: View) -> Result<()> {
        match view {
            View::IncompleteTasks => {
                let ids = self.list_ids(&TaskFilter::incomplete(), usize::MAX).await?;
                self.incomplete_ids = ids.clone();
                for task_id in ids {
                    self.dispatch(task_id);
                }
                self.release_untracked();
                self.publish_incomplete();
            }
            View::CompletedTasks => {
                let ids = self
                    .list_ids(&TaskFilter::completed(), self.config.completed_limit)
                    .await?;
                let unknown: Vec<TaskId> = ids
                    .iter()
                    .filter(|id| !self.holds_terminal(id))
                    .cloned()
                    .collect();
                self.completed_ids = ids;
                for task_id in unknown {
                    self.dispatch(task_id);
                }
                self.release_untracked();
                self.publish_completed();
            }
            View::Consumption => {
                let ids: HashSet<TaskId> = self
                    .list_ids(&TaskFilter::completed(), usize::MAX)
                    .await?
                    .into_iter()
                    .collect();
                self.finished.retain(|id, _| ids.contains(id));
                let unknown: Vec<TaskId> = ids
                    .iter()
                    .filter(|id| !self.finished.contains_key(*id))
                    .cloned()
                    .collect();
                self.consumption_ids = ids;
                for task_id in unknown {
                    self.dispatch(task_id);
                }
                self.publish_consumption();
            }
        }
        debug!("Refreshed {:?}", view);
        Ok(())
    }

    async fn refresh_logged(&mut self, view: View) {
        if let Err(err) = self.refresh(view).await {
            warn!("Refreshing {:?} failed, keeping previous rows: {}", view, err);
        }
    }

    /// Page through `list_tasks`, newest first, up to `limit` ids.
    async fn list_ids(&self, filter: &TaskFilter, limit: usize) -> Result<Vec<TaskId>> {
        let page_size = self.config.page_size.max(1);
        let mut ids = Vec::new();

        while ids.len() < limit {
            let want = page_size.min(limit - ids.len());
            let page = self
                .provider
                .list_tasks(filter, ids.len(), want, TaskOrder::NewestFirst)
                .await?;
            let last_page = page.len() < want;
            ids.extend(page);
            if last_page {
                break;
            }
        }

        ids.truncate(limit);
        Ok(ids)
    }

    /// Start a poll unless one is already out for the task.
    fn dispatch(&mut self, task_id: TaskId) -> bool {
        if !self.in_flight.insert(task_id.clone()) {
            return false;
        }

        let provider = Arc::clone(&self.provider);
        let answers = self.polls_tx.clone();
        let deadline = self.config.poll_timeout;
        tokio::spawn(async move {
            let outcome = match timeout(deadline, provider.get_task_info(&task_id)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ProviderError::Unavailable(format!("no answer within {:?}", deadline))),
            };
            // receiver gone means the coordinator was dropped
            let _ = answers.send((task_id, outcome));
        });
        true
    }

    /// Apply one answer; returns false if the poll failed.
    fn apply_poll(&mut self, task_id: TaskId, outcome: std::result::Result<TaskSnapshot, ProviderError>) -> bool {
        self.in_flight.remove(&task_id);
        let tracked = self.is_tracked(&task_id);

        let ok = match outcome {
            Ok(snapshot) => {
                if snapshot.state.is_terminal() && self.consumption_ids.contains(&task_id) {
                    self.finished.insert(task_id.clone(), snapshot.clone());
                    self.publish_consumption();
                }
                if tracked {
                    self.observe(snapshot);
                }
                true
            }
            Err(err) => {
                warn!("Polling task {} failed: {}", task_id, err);
                if tracked {
                    self.failures.insert(task_id.clone(), format!("status unknown: {}", err));
                }
                false
            }
        };

        if !tracked {
            debug!("Task {} is no longer shown", task_id);
        }
        if self.incomplete_ids.contains(&task_id) {
            self.publish_incomplete();
        }
        if self.completed_ids.contains(&task_id) {
            self.publish_completed();
        }
        ok
    }

    fn observe(&mut self, snapshot: TaskSnapshot) {
        self.failures.remove(&snapshot.task_id);
        self.members.observe(&snapshot.task_id, snapshot.state);
        self.estimators
            .entry(snapshot.task_id.clone())
            .or_default()
            .update(snapshot);
    }

    fn is_tracked(&self, task_id: &TaskId) -> bool {
        self.incomplete_ids.contains(task_id)
            || self.completed_ids.contains(task_id)
            || self.members.contains(task_id)
    }

    fn holds_terminal(&self, task_id: &TaskId) -> bool {
        self.estimators
            .get(task_id)
            .and_then(ProgressEstimator::latest)
            .is_some_and(|s| s.state.is_terminal())
    }

    /// Drop per-task state of tasks no list shows and nobody polls.
    fn release_untracked(&mut self) {
        let incomplete = &self.incomplete_ids;
        let completed = &self.completed_ids;
        let members = &self.members;
        let tracked = |id: &TaskId| incomplete.contains(id) || completed.contains(id) || members.contains(id);

        let before = self.estimators.len();
        self.estimators.retain(|id, _| tracked(id));
        self.failures.retain(|id, _| tracked(id));

        let released = before - self.estimators.len();
        if released > 0 {
            debug!("Released {} task estimators", released);
        }
    }

    fn forget(&mut self, task_id: &TaskId) {
        debug!("Forgetting task {}", task_id);
        self.members.remove(task_id);
        self.estimators.remove(task_id);
        self.failures.remove(task_id);
        self.finished.remove(task_id);
    }

    fn publish_incomplete(&self) {
        let rows = self.incomplete_ids.iter().map(|id| self.row(id)).collect();
        self.incomplete_tx.send_replace(rows);
    }

    fn publish_completed(&self) {
        let rows = self.completed_ids.iter().map(|id| self.row(id)).collect();
        self.completed_tx.send_replace(rows);
    }

    fn publish_consumption(&self) {
        let mut totals = ConsumptionTotals::default();
        for snapshot in self.consumption_ids.iter().filter_map(|id| self.finished.get(id)) {
            totals.add(snapshot);
        }
        self.consumption_tx.send_replace(totals);
    }

    /// Current row of one task.
    pub fn row(&self, task_id: &TaskId) -> TaskRow {
        let estimator = self.estimators.get(task_id);
        let latest = estimator.and_then(ProgressEstimator::latest);

        TaskRow {
            task_id: task_id.clone(),
            state: latest.map(|s| s.state),
            owner_plan_id: latest.and_then(|s| s.owner_plan_id.clone()),
            progress: estimator.and_then(ProgressEstimator::view),
            status: match self.failures.get(task_id) {
                Some(message) => RowStatus::Error(message.clone()),
                None => RowStatus::Ok,
            },
        }
    }

    /// Unfinished task spawned by `plan_id`, if any ("backup now" guard).
    pub fn active_task_for_plan(&self, plan_id: &PlanId) -> Option<TaskId> {
        self.incomplete_ids
            .iter()
            .find(|id| {
                self.estimators
                    .get(*id)
                    .and_then(ProgressEstimator::latest)
                    .is_some_and(|s| s.state.is_incomplete() && s.owner_plan_id.as_ref() == Some(plan_id))
            })
            .cloned()
    }

    /// Estimator held for a task.
    pub fn estimator(&self, task_id: &TaskId) -> Option<&ProgressEstimator> {
        self.estimators.get(task_id)
    }

    /// Whether a task is in the poll set.
    pub fn is_polled(&self, task_id: &TaskId) -> bool {
        self.members.contains(task_id)
    }

    /// Polls started and not answered yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// The poll set.
    pub fn members(&self) -> &PollSet {
        &self.members
    }

    /// Configuration in use.
    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Observe the incomplete task list.
    pub fn incomplete_tasks(&self) -> watch::Receiver<Vec<TaskRow>> {
        self.incomplete_tx.subscribe()
    }

    /// Observe the completed task list.
    pub fn completed_tasks(&self) -> watch::Receiver<Vec<TaskRow>> {
        self.completed_tx.subscribe()
    }

    /// Observe consumption totals.
    pub fn consumption(&self) -> watch::Receiver<ConsumptionTotals> {
        self.consumption_tx.subscribe()
    }
}

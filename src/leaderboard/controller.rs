use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::{
    config::RefreshSettings,
    leaderboard::{rank, SnapshotLoader},
    models::{ExplorerError, Metric, RankingView, UserRecord},
};

/// What the presentation layer is told after every change
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    /// A load was abandoned before it settled; whatever was shown still stands
    Idle,
    Loading,
    /// Load succeeded but nobody has an account yet
    Empty,
    Ranked(RankingView),
    /// Load failed; `retained` is the last good ranking, if there was one
    Error {
        message: String,
        retained: Option<RankingView>,
    },
}

/// Result of one `refresh` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Loaded,
    Failed,
    /// A load was already in flight
    Skipped,
    /// A newer load was dispatched, or the controller was shut down, while this one ran
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Loading,
}

type Handler = Arc<dyn Fn(ViewState) + Send + Sync>;

const MIN_INTERVAL: Duration = Duration::from_secs(1);

struct ControllerState {
    phase: Phase,
    metric: Metric,
    records: Vec<UserRecord>,
    view: Option<RankingView>,
    last_updated: Option<DateTime<Utc>>,
    /// Sequence number of the most recently dispatched load
    dispatched: u64,
    shut_down: bool,
    /// Changes waiting to be handed to the handler, oldest first
    outbox: VecDeque<ViewState>,
    /// Set while some caller is draining `outbox`
    delivering: bool,
}

struct Shared {
    loader: SnapshotLoader,
    load_timeout: Duration,
    state: Mutex<ControllerState>,
    handler: Mutex<Option<Handler>>,
}

/// Owns the cached collection and the selected metric, and decides when to reload.
///
/// Dropping the controller stops its timer.
pub struct RefreshController {
    shared: Arc<Shared>,
    interval: Duration,
    timer: Option<JoinHandle<()>>,
}

/// Cloneable access to a running controller, for key handlers and spawned tasks
#[derive(Clone)]
pub struct ControllerHandle {
    shared: Arc<Shared>,
}

impl RefreshController {
    pub fn new(loader: SnapshotLoader, settings: &RefreshSettings) -> Self {
        let shared = Shared {
            loader,
            load_timeout: settings.load_timeout(),
            state: Mutex::new(ControllerState {
                phase: Phase::Idle,
                metric: Metric::default(),
                records: Vec::new(),
                view: None,
                last_updated: None,
                dispatched: 0,
                shut_down: false,
                outbox: VecDeque::new(),
                delivering: false,
            }),
            handler: Mutex::new(None),
        };

        Self {
            shared: Arc::new(shared),
            interval: settings.interval().max(MIN_INTERVAL),
            timer: None,
        }
    }

    /// Register the single state-change handler, replacing any previous one.
    ///
    /// The handler runs without any controller lock held, so it may query the
    /// controller or call `select_metric`; changes it causes are delivered
    /// after it returns.
    pub fn subscribe<F>(&self, handler: F)
    where
        F: Fn(ViewState) + Send + Sync + 'static,
    {
        *lock(&self.shared.handler) = Some(Arc::new(handler));
    }

    /// Start periodic reloads. The first load happens immediately.
    ///
    /// Intervals below one second are raised to one second.
    pub fn start(&mut self) {
        if self.timer.is_some() {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let period = self.interval;
        info!("Starting leaderboard refresh every {:?}", period);

        self.timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if shared.is_shut_down() {
                    break;
                }
                shared.refresh().await;
            }
        }));
    }

    /// Cancel the timer and discard any load still in flight
    pub fn shutdown(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        let mut state = lock(&self.shared.state);
        if !state.shut_down {
            state.shut_down = true;
            state.dispatched += 1;
            state.phase = Phase::Idle;
            debug!("Leaderboard controller shut down");
        }
    }

    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        self.shared.refresh().await
    }

    pub fn select_metric(&self, metric: Metric) {
        self.shared.select_metric(metric);
    }
}

impl Drop for RefreshController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl ControllerHandle {
    /// Reload now; a no-op returning `Skipped` while another load is running
    pub async fn refresh(&self) -> RefreshOutcome {
        self.shared.refresh().await
    }

    /// Re-rank the cached records without touching the backend
    pub fn select_metric(&self, metric: Metric) {
        self.shared.select_metric(metric);
    }

    pub fn metric(&self) -> Metric {
        lock(&self.shared.state).metric
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.shared.state).phase == Phase::Loading
    }

    pub fn current_view(&self) -> Option<RankingView> {
        lock(&self.shared.state).view.clone()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        lock(&self.shared.state).last_updated
    }
}

impl Shared {
    fn is_shut_down(&self) -> bool {
        lock(&self.state).shut_down
    }

    async fn refresh(&self) -> RefreshOutcome {
        let sequence = {
            let mut state = lock(&self.state);
            if state.shut_down || state.phase == Phase::Loading {
                debug!("Refresh skipped, load already in progress");
                return RefreshOutcome::Skipped;
            }
            state.phase = Phase::Loading;
            state.dispatched += 1;
            let sequence = state.dispatched;
            self.publish(state, ViewState::Loading);
            sequence
        };
        // resets the phase if this future is dropped before the load settles
        let _pending = PendingLoad {
            shared: self,
            sequence,
        };

        let result = match tokio::time::timeout(self.load_timeout, self.loader.load_all()).await {
            Ok(result) => result,
            Err(_) => Err(ExplorerError::LoadTimeout {
                seconds: self.load_timeout.as_secs(),
            }),
        };

        let mut state = lock(&self.state);
        if state.dispatched != sequence {
            debug!("Discarding stale load #{}", sequence);
            return RefreshOutcome::Discarded;
        }
        state.phase = Phase::Idle;

        let (outcome, view_state) = match result {
            Ok(records) => {
                let view = rank(&records, state.metric);
                state.records = records;
                state.view = Some(view.clone());
                state.last_updated = Some(Utc::now());
                (RefreshOutcome::Loaded, view_state_for(view))
            }
            Err(e) => {
                warn!("Error loading leaderboard data: {}", e);
                let retained = state.view.clone();
                (
                    RefreshOutcome::Failed,
                    ViewState::Error {
                        message: e.user_message().to_string(),
                        retained,
                    },
                )
            }
        };

        self.publish(state, view_state);
        outcome
    }

    fn select_metric(&self, metric: Metric) {
        let mut state = lock(&self.state);
        state.metric = metric;
        if state.last_updated.is_none() {
            // nothing loaded yet; the next load will use this metric
            return;
        }
        let view = rank(&state.records, metric);
        state.view = Some(view.clone());
        self.publish(state, view_state_for(view));
    }

    /// Queue `view_state` and deliver everything queued, in order.
    ///
    /// Changes are queued under the state lock, so the handler sees them in
    /// the order the state changed. One caller delivers at a time; anyone
    /// else, including the handler itself, only queues.
    fn publish(&self, mut state: MutexGuard<'_, ControllerState>, view_state: ViewState) {
        state.outbox.push_back(view_state);
        if state.delivering {
            return;
        }
        state.delivering = true;
        drop(state);

        let _delivery = Delivery(self);
        loop {
            let next = {
                let mut state = lock(&self.state);
                match state.outbox.pop_front() {
                    Some(next) => next,
                    None => {
                        state.delivering = false;
                        return;
                    }
                }
            };

            let handler = lock(&self.handler).clone();
            if let Some(handler) = handler {
                handler(next);
            }
        }
    }
}

/// Live while a load is awaited
struct PendingLoad<'a> {
    shared: &'a Shared,
    sequence: u64,
}

impl Drop for PendingLoad<'_> {
    fn drop(&mut self) {
        let mut state = lock(&self.shared.state);
        if state.dispatched == self.sequence && state.phase == Phase::Loading {
            debug!("Load #{} abandoned before it settled", self.sequence);
            state.phase = Phase::Idle;
            self.shared.publish(state, ViewState::Idle);
        }
    }
}

/// Releases the delivery flag if a handler panics
struct Delivery<'a>(&'a Shared);

impl Drop for Delivery<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            lock(&self.0.state).delivering = false;
        }
    }
}

fn view_state_for(view: RankingView) -> ViewState {
    if view.is_empty() {
        ViewState::Empty
    } else {
        ViewState::Ranked(view)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryDataSource;
    use crate::models::Material;
    use serde_json::json;

    fn settings() -> RefreshSettings {
        RefreshSettings {
            interval_seconds: 30,
            load_timeout_seconds: 5,
        }
    }

    fn recorder(controller: &RefreshController) -> Arc<Mutex<Vec<ViewState>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        controller.subscribe(move |state| sink.lock().unwrap().push(state));
        seen
    }

    #[tokio::test]
    async fn test_refresh_ranks_with_selected_metric() {
        let source = Arc::new(MemoryDataSource::demo());
        let controller = RefreshController::new(SnapshotLoader::new(source), &settings());
        let seen = recorder(&controller);

        controller.select_metric(Metric::Material(Material::Basalt));
        assert_eq!(controller.refresh().await, RefreshOutcome::Loaded);

        let states = seen.lock().unwrap().clone();
        assert_eq!(states[0], ViewState::Loading);
        match &states[1] {
            ViewState::Ranked(view) => {
                assert_eq!(view.metric, Metric::Material(Material::Basalt));
                assert_eq!(view.ordered_records[0].id, "c9d4");
                assert_eq!(view.top_value, 470.0);
                assert_eq!(view.count, 4);
            }
            other => panic!("expected ranked view, got {:?}", other),
        }
        assert!(controller.handle().last_updated().is_some());
        assert!(!controller.handle().is_loading());
    }

    #[tokio::test]
    async fn test_empty_collection_reports_empty() {
        let source = Arc::new(MemoryDataSource::new());
        let controller = RefreshController::new(SnapshotLoader::new(source), &settings());
        let seen = recorder(&controller);

        assert_eq!(controller.refresh().await, RefreshOutcome::Loaded);
        assert_eq!(seen.lock().unwrap().last(), Some(&ViewState::Empty));
    }

    #[tokio::test]
    async fn test_failure_retains_previous_view() {
        let source = Arc::new(MemoryDataSource::with_users(json!({
            "u1": { "scores": { "totalScore": 10 } }
        })));
        let controller = RefreshController::new(SnapshotLoader::new(source.clone()), &settings());
        let seen = recorder(&controller);

        assert_eq!(controller.refresh().await, RefreshOutcome::Loaded);
        let good = controller.handle().current_view();

        source.set_failure(Some("permission denied"));
        assert_eq!(controller.refresh().await, RefreshOutcome::Failed);

        match seen.lock().unwrap().last() {
            Some(ViewState::Error { message, retained }) => {
                assert_eq!(message, "Permission denied by database");
                assert_eq!(retained, &good);
            }
            other => panic!("expected error state, got {:?}", other),
        }
        assert_eq!(controller.handle().current_view(), good);
        assert!(!controller.handle().is_loading());
    }

    #[tokio::test]
    async fn test_select_metric_reranks_cached_records() {
        let source = Arc::new(MemoryDataSource::demo());
        let controller = RefreshController::new(SnapshotLoader::new(source.clone()), &settings());
        let seen = recorder(&controller);

        controller.refresh().await;
        let reads = source.read_count();
        controller.select_metric(Metric::Material(Material::Water));

        assert_eq!(source.read_count(), reads);
        match seen.lock().unwrap().last() {
            Some(ViewState::Ranked(view)) => {
                assert_eq!(view.metric, Metric::Material(Material::Water));
                assert_eq!(view.ordered_records[0].id, "a1f3");
            }
            other => panic!("expected ranked view, got {:?}", other),
        };
    }

    #[tokio::test]
    async fn test_select_metric_before_first_load_is_silent() {
        let source = Arc::new(MemoryDataSource::demo());
        let controller = RefreshController::new(SnapshotLoader::new(source), &settings());
        let seen = recorder(&controller);

        controller.select_metric(Metric::Material(Material::Gypsum));

        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(controller.handle().metric(), Metric::Material(Material::Gypsum));
    }

    #[tokio::test]
    async fn test_refresh_after_shutdown_is_skipped() {
        let source = Arc::new(MemoryDataSource::demo());
        let mut controller = RefreshController::new(SnapshotLoader::new(source.clone()), &settings());

        controller.shutdown();

        assert_eq!(controller.refresh().await, RefreshOutcome::Skipped);
        assert_eq!(source.read_count(), 0);
    }
}

use async_trait::async_trait;
use explorer_leaderboard::{
    backend::{DataSource, MemoryDataSource},
    config::RefreshSettings,
    leaderboard::{RefreshController, RefreshOutcome, SnapshotLoader, ViewState},
    models::{Material, Metric},
    Result,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Holds every read until the test opens the gate
struct GatedSource {
    gate: Notify,
    reads: AtomicUsize,
}

impl GatedSource {
    fn new() -> Self {
        Self {
            gate: Notify::new(),
            reads: AtomicUsize::new(0),
        }
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for GatedSource {
    async fn read(&self, _path: &str) -> Result<Option<Value>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(Some(json!({
            "u1": { "profile": { "email": "one@mars.io" }, "scores": { "totalScore": 5 } }
        })))
    }

    async fn write(&self, _path: &str, _value: Value) -> Result<()> {
        Ok(())
    }

    async fn remove(&self, _path: &str) -> Result<()> {
        Ok(())
    }
}

fn settings(interval_seconds: u64, load_timeout_seconds: u64) -> RefreshSettings {
    RefreshSettings {
        interval_seconds,
        load_timeout_seconds,
    }
}

fn record_states(controller: &RefreshController) -> Arc<Mutex<Vec<ViewState>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    controller.subscribe(move |state| sink.lock().unwrap().push(state));
    seen
}

#[tokio::test]
async fn test_refresh_while_loading_is_skipped() {
    let source = Arc::new(GatedSource::new());
    let controller = RefreshController::new(SnapshotLoader::new(source.clone()), &settings(30, 5));
    let handle = controller.handle();

    let first = tokio::spawn({
        let handle = handle.clone();
        async move { handle.refresh().await }
    });
    while !handle.is_loading() {
        tokio::task::yield_now().await;
    }

    assert_eq!(handle.refresh().await, RefreshOutcome::Skipped);
    assert_eq!(source.reads(), 1);

    source.gate.notify_one();
    assert_eq!(first.await.unwrap(), RefreshOutcome::Loaded);
    assert_eq!(source.reads(), 1);
    assert!(!handle.is_loading());
}

#[tokio::test]
async fn test_shutdown_discards_load_in_flight() {
    let source = Arc::new(GatedSource::new());
    let mut controller =
        RefreshController::new(SnapshotLoader::new(source.clone()), &settings(30, 5));
    let seen = record_states(&controller);
    let handle = controller.handle();

    let pending = tokio::spawn({
        let handle = handle.clone();
        async move { handle.refresh().await }
    });
    while !handle.is_loading() {
        tokio::task::yield_now().await;
    }

    controller.shutdown();
    source.gate.notify_one();

    assert_eq!(pending.await.unwrap(), RefreshOutcome::Discarded);
    assert_eq!(seen.lock().unwrap().clone(), vec![ViewState::Loading]);
    assert!(handle.current_view().is_none());
    assert!(handle.last_updated().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_slow_backend_times_out() {
    let source = Arc::new(GatedSource::new());
    let controller = RefreshController::new(SnapshotLoader::new(source.clone()), &settings(30, 2));
    let seen = record_states(&controller);

    assert_eq!(controller.refresh().await, RefreshOutcome::Failed);

    match seen.lock().unwrap().last() {
        Some(ViewState::Error { message, retained }) => {
            assert_eq!(message, "Database did not respond in time");
            assert!(retained.is_none());
        }
        other => panic!("expected error state, got {:?}", other),
    }
    assert!(!controller.handle().is_loading());

    // a later load is still allowed
    source.gate.notify_one();
    assert_eq!(controller.refresh().await, RefreshOutcome::Loaded);
}

#[tokio::test(start_paused = true)]
async fn test_timer_reloads_until_shutdown() {
    let source = Arc::new(MemoryDataSource::demo());
    let mut controller =
        RefreshController::new(SnapshotLoader::new(source.clone()), &settings(30, 5));

    controller.start();
    // ticks at 0s, 30s and 60s
    tokio::time::sleep(Duration::from_secs(65)).await;
    assert_eq!(source.read_count(), 3);

    controller.shutdown();
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(source.read_count(), 3);
}

#[tokio::test]
async fn test_handler_may_query_controller() {
    let source = Arc::new(MemoryDataSource::demo());
    let controller = RefreshController::new(SnapshotLoader::new(source), &settings(30, 5));
    let handle = controller.handle();
    let observed = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&observed);
    let inner = handle.clone();
    controller.subscribe(move |_| {
        sink.lock().unwrap().push((inner.is_loading(), inner.metric()));
    });

    assert_eq!(handle.refresh().await, RefreshOutcome::Loaded);
    handle.select_metric(Metric::all()[1]);

    let observed = observed.lock().unwrap().clone();
    assert_eq!(
        observed,
        vec![
            (true, Metric::TotalScore),
            (false, Metric::TotalScore),
            (false, Metric::all()[1]),
        ]
    );
}

#[tokio::test]
async fn test_dropping_controller_stops_timer() {
    let source = Arc::new(MemoryDataSource::demo());
    let handle = {
        let mut controller =
            RefreshController::new(SnapshotLoader::new(source.clone()), &settings(1, 1));
        controller.start();
        controller.handle()
    };

    assert_eq!(handle.refresh().await, RefreshOutcome::Skipped);
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(source.read_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_refresh_does_not_wedge_controller() {
    let source = Arc::new(GatedSource::new());
    let controller = RefreshController::new(SnapshotLoader::new(source.clone()), &settings(30, 5));
    let seen = record_states(&controller);
    let handle = controller.handle();

    let abandoned = tokio::time::timeout(Duration::from_millis(10), handle.refresh()).await;
    assert!(abandoned.is_err());
    assert!(!handle.is_loading());
    assert_eq!(
        seen.lock().unwrap().clone(),
        vec![ViewState::Loading, ViewState::Idle]
    );

    source.gate.notify_one();
    assert_eq!(handle.refresh().await, RefreshOutcome::Loaded);
    assert_eq!(source.reads(), 2);
}

#[tokio::test]
async fn test_handler_may_change_metric() {
    let source = Arc::new(MemoryDataSource::demo());
    let controller = RefreshController::new(SnapshotLoader::new(source), &settings(30, 5));
    let handle = controller.handle();
    let water = Metric::Material(Material::Water);
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    let inner = handle.clone();
    controller.subscribe(move |state| {
        let switch = matches!(&state, ViewState::Ranked(view) if view.metric == Metric::TotalScore);
        sink.lock().unwrap().push(state);
        if switch {
            inner.select_metric(water);
        }
    });

    assert_eq!(handle.refresh().await, RefreshOutcome::Loaded);

    let metrics: Vec<_> = seen
        .lock()
        .unwrap()
        .iter()
        .map(|state| match state {
            ViewState::Ranked(view) => Some(view.metric),
            _ => None,
        })
        .collect();
    assert_eq!(metrics, vec![None, Some(Metric::TotalScore), Some(water)]);
    assert_eq!(handle.metric(), water);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_published_view_matches_selected_metric() {
    let source = Arc::new(MemoryDataSource::demo());
    let controller = RefreshController::new(SnapshotLoader::new(source), &settings(30, 5));
    let handle = controller.handle();
    let published = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&published);
    controller.subscribe(move |state| {
        if let ViewState::Ranked(view) = state {
            sink.lock().unwrap().push(view.metric);
        }
    });
    assert_eq!(handle.refresh().await, RefreshOutcome::Loaded);

    let selectors: Vec<_> = (0..3)
        .map(|offset| {
            let handle = handle.clone();
            std::thread::spawn(move || {
                let metrics = Metric::all();
                for i in 0..200 {
                    handle.select_metric(metrics[(i + offset) % metrics.len()]);
                }
            })
        })
        .collect();
    let refresher = tokio::spawn({
        let handle = handle.clone();
        async move {
            for _ in 0..20 {
                handle.refresh().await;
            }
        }
    });

    for selector in selectors {
        selector.join().unwrap();
    }
    refresher.await.unwrap();

    let last = *published.lock().unwrap().last().unwrap();
    assert_eq!(last, handle.metric());
    assert_eq!(handle.current_view().map(|view| view.metric), Some(last));
}

#[tokio::test(start_paused = true)]
async fn test_zero_interval_is_raised_to_one_second() {
    let source = Arc::new(MemoryDataSource::demo());
    let mut controller =
        RefreshController::new(SnapshotLoader::new(source.clone()), &settings(0, 5));

    controller.start();
    // ticks at 0s and 1s
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(source.read_count(), 2);

    controller.shutdown();
}

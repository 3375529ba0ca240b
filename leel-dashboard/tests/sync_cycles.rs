use leel_dashboard::{ConnectivityState, CycleOutcome, DashboardError, StateStore, Synchronizer};
use leel_devkit::{fixtures, MockBackend, TestHarness};
use serde_json::json;
use std::sync::Arc;

fn synchronizer(backend: &MockBackend) -> (StateStore, Synchronizer<MockBackend>) {
    let store = StateStore::new();
    let sync = Synchronizer::new(Arc::new(backend.clone()), store.clone());
    (store, sync)
}

fn job_ids(store: &StateStore) -> Vec<String> {
    store.read(|s| s.jobs.iter().map(|job| job.job_id.clone()).collect())
}

#[tokio::test]
async fn test_healthy_cycle_commits_everything() {
    let backend = MockBackend::new();
    backend
        .reply("/health", json!({ "status": "healthy" }))
        .reply(
            "/api/jobs",
            json!({ "jobs": [{ "jobId": "j1", "schedule": "*/5 * * * *", "api": "https://x", "active": true }] }),
        )
        .reply("/api/executions", json!({ "executions": [] }))
        .reply("/api/metrics", json!({ "scheduler": { "queued": 0 } }));
    let (store, sync) = synchronizer(&backend);

    assert_eq!(sync.run_cycle().await, CycleOutcome::Online);

    let state = store.snapshot();
    assert_eq!(state.connectivity, ConnectivityState::Online);
    assert_eq!(job_ids(&store), vec!["j1"]);
    assert_eq!(state.metrics.unwrap().counter("queued"), Some(0));
    assert!(state.executions.is_empty());
}

#[tokio::test]
async fn test_degraded_backend_goes_offline_without_fetching() {
    let backend = MockBackend::healthy(vec![fixtures::job("j1")], vec![]);
    backend.reply("/health", fixtures::health("degraded"));
    let (store, sync) = synchronizer(&backend);

    assert_eq!(sync.run_cycle().await, CycleOutcome::Offline);

    let state = store.snapshot();
    assert_eq!(state.connectivity, ConnectivityState::Offline);
    assert!(state.metrics.is_none());
    assert!(state.jobs.is_empty());
    assert!(!state.loading);
    assert_eq!(backend.calls_to("/api/metrics"), 0);
    assert_eq!(backend.calls_to("/api/jobs"), 0);
}

#[tokio::test]
async fn test_unreachable_backend_goes_offline() {
    let backend = MockBackend::new();
    backend.fail("/health", DashboardError::Network("connection refused".into()));
    let (store, sync) = synchronizer(&backend);

    assert_eq!(sync.run_cycle().await, CycleOutcome::Offline);
    assert!(!store.snapshot().is_online());
}

#[tokio::test]
async fn test_one_failed_fetch_keeps_previous_data() {
    let backend = MockBackend::healthy(
        vec![fixtures::job("j1")],
        vec![fixtures::execution("e1", "j1", "SUCCESS")],
    );
    let (store, sync) = synchronizer(&backend);
    assert_eq!(sync.run_cycle().await, CycleOutcome::Online);
    let before = store.snapshot();

    backend
        .reply("/api/jobs", fixtures::jobs_body(vec![fixtures::job("j1"), fixtures::job("j2")]))
        .reply("/api/metrics", fixtures::metrics(9, 9, 9))
        .fail("/api/executions", DashboardError::Timeout(std::time::Duration::from_secs(10)));
    assert_eq!(sync.run_cycle().await, CycleOutcome::Offline);

    let after = store.snapshot();
    assert_eq!(after.connectivity, ConnectivityState::Offline);
    assert_eq!(after.jobs, before.jobs);
    assert_eq!(after.metrics, before.metrics);
    assert_eq!(after.executions, before.executions);
    assert_eq!(after.last_synced_at, before.last_synced_at);
}

#[tokio::test]
async fn test_missing_scheduler_field_fails_cycle() {
    let backend = MockBackend::healthy(vec![fixtures::job("j1")], vec![]);
    backend.reply("/api/metrics", json!({ "uptime": 12 }));
    let (store, sync) = synchronizer(&backend);

    assert_eq!(sync.run_cycle().await, CycleOutcome::Offline);
    assert!(store.snapshot().jobs.is_empty());
}

#[tokio::test]
async fn test_malformed_list_fails_cycle() {
    let backend = MockBackend::healthy(vec![], vec![]);
    backend.reply("/api/jobs", json!({ "jobs": "nope" }));
    let (_store, sync) = synchronizer(&backend);

    assert_eq!(sync.run_cycle().await, CycleOutcome::Offline);
}

#[tokio::test]
async fn test_absent_or_null_lists_are_empty() {
    let backend = MockBackend::healthy(vec![], vec![]);
    backend
        .reply("/api/jobs", json!({}))
        .reply("/api/executions", json!({ "executions": null }));
    let (store, sync) = synchronizer(&backend);

    assert_eq!(sync.run_cycle().await, CycleOutcome::Online);
    let state = store.snapshot();
    assert!(state.jobs.is_empty());
    assert!(state.executions.is_empty());
}

#[tokio::test]
async fn test_duplicate_job_ids_keep_first() {
    let backend = MockBackend::healthy(
        vec![
            fixtures::JobBuilder::new("j1").schedule("0 * * * *").build(),
            fixtures::job("j2"),
            fixtures::JobBuilder::new("j1").schedule("1 * * * *").build(),
        ],
        vec![],
    );
    let (store, sync) = synchronizer(&backend);

    sync.run_cycle().await;
    assert_eq!(job_ids(&store), vec!["j1", "j2"]);
    assert_eq!(store.read(|s| s.jobs[0].schedule.clone()), "0 * * * *");
}

#[tokio::test]
async fn test_repeated_cycles_are_idempotent() {
    let backend = MockBackend::healthy(
        vec![fixtures::job("j1"), fixtures::job("j2")],
        vec![fixtures::execution("e1", "j1", "RUNNING")],
    );
    let (store, sync) = synchronizer(&backend);

    sync.run_cycle().await;
    let once = store.snapshot();
    sync.run_cycle().await;
    let twice = store.snapshot();

    assert_eq!(twice.connectivity, once.connectivity);
    assert_eq!(twice.metrics, once.metrics);
    assert_eq!(twice.jobs, once.jobs);
    assert_eq!(twice.executions, once.executions);
}

#[tokio::test]
async fn test_later_started_cycle_wins_when_it_finishes_first() {
    let backend = MockBackend::healthy(vec![fixtures::job("old")], vec![]);
    let harness = TestHarness::new(backend.clone());
    let (store, sync) = synchronizer(&backend);

    let gate = backend.hold("/api/jobs");
    let first = tokio::spawn({
        let sync = sync.clone();
        async move { sync.run_cycle().await }
    });
    harness.wait_for_calls("/api/jobs", 1).await.unwrap();

    backend.reply("/api/jobs", fixtures::jobs_body(vec![fixtures::job("new")]));
    assert_eq!(sync.run_cycle().await, CycleOutcome::Online);
    assert_eq!(job_ids(&store), vec!["new"]);

    gate.release();
    assert_eq!(first.await.unwrap(), CycleOutcome::Superseded);
    assert_eq!(job_ids(&store), vec!["new"]);
}

#[tokio::test]
async fn test_later_started_cycle_wins_when_it_finishes_last() {
    let backend = MockBackend::healthy(vec![fixtures::job("old")], vec![]);
    let harness = TestHarness::new(backend.clone());
    let (store, sync) = synchronizer(&backend);

    let first_gate = backend.hold("/api/jobs");
    let second_gate = backend.hold("/api/jobs");
    let first = tokio::spawn({
        let sync = sync.clone();
        async move { sync.run_cycle().await }
    });
    harness.wait_for_calls("/api/jobs", 1).await.unwrap();

    backend.reply("/api/jobs", fixtures::jobs_body(vec![fixtures::job("new")]));
    let second = tokio::spawn({
        let sync = sync.clone();
        async move { sync.run_cycle().await }
    });
    harness.wait_for_calls("/api/jobs", 2).await.unwrap();

    first_gate.release();
    assert_eq!(first.await.unwrap(), CycleOutcome::Online);
    assert_eq!(job_ids(&store), vec!["old"]);

    second_gate.release();
    assert_eq!(second.await.unwrap(), CycleOutcome::Online);
    assert_eq!(job_ids(&store), vec!["new"]);
}

#[tokio::test]
async fn test_stale_failure_does_not_flip_connectivity() {
    let backend = MockBackend::healthy(vec![fixtures::job("j1")], vec![]);
    let harness = TestHarness::new(backend.clone());
    let (store, sync) = synchronizer(&backend);

    backend.fail("/api/metrics", DashboardError::Status { status: 500 });
    let gate = backend.hold("/api/metrics");
    let first = tokio::spawn({
        let sync = sync.clone();
        async move { sync.run_cycle().await }
    });
    harness.wait_for_calls("/api/metrics", 1).await.unwrap();

    backend.reply("/api/metrics", fixtures::metrics(0, 1, 2));
    assert_eq!(sync.run_cycle().await, CycleOutcome::Online);

    gate.release();
    assert_eq!(first.await.unwrap(), CycleOutcome::Superseded);
    assert!(store.snapshot().is_online());
}

//! Lifecycle tracking integration tests
//!
//! Drives a `LifecycleTracker` through complete queue scenarios against the
//! mock service: publish, pickup, progress, success, failure and retry, plus
//! cache and session behavior across executions.

use std::sync::Arc;

use serde_json::{json, Value};

use taskpulse::api::{MockConfig, MockTaskApi, SafeTaskApi};
use taskpulse::tracker::{
    Execution, LifecycleTracker, Signal, TaskHeaders, TrackerConfig, TrackingOptions,
    EXCEPTION_DATA_KEY,
};
use taskpulse::types::{TaskFields, TaskStatus};

// ─────────────────────────────────────────────────────────────────
// Test Fixtures
// ─────────────────────────────────────────────────────────────────

/// A fake queue wired to a tracker and the mock service
struct QueueHarness {
    mock: Arc<MockTaskApi>,
    tracker: LifecycleTracker,
}

impl QueueHarness {
    fn new() -> Self {
        Self::with_config(TrackerConfig::default())
    }

    fn with_config(config: TrackerConfig) -> Self {
        let mock = Arc::new(MockTaskApi::new());
        let tracker = LifecycleTracker::new(config, SafeTaskApi::new(mock.clone()));
        Self { mock, tracker }
    }

    fn with_failing_create() -> Self {
        let mock = Arc::new(MockTaskApi::with_config(MockConfig {
            fail_create: true,
            ..Default::default()
        }));
        let tracker =
            LifecycleTracker::new(TrackerConfig::default(), SafeTaskApi::new(mock.clone()));
        Self { mock, tracker }
    }

    /// Publish a task marked for tracking, returning its execution
    async fn publish(&self, message_id: &str, task_name: &str) -> Execution {
        let mut headers = TaskHeaders::new();
        headers.set_tracking_requested(true);
        let mut execution = Execution::new(message_id, task_name).with_headers(headers);
        self.tracker.handle(&mut execution, Signal::Publish).await;
        execution
    }

    /// Status of the remote mirror for an execution
    fn remote_status(&self, execution: &Execution) -> TaskStatus {
        let task_id = execution.task_id().expect("execution should carry a task id");
        self.mock
            .task(&task_id)
            .expect("task should exist remotely")
            .status
    }
}

// ─────────────────────────────────────────────────────────────────
// Publish Decision Tests
// ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unmarked_publish_is_not_tracked() {
    let harness = QueueHarness::new();

    let mut execution =
        Execution::new("msg-1", "reports.weekly").with_headers(TaskHeaders::new());
    harness.tracker.handle(&mut execution, Signal::Publish).await;
    harness.tracker.handle(&mut execution, Signal::Prerun).await;
    harness.tracker.handle(&mut execution, Signal::Success).await;

    assert_eq!(harness.mock.call_count("create_task"), 0);
    assert_eq!(harness.mock.call_count("update_task"), 0);
    assert_eq!(harness.mock.call_count("open_session"), 0);
    assert_eq!(harness.mock.task_count(), 0);
    assert!(execution.task_id().is_none());
}

#[tokio::test]
async fn test_auto_track_publishes_unmarked_tasks() {
    let harness = QueueHarness::with_config(TrackerConfig {
        auto_track: true,
        ..Default::default()
    });

    let mut execution =
        Execution::new("msg-1", "reports.weekly").with_headers(TaskHeaders::new());
    harness.tracker.handle(&mut execution, Signal::Publish).await;

    assert_eq!(harness.mock.call_count("create_task"), 1);
    assert!(execution.task_id().is_some());
}

#[tokio::test]
async fn test_schedule_options_shape_creation() {
    let harness = QueueHarness::new();
    harness.tracker.registry().register(
        "exports.monthly",
        TrackingOptions {
            value_max: Some(100),
            monitor_id: Some("mon-default".to_string()),
            ..Default::default()
        },
    );

    let mut headers = TaskHeaders::new();
    headers.set_tracking_requested(true);
    headers.set_options(
        json!({ "name": "march export", "value_max": 500 })
            .as_object()
            .unwrap()
            .clone(),
    );
    let mut execution = Execution::new("msg-1", "exports.monthly").with_headers(headers);
    harness.tracker.handle(&mut execution, Signal::Publish).await;

    let task = harness.mock.task(&execution.task_id().unwrap()).unwrap();
    assert_eq!(task.name, "march export");
    assert_eq!(task.value_max, Some(500));
    // Definition options that were not overridden still apply
    assert_eq!(
        harness.mock.last_monitor_id(),
        Some("mon-default".to_string())
    );
}

// ─────────────────────────────────────────────────────────────────
// Full Scenario Tests
// ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_full_lifecycle_success() {
    let harness = QueueHarness::new();
    harness.tracker.registry().register(
        "exports.monthly",
        TrackingOptions {
            value_max: Some(100),
            ..Default::default()
        },
    );

    // Producer side: publish creates the remote mirror in pending
    let mut execution = harness.publish("msg-1", "exports.monthly").await;
    assert_eq!(harness.remote_status(&execution), TaskStatus::Pending);
    assert_eq!(harness.tracker.cache().len(), 1);
    assert_eq!(harness.mock.call_count("open_session"), 0);

    // Worker side: pickup marks processing and opens the session
    harness.tracker.handle(&mut execution, Signal::Prerun).await;
    assert_eq!(harness.remote_status(&execution), TaskStatus::Processing);
    assert!(harness.mock.session_open());

    // Progress pushed from inside the task body
    harness
        .tracker
        .update_tracked(
            &mut execution,
            TaskFields {
                value: Some(40),
                ..Default::default()
            },
        )
        .await;
    let task_id = execution.task_id().unwrap();
    assert_eq!(harness.mock.task(&task_id).unwrap().value_percent, Some(40));

    // Completion tears everything down
    harness.tracker.handle(&mut execution, Signal::Success).await;
    assert_eq!(harness.remote_status(&execution), TaskStatus::Success);
    assert!(!harness.mock.session_open());
    assert_eq!(harness.mock.call_count("close_session"), 1);
    assert!(harness.tracker.cache().is_empty());
}

#[tokio::test]
async fn test_failure_records_exception() {
    let harness = QueueHarness::new();
    let mut execution = harness.publish("msg-1", "imports.nightly").await;

    harness.tracker.handle(&mut execution, Signal::Prerun).await;
    harness
        .tracker
        .handle(
            &mut execution,
            Signal::Failure {
                error: "disk full".to_string(),
            },
        )
        .await;

    let task_id = execution.task_id().unwrap();
    let task = harness.mock.task(&task_id).unwrap();
    assert_eq!(task.status, TaskStatus::Error);
    let data = task.data.expect("failure should attach data");
    assert_eq!(
        data.get(EXCEPTION_DATA_KEY),
        Some(&Value::String("disk full".to_string()))
    );
    assert!(!harness.mock.session_open());
}

#[tokio::test]
async fn test_retry_allows_next_attempt() {
    let harness = QueueHarness::new();
    let mut first = harness.publish("msg-1", "webhooks.deliver").await;

    harness.tracker.handle(&mut first, Signal::Prerun).await;
    harness
        .tracker
        .handle(
            &mut first,
            Signal::Retry {
                error: "connection reset".to_string(),
            },
        )
        .await;

    // Back to pending with the failure on record, not terminal
    let task_id = first.task_id().unwrap();
    let task = harness.mock.task(&task_id).unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
    assert!(task.data.unwrap().contains_key(EXCEPTION_DATA_KEY));

    // The redelivered message carries the same headers, so the fresh
    // execution still points at the same remote task
    let headers = first.headers().unwrap().clone();
    let mut second = Execution::new("msg-2", "webhooks.deliver").with_headers(headers);

    harness.tracker.handle(&mut second, Signal::Prerun).await;
    assert_eq!(
        harness.mock.task(&task_id).unwrap().status,
        TaskStatus::Processing
    );

    harness.tracker.handle(&mut second, Signal::Success).await;
    assert_eq!(
        harness.mock.task(&task_id).unwrap().status,
        TaskStatus::Success
    );
    assert_eq!(harness.mock.call_count("create_task"), 1);
}

#[tokio::test]
async fn test_terminal_task_ignores_late_signals() {
    let harness = QueueHarness::new();
    let mut execution = harness.publish("msg-1", "emails.digest").await;

    harness.tracker.handle(&mut execution, Signal::Success).await;
    let updates_after_success = harness.mock.call_count("update_task");

    // A straggling failure signal must not resurrect the task
    harness
        .tracker
        .handle(
            &mut execution,
            Signal::Failure {
                error: "late".to_string(),
            },
        )
        .await;

    let task_id = execution.task_id().unwrap();
    assert_eq!(
        harness.mock.task(&task_id).unwrap().status,
        TaskStatus::Success
    );
    assert_eq!(harness.mock.call_count("update_task"), updates_after_success);
}

#[tokio::test]
async fn test_create_failure_leaves_execution_untracked() {
    let harness = QueueHarness::with_failing_create();

    let mut headers = TaskHeaders::new();
    headers.set_tracking_requested(true);
    let mut execution = Execution::new("msg-1", "exports.monthly").with_headers(headers);

    harness.tracker.handle(&mut execution, Signal::Publish).await;
    assert_eq!(harness.mock.call_count("create_task"), 1);
    assert!(execution.task_id().is_none());
    assert!(harness.tracker.cache().is_empty());

    // Later signals fall through on the missing task id
    harness.tracker.handle(&mut execution, Signal::Prerun).await;
    harness.tracker.handle(&mut execution, Signal::Success).await;
    assert_eq!(harness.mock.call_count("update_task"), 0);
    assert_eq!(harness.mock.call_count("open_session"), 0);
    assert_eq!(harness.mock.call_count("close_session"), 0);
}

// ─────────────────────────────────────────────────────────────────
// Cache and Session Behavior Across Executions
// ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cache_eviction_on_session_exit() {
    let harness = QueueHarness::with_config(TrackerConfig {
        cache_size: 1,
        ..Default::default()
    });

    // Publishing may overfill the cache; pruning waits for session exit
    let mut a = harness.publish("msg-a", "batch.resize").await;
    let mut b = harness.publish("msg-b", "batch.resize").await;
    let _c = harness.publish("msg-c", "batch.resize").await;
    let d = harness.publish("msg-d", "batch.resize").await;
    assert_eq!(harness.tracker.cache().len(), 4);

    // Each teardown drops the finished entry and prunes one oldest
    // entry, so the cache shrinks gradually rather than all at once
    harness.tracker.handle(&mut a, Signal::Success).await;
    assert_eq!(harness.tracker.cache().len(), 2);

    harness.tracker.handle(&mut b, Signal::Success).await;
    assert_eq!(harness.tracker.cache().len(), 1);

    // The newest entry is the one that survives
    let survivor = d.task_id().unwrap();
    assert!(harness.tracker.cache().get(&survivor).is_some());
}

#[tokio::test]
async fn test_session_reopens_after_teardown() {
    let harness = QueueHarness::new();
    let mut a = harness.publish("msg-a", "sync.push").await;
    let mut b = harness.publish("msg-b", "sync.push").await;

    // The first update opens the session once for both executions
    harness.tracker.handle(&mut a, Signal::Prerun).await;
    harness.tracker.handle(&mut b, Signal::Prerun).await;
    assert_eq!(harness.mock.call_count("open_session"), 1);

    // Teardown closes it; the next update opens a fresh one
    harness.tracker.handle(&mut a, Signal::Success).await;
    assert_eq!(harness.mock.call_count("close_session"), 1);

    harness.tracker.handle(&mut b, Signal::Success).await;
    assert_eq!(harness.mock.call_count("open_session"), 2);
    assert_eq!(harness.mock.call_count("close_session"), 2);
}

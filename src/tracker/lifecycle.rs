//! Lifecycle tracker
//!
//! Mirrors host task lifecycle signals into the tracking service: publish
//! creates the remote task, prerun and the terminal signals update its
//! status, and terminal signals tear down per-execution state. Every entry
//! point is safe to call from host hooks; a tracking failure logs and
//! returns without reaching the wrapped work.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::{HttpTaskApi, SafeTaskApi};
use crate::config::Settings;
use crate::types::{merge_data, Task, TaskData, TaskFields, TaskStatus};

use super::{
    Execution, Session, Signal, TaskCache, TaskRegistry, TrackingOptions, DEFAULT_CACHE_SIZE,
    TASK_ID_KEY,
};

/// Data key under which error details land on failure and retry
pub const EXCEPTION_DATA_KEY: &str = "exception";

// ─────────────────────────────────────────────────────────────────
// Tracker Configuration
// ─────────────────────────────────────────────────────────────────

/// Behavior switches for a tracker instance
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Track every published task, not only those explicitly marked
    pub auto_track: bool,

    /// Capacity of the task cache
    pub cache_size: usize,

    /// Name prefix of the host framework's own internal tasks, which are
    /// never tracked
    pub internal_namespace: Option<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            auto_track: false,
            cache_size: DEFAULT_CACHE_SIZE,
            internal_namespace: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Lifecycle Tracker
// ─────────────────────────────────────────────────────────────────

/// Tracks host task executions against the remote service
///
/// One instance serves a whole process; all methods take `&self` and the
/// tracker is safe to share across worker threads.
pub struct LifecycleTracker {
    config: TrackerConfig,
    api: SafeTaskApi,
    cache: TaskCache,
    session: Session,
    registry: TaskRegistry,
}

impl LifecycleTracker {
    pub fn new(config: TrackerConfig, api: SafeTaskApi) -> Self {
        let cache = TaskCache::new(config.cache_size);
        Self {
            config,
            api,
            cache,
            session: Session::new(),
            registry: TaskRegistry::new(),
        }
    }

    /// Build a tracker from loaded settings
    ///
    /// Incomplete credentials produce a disabled tracker rather than an
    /// error so host applications run unchanged without tracking.
    pub fn from_settings(settings: &Settings) -> Self {
        let api = if !settings.api.is_configured() {
            debug!("Tracking not configured; lifecycle signals will be ignored");
            SafeTaskApi::unconfigured()
        } else {
            match HttpTaskApi::from_settings(&settings.api) {
                Ok(client) => SafeTaskApi::new(Arc::new(client)),
                Err(e) => {
                    warn!(error = %e, "Failed to build API client; tracking disabled");
                    SafeTaskApi::unconfigured()
                }
            }
        };

        let config = TrackerConfig {
            auto_track: settings.tracking.auto_track,
            cache_size: settings.tracking.cache_size,
            internal_namespace: settings.tracking.internal_namespace.clone(),
        };
        Self::new(config, api)
    }

    /// Tracker that ignores every signal
    pub fn disabled() -> Self {
        Self::new(TrackerConfig::default(), SafeTaskApi::unconfigured())
    }

    /// Whether signals will reach a real backend
    pub fn is_configured(&self) -> bool {
        self.api.is_configured()
    }

    /// Registry of task definitions consulted at publish time
    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Cache of recently tracked tasks
    pub fn cache(&self) -> &TaskCache {
        &self.cache
    }

    /// Dispatch one lifecycle signal for an execution
    pub async fn handle(&self, execution: &mut Execution, signal: Signal) {
        match signal {
            Signal::Publish => self.on_publish(execution).await,
            Signal::Prerun => self.on_prerun(execution).await,
            Signal::Success => self.on_success(execution).await,
            Signal::Failure { error } => self.on_failure(execution, &error).await,
            Signal::Retry { error } => self.on_retry(execution, &error).await,
        }
    }

    // ─────────────────────────────────────────────────────────────────
    // Signal Handlers
    // ─────────────────────────────────────────────────────────────────

    /// The task was published to the queue: create its remote mirror
    ///
    /// Skipped for host-internal tasks, headerless publishes, unconfigured
    /// trackers, and tasks neither marked for tracking nor covered by
    /// auto-track. Creation failure leaves the execution untracked.
    pub async fn on_publish(&self, execution: &mut Execution) {
        if let Some(namespace) = &self.config.internal_namespace {
            if execution.task_name.starts_with(namespace.as_str()) {
                return;
            }
        }
        let Some(headers) = execution.headers() else {
            return;
        };
        if !self.api.is_configured() {
            return;
        }
        if !headers.tracking_requested() && !self.config.auto_track {
            return;
        }

        let schedule_options = headers
            .options()
            .map(|data| TrackingOptions::from_data(&data));
        let definition_options = self
            .registry
            .options_for(&execution.task_name)
            .unwrap_or_default();
        let effective = match &schedule_options {
            Some(overrides) => definition_options.merged_with(overrides),
            None => definition_options,
        };

        let (name, fields, monitor_id) = effective.creation_request(&execution.task_name);
        let Some(task) = self
            .api
            .create_task(&name, &fields, monitor_id.as_deref())
            .await
        else {
            return;
        };

        info!(task_id = %task.id, task_name = %name, "Tracking task created");
        if let Some(headers) = execution.headers_mut() {
            headers.set_task_id(&task.id);
        }
        execution.set_meta(TASK_ID_KEY, Value::String(task.id.clone()));
        self.cache.set(task.clone());
        execution.memoize_task(task);
    }

    /// A worker picked the task up: mark it processing
    pub async fn on_prerun(&self, execution: &mut Execution) {
        self.update_status(execution, TaskStatus::Processing, None)
            .await;
    }

    /// The task body finished: mark success and tear down
    pub async fn on_success(&self, execution: &mut Execution) {
        self.update_status(execution, TaskStatus::Success, None)
            .await;
        self.exit_session(execution);
    }

    /// The task body failed: mark error, record the failure, tear down
    pub async fn on_failure(&self, execution: &mut Execution, error: &str) {
        self.update_status(execution, TaskStatus::Error, Some(error))
            .await;
        self.exit_session(execution);
    }

    /// The task was re-queued: back to pending with the failure recorded
    ///
    /// Pending rather than a terminal state, so the next attempt's signals
    /// pass the terminal guard and the task never reads as finished while
    /// the queue still owns it.
    pub async fn on_retry(&self, execution: &mut Execution, error: &str) {
        self.update_status(execution, TaskStatus::Pending, Some(error))
            .await;
        self.exit_session(execution);
    }

    // ─────────────────────────────────────────────────────────────────
    // Task Access
    // ─────────────────────────────────────────────────────────────────

    /// Remote task for an id, served from the cache when possible
    ///
    /// Fetched tasks are cached; misses and fetch failures are not.
    pub async fn cached_task(&self, task_id: &str) -> Option<Task> {
        if let Some(task) = self.cache.get(task_id) {
            return Some(task);
        }
        let task = self.api.get_task(task_id).await?;
        self.cache.set(task.clone());
        Some(task)
    }

    /// Remote task for an execution, memoized on the execution
    pub async fn task_for(&self, execution: &mut Execution) -> Option<Task> {
        if let Some(task) = execution.memoized_task() {
            return Some(task.clone());
        }
        let task_id = execution.task_id()?;
        let task = self.cached_task(&task_id).await?;
        execution.memoize_task(task.clone());
        Some(task)
    }

    /// Push progress or metadata updates from inside a task body
    ///
    /// Runs through the same guards as the lifecycle signals: executions
    /// without a task id, tasks that cannot be resolved, and tasks already
    /// terminal are no-ops, and `data` merges over the known remote state.
    pub async fn update_tracked(&self, execution: &mut Execution, fields: TaskFields) {
        self.guarded_update(execution, fields).await;
    }

    // ─────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────

    async fn update_status(
        &self,
        execution: &mut Execution,
        status: TaskStatus,
        error: Option<&str>,
    ) {
        let mut fields = TaskFields::status_only(status);
        if let Some(error) = error {
            let mut data = TaskData::new();
            data.insert(
                EXCEPTION_DATA_KEY.to_string(),
                Value::String(error.to_string()),
            );
            fields.data = Some(data);
        }
        self.guarded_update(execution, fields).await;
    }

    async fn guarded_update(&self, execution: &mut Execution, mut fields: TaskFields) {
        let Some(task_id) = execution.task_id() else {
            return;
        };

        let current = match execution.memoized_task() {
            Some(task) => Some(task.clone()),
            None => self.cached_task(&task_id).await,
        };

        // An unresolvable task may already be terminal
        let Some(current) = current else {
            debug!(task_id = %task_id, "Tracked task could not be resolved; update skipped");
            return;
        };

        if current.is_terminal() {
            debug!(task_id = %task_id, status = %current.status, "Task already terminal; update skipped");
            return;
        }

        self.session.enter(&self.api);

        if let Some(updates) = fields.data.take() {
            fields.data = Some(merge_data(current.data.as_ref(), &updates));
        }

        if let Some(task) = self.api.update_task(&task_id, &fields).await {
            self.cache.set(task.clone());
            execution.memoize_task(task);
        }
    }

    fn exit_session(&self, execution: &Execution) {
        let task_id = execution.task_id();
        self.session.exit(&self.api, &self.cache, task_id.as_deref());
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

//! Mock API client for testing
//!
//! In-memory `TaskApi` implementation with call counting and failure
//! injection, used by unit and integration tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Task, TaskFields, TaskStatus};

use super::TaskApi;

// ─────────────────────────────────────────────────────────────────
// Mock Configuration
// ─────────────────────────────────────────────────────────────────

/// Configuration for mock API behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Whether to fail on certain operations
    pub fail_create: bool,
    pub fail_get: bool,
    pub fail_update: bool,
}

// ─────────────────────────────────────────────────────────────────
// Mock API
// ─────────────────────────────────────────────────────────────────

/// Mock implementation of `TaskApi` for testing
pub struct MockTaskApi {
    config: MockConfig,
    tasks: RwLock<HashMap<String, Task>>,
    call_counts: RwLock<CallCounts>,
    session_open: RwLock<bool>,
    last_monitor_id: RwLock<Option<String>>,
}

/// Track method call counts for verification
#[derive(Debug, Default)]
struct CallCounts {
    create_task: u32,
    get_task: u32,
    update_task: u32,
    open_session: u32,
    close_session: u32,
}

impl MockTaskApi {
    /// Create a new mock API with default configuration
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Create a new mock API with custom configuration
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            tasks: RwLock::new(HashMap::new()),
            call_counts: RwLock::new(CallCounts::default()),
            session_open: RwLock::new(false),
            last_monitor_id: RwLock::new(None),
        }
    }

    /// Get the number of times a method was called
    pub fn call_count(&self, method: &str) -> u32 {
        let counts = self.call_counts.read();
        match method {
            "create_task" => counts.create_task,
            "get_task" => counts.get_task,
            "update_task" => counts.update_task,
            "open_session" => counts.open_session,
            "close_session" => counts.close_session,
            _ => 0,
        }
    }

    /// Reset all call counts
    pub fn reset_counts(&self) {
        *self.call_counts.write() = CallCounts::default();
    }

    /// Whether a session is currently open
    pub fn session_open(&self) -> bool {
        *self.session_open.read()
    }

    /// Monitor id passed to the most recent create call
    pub fn last_monitor_id(&self) -> Option<String> {
        self.last_monitor_id.read().clone()
    }

    /// Seed the store with an existing task
    pub fn insert_task(&self, task: Task) {
        self.tasks.write().insert(task.id.clone(), task);
    }

    /// Inspect a stored task
    pub fn task(&self, task_id: &str) -> Option<Task> {
        self.tasks.read().get(task_id).cloned()
    }

    /// Number of tasks in the store
    pub fn task_count(&self) -> usize {
        self.tasks.read().len()
    }

    fn recompute_percent(task: &mut Task) {
        task.value_percent = match (task.value, task.value_max) {
            (Some(value), Some(max)) if max > 0 => Some((value * 100) / max),
            _ => None,
        };
    }
}

impl Default for MockTaskApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskApi for MockTaskApi {
    async fn create_task(
        &self,
        name: &str,
        fields: &TaskFields,
        monitor_id: Option<&str>,
    ) -> Result<Task> {
        self.call_counts.write().create_task += 1;
        *self.last_monitor_id.write() = monitor_id.map(str::to_string);

        if self.config.fail_create {
            return Err(Error::api_connection("mock://tracker", "create failure injected"));
        }

        let now = Utc::now();
        let mut task = Task {
            id: format!("task-{}", Uuid::new_v4()),
            organization: "mock-org".to_string(),
            project: "mock-project".to_string(),
            name: name.to_string(),
            status: fields.status.unwrap_or(TaskStatus::Pending),
            value: fields.value,
            value_max: fields.value_max,
            value_percent: None,
            data: fields.data.clone(),
            created: Some(now),
            updated: Some(now),
        };
        Self::recompute_percent(&mut task);

        self.tasks.write().insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn get_task(&self, task_id: &str) -> Result<Task> {
        self.call_counts.write().get_task += 1;

        if self.config.fail_get {
            return Err(Error::api_connection("mock://tracker", "get failure injected"));
        }

        self.tasks
            .read()
            .get(task_id)
            .cloned()
            .ok_or_else(|| Error::unexpected_status(404, format!("task {} not found", task_id)))
    }

    async fn update_task(&self, task_id: &str, fields: &TaskFields) -> Result<Task> {
        self.call_counts.write().update_task += 1;

        if self.config.fail_update {
            return Err(Error::api_connection("mock://tracker", "update failure injected"));
        }

        let mut tasks = self.tasks.write();
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| Error::unexpected_status(404, format!("task {} not found", task_id)))?;

        if let Some(name) = &fields.name {
            task.name = name.clone();
        }
        if let Some(status) = fields.status {
            task.status = status;
        }
        if let Some(value) = fields.value {
            task.value = Some(value);
        }
        if let Some(value_max) = fields.value_max {
            task.value_max = Some(value_max);
        }
        // The service replaces data wholesale; merging happens client-side
        if let Some(data) = &fields.data {
            task.data = Some(data.clone());
        }
        task.updated = Some(Utc::now());
        Self::recompute_percent(task);

        Ok(task.clone())
    }

    fn open_session(&self) {
        self.call_counts.write().open_session += 1;
        *self.session_open.write() = true;
    }

    fn close_session(&self) {
        self.call_counts.write().close_session += 1;
        *self.session_open.write() = false;
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

//! Safe facade over the tracking API
//!
//! Lifecycle mirroring must never break the host workload, so this wrapper
//! swallows every API error after logging it and reports absence instead.
//! An unconfigured facade is a silent no-op that performs no network calls.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::types::{Task, TaskFields};

use super::{SharedTaskApi, TaskApi};

/// Error-swallowing wrapper around a `TaskApi`
///
/// Holds `None` when tracking is unconfigured; every call then returns
/// `None` without touching the network.
#[derive(Clone, Default)]
pub struct SafeTaskApi {
    api: Option<SharedTaskApi>,
}

impl SafeTaskApi {
    /// Wrap a configured API client
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self { api: Some(api) }
    }

    /// A facade with no backing client; every call is a no-op
    pub fn unconfigured() -> Self {
        Self { api: None }
    }

    /// Whether a backing client is present
    pub fn is_configured(&self) -> bool {
        self.api.is_some()
    }

    /// Create a task; `None` when unconfigured or on any error
    pub async fn create_task(
        &self,
        name: &str,
        fields: &TaskFields,
        monitor_id: Option<&str>,
    ) -> Option<Task> {
        let api = self.api.as_ref()?;
        match api.create_task(name, fields, monitor_id).await {
            Ok(task) => Some(task),
            Err(e) => {
                warn!(task_name = name, error = %e, "Task create failed; continuing untracked");
                None
            }
        }
    }

    /// Fetch a task; `None` when unconfigured or on any error
    pub async fn get_task(&self, task_id: &str) -> Option<Task> {
        let api = self.api.as_ref()?;
        match api.get_task(task_id).await {
            Ok(task) => Some(task),
            Err(e) => {
                warn!(task_id, error = %e, "Task fetch failed");
                None
            }
        }
    }

    /// Update a task; `None` when unconfigured or on any error
    pub async fn update_task(&self, task_id: &str, fields: &TaskFields) -> Option<Task> {
        let api = self.api.as_ref()?;
        match api.update_task(task_id, fields).await {
            Ok(task) => Some(task),
            Err(e) => {
                warn!(task_id, error = %e, "Task update failed; tracking state may lag");
                None
            }
        }
    }

    /// Open a session on the backing client, if any
    pub fn open_session(&self) {
        if let Some(api) = &self.api {
            api.open_session();
        }
    }

    /// Close a session on the backing client, if any
    pub fn close_session(&self) {
        if let Some(api) = &self.api {
            api.close_session();
        }
    }
}

impl fmt::Debug for SafeTaskApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeTaskApi")
            .field("configured", &self.is_configured())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

//! Tracking service API trait
//!
//! Defines the `TaskApi` trait implemented by the HTTP client and the mock.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Task, TaskFields};

// ─────────────────────────────────────────────────────────────────
// TaskApi Trait
// ─────────────────────────────────────────────────────────────────

/// Client interface to the task tracking service
///
/// Object-safe so the lifecycle tracker can hold an `Arc<dyn TaskApi>` and
/// tests can substitute a mock implementation.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Create a task and return the service's representation of it
    ///
    /// `name` overrides any name carried in `fields`. `monitor_id` links the
    /// task to a service-side monitor when present.
    async fn create_task(
        &self,
        name: &str,
        fields: &TaskFields,
        monitor_id: Option<&str>,
    ) -> Result<Task>;

    /// Fetch a task by id
    async fn get_task(&self, task_id: &str) -> Result<Task>;

    /// Partially update a task; unset fields are left untouched
    async fn update_task(&self, task_id: &str, fields: &TaskFields) -> Result<Task>;

    /// Begin a session spanning several calls
    ///
    /// Implementations may hold transport resources (connection pools) open
    /// until the matching [`close_session`](TaskApi::close_session). Callers
    /// guarantee balanced open/close; re-opening an open session is a no-op.
    fn open_session(&self) {}

    /// End a session opened with [`open_session`](TaskApi::open_session)
    fn close_session(&self) {}
}

/// Type alias for a shared API client reference
pub type SharedTaskApi = Arc<dyn TaskApi>;

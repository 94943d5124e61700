//! Session guard
//!
//! A session spans the lifecycle updates of one or more executions on a
//! worker and lets the API layer pool its connection for that span. Enter
//! is idempotent; exit also runs the cache teardown for the finished
//! execution. Neither can fail.

use parking_lot::Mutex;
use tracing::debug;

use crate::api::SafeTaskApi;

use super::TaskCache;

/// Open/closed state of the tracking session for this process
#[derive(Default)]
pub struct Session {
    open: Mutex<bool>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        *self.open.lock()
    }

    /// Open the session if tracking is configured and it isn't open yet
    pub fn enter(&self, api: &SafeTaskApi) {
        if !api.is_configured() {
            return;
        }
        let newly_opened = {
            let mut open = self.open.lock();
            !std::mem::replace(&mut *open, true)
        };
        if newly_opened {
            api.open_session();
            debug!("Tracking session opened");
        }
    }

    /// Tear down per-execution state and close the session if it was open
    ///
    /// Runs only for executions that actually carried a task id; evicts
    /// that task from the cache and prunes once.
    pub fn exit(&self, api: &SafeTaskApi, cache: &TaskCache, task_id: Option<&str>) {
        let Some(task_id) = task_id else { return };
        if !api.is_configured() {
            return;
        }

        cache.unset(task_id);
        cache.prune();

        let was_open = {
            let mut open = self.open.lock();
            std::mem::replace(&mut *open, false)
        };
        if was_open {
            api.close_session();
            debug!("Tracking session closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockTaskApi, TaskApi};
    use crate::types::{TaskFields, TaskStatus};
    use std::sync::Arc;

    fn mock_pair() -> (Arc<MockTaskApi>, SafeTaskApi) {
        let mock = Arc::new(MockTaskApi::new());
        let api = SafeTaskApi::new(mock.clone());
        (mock, api)
    }

    #[test]
    fn test_enter_is_idempotent() {
        let (mock, api) = mock_pair();
        let session = Session::new();

        session.enter(&api);
        session.enter(&api);

        assert!(session.is_open());
        assert_eq!(mock.call_count("open_session"), 1);
    }

    #[test]
    fn test_enter_unconfigured_is_noop() {
        let session = Session::new();
        session.enter(&SafeTaskApi::unconfigured());
        assert!(!session.is_open());
    }

    #[tokio::test]
    async fn test_exit_evicts_and_closes() {
        let (mock, api) = mock_pair();
        let session = Session::new();
        let cache = TaskCache::new(4);

        let task = mock
            .create_task("t", &TaskFields::status_only(TaskStatus::Pending), None)
            .await
            .unwrap();
        cache.set(task.clone());
        session.enter(&api);

        session.exit(&api, &cache, Some(&task.id));

        assert!(cache.is_empty());
        assert!(!session.is_open());
        assert_eq!(mock.call_count("close_session"), 1);
    }

    #[test]
    fn test_exit_without_task_id_is_noop() {
        let (mock, api) = mock_pair();
        let session = Session::new();
        let cache = TaskCache::new(4);

        session.enter(&api);
        session.exit(&api, &cache, None);

        assert!(session.is_open());
        assert_eq!(mock.call_count("close_session"), 0);
    }

    #[test]
    fn test_exit_when_never_opened_skips_close() {
        let (mock, api) = mock_pair();
        let session = Session::new();
        let cache = TaskCache::new(4);

        session.exit(&api, &cache, Some("task-1"));

        assert!(!session.is_open());
        assert_eq!(mock.call_count("close_session"), 0);
    }
}

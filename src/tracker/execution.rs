//! Host execution handle
//!
//! One `Execution` accompanies a single run of a host task through its
//! lifecycle signals. It carries the host's execution id, the task name,
//! the header bag (when the host delivered one), a memo of the remote
//! task, and metadata mirrored back into the host's result store.

use serde_json::Value;

use crate::types::{Task, TaskData};

use super::TaskHeaders;

/// Lifecycle signal emitted by a host queue framework
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// The task was published to the queue
    Publish,
    /// A worker is about to run the task body
    Prerun,
    /// The task body finished successfully
    Success,
    /// The task body failed
    Failure { error: String },
    /// The task was re-queued for another attempt
    Retry { error: String },
}

/// One execution of a host task
#[derive(Debug, Clone, Default)]
pub struct Execution {
    /// Host framework's execution id
    pub id: String,

    /// Fully qualified name of the host task
    pub task_name: String,

    headers: Option<TaskHeaders>,
    task: Option<Task>,
    meta: TaskData,
}

impl Execution {
    pub fn new(id: impl Into<String>, task_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            task_name: task_name.into(),
            headers: None,
            task: None,
            meta: TaskData::new(),
        }
    }

    pub fn with_headers(mut self, headers: TaskHeaders) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Header bag, absent when the host delivered none
    pub fn headers(&self) -> Option<&TaskHeaders> {
        self.headers.as_ref()
    }

    pub fn headers_mut(&mut self) -> Option<&mut TaskHeaders> {
        self.headers.as_mut()
    }

    /// Remote task id carried in the headers, if any
    pub fn task_id(&self) -> Option<String> {
        self.headers.as_ref().and_then(|headers| headers.task_id())
    }

    /// Remote task memoized for this execution
    pub fn memoized_task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    pub fn memoize_task(&mut self, task: Task) {
        self.task = Some(task);
    }

    /// Metadata to mirror into the host's result store
    pub fn meta(&self) -> &TaskData {
        &self.meta
    }

    pub fn set_meta(&mut self, key: impl Into<String>, value: Value) {
        self.meta.insert(key.into(), value);
    }
}

//! Tracking headers
//!
//! Typed view over the header bag a host queue framework attaches to each
//! scheduled task. Hosts serialize headers loosely, so values arrive as
//! arbitrary JSON; decoding is lenient and a wrong-typed value degrades to
//! absent with a warning instead of failing the execution.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::types::TaskData;

/// Header marking an execution for tracking
pub const TRACK_KEY: &str = "taskpulse_track";

/// Header carrying the remote task id once one exists
pub const TASK_ID_KEY: &str = "taskpulse_task_id";

/// Header carrying schedule-time tracking options
pub const OPTIONS_KEY: &str = "taskpulse_options";

/// Header bag for one scheduled task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHeaders {
    values: HashMap<String, Value>,
}

impl TaskHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw header map as delivered by the host
    pub fn as_map(&self) -> &HashMap<String, Value> {
        &self.values
    }

    /// Set an arbitrary header value
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Whether this execution was explicitly marked for tracking
    ///
    /// Accepts booleans and the common string spellings hosts produce when
    /// round-tripping headers through their transport.
    pub fn tracking_requested(&self) -> bool {
        match self.values.get(TRACK_KEY) {
            None => false,
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(s)) => {
                let s = s.to_lowercase();
                s == "true" || s == "1"
            }
            Some(other) => {
                warn!(key = TRACK_KEY, value = %other, "Ignoring non-boolean tracking flag");
                false
            }
        }
    }

    pub fn set_tracking_requested(&mut self, track: bool) {
        self.values.insert(TRACK_KEY.to_string(), Value::Bool(track));
    }

    /// Remote task id for this execution, if one has been created
    pub fn task_id(&self) -> Option<String> {
        match self.values.get(TASK_ID_KEY) {
            None => None,
            Some(Value::String(id)) => Some(id.clone()),
            Some(other) => {
                warn!(key = TASK_ID_KEY, value = %other, "Ignoring non-string task id header");
                None
            }
        }
    }

    pub fn set_task_id(&mut self, task_id: &str) {
        self.values
            .insert(TASK_ID_KEY.to_string(), Value::String(task_id.to_string()));
    }

    /// Schedule-time tracking options, if present and well-formed
    pub fn options(&self) -> Option<TaskData> {
        match self.values.get(OPTIONS_KEY) {
            None => None,
            Some(Value::Object(map)) => Some(map.clone()),
            Some(other) => {
                warn!(key = OPTIONS_KEY, value = %other, "Ignoring malformed tracking options header");
                None
            }
        }
    }

    pub fn set_options(&mut self, options: TaskData) {
        self.values
            .insert(OPTIONS_KEY.to_string(), Value::Object(options));
    }
}

impl From<HashMap<String, Value>> for TaskHeaders {
    fn from(values: HashMap<String, Value>) -> Self {
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_headers_default_untracked() {
        let headers = TaskHeaders::new();
        assert!(!headers.tracking_requested());
        assert!(headers.task_id().is_none());
        assert!(headers.options().is_none());
    }

    #[test]
    fn test_track_flag_spellings() {
        let mut headers = TaskHeaders::new();
        headers.insert(TRACK_KEY, json!(true));
        assert!(headers.tracking_requested());

        headers.insert(TRACK_KEY, json!("true"));
        assert!(headers.tracking_requested());

        headers.insert(TRACK_KEY, json!("1"));
        assert!(headers.tracking_requested());

        headers.insert(TRACK_KEY, json!(false));
        assert!(!headers.tracking_requested());

        headers.insert(TRACK_KEY, json!("no"));
        assert!(!headers.tracking_requested());
    }

    #[test]
    fn test_wrong_typed_values_degrade_to_absent() {
        let mut headers = TaskHeaders::new();
        headers.insert(TRACK_KEY, json!([1, 2, 3]));
        headers.insert(TASK_ID_KEY, json!(42));
        headers.insert(OPTIONS_KEY, json!("not an object"));

        assert!(!headers.tracking_requested());
        assert!(headers.task_id().is_none());
        assert!(headers.options().is_none());
    }

    #[test]
    fn test_task_id_round_trip() {
        let mut headers = TaskHeaders::new();
        assert!(headers.task_id().is_none());
        headers.set_task_id("task-123");
        assert_eq!(headers.task_id(), Some("task-123".to_string()));
    }

    #[test]
    fn test_options_round_trip() {
        let mut headers = TaskHeaders::new();
        let mut options = TaskData::new();
        options.insert("value_max".to_string(), json!(500));
        headers.set_options(options.clone());
        assert_eq!(headers.options(), Some(options));
    }

    #[test]
    fn test_serde_transparent() {
        let mut headers = TaskHeaders::new();
        headers.set_tracking_requested(true);
        headers.set_task_id("task-1");

        let encoded = serde_json::to_value(&headers).unwrap();
        assert_eq!(encoded[TRACK_KEY], json!(true));
        assert_eq!(encoded[TASK_ID_KEY], json!("task-1"));

        let decoded: TaskHeaders = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, headers);
    }
}

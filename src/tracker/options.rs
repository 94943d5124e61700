//! Tracking options
//!
//! Declarative tracking parameters. Task definitions register a baseline
//! set and individual schedulings may override it; the merge is per field
//! with the later source winning, except `data`, which merges key by key.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::types::{merge_data, TaskData, TaskFields, TaskStatus};

/// Tracking parameters for a task definition or a single scheduling
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingOptions {
    /// Display name for the remote task; defaults to the host task name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Requested initial status; creation forces pending regardless
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,

    /// Initial progress value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,

    /// Progress value at which the task counts as complete
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_max: Option<i64>,

    /// Arbitrary metadata attached to the remote task
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<TaskData>,

    /// Seconds the task may run before the service flags it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_runtime: Option<i64>,

    /// Seconds without updates before the service marks the task stale
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_timeout: Option<i64>,

    /// Monitor to associate the created task with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitor_id: Option<String>,
}

impl TrackingOptions {
    /// Decode options from a loosely typed map, ignoring what doesn't fit
    ///
    /// Unknown keys and wrong-typed values are dropped with a warning so a
    /// stale producer can never break consumers.
    pub fn from_data(data: &TaskData) -> Self {
        let mut options = TrackingOptions::default();
        for (key, value) in data {
            match key.as_str() {
                "name" => options.name = decode_string(key, value),
                "status" => options.status = decode_status(key, value),
                "value" => options.value = decode_int(key, value),
                "value_max" => options.value_max = decode_int(key, value),
                "data" => options.data = decode_object(key, value),
                "max_runtime" => options.max_runtime = decode_int(key, value),
                "stale_timeout" => options.stale_timeout = decode_int(key, value),
                "monitor_id" => options.monitor_id = decode_string(key, value),
                other => warn!(key = other, "Ignoring unknown tracking option"),
            }
        }
        options
    }

    /// Encode options as a plain map suitable for a header bag
    pub fn to_data(&self) -> TaskData {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => TaskData::new(),
        }
    }

    /// Overlay `overrides` on top of these options
    ///
    /// Every set field in `overrides` wins; `data` maps merge key by key
    /// with override values replacing base ones.
    pub fn merged_with(&self, overrides: &TrackingOptions) -> TrackingOptions {
        TrackingOptions {
            name: overrides.name.clone().or_else(|| self.name.clone()),
            status: overrides.status.or(self.status),
            value: overrides.value.or(self.value),
            value_max: overrides.value_max.or(self.value_max),
            data: match (&self.data, &overrides.data) {
                (Some(base), Some(over)) => Some(merge_data(Some(base), over)),
                (None, Some(over)) => Some(over.clone()),
                (Some(base), None) => Some(base.clone()),
                (None, None) => None,
            },
            max_runtime: overrides.max_runtime.or(self.max_runtime),
            stale_timeout: overrides.stale_timeout.or(self.stale_timeout),
            monitor_id: overrides
                .monitor_id
                .clone()
                .or_else(|| self.monitor_id.clone()),
        }
    }

    /// Resolve the create call for these options
    ///
    /// Returns the task name (falling back to `default_name`), the fields
    /// to send, and the monitor id. Status is always pending on creation;
    /// an option asking for anything else is ignored.
    pub fn creation_request(&self, default_name: &str) -> (String, TaskFields, Option<String>) {
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| default_name.to_string());
        let fields = TaskFields {
            name: None,
            status: Some(TaskStatus::Pending),
            value: self.value,
            value_max: self.value_max,
            data: self.data.clone(),
            max_runtime: self.max_runtime,
            stale_timeout: self.stale_timeout,
        };
        (name, fields, self.monitor_id.clone())
    }
}

fn decode_string(key: &str, value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        other => {
            warn!(key, value = %other, "Ignoring non-string tracking option");
            None
        }
    }
}

fn decode_int(key: &str, value: &Value) -> Option<i64> {
    match value.as_i64() {
        Some(n) => Some(n),
        None => {
            warn!(key, value = %value, "Ignoring non-integer tracking option");
            None
        }
    }
}

fn decode_object(key: &str, value: &Value) -> Option<TaskData> {
    match value {
        Value::Object(map) => Some(map.clone()),
        other => {
            warn!(key, value = %other, "Ignoring non-object tracking option");
            None
        }
    }
}

fn decode_status(key: &str, value: &Value) -> Option<TaskStatus> {
    let Value::String(s) = value else {
        warn!(key, value = %value, "Ignoring non-string status option");
        return None;
    };
    match s.parse::<TaskStatus>() {
        Ok(status) => Some(status),
        Err(e) => {
            warn!(key, error = %e, "Ignoring unparseable status option");
            None
        }
    }
}

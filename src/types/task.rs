//! Task data model
//!
//! Defines the remote task representation, its status values, and the
//! partial-update field set sent to the tracking service. These types mirror
//! the service's JSON wire format.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Arbitrary JSON object attached to a task
pub type TaskData = serde_json::Map<String, Value>;

// ─────────────────────────────────────────────────────────────────
// Task Status
// ─────────────────────────────────────────────────────────────────

/// Lifecycle status of a tracked task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Queued, not yet picked up by a worker
    #[default]
    Pending,
    /// Preparing inputs
    PreProcessing,
    /// Actively running
    Processing,
    /// Finalizing outputs
    PostProcessing,
    /// Finished successfully
    Success,
    /// Finished with an error
    Error,
    /// Cancelled before completion
    Cancelled,
    /// Stopped reporting progress
    Stale,
}

impl TaskStatus {
    /// Get all status values
    pub fn all() -> &'static [TaskStatus] {
        &[
            TaskStatus::Pending,
            TaskStatus::PreProcessing,
            TaskStatus::Processing,
            TaskStatus::PostProcessing,
            TaskStatus::Success,
            TaskStatus::Error,
            TaskStatus::Cancelled,
            TaskStatus::Stale,
        ]
    }

    /// Whether this status is terminal
    ///
    /// A task in a terminal status is never updated again; late lifecycle
    /// signals for it are ignored.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Success | TaskStatus::Error | TaskStatus::Cancelled | TaskStatus::Stale
        )
    }

    /// Wire-format name (snake_case)
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::PreProcessing => "pre_processing",
            TaskStatus::Processing => "processing",
            TaskStatus::PostProcessing => "post_processing",
            TaskStatus::Success => "success",
            TaskStatus::Error => "error",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::Stale => "stale",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "pre_processing" => Ok(TaskStatus::PreProcessing),
            "processing" => Ok(TaskStatus::Processing),
            "post_processing" => Ok(TaskStatus::PostProcessing),
            "success" => Ok(TaskStatus::Success),
            "error" => Ok(TaskStatus::Error),
            "cancelled" => Ok(TaskStatus::Cancelled),
            "stale" => Ok(TaskStatus::Stale),
            other => Err(format!(
                "unknown status '{}' (expected one of: {})",
                other,
                TaskStatus::all()
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Task
// ─────────────────────────────────────────────────────────────────

/// A task as known to the tracking service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Service-assigned task id
    pub id: String,

    /// Organization slug
    #[serde(default)]
    pub organization: String,

    /// Project slug
    #[serde(default)]
    pub project: String,

    /// Human-readable task name
    #[serde(default)]
    pub name: String,

    /// Current lifecycle status
    #[serde(default)]
    pub status: TaskStatus,

    /// Current progress value
    #[serde(default)]
    pub value: Option<i64>,

    /// Progress value at completion
    #[serde(default)]
    pub value_max: Option<i64>,

    /// Progress percentage computed by the service
    #[serde(default)]
    pub value_percent: Option<i64>,

    /// Arbitrary JSON metadata
    #[serde(default)]
    pub data: Option<TaskData>,

    /// Creation timestamp
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,

    /// Last update timestamp
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

impl Task {
    /// Whether this task has reached a terminal status
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Progress percentage, preferring the service-computed value
    pub fn progress_percent(&self) -> Option<i64> {
        if self.value_percent.is_some() {
            return self.value_percent;
        }
        match (self.value, self.value_max) {
            (Some(value), Some(max)) if max > 0 => Some((value * 100) / max),
            _ => None,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Task {}", self.id)?;
        writeln!(f, "  Name:    {}", self.name)?;
        writeln!(f, "  Status:  {}", self.status)?;
        if let Some(percent) = self.progress_percent() {
            writeln!(f, "  Progress: {}%", percent)?;
        }
        if let Some(data) = &self.data {
            if !data.is_empty() {
                let keys: BTreeSet<&str> = data.keys().map(String::as_str).collect();
                writeln!(
                    f,
                    "  Data:    {}",
                    keys.into_iter().collect::<Vec<_>>().join(", ")
                )?;
            }
        }
        if let Some(updated) = self.updated {
            writeln!(f, "  Updated: {}", updated.format("%Y-%m-%d %H:%M:%S UTC"))?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────
// Task Fields (request side)
// ─────────────────────────────────────────────────────────────────

/// Fields for creating or partially updating a task
///
/// Every field is optional; unset fields are omitted from the request body
/// so the service leaves them untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_max: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<TaskData>,

    /// Seconds the task may run before the service flags it stale
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_runtime: Option<i64>,

    /// Seconds without an update before the service flags it stale
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_timeout: Option<i64>,
}

impl TaskFields {
    /// Fields carrying only a status change
    pub fn status_only(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// True when every field is unset
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.status.is_none()
            && self.value.is_none()
            && self.value_max.is_none()
            && self.data.is_none()
            && self.max_runtime.is_none()
            && self.stale_timeout.is_none()
    }
}

// ─────────────────────────────────────────────────────────────────
// Data Merge
// ─────────────────────────────────────────────────────────────────

/// Merge `updates` over `existing` task data
///
/// Nested objects merge key-by-key so sibling keys survive; any non-object
/// value (including arrays) replaces the existing value wholesale.
pub fn merge_data(existing: Option<&TaskData>, updates: &TaskData) -> TaskData {
    let mut merged = existing.cloned().unwrap_or_default();
    overlay(&mut merged, updates);
    merged
}

fn overlay(base: &mut TaskData, updates: &TaskData) {
    for (key, value) in updates {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                overlay(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

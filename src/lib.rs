//! Taskpulse - client-side task lifecycle tracking
//!
//! Mirrors background task executions into the Taskpulse tracking service.
//! Host queue integrations feed lifecycle signals into a
//! [`tracker::LifecycleTracker`]; plain scripts use the [`api`] clients or
//! the `taskpulse` binary. Tracking is strictly best-effort: with missing
//! credentials every operation is a silent no-op, and remote failures are
//! logged without ever reaching the wrapped work.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod tracker;
pub mod types;
pub mod version;

pub use error::{Error, ErrorCode, Result};
pub use tracker::{Execution, LifecycleTracker, Signal, TrackerConfig, TrackingOptions};
pub use types::{Task, TaskFields, TaskStatus};

//! Type definitions for taskpulse
//!
//! Contains the task data model shared by the API client, the lifecycle
//! tracker and the CLI.

mod task;

pub use task::*;

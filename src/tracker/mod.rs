//! Task lifecycle tracking
//!
//! The heart of the crate: host queue integrations feed lifecycle signals
//! into a [`LifecycleTracker`], which mirrors them into the tracking
//! service. Supporting pieces are the bounded task cache, the typed header
//! bag, tracking options and their merge rules, the task definition
//! registry, and the session guard.

mod cache;
mod execution;
mod headers;
mod lifecycle;
mod options;
mod registry;
mod session;

pub use cache::*;
pub use execution::*;
pub use headers::*;
pub use lifecycle::*;
pub use options::*;
pub use registry::*;
pub use session::*;

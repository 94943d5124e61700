//! Tracking service API clients
//!
//! The `TaskApi` trait abstracts the remote service. `HttpTaskApi` talks to
//! it over REST, `MockTaskApi` fakes it for tests, and `SafeTaskApi` is the
//! error-swallowing facade used on the lifecycle path.

mod http;
mod mock;
mod safe;
mod traits;

pub use http::*;
pub use mock::*;
pub use safe::*;
pub use traits::*;

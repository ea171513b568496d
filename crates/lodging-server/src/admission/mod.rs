//! Request admission
//!
//! Per-client token bucket limiting plus the background task that periodically resets it.
//! The HTTP side lives in [`crate::middleware::rate_limit`].

pub mod flush;
pub mod limiter;

pub use flush::{spawn_flush_task, FlushHandle};
pub use limiter::{AdmissionConfigError, AdmissionController, BucketSettings, ClientKey};

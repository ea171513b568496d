//! Lodging Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Utilities shared by the lodging workspace members.
//!
//! - **Logging**: environment-driven `tracing` subscriber setup
//! - **Schema**: the accommodations table name and its DDL
//!
//! # Example
//!
//! ```no_run
//! use lodging_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&LogConfig::from_env()?)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod logging;
pub mod schema;

pub use logging::{init_logging, LogConfig, LogGuard};

//! Lodging Server Library
//!
//! Read-only HTTP API over a table of registered short-term accommodations.
//!
//! # Overview
//!
//! - **Admission**: per-client token bucket rate limiting, reset by a periodic flush
//! - **Query compilation**: optional search filters compiled into one parameterized count
//!   statement and one paginated data statement
//! - **Storage**: PostgreSQL through SQLx, behind the [`db::AccommodationStore`] trait
//! - **Configuration**: environment variables with `.env` support
//! - **Middleware**: CORS, request tracing, compression, rate limiting and basic auth
//!
//! # Request flow
//!
//! request → admission → parameter validation → query compiler → store (count + rows)
//! → response records → paginated envelope
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lodging_server::{admission::AdmissionController, api, config::Config, db};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     let state = api::AppState {
//!         store: Arc::new(db::PgStore::new(pool)),
//!         admission: Arc::new(AdmissionController::from_config(&config.rate_limit)?),
//!         credentials: Arc::new(config.auth.clone()),
//!         query_timeout: config.server.query_timeout(),
//!     };
//!     let _app = api::create_router(state, &config.cors);
//!     Ok(())
//! }
//! ```

pub mod admission;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod models;

pub use error::AppError;

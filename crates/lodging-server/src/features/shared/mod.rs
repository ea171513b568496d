//! Shared utilities and types for feature modules
//!
//! - **pagination**: page windows and the paginated response envelope
//! - **validation**: aggregated field validation for raw query parameters

pub mod pagination;
pub mod validation;

pub use pagination::{PageRequest, Paginated, PaginationMeta};
pub use validation::ValidationErrors;

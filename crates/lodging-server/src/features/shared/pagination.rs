//! Shared pagination utilities
//!
//! Page numbers are 1-indexed. The response envelope is `{"data": [...], "pagination": {...}}`.
//!
//! # Examples
//!
//! ```rust,ignore
//! use lodging_server::features::shared::pagination::{PageRequest, Paginated, PaginationMeta};
//!
//! let page = PageRequest::new(2, 10);
//! assert_eq!(page.offset(), 10);
//!
//! // After fetching data...
//! let meta = PaginationMeta::new(&page, 25);
//! assert!(meta.has_more);
//! ```

use serde::{Deserialize, Serialize};

/// Page used when the client sends none
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when the client sends none
pub const DEFAULT_LIMIT: i64 = 20;

/// Largest page size a client may ask for
pub const MAX_LIMIT: i64 = 100;

/// A validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: i64,
    limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Build a page window, clamping into the accepted ranges
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Calculate the offset for SQL OFFSET clause
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Pagination metadata for response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Rows matching the filters across all pages
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    /// Whether a later page holds more rows
    pub has_more: bool,
}

impl PaginationMeta {
    pub fn new(request: &PageRequest, total: i64) -> Self {
        Self {
            total,
            page: request.page(),
            limit: request.limit(),
            has_more: request.offset().saturating_add(request.limit()) < total,
        }
    }
}

/// Wrapper for paginated list responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, request: &PageRequest, total: i64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(request, total),
        }
    }

    /// Map items to a different type
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

//! Shared validation utilities
//!
//! Query parameters arrive as raw strings. Each parameter struct walks its fields with the
//! helpers below, collecting every problem into one [`ValidationErrors`] instead of stopping at
//! the first, so a client sees all offending fields in a single 400 response.
//!
//! # Examples
//!
//! ```rust,ignore
//! use lodging_server::features::shared::validation::{parse_number, ValidationErrors};
//!
//! let mut errors = ValidationErrors::new();
//! let reason = "page must be a valid integer";
//! let page: Option<i64> = parse_number(&mut errors, "page", Some("two"), reason);
//! assert!(page.is_none());
//! assert_eq!(errors.fields()["page"], "page must be a valid integer");
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;

use thiserror::Error;

/// Longest accepted text filter, in characters
pub const MAX_TEXT_LENGTH: usize = 255;

/// Field name to reason, for every parameter that failed validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("Invalid query parameters")]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem with `field`. The first reason recorded for a field is kept.
    pub fn add(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.fields.entry(field.into()).or_insert_with(|| reason.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn into_fields(self) -> BTreeMap<String, String> {
        self.fields
    }

    /// `Ok(value)` when nothing was recorded
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Empty query values are treated as if the key were absent
#[inline]
pub fn present(raw: Option<&str>) -> Option<&str> {
    raw.filter(|value| !value.is_empty())
}

/// Parse an optional numeric parameter, recording `reason` on failure
pub fn parse_number<T: FromStr>(
    errors: &mut ValidationErrors,
    field: &str,
    raw: Option<&str>,
    reason: &str,
) -> Option<T> {
    let raw = present(raw)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.add(field, reason);
            None
        },
    }
}

/// Accept an optional exact-match text filter no longer than [`MAX_TEXT_LENGTH`]
pub fn text_filter(
    errors: &mut ValidationErrors,
    field: &str,
    raw: Option<&str>,
) -> Option<String> {
    let raw = present(raw)?;
    if raw.chars().count() > MAX_TEXT_LENGTH {
        errors.add(
            field,
            format!("{} must be at most {} characters", field, MAX_TEXT_LENGTH),
        );
        return None;
    }
    Some(raw.to_string())
}

/// Drop `value` and record `reason` unless it lies in `min..=max`
pub fn within<T: PartialOrd>(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<T>,
    min: T,
    max: T,
    reason: &str,
) -> Option<T> {
    let value = value?;
    if value < min || value > max {
        errors.add(field, reason);
        return None;
    }
    Some(value)
}

/// Accept `raw` only if it is one of `allowed`. Matching is exact and case-sensitive.
pub fn one_of<'a>(
    errors: &mut ValidationErrors,
    field: &str,
    raw: Option<&'a str>,
    allowed: &[&str],
) -> Option<&'a str> {
    let raw = present(raw)?;
    if allowed.contains(&raw) {
        Some(raw)
    } else {
        errors.add(field, format!("{} must be one of: {}", field, allowed.join(", ")));
        None
    }
}

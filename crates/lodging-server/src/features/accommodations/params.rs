//! Query parameters for the accommodation listings
//!
//! The raw `*Query` structs are what axum deserializes from the query string. Every field is
//! kept as a string so that a malformed number becomes a per-field validation error instead of
//! an opaque extractor rejection. `validate()` turns them into the typed [`SearchParams`].

use serde::Deserialize;

use crate::features::shared::pagination::{PageRequest, DEFAULT_LIMIT, DEFAULT_PAGE, MAX_LIMIT};
use crate::features::shared::validation::{
    one_of, parse_number, text_filter, within, ValidationErrors,
};

/// Columns a listing may be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Id,
    ExternalId,
    Name,
    Municipality,
    District,
    CreatedAt,
}

impl SortField {
    pub const ALLOWED: [&'static str; 6] = [
        "id",
        "external_id",
        "name",
        "municipality",
        "district",
        "created_at",
    ];

    /// Column name substituted into `ORDER BY`
    pub fn column(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::ExternalId => "external_id",
            SortField::Name => "name",
            SortField::Municipality => "municipality",
            SortField::District => "district",
            SortField::CreatedAt => "created_at",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "id" => Some(SortField::Id),
            "external_id" => Some(SortField::ExternalId),
            "name" => Some(SortField::Name),
            "municipality" => Some(SortField::Municipality),
            "district" => Some(SortField::District),
            "created_at" => Some(SortField::CreatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub const ALLOWED: [&'static str; 2] = ["asc", "desc"];

    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Optional search filters. Text filters are exact matches, bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccommodationFilters {
    pub municipality: Option<String>,
    pub district: Option<String>,
    pub category: Option<String>,
    pub owner: Option<String>,
    pub min_capacity: Option<i32>,
    pub max_capacity: Option<i32>,
    pub min_lat: Option<f64>,
    pub max_lat: Option<f64>,
    pub min_lng: Option<f64>,
    pub max_lng: Option<f64>,
}

/// Validated listing request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchParams {
    pub page: PageRequest,
    pub sort: SortField,
    pub order: SortOrder,
    pub filters: AccommodationFilters,
}

/// `GET /api/v1/accommodations`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAccommodationsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl ListAccommodationsQuery {
    pub fn validate(&self) -> Result<SearchParams, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let params = page_and_sort(
            &mut errors,
            self.page.as_deref(),
            self.limit.as_deref(),
            self.sort.as_deref(),
            self.order.as_deref(),
        );
        errors.into_result(params)
    }
}

/// `GET /api/v1/accommodations/search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchAccommodationsQuery {
    pub municipality: Option<String>,
    pub district: Option<String>,
    pub category: Option<String>,
    pub owner: Option<String>,
    pub min_capacity: Option<String>,
    pub max_capacity: Option<String>,
    pub min_lat: Option<String>,
    pub max_lat: Option<String>,
    pub min_lng: Option<String>,
    pub max_lng: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl SearchAccommodationsQuery {
    pub fn validate(&self) -> Result<SearchParams, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut params = page_and_sort(
            &mut errors,
            self.page.as_deref(),
            self.limit.as_deref(),
            self.sort.as_deref(),
            self.order.as_deref(),
        );

        let e = &mut errors;
        params.filters = AccommodationFilters {
            municipality: text_filter(e, "municipality", self.municipality.as_deref()),
            district: text_filter(e, "district", self.district.as_deref()),
            category: text_filter(e, "category", self.category.as_deref()),
            owner: text_filter(e, "owner", self.owner.as_deref()),
            min_capacity: capacity(e, "min_capacity", self.min_capacity.as_deref()),
            max_capacity: capacity(e, "max_capacity", self.max_capacity.as_deref()),
            min_lat: coordinate(e, "min_lat", self.min_lat.as_deref(), 90.0),
            max_lat: coordinate(e, "max_lat", self.max_lat.as_deref(), 90.0),
            min_lng: coordinate(e, "min_lng", self.min_lng.as_deref(), 180.0),
            max_lng: coordinate(e, "max_lng", self.max_lng.as_deref(), 180.0),
        };

        errors.into_result(params)
    }
}

fn page_and_sort(
    errors: &mut ValidationErrors,
    page: Option<&str>,
    limit: Option<&str>,
    sort: Option<&str>,
    order: Option<&str>,
) -> SearchParams {
    let page = parse_number::<i64>(errors, "page", page, "page must be a valid integer");
    let page = within(
        errors,
        "page",
        page,
        1,
        i64::MAX,
        "page must be greater than or equal to 1",
    );

    let limit = parse_number::<i64>(errors, "limit", limit, "limit must be a valid integer");
    let limit = within(
        errors,
        "limit",
        limit,
        1,
        MAX_LIMIT,
        "limit must be between 1 and 100",
    );

    let sort = one_of(errors, "sort", sort, &SortField::ALLOWED)
        .and_then(SortField::parse)
        .unwrap_or_default();
    let order = one_of(errors, "order", order, &SortOrder::ALLOWED)
        .and_then(SortOrder::parse)
        .unwrap_or_default();

    SearchParams {
        page: PageRequest::new(page.unwrap_or(DEFAULT_PAGE), limit.unwrap_or(DEFAULT_LIMIT)),
        sort,
        order,
        filters: AccommodationFilters::default(),
    }
}

fn capacity(errors: &mut ValidationErrors, field: &str, raw: Option<&str>) -> Option<i32> {
    let reason = format!("{} must be a non-negative integer", field);
    let value = parse_number::<i32>(errors, field, raw, &reason);
    within(errors, field, value, 0, i32::MAX, &reason)
}

fn coordinate(
    errors: &mut ValidationErrors,
    field: &str,
    raw: Option<&str>,
    bound: f64,
) -> Option<f64> {
    let reason = format!("{} must be a number between {} and {}", field, -bound, bound);
    // NaN parses as f64 but compares false against both bounds
    let value = match parse_number::<f64>(errors, field, raw, &reason) {
        Some(v) if v.is_nan() => {
            errors.add(field, reason.as_str());
            None
        },
        other => other,
    };
    within(errors, field, value, -bound, bound, &reason)
}

//! Database models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub use lodging_common::schema::ACCOMMODATIONS_TABLE;

/// One row of the accommodations table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AccommodationRecord {
    pub id: i32,
    /// Registration number in the national registry
    pub external_id: Option<i32>,
    pub name: Option<String>,
    pub registered_at: Option<NaiveDateTime>,
    pub opened_at: Option<NaiveDateTime>,
    pub category: Option<String>,
    pub capacity: Option<i32>,
    pub owner_email: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub locality: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub parish: Option<String>,
    pub municipality: Option<String>,
    pub district: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DistrictCount {
    pub district: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MunicipalityCount {
    pub municipality: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

/// Aggregate figures over the whole table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccommodationStats {
    pub total_accommodations: i64,
    pub average_capacity: f64,
    pub by_district: Vec<DistrictCount>,
    pub by_municipality: Vec<MunicipalityCount>,
    pub by_category: Vec<CategoryCount>,
}

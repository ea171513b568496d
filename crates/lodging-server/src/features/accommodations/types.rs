//! Response records for the accommodation endpoints

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::AccommodationRecord;

/// An accommodation as returned to clients. Absent values are omitted from the JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccommodationItem {
    pub id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opened_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parish: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Imported rows store missing text as empty strings
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl From<AccommodationRecord> for AccommodationItem {
    fn from(r: AccommodationRecord) -> Self {
        Self {
            id: r.id,
            external_id: r.external_id,
            name: non_empty(r.name),
            registered_at: r.registered_at,
            opened_at: r.opened_at,
            category: non_empty(r.category),
            capacity: r.capacity,
            owner_email: non_empty(r.owner_email),
            address: non_empty(r.address),
            postal_code: non_empty(r.postal_code),
            locality: non_empty(r.locality),
            latitude: r.latitude,
            longitude: r.longitude,
            parish: non_empty(r.parish),
            municipality: non_empty(r.municipality),
            district: non_empty(r.district),
            created_at: r.created_at,
        }
    }
}

//! Conversion from export features to table rows

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::geojson::{Feature, Geometry};

/// Timestamp layouts seen in the export, tried in order after RFC 3339
const DATE_TIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// One row to insert into the accommodations table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewAccommodation {
    pub object_id: Option<i32>,
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
    pub geo_reliability: Option<String>,
    pub parish: Option<String>,
    pub municipality: Option<String>,
    pub district: Option<String>,
    pub nuts_iii: Option<String>,
    pub nuts_ii: Option<String>,
    pub tourism_region: Option<String>,
    pub clean_safe_seal: Option<String>,
}

impl NewAccommodation {
    pub fn has_location(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

impl From<&Feature> for NewAccommodation {
    fn from(feature: &Feature) -> Self {
        let p = &feature.properties;
        let location = coordinates(feature.geometry.as_ref(), p.lat_long.as_deref());

        Self {
            object_id: p.object_id,
            external_id: p.registry_number,
            name: text(&p.name),
            registered_at: p.registered_at.as_deref().and_then(parse_date),
            opened_at: p.opened_at.as_deref().and_then(parse_date),
            category: text(&p.category),
            capacity: p.capacity.filter(|c| *c >= 0),
            owner_email: text(&p.email),
            address: text(&p.address),
            postal_code: text(&p.postal_code),
            locality: text(&p.locality),
            latitude: location.map(|(lat, _)| lat),
            longitude: location.map(|(_, lng)| lng),
            geo_reliability: text(&p.geo_reliability),
            parish: text(&p.parish),
            municipality: text(&p.municipality),
            district: text(&p.district),
            nuts_iii: text(&p.nuts_iii),
            nuts_ii: text(&p.nuts_ii),
            tourism_region: text(&p.tourism_region),
            clean_safe_seal: text(&p.clean_safe_seal),
        }
    }
}

/// Trimmed text, with blanks stored as NULL
fn text(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Parse a registry timestamp. Offsets are normalized to UTC; bare dates become midnight.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_utc());
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// `(latitude, longitude)` from a point geometry, falling back to the `"lat, long"` property
///
/// Non-finite or out-of-range values are discarded rather than stored as a bogus location.
pub fn coordinates(geometry: Option<&Geometry>, lat_long: Option<&str>) -> Option<(f64, f64)> {
    let from_geometry = geometry
        .filter(|g| g.coordinates.len() >= 2)
        .map(|g| (g.coordinates[1], g.coordinates[0]));

    from_geometry
        .filter(|&(lat, lng)| valid_location(lat, lng))
        .or_else(|| lat_long.and_then(parse_lat_long))
}

fn parse_lat_long(raw: &str) -> Option<(f64, f64)> {
    let (lat, lng) = raw.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lng: f64 = lng.trim().parse().ok()?;
    valid_location(lat, lng).then_some((lat, lng))
}

fn valid_location(lat: f64, lng: f64) -> bool {
    lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geojson::Properties;

    fn point(lng: f64, lat: f64) -> Geometry {
        Geometry {
            kind: "Point".to_string(),
            coordinates: vec![lng, lat],
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2019-05-20T10:30:00Z"), Some(at(2019, 5, 20, 10, 30, 0)));
        assert_eq!(parse_date("2019-05-20T10:30:00+01:00"), Some(at(2019, 5, 20, 9, 30, 0)));
        assert_eq!(parse_date("2019-05-20T10:30:00"), Some(at(2019, 5, 20, 10, 30, 0)));
        assert_eq!(parse_date("2019-05-20 10:30:00"), Some(at(2019, 5, 20, 10, 30, 0)));
        assert_eq!(parse_date("2019-05-20"), Some(at(2019, 5, 20, 0, 0, 0)));
        assert_eq!(parse_date("20/05/2019"), Some(at(2019, 5, 20, 0, 0, 0)));
        assert_eq!(parse_date(" 2019-05-20 "), Some(at(2019, 5, 20, 0, 0, 0)));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2019-13-40"), None);
    }

    #[test]
    fn test_coordinates_from_point_are_swapped() {
        let geometry = point(-9.14, 38.72);
        assert_eq!(coordinates(Some(&geometry), None), Some((38.72, -9.14)));
    }

    #[test]
    fn test_coordinates_fall_back_to_lat_long() {
        assert_eq!(coordinates(None, Some("41.15, -8.61")), Some((41.15, -8.61)));

        let short = Geometry {
            kind: "Point".to_string(),
            coordinates: vec![-8.61],
        };
        assert_eq!(coordinates(Some(&short), Some("41.15,-8.61")), Some((41.15, -8.61)));

        let out_of_range = point(-8.61, 141.15);
        assert_eq!(
            coordinates(Some(&out_of_range), Some("41.15,-8.61")),
            Some((41.15, -8.61))
        );
    }

    #[test]
    fn test_invalid_coordinates_are_dropped() {
        assert_eq!(coordinates(None, None), None);
        assert_eq!(coordinates(None, Some("")), None);
        assert_eq!(coordinates(None, Some("41.15")), None);
        assert_eq!(coordinates(None, Some("north, west")), None);
        assert_eq!(coordinates(None, Some("NaN, 1.0")), None);
        assert_eq!(coordinates(Some(&point(200.0, 10.0)), None), None);
    }

    #[test]
    fn test_feature_conversion() {
        let feature = Feature {
            properties: Properties {
                registry_number: Some(12345),
                name: Some("  Casa do Rio ".to_string()),
                registered_at: Some("2019-05-20".to_string()),
                opened_at: Some("not a date".to_string()),
                capacity: Some(-2),
                email: Some(String::new()),
                municipality: Some("Porto".to_string()),
                ..Default::default()
            },
            geometry: Some(point(-8.61, 41.15)),
        };

        let row = NewAccommodation::from(&feature);
        assert_eq!(row.external_id, Some(12345));
        assert_eq!(row.name.as_deref(), Some("Casa do Rio"));
        assert_eq!(row.registered_at, Some(at(2019, 5, 20, 0, 0, 0)));
        assert_eq!(row.opened_at, None);
        assert_eq!(row.capacity, None);
        assert_eq!(row.owner_email, None);
        assert_eq!(row.municipality.as_deref(), Some("Porto"));
        assert!(row.has_location());
        assert_eq!(row.latitude, Some(41.15));
    }
}

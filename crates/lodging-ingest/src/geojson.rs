//! GeoJSON export of the registry
//!
//! Property names follow the export verbatim. Numeric properties are read leniently: the export
//! mixes numbers, numeric strings and nulls, and a single odd value must not reject the file.

use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{IngestError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type", default)]
    pub kind: String,
    /// `[longitude, latitude]` for a point
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Properties {
    #[serde(rename = "OBJECTID", default, deserialize_with = "lenient_int")]
    pub object_id: Option<i32>,
    #[serde(rename = "NrRNAL", default, deserialize_with = "lenient_int")]
    pub registry_number: Option<i32>,
    #[serde(rename = "Denominacao", default)]
    pub name: Option<String>,
    #[serde(rename = "DataRegisto", default)]
    pub registered_at: Option<String>,
    #[serde(rename = "DataAberturaPublico", default)]
    pub opened_at: Option<String>,
    #[serde(rename = "Modalidade", default)]
    pub category: Option<String>,
    #[serde(rename = "NrUtentes", default, deserialize_with = "lenient_int")]
    pub capacity: Option<i32>,
    #[serde(rename = "Email", default)]
    pub email: Option<String>,
    #[serde(rename = "Endereco", default)]
    pub address: Option<String>,
    #[serde(rename = "CodigoPostal", default)]
    pub postal_code: Option<String>,
    #[serde(rename = "LOCALIDADE", default)]
    pub locality: Option<String>,
    /// `"lat, long"`, used when the geometry is missing
    #[serde(rename = "LatLong", default)]
    pub lat_long: Option<String>,
    #[serde(rename = "FiabilidadeGeo", default)]
    pub geo_reliability: Option<String>,
    #[serde(rename = "Freguesia", default)]
    pub parish: Option<String>,
    #[serde(rename = "Concelho", default)]
    pub municipality: Option<String>,
    #[serde(rename = "Distrito", default)]
    pub district: Option<String>,
    #[serde(rename = "NUTSIII", default)]
    pub nuts_iii: Option<String>,
    #[serde(rename = "NUTSII", default)]
    pub nuts_ii: Option<String>,
    #[serde(rename = "ERT", default)]
    pub tourism_region: Option<String>,
    #[serde(rename = "SeloCleanSafe", default)]
    pub clean_safe_seal: Option<String>,
}

/// Integer from a number, a numeric string, or nothing
fn lenient_int<'de, D>(deserializer: D) -> std::result::Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .and_then(|v| i32::try_from(v).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Parse an in-memory export
pub fn parse_collection(bytes: &[u8]) -> Result<FeatureCollection> {
    let collection: FeatureCollection = serde_json::from_slice(bytes)?;
    if collection.kind != "FeatureCollection" {
        return Err(IngestError::NotAFeatureCollection(collection.kind));
    }
    Ok(collection)
}

/// Read and parse an export from disk
pub async fn read_collection(path: impl AsRef<Path>) -> Result<FeatureCollection> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_collection(&bytes)
}

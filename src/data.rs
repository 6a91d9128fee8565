use geo::{BoundingRect, Geometry, Rect};
use geojson::GeoJson;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

/// Błędy odczytu danych regionu z backendu
#[derive(Debug, Error)]
pub enum DataError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("property `value` is not a number: {raw}")]
    InvalidNumber { raw: String },

    #[error("region geometry is empty")]
    EmptyRegion,
}

/// Statystyki regionu. Backend potrafi wysłać liczby jako tekst, więc
/// akceptujemy obie formy.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct RegionSummary {
    #[serde(deserialize_with = "number_or_string")]
    pub min: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub max: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub avg: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub med: f64,
}

fn number_or_string<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(d)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Pojedynczy obiekt mapy: wielokąt regionu albo punkt pomiarowy z `value`
#[derive(Clone, Debug, PartialEq)]
pub struct MapFeature {
    pub geometry: Geometry<f64>,
    pub value: Option<f64>,
}

impl MapFeature {
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.geometry.bounding_rect()
    }
}

// Kształt odpowiedzi `region/{gid}`
#[derive(Deserialize)]
struct Envelope {
    region: RawRegion,
}

#[derive(Deserialize)]
struct RawRegion {
    info: RegionSummary,
    geojson: RawLayers,
}

#[derive(Deserialize)]
struct RawLayers {
    region: Value,
    points: Value,
}

/// Zwalidowana odpowiedź backendu dla jednego regionu
#[derive(Clone, Debug)]
pub struct RegionPayload {
    pub summary: RegionSummary,
    pub region: Vec<MapFeature>,
    pub points: Vec<MapFeature>,
}

impl RegionPayload {
    pub fn from_slice(body: &[u8]) -> Result<Self, DataError> {
        let envelope: Envelope = serde_json::from_slice(body)?;
        let RawRegion { info, geojson } = envelope.region;

        let region = read_features(geojson.region)?;
        let points = read_features(geojson.points)?;

        // Bez obrysu nie ma do czego dopasować widoku
        if region.first().and_then(MapFeature::bounding_rect).is_none() {
            return Err(DataError::EmptyRegion);
        }

        Ok(Self { summary: info, region, points })
    }

    /// Obrys pierwszego obiektu regionu, do niego dopasowujemy widok
    pub fn fit_extent(&self) -> Option<Rect<f64>> {
        self.region.first().and_then(MapFeature::bounding_rect)
    }
}

/// FeatureCollection, Feature albo gołą geometrię zamienia na listę obiektów
fn read_features(raw: Value) -> Result<Vec<MapFeature>, DataError> {
    let mut out = Vec::new();
    match GeoJson::from_json_value(raw)? {
        GeoJson::FeatureCollection(fc) => {
            for feature in fc.features {
                if let Some(f) = read_feature(feature)? {
                    out.push(f);
                }
            }
        }
        GeoJson::Feature(feature) => {
            if let Some(f) = read_feature(feature)? {
                out.push(f);
            }
        }
        GeoJson::Geometry(gj) => {
            let geometry: Geometry<f64> = gj.value.try_into()?;
            out.push(MapFeature { geometry, value: None });
        }
    }
    Ok(out)
}

fn read_feature(feature: geojson::Feature) -> Result<Option<MapFeature>, DataError> {
    let value = match feature.properties.as_ref().and_then(|p| p.get("value")) {
        None | Some(Value::Null) => None,
        Some(v) => Some(json_number(v)?),
    };

    let Some(gj) = feature.geometry else {
        return Ok(None);
    };
    let geometry: Geometry<f64> = gj.value.try_into()?;
    Ok(Some(MapFeature { geometry, value }))
}

fn json_number(v: &Value) -> Result<f64, DataError> {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| DataError::InvalidNumber { raw: v.to_string() })
}

use super::{CountryStat, LatLng};
use crate::error::FetchError;
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// A country record as the statistics endpoint sends it.
///
/// Only `country` is required. Counts that are missing, negative,
/// fractional or not numbers at all become zero, and the geolocation may be
/// missing entirely or partially.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCountry {
    pub country: String,
    #[serde(default, deserialize_with = "count")]
    pub cases: u64,
    #[serde(default, deserialize_with = "count")]
    pub deaths: u64,
    #[serde(default, deserialize_with = "count")]
    pub recovered: u64,
    #[serde(default, deserialize_with = "rate")]
    pub cases_per_one_million: f64,
    #[serde(default, deserialize_with = "timestamp")]
    pub updated: Option<i64>,
    #[serde(default, deserialize_with = "country_info")]
    pub country_info: Option<WireCountryInfo>,
}

/// Nested geolocation; note `long`, not `lng`
#[derive(Debug, Default, Deserialize)]
pub struct WireCountryInfo {
    #[serde(default, deserialize_with = "coordinate")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "coordinate")]
    pub long: Option<f64>,
}

fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map_or(0, whole_count))
}

fn whole_count(value: &Value) -> u64 {
    if let Some(n) = value.as_u64() {
        return n;
    }
    match value.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => f as u64,
        _ => 0,
    }
}

fn rate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| v.as_f64())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0))
}

fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_i64()))
}

fn coordinate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()))
}

fn country_info<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<WireCountryInfo>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .filter(Value::is_object)
        .and_then(|v| WireCountryInfo::deserialize(&v).ok()))
}

impl From<WireCountry> for CountryStat {
    fn from(wire: WireCountry) -> Self {
        let location = wire
            .country_info
            .and_then(|info| Some((info.lat?, info.long?)))
            .and_then(|(lat, lng)| LatLng::checked(lat, lng));

        let mut stat = CountryStat::new(wire.country, wire.cases, location);
        stat.deaths = wire.deaths;
        stat.recovered = wire.recovered;
        stat.cases_per_one_million = wire.cases_per_one_million;
        stat.updated = wire.updated;
        stat
    }
}

/// Validate one record, keeping the object it came from
fn country_record(record: Value) -> Result<CountryStat, serde_json::Error> {
    if !record.is_object() {
        return Err(de::Error::custom("country record is not an object"));
    }
    let mut stat = CountryStat::from(WireCountry::deserialize(&record)?);
    if let Value::Object(raw) = record {
        stat.raw = raw;
    }
    Ok(stat)
}

/// Decode a response body into validated country records.
///
/// The body must be a JSON array. Records inside it that cannot be
/// validated (no `country`, not an object) are skipped.
/// simd-json parses in place, so the buffer is consumed.
pub fn decode_countries(body: &mut [u8]) -> Result<Vec<CountryStat>, FetchError> {
    let records: Vec<Value> = simd_json::serde::from_slice(body)?;
    Ok(records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match country_record(record) {
            Ok(stat) => Some(stat),
            Err(e) => {
                debug!(index, "skipping country record: {e}");
                None
            }
        })
        .collect())
}

mod source;
mod wire;

pub use source::{HttpStatsSource, StatsSource};
pub use wire::{decode_countries, WireCountry, WireCountryInfo};

use geojson::JsonObject;
use serde::{Deserialize, Serialize};

/// A geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Build a position, rejecting non-finite or out-of-range coordinates
    pub fn checked(lat: f64, lng: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        valid.then_some(Self { lat, lng })
    }
}

/// One country's cumulative statistics.
///
/// Serializes to the validated fields only; the record as the endpoint sent
/// it is kept in `raw`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryStat {
    pub country: String,
    pub cases: u64,
    pub deaths: u64,
    pub recovered: u64,
    pub cases_per_one_million: f64,
    /// Last update, epoch milliseconds
    pub updated: Option<i64>,
    #[serde(skip)]
    pub location: Option<LatLng>,
    #[serde(skip)]
    pub raw: JsonObject,
}

impl CountryStat {
    pub fn new(country: impl Into<String>, cases: u64, location: Option<LatLng>) -> Self {
        Self {
            country: country.into(),
            cases,
            deaths: 0,
            recovered: 0,
            cases_per_one_million: 0.0,
            updated: None,
            location,
            raw: JsonObject::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_location() {
        assert!(LatLng::checked(33.0, 65.0).is_some());
        assert!(LatLng::checked(-90.0, 180.0).is_some());
        assert!(LatLng::checked(91.0, 0.0).is_none());
        assert!(LatLng::checked(0.0, -180.5).is_none());
        assert!(LatLng::checked(f64::NAN, 0.0).is_none());
    }
}

use crate::error::ConfigError;
use crate::severity::{Palette, SeverityBasis};
use crate::stats::LatLng;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_ENDPOINT: &str = "https://corona.lmao.ninja/v2/countries";

/// Runtime configuration, optionally read from a TOML file.
///
/// Every field has a default, so an empty file (or no file at all) yields
/// the stock landing page: world view centred on (0, 0) at zoom 2.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Countries statistics endpoint
    pub endpoint: String,
    /// Request timeout; `None` keeps the transport default
    pub timeout_secs: Option<u64>,
    /// Which per-country value drives the marker color
    pub severity: SeverityBasis,
    /// Where logs go while the terminal UI owns stdout
    pub log_file: PathBuf,
    pub map: MapConfig,
    pub palette: Palette,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: None,
            severity: SeverityBasis::default(),
            log_file: PathBuf::from("covid-map.log"),
            map: MapConfig::default(),
            palette: Palette::default(),
        }
    }
}

/// Initial map view and basemap source
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    pub center: LatLng,
    /// Tile zoom level (2 shows the whole world)
    pub zoom: u8,
    /// Directory holding Natural Earth GeoJSON files
    pub basemap_dir: PathBuf,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: LatLng { lat: 0.0, lng: 0.0 },
            zoom: 2,
            basemap_dir: PathBuf::from("data"),
        }
    }
}

impl Config {
    /// Load from `path` if given, otherwise use defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::Rgb;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.timeout_secs, None);
        assert_eq!(config.severity, SeverityBasis::Cases);
        assert_eq!(config.map.zoom, 2);
        assert_eq!(config.map.center.lat, 0.0);
        assert_eq!(config.map.center.lng, 0.0);
        assert_eq!(config.palette.high, Rgb(186, 83, 112));
        assert_eq!(config.palette.low, Rgb(244, 226, 216));
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.map.basemap_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml(
            r#"
            endpoint = "http://localhost:8080/countries"
            timeout_secs = 5
            severity = "cases-per-million"

            [map]
            zoom = 4
            center = { lat = 48.0, lng = 11.0 }

            [palette]
            high = [255, 0, 0]
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint, "http://localhost:8080/countries");
        assert_eq!(config.timeout_secs, Some(5));
        assert_eq!(config.severity, SeverityBasis::CasesPerMillion);
        assert_eq!(config.map.zoom, 4);
        assert_eq!(config.map.center.lat, 48.0);
        assert_eq!(config.map.basemap_dir, PathBuf::from("data"));
        assert_eq!(config.palette.high, Rgb(255, 0, 0));
        assert_eq!(config.palette.low, Rgb(244, 226, 216));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::from_toml("endpiont = \"typo\"").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/covid-map.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_no_path_is_default() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.log_file, PathBuf::from("covid-map.log"));
    }
}

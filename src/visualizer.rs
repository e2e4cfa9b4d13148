use crate::config::Config;
use crate::error::FetchError;
use crate::map::{MapSurface, MarkerSpec, Tooltip};
use crate::severity::{case_label, format_updated, NormalizationRange, Palette, SeverityBasis};
use crate::stats::{CountryStat, LatLng, StatsSource};
use chrono::Local;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Where a load currently stands. Every outcome is terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    Fetching,
    Rendered { markers: usize, skipped: usize },
    /// The source answered with zero records
    Empty,
    Failed(String),
}

impl LoadState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoadState::Idle | LoadState::Fetching)
    }
}

/// Turns per-country statistics into markers on a [`MapSurface`]
pub struct Visualizer {
    palette: Palette,
    basis: SeverityBasis,
    state: LoadState,
}

impl Visualizer {
    pub fn new(palette: Palette, basis: SeverityBasis) -> Self {
        Self {
            palette,
            basis,
            state: LoadState::Idle,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.palette, config.severity)
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Fetch once and render. Failures are logged, never returned.
    pub fn load(&mut self, source: &dyn StatsSource, surface: &mut dyn MapSurface) -> &LoadState {
        self.begin();
        let result = source.fetch();
        self.finish(result, surface)
    }

    /// Mark a fetch as in flight (used when the fetch runs elsewhere)
    pub fn begin(&mut self) {
        info!("fetching country statistics");
        self.state = LoadState::Fetching;
    }

    /// Apply the outcome of a fetch to `surface`
    pub fn finish(
        &mut self,
        result: Result<Vec<CountryStat>, FetchError>,
        surface: &mut dyn MapSurface,
    ) -> &LoadState {
        self.state = match result {
            Ok(stats) => self.render(&stats, surface),
            Err(e) => {
                warn!("Failed to fetch countries: {e}");
                LoadState::Failed(e.to_string())
            }
        };
        &self.state
    }

    /// Normalize, encode and hand the marker layer to `surface`
    pub fn render(&self, stats: &[CountryStat], surface: &mut dyn MapSurface) -> LoadState {
        let Some(range) = NormalizationRange::scan(stats, self.basis) else {
            info!("no country statistics received");
            return LoadState::Empty;
        };

        let layer = feature_collection(stats);
        let factory = MarkerFactory {
            range,
            palette: self.palette,
            basis: self.basis,
        };

        let markers = surface.add_marker_layer(&layer, &|feature: &Feature, position: LatLng| {
            factory.build(feature, position)
        });
        let skipped = stats.len().saturating_sub(markers);
        info!(markers, skipped, min = range.min, max = range.max, "rendered country markers");

        LoadState::Rendered { markers, skipped }
    }
}

/// One `Point` feature per located country. `properties` holds the record
/// as received with the validated fields written over it. Countries without
/// a usable location are left out.
pub fn feature_collection(stats: &[CountryStat]) -> FeatureCollection {
    let features = stats
        .par_iter()
        .filter_map(|stat| {
            let Some(location) = stat.location else {
                debug!(country = %stat.country, "skipping country without location");
                return None;
            };
            Some(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![location.lng, location.lat]))),
                id: None,
                properties: properties(stat),
                foreign_members: None,
            })
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn properties(stat: &CountryStat) -> Option<JsonObject> {
    let serde_json::Value::Object(validated) = serde_json::to_value(stat).ok()? else {
        return None;
    };
    let mut props = stat.raw.clone();
    props.extend(validated);
    Some(props)
}

/// Builds the marker for one feature against a fixed range and palette
#[derive(Debug, Clone, Copy)]
pub struct MarkerFactory {
    pub range: NormalizationRange,
    pub palette: Palette,
    pub basis: SeverityBasis,
}

impl MarkerFactory {
    pub fn build(&self, feature: &Feature, position: LatLng) -> Option<MarkerSpec> {
        let props = feature.properties.clone()?;
        let stat: CountryStat = serde_json::from_value(serde_json::Value::Object(props)).ok()?;
        Some(self.marker(&stat, position))
    }

    pub fn marker(&self, stat: &CountryStat, position: LatLng) -> MarkerSpec {
        let p = self.range.position(self.basis.value(stat));
        MarkerSpec {
            position,
            color: self.palette.blend(p),
            label: case_label(stat.cases),
            tooltip: tooltip(stat),
        }
    }
}

fn tooltip(stat: &CountryStat) -> Tooltip {
    let mut rows = vec![
        ("Confirmed".to_string(), stat.cases.to_string()),
        ("Deaths".to_string(), stat.deaths.to_string()),
        ("Recovered".to_string(), stat.recovered.to_string()),
    ];
    if let Some(updated) = stat.updated.and_then(|ms| format_updated(ms, &Local)) {
        rows.push(("Last Update".to_string(), updated));
    }
    Tooltip {
        title: stat.country.clone(),
        rows,
    }
}

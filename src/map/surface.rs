use crate::severity::Rgb;
use crate::stats::LatLng;
use geojson::{Feature, FeatureCollection};

/// Hover text for a marker: a heading plus `label: value` rows
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub title: String,
    pub rows: Vec<(String, String)>,
}

impl Tooltip {
    /// Widest rendered line, in characters
    pub fn width(&self) -> usize {
        let rows = self
            .rows
            .iter()
            .map(|(k, v)| k.chars().count() + 2 + v.chars().count());
        rows.chain(std::iter::once(self.title.chars().count()))
            .max()
            .unwrap_or(0)
    }
}

/// Everything a surface needs to display one marker
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub position: LatLng,
    pub color: Rgb,
    pub label: String,
    pub tooltip: Tooltip,
}

/// Converts a feature and its point position into a displayable marker
pub type PointToMarker<'a> = dyn Fn(&Feature, LatLng) -> Option<MarkerSpec> + Sync + 'a;

/// A map widget able to show a layer of point markers.
///
/// Adding a layer replaces whatever marker layer was shown before.
pub trait MapSurface {
    /// Install the markers produced for every `Point` feature and return
    /// how many were placed
    fn add_marker_layer(&mut self, layer: &FeatureCollection, point_to_marker: &PointToMarker<'_>) -> usize;
}

/// Longitude/latitude of a `Point` feature, if it is one
pub fn point_position(feature: &Feature) -> Option<LatLng> {
    match &feature.geometry.as_ref()?.value {
        geojson::Value::Point(coords) if coords.len() >= 2 => LatLng::checked(coords[1], coords[0]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::{Geometry, Value};

    #[test]
    fn test_point_position_swaps_axes() {
        let feature = Feature {
            geometry: Some(Geometry::new(Value::Point(vec![65.0, 33.0]))),
            ..Default::default()
        };
        assert_eq!(point_position(&feature), Some(LatLng { lat: 33.0, lng: 65.0 }));
    }

    #[test]
    fn test_point_position_non_point() {
        let feature = Feature {
            geometry: Some(Geometry::new(Value::LineString(vec![vec![0.0, 0.0], vec![1.0, 1.0]]))),
            ..Default::default()
        };
        assert_eq!(point_position(&feature), None);
        assert_eq!(point_position(&Feature::default()), None);
    }

    #[test]
    fn test_tooltip_width() {
        let tooltip = Tooltip {
            title: "B".into(),
            rows: vec![("Confirmed".into(), "1100".into())],
        };
        assert_eq!(tooltip.width(), "Confirmed: 1100".len());
    }
}

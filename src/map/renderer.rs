use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_linestring, LineString};
use crate::map::projection::Viewport;
use crate::map::surface::{point_position, MapSurface, MarkerSpec, PointToMarker};
use geojson::FeatureCollection;
use rayon::prelude::*;

/// Level of detail for basemap data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
    High,   // 10m - regional
}

impl Lod {
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 2.0 {
            Lod::Low
        } else if zoom < 8.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }
}

/// Layer toggles
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_coastlines: bool,
    pub show_borders: bool,
    pub show_markers: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_coastlines: true,
            show_borders: true,
            show_markers: true,
        }
    }
}

/// A marker projected onto the terminal grid
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacedMarker {
    /// Index into [`MapRenderer::markers`]
    pub index: usize,
    pub col: u16,
    pub row: u16,
    /// Cells covered by the label
    pub width: u16,
}

impl PlacedMarker {
    pub fn covers(&self, col: u16, row: u16) -> bool {
        row == self.row && col >= self.col && col < self.col.saturating_add(self.width)
    }
}

/// One frame's worth of rendered layers
pub struct MapLayers {
    pub coastlines: BrailleCanvas,
    pub borders: BrailleCanvas,
    /// Back to front
    pub markers: Vec<PlacedMarker>,
}

impl MapLayers {
    /// Topmost marker under a terminal cell
    pub fn marker_at(&self, col: u16, row: u16) -> Option<PlacedMarker> {
        self.markers.iter().rev().find(|m| m.covers(col, row)).copied()
    }
}

/// Basemap lines plus the country marker layer
pub struct MapRenderer {
    coastlines_low: Vec<LineString>,
    coastlines_medium: Vec<LineString>,
    coastlines_high: Vec<LineString>,
    borders_medium: Vec<LineString>,
    borders_high: Vec<LineString>,
    markers: Vec<MarkerSpec>,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self {
            coastlines_low: Vec::new(),
            coastlines_medium: Vec::new(),
            coastlines_high: Vec::new(),
            borders_medium: Vec::new(),
            borders_high: Vec::new(),
            markers: Vec::new(),
            settings: DisplaySettings::default(),
        }
    }

    /// Best coastline set at or below the requested LOD
    fn coastlines(&self, lod: Lod) -> &[LineString] {
        let order: [&Vec<LineString>; 3] = match lod {
            Lod::High => [&self.coastlines_high, &self.coastlines_medium, &self.coastlines_low],
            Lod::Medium => [&self.coastlines_medium, &self.coastlines_low, &self.coastlines_high],
            Lod::Low => [&self.coastlines_low, &self.coastlines_medium, &self.coastlines_high],
        };
        order
            .into_iter()
            .find(|set| !set.is_empty())
            .map(|set| set.as_slice())
            .unwrap_or(&[])
    }

    fn borders(&self, lod: Lod) -> &[LineString] {
        if lod == Lod::High && !self.borders_high.is_empty() {
            &self.borders_high
        } else {
            &self.borders_medium
        }
    }

    pub fn markers(&self) -> &[MarkerSpec] {
        &self.markers
    }

    pub fn marker(&self, index: usize) -> Option<&MarkerSpec> {
        self.markers.get(index)
    }

    /// Render into canvases of `width` x `height` characters
    pub fn render(&self, width: usize, height: usize, viewport: &Viewport) -> MapLayers {
        let lod = Lod::from_zoom(viewport.zoom);
        let mut coastlines = BrailleCanvas::new(width, height);
        let mut borders = BrailleCanvas::new(width, height);

        if self.settings.show_coastlines {
            for line in self.coastlines(lod) {
                draw_linestring(&mut coastlines, line, viewport);
            }
        }

        if self.settings.show_borders {
            for line in self.borders(lod) {
                draw_linestring(&mut borders, line, viewport);
            }
        }

        let markers = if self.settings.show_markers {
            self.place_markers(viewport)
        } else {
            Vec::new()
        };

        MapLayers {
            coastlines,
            borders,
            markers,
        }
    }

    /// Project every marker; the label is centred on its position.
    /// Lighter (less severe) markers go first so severe ones end on top.
    fn place_markers(&self, viewport: &Viewport) -> Vec<PlacedMarker> {
        let mut placed: Vec<PlacedMarker> = self
            .markers
            .iter()
            .enumerate()
            .filter_map(|(index, marker)| {
                let (col, row) = viewport.project_cell(marker.position)?;
                let width = marker.label.chars().count().max(1) as u16;
                Some(PlacedMarker {
                    index,
                    col: col.saturating_sub(width / 2),
                    row,
                    width,
                })
            })
            .collect();

        placed.sort_by_key(|p| {
            let c = self.markers[p.index].color;
            std::cmp::Reverse(c.0 as u16 + c.1 as u16 + c.2 as u16)
        });
        placed
    }

    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    pub fn add_border(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::High => self.borders_high.push(line),
            Lod::Low | Lod::Medium => self.borders_medium.push(line),
        }
    }

    /// Whether any basemap coastlines are loaded
    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty()
            || !self.coastlines_medium.is_empty()
            || !self.coastlines_high.is_empty()
    }

    pub fn toggle_borders(&mut self) {
        self.settings.show_borders = !self.settings.show_borders;
    }

    pub fn toggle_markers(&mut self) {
        self.settings.show_markers = !self.settings.show_markers;
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MapSurface for MapRenderer {
    fn add_marker_layer(&mut self, layer: &FeatureCollection, point_to_marker: &PointToMarker<'_>) -> usize {
        self.markers = layer
            .features
            .par_iter()
            .filter_map(|feature| point_to_marker(feature, point_position(feature)?))
            .collect();
        self.markers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Tooltip;
    use crate::severity::Rgb;
    use crate::stats::LatLng;
    use geojson::{Feature, Geometry, Value};

    fn point(lng: f64, lat: f64) -> Feature {
        Feature {
            geometry: Some(Geometry::new(Value::Point(vec![lng, lat]))),
            ..Default::default()
        }
    }

    fn marker_at(position: LatLng, label: &str, color: Rgb) -> MarkerSpec {
        MarkerSpec {
            position,
            color,
            label: label.to_string(),
            tooltip: Tooltip {
                title: label.to_string(),
                rows: Vec::new(),
            },
        }
    }

    #[test]
    fn test_marker_layer_replaces_previous() {
        let mut renderer = MapRenderer::new();
        let layer = FeatureCollection {
            bbox: None,
            features: vec![point(1.0, 1.0), point(2.0, 2.0), Feature::default()],
            foreign_members: None,
        };
        let placed = renderer.add_marker_layer(&layer, &|_: &Feature, pos: LatLng| {
            Some(marker_at(pos, "x", Rgb(0, 0, 0)))
        });
        assert_eq!(placed, 2);

        let layer = FeatureCollection {
            bbox: None,
            features: vec![point(3.0, 3.0)],
            foreign_members: None,
        };
        renderer.add_marker_layer(&layer, &|_: &Feature, pos: LatLng| Some(marker_at(pos, "y", Rgb(0, 0, 0))));
        assert_eq!(renderer.markers().len(), 1);
        assert_eq!(renderer.markers()[0].position, LatLng { lat: 3.0, lng: 3.0 });
    }

    #[test]
    fn test_factory_may_decline() {
        let mut renderer = MapRenderer::new();
        let layer = FeatureCollection {
            bbox: None,
            features: vec![point(1.0, 1.0)],
            foreign_members: None,
        };
        assert_eq!(renderer.add_marker_layer(&layer, &|_: &Feature, _: LatLng| None), 0);
    }

    #[test]
    fn test_place_and_hit_markers() {
        let mut renderer = MapRenderer::new();
        let origin = LatLng { lat: 0.0, lng: 0.0 };
        renderer.markers = vec![
            marker_at(origin, "12k+", Rgb(186, 83, 112)),
            marker_at(LatLng { lat: 0.0, lng: 170.0 }, "5", Rgb(244, 226, 216)),
        ];

        // 100x100 pixels = 50x25 cells, origin at cell (25, 12)
        let vp = Viewport::new(0.0, 0.0, 2.0, 100, 100);
        let layers = renderer.render(50, 25, &vp);
        assert_eq!(layers.markers.len(), 1);

        let hit = layers.marker_at(25, 12).unwrap();
        assert_eq!(hit.index, 0);
        assert_eq!((hit.col, hit.width), (23, 4));
        assert!(layers.marker_at(22, 12).is_none());
        assert!(layers.marker_at(25, 13).is_none());
    }

    #[test]
    fn test_severe_markers_drawn_last() {
        let mut renderer = MapRenderer::new();
        let origin = LatLng { lat: 0.0, lng: 0.0 };
        renderer.markers = vec![
            marker_at(origin, "big", Rgb(186, 83, 112)),
            marker_at(origin, "sml", Rgb(244, 226, 216)),
        ];
        let vp = Viewport::new(0.0, 0.0, 2.0, 100, 100);
        let layers = renderer.render(50, 25, &vp);
        assert_eq!(layers.marker_at(25, 12).map(|m| m.index), Some(0));
    }

    #[test]
    fn test_hidden_markers() {
        let mut renderer = MapRenderer::new();
        renderer.markers = vec![marker_at(LatLng { lat: 0.0, lng: 0.0 }, "1", Rgb(0, 0, 0))];
        renderer.toggle_markers();
        let layers = renderer.render(50, 25, &Viewport::new(0.0, 0.0, 2.0, 100, 100));
        assert!(layers.markers.is_empty());
    }

    #[test]
    fn test_coastline_lod_fallback() {
        let mut renderer = MapRenderer::new();
        assert!(!renderer.has_data());
        renderer.add_coastline(vec![(-10.0, 0.0), (10.0, 0.0)], Lod::Low);
        assert!(renderer.has_data());
        assert_eq!(renderer.coastlines(Lod::High).len(), 1);

        let layers = renderer.render(50, 25, &Viewport::new(0.0, 0.0, 1.0, 100, 100));
        assert!(!layers.coastlines.is_blank());
        assert!(layers.borders.is_blank());
    }

    #[test]
    fn test_lod_from_zoom() {
        assert_eq!(Lod::from_zoom(1.0), Lod::Low);
        assert_eq!(Lod::from_zoom(4.0), Lod::Medium);
        assert_eq!(Lod::from_zoom(16.0), Lod::High);
    }
}

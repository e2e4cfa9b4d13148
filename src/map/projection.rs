use crate::stats::LatLng;
use std::f64::consts::PI;

const MIN_SCALE: f64 = 0.5;
const MAX_SCALE: f64 = 64.0;
const ZOOM_STEP: f64 = 1.5;

/// Web Mercator y in [0, 1] (0 = north edge)
#[inline(always)]
fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat.clamp(-85.0511, 85.0511) * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

/// Visible map area, in Braille pixels, over a Web Mercator world
#[derive(Clone, Debug)]
pub struct Viewport {
    pub center_lon: f64,
    pub center_lat: f64,
    /// Scale factor; 1.0 fits the world's width into the canvas
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        }
    }

    /// Viewport for a slippy-map style tile zoom level; level 2 shows the
    /// whole world
    pub fn centered(center: LatLng, tile_zoom: u8, width: usize, height: usize) -> Self {
        let zoom = 2f64.powi(tile_zoom as i32 - 2).clamp(MIN_SCALE, MAX_SCALE);
        Self::new(center.lng, center.lat, zoom, width, height)
    }

    /// Pan by a pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = 360.0 / (self.zoom * self.width.max(1) as f64);
        self.center_lon += dx as f64 * scale;
        self.center_lat -= dy as f64 * scale * 0.5;

        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }
        self.center_lat = self.center_lat.clamp(-85.0, 85.0);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(MAX_SCALE);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_SCALE);
    }

    /// Zoom in keeping the point under (px, py) fixed
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, ZOOM_STEP);
    }

    /// Zoom out keeping the point under (px, py) fixed
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / ZOOM_STEP);
    }

    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(MIN_SCALE, MAX_SCALE);

        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    fn scale(&self) -> f64 {
        self.zoom * self.width as f64
    }

    /// Pixel coordinates back to (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.scale();
        let center_x = (self.center_lon + 180.0) / 360.0;
        let center_y = mercator_y(self.center_lat);

        let x = (px as f64 - self.width as f64 / 2.0) / scale + center_x;
        let y = (py as f64 - self.height as f64 / 2.0) / scale + center_y;

        let lon = x * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI;
        (lon, lat)
    }

    /// (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon + 180.0) / 360.0;
        let y = mercator_y(lat);

        let center_x = (self.center_lon + 180.0) / 360.0;
        let center_y = mercator_y(self.center_lat);
        let scale = self.scale();

        let px = ((x - center_x) * scale + self.width as f64 / 2.0) as i32;
        let py = ((y - center_y) * scale + self.height as f64 / 2.0) as i32;
        (px, py)
    }

    /// Terminal cell (column, row) holding a position, if it is on screen.
    /// Each cell spans 2x4 Braille pixels.
    pub fn project_cell(&self, position: LatLng) -> Option<(u16, u16)> {
        let (px, py) = self.project(position.lng, position.lat);
        if px < 0 || py < 0 || px as usize >= self.width || py as usize >= self.height {
            return None;
        }
        Some(((px / 2) as u16, (py / 4) as u16))
    }

    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10 && px < self.width as i32 + 10 && py >= -10 && py < self.height as i32 + 10
    }

    /// Rough bounding box test for a segment
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        p1.0.max(p2.0) >= 0
            && p1.0.min(p2.0) < self.width as i32
            && p1.1.max(p2.1) >= 0
            && p1.1.min(p2.1) < self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        assert_eq!(vp.project(0.0, 0.0), (50, 50));
    }

    #[test]
    fn test_centered_tile_zoom() {
        let origin = LatLng { lat: 0.0, lng: 0.0 };
        assert_eq!(Viewport::centered(origin, 2, 100, 100).zoom, 1.0);
        assert_eq!(Viewport::centered(origin, 4, 100, 100).zoom, 4.0);
        assert_eq!(Viewport::centered(origin, 0, 100, 100).zoom, MIN_SCALE);
    }

    #[test]
    fn test_unproject_inverts_project() {
        let vp = Viewport::new(10.0, 20.0, 2.0, 400, 200);
        let (px, py) = vp.project(30.0, 40.0);
        let (lon, lat) = vp.unproject(px, py);
        assert!((lon - 30.0).abs() < 1.0);
        assert!((lat - 40.0).abs() < 1.0);
    }

    #[test]
    fn test_project_cell() {
        let vp = Viewport::new(0.0, 0.0, 2.0, 100, 100);
        assert_eq!(vp.project_cell(LatLng { lat: 0.0, lng: 0.0 }), Some((25, 12)));
        assert_eq!(vp.project_cell(LatLng { lat: 0.0, lng: 100.0 }), None);
    }

    #[test]
    fn test_pan_wraps_longitude() {
        let mut vp = Viewport::new(179.0, 0.0, 1.0, 100, 100);
        vp.pan(10, 0);
        assert!(vp.center_lon < 0.0);
    }

    #[test]
    fn test_zoom_limits() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        for _ in 0..50 {
            vp.zoom_in();
        }
        assert_eq!(vp.zoom, MAX_SCALE);
        for _ in 0..50 {
            vp.zoom_out();
        }
        assert_eq!(vp.zoom, MIN_SCALE);
    }
}

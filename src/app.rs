use crate::config::Config;
use crate::error::FetchError;
use crate::map::{MapRenderer, Viewport};
use crate::stats::{CountryStat, StatsSource};
use crate::visualizer::{LoadState, Visualizer};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use tracing::warn;

type FetchResult = Result<Vec<CountryStat>, FetchError>;

/// Terminal cell dimensions to Braille pixel dimensions, minus the border
/// and the status bar
fn pixel_size(width: usize, height: usize) -> (usize, usize) {
    (width.saturating_sub(2) * 2, height.saturating_sub(3) * 4)
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    pub visualizer: Visualizer,
    pub config: Config,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position, used for hover
    pub mouse_pos: Option<(u16, u16)>,
    /// Outcome of the in-flight fetch, if any
    pending: Option<Receiver<FetchResult>>,
}

impl App {
    pub fn new(config: Config, width: usize, height: usize) -> Self {
        let (pw, ph) = pixel_size(width, height);
        Self {
            viewport: Viewport::centered(config.map.center, config.map.zoom, pw, ph),
            map_renderer: MapRenderer::new(),
            visualizer: Visualizer::from_config(&config),
            config,
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            pending: None,
        }
    }

    /// Start the one fetch of this session on a background thread
    pub fn start_load<S>(&mut self, source: S)
    where
        S: StatsSource + 'static,
    {
        let (tx, rx) = mpsc::channel();
        self.visualizer.begin();
        thread::spawn(move || {
            // Receiver gone means the app already quit
            let _ = tx.send(source.fetch());
        });
        self.pending = Some(rx);
    }

    /// Apply the fetch result once it arrives. Returns true when the map
    /// changed.
    pub fn poll_load(&mut self) -> bool {
        let Some(rx) = &self.pending else {
            return false;
        };

        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => {
                warn!("stats fetch thread exited without a result");
                self.pending = None;
                self.visualizer
                    .finish(Err(FetchError::WorkerLost), &mut self.map_renderer);
                return true;
            }
        };

        self.pending = None;
        self.visualizer.finish(result, &mut self.map_renderer);
        true
    }

    pub fn load_state(&self) -> &LoadState {
        self.visualizer.state()
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        let (pw, ph) = pixel_size(width, height);
        self.viewport.width = pw;
        self.viewport.height = ph;
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Zoom in towards a terminal cell
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.viewport.zoom_in_at(px, py);
    }

    /// Zoom out from a terminal cell
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.viewport.zoom_out_at(px, py);
    }

    /// Back to the configured center and zoom; markers are kept
    pub fn reset_view(&mut self) {
        self.viewport = Viewport::centered(
            self.config.map.center,
            self.config.map.zoom,
            self.viewport.width,
            self.viewport.height,
        );
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            // Less sensitive when zoomed out
            let scale = if self.viewport.zoom < 2.0 {
                2
            } else if self.viewport.zoom < 4.0 {
                3
            } else {
                4
            };
            self.pan(dx * scale, dy * scale);
        }
        self.last_mouse = Some((x, y));
    }

    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Mouse position as a cell inside the map border
    pub fn mouse_map_cell(&self) -> Option<(u16, u16)> {
        self.mouse_pos
            .and_then(|(col, row)| Some((col.checked_sub(1)?, row.checked_sub(1)?)))
    }
}

/// Terminal cell to Braille pixel, accounting for the 1-cell border
fn cell_to_pixel(col: u16, row: u16) -> (i32, i32) {
    (col.saturating_sub(1) as i32 * 2, row.saturating_sub(1) as i32 * 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::LatLng;
    use std::time::{Duration, Instant};

    struct OneCountry;

    impl StatsSource for OneCountry {
        fn fetch(&self) -> Result<Vec<CountryStat>, FetchError> {
            Ok(vec![CountryStat::new("A", 100, Some(LatLng { lat: 1.0, lng: 1.0 }))])
        }
    }

    struct Unreachable;

    impl StatsSource for Unreachable {
        fn fetch(&self) -> Result<Vec<CountryStat>, FetchError> {
            Err(FetchError::Status(502))
        }
    }

    fn wait_for_load(app: &mut App) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !app.poll_load() {
            assert!(Instant::now() < deadline, "fetch never completed");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_initial_view_from_config() {
        let app = App::new(Config::default(), 82, 43);
        assert_eq!(app.viewport.zoom, 1.0);
        assert_eq!((app.viewport.width, app.viewport.height), (160, 160));
        assert_eq!(*app.load_state(), LoadState::Idle);
    }

    #[test]
    fn test_background_load_renders_markers() {
        let mut app = App::new(Config::default(), 80, 40);
        app.start_load(OneCountry);
        assert_eq!(*app.load_state(), LoadState::Fetching);

        wait_for_load(&mut app);
        assert_eq!(*app.load_state(), LoadState::Rendered { markers: 1, skipped: 0 });
        assert_eq!(app.map_renderer.markers().len(), 1);
        assert!(!app.poll_load());
    }

    #[test]
    fn test_background_failure_keeps_map_empty() {
        let mut app = App::new(Config::default(), 80, 40);
        app.start_load(Unreachable);
        wait_for_load(&mut app);
        assert!(matches!(app.load_state(), LoadState::Failed(_)));
        assert!(app.map_renderer.markers().is_empty());
    }

    #[test]
    fn test_reset_view() {
        let mut app = App::new(Config::default(), 80, 40);
        app.pan(30, 10);
        app.zoom_in();
        app.reset_view();
        assert_eq!(app.viewport.center_lon, 0.0);
        assert_eq!(app.viewport.center_lat, 0.0);
        assert_eq!(app.viewport.zoom, 1.0);
    }

    #[test]
    fn test_mouse_map_cell() {
        let mut app = App::new(Config::default(), 80, 40);
        assert_eq!(app.mouse_map_cell(), None);
        app.set_mouse_pos(10, 5);
        assert_eq!(app.mouse_map_cell(), Some((9, 4)));
        app.set_mouse_pos(0, 5);
        assert_eq!(app.mouse_map_cell(), None);
    }
}

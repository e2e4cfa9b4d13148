use anyhow::{Context, Result};
use clap::Parser;
use covid_map::app::App;
use covid_map::config::Config;
use covid_map::stats::{HttpStatsSource, StatsSource};
use covid_map::visualizer::feature_collection;
use covid_map::{data, ui};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "covid-map", about = "COVID-19 cases by country on a terminal world map")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the statistics endpoint
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Fetch once, print the GeoJSON FeatureCollection and exit
    #[arg(long)]
    geojson: bool,
}

fn init_logging(config: &Config, to_stderr: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("covid_map=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_ansi(false);

    if to_stderr {
        builder.with_writer(std::io::stderr).init();
    } else {
        // The terminal UI owns stdout
        let file = File::create(&config.log_file)
            .with_context(|| format!("creating log file {}", config.log_file.display()))?;
        builder.with_writer(Mutex::new(file)).init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    init_logging(&config, args.geojson)?;

    let source = HttpStatsSource::new(config.endpoint.clone(), config.timeout_secs.map(Duration::from_secs))?;
    info!(endpoint = source.endpoint(), "starting");

    if args.geojson {
        return dump_geojson(&source);
    }

    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, config, source);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Print the country layer as GeoJSON. A failed fetch still exits cleanly
/// with an empty collection.
fn dump_geojson(source: &HttpStatsSource) -> Result<()> {
    let stats = source.fetch().unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch countries: {e}");
        Vec::new()
    });
    let collection = feature_collection(&stats);
    println!("{}", serde_json::to_string_pretty(&collection)?);
    Ok(())
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Always track position for hover
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, config: Config, source: HttpStatsSource) -> Result<()> {
    let size = terminal.size()?;
    let basemap_dir = config.map.basemap_dir.clone();
    let mut app = App::new(config, size.width as usize, size.height as usize);

    data::load_basemap(&mut app.map_renderer, &basemap_dir);
    app.start_load(source);

    loop {
        app.poll_load();
        terminal.draw(|frame| ui::render(frame, &app))?;

        // ~60fps
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                    KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                    KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                    KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                    KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                    KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                    KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                    KeyCode::Char('b') | KeyCode::Char('B') => app.map_renderer.toggle_borders(),
                    KeyCode::Char('m') | KeyCode::Char('M') => app.map_renderer.toggle_markers(),

                    KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),
                    _ => {}
                },
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width as usize, height as usize),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

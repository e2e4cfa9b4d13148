use crate::app::App;
use crate::braille::BrailleCanvas;
use crate::map::{MapLayers, MarkerSpec, PlacedMarker, Tooltip};
use crate::severity::{Palette, Rgb};
use crate::visualizer::LoadState;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

const LEGEND_STEPS: usize = 8;

fn rgb(c: Rgb) -> Color {
    Color::Rgb(c.0, c.1, c.2)
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_map(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " COVID-19 Cases by Country ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Braille gives 2x4 resolution per character
    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app
        .map_renderer
        .render(inner.width as usize, inner.height as usize, &viewport);

    let hovered = app
        .mouse_map_cell()
        .and_then(|(col, row)| layers.marker_at(col, row));

    let markers = app.map_renderer.markers();
    frame.render_widget(
        MapWidget {
            layers: &layers,
            markers,
            hovered,
        },
        inner,
    );

    if let Some(placed) = hovered {
        if let Some(marker) = markers.get(placed.index) {
            render_tooltip(frame, marker, placed, inner);
        }
    }
}

/// Basemap in Braille plus the marker labels on top
struct MapWidget<'a> {
    layers: &'a MapLayers,
    markers: &'a [MarkerSpec],
    hovered: Option<PlacedMarker>,
}

impl MapWidget<'_> {
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (col, row, ch) in canvas.lit_cells() {
            if col >= area.width as usize || row >= area.height as usize {
                continue;
            }
            buf[(area.x + col as u16, area.y + row as u16)]
                .set_char(ch)
                .set_fg(color);
        }
    }

    /// Label text on the marker's color, like a map pin badge
    fn render_marker(marker: &MarkerSpec, placed: PlacedMarker, raised: bool, area: Rect, buf: &mut Buffer) {
        if placed.row >= area.height {
            return;
        }
        let mut style = Style::default().fg(Color::Black).bg(rgb(marker.color));
        if raised {
            style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
        }

        let y = area.y + placed.row;
        for (i, ch) in marker.label.chars().enumerate() {
            let col = placed.col as usize + i;
            if col >= area.width as usize {
                break;
            }
            buf[(area.x + col as u16, y)].set_char(ch).set_style(style);
        }
    }
}

impl Widget for MapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Self::render_layer(&self.layers.coastlines, Color::Cyan, area, buf);
        Self::render_layer(&self.layers.borders, Color::DarkGray, area, buf);

        for placed in &self.layers.markers {
            if Some(*placed) == self.hovered {
                continue;
            }
            if let Some(marker) = self.markers.get(placed.index) {
                Self::render_marker(marker, *placed, false, area, buf);
            }
        }

        // Hovered marker rises above its neighbours
        if let Some(placed) = self.hovered {
            if let Some(marker) = self.markers.get(placed.index) {
                Self::render_marker(marker, placed, true, area, buf);
            }
        }
    }
}

/// Where a tooltip box goes: below-right of the marker, pushed back inside
/// the map area when it would overflow
fn tooltip_rect(tooltip: &Tooltip, placed: PlacedMarker, area: Rect) -> Rect {
    let width = (tooltip.width() as u16 + 4).min(area.width);
    let height = (tooltip.rows.len() as u16 + 3).min(area.height);

    let mut x = area.x + placed.col + placed.width + 1;
    if x + width > area.x + area.width {
        x = (area.x + placed.col).saturating_sub(width + 1).max(area.x);
    }
    let mut y = area.y + placed.row + 1;
    if y + height > area.y + area.height {
        y = (area.y + area.height).saturating_sub(height).max(area.y);
    }
    Rect::new(x, y, width, height)
}

fn render_tooltip(frame: &mut Frame, marker: &MarkerSpec, placed: PlacedMarker, area: Rect) {
    let tooltip = &marker.tooltip;
    let rect = tooltip_rect(tooltip, placed, area);

    let mut lines = vec![Line::from(Span::styled(
        tooltip.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    lines.extend(tooltip.rows.iter().map(|(key, value)| {
        Line::from(vec![
            Span::styled(format!("{key}: "), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(value.clone()),
        ])
    }));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(rgb(marker.color)));

    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).block(block), rect);
}

fn load_state_span(state: &LoadState) -> Span<'static> {
    match state {
        LoadState::Idle => Span::styled(" idle ", Style::default().fg(Color::DarkGray)),
        LoadState::Fetching => Span::styled(" fetching stats… ", Style::default().fg(Color::Yellow)),
        LoadState::Rendered { markers, .. } => {
            Span::styled(format!(" {markers} countries "), Style::default().fg(Color::Green))
        }
        LoadState::Empty => Span::styled(" no data ", Style::default().fg(Color::DarkGray)),
        LoadState::Failed(_) => Span::styled(" stats unavailable ", Style::default().fg(Color::Red)),
    }
}

/// "Less cases ▮▮▮▮ More cases" gradient from the palette
fn legend_spans(palette: &Palette) -> Vec<Span<'static>> {
    let mut spans = vec![Span::styled("Less cases ", Style::default().fg(Color::DarkGray))];
    spans.extend((0..LEGEND_STEPS).map(|i| {
        let p = i as f64 / (LEGEND_STEPS - 1) as f64;
        Span::styled("█", Style::default().fg(rgb(palette.blend(p))))
    }));
    spans.push(Span::styled(" More cases ", Style::default().fg(Color::DarkGray)));
    spans
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = &app.map_renderer.settings;
    let toggle = |on: bool, on_text: &'static str, off_text: &'static str| {
        Span::styled(
            if on { on_text } else { off_text },
            Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
        )
    };

    let mut spans = vec![load_state_span(app.load_state())];
    spans.push(Span::styled("| ", Style::default().fg(Color::DarkGray)));
    spans.extend(legend_spans(app.visualizer.palette()));
    spans.extend([
        Span::styled("| Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        toggle(settings.show_borders, "[B]order ", "[b]order "),
        toggle(settings.show_markers, "[M]arkers ", "[m]arkers "),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(
            " | hjkl:pan +/-:zoom r:reset q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

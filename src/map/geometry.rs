use crate::braille::BrailleCanvas;
use crate::map::projection::Viewport;

/// A geographic polyline as (lon, lat) pairs
pub type LineString = Vec<(f64, f64)>;

/// Bresenham line between two pixel positions
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);

    loop {
        canvas.set_pixel_signed(x, y);
        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Project and draw a polyline, skipping off-screen segments and the
/// long jumps produced by antimeridian crossings
pub fn draw_linestring(canvas: &mut BrailleCanvas, line: &[(f64, f64)], viewport: &Viewport) {
    let mut prev: Option<(f64, (i32, i32))> = None;

    for &(lon, lat) in line {
        let p = viewport.project(lon, lat);
        if let Some((prev_lon, q)) = prev {
            let wraps = (lon - prev_lon).abs() > 180.0;
            let dist = ((p.0 - q.0).abs() + (p.1 - q.1).abs()) as usize;
            if !wraps && dist < viewport.width && viewport.line_might_be_visible(q, p) {
                draw_line(canvas, q.0, q.1, p.0, p.1);
            }
        }
        prev = Some((lon, p));
    }
}

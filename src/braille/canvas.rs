/// Dot bit for each (x, y) inside a 2x4 Braille cell, indexed `[y][x]`
const DOT_BITS: [[u8; 2]; 4] = [[0x01, 0x08], [0x02, 0x10], [0x04, 0x20], [0x40, 0x80]];

const BLANK: char = '\u{2800}';

/// Terminal canvas where every character cell is a 2x4 grid of Braille dots
pub struct BrailleCanvas {
    width: usize,
    height: usize,
    /// Dot pattern per cell, row-major
    cells: Vec<u8>,
}

impl BrailleCanvas {
    /// `width` x `height` in characters; `2*width` x `4*height` in pixels
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn set_pixel(&mut self, x: usize, y: usize) {
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return;
        }
        self.cells[cy * self.width + cx] |= DOT_BITS[y % 4][x % 2];
    }

    /// Negative coordinates are ignored
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    /// Character at cell (col, row); blank pattern when out of range
    pub fn cell(&self, col: usize, row: usize) -> char {
        if col >= self.width || row >= self.height {
            return BLANK;
        }
        char::from_u32(0x2800 + self.cells[row * self.width + col] as u32).unwrap_or(BLANK)
    }

    pub fn row(&self, row: usize) -> String {
        (0..self.width).map(|col| self.cell(col, row)).collect()
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&b| b == 0)
    }

    /// Non-blank cells as (col, row, char)
    pub fn lit_cells(&self) -> impl Iterator<Item = (usize, usize, char)> + '_ {
        self.cells.iter().enumerate().filter_map(|(idx, &bits)| {
            (bits != 0).then(|| (idx % self.width, idx / self.width, self.cell(idx % self.width, idx / self.width)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pixel() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_pixel(0, 0);
        assert_eq!(canvas.row(0), "⠁");
    }

    #[test]
    fn test_all_dots() {
        let mut canvas = BrailleCanvas::new(1, 1);
        for x in 0..2 {
            for y in 0..4 {
                canvas.set_pixel(x, y);
            }
        }
        assert_eq!(canvas.row(0), "⣿");
    }

    #[test]
    fn test_diagonal() {
        let mut canvas = BrailleCanvas::new(2, 1);
        canvas.set_pixel(0, 0);
        canvas.set_pixel(1, 1);
        canvas.set_pixel(2, 2);
        canvas.set_pixel(3, 3);
        // 0x01|0x10 then 0x04|0x80
        assert_eq!(canvas.row(0), "⠑⢄");
    }

    #[test]
    fn test_out_of_bounds_ignored() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_pixel(2, 0);
        canvas.set_pixel_signed(-1, 0);
        assert!(canvas.is_blank());
        assert_eq!(canvas.cell(5, 5), BLANK);
    }

    #[test]
    fn test_lit_cells() {
        let mut canvas = BrailleCanvas::new(3, 2);
        canvas.set_pixel(4, 5);
        let lit: Vec<_> = canvas.lit_cells().collect();
        assert_eq!(lit, vec![(2, 1, '⠂')]);
    }
}

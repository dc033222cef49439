use crate::grid::Grid;

/// Hex values of braille dots
///
/// ```text
///  1   8
///  2  10
///  4  20
/// 40  80
/// ```
///
/// Where the base blank pattern is codepoint `0x2800` (or U+2800)
///
/// To get other configurations, just add the numbers above.
const BRAILLE_EMPTY: u32 = 0x2800;

/// A viewport onto a [`Grid`], rendered with one braille character per 2x4 block of cells.
pub struct Camera {
    /// The cell buffer
    cb: Vec<bool>,

    /// The frame buffer.
    fb: String,

    /// Codepoints. This allows us to construct the framebuffer more easily
    cp: Vec<u32>,

    /// Width of the cell buffer, in cells
    w: usize,

    /// Height of the cell buffer, in cells
    h: usize,

    /// Grid column shown in the leftmost column of the viewport
    x: usize,

    /// Grid row shown in the top row of the viewport
    y: usize,
}

impl Camera {
    pub fn new(w: usize, h: usize) -> Self {
        // Let `w` and `h` refer to width and height of the cell buffer. Then `bw = ceil(w / 2)`
        // and `bh = ceil(h / 4)` are the width and height of braille characters of our framebuffer
        // (that is, not accounting for the trailing newlines expected at the end of each line).
        let (bw, bh) = (w.div_ceil(2), h.div_ceil(4));

        // Each braille character is 3 bytes, and newlines one byte.
        Self {
            cb: vec![false; w * h],
            fb: String::with_capacity(3 * (bw * bh) + bh),
            cp: vec![BRAILLE_EMPTY; bw * bh],
            w,
            h,
            x: 0,
            y: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    /// Change the viewport size, keeping its offset.
    pub fn resize(&mut self, w: usize, h: usize) {
        let (x, y) = (self.x, self.y);

        *self = Self::new(w, h);
        self.x = x;
        self.y = y;
    }

    /// Top-left grid coordinates shown by the viewport
    pub fn offset(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    /// Pan horizontally. The viewport never goes left of the grid.
    pub fn offset_x(&mut self, offset: isize) {
        self.x = self.x.saturating_add_signed(offset);
    }

    /// Pan vertically. The viewport never goes above the grid.
    pub fn offset_y(&mut self, offset: isize) {
        self.y = self.y.saturating_add_signed(offset);
    }

    /// Move the viewport back to the top-left corner of the grid.
    pub fn reset_view(&mut self) {
        self.x = 0;
        self.y = 0;
    }

    /// Reset the cell buffer
    pub fn reset(&mut self) {
        self.cb.fill(false);
    }

    /// Copy the visible part of `grid` into the cell buffer. Cells past the grid's edge stay
    /// blank.
    pub fn draw(&mut self, grid: &Grid) {
        self.reset();

        for y in 0..self.h {
            for x in 0..self.w {
                if grid.is_alive(self.x.saturating_add(x), self.y.saturating_add(y)) {
                    let i = self.xy_from(x, y);
                    self.cb[i] = true;
                }
            }
        }
    }

    /// Turn the cell buffer into lines of braille characters, each ending with a newline.
    pub fn render(&mut self) -> &str {
        self.fb.clear();

        let bw = self.w.div_ceil(2);
        if bw == 0 {
            return &self.fb;
        }

        // compute new codepoints
        self.cp.fill(BRAILLE_EMPTY);

        for (n, &px) in self.cb.iter().enumerate() {
            if px {
                let (x, y) = self.xy_to(n);
                self.cp[(y / 4) * bw + (x / 2)] += Self::get_hex_value(x, y);
            }
        }

        for row in self.cp.chunks(bw) {
            self.fb.extend(row.iter().map(|&c| char::from_u32(c).unwrap_or(' ')));
            self.fb.push('\n');
        }

        &self.fb
    }

    fn xy_to(&self, n: usize) -> (usize, usize) {
        (n % self.w, n / self.w)
    }

    fn xy_from(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }

    fn get_hex_value(x: usize, y: usize) -> u32 {
        match (x % 2, y % 4) {
            (0, 0) => 0x1,
            (1, 0) => 0x8,
            (0, 1) => 0x2,
            (1, 1) => 0x10,
            (0, 2) => 0x4,
            (1, 2) => 0x20,
            (0, 3) => 0x40,
            _ => 0x80,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glider() -> Grid {
        Grid::from_alive(3, 3, [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]).unwrap()
    }

    #[test]
    fn full_block_is_full_braille() {
        let mut cam = Camera::new(2, 4);
        cam.draw(&Grid::from_rows([[true; 2]; 4]).unwrap());

        assert_eq!(cam.render(), "⣿\n");
    }

    #[test]
    fn empty_grid_renders_blank_braille() {
        let mut cam = Camera::new(4, 8);
        cam.draw(&Grid::new(10, 10));

        assert_eq!(cam.render(), "\u{2800}\u{2800}\n\u{2800}\u{2800}\n");
    }

    #[test]
    fn renders_glider() {
        let mut cam = Camera::new(4, 4);
        cam.draw(&glider());

        assert_eq!(cam.render(), "⠬⠆\n");
    }

    #[test]
    fn panning() {
        let mut cam = Camera::new(2, 4);

        cam.offset_x(-3);
        cam.offset_y(-1);
        assert_eq!(cam.offset(), (0, 0));

        cam.offset_x(1);
        cam.draw(&glider());
        // Columns 1 and 2 of the glider
        assert_eq!(cam.render(), "⠵\n");

        cam.offset_x(5);
        cam.draw(&glider());
        assert_eq!(cam.render(), "\u{2800}\n");

        cam.reset_view();
        assert_eq!(cam.offset(), (0, 0));
    }

    #[test]
    fn resize_keeps_offset() {
        let mut cam = Camera::new(2, 4);
        cam.offset_y(2);
        cam.resize(4, 4);

        assert_eq!((cam.width(), cam.height(), cam.offset()), (4, 4, (0, 2)));

        cam.resize(0, 0);
        cam.draw(&glider());
        assert_eq!(cam.render(), "");
    }
}

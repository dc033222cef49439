use std::fmt;

use rand::Rng;
use rand::seq::index;
use thiserror::Error;

/// Errors raised by [`Grid`] constructors and transforms. All of them describe an invalid
/// argument, so none of them are worth retrying.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("Invalid live cell bounds [{min}, {max}] for a grid of {cells} cells")]
    LiveBounds { min: usize, max: usize, cells: usize },

    #[error("Row {row} has {got} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        got: usize,
        expected: usize,
    },

    #[error("Cell ({x}, {y}) is outside of a {width}x{height} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    #[error("A {w}x{h} window at ({x}, {y}) does not fit in a {width}x{height} grid")]
    Crop {
        x: usize,
        y: usize,
        w: usize,
        h: usize,
        width: usize,
        height: usize,
    },

    #[error("Grid dimensions overflow")]
    Overflow,
}

/// A fixed-size rectangular array of binary cells, stored row-major.
///
/// Grids have value semantics: every transform returns a new `Grid`, so a snapshot handed to a
/// renderer can never change under it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

/// Characters used to print alive and dead cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charmap {
    pub alive: char,
    pub dead: char,
}

impl Default for Charmap {
    fn default() -> Self {
        Self {
            alive: '•',
            dead: ' ',
        }
    }
}

/// The distinct Moore neighbors of a cell. There are never more than eight.
struct Neighborhood {
    coords: [(usize, usize); 8],
    len: usize,
}

impl Neighborhood {
    fn as_slice(&self) -> &[(usize, usize)] {
        &self.coords[..self.len]
    }
}

impl Grid {
    /// Create an all dead grid.
    ///
    /// # Panics
    /// If `width * height` overflows. Use [`Grid::try_new`] for untrusted sizes.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    /// Create an all dead grid, or fail with [`GridError::Overflow`] if it cannot be allocated.
    pub fn try_new(width: usize, height: usize) -> Result<Self, GridError> {
        let len = Self::checked_len(width, height)?;

        Ok(Self {
            width,
            height,
            cells: vec![false; len],
        })
    }

    /// Number of cells of a `width` x `height` grid, if such a grid can exist.
    pub(crate) fn checked_len(width: usize, height: usize) -> Result<usize, GridError> {
        width
            .checked_mul(height)
            .filter(|&n| n <= isize::MAX as usize)
            .ok_or(GridError::Overflow)
    }

    /// Build a grid from rows of cells. Every row must be as wide as the first.
    pub fn from_rows<I, R>(rows: I) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[bool]>,
    {
        let mut width = None;
        let mut height = 0;
        let mut cells = Vec::new();

        for (row, r) in rows.into_iter().enumerate() {
            let r = r.as_ref();
            let expected = *width.get_or_insert(r.len());

            if r.len() != expected {
                return Err(GridError::RaggedRow {
                    row,
                    got: r.len(),
                    expected,
                });
            }

            cells.extend_from_slice(r);
            height += 1;
        }

        Ok(Self {
            width: width.unwrap_or(0),
            height,
            cells,
        })
    }

    /// Build a `width` x `height` grid where exactly the given cells are alive.
    pub fn from_alive<I>(width: usize, height: usize, alive: I) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut grid = Self::try_new(width, height)?;

        for (x, y) in alive {
            if x >= width || y >= height {
                return Err(GridError::OutOfBounds {
                    x,
                    y,
                    width,
                    height,
                });
            }

            grid.set(x, y, true);
        }

        Ok(grid)
    }

    /// Build a grid of the given size from a row-major cell buffer.
    pub(crate) fn from_cells(width: usize, height: usize, cells: Vec<bool>) -> Self {
        debug_assert_eq!(cells.len(), width * height);

        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// State of the cell at `(x, y)`, or `None` outside of the grid.
    pub fn get(&self, x: usize, y: usize) -> Option<bool> {
        (x < self.width && y < self.height).then(|| self.cells[self.xy_from(x, y)])
    }

    /// Whether the cell at `(x, y)` is alive. Cells outside of the grid are dead.
    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        self.get(x, y).unwrap_or(false)
    }

    /// Number of live cells
    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Coordinates of every live cell, top to bottom, left to right.
    pub fn live_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c)
            .map(|(n, _)| self.xy_to(n))
    }

    /// Rows of the grid, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> + '_ {
        (0..self.height).map(|y| &self.cells[y * self.width..(y + 1) * self.width])
    }

    /// Distinct Moore neighbors of `(x, y)`, never including `(x, y)` itself.
    ///
    /// With `wrap`, coordinates wrap around the edges of the grid. Without it, neighbors outside
    /// of the grid are left out. Neighbors come row by row from the top left. A cell outside of
    /// the grid has no neighbors.
    pub fn neighbors(&self, x: usize, y: usize, wrap: bool) -> Vec<(usize, usize)> {
        self.neighborhood(x, y, wrap).as_slice().to_vec()
    }

    /// Number of live cells among [`Grid::neighbors`]. Always in `0..=8`.
    pub fn live_neighbor_count(&self, x: usize, y: usize, wrap: bool) -> u8 {
        self.neighborhood(x, y, wrap)
            .as_slice()
            .iter()
            .filter(|&&(nx, ny)| self.cells[self.xy_from(nx, ny)])
            .count() as u8
    }

    fn neighborhood(&self, x: usize, y: usize, wrap: bool) -> Neighborhood {
        let mut hood = Neighborhood {
            coords: [(0, 0); 8],
            len: 0,
        };

        if x >= self.width || y >= self.height {
            return hood;
        }

        for dy in [-1isize, 0, 1] {
            for dx in [-1isize, 0, 1] {
                if dx == 0 && dy == 0 {
                    continue;
                }

                let Some(nx) = Self::shift(x, dx, self.width, wrap) else {
                    continue;
                };
                let Some(ny) = Self::shift(y, dy, self.height, wrap) else {
                    continue;
                };

                // On grids narrower than 3 cells, several offsets land on the same cell
                if (nx, ny) == (x, y) || hood.as_slice().contains(&(nx, ny)) {
                    continue;
                }

                hood.coords[hood.len] = (nx, ny);
                hood.len += 1;
            }
        }

        hood
    }

    fn shift(n: usize, d: isize, len: usize, wrap: bool) -> Option<usize> {
        if wrap {
            Some((n as isize + d).rem_euclid(len as isize) as usize)
        } else {
            n.checked_add_signed(d).filter(|&n| n < len)
        }
    }

    /// A grid of the same size with between `min_live` and `max_live` live cells (inclusive),
    /// picked uniformly at random.
    pub fn fill_random<R>(
        &self,
        min_live: usize,
        max_live: usize,
        rng: &mut R,
    ) -> Result<Self, GridError>
    where
        R: Rng + ?Sized,
    {
        let n = self.cells.len();

        if min_live > max_live || max_live > n {
            return Err(GridError::LiveBounds {
                min: min_live,
                max: max_live,
                cells: n,
            });
        }

        let live = rng.gen_range(min_live..=max_live);
        let mut cells = vec![false; n];

        for i in index::sample(rng, n, live) {
            cells[i] = true;
        }

        Ok(Self::from_cells(self.width, self.height, cells))
    }

    /// Surround the grid with dead cells. The original cells end up at `(left, top)`.
    pub fn pad(
        &self,
        top: usize,
        bottom: usize,
        left: usize,
        right: usize,
    ) -> Result<Self, GridError> {
        let width = self
            .width
            .checked_add(left)
            .and_then(|w| w.checked_add(right))
            .ok_or(GridError::Overflow)?;
        let height = self
            .height
            .checked_add(top)
            .and_then(|h| h.checked_add(bottom))
            .ok_or(GridError::Overflow)?;

        self.blit(width, height, left as isize, top as isize)
    }

    /// Pad every side by `n`
    pub fn pad_all(&self, n: usize) -> Result<Self, GridError> {
        self.pad(n, n, n, n)
    }

    pub fn pad_top(&self, n: usize) -> Result<Self, GridError> {
        self.pad(n, 0, 0, 0)
    }

    pub fn pad_bottom(&self, n: usize) -> Result<Self, GridError> {
        self.pad(0, n, 0, 0)
    }

    pub fn pad_left(&self, n: usize) -> Result<Self, GridError> {
        self.pad(0, 0, n, 0)
    }

    pub fn pad_right(&self, n: usize) -> Result<Self, GridError> {
        self.pad(0, 0, 0, n)
    }

    /// Truncate or dead-pad to the new size, keeping the top left corner in place.
    pub fn resize(&self, width: usize, height: usize) -> Result<Self, GridError> {
        self.blit(width, height, 0, 0)
    }

    /// Like [`Grid::resize`], but keeps the center in place. When the difference is odd, the
    /// extra padding goes to the bottom and right, and the extra cropping to the top and left.
    pub fn resize_centered(&self, width: usize, height: usize) -> Result<Self, GridError> {
        let dx = (width as isize - self.width as isize).div_euclid(2);
        let dy = (height as isize - self.height as isize).div_euclid(2);

        self.blit(width, height, dx, dy)
    }

    /// The `w` x `h` window whose top left corner is `(x, y)`.
    pub fn crop(&self, x: usize, y: usize, w: usize, h: usize) -> Result<Self, GridError> {
        let fits_x = x.checked_add(w).is_some_and(|r| r <= self.width);
        let fits_y = y.checked_add(h).is_some_and(|b| b <= self.height);

        if !fits_x || !fits_y {
            return Err(GridError::Crop {
                x,
                y,
                w,
                h,
                width: self.width,
                height: self.height,
            });
        }

        self.blit(w, h, -(x as isize), -(y as isize))
    }

    /// Copy this grid onto a dead `width` x `height` grid with its top left corner at `(dx, dy)`,
    /// clipping whatever falls outside.
    fn blit(&self, width: usize, height: usize, dx: isize, dy: isize) -> Result<Self, GridError> {
        let mut out = Self::try_new(width, height)?;

        for (y, row) in self.rows().enumerate() {
            let ty = y as isize + dy;
            if ty < 0 || ty >= height as isize {
                continue;
            }

            for (x, &alive) in row.iter().enumerate() {
                let tx = x as isize + dx;
                if !alive || tx < 0 || tx >= width as isize {
                    continue;
                }

                out.set(tx as usize, ty as usize, true);
            }
        }

        Ok(out)
    }

    /// Print the grid using `charmap`, one line per row.
    pub fn render(&self, charmap: &Charmap) -> String {
        let mut s = String::with_capacity((self.width + 1) * self.height);

        for row in self.rows() {
            s.extend(row.iter().map(|&c| if c { charmap.alive } else { charmap.dead }));
            s.push('\n');
        }

        s
    }

    fn set(&mut self, x: usize, y: usize, alive: bool) {
        let i = self.xy_from(x, y);

        self.cells[i] = alive;
    }

    fn xy_to(&self, n: usize) -> (usize, usize) {
        (n % self.width, n / self.width)
    }

    fn xy_from(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&Charmap::default()))
    }
}

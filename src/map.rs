//! Static grid map
//!
//! Cells are addressed by truncating continuous coordinates, so the cell
//! `(cx, cy)` covers `[cx, cx + 1) × [cy, cy + 1)`. Border cells are always
//! blocked, which keeps every mover inside the world.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Kind of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Open,
    Blocked,
}

/// Errors from building a map
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("map has no rows")]
    Empty,

    #[error("map must be at least 3x3, got {width}x{height}")]
    TooSmall { width: usize, height: usize },

    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown glyph {glyph:?} at row {row}, column {col}")]
    UnknownGlyph { glyph: char, row: usize, col: usize },

    #[error("border cell ({x}, {y}) must be blocked")]
    OpenBorder { x: usize, y: usize },

    #[error("more than one player spawn marker")]
    DuplicateSpawn,
}

/// Immutable grid of open/blocked cells
#[derive(Debug, Clone, PartialEq)]
pub struct GridMap {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    /// Player start position (center of the spawn cell)
    spawn: Vec2,
}

impl GridMap {
    /// A `width × height` rectangle with walls on the border and an open interior
    pub fn bordered(width: usize, height: usize) -> Result<Self, MapError> {
        if width < 3 || height < 3 {
            return Err(MapError::TooSmall { width, height });
        }
        let cells = (0..height)
            .flat_map(|y| {
                (0..width).map(move |x| {
                    if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                        Cell::Blocked
                    } else {
                        Cell::Open
                    }
                })
            })
            .collect();
        Ok(Self {
            width,
            height,
            cells,
            spawn: Vec2::new(1.5, 1.5),
        })
    }

    /// Parse an ASCII map: `#` blocked, `.` open, `P` open player spawn.
    ///
    /// Blank lines are skipped. Without a `P` marker the player starts at the
    /// first open cell in row-major order.
    pub fn parse(text: &str) -> Result<Self, MapError> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .collect();
        let height = rows.len();
        let width = rows.first().map(|r| r.chars().count()).ok_or(MapError::Empty)?;
        if width < 3 || height < 3 {
            return Err(MapError::TooSmall { width, height });
        }

        let mut cells = Vec::with_capacity(width * height);
        let mut spawn = None;
        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(MapError::RaggedRow {
                    row,
                    expected: width,
                    found,
                });
            }
            for (col, glyph) in line.chars().enumerate() {
                let cell = match glyph {
                    '#' => Cell::Blocked,
                    '.' => Cell::Open,
                    'P' => {
                        if spawn.is_some() {
                            return Err(MapError::DuplicateSpawn);
                        }
                        spawn = Some(cell_center(col, row));
                        Cell::Open
                    }
                    _ => return Err(MapError::UnknownGlyph { glyph, row, col }),
                };
                cells.push(cell);
            }
        }

        let mut map = Self {
            width,
            height,
            cells,
            spawn: Vec2::ZERO,
        };
        map.check_border()?;
        map.spawn = match spawn {
            Some(s) => s,
            None => map
                .open_cells()
                .next()
                .map(|(x, y)| cell_center(x, y))
                .ok_or(MapError::TooSmall { width, height })?,
        };
        Ok(map)
    }

    fn check_border(&self) -> Result<(), MapError> {
        for y in 0..self.height {
            for x in 0..self.width {
                let border = x == 0 || y == 0 || x == self.width - 1 || y == self.height - 1;
                if border && self.cells[y * self.width + x] != Cell::Blocked {
                    return Err(MapError::OpenBorder { x, y });
                }
            }
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Player start position
    pub fn spawn(&self) -> Vec2 {
        self.spawn
    }

    /// Cell at integer coordinates, `None` outside the grid
    pub fn cell(&self, x: usize, y: usize) -> Option<Cell> {
        if x < self.width && y < self.height {
            Some(self.cells[y * self.width + x])
        } else {
            None
        }
    }

    /// The movement-validity predicate: in bounds and not blocked
    pub fn is_open(&self, x: f32, y: f32) -> bool {
        // NaN fails both comparisons and lands here too
        if !(x >= 0.0 && y >= 0.0) {
            return false;
        }
        let (cx, cy) = (x.floor() as usize, y.floor() as usize);
        matches!(self.cell(cx, cy), Some(Cell::Open))
    }

    #[inline]
    pub fn is_open_at(&self, pos: Vec2) -> bool {
        self.is_open(pos.x, pos.y)
    }

    /// Open cells in row-major order
    pub fn open_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == Cell::Open)
            .map(|(i, _)| (i % self.width, i / self.width))
    }

    /// Center of the open cell nearest to `target` that satisfies `accept`.
    ///
    /// Ties resolve to the earliest cell in row-major order.
    pub fn nearest_open<F>(&self, target: Vec2, mut accept: F) -> Option<Vec2>
    where
        F: FnMut(Vec2) -> bool,
    {
        let mut best: Option<(f32, Vec2)> = None;
        for (x, y) in self.open_cells() {
            let center = cell_center(x, y);
            if !accept(center) {
                continue;
            }
            let d = center.distance_squared(target);
            if best.is_none_or(|(bd, _)| d < bd) {
                best = Some((d, center));
            }
        }
        best.map(|(_, c)| c)
    }
}

/// Continuous coordinates of a cell's center
#[inline]
pub fn cell_center(x: usize, y: usize) -> Vec2 {
    Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
}

//! Board: a W×H grid of cells. (x, y) with y = 0 at the top; storage is column-major so a
//! column is one contiguous slice (refill works column by column).

use crate::error::{EngineError, Result};
use std::fmt;

/// Gem type, `1..=K`.
pub type GemKind = u8;

/// Grid coordinate `(x, y)`.
pub type Pos = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Special {
    Bomb,
}

/// Single cell: empty, an ordinary gem, or a special piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    Gem(GemKind),
    Special(Special),
}

impl Cell {
    /// Gem kind, or `None` for empty cells and specials (specials never match).
    #[inline]
    pub fn gem(self) -> Option<GemKind> {
        match self {
            Self::Gem(kind) => Some(kind),
            _ => None,
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }

    #[inline]
    pub fn is_special(self) -> bool {
        matches!(self, Self::Special(_))
    }

    #[inline]
    pub fn is_occupied(self) -> bool {
        !self.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    /// cells[x * height + y]
    cells: Vec<Cell>,
}

impl Grid {
    /// All-empty grid. Only meaningful as a starting point for a layout builder.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::Empty; width * height],
        }
    }

    /// Build from row-major rows (`rows[y][x]`): `0` is empty, `1..=gem_kinds` are gems.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R], gem_kinds: GemKind) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        let mut grid = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(EngineError::RaggedLayout {
                    row: y,
                    expected: width,
                    found: row.len(),
                });
            }
            for (x, &kind) in row.iter().enumerate() {
                let cell = match kind {
                    0 => Cell::Empty,
                    k if k <= gem_kinds => Cell::Gem(k),
                    k => {
                        return Err(EngineError::InvalidGemKind {
                            kind: k,
                            max: gem_kinds,
                        });
                    }
                };
                grid.set(x, y, cell)?;
            }
        }
        Ok(grid)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn is_valid_pos(&self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    fn out_of_bounds(&self, x: isize, y: isize) -> EngineError {
        EngineError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        }
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> Result<usize> {
        if x >= self.width || y >= self.height {
            return Err(self.out_of_bounds(x as isize, y as isize));
        }
        Ok(x * self.height + y)
    }

    pub fn get(&self, x: usize, y: usize) -> Result<Cell> {
        self.index(x, y).map(|i| self.cells[i])
    }

    pub fn set(&mut self, x: usize, y: usize, cell: Cell) -> Result<()> {
        let i = self.index(x, y)?;
        self.cells[i] = cell;
        Ok(())
    }

    /// Like [`Grid::get`] but an empty cell is an error.
    pub fn piece(&self, x: usize, y: usize) -> Result<Cell> {
        match self.get(x, y)? {
            Cell::Empty => Err(EngineError::EmptyCellAccess { x, y }),
            cell => Ok(cell),
        }
    }

    /// Gem kind at a signed coordinate; `None` when out of bounds, empty or special.
    /// Matching scans use this so a candidate off the board simply fails to match.
    #[inline]
    pub fn gem_at(&self, x: isize, y: isize) -> Option<GemKind> {
        if !self.is_valid_pos(x, y) {
            return None;
        }
        self.cells[x as usize * self.height + y as usize].gem()
    }

    pub fn swap(&mut self, a: Pos, b: Pos) -> Result<()> {
        let ia = self.index(a.0, a.1)?;
        let ib = self.index(b.0, b.1)?;
        self.cells.swap(ia, ib);
        Ok(())
    }

    /// Column `x`, top to bottom.
    pub fn column(&self, x: usize) -> Result<&[Cell]> {
        if x >= self.width {
            return Err(self.out_of_bounds(x as isize, 0));
        }
        let start = x * self.height;
        Ok(&self.cells[start..start + self.height])
    }

    pub(crate) fn column_mut(&mut self, x: usize) -> Result<&mut [Cell]> {
        if x >= self.width {
            return Err(self.out_of_bounds(x as isize, 0));
        }
        let start = x * self.height;
        Ok(&mut self.cells[start..start + self.height])
    }

    /// Every cell with its position, `x` outer and `y` inner (the matcher's scan order).
    pub fn iter(&self) -> impl Iterator<Item = (Pos, Cell)> + '_ {
        let h = self.height;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &cell)| ((i / h, i % h), cell))
    }

    pub fn empty_positions(&self) -> Vec<Pos> {
        self.iter()
            .filter(|(_, cell)| cell.is_empty())
            .map(|(pos, _)| pos)
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| c.is_occupied())
    }

    pub fn count_specials(&self) -> usize {
        self.cells.iter().filter(|c| c.is_special()).count()
    }
}

/// One text row per grid row: gem digits, `B` for a bomb, `.` for empty.
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            if y > 0 {
                writeln!(f)?;
            }
            for x in 0..self.width {
                let c = match self.cells[x * self.height + y] {
                    Cell::Empty => '.',
                    Cell::Gem(k) => char::from_digit(u32::from(k), 36).unwrap_or('?'),
                    Cell::Special(Special::Bomb) => 'B',
                };
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

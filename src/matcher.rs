//! Match detection: shapes (T / L) first, then the single longest straight line.
//!
//! Both scans walk `x` outer and `y` inner. A shape wins over any line; among lines the
//! longest wins and ties go to the first one found (horizontal before vertical at a cell).

use crate::grid::{Grid, Pos};
use std::fmt;

/// Shortest line that counts as a match.
pub const MIN_LINE: usize = 3;
/// Runs are measured up to this many cells; longer runs resolve in pieces.
pub const MAX_LINE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    #[inline]
    fn step(self) -> (isize, isize) {
        match self {
            Self::Horizontal => (1, 0),
            Self::Vertical => (0, 1),
        }
    }
}

/// T and L footprints inside a 3×3 box anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    TUp,
    TDown,
    TLeft,
    TRight,
    LUp,
    LDown,
    LLeft,
    LRight,
}

impl ShapeKind {
    /// Check order at each anchor.
    pub const ALL: [Self; 8] = [
        Self::TUp,
        Self::TDown,
        Self::TLeft,
        Self::TRight,
        Self::LUp,
        Self::LDown,
        Self::LLeft,
        Self::LRight,
    ];

    /// Cell offsets `(dx, dy)` from the anchor.
    pub fn offsets(self) -> &'static [(usize, usize); 5] {
        match self {
            // sss
            //  s
            //  s
            Self::TUp => &[(0, 0), (1, 0), (2, 0), (1, 1), (1, 2)],
            //  s
            //  s
            // sss
            Self::TDown => &[(1, 0), (1, 1), (0, 2), (1, 2), (2, 2)],
            // s
            // sss
            // s
            Self::TLeft => &[(0, 0), (0, 1), (1, 1), (2, 1), (0, 2)],
            //   s
            // sss
            //   s
            Self::TRight => &[(2, 0), (0, 1), (1, 1), (2, 1), (2, 2)],
            // s
            // s
            // sss
            Self::LUp => &[(0, 0), (0, 1), (0, 2), (1, 2), (2, 2)],
            // sss
            // s
            // s
            Self::LDown => &[(0, 0), (1, 0), (2, 0), (0, 1), (0, 2)],
            //   s
            //   s
            // sss
            Self::LLeft => &[(2, 0), (2, 1), (0, 2), (1, 2), (2, 2)],
            // sss
            //   s
            //   s
            Self::LRight => &[(0, 0), (1, 0), (2, 0), (2, 1), (2, 2)],
        }
    }

    pub fn is_t(self) -> bool {
        matches!(self, Self::TUp | Self::TDown | Self::TLeft | Self::TRight)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::TUp => "T_UP",
            Self::TDown => "T_DOWN",
            Self::TLeft => "T_LEFT",
            Self::TRight => "T_RIGHT",
            Self::LUp => "L_UP",
            Self::LDown => "L_DOWN",
            Self::LLeft => "L_LEFT",
            Self::LRight => "L_RIGHT",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchDescriptor {
    Line {
        orientation: Orientation,
        origin: Pos,
        length: usize,
    },
    Shape {
        kind: ShapeKind,
        origin: Pos,
    },
}

impl MatchDescriptor {
    pub fn origin(&self) -> Pos {
        match *self {
            Self::Line { origin, .. } | Self::Shape { origin, .. } => origin,
        }
    }

    pub fn is_shape(&self) -> bool {
        matches!(self, Self::Shape { .. })
    }

    /// Length used for scoring: the run length of a line, always [`MAX_LINE`] for a shape.
    pub fn scoring_length(&self) -> usize {
        match *self {
            Self::Line { length, .. } => length,
            Self::Shape { .. } => MAX_LINE,
        }
    }

    /// Exact matched cells, in template order.
    pub fn positions(&self) -> Vec<Pos> {
        match *self {
            Self::Line {
                orientation,
                origin: (x, y),
                length,
            } => (0..length)
                .map(|i| match orientation {
                    Orientation::Horizontal => (x + i, y),
                    Orientation::Vertical => (x, y + i),
                })
                .collect(),
            Self::Shape {
                kind,
                origin: (x, y),
            } => kind
                .offsets()
                .iter()
                .map(|&(dx, dy)| (x + dx, y + dy))
                .collect(),
        }
    }
}

/// Highest-priority match on the board, if any.
pub fn find_best_match(grid: &Grid) -> Option<MatchDescriptor> {
    find_shape(grid).or_else(|| find_longest_line(grid))
}

pub fn has_match(grid: &Grid) -> bool {
    find_best_match(grid).is_some()
}

/// True when every cell of `kind`'s template anchored at `(x, y)` holds the same gem.
/// A template cell off the board, empty, or holding a special fails the shape.
/// The anchor itself is only compared when it is part of the template, so T_DOWN, T_RIGHT and
/// L_LEFT match regardless of their top-left corner.
pub fn shape_matches(grid: &Grid, x: usize, y: usize, kind: ShapeKind) -> bool {
    let mut gems = kind
        .offsets()
        .iter()
        .map(|&(dx, dy)| grid.gem_at((x + dx) as isize, (y + dy) as isize));
    match gems.next().flatten() {
        Some(first) => gems.all(|g| g == Some(first)),
        None => false,
    }
}

/// First shape in scan order; at each anchor the kinds are tried in [`ShapeKind::ALL`] order.
pub fn find_shape(grid: &Grid) -> Option<MatchDescriptor> {
    for x in 0..grid.width() {
        for y in 0..grid.height() {
            if let Some(kind) = ShapeKind::ALL
                .into_iter()
                .find(|&kind| shape_matches(grid, x, y, kind))
            {
                return Some(MatchDescriptor::Shape {
                    kind,
                    origin: (x, y),
                });
            }
        }
    }
    None
}

/// Same-gem run starting at `(x, y)`, capped at [`MAX_LINE`]. Zero if the start holds no gem.
pub fn run_length(grid: &Grid, x: usize, y: usize, orientation: Orientation) -> usize {
    let (x, y) = (x as isize, y as isize);
    let Some(kind) = grid.gem_at(x, y) else {
        return 0;
    };
    let (dx, dy) = orientation.step();
    let mut len = 1;
    while len < MAX_LINE {
        let step = len as isize;
        if grid.gem_at(x + dx * step, y + dy * step) != Some(kind) {
            break;
        }
        len += 1;
    }
    len
}

/// Longest line of at least [`MIN_LINE`]; only a strictly longer run replaces the current best.
pub fn find_longest_line(grid: &Grid) -> Option<MatchDescriptor> {
    let mut best: Option<MatchDescriptor> = None;
    let mut best_len = 0;
    for x in 0..grid.width() {
        for y in 0..grid.height() {
            for orientation in [Orientation::Horizontal, Orientation::Vertical] {
                let length = run_length(grid, x, y, orientation);
                if length >= MIN_LINE && length > best_len {
                    best_len = length;
                    best = Some(MatchDescriptor::Line {
                        orientation,
                        origin: (x, y),
                        length,
                    });
                }
            }
        }
    }
    best
}

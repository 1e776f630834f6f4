//! Gravity refill: compact surviving pieces down each column, then drop new gems in from the top.

use crate::error::Result;
use crate::grid::{Cell, GemKind, Grid, Pos};
use rand::Rng;
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// A surviving piece that slid down during compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fall {
    pub column: usize,
    pub from_row: usize,
    pub to_row: usize,
}

/// A freshly generated gem and where it came to rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Materialized {
    pub column: usize,
    pub final_row: usize,
    /// Rows the piece drops from above the board; every new piece in a column falls by the
    /// number of holes in that column.
    pub fall_distance: usize,
    pub gem: GemKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefillReport {
    pub falls: Vec<Fall>,
    pub materialized: Vec<Materialized>,
}

impl RefillReport {
    pub fn is_empty(&self) -> bool {
        self.falls.is_empty() && self.materialized.is_empty()
    }

    /// Positions that received a new gem.
    pub fn new_positions(&self) -> impl Iterator<Item = Pos> + '_ {
        self.materialized.iter().map(|m| (m.column, m.final_row))
    }
}

/// Refill every column touched by `empty_positions`.
///
/// Each affected column is compacted bottom-up (surviving pieces keep their vertical order),
/// then the holes left at the top are filled with uniformly random gems `1..=gem_kinds`.
/// Afterwards those columns hold no empty cells.
pub fn refill<R: Rng>(
    grid: &mut Grid,
    empty_positions: &[Pos],
    gem_kinds: GemKind,
    rng: &mut R,
) -> Result<RefillReport> {
    let mut columns = BTreeSet::new();
    for &(x, y) in empty_positions {
        grid.get(x, y)?;
        columns.insert(x);
    }

    let mut report = RefillReport::default();
    for x in columns {
        let column = grid.column_mut(x)?;
        let holes = compact(column, x, &mut report.falls);
        for (y, cell) in column.iter_mut().enumerate().take(holes) {
            let gem = rng.random_range(1..=gem_kinds);
            *cell = Cell::Gem(gem);
            report.materialized.push(Materialized {
                column: x,
                final_row: y,
                fall_distance: holes,
                gem,
            });
        }
        trace!(column = x, holes, "column refilled");
    }

    debug!(
        falls = report.falls.len(),
        new = report.materialized.len(),
        "refill done"
    );
    Ok(report)
}

/// Slide occupied cells to the bottom of `column`, returning how many empty rows remain on top.
fn compact(column: &mut [Cell], x: usize, falls: &mut Vec<Fall>) -> usize {
    let mut write = column.len();
    for read in (0..column.len()).rev() {
        if column[read].is_empty() {
            continue;
        }
        write -= 1;
        if write != read {
            column[write] = column[read];
            column[read] = Cell::Empty;
            falls.push(Fall {
                column: x,
                from_row: read,
                to_row: write,
            });
        }
    }
    write
}

//! Bomb chain reactions: breadth-first flood over 3×3 blast radii.

use crate::error::{EngineError, Result};
use crate::grid::{Cell, Grid, Pos};
use crate::resolver::ScoreEvent;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// 3×3 neighbourhood including the centre.
#[rustfmt::skip]
const BLAST: [(isize, isize); 9] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0),  (0, 0),  (1, 0),
    (-1, 1),  (0, 1),  (1, 1),
];

/// Cells a chain reaction consumes, before anything is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blast {
    /// Occupied cells hit by any blast, row-major (top to bottom, then left to right).
    pub affected: Vec<Pos>,
    /// Specials expanded, the origin included.
    pub expansions: usize,
}

/// Flood from the special at `origin`: every occupied cell in its 3×3 is hit, and every special
/// hit expands in turn. Each cell is visited at most once.
pub fn blast_area(grid: &Grid, origin: Pos) -> Result<Blast> {
    let (ox, oy) = origin;
    if !grid.piece(ox, oy)?.is_special() {
        return Err(EngineError::NotSpecial { x: ox, y: oy });
    }

    let mut visited = HashSet::from([origin]);
    let mut affected = vec![origin];
    let mut queue = VecDeque::from([origin]);
    let mut expansions = 0;

    while let Some((bx, by)) = queue.pop_front() {
        expansions += 1;
        for (dx, dy) in BLAST {
            let (nx, ny) = (bx as isize + dx, by as isize + dy);
            if !grid.is_valid_pos(nx, ny) {
                continue;
            }
            let pos = (nx as usize, ny as usize);
            if visited.contains(&pos) {
                continue;
            }
            let cell = grid.get(pos.0, pos.1)?;
            if cell.is_empty() {
                continue;
            }
            visited.insert(pos);
            affected.push(pos);
            if cell.is_special() {
                queue.push_back(pos);
            }
        }
    }

    affected.sort_unstable_by_key(|&(x, y)| (y, x));
    Ok(Blast {
        affected,
        expansions,
    })
}

/// Detonate the special at `origin` and everything it chains into.
///
/// All affected cells are emptied, specials included. Score is `reward` per ordinary gem
/// removed; consumed specials score nothing. The caller refills the cleared cells.
pub fn explode(grid: &mut Grid, origin: Pos, reward: u32) -> Result<ScoreEvent> {
    let blast = blast_area(grid, origin)?;
    let mut event = ScoreEvent::default();
    for &(x, y) in &blast.affected {
        if let Cell::Gem(kind) = grid.get(x, y)? {
            event.removed_gems.push(kind);
        }
        grid.set(x, y, Cell::Empty)?;
        event.cleared.push((x, y));
    }
    event.cells_removed = event.removed_gems.len();
    event.points_awarded = u32::try_from(event.cells_removed)
        .map_or(u32::MAX, |n| reward.saturating_mul(n));

    debug!(
        ?origin,
        expansions = blast.expansions,
        removed = event.cells_removed,
        points = event.points_awarded,
        "bomb exploded"
    );
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Special;

    const BOMB: Cell = Cell::Special(Special::Bomb);

    fn filled(w: usize, h: usize) -> Grid {
        let rows: Vec<Vec<u8>> = (0..h)
            .map(|y| (0..w).map(|x| 1 + ((x + y) % 3) as u8).collect())
            .collect();
        Grid::from_rows(&rows, 3).unwrap()
    }

    #[test]
    fn test_single_bomb_clears_three_by_three() {
        let mut g = filled(5, 5);
        g.set(2, 2, BOMB).unwrap();
        let ev = explode(&mut g, (2, 2), 10).unwrap();
        assert_eq!(ev.cells_removed, 8);
        assert_eq!(ev.points_awarded, 80);
        assert_eq!(ev.cleared.len(), 9);
        assert_eq!(g.empty_positions().len(), 9);
        for x in 1..=3 {
            for y in 1..=3 {
                assert!(g.get(x, y).unwrap().is_empty());
            }
        }
    }

    #[test]
    fn test_corner_bomb_is_clipped() {
        let mut g = filled(4, 4);
        g.set(0, 0, BOMB).unwrap();
        let ev = explode(&mut g, (0, 0), 10).unwrap();
        assert_eq!(ev.cleared, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
        assert_eq!(ev.cells_removed, 3);
    }

    #[test]
    #[rustfmt::skip]
    fn test_removal_order_is_row_major() {
        let mut g = filled(5, 5);
        g.set(2, 2, BOMB).unwrap();
        let ev = explode(&mut g, (2, 2), 10).unwrap();
        assert_eq!(
            ev.cleared,
            vec![
                (1, 1), (2, 1), (3, 1),
                (1, 2), (2, 2), (3, 2),
                (1, 3), (2, 3), (3, 3),
            ]
        );
    }

    #[test]
    fn test_diagonal_chain_expands_each_bomb_once() {
        let n = 4;
        let mut g = filled(8, 8);
        for i in 0..n {
            g.set(i, i, BOMB).unwrap();
        }
        let blast = blast_area(&g, (0, 0)).unwrap();
        assert_eq!(blast.expansions, n);

        let mut expected = HashSet::new();
        for i in 0..n as isize {
            for (dx, dy) in BLAST {
                if g.is_valid_pos(i + dx, i + dy) {
                    expected.insert(((i + dx) as usize, (i + dy) as usize));
                }
            }
        }
        let unique: HashSet<Pos> = blast.affected.iter().copied().collect();
        assert_eq!(unique.len(), blast.affected.len());
        assert_eq!(unique, expected);

        let ev = explode(&mut g, (0, 0), 10).unwrap();
        assert_eq!(ev.cells_removed, expected.len() - n);
        assert_eq!(g.count_specials(), 0);
    }

    #[test]
    fn test_packed_bombs_terminate() {
        let mut g = filled(4, 4);
        for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
            g.set(x, y, BOMB).unwrap();
        }
        let blast = blast_area(&g, (1, 1)).unwrap();
        assert_eq!(blast.expansions, 4);
        assert_eq!(blast.affected.len(), 16);
    }

    #[test]
    fn test_bomb_two_cells_away_is_not_triggered() {
        let mut g = filled(6, 6);
        g.set(1, 1, BOMB).unwrap();
        g.set(3, 1, BOMB).unwrap();
        let blast = blast_area(&g, (1, 1)).unwrap();
        assert_eq!(blast.expansions, 1);
        assert!(!blast.affected.contains(&(3, 1)));
    }

    #[test]
    fn test_empty_cells_in_radius_are_skipped() {
        let mut g = filled(3, 3);
        g.set(1, 1, BOMB).unwrap();
        g.set(0, 0, Cell::Empty).unwrap();
        let ev = explode(&mut g, (1, 1), 10).unwrap();
        assert_eq!(ev.cleared.len(), 8);
        assert_eq!(ev.cells_removed, 7);
    }

    #[test]
    fn test_origin_must_be_special() {
        let mut g = filled(3, 3);
        assert_eq!(
            explode(&mut g, (1, 1), 10),
            Err(EngineError::NotSpecial { x: 1, y: 1 })
        );
        g.set(1, 1, Cell::Empty).unwrap();
        assert_eq!(
            explode(&mut g, (1, 1), 10),
            Err(EngineError::EmptyCellAccess { x: 1, y: 1 })
        );
        assert!(matches!(
            explode(&mut g, (3, 0), 10),
            Err(EngineError::OutOfBounds { .. })
        ));
    }
}

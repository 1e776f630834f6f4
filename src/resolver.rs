//! Match resolution: remove the matched gems, score them, and decide where a bomb spawns.

use crate::error::Result;
use crate::grid::{Cell, GemKind, Grid, Pos, Special};
use crate::matcher::MatchDescriptor;
use crate::score::{ClearTier, line_points};
use tracing::debug;

/// Outcome of one resolved match or explosion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScoreEvent {
    /// Ordinary gems removed.
    pub cells_removed: usize,
    pub points_awarded: u32,
    /// Where a bomb is placed once the board has refilled (shape matches only).
    pub special_spawned: Option<Pos>,
    /// Every cell emptied by this event, in removal order. Includes consumed specials.
    pub cleared: Vec<Pos>,
    /// Kind of each removed gem, in removal order.
    pub removed_gems: Vec<GemKind>,
}

impl ScoreEvent {
    pub fn tier(&self) -> Option<ClearTier> {
        ClearTier::from_count(self.cells_removed)
    }
}

/// Remove the cells of `m` and score them.
///
/// Lines score `reward × multiplier(length)`; shapes always score as a five. Specials inside the
/// footprint stay put. For shapes the bomb position (integer mean of the footprint) is reported
/// but not placed: the caller places it with [`spawn_special`] after refilling.
pub fn resolve(grid: &mut Grid, m: &MatchDescriptor, reward: u32) -> Result<ScoreEvent> {
    let positions = m.positions();
    // Check everything first so a bad descriptor leaves the grid untouched.
    let cells = positions
        .iter()
        .map(|&(x, y)| grid.piece(x, y))
        .collect::<Result<Vec<Cell>>>()?;

    let mut event = ScoreEvent {
        points_awarded: line_points(reward, m.scoring_length()),
        ..ScoreEvent::default()
    };
    for (&(x, y), cell) in positions.iter().zip(cells) {
        if let Cell::Gem(kind) = cell {
            grid.set(x, y, Cell::Empty)?;
            event.cleared.push((x, y));
            event.removed_gems.push(kind);
        }
    }
    event.cells_removed = event.removed_gems.len();

    if m.is_shape() {
        let n = positions.len();
        let sx: usize = positions.iter().map(|p| p.0).sum();
        let sy: usize = positions.iter().map(|p| p.1).sum();
        event.special_spawned = Some((sx / n, sy / n));
    }

    debug!(
        ?m,
        removed = event.cells_removed,
        points = event.points_awarded,
        spawn = ?event.special_spawned,
        "resolved match"
    );
    Ok(event)
}

/// Place a bomb at `pos`, replacing whatever piece settled there.
pub fn spawn_special(grid: &mut Grid, pos: Pos) -> Result<()> {
    let (x, y) = pos;
    grid.piece(x, y)?;
    grid.set(x, y, Cell::Special(Special::Bomb))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::matcher::{Orientation, ShapeKind, find_best_match};

    const REWARD: u32 = 10;

    fn line(x: usize, y: usize, length: usize) -> MatchDescriptor {
        MatchDescriptor::Line {
            orientation: Orientation::Horizontal,
            origin: (x, y),
            length,
        }
    }

    #[test]
    fn test_line_of_three_scores_reward() {
        let mut g = Grid::from_rows(&[[1u8, 1, 1, 2], [2, 3, 2, 3]], 3).unwrap();
        let ev = resolve(&mut g, &line(0, 0, 3), REWARD).unwrap();
        assert_eq!(ev.cells_removed, 3);
        assert_eq!(ev.points_awarded, REWARD);
        assert_eq!(ev.special_spawned, None);
        assert_eq!(ev.cleared, vec![(0, 0), (1, 0), (2, 0)]);
        assert_eq!(ev.removed_gems, vec![1, 1, 1]);
        assert_eq!(g.to_string(), "...2\n2323");
    }

    #[test]
    fn test_line_scores_by_length() {
        let mut g = Grid::from_rows(&[[1u8, 1, 1, 1, 1]], 3).unwrap();
        assert_eq!(
            resolve(&mut g.clone(), &line(0, 0, 4), REWARD)
                .unwrap()
                .points_awarded,
            2 * REWARD
        );
        assert_eq!(
            resolve(&mut g, &line(0, 0, 5), REWARD)
                .unwrap()
                .points_awarded,
            4 * REWARD
        );
    }

    #[test]
    fn test_shape_scores_as_five_and_spawns_at_mean() {
        let mut g = Grid::from_rows(&[[1u8, 1, 1], [2, 1, 3], [3, 1, 2]], 3).unwrap();
        let m = find_best_match(&g).unwrap();
        assert_eq!(
            m,
            MatchDescriptor::Shape {
                kind: ShapeKind::TUp,
                origin: (0, 0)
            }
        );
        let ev = resolve(&mut g, &m, REWARD).unwrap();
        assert_eq!(ev.points_awarded, 4 * REWARD);
        assert_eq!(ev.cells_removed, 5);
        // x: (0+1+2+1+1)/5 = 1, y: (0+0+0+1+2)/5 = 0
        assert_eq!(ev.special_spawned, Some((1, 0)));
        // Not placed yet.
        assert_eq!(g.count_specials(), 0);
    }

    #[test]
    fn test_l_shape_spawn_uses_integer_mean() {
        let m = MatchDescriptor::Shape {
            kind: ShapeKind::LLeft,
            origin: (0, 0),
        };
        let mut g = Grid::from_rows(&[[2u8, 3, 1], [3, 2, 1], [1, 1, 1]], 3).unwrap();
        let ev = resolve(&mut g, &m, REWARD).unwrap();
        // x: (2+2+0+1+2)/5 = 1, y: (0+1+2+2+2)/5 = 1
        assert_eq!(ev.special_spawned, Some((1, 1)));
    }

    #[test]
    fn test_specials_in_footprint_survive() {
        let mut g = Grid::from_rows(&[[1u8, 1, 1]], 3).unwrap();
        g.set(1, 0, Cell::Special(Special::Bomb)).unwrap();
        let ev = resolve(&mut g, &line(0, 0, 3), REWARD).unwrap();
        assert_eq!(ev.cells_removed, 2);
        assert_eq!(g.get(1, 0).unwrap(), Cell::Special(Special::Bomb));
    }

    #[test]
    fn test_empty_cell_in_match_is_error_and_no_mutation() {
        let mut g = Grid::from_rows(&[[1u8, 1, 0]], 3).unwrap();
        let before = g.clone();
        assert_eq!(
            resolve(&mut g, &line(0, 0, 3), REWARD),
            Err(EngineError::EmptyCellAccess { x: 2, y: 0 })
        );
        assert_eq!(g, before);
    }

    #[test]
    fn test_match_off_board_is_error() {
        let mut g = Grid::from_rows(&[[1u8, 1, 1]], 3).unwrap();
        assert!(matches!(
            resolve(&mut g, &line(1, 0, 3), REWARD),
            Err(EngineError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_spawn_special_needs_a_piece() {
        let mut g = Grid::from_rows(&[[1u8, 0]], 3).unwrap();
        spawn_special(&mut g, (0, 0)).unwrap();
        assert_eq!(g.get(0, 0).unwrap(), Cell::Special(Special::Bomb));
        assert_eq!(
            spawn_special(&mut g, (1, 0)),
            Err(EngineError::EmptyCellAccess { x: 1, y: 0 })
        );
    }
}

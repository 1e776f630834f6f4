//! Turn driver: swap, explode or match, refill, and cascade until the board is stable.

use crate::chain::explode;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::grid::{Grid, Pos};
use crate::layout::random_layout;
use crate::matcher::{find_best_match, has_match};
use crate::refill::{RefillReport, refill};
use crate::resolver::{ScoreEvent, resolve, spawn_special};
use crate::score::ScoreBoard;
use crate::swap::{SwapOutcome, blast_origin, try_swap};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, instrument, warn};

/// Upper bound on match-resolve-refill rounds in one settle.
pub const MAX_CASCADE_STEPS: usize = 1_000;

/// One round of removal followed by its refill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeStep {
    pub event: ScoreEvent,
    pub refill: RefillReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub outcome: SwapOutcome,
    /// The swap matched nothing and was undone.
    pub reverted: bool,
    pub steps: Vec<CascadeStep>,
}

impl TurnReport {
    pub fn total_points(&self) -> u32 {
        self.steps.iter().map(|s| s.event.points_awarded).sum()
    }

    pub fn cells_removed(&self) -> usize {
        self.steps.iter().map(|s| s.event.cells_removed).sum()
    }

    /// Whether the board changed and scored.
    pub fn scored(&self) -> bool {
        !self.steps.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    grid: Grid,
    rng: SmallRng,
    board: ScoreBoard,
}

impl Engine {
    /// Random match-free board from `seed`.
    pub fn new(config: EngineConfig, seed: u64) -> Result<Self> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let grid = random_layout(&config, &mut rng)?;
        Ok(Self {
            config,
            grid,
            rng,
            board: ScoreBoard::new(config.gem_kinds),
        })
    }

    /// Adopt a prepared board. It may already contain matches; [`Engine::settle`] clears them.
    pub fn with_grid(config: EngineConfig, grid: Grid, seed: u64) -> Result<Self> {
        config.validate()?;
        if (grid.width(), grid.height()) != (config.width, config.height) {
            return Err(EngineError::InvalidConfig(format!(
                "grid is {}x{} but config expects {}x{}",
                grid.width(),
                grid.height(),
                config.width,
                config.height
            )));
        }
        Ok(Self {
            config,
            grid,
            rng: SmallRng::seed_from_u64(seed),
            board: ScoreBoard::new(config.gem_kinds),
        })
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn score(&self) -> &ScoreBoard {
        &self.board
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fresh board and zeroed score.
    pub fn reset(&mut self, seed: u64) -> Result<()> {
        self.rng = SmallRng::seed_from_u64(seed);
        self.grid = random_layout(&self.config, &mut self.rng)?;
        self.board.reset();
        Ok(())
    }

    /// Play one swap through to a stable board.
    ///
    /// A swap that moves a special explodes it at its new cell. Otherwise a swap that makes no
    /// match is swapped back and scores nothing.
    #[instrument(skip(self), fields(score = self.board.total()))]
    pub fn play_turn(&mut self, a: Pos, b: Pos) -> Result<TurnReport> {
        let outcome = try_swap(&mut self.grid, a, b)?;
        let mut report = TurnReport {
            outcome,
            reverted: false,
            steps: Vec::new(),
        };

        match outcome {
            SwapOutcome::Rejected => return Ok(report),
            SwapOutcome::Applied {
                special_involved: true,
            } => {
                if let Some(origin) = blast_origin(&self.grid, a, b) {
                    let event = explode(&mut self.grid, origin, self.config.reward)?;
                    let refill = self.refill(&event)?;
                    self.board.record(&event);
                    report.steps.push(CascadeStep { event, refill });
                }
            }
            SwapOutcome::Applied { .. } => {
                if !has_match(&self.grid) {
                    try_swap(&mut self.grid, a, b)?;
                    warn!(?a, ?b, "swap made no match, reverted");
                    report.reverted = true;
                    return Ok(report);
                }
            }
        }

        report.steps.extend(self.settle()?);
        debug!(
            steps = report.steps.len(),
            points = report.total_points(),
            "turn settled"
        );
        Ok(report)
    }

    /// Resolve matches until none remain. Bombs earned by shapes are placed once the step's
    /// refill has landed.
    pub fn settle(&mut self) -> Result<Vec<CascadeStep>> {
        let mut steps = Vec::new();
        while let Some(m) = find_best_match(&self.grid) {
            if steps.len() >= MAX_CASCADE_STEPS {
                return Err(EngineError::CascadeLimit(MAX_CASCADE_STEPS));
            }
            let event = resolve(&mut self.grid, &m, self.config.reward)?;
            let refill = self.refill(&event)?;
            if let Some(pos) = event.special_spawned {
                spawn_special(&mut self.grid, pos)?;
            }
            self.board.record(&event);
            steps.push(CascadeStep { event, refill });
        }
        Ok(steps)
    }

    fn refill(&mut self, event: &ScoreEvent) -> Result<RefillReport> {
        refill(
            &mut self.grid,
            &event.cleared,
            self.config.gem_kinds,
            &mut self.rng,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Cell, Special};

    fn config(width: usize, height: usize, gem_kinds: u8) -> EngineConfig {
        EngineConfig {
            width,
            height,
            gem_kinds,
            reward: 10,
        }
    }

    fn quiet_board() -> Engine {
        let grid = Grid::from_rows(
            &[[1u8, 1, 2, 3], [2, 3, 1, 4], [3, 4, 2, 1], [4, 2, 3, 2]],
            4,
        )
        .unwrap();
        Engine::with_grid(config(4, 4, 4), grid, 9).unwrap()
    }

    #[test]
    fn test_swap_into_line_of_three() {
        let mut engine = quiet_board();
        let report = engine.play_turn((2, 0), (2, 1)).unwrap();

        assert!(!report.reverted);
        let first = &report.steps[0];
        assert_eq!(first.event.cells_removed, 3);
        assert_eq!(first.event.points_awarded, 10);
        assert_eq!(first.event.special_spawned, None);
        assert_eq!(first.event.cleared, vec![(0, 0), (1, 0), (2, 0)]);
        // Row 0 had nothing above it: three new gems, each falling one row.
        assert!(first.refill.falls.is_empty());
        let landed: Vec<Pos> = first.refill.new_positions().collect();
        assert_eq!(landed, vec![(0, 0), (1, 0), (2, 0)]);
        assert!(first.refill.materialized.iter().all(|m| m.fall_distance == 1));

        assert!(engine.grid().is_full());
        assert_eq!(find_best_match(engine.grid()), None);
        assert_eq!(engine.score().total(), report.total_points());
        assert!(engine.score().removed(1) >= 3);
    }

    #[test]
    fn test_fruitless_swap_is_reverted() {
        let mut engine = quiet_board();
        let before = engine.grid().clone();
        let report = engine.play_turn((0, 0), (0, 1)).unwrap();
        assert!(report.reverted);
        assert!(report.steps.is_empty());
        assert_eq!(engine.grid(), &before);
        assert_eq!(engine.score().total(), 0);
    }

    #[test]
    fn test_rejected_swap_changes_nothing() {
        let mut engine = quiet_board();
        let before = engine.grid().clone();
        let report = engine.play_turn((0, 0), (2, 0)).unwrap();
        assert_eq!(report.outcome, SwapOutcome::Rejected);
        assert!(!report.reverted);
        assert!(!report.scored());
        assert_eq!(engine.grid(), &before);
    }

    #[test]
    fn test_bomb_swap_explodes_at_new_cell() {
        let mut grid = quiet_board().grid().clone();
        grid.set(1, 1, Cell::Special(Special::Bomb)).unwrap();
        let mut engine = Engine::with_grid(config(4, 4, 4), grid, 3).unwrap();

        let report = engine.play_turn((1, 1), (1, 0)).unwrap();
        assert_eq!(
            report.outcome,
            SwapOutcome::Applied {
                special_involved: true
            }
        );
        let blast = &report.steps[0].event;
        // Bomb now at (1, 0): 3×2 clipped area, five gems plus the bomb.
        assert_eq!(blast.cleared.len(), 6);
        assert_eq!(blast.cells_removed, 5);
        assert_eq!(blast.points_awarded, 50);
        assert!(engine.grid().is_full());
    }

    #[test]
    fn test_shape_bomb_placed_after_refill() {
        let grid = Grid::from_rows(
            &[
                [1u8, 1, 1, 2, 3],
                [2, 1, 3, 4, 5],
                [3, 1, 2, 5, 4],
                [5, 2, 4, 3, 1],
                [2, 3, 5, 1, 2],
            ],
            5,
        )
        .unwrap();
        let mut engine = Engine::with_grid(config(5, 5, 5), grid, 11).unwrap();
        let steps = engine.settle().unwrap();

        let first = &steps[0].event;
        assert_eq!(first.cells_removed, 5);
        assert_eq!(first.points_awarded, 40);
        assert_eq!(first.special_spawned, Some((1, 0)));
        // Matches never consume specials, so the bomb survives the rest of the cascade.
        assert!(engine.grid().count_specials() >= 1);
        assert!(engine.grid().is_full());
        assert_eq!(find_best_match(engine.grid()), None);
    }

    #[test]
    fn test_new_and_reset() {
        let mut engine = Engine::new(EngineConfig::default(), 5).unwrap();
        assert_eq!(find_best_match(engine.grid()), None);
        let first = engine.grid().clone();

        engine.reset(6).unwrap();
        assert_ne!(engine.grid(), &first);
        assert_eq!(engine.score().total(), 0);
        assert_eq!(find_best_match(engine.grid()), None);
    }

    #[test]
    fn test_with_grid_size_must_match_config() {
        let grid = Grid::from_rows(&[[1u8, 2, 3], [2, 3, 1], [3, 1, 2]], 3).unwrap();
        assert!(matches!(
            Engine::with_grid(config(4, 3, 3), grid, 0),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_oversized_reward_rejected_before_play() {
        let cfg = EngineConfig {
            reward: u32::MAX / 2 + 1,
            ..config(4, 4, 4)
        };
        assert!(matches!(
            Engine::new(cfg, 1),
            Err(EngineError::InvalidConfig(_))
        ));
        let grid = quiet_board().grid().clone();
        assert!(matches!(
            Engine::with_grid(cfg, grid, 1),
            Err(EngineError::InvalidConfig(_))
        ));
    }
}

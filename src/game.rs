//! Play session: the engine plus level progression, cursor, selection and on-screen feedback.

use gemtui::{ClearTier, Engine, EngineConfig, Pos, TurnReport, swap};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::info;

/// Clearing this many levels wins the game.
pub const LEVELS_TO_WIN: u32 = 3;

/// Popups live this long.
const POPUP_LIFETIME_MS: u32 = 1500;
/// A popup rises one row per this many ms.
const POPUP_RISE_MS: u32 = 300;

/// Score needed to finish `level`.
pub fn level_target(level: u32) -> u32 {
    match level {
        1 => 150,
        2 => 300,
        3 => 700,
        _ => 300,
    }
}

/// 200 s on level 1, a minute less per level, never under 60 s.
pub fn level_time_limit(level: u32) -> Duration {
    let secs = 200u64.saturating_sub(60 * u64::from(level.saturating_sub(1)));
    Duration::from_secs(secs.max(60))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelStatus {
    Running,
    /// Target reached, more levels to go.
    Complete,
    /// Target reached on the last level.
    Won,
    /// Time ran out.
    Failed,
}

#[derive(Debug, Clone)]
pub struct ScorePopup {
    pub x: usize,
    pub y: usize,
    pub amount: u32,
    pub tier: Option<ClearTier>,
    pub age_ms: u32,
}

/// Random score change rolled when a level is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelBonus {
    /// Rolled change: a multiple of 10 in -20..=50.
    pub change: i32,
    /// Change actually applied, after clamping the score at 0.
    applied: i32,
}

impl LevelBonus {
    pub fn message(self) -> String {
        match self.change {
            c if c > 0 => format!("Bonus! Score + {c}!"),
            c if c < 0 => format!("Penalty! Score - {}!", c.unsigned_abs()),
            _ => "No score adjustment this time.".to_string(),
        }
    }
}

/// Options from the command line that shape a session.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub engine: EngineConfig,
    pub seed: u64,
    pub start_level: u32,
    /// Overrides the per-level time limit.
    pub time_limit: Option<Duration>,
}

#[derive(Debug)]
pub struct Session {
    pub engine: Engine,
    config: SessionConfig,
    seed: u64,
    pub level: u32,
    /// Score banked from finished levels.
    carried: u32,
    /// Bonus rolled for the level just cleared, until the next level starts.
    pub bonus: Option<LevelBonus>,
    rng: SmallRng,
    pub cursor: Pos,
    pub selected: Option<Pos>,
    /// Play time on this level; only advances while unpaused.
    pub elapsed: Duration,
    pub popups: Vec<ScorePopup>,
    pub last_tier: Option<ClearTier>,
    /// Cells that got a new gem on the last turn, for the fade-in.
    pub fresh: Vec<Pos>,
    /// Bumped whenever `fresh` changes.
    pub fresh_generation: u64,
}

impl Session {
    pub fn new(config: SessionConfig) -> gemtui::error::Result<Self> {
        let engine = Engine::new(config.engine, config.seed)?;
        let mut session = Self::with_engine(engine, config);
        // The opening board fades in like any refill.
        session.fresh = session.engine.grid().iter().map(|(pos, _)| pos).collect();
        session.fresh_generation = 1;
        Ok(session)
    }

    pub fn with_engine(engine: Engine, config: SessionConfig) -> Self {
        Self {
            engine,
            config,
            seed: config.seed,
            level: config.start_level.max(1),
            carried: 0,
            bonus: None,
            rng: SmallRng::seed_from_u64(config.seed),
            cursor: (0, 0),
            selected: None,
            elapsed: Duration::ZERO,
            popups: Vec::new(),
            last_tier: None,
            fresh: Vec::new(),
            fresh_generation: 0,
        }
    }

    pub fn score(&self) -> u32 {
        let banked = self.carried.saturating_add(self.engine.score().total());
        match self.bonus {
            Some(bonus) => banked.saturating_add_signed(bonus.applied),
            None => banked,
        }
    }

    /// Roll the between-levels bonus once per cleared level and apply it to the score.
    pub fn roll_bonus(&mut self) -> LevelBonus {
        if let Some(bonus) = self.bonus {
            return bonus;
        }
        let change = 10 * self.rng.random_range(-2..=5);
        let floor = i32::try_from(self.score()).map_or(i32::MIN, |s| -s);
        let bonus = LevelBonus {
            change,
            applied: change.max(floor),
        };
        self.bonus = Some(bonus);
        info!(level = self.level, change, score = self.score(), "level bonus");
        bonus
    }

    pub fn target(&self) -> u32 {
        level_target(self.level)
    }

    pub fn time_limit(&self) -> Duration {
        self.config
            .time_limit
            .unwrap_or_else(|| level_time_limit(self.level))
    }

    pub fn time_left(&self) -> Duration {
        self.time_limit().saturating_sub(self.elapsed)
    }

    pub fn status(&self) -> LevelStatus {
        if self.score() >= self.target() {
            if self.level >= LEVELS_TO_WIN {
                LevelStatus::Won
            } else {
                LevelStatus::Complete
            }
        } else if self.elapsed >= self.time_limit() {
            LevelStatus::Failed
        } else {
            LevelStatus::Running
        }
    }

    pub fn tick(&mut self, dt: Duration) {
        self.elapsed += dt;
    }

    pub fn move_cursor(&mut self, dx: isize, dy: isize) {
        let grid = self.engine.grid();
        let x = self.cursor.0.saturating_add_signed(dx).min(grid.width() - 1);
        let y = self.cursor.1.saturating_add_signed(dy).min(grid.height() - 1);
        self.cursor = (x, y);
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Select the gem under the cursor. With a neighbour already selected, play the swap.
    pub fn select(&mut self) -> gemtui::error::Result<Option<TurnReport>> {
        let cursor = self.cursor;
        match self.selected {
            Some(picked) if picked == cursor => {
                self.selected = None;
                Ok(None)
            }
            Some(picked) if swap::is_adjacent(picked, cursor) => {
                self.selected = None;
                let report = self.engine.play_turn(picked, cursor)?;
                self.absorb(&report);
                Ok(Some(report))
            }
            _ => {
                self.selected = Some(cursor);
                Ok(None)
            }
        }
    }

    fn absorb(&mut self, report: &TurnReport) {
        if !report.scored() {
            return;
        }
        self.fresh.clear();
        for step in &report.steps {
            let event = &step.event;
            if let Some(&(x, y)) = event.cleared.first() {
                self.popups.push(ScorePopup {
                    x,
                    y,
                    amount: event.points_awarded,
                    tier: event.tier(),
                    age_ms: 0,
                });
            }
            if event.tier().is_some() {
                self.last_tier = event.tier();
            }
            for pos in step.refill.new_positions() {
                if !self.fresh.contains(&pos) {
                    self.fresh.push(pos);
                }
            }
        }
        self.fresh_generation += 1;
    }

    pub fn next_level(&mut self) -> gemtui::error::Result<()> {
        self.carried = self.score();
        self.bonus = None;
        self.level += 1;
        info!(level = self.level, score = self.carried, "level up");
        self.new_board()
    }

    pub fn restart(&mut self) -> gemtui::error::Result<()> {
        self.carried = 0;
        self.bonus = None;
        self.level = self.config.start_level.max(1);
        self.last_tier = None;
        info!(level = self.level, "restart");
        self.new_board()
    }

    fn new_board(&mut self) -> gemtui::error::Result<()> {
        self.seed = self.seed.wrapping_add(1);
        self.engine.reset(self.seed)?;
        self.elapsed = Duration::ZERO;
        self.selected = None;
        self.popups.clear();
        self.fresh = self.engine.grid().iter().map(|(pos, _)| pos).collect();
        self.fresh_generation += 1;
        Ok(())
    }

    pub fn tick_popups(&mut self, delta_ms: u32) {
        self.popups.retain_mut(|p| {
            let old_steps = p.age_ms / POPUP_RISE_MS;
            p.age_ms += delta_ms;
            if p.age_ms / POPUP_RISE_MS > old_steps {
                p.y = p.y.saturating_sub(1);
            }
            p.age_ms < POPUP_LIFETIME_MS
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemtui::Grid;

    fn config() -> SessionConfig {
        SessionConfig {
            engine: EngineConfig {
                width: 4,
                height: 4,
                gem_kinds: 4,
                reward: 10,
            },
            seed: 9,
            start_level: 1,
            time_limit: None,
        }
    }

    /// One swap away from a line of 1s along the top row.
    fn session() -> Session {
        let grid = Grid::from_rows(
            &[[1u8, 1, 2, 3], [2, 3, 1, 4], [3, 4, 2, 1], [4, 2, 3, 2]],
            4,
        )
        .unwrap();
        let engine = Engine::with_grid(config().engine, grid, 9).unwrap();
        Session::with_engine(engine, config())
    }

    #[test]
    fn test_level_policy() {
        assert_eq!(level_target(1), 150);
        assert_eq!(level_target(3), 700);
        assert_eq!(level_target(8), 300);
        assert_eq!(level_time_limit(1), Duration::from_secs(200));
        assert_eq!(level_time_limit(2), Duration::from_secs(140));
        assert_eq!(level_time_limit(3), Duration::from_secs(80));
        assert_eq!(level_time_limit(4), Duration::from_secs(60));
        assert_eq!(level_time_limit(12), Duration::from_secs(60));
    }

    #[test]
    fn test_cursor_stays_on_board() {
        let mut s = session();
        s.move_cursor(-1, -1);
        assert_eq!(s.cursor, (0, 0));
        for _ in 0..10 {
            s.move_cursor(1, 1);
        }
        assert_eq!(s.cursor, (3, 3));
    }

    #[test]
    fn test_selection_toggles_and_moves() {
        let mut s = session();
        assert!(s.select().unwrap().is_none());
        assert_eq!(s.selected, Some((0, 0)));
        assert!(s.select().unwrap().is_none());
        assert_eq!(s.selected, None);

        s.select().unwrap();
        s.move_cursor(2, 0);
        // Not adjacent: selection jumps to the cursor.
        assert!(s.select().unwrap().is_none());
        assert_eq!(s.selected, Some((2, 0)));
        s.deselect();
        assert_eq!(s.selected, None);
    }

    #[test]
    fn test_matching_swap_scores_and_pops() {
        let mut s = session();
        s.move_cursor(2, 0);
        s.select().unwrap();
        s.move_cursor(0, 1);
        let report = s.select().unwrap().unwrap();
        assert!(report.scored());
        assert_eq!(s.selected, None);
        assert!(s.score() >= 10);
        assert_eq!(s.popups[0].amount, 10);
        assert_eq!(s.popups[0].tier, Some(ClearTier::Three));
        assert!(s.fresh.contains(&(0, 0)));
        assert_eq!(s.fresh_generation, 1);
    }

    #[test]
    fn test_status_transitions() {
        let mut s = session();
        assert_eq!(s.status(), LevelStatus::Running);
        s.tick(Duration::from_secs(201));
        assert_eq!(s.status(), LevelStatus::Failed);

        s.carried = 150;
        assert_eq!(s.status(), LevelStatus::Complete);
        s.next_level().unwrap();
        assert_eq!(s.level, 2);
        assert_eq!(s.elapsed, Duration::ZERO);
        assert_eq!(s.score(), 150);

        s.level = LEVELS_TO_WIN;
        s.carried = 700;
        assert_eq!(s.status(), LevelStatus::Won);

        s.restart().unwrap();
        assert_eq!((s.level, s.score()), (1, 0));
    }

    #[test]
    fn test_level_bonus_applied_once_and_carried() {
        let mut s = session();
        s.carried = 150;
        let bonus = s.roll_bonus();
        assert_eq!(bonus.change % 10, 0);
        assert!((-20..=50).contains(&bonus.change));
        let adjusted = s.score();
        assert_eq!(i64::from(adjusted), 150 + i64::from(bonus.change));
        assert_eq!(s.roll_bonus(), bonus);
        assert_eq!(s.score(), adjusted);

        s.next_level().unwrap();
        assert_eq!(s.bonus, None);
        assert_eq!(s.score(), adjusted);
    }

    #[test]
    fn test_level_penalty_clamps_score_at_zero() {
        let mut penalised = 0;
        for seed in 0..64 {
            let mut s = Session::with_engine(
                session().engine,
                SessionConfig {
                    seed,
                    ..config()
                },
            );
            s.carried = 10;
            let bonus = s.roll_bonus();
            let expected = (10 + i64::from(bonus.change)).max(0);
            assert_eq!(i64::from(s.score()), expected);
            if bonus.change < 0 {
                penalised += 1;
                assert!(bonus.message().starts_with("Penalty! Score - "));
            }
        }
        assert!(penalised > 0);
    }

    #[test]
    fn test_bonus_messages() {
        let msg = |change| LevelBonus { change, applied: change }.message();
        assert_eq!(msg(30), "Bonus! Score + 30!");
        assert_eq!(msg(-20), "Penalty! Score - 20!");
        assert_eq!(msg(0), "No score adjustment this time.");
    }

    #[test]
    fn test_popups_rise_and_expire() {
        let mut s = session();
        s.popups.push(ScorePopup {
            x: 1,
            y: 3,
            amount: 10,
            tier: None,
            age_ms: 0,
        });
        s.tick_popups(POPUP_RISE_MS);
        assert_eq!(s.popups[0].y, 2);
        s.tick_popups(POPUP_LIFETIME_MS);
        assert!(s.popups.is_empty());
    }
}

//! Engine configuration: board size, gem alphabet and per-piece reward.

use crate::error::{EngineError, Result};

/// Smallest board edge: shapes and lines need three cells.
pub const MIN_EDGE: usize = 3;
/// Largest board edge accepted.
pub const MAX_EDGE: usize = 64;
/// At least three kinds are needed to lay out a board with no line of three.
pub const MIN_GEM_KINDS: u8 = 3;
pub const MAX_GEM_KINDS: u8 = 9;
/// Largest reward for which a ×4 line or a full-board explosion still fits in `u32`.
pub const MAX_REWARD: u32 = u32::MAX / (4 * (MAX_EDGE * MAX_EDGE) as u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Columns (W).
    pub width: usize,
    /// Rows (H).
    pub height: usize,
    /// Gem alphabet size K; gems are typed `1..=K`.
    pub gem_kinds: u8,
    /// Points per piece before the length multiplier.
    pub reward: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            gem_kinds: 7,
            reward: 10,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_EDGE..=MAX_EDGE).contains(&self.width) {
            return Err(EngineError::InvalidConfig(format!(
                "width {} not in {MIN_EDGE}..={MAX_EDGE}",
                self.width
            )));
        }
        if !(MIN_EDGE..=MAX_EDGE).contains(&self.height) {
            return Err(EngineError::InvalidConfig(format!(
                "height {} not in {MIN_EDGE}..={MAX_EDGE}",
                self.height
            )));
        }
        if !(MIN_GEM_KINDS..=MAX_GEM_KINDS).contains(&self.gem_kinds) {
            return Err(EngineError::InvalidConfig(format!(
                "gem kinds {} not in {MIN_GEM_KINDS}..={MAX_GEM_KINDS}",
                self.gem_kinds
            )));
        }
        if self.reward > MAX_REWARD {
            return Err(EngineError::InvalidConfig(format!(
                "reward {} above {MAX_REWARD}",
                self.reward
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_two_kinds() {
        let cfg = EngineConfig {
            gem_kinds: 2,
            ..EngineConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_narrow_board() {
        let cfg = EngineConfig {
            width: 2,
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_reward_bound() {
        let mut cfg = EngineConfig {
            width: MAX_EDGE,
            height: MAX_EDGE,
            reward: MAX_REWARD,
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_ok());
        let full_board = u64::from(cfg.reward) * 4 * (MAX_EDGE * MAX_EDGE) as u64;
        assert!(full_board <= u64::from(u32::MAX));

        cfg.reward = u32::MAX / 2 + 1;
        assert!(matches!(cfg.validate(), Err(EngineError::InvalidConfig(_))));
        cfg.reward = MAX_REWARD + 1;
        assert!(cfg.validate().is_err());
    }
}

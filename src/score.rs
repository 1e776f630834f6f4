//! Score math and the running score board.

use crate::grid::GemKind;
use crate::resolver::ScoreEvent;

/// Length multiplier: 1 for a three, 2 for a four, 4 for five or more.
pub fn multiplier(length: usize) -> u32 {
    match length {
        0..=3 => 1,
        4 => 2,
        _ => 4,
    }
}

/// Points for a line of `length` (or a shape, scored as length five).
/// Saturates for rewards above [`crate::config::MAX_REWARD`].
pub fn line_points(reward: u32, length: usize) -> u32 {
    reward.saturating_mul(multiplier(length))
}

/// Size tier of a clear, used by the presentation layer to pick sounds and colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClearTier {
    Three,
    Four,
    FivePlus,
}

impl ClearTier {
    /// `None` below three cells.
    pub fn from_count(cells_removed: usize) -> Option<Self> {
        match cells_removed {
            0..=2 => None,
            3 => Some(Self::Three),
            4 => Some(Self::Four),
            _ => Some(Self::FivePlus),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Three => "Nice",
            Self::Four => "Great",
            Self::FivePlus => "Excellent",
        }
    }
}

/// Running total and per-kind removal counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreBoard {
    total: u32,
    /// removed[k - 1] = gems of kind k removed so far.
    removed: Vec<u32>,
    events: u32,
}

impl ScoreBoard {
    pub fn new(gem_kinds: u8) -> Self {
        Self {
            total: 0,
            removed: vec![0; gem_kinds as usize],
            events: 0,
        }
    }

    pub fn record(&mut self, event: &ScoreEvent) {
        self.total = self.total.saturating_add(event.points_awarded);
        self.events += 1;
        for &kind in &event.removed_gems {
            if let Some(slot) = self.removed.get_mut(usize::from(kind).wrapping_sub(1)) {
                *slot += 1;
            }
        }
    }

    #[inline]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Gems of `kind` removed so far (0 for kinds outside the alphabet).
    pub fn removed(&self, kind: GemKind) -> u32 {
        usize::from(kind)
            .checked_sub(1)
            .and_then(|i| self.removed.get(i))
            .copied()
            .unwrap_or(0)
    }

    /// `(kind, count)` for every kind in the alphabet.
    pub fn removed_by_kind(&self) -> impl Iterator<Item = (GemKind, u32)> + '_ {
        self.removed
            .iter()
            .enumerate()
            .map(|(i, &n)| ((i + 1) as GemKind, n))
    }

    /// Number of score events folded in.
    pub fn events(&self) -> u32 {
        self.events
    }

    pub fn reset(&mut self) {
        self.total = 0;
        self.events = 0;
        self.removed.iter_mut().for_each(|n| *n = 0);
    }
}

//! Adjacent swaps.

use crate::error::Result;
use crate::grid::{Grid, Pos};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Identical or non-adjacent positions; the grid is untouched.
    Rejected,
    /// Cells exchanged. `special_involved` routes the turn to the chain engine.
    Applied { special_involved: bool },
}

impl SwapOutcome {
    #[inline]
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Exactly one axis differs, by one.
#[inline]
pub fn is_adjacent(a: Pos, b: Pos) -> bool {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1) == 1
}

/// Swap two 4-adjacent pieces.
///
/// Out-of-bounds positions are an error, as is either cell being empty. Whether the swap
/// produces a match is not checked here; reverting a fruitless swap is the caller's policy.
pub fn try_swap(grid: &mut Grid, a: Pos, b: Pos) -> Result<SwapOutcome> {
    let (ca, cb) = (grid.get(a.0, a.1)?, grid.get(b.0, b.1)?);
    if !is_adjacent(a, b) {
        trace!(?a, ?b, "swap rejected");
        return Ok(SwapOutcome::Rejected);
    }
    grid.piece(a.0, a.1)?;
    grid.piece(b.0, b.1)?;
    grid.swap(a, b)?;
    Ok(SwapOutcome::Applied {
        special_involved: ca.is_special() || cb.is_special(),
    })
}

/// After an applied swap, where the explosion starts: the special's new cell. `b` wins when
/// both cells hold one.
pub fn blast_origin(grid: &Grid, a: Pos, b: Pos) -> Option<Pos> {
    [b, a]
        .into_iter()
        .find(|&(x, y)| grid.get(x, y).is_ok_and(|c| c.is_special()))
}

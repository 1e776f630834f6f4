//! Initial board generation.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::grid::{Cell, GemKind, Grid};
use rand::Rng;
use tracing::debug;

/// Fill a fresh grid with random gems such that no line (and so no shape) exists.
///
/// Cells are filled left to right, top to bottom; a kind is excluded when the two cells to the
/// left, or the two above, already hold it. At most two kinds are ever excluded, so three kinds
/// always leave a choice.
pub fn random_layout<R: Rng>(config: &EngineConfig, rng: &mut R) -> Result<Grid> {
    config.validate()?;
    let mut grid = Grid::new(config.width, config.height);
    let mut candidates: Vec<GemKind> = Vec::with_capacity(config.gem_kinds as usize);

    for y in 0..config.height {
        for x in 0..config.width {
            let (xi, yi) = (x as isize, y as isize);
            let left = pair(grid.gem_at(xi - 1, yi), grid.gem_at(xi - 2, yi));
            let above = pair(grid.gem_at(xi, yi - 1), grid.gem_at(xi, yi - 2));

            candidates.clear();
            candidates.extend(
                (1..=config.gem_kinds).filter(|&k| left != Some(k) && above != Some(k)),
            );
            let kind = candidates[rng.random_range(0..candidates.len())];
            grid.set(x, y, Cell::Gem(kind))?;
        }
    }

    debug!(
        width = config.width,
        height = config.height,
        kinds = config.gem_kinds,
        "generated layout"
    );
    Ok(grid)
}

/// The kind both cells share, if they do.
#[inline]
fn pair(a: Option<GemKind>, b: Option<GemKind>) -> Option<GemKind> {
    a.filter(|_| a == b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::matcher::find_best_match;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_default_layout_is_full_and_in_range() {
        let config = EngineConfig::default();
        let g = random_layout(&config, &mut SmallRng::seed_from_u64(1)).unwrap();
        assert_eq!((g.width(), g.height()), (10, 10));
        assert!(g.is_full());
        assert!(
            g.iter()
                .all(|(_, c)| c.gem().is_some_and(|k| (1..=7).contains(&k)))
        );
        assert_eq!(find_best_match(&g), None);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let config = EngineConfig::default();
        let a = random_layout(&config, &mut SmallRng::seed_from_u64(42)).unwrap();
        let b = random_layout(&config, &mut SmallRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            gem_kinds: 2,
            ..EngineConfig::default()
        };
        assert!(matches!(
            random_layout(&config, &mut SmallRng::seed_from_u64(0)),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_layouts_start_without_matches(
            seed in any::<u64>(),
            width in 3usize..16,
            height in 3usize..16,
            gem_kinds in 3u8..=9,
        ) {
            let config = EngineConfig { width, height, gem_kinds, ..EngineConfig::default() };
            let g = random_layout(&config, &mut SmallRng::seed_from_u64(seed)).unwrap();
            prop_assert!(g.is_full());
            prop_assert_eq!(find_best_match(&g), None);
        }
    }
}

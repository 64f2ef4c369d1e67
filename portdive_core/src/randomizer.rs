//! Seeded integer sampler with index exclusion.
//!
//! Every random decision of a session (key row, pwner fragments, reshuffle
//! counts and columns) is drawn from one `Randomizer`, so a session is fully
//! reproducible from its seed.

use crate::error::GameError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic sampler backed by ChaCha8.
#[derive(Debug, Clone)]
pub struct Randomizer {
    seed: u64,
    rng: ChaCha8Rng,
}

impl Randomizer {
    /// Creates a sampler whose sequence is fixed by `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Returns the seed this sampler was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draws a value from `[low, high]` that is not in `excluded`.
    ///
    /// The draw is uniform over the reduced range `[low, high - |excluded|]`
    /// and then shifted forward past every excluded value it reaches, which
    /// yields a uniform distribution over the allowed values.
    ///
    /// `excluded` must be sorted ascending, free of duplicates and inside
    /// `[low, high]`.
    pub fn sample_excluding(
        &mut self,
        low: usize,
        high: usize,
        excluded: &[usize],
    ) -> Result<usize, GameError> {
        if low > high {
            return Err(GameError::InvalidRange { low, high });
        }
        if excluded.len() > high - low {
            return Err(GameError::ExclusionTooLarge {
                excluded: excluded.len(),
                low,
                high,
            });
        }
        debug_assert!(
            excluded.windows(2).all(|w| w[0] < w[1]),
            "exclusions must be sorted and unique"
        );
        debug_assert!(
            excluded.iter().all(|&ex| (low..=high).contains(&ex)),
            "exclusions must lie inside the sampled range"
        );

        let mut value = self.rng.gen_range(low..=high - excluded.len());
        for &ex in excluded {
            if value < ex {
                break;
            }
            value += 1;
        }
        Ok(value)
    }

    /// Draws a value from `[low, high]` with nothing excluded.
    pub fn sample(&mut self, low: usize, high: usize) -> Result<usize, GameError> {
        self.sample_excluding(low, high, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sample_skips_excluded_values() {
        let mut rng = Randomizer::new(42);
        for _ in 0..1000 {
            let v = rng.sample_excluding(0, 9, &[2, 5, 7]).unwrap();
            assert!([0, 1, 3, 4, 6, 8, 9].contains(&v), "drew {v}");
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = Randomizer::new(7);
        let mut b = Randomizer::new(7);
        let seq_a: Vec<_> = (0..50).map(|_| a.sample(0, 100).unwrap()).collect();
        let seq_b: Vec<_> = (0..50).map(|_| b.sample(0, 100).unwrap()).collect();
        assert_eq!(seq_a, seq_b);
        assert_eq!(a.seed(), 7);
    }

    #[test]
    fn test_degenerate_ranges() {
        let mut rng = Randomizer::new(1);
        assert_eq!(rng.sample(3, 3).unwrap(), 3);
        // Only one allowed value remains
        assert_eq!(rng.sample_excluding(0, 2, &[0, 2]).unwrap(), 1);
        assert_eq!(rng.sample_excluding(0, 2, &[0, 1]).unwrap(), 2);
    }

    #[test]
    fn test_precondition_violations_are_reported() {
        let mut rng = Randomizer::new(1);
        assert!(matches!(
            rng.sample_excluding(0, 2, &[0, 1, 2]),
            Err(GameError::ExclusionTooLarge { excluded: 3, .. })
        ));
        assert!(matches!(
            rng.sample(5, 4),
            Err(GameError::InvalidRange { low: 5, high: 4 })
        ));
    }

    #[test]
    fn test_uniform_over_allowed_values_chi_square() {
        // One draw per independent seed
        let allowed = [0usize, 1, 3, 4, 6, 8, 9];
        let draws = 7_000u64;
        let mut counts = [0u64; 10];
        for seed in 0..draws {
            let mut rng = Randomizer::new(seed);
            counts[rng.sample_excluding(0, 9, &[2, 5, 7]).unwrap()] += 1;
        }
        assert_eq!(counts[2] + counts[5] + counts[7], 0);

        let expected = draws as f64 / allowed.len() as f64;
        let chi_square: f64 = allowed
            .iter()
            .map(|&v| {
                let diff = counts[v] as f64 - expected;
                diff * diff / expected
            })
            .sum();
        // df = 6, p = 0.001
        assert!(chi_square < 22.46, "chi-square {chi_square} too large: {counts:?}");
    }

    proptest! {
        #[test]
        fn prop_never_returns_excluded(
            seed in any::<u64>(),
            high in 1usize..40,
            picks in proptest::collection::btree_set(0usize..40, 0..20),
        ) {
            let excluded: Vec<usize> = picks
                .into_iter()
                .filter(|&v| v <= high)
                .take(high)
                .collect();
            let mut rng = Randomizer::new(seed);
            let v = rng.sample_excluding(0, high, &excluded).unwrap();
            prop_assert!(v <= high);
            prop_assert!(!excluded.contains(&v));
        }
    }
}

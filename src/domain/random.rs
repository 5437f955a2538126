/// Weighted choice over a small set of items.
///
/// Weights need not sum to 1. A draw picks a point in `[0, total)` and
/// returns the item whose cumulative interval contains it, so with a
/// seeded `Rng` the sequence of samples is reproducible.

use rand::Rng;

use crate::error::{SimError, SimResult};

#[derive(Clone, Debug)]
pub struct WeightedRandomizer<T> {
    entries: Vec<(T, f64)>,
    total: f64,
}

impl<T> Default for WeightedRandomizer<T> {
    fn default() -> Self {
        WeightedRandomizer { entries: Vec::new(), total: 0.0 }
    }
}

impl<T: Clone + PartialEq> WeightedRandomizer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `weight` for `item`. Repeated items accumulate weight.
    /// Negative weights count as zero.
    pub fn add_chance(&mut self, item: T, weight: f64) {
        let weight = weight.max(0.0);
        match self.entries.iter_mut().find(|(existing, _)| *existing == item) {
            Some((_, w)) => *w += weight,
            None => self.entries.push((item, weight)),
        }
        self.total += weight;
    }

    pub fn total_weight(&self) -> f64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total <= 0.0
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> SimResult<T> {
        if self.is_empty() {
            return Err(SimError::EmptyDistribution);
        }
        if !self.total.is_finite() {
            return Err(SimError::Configuration(format!("total weight {} is not finite", self.total)));
        }
        let draw = rng.gen_range(0.0..self.total);
        let mut cumulative = 0.0;
        for (item, weight) in &self.entries {
            cumulative += weight;
            if draw < cumulative {
                return Ok(item.clone());
            }
        }
        // Float rounding can leave `draw` a hair past the last bound.
        self.entries
            .iter()
            .rev()
            .find(|(_, w)| *w > 0.0)
            .map(|(item, _)| item.clone())
            .ok_or(SimError::EmptyDistribution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_isaac::Isaac64Rng;

    #[test]
    fn empty_randomizer_fails() {
        let r: WeightedRandomizer<&str> = WeightedRandomizer::new();
        let mut rng = Isaac64Rng::seed_from_u64(1);
        assert_eq!(r.sample(&mut rng), Err(SimError::EmptyDistribution));
    }

    #[test]
    fn zero_weight_randomizer_fails() {
        let mut r = WeightedRandomizer::new();
        r.add_chance("a", 0.0);
        r.add_chance("b", -3.0);
        let mut rng = Isaac64Rng::seed_from_u64(1);
        assert_eq!(r.sample(&mut rng), Err(SimError::EmptyDistribution));
    }

    #[test]
    fn overflowing_total_is_an_error() {
        let mut r = WeightedRandomizer::new();
        r.add_chance("a", 1e308);
        r.add_chance("b", 1e308);
        let mut rng = Isaac64Rng::seed_from_u64(1);
        assert!(matches!(r.sample(&mut rng), Err(SimError::Configuration(_))));
    }

    #[test]
    fn single_item_always_wins() {
        let mut r = WeightedRandomizer::new();
        r.add_chance("a", 0.0);
        r.add_chance("b", 2.5);
        let mut rng = Isaac64Rng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(r.sample(&mut rng).unwrap(), "b");
        }
    }

    #[test]
    fn duplicate_items_accumulate() {
        let mut r = WeightedRandomizer::new();
        r.add_chance(1, 2.0);
        r.add_chance(2, 1.0);
        r.add_chance(1, 3.0);
        assert_eq!(r.total_weight(), 6.0);
        assert_eq!(r.entries.len(), 2);
        assert_eq!(r.entries[0], (1, 5.0));
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut r = WeightedRandomizer::new();
        r.add_chance('x', 1.0);
        r.add_chance('y', 2.0);
        r.add_chance('z', 3.0);

        let mut a = Isaac64Rng::seed_from_u64(42);
        let mut b = Isaac64Rng::seed_from_u64(42);
        let seq_a: Vec<char> = (0..50).map(|_| r.sample(&mut a).unwrap()).collect();
        let seq_b: Vec<char> = (0..50).map(|_| r.sample(&mut b).unwrap()).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn draws_follow_weights_roughly() {
        let mut r = WeightedRandomizer::new();
        r.add_chance("rare", 1.0);
        r.add_chance("common", 9.0);
        let mut rng = Isaac64Rng::seed_from_u64(3);
        let rare = (0..10_000)
            .filter(|_| r.sample(&mut rng).unwrap() == "rare")
            .count();
        assert!((700..1300).contains(&rare), "rare drawn {rare} times");
    }
}

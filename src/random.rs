use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the random draws used by spawn generation and capture.
///
/// Engines take this instead of a concrete RNG so tests can script every
/// draw and force the rare branches deterministically.
pub trait RandomSource: Send {
    /// Uniform draw in `[0, 1)`.
    fn roll(&mut self) -> f64;

    /// Uniform draw in `[1, upper]`.
    fn pick_id(&mut self, upper: u32) -> u32;
}

impl RandomSource for StdRng {
    fn roll(&mut self) -> f64 {
        self.random::<f64>()
    }

    fn pick_id(&mut self, upper: u32) -> u32 {
        self.random_range(1..=upper.max(1))
    }
}

impl<T: RandomSource + ?Sized> RandomSource for Box<T> {
    fn roll(&mut self) -> f64 {
        (**self).roll()
    }

    fn pick_id(&mut self, upper: u32) -> u32 {
        (**self).pick_id(upper)
    }
}

pub fn seeded(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Replays fixed rolls and ids, then falls back to a seeded generator.
pub struct ScriptedRandom {
    rolls: VecDeque<f64>,
    ids: VecDeque<u32>,
    fallback: StdRng,
}

impl ScriptedRandom {
    pub fn new(rolls: impl IntoIterator<Item = f64>, ids: impl IntoIterator<Item = u32>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            ids: ids.into_iter().collect(),
            fallback: StdRng::seed_from_u64(0),
        }
    }

    pub fn remaining_rolls(&self) -> usize {
        self.rolls.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn roll(&mut self) -> f64 {
        self.rolls.pop_front().unwrap_or_else(|| self.fallback.roll())
    }

    fn pick_id(&mut self, upper: u32) -> u32 {
        match self.ids.pop_front() {
            Some(id) => id.clamp(1, upper.max(1)),
            None => self.fallback.pick_id(upper),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_rng_ranges() {
        let mut rng = seeded(Some(7));
        for _ in 0..1000 {
            let roll = rng.roll();
            assert!((0.0..1.0).contains(&roll));
            let id = rng.pick_id(251);
            assert!((1..=251).contains(&id));
        }
    }

    #[test]
    fn test_scripted_replays_then_falls_back() {
        let mut random = ScriptedRandom::new([0.1, 0.9], [25]);
        assert_eq!(random.roll(), 0.1);
        assert_eq!(random.roll(), 0.9);
        assert_eq!(random.pick_id(251), 25);
        assert_eq!(random.remaining_rolls(), 0);
        assert!((0.0..1.0).contains(&random.roll()));
    }
}

//! Entropy sources for digit synthesis.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Debug;
use std::sync::Mutex;

/// A source of uniformly distributed random integers.
///
/// The engine only ever asks for small bounded values, so the contract is
/// a single bounded draw. Implementations must be shareable across request
/// tasks.
pub trait RandomSource: Send + Sync + Debug {
    /// Returns a value in `0..upper`. Returns 0 when `upper <= 1`.
    fn below(&self, upper: u32) -> u32;
}

/// Uses the thread-local RNG on each call.
///
/// Zero-sized; the RNG itself is never stored, so this is freely shared.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn below(&self, upper: u32) -> u32 {
        if upper <= 1 {
            return 0;
        }
        rand::thread_rng().gen_range(0..upper)
    }
}

/// Deterministic source seeded once. Identical seeds yield identical draws.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn below(&self, upper: u32) -> u32 {
        if upper <= 1 {
            return 0;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_range(0..upper)
    }
}

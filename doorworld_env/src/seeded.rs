//! Seeded random stream for deterministic simulation.

use crate::{EnvError, RandomStream};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Random stream backed by a seeded ChaCha8 RNG.
///
/// Two streams built from the same seed produce the same sequence, which
/// makes every trial reproducible from its seed number.
#[derive(Debug, Clone)]
pub struct SeededStream {
    /// Seed this stream was created from
    seed: u64,

    /// Deterministic RNG
    rng: ChaCha8Rng,
}

impl SeededStream {
    /// Creates a new stream with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Derives the seed of child stream `stream`.
    ///
    /// `master_seed * golden_ratio + stream * prime`, so adding more
    /// streams never changes the seeds of existing ones.
    pub fn child_seed(master_seed: u64, stream: u64) -> u64 {
        master_seed
            .wrapping_mul(0x9e3779b97f4a7c15)
            .wrapping_add(stream.wrapping_mul(0x517cc1b727220a95))
    }
}

impl RandomStream for SeededStream {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn fork(&self, stream: u64) -> Result<Self, EnvError> {
        Ok(Self::new(Self::child_seed(self.seed, stream)))
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

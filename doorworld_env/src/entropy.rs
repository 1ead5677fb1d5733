//! Production random stream seeded from OS entropy.

use crate::{EnvError, RandomStream};
use rand::rngs::OsRng;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Random stream seeded from the operating system.
///
/// This is the "real" stream used when a trial does not need to be
/// reproduced. Failing to obtain entropy is fatal: there is no fallback
/// to a fixed seed.
#[derive(Debug, Clone)]
pub struct EntropyStream {
    rng: ChaCha8Rng,
}

impl EntropyStream {
    /// Creates a new stream seeded from `OsRng`.
    pub fn new() -> Result<Self, EnvError> {
        let rng = ChaCha8Rng::from_rng(OsRng).map_err(EnvError::entropy)?;
        Ok(Self { rng })
    }
}

impl RandomStream for EntropyStream {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn fork(&self, _stream: u64) -> Result<Self, EnvError> {
        // Production children are freshly seeded, not derived
        Self::new()
    }

    fn seed(&self) -> u64 {
        0
    }
}

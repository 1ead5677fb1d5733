//! Core randomness trait for doorworld engines.

use crate::EnvError;

/// The single source of randomness for a simulation.
///
/// This trait abstracts where entropy comes from so that the same engine
/// runs reproducibly under test and freely in production.
///
/// # Implementations
///
/// - **Simulation**: `SeededStream` - `ChaCha8Rng(seed)`
/// - **Production**: `EntropyStream` - `ChaCha8Rng` seeded from `OsRng`
///
/// # Determinism
///
/// A stream is cloned together with the engine that owns it. Cloning
/// duplicates the stream state, so a clone replays the same draws. Use
/// `fork` when an independent stream is wanted instead.
pub trait RandomStream: Clone + Send + 'static {
    /// Returns a uniform sample from `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Returns `true` with probability `p`.
    ///
    /// `p <= 0` never fires and `p >= 1` always fires.
    fn bernoulli(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Derives an independent child stream.
    ///
    /// Seeded implementations combine the master seed with `stream` so the
    /// child only depends on `(seed, stream)`, never on how many values the
    /// parent has already produced.
    fn fork(&self, stream: u64) -> Result<Self, EnvError>;

    /// Returns the stream's seed (for logging/debugging).
    ///
    /// Unseeded streams return 0.
    fn seed(&self) -> u64;
}

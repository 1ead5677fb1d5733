//! doorworld Environment Abstraction Layer
//!
//! This crate holds the pieces every doorworld engine shares but does not
//! own: grid geometry (`Location`, `Action`) and the source of randomness.
//!
//! # Core Concept: Explicit Random Streams
//!
//! Every stochastic decision in a simulation (agent stalls, door toggles)
//! is drawn from a `RandomStream` handed to the engine at construction:
//! - **Simulation**: `SeededStream` - ChaCha8 seeded from a single `u64`
//! - **Production**: `EntropyStream` - ChaCha8 seeded from OS entropy
//!
//! Monte-Carlo workers never share a stream. Each one gets its own child
//! via `RandomStream::fork`, so batches are reproducible from their seed
//! no matter how they are scheduled.
//!
//! # Example
//!
//! ```ignore
//! use doorworld_env::{RandomStream, SeededStream};
//!
//! let mut rng = SeededStream::new(42);
//! let stalled = rng.bernoulli(0.12);
//! let worker_rng = rng.fork(7)?;
//! ```

mod context;
mod entropy;
mod error;
mod seeded;
mod types;

pub use context::RandomStream;
pub use entropy::EntropyStream;
pub use error::EnvError;
pub use seeded::SeededStream;
pub use types::{Action, Location};

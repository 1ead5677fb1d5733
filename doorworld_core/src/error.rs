//! Error types for the simulation core.

use doorworld_env::{EnvError, Location};
use thiserror::Error;

/// Errors surfaced by grid construction, planning and Monte-Carlo batches.
#[derive(Debug, Error)]
pub enum SimError {
    /// The grid description cannot produce a valid grid (bad dimensions,
    /// missing goal, door/layout mismatch, ...)
    #[error("Invalid grid description: {0}")]
    InvalidGridDescription(String),

    /// No path exists between the two locations
    #[error("Goal {to} unreachable from {from}")]
    UnreachableGoal { from: Location, to: Location },

    /// A simulation parameter violates its precondition
    #[error("Invalid simulation config: {0}")]
    InvalidSimulationConfig(String),

    /// The random stream could not be created
    #[error(transparent)]
    Env(#[from] EnvError),
}

impl SimError {
    /// Creates a grid description error.
    pub fn grid(msg: impl Into<String>) -> Self {
        Self::InvalidGridDescription(msg.into())
    }

    /// Creates a simulation config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidSimulationConfig(msg.into())
    }
}

/// Checks that `p` is a probability, naming it in the error otherwise.
pub(crate) fn check_probability(name: &str, p: f64) -> Result<f64, SimError> {
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(SimError::config(format!("{} must be in [0, 1], got {}", name, p)))
    }
}

//! Error types for the doorworld environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The operating system could not provide entropy to seed a stream
    #[error("Entropy unavailable: {0}")]
    EntropyUnavailable(String),
}

impl EnvError {
    /// Creates an entropy error.
    pub fn entropy(msg: impl std::fmt::Display) -> Self {
        Self::EntropyUnavailable(msg.to_string())
    }
}

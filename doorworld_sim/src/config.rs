//! Harness configuration.

use doorworld_core::SimError;
use doorworld_env::SeededStream;
use serde::{Deserialize, Serialize};

/// Configuration for a batch of trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Master seed; each trial derives its own seed from this
    pub seed: u64,

    /// Chance the agent forgoes its action on a step
    pub stall_probability: f64,

    /// Overrides every door's toggle probability when set
    pub door_probability: Option<f64>,

    /// Simulations per Monte-Carlo batch
    pub num_simulations: usize,

    /// Run the counterfactual model
    pub counterfactual: bool,

    /// Run the hypothetical model
    pub hypothetical: bool,

    /// Spread Monte-Carlo batches over the rayon thread pool
    pub parallel: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            stall_probability: 0.12,
            door_probability: None,
            num_simulations: 1000,
            counterfactual: true,
            hypothetical: true,
            parallel: false,
        }
    }
}

impl SimConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_stall_probability(mut self, p: f64) -> Self {
        self.stall_probability = p;
        self
    }

    pub fn with_door_probability(mut self, p: f64) -> Self {
        self.door_probability = Some(p);
        self
    }

    pub fn with_simulations(mut self, n: usize) -> Self {
        self.num_simulations = n;
        self
    }

    pub fn with_models(mut self, counterfactual: bool, hypothetical: bool) -> Self {
        self.counterfactual = counterfactual;
        self.hypothetical = hypothetical;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Seed for trial `num`, independent of how many trials run.
    pub fn trial_seed(&self, num: u32) -> u64 {
        SeededStream::child_seed(self.seed, num as u64)
    }

    /// Checks probabilities and batch size.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(0.0..=1.0).contains(&self.stall_probability) {
            return Err(SimError::config(format!(
                "stall_probability must be in [0, 1], got {}",
                self.stall_probability
            )));
        }
        if let Some(p) = self.door_probability {
            if !(0.0..=1.0).contains(&p) {
                return Err(SimError::config(format!(
                    "door_probability must be in [0, 1], got {}",
                    p
                )));
            }
        }
        if (self.counterfactual || self.hypothetical) && self.num_simulations == 0 {
            return Err(SimError::config("num_simulations must be at least 1"));
        }
        Ok(())
    }
}

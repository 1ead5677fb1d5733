//! doorworld Trial Harness
//!
//! Runs whole trials end to end: the ground-truth run replays the trial's
//! door schedule, then the counterfactual and hypothetical models estimate
//! how the other agent would have fared.
//!
//! # Determinism
//!
//! Every trial draws from its own stream, derived from the master seed and
//! the trial number. The models fork their streams off the trial's stream,
//! so the same configuration always produces the same reports.
//!
//! # Usage
//!
//! ```ignore
//! use doorworld_sim::{ScenarioId, SimConfig, TrialRunner};
//!
//! let config = SimConfig {
//!     seed: 42,
//!     num_simulations: 1000,
//!     ..Default::default()
//! };
//!
//! let runner = TrialRunner::new(config)?;
//! let report = runner.run_scenario(ScenarioId::TwoDoors)?;
//! println!("counterfactual: {:?}", report.counterfactual);
//! ```

mod config;
mod runner;
pub mod scenarios;

pub use config::SimConfig;
pub use runner::{TrialReport, TrialRunner};
pub use scenarios::{Scenario, ScenarioId};

//! doorworld Core - stochastic-door gridworld simulation
//!
//! An agent walks a small grid towards a goal. Doors between cells open
//! and close over time, and the agent sometimes stalls. This crate runs
//! those trials and asks what would have happened otherwise:
//! 1. **Ground truth**: a trial replayed from an explicit door schedule
//! 2. **Counterfactual**: the other agent, same door history, then chance
//! 3. **Hypothetical**: the other agent, doors left to chance throughout
//!
//! # Architecture
//!
//! ```text
//! GridDescription ──► GridModel ──┐
//!                                 ├──► SimulationEngine ──► RunResult / SimulationTrace
//! Agent ──────────────────────────┤          │
//! RandomStream ───────────────────┘          ▼ (deep copy)
//!                                     MonteCarloRunner ──► success rate
//! ```

pub mod agent;
pub mod description;
pub mod engine;
pub mod error;
pub mod grid;
pub mod model;
pub mod trace;
pub mod trial;

// Re-export key types for convenience
pub use agent::{Agent, PathColor};
pub use description::{DoorSpec, GridDescription, LayoutCell};
pub use engine::SimulationEngine;
pub use error::SimError;
pub use grid::{CellKind, Door, GridElement, GridModel, ReachabilityGraph};
pub use model::{ModelKind, ModelReport, MonteCarloRunner};
pub use trace::{
    DoorChangeLog, DoorSnapshot, EngineState, Outcome, RunResult, SimulationTrace, StepEvent,
    StepSnapshot,
};
pub use trial::TrialDescriptor;

pub use doorworld_env::{Action, Location, RandomStream};

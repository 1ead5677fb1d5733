//! Counterfactual and hypothetical Monte-Carlo models.
//!
//! A model takes a deep copy of a finished reference engine, swaps the
//! agent onto the other path, and re-runs the trial many times:
//! - **Counterfactual**: door history is replayed from the reference run's
//!   log up to its runtime, then sampled
//! - **Hypothetical**: doors are sampled from the first step

use crate::agent::PathColor;
use crate::engine::SimulationEngine;
use crate::error::SimError;
use crate::trace::DoorChangeLog;

use doorworld_env::RandomStream;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Which question a model answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Counterfactual,
    Hypothetical,
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Counterfactual => "counterfactual",
            ModelKind::Hypothetical => "hypothetical",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Summary of one Monte-Carlo batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelReport {
    pub kind: ModelKind,
    /// Path the simulated agent took
    pub path: PathColor,
    /// Percentage of won runs, truncated
    pub success_rate: u32,
    pub num_simulations: usize,
}

/// Re-runs a copied trial to estimate the other path's success rate.
pub struct MonteCarloRunner<R: RandomStream> {
    engine: SimulationEngine<R>,
    kind: ModelKind,

    /// Path of the reference run; simulations use the opposite one
    reference_path: PathColor,

    door_log: DoorChangeLog,
    original_runtime: u32,

    /// Parallel batches run so far
    batches: u64,
}

impl<R: RandomStream> MonteCarloRunner<R> {
    /// Counterfactual model: replays `door_log` up to `original_runtime`.
    pub fn counterfactual(
        reference: &SimulationEngine<R>,
        rng: R,
        original_runtime: u32,
        door_log: DoorChangeLog,
    ) -> Self {
        Self::from_reference(
            reference,
            rng,
            ModelKind::Counterfactual,
            door_log,
            original_runtime,
        )
    }

    /// Hypothetical model: doors are sampled throughout.
    pub fn hypothetical(reference: &SimulationEngine<R>, rng: R) -> Self {
        Self::from_reference(
            reference,
            rng,
            ModelKind::Hypothetical,
            DoorChangeLog::new(),
            0,
        )
    }

    fn from_reference(
        reference: &SimulationEngine<R>,
        rng: R,
        kind: ModelKind,
        door_log: DoorChangeLog,
        original_runtime: u32,
    ) -> Self {
        let mut engine = reference.clone();
        engine.reseed(rng);
        engine.set_trial_generation(false);
        let reference_path = engine.agent().path;

        Self {
            engine,
            kind,
            reference_path,
            door_log,
            original_runtime,
            batches: 0,
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Path the simulations run on.
    pub fn path(&self) -> PathColor {
        self.engine.agent().path
    }

    pub fn engine(&self) -> &SimulationEngine<R> {
        &self.engine
    }

    /// Resets the copied engine and runs it once.
    pub fn simulate_once(&mut self) -> bool {
        self.engine.reset();
        self.engine
            .run(VecDeque::new(), &self.door_log, self.original_runtime)
            .won()
    }

    /// Runs `num_simulations` simulations on the opposite path and returns
    /// the truncated percentage of wins.
    pub fn simulate_all(&mut self, num_simulations: usize) -> Result<u32, SimError> {
        check_batch(num_simulations)?;
        self.use_alternate_path();
        info!("running {} model with {} path...", self.kind, self.path());

        let mut successes = 0;
        for i in 0..num_simulations {
            if self.simulate_once() {
                successes += 1;
            }
            if i > 0 && i % 100 == 0 {
                debug!("{} simulations done", i);
            }
        }

        Ok(self.finish(successes, num_simulations))
    }

    /// Parallel version of `simulate_all`.
    ///
    /// Each batch forks its own stream off the runner's, numbered by how
    /// many parallel batches came before it. Simulation `i` then runs on its
    /// own engine copy with stream `fork(i)` of the batch stream, so a seeded
    /// batch gives the same rate regardless of thread count.
    pub fn simulate_all_parallel(&mut self, num_simulations: usize) -> Result<u32, SimError>
    where
        R: Sync,
    {
        check_batch(num_simulations)?;
        self.use_alternate_path();
        info!(
            "running {} model with {} path on {} threads...",
            self.kind,
            self.path(),
            rayon::current_num_threads()
        );

        let batch_rng = self.engine.rng().fork(self.batches)?;
        self.batches += 1;

        let base = &self.engine;
        let door_log = &self.door_log;
        let original_runtime = self.original_runtime;

        let outcomes = (0..num_simulations as u64)
            .into_par_iter()
            .map(|i| -> Result<bool, SimError> {
                let mut engine = base.clone();
                engine.reseed(batch_rng.fork(i)?);
                engine.reset();
                Ok(engine.run(VecDeque::new(), door_log, original_runtime).won())
            })
            .collect::<Result<Vec<bool>, SimError>>()?;

        let successes = outcomes.into_iter().filter(|won| *won).count();
        Ok(self.finish(successes, num_simulations))
    }

    /// Runs `simulate_all` and wraps the rate in a report.
    pub fn report(&mut self, num_simulations: usize) -> Result<ModelReport, SimError> {
        let success_rate = self.simulate_all(num_simulations)?;
        Ok(ModelReport {
            kind: self.kind,
            path: self.path(),
            success_rate,
            num_simulations,
        })
    }

    fn use_alternate_path(&mut self) {
        self.engine.agent_mut().path = self.reference_path.opposite();
        self.engine.reset();
    }

    fn finish(&self, successes: usize, num_simulations: usize) -> u32 {
        let rate = success_rate(successes, num_simulations);
        info!(
            "{} success rate on {} path was {}% across {} simulations",
            self.kind,
            self.path(),
            rate,
            num_simulations
        );
        rate
    }
}

fn check_batch(num_simulations: usize) -> Result<(), SimError> {
    if num_simulations == 0 {
        return Err(SimError::config("num_simulations must be at least 1"));
    }
    Ok(())
}

/// Truncated integer percentage.
fn success_rate(successes: usize, num_simulations: usize) -> u32 {
    (successes * 100 / num_simulations) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::description::{DoorSpec, GridDescription, LayoutCell};
    use crate::grid::GridModel;
    use doorworld_env::{Location, SeededStream};

    /// b g  (red start absent, so red starts at (0, 0) too)
    fn one_step_grid() -> GridModel {
        let desc = GridDescription::open(2, 1)
            .with_cell((0, 0), LayoutCell::StartBlue)
            .with_cell((1, 0), LayoutCell::Goal);
        GridModel::new(&desc, 1).unwrap()
    }

    /// Each path has to pass its own door.
    ///
    /// r | g
    /// X X .
    /// b | .
    fn two_path_grid(red_open: bool, blue_open: bool, p: f64, time_limit: u32) -> GridModel {
        let desc = GridDescription::open(3, 3)
            .with_cell((0, 0), LayoutCell::StartRed)
            .with_door((1, 0), DoorSpec::new(red_open, p))
            .with_cell((2, 0), LayoutCell::Goal)
            .with_cell((0, 1), LayoutCell::Blocked)
            .with_cell((1, 1), LayoutCell::Blocked)
            .with_cell((0, 2), LayoutCell::StartBlue)
            .with_door((1, 2), DoorSpec::new(blue_open, p));
        GridModel::new(&desc, time_limit).unwrap()
    }

    fn reference(grid: GridModel, path: PathColor, stall: f64) -> SimulationEngine<SeededStream> {
        let agent = Agent::new(path, stall).unwrap();
        SimulationEngine::new(grid, agent, SeededStream::new(1)).with_trial_generation(true)
    }

    #[test]
    fn test_success_rate_truncates() {
        assert_eq!(success_rate(29, 100), 29);
        assert_eq!(success_rate(2, 3), 66);
        assert_eq!(success_rate(1, 3), 33);
        assert_eq!(success_rate(0, 7), 0);
        assert_eq!(success_rate(7, 7), 100);
    }

    #[test]
    fn test_trivial_grid_always_succeeds() {
        let engine = reference(one_step_grid(), PathColor::Red, 0.0);
        for n in [1, 2, 17, 100] {
            let mut model = MonteCarloRunner::hypothetical(&engine, SeededStream::new(5));
            assert_eq!(model.simulate_all(n).unwrap(), 100);
            assert_eq!(model.path(), PathColor::Blue);
        }
    }

    #[test]
    fn test_zero_simulations_rejected() {
        let engine = reference(one_step_grid(), PathColor::Red, 0.0);
        let mut model = MonteCarloRunner::hypothetical(&engine, SeededStream::new(5));

        assert!(matches!(
            model.simulate_all(0),
            Err(SimError::InvalidSimulationConfig(_))
        ));
        assert!(matches!(
            model.simulate_all_parallel(0),
            Err(SimError::InvalidSimulationConfig(_))
        ));
    }

    #[test]
    fn test_models_use_opposite_path() {
        // Red reference; blue door is shut for good, red door is open
        let engine = reference(two_path_grid(true, false, 0.0, 6), PathColor::Red, 0.0);
        let mut reference_run = engine.clone();
        let result = reference_run.run(VecDeque::new(), &DoorChangeLog::new(), 0);
        assert!(result.won());

        let mut model = MonteCarloRunner::hypothetical(&engine, SeededStream::new(3));
        assert_eq!(model.simulate_all(20).unwrap(), 0);
        assert_eq!(model.engine().agent().location, Location::new(0, 2));
    }

    #[test]
    fn test_repeated_batches_keep_opposite_path() {
        let engine = reference(one_step_grid(), PathColor::Red, 0.0);
        let mut model = MonteCarloRunner::hypothetical(&engine, SeededStream::new(5));

        model.simulate_all(3).unwrap();
        model.simulate_all(3).unwrap();
        assert_eq!(model.path(), PathColor::Blue);
    }

    #[test]
    fn test_counterfactual_replays_reference_history() {
        // Blue door opens at t=2 in the recorded history and never moves after
        let log = DoorChangeLog::new().with_change(2, (1, 2));
        let engine = reference(two_path_grid(true, false, 0.0, 10), PathColor::Red, 0.0);

        let mut cf = MonteCarloRunner::counterfactual(&engine, SeededStream::new(8), 3, log);
        assert_eq!(cf.kind(), ModelKind::Counterfactual);
        // Blue then walks (0,2) -> (1,2) -> (2,2) -> (2,1) -> (2,0)
        assert_eq!(cf.simulate_all(25).unwrap(), 100);

        let mut hyp = MonteCarloRunner::hypothetical(&engine, SeededStream::new(8));
        assert_eq!(hyp.simulate_all(25).unwrap(), 0);
    }

    #[test]
    fn test_model_does_not_touch_reference() {
        let mut engine = reference(two_path_grid(true, false, 0.5, 10), PathColor::Red, 0.2);
        engine.run(VecDeque::new(), &DoorChangeLog::new(), 0);
        let location = engine.agent().location;
        let doors: Vec<bool> = engine.grid().doors().iter().map(|d| d.is_open()).collect();

        let mut model = MonteCarloRunner::hypothetical(&engine, SeededStream::new(4));
        model.simulate_all(50).unwrap();

        assert_eq!(engine.agent().path, PathColor::Red);
        assert_eq!(engine.agent().location, location);
        let after: Vec<bool> = engine.grid().doors().iter().map(|d| d.is_open()).collect();
        assert_eq!(doors, after);
        assert!(engine.is_generating());
        assert!(!model.engine().is_generating());
    }

    #[test]
    fn test_seeded_batches_are_reproducible() {
        let engine = reference(two_path_grid(true, false, 0.3, 8), PathColor::Red, 0.12);

        let mut a = MonteCarloRunner::hypothetical(&engine, SeededStream::new(21));
        let mut b = MonteCarloRunner::hypothetical(&engine, SeededStream::new(21));
        assert_eq!(a.simulate_all(200).unwrap(), b.simulate_all(200).unwrap());

        let mut c = MonteCarloRunner::hypothetical(&engine, SeededStream::new(21));
        let mut d = MonteCarloRunner::hypothetical(&engine, SeededStream::new(21));
        assert_eq!(
            c.simulate_all_parallel(200).unwrap(),
            d.simulate_all_parallel(200).unwrap()
        );
    }

    #[test]
    fn test_repeated_parallel_batches_draw_fresh_streams() {
        let engine = reference(two_path_grid(true, false, 0.3, 8), PathColor::Red, 0.12);

        let mut a = MonteCarloRunner::hypothetical(&engine, SeededStream::new(21));
        let rates: Vec<u32> = (0..5).map(|_| a.simulate_all_parallel(200).unwrap()).collect();
        assert!(rates.iter().any(|rate| *rate != rates[0]), "rates: {:?}", rates);

        // Still reproducible batch by batch
        let mut b = MonteCarloRunner::hypothetical(&engine, SeededStream::new(21));
        let again: Vec<u32> = (0..5).map(|_| b.simulate_all_parallel(200).unwrap()).collect();
        assert_eq!(rates, again);
    }

    #[test]
    fn test_parallel_trivial_grid() {
        let engine = reference(one_step_grid(), PathColor::Red, 0.0);
        let mut model = MonteCarloRunner::hypothetical(&engine, SeededStream::new(5));
        assert_eq!(model.simulate_all_parallel(64).unwrap(), 100);
    }

    #[test]
    fn test_report() {
        let engine = reference(one_step_grid(), PathColor::Blue, 0.0);
        let mut model = MonteCarloRunner::hypothetical(&engine, SeededStream::new(5));
        let report = model.report(10).unwrap();

        assert_eq!(
            report,
            ModelReport {
                kind: ModelKind::Hypothetical,
                path: PathColor::Red,
                success_rate: 100,
                num_simulations: 10,
            }
        );
    }
}

//! Trial runner - generates ground truth, then asks the models.

use crate::config::SimConfig;
use crate::scenarios::ScenarioId;

use doorworld_core::{
    Agent, GridDescription, GridModel, ModelKind, ModelReport, MonteCarloRunner, Outcome,
    PathColor, SimError, SimulationEngine, SimulationTrace, TrialDescriptor,
};
use doorworld_env::{RandomStream, SeededStream};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{info, warn};

/// Stream ids forked from a trial's stream.
const COUNTERFACTUAL_STREAM: u64 = 1;
const HYPOTHETICAL_STREAM: u64 = 2;

/// Results from running one trial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialReport {
    /// Trial number
    pub trial: u32,

    /// Seed the trial's stream was built from
    pub seed: u64,

    /// Path of the ground-truth agent
    pub path: PathColor,

    pub outcome: Outcome,
    pub final_timestep: u32,

    pub counterfactual: Option<ModelReport>,
    pub hypothetical: Option<ModelReport>,

    /// Step-by-step ground-truth run
    pub trace: SimulationTrace,
}

impl TrialReport {
    pub fn won(&self) -> bool {
        self.outcome == Outcome::Won
    }

    pub fn model(&self, kind: ModelKind) -> Option<&ModelReport> {
        match kind {
            ModelKind::Counterfactual => self.counterfactual.as_ref(),
            ModelKind::Hypothetical => self.hypothetical.as_ref(),
        }
    }
}

/// Runs trials under one configuration.
pub struct TrialRunner {
    config: SimConfig,
}

impl TrialRunner {
    /// Creates a runner, rejecting invalid configurations.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Runs a built-in scenario.
    pub fn run_scenario(&self, scenario: ScenarioId) -> Result<TrialReport, SimError> {
        info!("Starting scenario: {} ({})", scenario.name(), scenario.description());
        let scenario = scenario.build();
        self.run_trial(&scenario.grid, &scenario.trial)
    }

    /// Runs every built-in scenario in order.
    pub fn run_all(&self) -> Result<Vec<TrialReport>, SimError> {
        ScenarioId::all()
            .into_iter()
            .map(|scenario| self.run_scenario(scenario))
            .collect()
    }

    /// Generates the trial's ground truth and runs the enabled models on it.
    pub fn run_trial(
        &self,
        description: &GridDescription,
        trial: &TrialDescriptor,
    ) -> Result<TrialReport, SimError> {
        let description = match self.config.door_probability {
            Some(p) => description.clone().with_door_probability(p),
            None => description.clone(),
        };
        let grid = GridModel::new(&description, trial.time_limit)?;
        let agent = Agent::new(trial.path, self.config.stall_probability)?;

        // Unreachable goals are legal, the runs are just lost
        for path in [trial.path, trial.path.opposite()] {
            if let Err(err) = grid.path_to_goal(grid.start_location(path)) {
                warn!("trial {}: {} path: {}", trial.num, path, err);
            }
        }

        let seed = self.config.trial_seed(trial.num);
        let rng = SeededStream::new(seed);
        info!(
            "trial {}: {} path, time limit {}, seed {}",
            trial.num, trial.path, trial.time_limit, seed
        );

        let counterfactual_rng = rng.fork(COUNTERFACTUAL_STREAM)?;
        let hypothetical_rng = rng.fork(HYPOTHETICAL_STREAM)?;

        let reference = SimulationEngine::new(grid, agent, rng).with_trial_generation(true);
        let mut ground_truth = reference.clone();
        let trace = ground_truth.run_traced(VecDeque::new(), &trial.door_changes, 0);
        let result = trace.result;

        if result.won() {
            info!("trial {}: won at t={}", trial.num, result.final_timestep);
        } else {
            warn!("trial {}: lost at t={}", trial.num, result.final_timestep);
        }

        let counterfactual = if self.config.counterfactual {
            let mut model = MonteCarloRunner::counterfactual(
                &reference,
                counterfactual_rng,
                result.final_timestep,
                trial.door_changes.clone(),
            );
            Some(self.run_model(&mut model)?)
        } else {
            None
        };

        let hypothetical = if self.config.hypothetical {
            let mut model = MonteCarloRunner::hypothetical(&reference, hypothetical_rng);
            Some(self.run_model(&mut model)?)
        } else {
            None
        };

        Ok(TrialReport {
            trial: trial.num,
            seed,
            path: trial.path,
            outcome: result.outcome,
            final_timestep: result.final_timestep,
            counterfactual,
            hypothetical,
            trace,
        })
    }

    fn run_model(
        &self,
        model: &mut MonteCarloRunner<SeededStream>,
    ) -> Result<ModelReport, SimError> {
        let num_simulations = self.config.num_simulations;
        if !self.config.parallel {
            return model.report(num_simulations);
        }

        let success_rate = model.simulate_all_parallel(num_simulations)?;
        Ok(ModelReport {
            kind: model.kind(),
            path: model.path(),
            success_rate,
            num_simulations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorworld_core::{Action, LayoutCell, Location, StepEvent};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    }

    fn runner(config: SimConfig) -> TrialRunner {
        TrialRunner::new(config).unwrap()
    }

    #[test]
    fn test_open_field() {
        init_tracing();
        let report = runner(SimConfig::default().with_stall_probability(0.0).with_simulations(50))
            .run_scenario(ScenarioId::OpenField)
            .unwrap();

        assert!(report.won());
        assert_eq!(report.final_timestep, 4);
        assert_eq!(report.path, PathColor::Red);

        let cf = report.counterfactual.unwrap();
        assert_eq!(cf.path, PathColor::Blue);
        assert_eq!(cf.success_rate, 100);
        assert_eq!(report.hypothetical.unwrap().success_rate, 100);

        assert_eq!(report.trace.steps.len(), 4);
        assert_eq!(report.trace.agent_path().last(), Some(&Location::new(2, 2)));
    }

    #[test]
    fn test_sealed_door_loses() {
        init_tracing();
        let report = runner(SimConfig::default().with_simulations(20))
            .run_scenario(ScenarioId::SealedDoor)
            .unwrap();

        assert!(!report.won());
        assert_eq!(report.outcome, Outcome::Lost);
        assert_eq!(report.final_timestep, 10);
        assert!(report
            .trace
            .steps
            .iter()
            .all(|step| step.agent_location == Location::new(0, 0)));
        assert_eq!(
            report.trace.steps[0].event,
            StepEvent::Retried(Action::Right)
        );
        assert_eq!(report.counterfactual.unwrap().success_rate, 0);
    }

    #[test]
    fn test_two_doors_counterfactual_beats_hypothetical() {
        init_tracing();
        let report = runner(SimConfig::default().with_stall_probability(0.0))
            .run_scenario(ScenarioId::TwoDoors)
            .unwrap();

        assert!(report.won());
        assert_eq!(report.final_timestep, 2);
        // The recorded toggle at t=2 is part of the counterfactual history
        assert_eq!(report.counterfactual.unwrap().success_rate, 100);
        assert!(report.hypothetical.unwrap().success_rate < 100);
    }

    #[test]
    fn test_detour_replays_red_door_opening() {
        init_tracing();
        let report = runner(SimConfig::default().with_stall_probability(0.0))
            .run_scenario(ScenarioId::Detour)
            .unwrap();

        assert_eq!(report.path, PathColor::Blue);
        assert!(report.won());
        assert_eq!(report.final_timestep, 6);
        assert_eq!(
            report.trace.door_changes(),
            ScenarioId::Detour.build().trial.door_changes
        );

        let cf = report.model(ModelKind::Counterfactual).unwrap();
        assert_eq!(cf.path, PathColor::Red);
        assert_eq!(cf.success_rate, 100);
        assert!(report.model(ModelKind::Hypothetical).unwrap().success_rate < 100);
    }

    #[test]
    fn test_same_config_same_reports() {
        let config = SimConfig::default().with_seed(9).with_simulations(200);
        let a = runner(config.clone()).run_all().unwrap();
        let b = runner(config).run_all().unwrap();

        assert_eq!(a.len(), ScenarioId::all().len());
        assert_eq!(a, b);
    }

    #[test]
    fn test_parallel_runs_are_reproducible() {
        let config = SimConfig::default().with_parallel(true).with_simulations(200);
        let a = runner(config.clone()).run_scenario(ScenarioId::TwoDoors).unwrap();
        let b = runner(config).run_scenario(ScenarioId::TwoDoors).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.hypothetical.unwrap().num_simulations, 200);
    }

    #[test]
    fn test_door_probability_override() {
        // Doors frozen: the hypothetical blue agent never gets through
        let report = runner(
            SimConfig::default()
                .with_stall_probability(0.0)
                .with_door_probability(0.0)
                .with_simulations(30),
        )
        .run_scenario(ScenarioId::TwoDoors)
        .unwrap();

        assert_eq!(report.hypothetical.unwrap().success_rate, 0);
    }

    #[test]
    fn test_disabled_models_are_skipped() {
        let report = runner(SimConfig::default().with_models(false, false).with_simulations(0))
            .run_scenario(ScenarioId::OpenField)
            .unwrap();

        assert!(report.counterfactual.is_none());
        assert!(report.hypothetical.is_none());
    }

    #[test]
    fn test_unreachable_goal_is_lost_not_error() {
        init_tracing();
        // r X g
        let grid = GridDescription::open(3, 1)
            .with_cell((0, 0), LayoutCell::StartRed)
            .with_cell((1, 0), LayoutCell::Blocked)
            .with_cell((2, 0), LayoutCell::Goal);
        let trial = TrialDescriptor::new(5, PathColor::Red).with_time_limit(4);

        let report = runner(SimConfig::default().with_simulations(10))
            .run_trial(&grid, &trial)
            .unwrap();

        assert_eq!(report.outcome, Outcome::Lost);
        assert_eq!(report.final_timestep, 4);
        assert_eq!(report.counterfactual.unwrap().success_rate, 0);
        assert_eq!(report.hypothetical.unwrap().success_rate, 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(TrialRunner::new(SimConfig::default().with_stall_probability(2.0)).is_err());
    }

    #[test]
    fn test_invalid_grid_reported() {
        let grid = GridDescription::open(2, 2);
        let trial = TrialDescriptor::new(1, PathColor::Red);

        let err = runner(SimConfig::default()).run_trial(&grid, &trial).unwrap_err();
        assert!(matches!(err, SimError::InvalidGridDescription(_)));
    }

    #[test]
    fn test_report_serializes() {
        let report = runner(SimConfig::default().with_simulations(10))
            .run_scenario(ScenarioId::OpenField)
            .unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["trial"], 1);
        assert_eq!(json["path"], "red");
        assert_eq!(json["counterfactual"]["kind"], "counterfactual");
    }
}

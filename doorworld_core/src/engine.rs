//! SimulationEngine - runs one trial of an agent against the grid.
//!
//! Each timestep the engine:
//! 1. Replans if the action queue is empty
//! 2. Executes one action (possibly stalling, possibly retrying a blocked move)
//! 3. Advances every door, either replaying a log or sampling
//! 4. Stops with `Won` when the agent stands on the goal
//!
//! The agent keeps a single action queue across steps. Blocked moves are
//! pushed back onto the front, so the agent retries them until the door
//! opens or the queue is replanned.

use crate::agent::Agent;
use crate::grid::GridModel;
use crate::trace::{
    DoorChangeLog, DoorSnapshot, EngineState, Outcome, RunResult, SimulationTrace, StepEvent,
    StepSnapshot,
};

use doorworld_env::{Action, Location, RandomStream};
use std::collections::VecDeque;
use tracing::debug;

/// One trial: a grid, an agent, and the random stream driving both.
///
/// Cloning an engine deep-copies the grid, the agent and the stream.
#[derive(Debug, Clone)]
pub struct SimulationEngine<R: RandomStream> {
    grid: GridModel,
    agent: Agent,
    rng: R,

    /// Ground-truth generation: no stalls, doors only follow the log
    generating: bool,

    state: EngineState,
    timestep: u32,
}

impl<R: RandomStream> SimulationEngine<R> {
    /// Creates an engine with the agent placed on its start cell.
    pub fn new(grid: GridModel, mut agent: Agent, rng: R) -> Self {
        agent.move_to(grid.start_location(agent.path));
        Self {
            grid,
            agent,
            rng,
            generating: false,
            state: EngineState::Running,
            timestep: 0,
        }
    }

    /// Sets trial-generation mode.
    pub fn with_trial_generation(mut self, generating: bool) -> Self {
        self.generating = generating;
        self
    }

    pub fn set_trial_generation(&mut self, generating: bool) {
        self.generating = generating;
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut Agent {
        &mut self.agent
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn timestep(&self) -> u32 {
        self.timestep
    }

    pub fn reached_goal(&self) -> bool {
        self.agent.location == self.grid.goal_location()
    }

    /// Plans the shortest sequence of actions from the agent to the goal.
    ///
    /// Empty when the agent is already there or the goal is unreachable.
    pub fn plan_path(&self) -> VecDeque<Action> {
        let from = self.agent.location;
        let to = self.grid.goal_location();

        let Some(locations) = self.grid.shortest_path(from, to) else {
            debug!("t={} goal {} unreachable from {}", self.timestep, to, from);
            return VecDeque::new();
        };

        locations
            .windows(2)
            .filter_map(|pair| Action::between(pair[0], pair[1]))
            .collect()
    }

    /// Executes at most one action from the front of `path`.
    pub fn execute_one(&mut self, path: &mut VecDeque<Action>) -> StepEvent {
        if !self.generating && self.rng.bernoulli(self.agent.stall_probability()) {
            debug!("t={} agent stalled at {}", self.timestep, self.agent.location);
            return StepEvent::Stalled;
        }

        let Some(action) = path.pop_front() else {
            return StepEvent::Idle;
        };

        let from = self.agent.location;
        let destination = self.grid.step(from, action);
        // Doors only gate entry from their left neighbour
        let door_closed = action == Action::Right
            && self
                .grid
                .door_right_of(from)
                .map_or(false, |door| !door.is_open());

        if !self.grid.is_valid_action(from, action) || door_closed {
            debug!("t={} {} from {} blocked, retrying", self.timestep, action, from);
            path.push_front(action);
            return StepEvent::Retried(action);
        }

        self.agent.move_to(destination);
        debug!("t={} agent moved {} to {}", self.timestep, action, destination);
        StepEvent::Moved(action)
    }

    /// Flips doors for `timestep` and returns the locations that flipped.
    ///
    /// While generating, or up to `original_runtime`, doors follow
    /// `door_log` exactly. Afterwards each door flips with its own toggle
    /// probability.
    pub fn advance_doors(
        &mut self,
        timestep: u32,
        door_log: &DoorChangeLog,
        original_runtime: u32,
    ) -> Vec<Location> {
        let replay = self.generating || timestep <= original_runtime;
        let mut toggled = Vec::new();

        for door in self.grid.doors_mut() {
            let change = if replay {
                door_log.toggles_at(timestep, door.location())
            } else {
                self.rng.bernoulli(door.toggle_probability())
            };

            if change {
                door.toggle();
                debug!("t={} {}", timestep, door);
                toggled.push(door.location());
            }
        }

        toggled
    }

    /// Runs the trial until the goal is reached or time runs out.
    ///
    /// `path` seeds the action queue; pass an empty queue to plan from
    /// scratch.
    pub fn run(
        &mut self,
        path: VecDeque<Action>,
        door_log: &DoorChangeLog,
        original_runtime: u32,
    ) -> RunResult {
        self.run_with(path, door_log, original_runtime, |_| {})
    }

    /// Like `run`, recording a snapshot after every step.
    pub fn run_traced(
        &mut self,
        path: VecDeque<Action>,
        door_log: &DoorChangeLog,
        original_runtime: u32,
    ) -> SimulationTrace {
        let initial = self.snapshot(StepEvent::Idle, Vec::new());
        let mut steps = Vec::new();
        let result = self.run_with(path, door_log, original_runtime, |frame| steps.push(frame));
        SimulationTrace {
            initial,
            steps,
            result,
        }
    }

    fn run_with<F>(
        &mut self,
        mut path: VecDeque<Action>,
        door_log: &DoorChangeLog,
        original_runtime: u32,
        mut on_step: F,
    ) -> RunResult
    where
        F: FnMut(StepSnapshot),
    {
        self.state = EngineState::Running;
        self.timestep = 0;

        for timestep in 1..=self.grid.time_limit() {
            self.timestep = timestep;

            if path.is_empty() {
                path = self.plan_path();
            }

            let event = self.execute_one(&mut path);
            let toggled = self.advance_doors(timestep, door_log, original_runtime);
            on_step(self.snapshot(event, toggled));

            if self.reached_goal() {
                self.state = EngineState::Won;
                debug!("t={} reached goal", timestep);
                break;
            }
        }

        if self.state == EngineState::Running {
            self.state = EngineState::Lost;
        }

        let outcome = match self.state {
            EngineState::Won => Outcome::Won,
            _ => Outcome::Lost,
        };

        RunResult {
            final_timestep: self.timestep,
            outcome,
        }
    }

    /// Current agent location and door states.
    pub fn snapshot(&self, event: StepEvent, toggled: Vec<Location>) -> StepSnapshot {
        StepSnapshot {
            timestep: self.timestep,
            agent_location: self.agent.location,
            doors: self
                .grid
                .doors()
                .iter()
                .map(|door| DoorSnapshot {
                    location: door.location(),
                    is_open: door.is_open(),
                })
                .collect(),
            event,
            toggled,
        }
    }

    /// Restores doors, returns the agent to its start and clears the outcome.
    ///
    /// The random stream is left where it is; use `reseed` to replay.
    pub fn reset(&mut self) {
        self.grid.restore_doors();
        let start = self.grid.start_location(self.agent.path);
        self.agent.move_to(start);
        self.state = EngineState::Running;
        self.timestep = 0;
    }

    /// Replaces the random stream.
    pub fn reseed(&mut self, rng: R) {
        self.rng = rng;
    }
}

//! Run results, door replay logs and per-step snapshots.
//!
//! These are the only values handed to rendering and persistence
//! collaborators, so all of them serialize with `serde`.

use doorworld_env::{Action, Location};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Final outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Won,
    Lost,
}

impl Outcome {
    pub fn name(&self) -> &'static str {
        match self {
            Outcome::Won => "won",
            Outcome::Lost => "lost",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Engine state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Running,
    Won,
    Lost,
}

/// Result of one `run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Timestep at which the loop stopped
    pub final_timestep: u32,
    pub outcome: Outcome,
}

impl RunResult {
    pub fn won(&self) -> bool {
        self.outcome == Outcome::Won
    }
}

/// Explicit door toggle schedule: timestep -> door locations to flip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoorChangeLog(BTreeMap<u32, BTreeSet<Location>>);

impl DoorChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules the door at `location` to flip at `timestep`.
    pub fn record(&mut self, timestep: u32, location: Location) {
        self.0.entry(timestep).or_default().insert(location);
    }

    pub fn with_change(mut self, timestep: u32, location: impl Into<Location>) -> Self {
        self.record(timestep, location.into());
        self
    }

    /// Returns `true` if the door at `location` flips at `timestep`.
    pub fn toggles_at(&self, timestep: u32, location: Location) -> bool {
        self.0
            .get(&timestep)
            .map_or(false, |doors| doors.contains(&location))
    }

    /// Door locations scheduled at `timestep`.
    pub fn changes_at(&self, timestep: u32) -> impl Iterator<Item = Location> + '_ {
        self.0.get(&timestep).into_iter().flatten().copied()
    }

    /// Number of individual toggles in the log.
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<(u32, Location)> for DoorChangeLog {
    fn from_iter<I: IntoIterator<Item = (u32, Location)>>(iter: I) -> Self {
        let mut log = Self::new();
        for (timestep, location) in iter {
            log.record(timestep, location);
        }
        log
    }
}

/// What the agent did during one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "action")]
pub enum StepEvent {
    /// No step taken (initial frame, or no plan to follow)
    Idle,
    /// The agent forwent its planned action
    Stalled,
    Moved(Action),
    /// The move was blocked and will be attempted again next step
    Retried(Action),
}

/// Open/closed state of one door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorSnapshot {
    pub location: Location,
    pub is_open: bool,
}

/// Read-only view of the world after a step, enough to draw a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSnapshot {
    pub timestep: u32,
    pub agent_location: Location,
    pub doors: Vec<DoorSnapshot>,
    pub event: StepEvent,
    /// Doors flipped during this step
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub toggled: Vec<Location>,
}

/// Full record of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationTrace {
    /// World before the first step
    pub initial: StepSnapshot,
    pub steps: Vec<StepSnapshot>,
    pub result: RunResult,
}

impl SimulationTrace {
    /// Door toggles that actually happened, usable as a replay log.
    pub fn door_changes(&self) -> DoorChangeLog {
        self.steps
            .iter()
            .flat_map(|step| step.toggled.iter().map(move |loc| (step.timestep, *loc)))
            .collect()
    }

    /// Agent location after each step, starting from the initial frame.
    pub fn agent_path(&self) -> Vec<Location> {
        std::iter::once(self.initial.agent_location)
            .chain(self.steps.iter().map(|step| step.agent_location))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_door_change_log_lookup() {
        let log = DoorChangeLog::new()
            .with_change(3, (1, 0))
            .with_change(3, (2, 1))
            .with_change(5, (1, 0));

        assert!(log.toggles_at(3, Location::new(1, 0)));
        assert!(log.toggles_at(5, Location::new(1, 0)));
        assert!(!log.toggles_at(4, Location::new(1, 0)));
        assert_eq!(log.len(), 3);
        assert_eq!(log.changes_at(3).count(), 2);
        assert_eq!(log.changes_at(9).count(), 0);
    }

    #[test]
    fn test_door_change_log_json_shape() {
        let log = DoorChangeLog::new().with_change(2, (1, 0));
        let json = serde_json::to_string(&log).unwrap();
        assert_eq!(json, r#"{"2":[{"x":1,"y":0}]}"#);

        let back: DoorChangeLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, log);
    }

    #[test]
    fn test_run_result_json_shape() {
        let result = RunResult {
            final_timestep: 4,
            outcome: Outcome::Won,
        };
        let value = serde_json::to_value(result).unwrap();
        assert_eq!(value["final_timestep"], 4);
        assert_eq!(value["outcome"], "won");
    }

    #[test]
    fn test_trace_door_changes() {
        let frame = |timestep, toggled: Vec<Location>| StepSnapshot {
            timestep,
            agent_location: Location::new(0, 0),
            doors: vec![],
            event: StepEvent::Stalled,
            toggled,
        };
        let trace = SimulationTrace {
            initial: frame(0, vec![]),
            steps: vec![frame(1, vec![Location::new(1, 0)]), frame(2, vec![])],
            result: RunResult {
                final_timestep: 2,
                outcome: Outcome::Lost,
            },
        };

        let log = trace.door_changes();
        assert_eq!(log.len(), 1);
        assert!(log.toggles_at(1, Location::new(1, 0)));
        assert_eq!(trace.agent_path().len(), 3);
    }
}

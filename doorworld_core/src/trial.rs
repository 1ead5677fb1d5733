//! Trial descriptors: which agent runs, for how long, and which door
//! toggles are replayed.

use crate::agent::PathColor;
use crate::trace::DoorChangeLog;

use doorworld_env::Location;
use serde::{Deserialize, Serialize};

fn default_time_limit() -> u32 {
    10
}

/// One trial as defined by the experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialDescriptor {
    /// Trial number (also used to derive the trial's seed)
    pub num: u32,

    pub path: PathColor,

    #[serde(default = "default_time_limit")]
    pub time_limit: u32,

    /// Door toggles replayed during ground-truth generation
    #[serde(default)]
    pub door_changes: DoorChangeLog,
}

impl TrialDescriptor {
    pub fn new(num: u32, path: PathColor) -> Self {
        Self {
            num,
            path,
            time_limit: default_time_limit(),
            door_changes: DoorChangeLog::new(),
        }
    }

    pub fn with_time_limit(mut self, time_limit: u32) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn with_door_change(mut self, timestep: u32, location: impl Into<Location>) -> Self {
        self.door_changes.record(timestep, location.into());
        self
    }
}

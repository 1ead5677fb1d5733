//! Built-in trial scenarios.

use doorworld_core::{DoorSpec, GridDescription, LayoutCell, PathColor, TrialDescriptor};

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// TRIAL-001: Open 3x3 room, no doors
    OpenField,

    /// TRIAL-002: Single corridor shut by a door that never opens
    SealedDoor,

    /// TRIAL-003: Each path behind its own door, blue door opens mid-trial
    TwoDoors,

    /// TRIAL-004: Short red route through a door vs. long open blue route
    Detour,
}

/// A grid plus the trial to run on it.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub id: ScenarioId,
    pub grid: GridDescription,
    pub trial: TrialDescriptor,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::OpenField,
            ScenarioId::SealedDoor,
            ScenarioId::TwoDoors,
            ScenarioId::Detour,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::OpenField => "open_field",
            ScenarioId::SealedDoor => "sealed_door",
            ScenarioId::TwoDoors => "two_doors",
            ScenarioId::Detour => "detour",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::OpenField => "3x3 room, red walks 4 steps to the far corner",
            ScenarioId::SealedDoor => "r | g with a closed door that never toggles",
            ScenarioId::TwoDoors => "red passes an open door; blue's door opens at t=2",
            ScenarioId::Detour => "blue takes the long way while red's door opens at t=1",
        }
    }

    /// Trial number used for seeding.
    pub fn number(&self) -> u32 {
        match self {
            ScenarioId::OpenField => 1,
            ScenarioId::SealedDoor => 2,
            ScenarioId::TwoDoors => 3,
            ScenarioId::Detour => 4,
        }
    }

    /// Builds the scenario's grid and trial.
    pub fn build(&self) -> Scenario {
        let num = self.number();
        let (grid, trial) = match self {
            ScenarioId::OpenField => (
                // r . .
                // . . .
                // b . g
                GridDescription::open(3, 3)
                    .with_cell((0, 0), LayoutCell::StartRed)
                    .with_cell((0, 2), LayoutCell::StartBlue)
                    .with_cell((2, 2), LayoutCell::Goal),
                TrialDescriptor::new(num, PathColor::Red),
            ),
            ScenarioId::SealedDoor => (
                // r | g
                GridDescription::open(3, 1)
                    .with_cell((0, 0), LayoutCell::StartRed)
                    .with_door((1, 0), DoorSpec::new(false, 0.0))
                    .with_cell((2, 0), LayoutCell::Goal),
                TrialDescriptor::new(num, PathColor::Red),
            ),
            ScenarioId::TwoDoors => (
                // r | g
                // X X .
                // b | .
                GridDescription::open(3, 3)
                    .with_cell((0, 0), LayoutCell::StartRed)
                    .with_door((1, 0), DoorSpec::new(true, 0.19))
                    .with_cell((2, 0), LayoutCell::Goal)
                    .with_cell((0, 1), LayoutCell::Blocked)
                    .with_cell((1, 1), LayoutCell::Blocked)
                    .with_cell((0, 2), LayoutCell::StartBlue)
                    .with_door((1, 2), DoorSpec::new(false, 0.19)),
                TrialDescriptor::new(num, PathColor::Red).with_door_change(2, (1, 2)),
            ),
            ScenarioId::Detour => (
                // r . | . g
                // X X X X .
                // b . . . .
                GridDescription::open(5, 3)
                    .with_cell((0, 0), LayoutCell::StartRed)
                    .with_door((2, 0), DoorSpec::new(false, 0.19))
                    .with_cell((4, 0), LayoutCell::Goal)
                    .with_cell((0, 1), LayoutCell::Blocked)
                    .with_cell((1, 1), LayoutCell::Blocked)
                    .with_cell((2, 1), LayoutCell::Blocked)
                    .with_cell((3, 1), LayoutCell::Blocked)
                    .with_cell((0, 2), LayoutCell::StartBlue),
                TrialDescriptor::new(num, PathColor::Blue)
                    .with_time_limit(8)
                    .with_door_change(1, (2, 0)),
            ),
        };

        Scenario {
            id: *self,
            grid,
            trial,
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open_field" | "openfield" | "trial-001" => Ok(ScenarioId::OpenField),
            "sealed_door" | "sealeddoor" | "trial-002" => Ok(ScenarioId::SealedDoor),
            "two_doors" | "twodoors" | "trial-003" => Ok(ScenarioId::TwoDoors),
            "detour" | "trial-004" => Ok(ScenarioId::Detour),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

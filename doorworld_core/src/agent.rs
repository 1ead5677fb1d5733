//! The simulated agent.

use crate::error::{check_probability, SimError};
use doorworld_env::Location;
use serde::{Deserialize, Serialize};

/// Path identity of an agent, selecting which Start cell it begins at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathColor {
    /// Starts on the Start-A cell
    Red,

    /// Starts on the Start-B cell
    Blue,
}

impl PathColor {
    /// Returns the other path.
    pub fn opposite(self) -> Self {
        match self {
            PathColor::Red => PathColor::Blue,
            PathColor::Blue => PathColor::Red,
        }
    }

    /// Returns the path name.
    pub fn name(&self) -> &'static str {
        match self {
            PathColor::Red => "red",
            PathColor::Blue => "blue",
        }
    }
}

impl std::fmt::Display for PathColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for PathColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "red" | "a" => Ok(PathColor::Red),
            "blue" | "b" => Ok(PathColor::Blue),
            _ => Err(format!("Unknown path color: {}", s)),
        }
    }
}

/// An agent walking the grid.
///
/// The engine owns the agent and moves it every step; the agent itself
/// only carries state.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    /// Current cell
    pub location: Location,

    /// Which start cell this agent uses
    pub path: PathColor,

    /// Chance of forgoing the planned action on any step
    stall_probability: f64,
}

impl Agent {
    /// Creates an agent at `(0, 0)`. The engine moves it to its start.
    ///
    /// Fails if `stall_probability` is outside `[0, 1]`.
    pub fn new(path: PathColor, stall_probability: f64) -> Result<Self, SimError> {
        Ok(Self {
            location: Location::new(0, 0),
            path,
            stall_probability: check_probability("stall_probability", stall_probability)?,
        })
    }

    /// Returns the stall probability.
    pub fn stall_probability(&self) -> f64 {
        self.stall_probability
    }

    pub fn move_to(&mut self, location: Location) {
        self.location = location;
    }
}

//! Grid geometry shared by every doorworld engine.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A cell coordinate on the grid.
///
/// `x` grows to the right and `y` grows downward. Ordering is row-major
/// (`y` first, then `x`), which is also the order doors are listed in a
/// grid description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

impl Location {
    /// Creates a new location.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the (unclamped) location reached by applying `action`.
    pub fn offset(self, action: Action) -> Self {
        let (dx, dy) = action.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    /// Manhattan distance to `other`.
    pub fn manhattan(self, other: Location) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<(i32, i32)> for Location {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the five unit moves an agent can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Down,
    Up,
    Left,
    Right,
    Stay,
}

impl Action {
    /// The four moves that change location, in planning order.
    pub const MOVES: [Action; 4] = [Action::Down, Action::Up, Action::Left, Action::Right];

    /// Returns the `(dx, dy)` delta of this action.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Action::Down => (0, 1),
            Action::Up => (0, -1),
            Action::Left => (-1, 0),
            Action::Right => (1, 0),
            Action::Stay => (0, 0),
        }
    }

    /// Returns the action that moves from `from` to `to`, if they are at
    /// most one unit step apart.
    pub fn between(from: Location, to: Location) -> Option<Self> {
        match (to.x - from.x, to.y - from.y) {
            (0, 1) => Some(Action::Down),
            (0, -1) => Some(Action::Up),
            (-1, 0) => Some(Action::Left),
            (1, 0) => Some(Action::Right),
            (0, 0) => Some(Action::Stay),
            _ => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Action::Down => "down",
            Action::Up => "up",
            Action::Left => "left",
            Action::Right => "right",
            Action::Stay => "stay",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_between_roundtrip() {
        let origin = Location::new(2, 2);
        for action in [Action::Down, Action::Up, Action::Left, Action::Right, Action::Stay] {
            assert_eq!(Action::between(origin, origin.offset(action)), Some(action));
        }
    }

    #[test]
    fn test_action_between_rejects_diagonal() {
        assert_eq!(Action::between(Location::new(0, 0), Location::new(1, 1)), None);
        assert_eq!(Action::between(Location::new(0, 0), Location::new(2, 0)), None);
    }

    #[test]
    fn test_location_row_major_order() {
        let mut locs = vec![
            Location::new(1, 1),
            Location::new(0, 1),
            Location::new(2, 0),
        ];
        locs.sort();
        assert_eq!(
            locs,
            vec![Location::new(2, 0), Location::new(0, 1), Location::new(1, 1)]
        );
    }

    #[test]
    fn test_location_serde_shape() {
        let json = serde_json::to_string(&Location::new(3, 4)).unwrap();
        assert_eq!(json, r#"{"x":3,"y":4}"#);

        let action: Action = serde_json::from_str("\"right\"").unwrap();
        assert_eq!(action, Action::Right);
    }

    #[test]
    fn test_manhattan() {
        assert_eq!(Location::new(0, 0).manhattan(Location::new(2, 2)), 4);
    }
}

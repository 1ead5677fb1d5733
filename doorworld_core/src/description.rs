//! Parsed grid descriptions handed to the core by the grid-file reader.

use doorworld_env::Location;
use serde::{Deserialize, Serialize};

/// Kind of a single layout cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCell {
    /// Nothing defined here
    Void,
    Floor,
    /// Start-A
    StartRed,
    /// Start-B
    StartBlue,
    Goal,
    Blocked,
    /// Floor cell whose left edge carries a door
    Door,
}

/// Initial state of one door.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoorSpec {
    pub is_open: bool,
    pub toggle_probability: f64,
}

impl DoorSpec {
    pub fn new(is_open: bool, toggle_probability: f64) -> Self {
        Self {
            is_open,
            toggle_probability,
        }
    }
}

/// A grid as described by the outside world.
///
/// `layout[y][x]` gives the cell kinds. `doors` lists one `DoorSpec` per
/// `LayoutCell::Door`, in row-major order. Nothing is validated here;
/// `GridModel::new` does that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDescription {
    pub width: usize,
    pub height: usize,
    pub layout: Vec<Vec<LayoutCell>>,
    #[serde(default)]
    pub doors: Vec<DoorSpec>,
}

impl GridDescription {
    /// Creates a `width x height` grid of floor cells.
    pub fn open(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            layout: vec![vec![LayoutCell::Floor; width]; height],
            doors: Vec::new(),
        }
    }

    /// Sets the cell at `location`. Locations outside the layout are ignored.
    ///
    /// Overwriting a door cell drops its `DoorSpec`.
    pub fn with_cell(mut self, location: impl Into<Location>, cell: LayoutCell) -> Self {
        let location = location.into();
        let Some(index) = self.door_index(location) else {
            return self;
        };
        let (x, y) = (location.x as usize, location.y as usize);
        let was_door = self.layout[y][x] == LayoutCell::Door;
        if was_door && cell != LayoutCell::Door && index < self.doors.len() {
            self.doors.remove(index);
        }
        self.layout[y][x] = cell;
        self
    }

    /// Places a door at `location`, keeping `doors` in row-major order.
    pub fn with_door(mut self, location: impl Into<Location>, spec: DoorSpec) -> Self {
        let location = location.into();
        let Some(index) = self.door_index(location) else {
            return self;
        };
        let (x, y) = (location.x as usize, location.y as usize);
        if self.layout[y][x] == LayoutCell::Door && index < self.doors.len() {
            self.doors[index] = spec;
        } else {
            self.layout[y][x] = LayoutCell::Door;
            self.doors.insert(index.min(self.doors.len()), spec);
        }
        self
    }

    /// Overrides every door's toggle probability.
    pub fn with_door_probability(mut self, toggle_probability: f64) -> Self {
        for door in &mut self.doors {
            door.toggle_probability = toggle_probability;
        }
        self
    }

    /// Returns the locations of all door cells in row-major order.
    pub fn door_locations(&self) -> Vec<Location> {
        self.layout
            .iter()
            .enumerate()
            .flat_map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, cell)| **cell == LayoutCell::Door)
                    .map(move |(x, _)| Location::new(x as i32, y as i32))
            })
            .collect()
    }

    /// Number of door cells before `location` in row-major order, or
    /// `None` if `location` is outside the layout.
    fn door_index(&self, location: Location) -> Option<usize> {
        if location.x < 0 || location.y < 0 {
            return None;
        }
        let (x, y) = (location.x as usize, location.y as usize);
        if y >= self.layout.len() || x >= self.layout[y].len() {
            return None;
        }
        let before = self
            .door_locations()
            .into_iter()
            .filter(|door| *door < location)
            .count();
        Some(before)
    }
}

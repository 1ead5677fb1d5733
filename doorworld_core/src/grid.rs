//! The grid model: cells, doors, bounds and shortest paths.
//!
//! Doors live between two horizontally adjacent cells. A door is stored at
//! the location of the cell on its right, and a closed door keeps the agent
//! from entering that cell. Reachability ignores door state entirely: only
//! bounds and `Blocked` cells shape the planning graph.

use crate::agent::PathColor;
use crate::description::{GridDescription, LayoutCell};
use crate::error::SimError;

use doorworld_env::{Action, Location};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Kind of a static grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Floor,
    Start(PathColor),
    Goal,
    Blocked,
}

impl CellKind {
    pub fn name(&self) -> &'static str {
        match self {
            CellKind::Floor => "Floor",
            CellKind::Start(_) => "Start",
            CellKind::Goal => "Goal",
            CellKind::Blocked => "Blocked",
        }
    }
}

/// A static cell annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridElement {
    pub kind: CellKind,
    pub location: Location,
}

impl std::fmt::Display for GridElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.kind.name(), self.location)
    }
}

/// A door that may toggle between open and closed.
#[derive(Debug, Clone, PartialEq)]
pub struct Door {
    location: Location,
    is_open: bool,
    original_is_open: bool,
    toggle_probability: f64,
}

impl Door {
    pub fn new(location: Location, is_open: bool, toggle_probability: f64) -> Self {
        Self {
            location,
            is_open,
            original_is_open: is_open,
            toggle_probability,
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// State the door was created in, restored by `restore`.
    pub fn original_is_open(&self) -> bool {
        self.original_is_open
    }

    /// Per-step toggle chance when doors are sampled.
    pub fn toggle_probability(&self) -> f64 {
        self.toggle_probability
    }

    pub fn toggle(&mut self) {
        self.is_open = !self.is_open;
    }

    pub fn restore(&mut self) {
        self.is_open = self.original_is_open;
    }
}

impl std::fmt::Display for Door {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.is_open { "open" } else { "closed" };
        write!(f, "{} Door at {}", state, self.location)
    }
}

/// Undirected planning graph over every in-bounds cell.
#[derive(Debug, Clone, Default)]
pub struct ReachabilityGraph {
    adjacency: BTreeMap<Location, Vec<Location>>,
}

impl ReachabilityGraph {
    fn add_node(&mut self, location: Location) {
        self.adjacency.entry(location).or_default();
    }

    fn add_edge(&mut self, a: Location, b: Location) {
        let neighbors = self.adjacency.entry(a).or_default();
        if !neighbors.contains(&b) {
            neighbors.push(b);
        }
        let neighbors = self.adjacency.entry(b).or_default();
        if !neighbors.contains(&a) {
            neighbors.push(a);
        }
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn neighbors(&self, location: Location) -> &[Location] {
        self.adjacency.get(&location).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_edge(&self, a: Location, b: Location) -> bool {
        self.neighbors(a).contains(&b)
    }

    /// Breadth-first shortest path, inclusive of both endpoints.
    pub fn shortest_path(&self, from: Location, to: Location) -> Option<Vec<Location>> {
        if !self.adjacency.contains_key(&from) || !self.adjacency.contains_key(&to) {
            return None;
        }

        let mut parents: HashMap<Location, Location> = HashMap::new();
        let mut queue = VecDeque::new();
        parents.insert(from, from);
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            if current == to {
                let mut path = vec![current];
                let mut cursor = current;
                while cursor != from {
                    cursor = parents[&cursor];
                    path.push(cursor);
                }
                path.reverse();
                return Some(path);
            }

            for &next in self.neighbors(current) {
                if !parents.contains_key(&next) {
                    parents.insert(next, current);
                    queue.push_back(next);
                }
            }
        }

        None
    }
}

/// The static and mutable state of one trial's grid.
#[derive(Debug, Clone)]
pub struct GridModel {
    width: i32,
    height: i32,
    time_limit: u32,

    /// Dominant element per location (non-floor wins over floor)
    cells: BTreeMap<Location, GridElement>,

    /// Doors in row-major order
    doors: Vec<Door>,

    goal: Location,
}

impl GridModel {
    /// Builds a grid from its description.
    ///
    /// Fails with `InvalidGridDescription` on inconsistent dimensions, a
    /// missing or repeated goal, repeated starts, door/spec count mismatch,
    /// doors in the first column, or toggle probabilities outside `[0, 1]`.
    pub fn new(description: &GridDescription, time_limit: u32) -> Result<Self, SimError> {
        let (width, height) = (description.width, description.height);
        if width == 0 || height == 0 {
            return Err(SimError::grid(format!(
                "dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        let width = i32::try_from(width).map_err(|_| SimError::grid("width too large"))?;
        let height = i32::try_from(height).map_err(|_| SimError::grid("height too large"))?;

        if description.layout.len() != height as usize {
            return Err(SimError::grid(format!(
                "layout has {} rows, expected {}",
                description.layout.len(),
                height
            )));
        }

        let mut cells = BTreeMap::new();
        let mut doors = Vec::new();
        let mut specs = description.doors.iter();
        let mut goal = None;
        let mut starts: HashMap<PathColor, Location> = HashMap::new();

        for (y, row) in description.layout.iter().enumerate() {
            if row.len() != width as usize {
                return Err(SimError::grid(format!(
                    "row {} has {} cells, expected {}",
                    y,
                    row.len(),
                    width
                )));
            }

            for (x, cell) in row.iter().enumerate() {
                let location = Location::new(x as i32, y as i32);
                let kind = match cell {
                    LayoutCell::Void => continue,
                    LayoutCell::Floor => CellKind::Floor,
                    LayoutCell::StartRed => CellKind::Start(PathColor::Red),
                    LayoutCell::StartBlue => CellKind::Start(PathColor::Blue),
                    LayoutCell::Goal => CellKind::Goal,
                    LayoutCell::Blocked => CellKind::Blocked,
                    LayoutCell::Door => {
                        if x == 0 {
                            return Err(SimError::grid(format!(
                                "door at {} has no cell to its left",
                                location
                            )));
                        }
                        let spec = specs.next().ok_or_else(|| {
                            SimError::grid(format!("no door spec for door at {}", location))
                        })?;
                        if !(0.0..=1.0).contains(&spec.toggle_probability) {
                            return Err(SimError::grid(format!(
                                "door at {} has toggle probability {}",
                                location, spec.toggle_probability
                            )));
                        }
                        doors.push(Door::new(location, spec.is_open, spec.toggle_probability));
                        CellKind::Floor
                    }
                };

                match kind {
                    CellKind::Goal => {
                        if goal.replace(location).is_some() {
                            return Err(SimError::grid("more than one goal"));
                        }
                    }
                    CellKind::Start(color) => {
                        if starts.insert(color, location).is_some() {
                            return Err(SimError::grid(format!("more than one {} start", color)));
                        }
                    }
                    _ => {}
                }

                cells.insert(location, GridElement { kind, location });
            }
        }

        if specs.next().is_some() {
            return Err(SimError::grid(format!(
                "{} door specs for {} door cells",
                description.doors.len(),
                doors.len()
            )));
        }
        let goal = goal.ok_or_else(|| SimError::grid("no goal cell"))?;

        Ok(Self {
            width,
            height,
            time_limit,
            cells,
            doors,
            goal,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn time_limit(&self) -> u32 {
        self.time_limit
    }

    pub fn in_bounds(&self, location: Location) -> bool {
        (0..self.width).contains(&location.x) && (0..self.height).contains(&location.y)
    }

    /// All in-bounds locations in row-major order.
    pub fn all_locations(&self) -> impl Iterator<Item = Location> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Location::new(x, y)))
    }

    /// Returns the dominant non-door element at `location`.
    pub fn cell_at(&self, location: Location) -> Option<&GridElement> {
        self.cells.get(&location)
    }

    pub fn door_at(&self, location: Location) -> Option<&Door> {
        self.doors.iter().find(|door| door.location == location)
    }

    /// Returns the door on the cell one step right of `location`.
    pub fn door_right_of(&self, location: Location) -> Option<&Door> {
        if location.x + 1 >= self.width {
            return None;
        }
        self.door_at(location.offset(Action::Right))
    }

    pub fn clamp_to_bounds(&self, location: Location) -> Location {
        Location::new(
            location.x.clamp(0, self.width - 1),
            location.y.clamp(0, self.height - 1),
        )
    }

    pub fn step(&self, location: Location, action: Action) -> Location {
        self.clamp_to_bounds(location.offset(action))
    }

    /// Checks walls and bounds. Closed doors do not make an action invalid.
    pub fn is_valid_action(&self, location: Location, action: Action) -> bool {
        let destination = self.step(location, action);
        if action != Action::Stay && destination == location {
            return false;
        }
        !matches!(
            self.cell_at(destination).map(|cell| cell.kind),
            Some(CellKind::Blocked)
        )
    }

    /// Location of the start cell for `path`, or `(0, 0)` if there is none.
    pub fn start_location(&self, path: PathColor) -> Location {
        self.cells
            .values()
            .find(|cell| cell.kind == CellKind::Start(path))
            .map(|cell| cell.location)
            .unwrap_or(Location::new(0, 0))
    }

    pub fn goal_location(&self) -> Location {
        self.goal
    }

    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    pub fn doors_mut(&mut self) -> &mut [Door] {
        &mut self.doors
    }

    /// Restores every door to its original state.
    pub fn restore_doors(&mut self) {
        for door in &mut self.doors {
            door.restore();
        }
    }

    /// Builds the planning graph from scratch.
    ///
    /// Blocked cells get no edges; every other cell is linked to each
    /// neighbour it can validly step into.
    pub fn reachability_graph(&self) -> ReachabilityGraph {
        let mut graph = ReachabilityGraph::default();
        for location in self.all_locations() {
            graph.add_node(location);
            if matches!(self.cell_at(location).map(|c| c.kind), Some(CellKind::Blocked)) {
                continue;
            }
            for action in Action::MOVES {
                if self.is_valid_action(location, action) {
                    graph.add_edge(location, self.step(location, action));
                }
            }
        }
        graph
    }

    /// Shortest sequence of locations from `from` to `to`, inclusive.
    ///
    /// Returns `None` if `to` cannot be reached.
    pub fn shortest_path(&self, from: Location, to: Location) -> Option<Vec<Location>> {
        self.reachability_graph().shortest_path(from, to)
    }

    /// Number of steps on the shortest path, if one exists.
    pub fn shortest_distance(&self, from: Location, to: Location) -> Option<usize> {
        self.shortest_path(from, to).map(|path| path.len() - 1)
    }

    /// Shortest path from `from` to the goal, or `UnreachableGoal`.
    pub fn path_to_goal(&self, from: Location) -> Result<Vec<Location>, SimError> {
        let to = self.goal;
        self.shortest_path(from, to)
            .ok_or(SimError::UnreachableGoal { from, to })
    }
}

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

pub type PortalId = u32;

/// A pair of linked teleport tiles.
///
/// Either endpoint may be unset while the pair is being authored; stepping onto
/// an endpoint whose partner is unset does nothing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeleportPortal {
    pub id: PortalId,
    #[serde(default)]
    pub a: Option<GridPosition>,
    #[serde(default)]
    pub b: Option<GridPosition>,
}

impl TeleportPortal {
    pub const fn new(id: PortalId) -> Self {
        Self { id, a: None, b: None }
    }

    pub const fn linking(id: PortalId, a: GridPosition, b: GridPosition) -> Self {
        Self {
            id,
            a: Some(a),
            b: Some(b),
        }
    }

    pub const fn is_complete(&self) -> bool {
        self.a.is_some() && self.b.is_some()
    }

    pub const fn is_empty(&self) -> bool {
        self.a.is_none() && self.b.is_none()
    }

    pub fn contains(&self, pos: GridPosition) -> bool {
        self.a == Some(pos) || self.b == Some(pos)
    }

    /// Exit for a token entering at `entry`, if this pair sends it anywhere.
    pub fn destination(&self, entry: GridPosition) -> Option<GridPosition> {
        match (self.a, self.b) {
            (Some(a), Some(b)) if a == entry => Some(b),
            (Some(a), Some(b)) if b == entry => Some(a),
            _ => None,
        }
    }

    /// Unsets every endpoint at `pos`, returning whether anything changed.
    pub fn clear(&mut self, pos: GridPosition) -> bool {
        let mut changed = false;
        if self.a == Some(pos) {
            self.a = None;
            changed = true;
        }
        if self.b == Some(pos) {
            self.b = None;
            changed = true;
        }
        changed
    }

    pub fn endpoints(&self) -> impl Iterator<Item = GridPosition> + use<> {
        self.a.into_iter().chain(self.b)
    }
}

/// Everything needed to play one puzzle. Frozen for the duration of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PuzzleDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub size: GridSize,
    pub start: GridPosition,
    pub goal: GridPosition,
    /// Order matters: a point's colour is its index modulo three.
    #[serde(default)]
    pub required_points: Vec<GridPosition>,
    #[serde(default)]
    pub walls: Vec<GridPosition>,
    #[serde(default)]
    pub portals: Vec<TeleportPortal>,
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    /// Seconds the host allows for a run; `None` means unlimited.
    #[serde(default)]
    pub time_limit: Option<f32>,
}

const fn default_difficulty() -> u8 {
    1
}

impl Default for PuzzleDefinition {
    fn default() -> Self {
        Self {
            name: "Tutorial Puzzle".into(),
            description: "Learn the basics of one-stroke puzzles".into(),
            size: GridSize::new(5, 5),
            start: GridPosition::new(2, 4),
            goal: GridPosition::new(2, 0),
            required_points: vec![
                GridPosition::new(1, 2),
                GridPosition::new(2, 2),
                GridPosition::new(3, 2),
            ],
            walls: vec![GridPosition::new(0, 1), GridPosition::new(4, 1)],
            portals: Vec::new(),
            difficulty: default_difficulty(),
            time_limit: None,
        }
    }
}

impl PuzzleDefinition {
    /// Empty puzzle of the given size with start and goal in their default
    /// spots.
    pub fn blank(name: impl Into<String>, size: GridSize) -> Self {
        let mut puzzle = Self {
            name: name.into(),
            description: String::new(),
            size,
            start: GridPosition::new(0, 0),
            goal: GridPosition::new(0, 0),
            required_points: Vec::new(),
            walls: Vec::new(),
            portals: Vec::new(),
            difficulty: default_difficulty(),
            time_limit: None,
        };
        authoring::auto_place_start_goal(&mut puzzle);
        puzzle
    }

    /// Resolves what `pos` is. Start beats goal, goal beats required points,
    /// required points beat walls. Portal endpoints are not a kind of their
    /// own.
    pub fn classify_cell(&self, pos: GridPosition) -> CellKind {
        if pos == self.start {
            CellKind::Start
        } else if pos == self.goal {
            CellKind::Goal
        } else if let Some(index) = self.required_index(pos) {
            PointColor::from_index(index).into()
        } else if self.is_wall(pos) {
            CellKind::Wall
        } else {
            CellKind::Empty
        }
    }

    pub fn required_index(&self, pos: GridPosition) -> Option<usize> {
        self.required_points.iter().position(|&point| point == pos)
    }

    /// Colour of `pos` if it classifies as a required point.
    pub fn required_color(&self, pos: GridPosition) -> Option<PointColor> {
        self.classify_cell(pos).required_color()
    }

    pub fn is_wall(&self, pos: GridPosition) -> bool {
        self.walls.contains(&pos)
    }

    pub fn portal(&self, id: PortalId) -> Option<&TeleportPortal> {
        self.portals.iter().find(|portal| portal.id == id)
    }

    pub fn portal_containing(&self, pos: GridPosition) -> Option<&TeleportPortal> {
        self.portals.iter().find(|portal| portal.contains(pos))
    }

    /// Where a token entering `pos` ends up: the partner endpoint of the first
    /// portal that can send it somewhere, otherwise `pos` itself.
    pub fn check_teleport(&self, pos: GridPosition) -> GridPosition {
        self.portals
            .iter()
            .find_map(|portal| portal.destination(pos))
            .unwrap_or(pos)
    }

    /// Start, goal, required points, and every set portal endpoint.
    pub fn special_positions(&self) -> Vec<GridPosition> {
        let mut positions = Vec::with_capacity(2 + self.required_points.len());
        positions.push(self.start);
        positions.push(self.goal);
        positions.extend_from_slice(&self.required_points);
        positions.extend(self.portals.iter().flat_map(TeleportPortal::endpoints));
        positions
    }

    /// Lower bound on moves: start, every required point, goal.
    pub fn estimated_moves(&self) -> usize {
        self.required_points.len() + 2
    }

    /// Structural sanity check for a finished puzzle.
    pub fn check(&self) -> Result<()> {
        let (rows, cols) = (self.size.rows(), self.size.cols());
        let allowed = MIN_GRID_DIM..=MAX_GRID_DIM;
        if !allowed.contains(&rows) || !allowed.contains(&cols) {
            return Err(PuzzleError::InvalidGridSize { rows, cols });
        }

        self.check_in_grid(self.start)?;
        self.check_in_grid(self.goal)?;
        if self.start == self.goal {
            return Err(PuzzleError::StartIsGoal);
        }

        if self.required_points.is_empty() {
            return Err(PuzzleError::NoRequiredPoints);
        }

        for &pos in self.required_points.iter().chain(&self.walls) {
            self.check_in_grid(pos)?;
        }

        for portal in &self.portals {
            for pos in portal.endpoints() {
                self.check_in_grid(pos)?;
            }
        }

        Ok(())
    }

    fn check_in_grid(&self, pos: GridPosition) -> Result<()> {
        if self.size.contains(pos) {
            Ok(())
        } else {
            Err(PuzzleError::OutOfBounds(pos))
        }
    }
}

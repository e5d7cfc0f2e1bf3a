use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

/// One-way notifications for whatever presents the puzzle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PuzzleEvent {
    /// A required point was left behind for the first time this run.
    RequiredPointCollected {
        position: GridPosition,
        color: PointColor,
    },
    /// The run ended on the goal with every condition met.
    Won { path: Vec<GridPosition> },
    /// A new run started from the start cell.
    Reset,
}

impl PuzzleEvent {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Won { .. })
    }
}

use alloc::string::String;
use thiserror::Error;

use crate::{Coord, GridPosition};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PuzzleError {
    #[error("Position {0} lies outside the grid")]
    OutOfBounds(GridPosition),
    #[error("Grid must be between 3x3 and 20x20, got {rows}x{cols}")]
    InvalidGridSize { rows: Coord, cols: Coord },
    #[error("Start and goal share the same cell")]
    StartIsGoal,
    #[error("Puzzle has no required points")]
    NoRequiredPoints,
    #[error("Stage {0} not found")]
    StageNotFound(String),
    #[error("Required point {0} conflicts with another element")]
    ConflictingRequiredPoint(GridPosition),
    #[error("Malformed stage table: {0}")]
    MalformedStageTable(String),
    #[error("No puzzle loaded")]
    NoPuzzleLoaded,
    #[error("Run is not in progress, no new moves are accepted")]
    NotPlaying,
}

pub type Result<T> = core::result::Result<T, PuzzleError>;

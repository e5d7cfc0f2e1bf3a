#![no_std]

extern crate alloc;

use serde::{Deserialize, Serialize};

pub use authoring::{EditTool, PuzzleEditor};
pub use cell::*;
pub use engine::*;
pub use error::*;
pub use event::*;
pub use puzzle::*;
pub use stage::*;
pub use types::*;
pub use win::WinStatus;

pub mod authoring;
mod cell;
mod engine;
mod error;
mod event;
mod puzzle;
mod stage;
mod types;
pub mod win;

/// Rule switches that apply on top of a puzzle definition.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Require the first three collections to be red, green, then blue.
    pub enforce_color_order: bool,
}

impl RuleConfig {
    pub const fn strict() -> Self {
        Self {
            enforce_color_order: true,
        }
    }
}

/// Why a step was refused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveRejection {
    OutOfBounds,
    Wall,
    AlreadyVisited,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    Rejected(MoveRejection),
    Moved,
    Teleported { from: GridPosition, to: GridPosition },
    Won,
}

impl StepOutcome {
    /// Whether this outcome could have caused an update to the run
    pub const fn has_update(self) -> bool {
        use StepOutcome::*;
        match self {
            Rejected(_) => false,
            Moved => true,
            Teleported { .. } => true,
            Won => true,
        }
    }

    pub const fn is_accepted(self) -> bool {
        self.has_update()
    }
}

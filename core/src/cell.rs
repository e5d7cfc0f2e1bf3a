use core::fmt;
use serde::{Deserialize, Serialize};

/// Checkpoint colour, derived from a required point's index in the list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointColor {
    Red,
    Green,
    Blue,
}

impl PointColor {
    /// Colour of the required point stored at `index`.
    pub const fn from_index(index: usize) -> Self {
        match index % 3 {
            0 => Self::Red,
            1 => Self::Green,
            _ => Self::Blue,
        }
    }

    /// Position of this colour in the strict collection order.
    pub const fn order(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }
}

impl fmt::Display for PointColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
        })
    }
}

/// What a grid cell is, as seen by the rules.
///
/// Never stored per cell; see [`crate::PuzzleDefinition::classify_cell`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Empty,
    Wall,
    Start,
    Goal,
    RequiredRed,
    RequiredGreen,
    RequiredBlue,
}

impl CellKind {
    pub const fn required_color(self) -> Option<PointColor> {
        match self {
            Self::RequiredRed => Some(PointColor::Red),
            Self::RequiredGreen => Some(PointColor::Green),
            Self::RequiredBlue => Some(PointColor::Blue),
            _ => None,
        }
    }

    pub const fn is_required(self) -> bool {
        self.required_color().is_some()
    }

    pub const fn is_blocking(self) -> bool {
        matches!(self, Self::Wall)
    }

    pub const fn is_special(self) -> bool {
        !matches!(self, Self::Empty)
    }
}

impl From<PointColor> for CellKind {
    fn from(color: PointColor) -> Self {
        match color {
            PointColor::Red => Self::RequiredRed,
            PointColor::Green => Self::RequiredGreen,
            PointColor::Blue => Self::RequiredBlue,
        }
    }
}

impl Default for CellKind {
    fn default() -> Self {
        Self::Empty
    }
}

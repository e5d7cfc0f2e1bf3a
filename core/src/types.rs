use core::fmt;
use core::ops::Add;
use serde::{Deserialize, Serialize};

/// Single coordinate axis used for grid rows, columns, and positions.
///
/// Signed so that a step off the top or left edge is still representable and
/// can be rejected by the bounds check instead of wrapping.
pub type Coord = i16;

/// Count type used for total-cell counts.
pub type CellCount = u16;

/// Smallest grid dimension the authoring tools will produce.
pub const MIN_GRID_DIM: Coord = 3;

/// Largest grid dimension the authoring tools will produce.
pub const MAX_GRID_DIM: Coord = 20;

/// A cell address `(row, col)` on the puzzle grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(Coord, Coord)", into = "(Coord, Coord)")]
pub struct GridPosition {
    pub row: Coord,
    pub col: Coord,
}

impl GridPosition {
    pub const fn new(row: Coord, col: Coord) -> Self {
        Self { row, col }
    }

    /// Applies a `(row, col)` delta without any bounds check.
    pub const fn offset(self, (d_row, d_col): (Coord, Coord)) -> Self {
        Self::new(self.row.saturating_add(d_row), self.col.saturating_add(d_col))
    }
}

impl From<(Coord, Coord)> for GridPosition {
    fn from((row, col): (Coord, Coord)) -> Self {
        Self::new(row, col)
    }
}

impl From<GridPosition> for (Coord, Coord) {
    fn from(pos: GridPosition) -> Self {
        (pos.row, pos.col)
    }
}

impl Add<Direction> for GridPosition {
    type Output = GridPosition;

    fn add(self, rhs: Direction) -> Self::Output {
        self.offset(rhs.delta())
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Grid dimensions `(rows, cols)`, each at least one cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(Coord, Coord)", into = "(Coord, Coord)")]
pub struct GridSize {
    rows: Coord,
    cols: Coord,
}

impl GridSize {
    pub fn new(rows: Coord, cols: Coord) -> Self {
        Self {
            rows: rows.max(1),
            cols: cols.max(1),
        }
    }

    /// Same as [`GridSize::new`] but limited to what the editor allows.
    pub fn new_editable(rows: Coord, cols: Coord) -> Self {
        Self::new(
            rows.clamp(MIN_GRID_DIM, MAX_GRID_DIM),
            cols.clamp(MIN_GRID_DIM, MAX_GRID_DIM),
        )
    }

    pub const fn rows(&self) -> Coord {
        self.rows
    }

    pub const fn cols(&self) -> Coord {
        self.cols
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.rows, self.cols)
    }

    pub const fn contains(&self, pos: GridPosition) -> bool {
        pos.row >= 0 && pos.row < self.rows && pos.col >= 0 && pos.col < self.cols
    }

    /// Row-major storage index, `None` when `pos` is outside the grid.
    pub fn linear_index(&self, pos: GridPosition) -> Option<usize> {
        let [row, col] = self.nd_index(pos)?;
        Some(row * self.cols as usize + col)
    }

    /// Index into an `Array2` shaped like [`GridSize::to_nd_index`].
    pub fn nd_index(&self, pos: GridPosition) -> Option<[usize; 2]> {
        if !self.contains(pos) {
            return None;
        }
        Some([pos.row as usize, pos.col as usize])
    }

    /// Moves `pos` onto the nearest in-bounds cell.
    pub fn clamp(&self, pos: GridPosition) -> GridPosition {
        GridPosition::new(pos.row.clamp(0, self.rows - 1), pos.col.clamp(0, self.cols - 1))
    }

    /// All cells, row by row.
    pub fn positions(&self) -> impl Iterator<Item = GridPosition> + use<> {
        let (rows, cols) = (self.rows, self.cols);
        (0..rows).flat_map(move |row| (0..cols).map(move |col| GridPosition::new(row, col)))
    }
}

impl From<(Coord, Coord)> for GridSize {
    fn from((rows, cols): (Coord, Coord)) -> Self {
        Self::new(rows, cols)
    }
}

impl From<GridSize> for (Coord, Coord) {
    fn from(size: GridSize) -> Self {
        (size.rows, size.cols)
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for GridSize {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.rows as usize, self.cols as usize]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = if a < 0 { 0 } else { a as CellCount };
    let b = if b < 0 { 0 } else { b as CellCount };
    a.saturating_mul(b)
}

/// One of the four cardinal moves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// `(row, col)` unit vector.
    pub const fn delta(self) -> (Coord, Coord) {
        match self {
            Self::Up => (-1, 0),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
            Self::Right => (0, 1),
        }
    }

    /// Maps a unit vector back to a direction; diagonals and longer jumps are
    /// not moves.
    pub const fn from_delta(delta: (Coord, Coord)) -> Option<Self> {
        match delta {
            (-1, 0) => Some(Self::Up),
            (1, 0) => Some(Self::Down),
            (0, -1) => Some(Self::Left),
            (0, 1) => Some(Self::Right),
            _ => None,
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

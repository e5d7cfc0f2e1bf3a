//! Level-authoring transforms.
//!
//! None of these fail: conflicting or out-of-grid elements are nudged or
//! dropped so the definition always stays playable.

use alloc::vec::Vec;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::*;
pub use editor::*;
pub use portals::*;

mod editor;
mod portals;

/// What [`validate_positions`] had to change.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub goal_moved: bool,
    pub dropped_required: Vec<GridPosition>,
    pub dropped_walls: Vec<GridPosition>,
    pub cleared_endpoints: Vec<(PortalId, GridPosition)>,
    pub removed_portals: Vec<PortalId>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        !self.goal_moved
            && self.dropped_required.is_empty()
            && self.dropped_walls.is_empty()
            && self.cleared_endpoints.is_empty()
            && self.removed_portals.is_empty()
    }
}

/// Makes start, goal, required points, and walls pairwise distinct.
///
/// Start never moves. A goal on the start shifts one column. Required points
/// and then walls are scanned from the back, so of two equal entries the
/// later one survives. Portal endpoints on start, goal, or a required point
/// are unset, and portals left with no endpoint are removed. Walls do not
/// displace portal endpoints.
pub fn validate_positions(definition: &mut PuzzleDefinition) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut reserved = HashSet::new();
    reserved.insert(definition.start);

    if definition.goal == definition.start {
        let shift = if definition.goal.col > 0 { -1 } else { 1 };
        definition.goal = definition.goal.offset((0, shift));
        report.goal_moved = true;
        log::debug!("Goal overlapped start, moved to {}", definition.goal);
    }
    reserved.insert(definition.goal);

    report.dropped_required = retain_unreserved(&mut definition.required_points, &mut reserved);
    let mut occupied = reserved.clone();
    report.dropped_walls = retain_unreserved(&mut definition.walls, &mut occupied);

    definition.portals.retain_mut(|portal| {
        for pos in portal.endpoints() {
            if reserved.contains(&pos) {
                portal.clear(pos);
                report.cleared_endpoints.push((portal.id, pos));
            }
        }
        if portal.is_empty() {
            report.removed_portals.push(portal.id);
            false
        } else {
            true
        }
    });

    if !report.is_clean() {
        log::debug!("Validation adjusted {:?}: {report:?}", definition.name);
    }
    report
}

/// Keeps entries not yet in `reserved`, scanning from the back, and reserves
/// what it keeps. Returns the dropped entries in scan order.
fn retain_unreserved(
    positions: &mut Vec<GridPosition>,
    reserved: &mut HashSet<GridPosition>,
) -> Vec<GridPosition> {
    let mut kept = Vec::with_capacity(positions.len());
    let mut dropped = Vec::new();
    for &pos in positions.iter().rev() {
        if reserved.insert(pos) {
            kept.push(pos);
        } else {
            dropped.push(pos);
        }
    }
    kept.reverse();
    *positions = kept;
    dropped
}

/// Adopts `size` and pulls every element inside it. Portal endpoints outside
/// the new grid are unset instead of clamped.
pub fn clamp_positions_to_grid(definition: &mut PuzzleDefinition, size: GridSize) {
    definition.size = size;
    definition.start = size.clamp(definition.start);
    definition.goal = size.clamp(definition.goal);

    for pos in definition
        .required_points
        .iter_mut()
        .chain(definition.walls.iter_mut())
    {
        *pos = size.clamp(*pos);
    }

    definition.portals.retain_mut(|portal| {
        portal.a = portal.a.filter(|&pos| size.contains(pos));
        portal.b = portal.b.filter(|&pos| size.contains(pos));
        !portal.is_empty()
    });
}

/// Start on the last column and goal on the first, both on the middle row.
pub fn auto_place_start_goal(definition: &mut PuzzleDefinition) {
    let size = definition.size;
    let middle_row = size.rows() / 2;
    definition.start = GridPosition::new(middle_row, size.cols() - 1);
    definition.goal = GridPosition::new(middle_row, 0);
    log::debug!(
        "Auto-placed start {} and goal {}",
        definition.start,
        definition.goal
    );
}

/// Replaces the required points with one red, green, and blue point down the
/// middle column. Grids with fewer than three rows get none.
pub fn auto_place_rgb_points(definition: &mut PuzzleDefinition) {
    definition.required_points.clear();

    let size = definition.size;
    if size.rows() < 3 {
        return;
    }

    let middle_col = size.cols() / 2;
    definition.required_points.extend([
        GridPosition::new(1, middle_col),
        GridPosition::new(size.rows() / 2, middle_col),
        GridPosition::new(size.rows() - 2, middle_col),
    ]);
    log::debug!("Auto-placed RGB points in column {middle_col}");
}

/// Resizes to `size` (limited to the editable range), re-placing start and
/// goal if either fell outside the new grid.
pub fn resize_grid(definition: &mut PuzzleDefinition, size: GridSize) -> ValidationReport {
    let size = GridSize::new_editable(size.rows(), size.cols());
    let displaced = !size.contains(definition.start) || !size.contains(definition.goal);

    clamp_positions_to_grid(definition, size);
    if displaced {
        auto_place_start_goal(definition);
    }

    log::info!("Grid resized to {size}");
    validate_positions(definition)
}

/// Action a click on a cell performs in the editor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditTool {
    Start,
    Goal,
    /// Adds a required point, or removes it if the cell already is one.
    RequiredPoint,
    /// Adds a wall, or removes it if the cell already is one.
    Wall,
    /// Clears required points, walls, and portal endpoints from the cell.
    Erase,
    Teleport(PortalId),
}

impl Default for EditTool {
    fn default() -> Self {
        Self::Wall
    }
}

/// Applies `tool` at `pos`, then re-validates. Clicks outside the grid are
/// ignored.
pub fn apply_edit(
    definition: &mut PuzzleDefinition,
    pos: GridPosition,
    tool: EditTool,
) -> ValidationReport {
    if !definition.size.contains(pos) {
        log::debug!("Ignored {tool:?} outside the grid at {pos}");
        return ValidationReport::default();
    }

    match tool {
        EditTool::Start => definition.start = pos,
        EditTool::Goal => definition.goal = pos,
        EditTool::RequiredPoint => toggle_membership(&mut definition.required_points, pos),
        EditTool::Wall => toggle_membership(&mut definition.walls, pos),
        EditTool::Erase => {
            definition.required_points.retain(|&point| point != pos);
            definition.walls.retain(|&wall| wall != pos);
            remove_from_all_teleport_portals(definition, pos);
        }
        EditTool::Teleport(id) => toggle_teleport_portal(definition, pos, id),
    }

    validate_positions(definition)
}

fn toggle_membership(positions: &mut Vec<GridPosition>, pos: GridPosition) {
    if positions.contains(&pos) {
        positions.retain(|&other| other != pos);
    } else {
        positions.push(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn pos(row: Coord, col: Coord) -> GridPosition {
        GridPosition::new(row, col)
    }

    fn assert_distinct(definition: &PuzzleDefinition) {
        let mut seen = HashSet::new();
        let all = [definition.start, definition.goal]
            .into_iter()
            .chain(definition.required_points.iter().copied())
            .chain(definition.walls.iter().copied());
        for position in all {
            assert!(seen.insert(position), "{position} appears twice");
        }
    }

    #[test]
    fn validate_moves_goal_off_start() {
        let mut puzzle = PuzzleDefinition::default();
        puzzle.goal = puzzle.start;

        let report = validate_positions(&mut puzzle);

        assert!(report.goal_moved);
        assert_eq!(puzzle.goal, pos(2, 3));

        let mut puzzle = PuzzleDefinition::default();
        puzzle.start = pos(1, 0);
        puzzle.goal = pos(1, 0);
        validate_positions(&mut puzzle);
        assert_eq!(puzzle.goal, pos(1, 1));
    }

    #[test]
    fn validate_keeps_later_duplicates() {
        let mut puzzle = PuzzleDefinition::default();
        puzzle.required_points = vec![pos(1, 2), pos(2, 2), pos(1, 2), puzzle.goal];
        puzzle.walls = vec![pos(0, 0), pos(2, 2), pos(0, 0), puzzle.start];

        let report = validate_positions(&mut puzzle);

        assert_eq!(puzzle.required_points, vec![pos(2, 2), pos(1, 2)]);
        assert_eq!(report.dropped_required, vec![pos(2, 0), pos(1, 2)]);
        assert_eq!(puzzle.walls, vec![pos(0, 0)]);
        assert_eq!(report.dropped_walls, vec![pos(2, 4), pos(2, 2), pos(0, 0)]);
        assert_distinct(&puzzle);
    }

    #[test]
    fn validate_clears_portal_endpoints_on_reserved_cells() {
        let mut puzzle = PuzzleDefinition::default();
        puzzle.portals = vec![
            TeleportPortal::linking(1, pos(2, 4), pos(0, 0)),
            TeleportPortal::linking(2, pos(1, 2), pos(2, 0)),
        ];

        let report = validate_positions(&mut puzzle);

        assert_eq!(
            puzzle.portals,
            vec![TeleportPortal {
                id: 1,
                a: None,
                b: Some(pos(0, 0)),
            }]
        );
        assert_eq!(report.removed_portals, vec![2]);
    }

    #[test]
    fn validate_keeps_portal_endpoints_on_walls() {
        let mut puzzle = PuzzleDefinition::default();
        let portal = TeleportPortal::linking(1, pos(0, 1), pos(0, 3));
        puzzle.portals = vec![portal];

        let report = validate_positions(&mut puzzle);

        assert_eq!(puzzle.portals, vec![portal]);
        assert!(report.cleared_endpoints.is_empty());
        assert!(report.is_clean());
    }

    #[test]
    fn validated_definitions_are_distinct() {
        let mut puzzle = PuzzleDefinition::default();
        puzzle.goal = puzzle.start;
        puzzle.required_points.extend([pos(2, 4), pos(2, 3), pos(0, 1)]);
        puzzle.walls.extend([pos(2, 3), pos(1, 2), pos(4, 4), pos(4, 4)]);

        validate_positions(&mut puzzle);

        assert_distinct(&puzzle);
        assert!(validate_positions(&mut puzzle).is_clean());
    }

    #[test]
    fn clamp_pulls_elements_into_smaller_grid() {
        let mut puzzle = PuzzleDefinition::blank("wide", GridSize::new(8, 8));
        puzzle.required_points = vec![pos(6, 6), pos(1, 1)];
        puzzle.walls = vec![pos(7, 0)];
        puzzle.portals = vec![
            TeleportPortal::linking(1, pos(1, 1), pos(7, 7)),
            TeleportPortal::linking(2, pos(6, 6), pos(7, 7)),
        ];

        clamp_positions_to_grid(&mut puzzle, GridSize::new(4, 4));

        assert_eq!(puzzle.size, GridSize::new(4, 4));
        assert_eq!(puzzle.start, pos(3, 3));
        assert_eq!(puzzle.goal, pos(3, 0));
        assert_eq!(puzzle.required_points, vec![pos(3, 3), pos(1, 1)]);
        assert_eq!(puzzle.walls, vec![pos(3, 0)]);
        assert_eq!(
            puzzle.portals,
            vec![TeleportPortal {
                id: 1,
                a: Some(pos(1, 1)),
                b: None,
            }]
        );
    }

    #[test]
    fn auto_place_uses_middle_row() {
        let mut puzzle = PuzzleDefinition::blank("p", GridSize::new(5, 5));
        auto_place_start_goal(&mut puzzle);

        assert_eq!(puzzle.start, pos(2, 4));
        assert_eq!(puzzle.goal, pos(2, 0));
    }

    #[test]
    fn auto_place_rgb_replaces_points() {
        let mut puzzle = PuzzleDefinition::default();
        puzzle.required_points.push(pos(0, 0));

        auto_place_rgb_points(&mut puzzle);
        assert_eq!(puzzle.required_points, vec![pos(1, 2), pos(2, 2), pos(3, 2)]);

        let mut puzzle = PuzzleDefinition::blank("wide", GridSize::new(7, 9));
        auto_place_rgb_points(&mut puzzle);
        assert_eq!(puzzle.required_points, vec![pos(1, 4), pos(3, 4), pos(5, 4)]);

        let mut puzzle = PuzzleDefinition::blank("flat", GridSize::new(2, 9));
        puzzle.required_points.push(pos(0, 0));
        auto_place_rgb_points(&mut puzzle);
        assert!(puzzle.required_points.is_empty());
    }

    #[test]
    fn resize_replaces_displaced_start_and_goal() {
        let mut puzzle = PuzzleDefinition::blank("big", GridSize::new(9, 9));
        assert_eq!(puzzle.start, pos(4, 8));

        let report = resize_grid(&mut puzzle, GridSize::new(5, 5));

        assert!(report.is_clean());
        assert_eq!(puzzle.start, pos(2, 4));
        assert_eq!(puzzle.goal, pos(2, 0));
    }

    #[test]
    fn resize_keeps_start_and_goal_that_still_fit() {
        let mut puzzle = PuzzleDefinition::default();
        puzzle.start = pos(0, 0);
        puzzle.goal = pos(1, 1);

        resize_grid(&mut puzzle, GridSize::new(3, 40));

        assert_eq!(puzzle.size, GridSize::new(3, 20));
        assert_eq!(puzzle.start, pos(0, 0));
        assert_eq!(puzzle.goal, pos(1, 1));
        // (3, 2) clamps onto (2, 2) and the later copy survives
        assert_eq!(puzzle.required_points, vec![pos(1, 2), pos(2, 2)]);
        assert_distinct(&puzzle);
    }

    #[test]
    fn edit_tools_toggle_and_erase() {
        let mut puzzle = PuzzleDefinition::default();

        apply_edit(&mut puzzle, pos(0, 0), EditTool::Wall);
        assert!(puzzle.is_wall(pos(0, 0)));
        apply_edit(&mut puzzle, pos(0, 0), EditTool::Wall);
        assert!(!puzzle.is_wall(pos(0, 0)));

        apply_edit(&mut puzzle, pos(4, 4), EditTool::RequiredPoint);
        assert_eq!(puzzle.classify_cell(pos(4, 4)), CellKind::RequiredRed);

        apply_edit(&mut puzzle, pos(3, 3), EditTool::Teleport(1));
        apply_edit(&mut puzzle, pos(4, 4), EditTool::Erase);
        apply_edit(&mut puzzle, pos(3, 3), EditTool::Erase);
        assert_eq!(puzzle.classify_cell(pos(4, 4)), CellKind::Empty);
        assert!(puzzle.portals.is_empty());

        assert!(apply_edit(&mut puzzle, pos(9, 9), EditTool::Wall).is_clean());
        assert!(!puzzle.is_wall(pos(9, 9)));
    }

    #[test]
    fn moving_start_onto_point_drops_point() {
        let mut puzzle = PuzzleDefinition::default();

        let report = apply_edit(&mut puzzle, pos(1, 2), EditTool::Start);

        assert_eq!(puzzle.start, pos(1, 2));
        assert_eq!(report.dropped_required, vec![pos(1, 2)]);
        assert_eq!(puzzle.classify_cell(pos(2, 2)), CellKind::RequiredRed);
    }
}

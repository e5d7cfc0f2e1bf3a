use std::fmt::Write;

use stroke_core::*;

/// Text picture of a puzzle, one line per row.
///
/// `@` is the token, `*` a cell already left behind, `S`/`X` start and goal,
/// `r`/`g`/`b` required points, `#` walls, `o` portal endpoints.
pub fn render(definition: &PuzzleDefinition, run: Option<&RunState>) -> String {
    let size = definition.size;
    let mut out = String::with_capacity(usize::from(size.total_cells()) * 2);

    for pos in size.positions() {
        let glyph = cell_glyph(definition, run, pos);
        out.push(glyph);
        if pos.col + 1 == size.cols() {
            out.push('\n');
        } else {
            out.push(' ');
        }
    }
    out
}

fn cell_glyph(definition: &PuzzleDefinition, run: Option<&RunState>, pos: GridPosition) -> char {
    if let Some(run) = run {
        if run.current_position() == Some(pos) {
            return '@';
        }
        if run.has_visited(pos) {
            return '*';
        }
    }

    match definition.classify_cell(pos) {
        CellKind::Start => 'S',
        CellKind::Goal => 'X',
        CellKind::RequiredRed => 'r',
        CellKind::RequiredGreen => 'g',
        CellKind::RequiredBlue => 'b',
        CellKind::Wall => '#',
        CellKind::Empty if definition.portal_containing(pos).is_some() => 'o',
        CellKind::Empty => '.',
    }
}

/// One-line summary of where a run stands.
pub fn summary(definition: &PuzzleDefinition, run: &RunState) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "{:?} after {} moves ({} teleports), {:.0}% of required points",
        run.phase(),
        run.move_count(),
        run.teleport_count(),
        run.completion_percentage(definition),
    );
    out
}

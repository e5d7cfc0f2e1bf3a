use serde::{Deserialize, Serialize};

use crate::*;

/// Why a run has or has not been won yet.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinStatus {
    NotAtGoal,
    MissingRequired,
    WrongOrder,
    Won,
}

impl WinStatus {
    pub const fn is_won(self) -> bool {
        matches!(self, Self::Won)
    }
}

/// Evaluates the win condition for the current run state.
pub fn evaluate(definition: &PuzzleDefinition, run: &RunState, rules: &RuleConfig) -> WinStatus {
    if run.current_position() != Some(definition.goal) {
        return WinStatus::NotAtGoal;
    }

    if !all_required_visited(definition, run) {
        return WinStatus::MissingRequired;
    }

    if rules.enforce_color_order && !is_color_order_correct(definition, run) {
        return WinStatus::WrongOrder;
    }

    WinStatus::Won
}

pub fn check_win(definition: &PuzzleDefinition, run: &RunState, rules: &RuleConfig) -> bool {
    evaluate(definition, run, rules).is_won()
}

pub fn all_required_visited(definition: &PuzzleDefinition, run: &RunState) -> bool {
    definition
        .required_points
        .iter()
        .all(|point| run.visited_required().contains(point))
}

/// Red, green, blue for the first three collections.
///
/// Collections after the third are not order-checked; puzzles with more than
/// three required points only need them all visited.
pub fn is_color_order_correct(definition: &PuzzleDefinition, run: &RunState) -> bool {
    const EXPECTED: [PointColor; 3] = [PointColor::Red, PointColor::Green, PointColor::Blue];

    let collected = run.visited_required();
    if collected.len() < EXPECTED.len() {
        return false;
    }

    collected
        .iter()
        .zip(EXPECTED)
        .all(|(&pos, expected)| definition.required_color(pos) == Some(expected))
}

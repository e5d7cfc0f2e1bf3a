use alloc::vec::{Drain, Vec};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Ready,
    Playing,
    Won,
    /// Reserved for timed runs; nothing transitions here yet.
    Failed,
}

impl GamePhase {
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Failed)
    }
}

impl Default for GamePhase {
    fn default() -> Self {
        Self::Ready
    }
}

/// Progress of a single run. Only [`PlayEngine`] mutates it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    current: Option<GridPosition>,
    visited: Vec<GridPosition>,
    visited_mask: Array2<bool>,
    visited_required: Vec<GridPosition>,
    phase: GamePhase,
    move_count: u32,
    teleport_count: u32,
}

impl RunState {
    pub fn new(size: GridSize) -> Self {
        Self {
            current: None,
            visited: Vec::new(),
            visited_mask: Array2::default(size.to_nd_index()),
            visited_required: Vec::new(),
            phase: Default::default(),
            move_count: 0,
            teleport_count: 0,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// `None` until the first reset, and after a failed load.
    pub fn current_position(&self) -> Option<GridPosition> {
        self.current
    }

    /// Cells left behind this run, in the order they were marked.
    pub fn visited(&self) -> &[GridPosition] {
        &self.visited
    }

    /// Required points in the order they were collected.
    pub fn visited_required(&self) -> &[GridPosition] {
        &self.visited_required
    }

    pub fn has_visited(&self, pos: GridPosition) -> bool {
        self.mask_index(pos)
            .and_then(|index| self.visited_mask.get(index).copied())
            .unwrap_or(false)
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn teleport_count(&self) -> u32 {
        self.teleport_count
    }

    /// Share of required points collected, in percent.
    pub fn completion_percentage(&self, definition: &PuzzleDefinition) -> f32 {
        if definition.required_points.is_empty() {
            return 100.0;
        }
        self.visited_required.len() as f32 / definition.required_points.len() as f32 * 100.0
    }

    pub(crate) fn restart(&mut self, start: GridPosition, size: GridSize) {
        self.clear(size);
        self.current = Some(start);
        self.phase = GamePhase::Playing;
    }

    pub(crate) fn clear(&mut self, size: GridSize) {
        let shape = size.to_nd_index();
        if self.visited_mask.dim() == (shape[0], shape[1]) {
            self.visited_mask.fill(false);
        } else {
            self.visited_mask = Array2::default(shape);
        }
        self.current = None;
        self.visited.clear();
        self.visited_required.clear();
        self.phase = GamePhase::Ready;
        self.move_count = 0;
        self.teleport_count = 0;
    }

    /// Appends `pos` to the path unless it is already on it.
    pub(crate) fn mark_visited(&mut self, pos: GridPosition) -> bool {
        if self.has_visited(pos) || self.visited.contains(&pos) {
            return false;
        }
        if let Some(index) = self.mask_index(pos) {
            self.visited_mask[index] = true;
        }
        self.visited.push(pos);
        true
    }

    pub(crate) fn record_required(&mut self, pos: GridPosition) -> bool {
        if self.visited_required.contains(&pos) {
            return false;
        }
        self.visited_required.push(pos);
        true
    }

    pub(crate) fn move_to(&mut self, pos: GridPosition) {
        self.current = Some(pos);
    }

    fn mask_index(&self, pos: GridPosition) -> Option<[usize; 2]> {
        let (rows, cols) = self.visited_mask.dim();
        let (row, col) = (usize::try_from(pos.row).ok()?, usize::try_from(pos.col).ok()?);
        (row < rows && col < cols).then_some([row, col])
    }
}

/// Checks whether the token may enter `target`.
pub fn validate_move(
    definition: &PuzzleDefinition,
    run: &RunState,
    target: GridPosition,
) -> core::result::Result<(), MoveRejection> {
    if !definition.size.contains(target) {
        Err(MoveRejection::OutOfBounds)
    } else if definition.is_wall(target) {
        Err(MoveRejection::Wall)
    } else if run.has_visited(target) {
        Err(MoveRejection::AlreadyVisited)
    } else {
        Ok(())
    }
}

pub fn is_valid_move(definition: &PuzzleDefinition, run: &RunState, target: GridPosition) -> bool {
    validate_move(definition, run, target).is_ok()
}

/// Owns the frozen puzzle and the run being played on it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayEngine {
    definition: Option<PuzzleDefinition>,
    rules: RuleConfig,
    run: RunState,
    #[serde(skip)]
    events: Vec<PuzzleEvent>,
}

impl PlayEngine {
    /// Engine in the Ready phase; call [`PlayEngine::reset`] to start playing.
    pub fn new(definition: PuzzleDefinition, rules: RuleConfig) -> Self {
        let run = RunState::new(definition.size);
        Self {
            definition: Some(definition),
            rules,
            run,
            events: Vec::new(),
        }
    }

    /// Engine with nothing loaded yet.
    pub fn empty(rules: RuleConfig) -> Self {
        Self {
            definition: None,
            rules,
            run: RunState::new(GridSize::new(1, 1)),
            events: Vec::new(),
        }
    }

    pub fn from_stage(source: &impl StageSource, number: u32, rules: RuleConfig) -> Result<Self> {
        let definition = import_stage(source, number)?;
        Ok(Self::new(definition, rules))
    }

    /// Replaces the loaded puzzle with stage `number`.
    ///
    /// On failure the previous puzzle is dropped and the engine stays Ready
    /// with no position, so it cannot be played until a load succeeds.
    pub fn load_stage(&mut self, source: &impl StageSource, number: u32) -> Result<()> {
        match import_stage(source, number) {
            Ok(definition) => {
                self.load_definition(definition);
                Ok(())
            }
            Err(err) => {
                log::warn!("Failed to load stage {number}: {err}");
                self.definition = None;
                self.run.clear(GridSize::new(1, 1));
                self.events.clear();
                Err(err)
            }
        }
    }

    pub fn load_definition(&mut self, definition: PuzzleDefinition) {
        log::debug!("Loaded puzzle {:?} ({})", definition.name, definition.size);
        self.run.clear(definition.size);
        self.definition = Some(definition);
        self.events.clear();
    }

    pub fn definition(&self) -> Option<&PuzzleDefinition> {
        self.definition.as_ref()
    }

    pub fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    pub fn set_rules(&mut self, rules: RuleConfig) {
        self.rules = rules;
    }

    pub fn run_state(&self) -> &RunState {
        &self.run
    }

    pub fn phase(&self) -> GamePhase {
        self.run.phase
    }

    pub fn current_position(&self) -> Option<GridPosition> {
        self.run.current
    }

    pub fn is_finished(&self) -> bool {
        self.run.phase.is_finished()
    }

    /// Starts a fresh run from the start cell.
    ///
    /// The start cell only counts as visited once the token leaves it.
    /// Notifications from the previous run that were never drained are dropped.
    pub fn reset(&mut self) -> Result<()> {
        let Some(definition) = self.definition.as_ref() else {
            return Err(PuzzleError::NoPuzzleLoaded);
        };

        self.run.restart(definition.start, definition.size);
        self.events.clear();
        self.events.push(PuzzleEvent::Reset);
        log::debug!("Run reset, token at {}", definition.start);
        Ok(())
    }

    pub fn is_valid_move(&self, target: GridPosition) -> bool {
        self.definition
            .as_ref()
            .is_some_and(|definition| is_valid_move(definition, &self.run, target))
    }

    /// Moves the token one cell, following a portal if it lands on one.
    pub fn step(&mut self, direction: Direction) -> Result<StepOutcome> {
        self.check_playing()?;
        let (Some(definition), Some(current)) = (self.definition.as_ref(), self.run.current) else {
            return Err(PuzzleError::NotPlaying);
        };

        let target = current + direction;
        if let Err(rejection) = validate_move(definition, &self.run, target) {
            log::trace!("Rejected {direction:?} from {current}: {rejection:?}");
            return Ok(StepOutcome::Rejected(rejection));
        }

        self.run.mark_visited(current);
        if let Some(color) = definition.required_color(current) {
            if self.run.record_required(current) {
                log::debug!("Collected {color} point at {current}");
                self.events.push(PuzzleEvent::RequiredPointCollected {
                    position: current,
                    color,
                });
            }
        }

        self.run.move_to(target);
        self.run.move_count += 1;

        let mut outcome = StepOutcome::Moved;
        let destination = definition.check_teleport(target);
        if destination != target {
            self.run.mark_visited(target);
            self.run.move_to(destination);
            self.run.mark_visited(destination);
            self.run.teleport_count += 1;
            log::debug!("Teleported from {target} to {destination}");
            outcome = StepOutcome::Teleported {
                from: target,
                to: destination,
            };
        }

        match win::evaluate(definition, &self.run, &self.rules) {
            WinStatus::Won => {
                self.run.phase = GamePhase::Won;
                self.events.push(PuzzleEvent::Won {
                    path: self.run.visited.clone(),
                });
                log::info!(
                    "Puzzle {:?} solved in {} moves",
                    definition.name,
                    self.run.move_count
                );
                outcome = StepOutcome::Won;
            }
            WinStatus::MissingRequired => {
                log::warn!("Reached goal but missing required points");
            }
            WinStatus::WrongOrder => {
                log::warn!("Reached goal but points were collected out of order");
            }
            WinStatus::NotAtGoal => {}
        }

        Ok(outcome)
    }

    pub fn check_win(&self) -> bool {
        self.definition
            .as_ref()
            .is_some_and(|definition| win::check_win(definition, &self.run, &self.rules))
    }

    /// Hands queued notifications to the caller, oldest first.
    ///
    /// The queue holds at most one run's worth: loading or resetting discards
    /// whatever was left undrained.
    pub fn drain_events(&mut self) -> Drain<'_, PuzzleEvent> {
        self.events.drain(..)
    }

    fn check_playing(&self) -> Result<()> {
        if self.definition.is_none() {
            Err(PuzzleError::NoPuzzleLoaded)
        } else if self.run.phase.is_playing() {
            Ok(())
        } else {
            Err(PuzzleError::NotPlaying)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn pos(row: Coord, col: Coord) -> GridPosition {
        GridPosition::new(row, col)
    }

    fn open_puzzle() -> PuzzleDefinition {
        let mut puzzle = PuzzleDefinition::default();
        puzzle.walls.clear();
        puzzle
    }

    fn playing(puzzle: PuzzleDefinition) -> PlayEngine {
        let mut engine = PlayEngine::new(puzzle, RuleConfig::default());
        engine.reset().unwrap();
        engine.drain_events().for_each(drop);
        engine
    }

    #[test]
    fn new_engine_waits_in_ready() {
        let mut engine = PlayEngine::new(open_puzzle(), RuleConfig::default());

        assert_eq!(engine.phase(), GamePhase::Ready);
        assert_eq!(engine.current_position(), None);
        assert_eq!(engine.step(Direction::Left), Err(PuzzleError::NotPlaying));
    }

    #[test]
    fn reset_starts_run_without_marking_start() {
        let mut engine = PlayEngine::new(open_puzzle(), RuleConfig::default());

        engine.reset().unwrap();

        assert_eq!(engine.phase(), GamePhase::Playing);
        assert_eq!(engine.current_position(), Some(pos(2, 4)));
        assert!(engine.run_state().visited().is_empty());
        assert!(!engine.run_state().has_visited(pos(2, 4)));
        assert_eq!(engine.drain_events().collect::<Vec<_>>(), vec![PuzzleEvent::Reset]);
    }

    #[test]
    fn step_marks_departed_cell() {
        let mut engine = playing(open_puzzle());

        assert_eq!(engine.step(Direction::Left), Ok(StepOutcome::Moved));

        assert_eq!(engine.current_position(), Some(pos(2, 3)));
        assert_eq!(engine.run_state().visited(), &[pos(2, 4)]);
        assert_eq!(engine.run_state().move_count(), 1);
    }

    #[test]
    fn rejected_steps_leave_state_untouched() {
        let mut puzzle = open_puzzle();
        puzzle.walls.push(pos(1, 4));
        let mut engine = playing(puzzle);
        let before = engine.run_state().clone();

        assert_eq!(
            engine.step(Direction::Right),
            Ok(StepOutcome::Rejected(MoveRejection::OutOfBounds))
        );
        assert_eq!(
            engine.step(Direction::Up),
            Ok(StepOutcome::Rejected(MoveRejection::Wall))
        );
        assert_eq!(engine.run_state(), &before);

        engine.step(Direction::Left).unwrap();
        assert_eq!(
            engine.step(Direction::Right),
            Ok(StepOutcome::Rejected(MoveRejection::AlreadyVisited))
        );
        assert_eq!(engine.current_position(), Some(pos(2, 3)));
        assert_eq!(engine.drain_events().count(), 0);
    }

    #[test]
    fn reset_discards_undrained_events() {
        let mut engine = PlayEngine::new(open_puzzle(), RuleConfig::default());

        for _ in 0..3 {
            engine.reset().unwrap();
            engine.step(Direction::Left).unwrap();
            engine.step(Direction::Left).unwrap();
            engine.step(Direction::Left).unwrap();
        }
        engine.reset().unwrap();

        assert_eq!(engine.drain_events().collect::<Vec<_>>(), vec![PuzzleEvent::Reset]);
    }

    #[test]
    fn leaving_required_point_collects_it_once() {
        let mut engine = playing(open_puzzle());

        engine.step(Direction::Left).unwrap();
        engine.step(Direction::Left).unwrap();
        assert!(engine.run_state().visited_required().is_empty());

        engine.step(Direction::Left).unwrap();

        assert_eq!(engine.run_state().visited_required(), &[pos(2, 2)]);
        assert_eq!(
            engine.drain_events().collect::<Vec<_>>(),
            vec![PuzzleEvent::RequiredPointCollected {
                position: pos(2, 2),
                color: PointColor::Green,
            }]
        );
    }

    #[test]
    fn teleport_relocates_within_same_step() {
        let mut puzzle = open_puzzle();
        puzzle.portals.push(TeleportPortal::linking(1, pos(2, 3), pos(4, 0)));
        let mut engine = playing(puzzle);

        let outcome = engine.step(Direction::Left).unwrap();

        assert_eq!(
            outcome,
            StepOutcome::Teleported {
                from: pos(2, 3),
                to: pos(4, 0),
            }
        );
        assert_eq!(engine.current_position(), Some(pos(4, 0)));
        assert!(engine.run_state().has_visited(pos(2, 3)));
        assert!(engine.run_state().has_visited(pos(4, 0)));
        assert_eq!(engine.run_state().teleport_count(), 1);
    }

    #[test]
    fn orphan_portal_endpoint_does_not_teleport() {
        let mut puzzle = open_puzzle();
        puzzle.portals.push(TeleportPortal {
            id: 1,
            a: Some(pos(2, 3)),
            b: None,
        });
        let mut engine = playing(puzzle);

        assert_eq!(engine.step(Direction::Left), Ok(StepOutcome::Moved));
        assert_eq!(engine.current_position(), Some(pos(2, 3)));
        assert!(!engine.run_state().has_visited(pos(2, 3)));
    }

    #[test]
    fn teleport_onto_visited_cell_is_still_taken() {
        let mut puzzle = open_puzzle();
        puzzle.portals.push(TeleportPortal::linking(1, pos(0, 3), pos(2, 4)));
        let mut engine = playing(puzzle);

        // leave the start, then walk round to the portal whose exit is the start
        engine.step(Direction::Up).unwrap();
        engine.step(Direction::Up).unwrap();
        let outcome = engine.step(Direction::Left).unwrap();

        assert_eq!(
            outcome,
            StepOutcome::Teleported {
                from: pos(0, 3),
                to: pos(2, 4),
            }
        );
        assert_eq!(engine.current_position(), Some(pos(2, 4)));
        let visited = engine.run_state().visited();
        let start_visits = visited.iter().filter(|&&p| p == pos(2, 4)).count();
        assert_eq!(start_visits, 1);
    }

    #[test]
    fn winning_step_emits_path_and_ends_run() {
        let mut puzzle = open_puzzle();
        puzzle.required_points = vec![pos(2, 2)];
        let mut engine = playing(puzzle);

        for _ in 0..3 {
            engine.step(Direction::Left).unwrap();
        }
        assert_eq!(engine.step(Direction::Left), Ok(StepOutcome::Won));

        assert_eq!(engine.phase(), GamePhase::Won);
        assert!(engine.is_finished());
        assert!(engine.check_win());
        let events: Vec<_> = engine.drain_events().collect();
        assert_eq!(
            events.last(),
            Some(&PuzzleEvent::Won {
                path: vec![pos(2, 4), pos(2, 3), pos(2, 2), pos(2, 1)],
            })
        );
        assert_eq!(engine.step(Direction::Down), Err(PuzzleError::NotPlaying));
    }

    #[test]
    fn reset_after_win_clears_progress() {
        let mut puzzle = open_puzzle();
        puzzle.required_points.clear();
        let mut engine = playing(puzzle);
        for _ in 0..4 {
            engine.step(Direction::Left).unwrap();
        }
        assert_eq!(engine.phase(), GamePhase::Won);

        engine.reset().unwrap();

        assert_eq!(engine.phase(), GamePhase::Playing);
        assert!(engine.run_state().visited().is_empty());
        assert_eq!(engine.run_state().move_count(), 0);
        assert!(engine.is_valid_move(pos(2, 3)));
    }

    #[test]
    fn empty_engine_cannot_start() {
        let mut engine = PlayEngine::empty(RuleConfig::default());

        assert_eq!(engine.reset(), Err(PuzzleError::NoPuzzleLoaded));
        assert_eq!(engine.step(Direction::Up), Err(PuzzleError::NoPuzzleLoaded));
        assert!(!engine.is_valid_move(pos(0, 0)));
    }

    #[test]
    fn completion_tracks_collected_share() {
        let mut engine = playing(open_puzzle());
        let definition = engine.definition().unwrap().clone();

        assert_eq!(engine.run_state().completion_percentage(&definition), 0.0);
        for _ in 0..3 {
            engine.step(Direction::Left).unwrap();
        }
        let collected = engine.run_state().completion_percentage(&definition);
        assert!((collected - 100.0 / 3.0).abs() < 1e-4);
    }
}

use alloc::string::String;

use crate::authoring::*;
use crate::*;

/// Draft puzzle plus the editor's current tool.
///
/// Every action leaves the draft validated, so [`PuzzleEditor::build`] always
/// hands out a definition whose elements are distinct and inside the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct PuzzleEditor {
    draft: PuzzleDefinition,
    tool: EditTool,
    portal_id: PortalId,
}

impl Default for PuzzleEditor {
    fn default() -> Self {
        Self::new(PuzzleDefinition::default())
    }
}

impl PuzzleEditor {
    pub fn new(mut draft: PuzzleDefinition) -> Self {
        let size = draft.size;
        clamp_positions_to_grid(&mut draft, size);
        validate_positions(&mut draft);
        Self {
            draft,
            tool: EditTool::default(),
            portal_id: 1,
        }
    }

    pub fn blank(name: impl Into<String>, size: GridSize) -> Self {
        let size = GridSize::new_editable(size.rows(), size.cols());
        Self::new(PuzzleDefinition::blank(name, size))
    }

    pub fn draft(&self) -> &PuzzleDefinition {
        &self.draft
    }

    pub fn tool(&self) -> EditTool {
        self.tool
    }

    /// Selecting the teleport tool also makes its id the current portal id.
    pub fn set_tool(&mut self, tool: EditTool) {
        if let EditTool::Teleport(id) = tool {
            self.portal_id = id;
        }
        self.tool = tool;
    }

    pub fn portal_id(&self) -> PortalId {
        self.portal_id
    }

    pub fn set_portal_id(&mut self, id: PortalId) {
        self.portal_id = id;
        if let EditTool::Teleport(_) = self.tool {
            self.tool = EditTool::Teleport(id);
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.draft.description = description.into();
    }

    pub fn set_difficulty(&mut self, difficulty: u8) {
        self.draft.difficulty = difficulty.clamp(1, 10);
    }

    pub fn set_time_limit(&mut self, seconds: Option<f32>) {
        self.draft.time_limit = seconds.filter(|&seconds| seconds > 0.0);
    }

    /// Applies the current tool at `pos`.
    pub fn click(&mut self, pos: GridPosition) -> ValidationReport {
        apply_edit(&mut self.draft, pos, self.tool)
    }

    pub fn resize(&mut self, size: GridSize) -> ValidationReport {
        resize_grid(&mut self.draft, size)
    }

    pub fn auto_place_start_goal(&mut self) -> ValidationReport {
        auto_place_start_goal(&mut self.draft);
        validate_positions(&mut self.draft)
    }

    pub fn auto_place_rgb_points(&mut self) -> ValidationReport {
        auto_place_rgb_points(&mut self.draft);
        validate_positions(&mut self.draft)
    }

    pub fn clear_teleport_portals(&mut self) {
        clear_teleport_portals(&mut self.draft);
    }

    pub fn auto_complete_teleport_pairs(&mut self) -> ValidationReport {
        auto_complete_teleport_pairs(&mut self.draft);
        validate_positions(&mut self.draft)
    }

    /// Frozen copy of the draft, ready to play or save.
    pub fn build(&self) -> PuzzleDefinition {
        self.draft.clone()
    }

    pub fn into_definition(self) -> PuzzleDefinition {
        self.draft
    }

    /// Starts a play-test run of the current draft.
    pub fn test_puzzle(&self, rules: RuleConfig) -> Result<PlayEngine> {
        let mut engine = PlayEngine::new(self.build(), rules);
        engine.reset()?;
        log::info!("Testing puzzle {:?}", self.draft.name);
        Ok(engine)
    }
}

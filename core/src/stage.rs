use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

/// Lookup key for stage `number`, e.g. `Stage_07`.
pub fn stage_key(number: u32) -> String {
    format!("Stage_{number:02}")
}

/// One stage as stored by whatever keeps the level data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Number of columns.
    pub width: Coord,
    /// Number of rows.
    pub height: Coord,
    pub start: GridPosition,
    pub goal: GridPosition,
    #[serde(default)]
    pub required_points: Vec<GridPosition>,
    #[serde(default)]
    pub walls: Vec<GridPosition>,
    #[serde(default)]
    pub portals: Vec<TeleportPortal>,
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    /// Seconds; zero or absent means unlimited.
    #[serde(default)]
    pub time_limit: f32,
}

const fn default_difficulty() -> u8 {
    1
}

impl StageRecord {
    /// Straight copy into a definition, with no validation.
    pub fn to_definition(&self) -> PuzzleDefinition {
        PuzzleDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            size: GridSize::new(self.height, self.width),
            start: self.start,
            goal: self.goal,
            required_points: self.required_points.clone(),
            walls: self.walls.clone(),
            portals: self.portals.clone(),
            difficulty: self.difficulty.clamp(1, 10),
            time_limit: (self.time_limit > 0.0).then_some(self.time_limit),
        }
    }

    pub fn from_definition(definition: &PuzzleDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            description: definition.description.clone(),
            width: definition.size.cols(),
            height: definition.size.rows(),
            start: definition.start,
            goal: definition.goal,
            required_points: definition.required_points.clone(),
            walls: definition.walls.clone(),
            portals: definition.portals.clone(),
            difficulty: definition.difficulty,
            time_limit: definition.time_limit.unwrap_or(0.0),
        }
    }
}

/// Anything that can hand out stage records by key.
pub trait StageSource {
    fn stage_record(&self, key: &str) -> Option<StageRecord>;
}

/// In-memory stage table keyed by [`stage_key`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageTable {
    stages: BTreeMap<String, StageRecord>,
}

impl StageTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| PuzzleError::MalformedStageTable(err.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|err| PuzzleError::MalformedStageTable(err.to_string()))
    }

    pub fn get(&self, key: &str) -> Option<&StageRecord> {
        self.stages.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, record: StageRecord) -> Option<StageRecord> {
        self.stages.insert(key.into(), record)
    }

    /// Stores `definition` as stage `number`, replacing what was there.
    pub fn save_stage(&mut self, number: u32, definition: &PuzzleDefinition) {
        self.insert(stage_key(number), StageRecord::from_definition(definition));
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.stages.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StageRecord)> {
        self.stages.iter().map(|(key, record)| (key.as_str(), record))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut StageRecord)> {
        self.stages.iter_mut().map(|(key, record)| (key.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl StageSource for StageTable {
    fn stage_record(&self, key: &str) -> Option<StageRecord> {
        self.get(key).cloned()
    }
}

/// Loads stage `number` from `source` into a playable definition.
///
/// Elements are pulled into the grid and de-duplicated the same way the
/// editor does it. A stage whose required points collide with each other or
/// with start, goal, or walls cannot be played and is refused.
pub fn import_stage(source: &impl StageSource, number: u32) -> Result<PuzzleDefinition> {
    let key = stage_key(number);
    let record = source
        .stage_record(&key)
        .ok_or_else(|| PuzzleError::StageNotFound(key.clone()))?;

    let mut definition = record.to_definition();
    let size = definition.size;
    authoring::clamp_positions_to_grid(&mut definition, size);
    let report = authoring::validate_positions(&mut definition);

    if let Some(&point) = report.dropped_required.first() {
        return Err(PuzzleError::ConflictingRequiredPoint(point));
    }

    log::debug!("Imported {key} as {:?}", definition.name);
    Ok(definition)
}

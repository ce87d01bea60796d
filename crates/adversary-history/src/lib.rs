//! adversary-history: Bounded scenario history and the export file format.
//!
//! Completed scenarios are archived as [`ExportedScenario`] records —
//! the same JSON shape used for file export/import — in a most-recent-first
//! list capped at a configured maximum. Each persisted record carries a
//! BLAKE3 content hash so tampering is detectable on load.

pub mod export;
pub mod hash;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use adversary_core::types::{ScenarioInput, SimulationScenario};

pub use export::{export_filename, read_export, write_export, ExportError};
pub use store::{FileHistoryStore, HistoryError, HistoryStore, MemoryHistoryStore};

/// The unit of serialization for export, import, and history persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportedScenario {
    pub user_input: ScenarioInput,
    pub scenario_data: SimulationScenario,
    /// When the scenario was archived. Optional for compatibility with
    /// older export files that predate the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ExportedScenario {
    pub fn new(user_input: ScenarioInput, scenario_data: SimulationScenario) -> Self {
        Self {
            user_input,
            scenario_data,
            timestamp: Some(Utc::now()),
        }
    }

    /// The scenario title — the (observed) de-duplication key in history.
    pub fn title(&self) -> &str {
        &self.scenario_data.title
    }
}

/// A history entry as persisted: the exported scenario plus bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub entry: ExportedScenario,
    /// BLAKE3 hex hash of `entry`, computed on insert.
    pub content_hash: String,
}

impl HistoryRecord {
    pub fn new(entry: ExportedScenario) -> Self {
        let content_hash = hash::compute_entry_hash(&entry);
        Self {
            id: Uuid::new_v4(),
            entry,
            content_hash,
        }
    }

    /// Whether the stored hash still matches the entry's content.
    pub fn verify_integrity(&self) -> bool {
        self.content_hash == hash::compute_entry_hash(&self.entry)
    }
}

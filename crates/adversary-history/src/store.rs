//! History storage — trait + file-backed and in-memory implementations.
//!
//! The store keeps a most-recent-first list of completed scenarios, capped
//! at a configured maximum. Inserting an entry removes any existing entry
//! with the same scenario title before truncation. Writes replace the whole
//! list (last writer wins); there is no cross-process conflict resolution.

use std::fs;
use std::path::{Path, PathBuf};

use crate::{ExportedScenario, HistoryRecord};

/// Errors that can occur during history storage operations.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Integrity check failed for history record {0}: stored hash does not match content")]
    IntegrityViolation(uuid::Uuid),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Trait for history persistence backends.
pub trait HistoryStore {
    /// Insert an entry at the front, de-duplicating by scenario title and
    /// truncating to the configured maximum.
    fn add(&mut self, entry: ExportedScenario) -> Result<(), HistoryError>;

    /// Return the current list, most recent first, verifying integrity.
    fn list(&self) -> Result<Vec<HistoryRecord>, HistoryError>;

    /// Empty the store.
    fn clear(&mut self) -> Result<(), HistoryError>;
}

/// Reject any record whose stored hash no longer matches its content.
fn verify_records(records: &[HistoryRecord]) -> Result<(), HistoryError> {
    for record in records {
        if !record.verify_integrity() {
            return Err(HistoryError::IntegrityViolation(record.id));
        }
    }
    Ok(())
}

/// Shared insert discipline: front insertion, title de-duplication, cap.
fn insert_record(records: &mut Vec<HistoryRecord>, record: HistoryRecord, limit: usize) {
    let title = record.entry.title().to_string();
    records.retain(|existing| {
        let duplicate = existing.entry.title() == title;
        if duplicate && existing.content_hash != record.content_hash {
            // Same title, different content: the observed de-duplication key
            // is the title, so the older entry is still dropped, but loudly.
            tracing::warn!(
                title = %title,
                "Replacing history entry with same title but different content"
            );
        }
        !duplicate
    });
    records.insert(0, record);
    records.truncate(limit);
}

// ── File-backed store ─────────────────────────────────────────────

/// File-system backed history store.
///
/// The whole list lives in a single `history.json` under the configured
/// directory, mirroring a single-key durable store: each write replaces the
/// file. Suitable for one process at a time.
pub struct FileHistoryStore {
    path: PathBuf,
    limit: usize,
}

impl FileHistoryStore {
    /// Create a store under the given directory, creating it if needed.
    pub fn new(dir: impl AsRef<Path>, limit: usize) -> Result<Self, HistoryError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join("history.json"),
            limit,
        })
    }

    fn read_all(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&self.path)?;
        let records: Vec<HistoryRecord> = serde_json::from_str(&json)?;
        Ok(records)
    }

    fn write_all(&self, records: &[HistoryRecord]) -> Result<(), HistoryError> {
        let json = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, json)?;

        tracing::debug!(
            count = records.len(),
            path = %self.path.display(),
            "History written"
        );

        Ok(())
    }
}

impl HistoryStore for FileHistoryStore {
    fn add(&mut self, entry: ExportedScenario) -> Result<(), HistoryError> {
        let mut records = self.read_all()?;
        insert_record(&mut records, HistoryRecord::new(entry), self.limit);
        self.write_all(&records)
    }

    fn list(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        let records = self.read_all()?;
        verify_records(&records)?;
        Ok(records)
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        self.write_all(&[])
    }
}

// ── In-memory store ───────────────────────────────────────────────

/// Ephemeral history store for tests and sessions without persistence.
pub struct MemoryHistoryStore {
    records: Vec<HistoryRecord>,
    limit: usize,
}

impl MemoryHistoryStore {
    pub fn new(limit: usize) -> Self {
        Self {
            records: Vec::new(),
            limit,
        }
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn add(&mut self, entry: ExportedScenario) -> Result<(), HistoryError> {
        insert_record(&mut self.records, HistoryRecord::new(entry), self.limit);
        Ok(())
    }

    fn list(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        verify_records(&self.records)?;
        Ok(self.records.clone())
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        self.records.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adversary_core::types::{NetworkTopology, ScenarioInput, SimulationScenario};

    fn entry(title: &str, environment: &str) -> ExportedScenario {
        ExportedScenario::new(
            ScenarioInput::new(environment, "Kerberoasting", ""),
            SimulationScenario {
                title: title.to_string(),
                description: String::new(),
                network_topology: NetworkTopology {
                    nodes: vec![],
                    edges: vec![],
                },
                steps: vec![],
            },
        )
    }

    #[test]
    fn add_and_list_most_recent_first() {
        let mut store = MemoryHistoryStore::new(20);
        store.add(entry("First", "env")).unwrap();
        store.add(entry("Second", "env")).unwrap();

        let records = store.list().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].entry.title(), "Second");
        assert_eq!(records[1].entry.title(), "First");
    }

    #[test]
    fn never_exceeds_limit() {
        let mut store = MemoryHistoryStore::new(20);
        for i in 0..30 {
            store.add(entry(&format!("Scenario {i}"), "env")).unwrap();
        }

        let records = store.list().unwrap();
        assert_eq!(records.len(), 20);
        assert_eq!(records[0].entry.title(), "Scenario 29");
    }

    #[test]
    fn deduplicates_by_title() {
        let mut store = MemoryHistoryStore::new(20);
        store.add(entry("Operation Lion", "env-a")).unwrap();
        store.add(entry("Other", "env")).unwrap();
        store.add(entry("Operation Lion", "env-b")).unwrap();

        let records = store.list().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].entry.title(), "Operation Lion");
        assert_eq!(records[0].entry.user_input.environment, "env-b");
        // No second entry with the same title survives.
        let lions = records
            .iter()
            .filter(|r| r.entry.title() == "Operation Lion")
            .count();
        assert_eq!(lions, 1);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        {
            let mut store = FileHistoryStore::new(dir.path(), 20).unwrap();
            store.add(entry("Persisted", "env")).unwrap();
        }

        let store = FileHistoryStore::new(dir.path(), 20).unwrap();
        let records = store.list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entry.title(), "Persisted");
        assert!(records[0].verify_integrity());
    }

    #[test]
    fn file_store_detects_tampering() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileHistoryStore::new(dir.path(), 20).unwrap();
        store.add(entry("Untouched", "env")).unwrap();

        // Tamper with the stored title without recomputing the hash.
        let path = dir.path().join("history.json");
        let mut records: Vec<HistoryRecord> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        records[0].entry.scenario_data.title = "TAMPERED".to_string();
        fs::write(&path, serde_json::to_string_pretty(&records).unwrap()).unwrap();

        let result = store.list();
        assert!(matches!(result, Err(HistoryError::IntegrityViolation(_))));
    }

    #[test]
    fn verify_records_rejects_hash_mismatch() {
        let mut record = HistoryRecord::new(entry("Intact", "env"));
        assert!(verify_records(std::slice::from_ref(&record)).is_ok());

        record.entry.scenario_data.title = "ALTERED".to_string();
        let result = verify_records(std::slice::from_ref(&record));
        assert!(matches!(result, Err(HistoryError::IntegrityViolation(id)) if id == record.id));
    }

    #[test]
    fn clear_empties_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileHistoryStore::new(dir.path(), 20).unwrap();
        store.add(entry("Gone", "env")).unwrap();
        store.clear().unwrap();
        assert!(store.list().unwrap().is_empty());
    }
}

//! Export file format: one `ExportedScenario` per JSON file.
//!
//! Exports are pretty-printed with a timestamped filename; imports are
//! decoded and structurally validated before anything downstream sees them.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use adversary_core::validate;
use adversary_core::ScenarioInvalid;

use crate::ExportedScenario;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File is not a valid exported scenario: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Exported scenario has no attack steps")]
    NoSteps,

    #[error("Exported scenario failed validation: {0}")]
    Invalid(#[from] ScenarioInvalid),
}

/// Build the export filename for a given moment, e.g.
/// `adversary-scenario-20240115T093000Z.json`. Colon-free so it is valid on
/// every filesystem.
pub fn export_filename(at: DateTime<Utc>) -> String {
    format!("adversary-scenario-{}.json", at.format("%Y%m%dT%H%M%SZ"))
}

/// Write an export file into `dir` and return its path.
pub fn write_export(dir: impl AsRef<Path>, entry: &ExportedScenario) -> Result<PathBuf, ExportError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let at = entry.timestamp.unwrap_or_else(Utc::now);
    let path = dir.join(export_filename(at));
    let json = serde_json::to_string_pretty(entry)?;
    fs::write(&path, json)?;

    tracing::info!(path = %path.display(), title = %entry.title(), "Scenario exported");

    Ok(path)
}

/// Read and validate an export file.
///
/// Acceptance requires the user input and a non-empty step list to be
/// present, and the scenario itself to pass structural validation; any other
/// shape is rejected without being handed to the caller.
pub fn read_export(path: impl AsRef<Path>) -> Result<ExportedScenario, ExportError> {
    let json = fs::read_to_string(path.as_ref())?;
    let entry: ExportedScenario = serde_json::from_str(&json)?;

    if entry.scenario_data.steps.is_empty() {
        return Err(ExportError::NoSteps);
    }
    validate::validate_scenario(&entry.scenario_data)?;

    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adversary_core::types::{
        AttackStep, HostId, NetworkNode, NetworkTopology, NodeType, ScenarioInput,
        SecurityPosture, SimulationScenario,
    };
    use chrono::TimeZone;

    fn sample_entry() -> ExportedScenario {
        ExportedScenario::new(
            ScenarioInput::new("domain: corp.local; dc: DC01", "Kerberoasting", ""),
            SimulationScenario {
                title: "Operation Roundtrip".to_string(),
                description: "## Briefing".to_string(),
                network_topology: NetworkTopology {
                    nodes: vec![NetworkNode {
                        id: HostId::from("DC01"),
                        label: "Primary DC".to_string(),
                        node_type: NodeType::DomainController,
                        os: "Windows Server 2022".to_string(),
                    }],
                    edges: vec![],
                },
                steps: vec![AttackStep {
                    step: 1,
                    title: "Kerberoast".to_string(),
                    description: "Request TGS tickets.".to_string(),
                    target_host_id: HostId::from("DC01"),
                    commands: vec![],
                    mitre_tactics: vec!["Credential Access".to_string()],
                    mitre_techniques: vec![],
                    system_alerts: vec![],
                    defense_recommendations: vec![],
                    compromised_host_ids: vec![],
                    security_posture: SecurityPosture::Guarded,
                    powershell_logs: None,
                    defensive_choices: vec![],
                }],
            },
        )
    }

    #[test]
    fn filename_embeds_iso_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        assert_eq!(
            export_filename(at),
            "adversary-scenario-20240115T093000Z.json"
        );
    }

    #[test]
    fn export_import_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let entry = sample_entry();

        let path = write_export(dir.path(), &entry).unwrap();
        let loaded = read_export(&path).unwrap();

        assert_eq!(loaded.user_input, entry.user_input);
        assert_eq!(loaded.scenario_data, entry.scenario_data);
    }

    #[test]
    fn import_uses_camel_case_keys() {
        let entry = sample_entry();
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("userInput").is_some());
        assert!(json.get("scenarioData").is_some());
    }

    #[test]
    fn import_accepts_missing_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let mut entry = sample_entry();
        entry.timestamp = None;

        let path = dir.path().join("old-export.json");
        fs::write(&path, serde_json::to_string(&entry).unwrap()).unwrap();

        let loaded = read_export(&path).unwrap();
        assert!(loaded.timestamp.is_none());
    }

    #[test]
    fn import_rejects_empty_steps() {
        let dir = tempfile::tempdir().unwrap();
        let mut entry = sample_entry();
        entry.scenario_data.steps.clear();

        let path = dir.path().join("empty.json");
        fs::write(&path, serde_json::to_string(&entry).unwrap()).unwrap();

        assert!(matches!(read_export(&path), Err(ExportError::NoSteps)));
    }

    #[test]
    fn import_rejects_arbitrary_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.json");
        fs::write(&path, r#"{"hello": "world"}"#).unwrap();

        assert!(matches!(read_export(&path), Err(ExportError::Malformed(_))));
    }
}

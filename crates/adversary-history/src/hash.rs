//! BLAKE3 content hashing for history records.
//!
//! Title-based de-duplication means two distinct scenarios with the same
//! AI-generated title would silently overwrite each other; the content hash
//! makes that case detectable (and makes on-disk tampering visible on load).

use crate::ExportedScenario;

/// Compute the BLAKE3 hash of an exported scenario's content.
///
/// Serializes the entry to canonical JSON and hashes the bytes.
/// Returns the hex-encoded hash.
pub fn compute_entry_hash(entry: &ExportedScenario) -> String {
    let json = serde_json::to_vec(entry).expect("ExportedScenario serialization should not fail");
    blake3::hash(&json).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use adversary_core::types::{NetworkTopology, ScenarioInput, SimulationScenario};

    fn entry(title: &str) -> ExportedScenario {
        ExportedScenario {
            user_input: ScenarioInput::new("domain: corp.local", "Kerberoasting", ""),
            scenario_data: SimulationScenario {
                title: title.to_string(),
                description: String::new(),
                network_topology: NetworkTopology {
                    nodes: vec![],
                    edges: vec![],
                },
                steps: vec![],
            },
            timestamp: None,
        }
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(compute_entry_hash(&entry("A")), compute_entry_hash(&entry("A")));
    }

    #[test]
    fn hash_differs_on_content_change() {
        assert_ne!(compute_entry_hash(&entry("A")), compute_entry_hash(&entry("B")));
    }
}

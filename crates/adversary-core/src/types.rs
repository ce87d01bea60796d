//! Scenario document model.
//!
//! These types mirror the JSON shape the generation service is constrained
//! to produce: a network topology (nodes and edges) plus an ordered list of
//! attack steps. They are shared across the generation adapter, the
//! simulation controller, and the history store.

use serde::{Deserialize, Serialize};

// ── Topology ──────────────────────────────────────────────────────

/// Short, human-chosen host identifier ("DC01", "WS02").
///
/// Host ids are unique within one scenario's topology; edges and steps
/// reference hosts by this id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostId(pub String);

impl HostId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for HostId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The role a host plays in the simulated network.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeType {
    #[serde(rename = "Domain Controller")]
    DomainController,
    #[serde(rename = "Member Server")]
    MemberServer,
    #[serde(rename = "Workstation")]
    Workstation,
    #[serde(rename = "Firewall")]
    Firewall,
    #[serde(rename = "Internet")]
    Internet,
}

/// A host in the simulated network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkNode {
    pub id: HostId,
    /// Descriptive label, e.g. "Primary Domain Controller".
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Operating system, e.g. "Windows Server 2022".
    pub os: String,
}

/// Network reachability between two hosts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkEdge {
    pub from: HostId,
    pub to: HostId,
}

/// The simulated network graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkTopology {
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

impl NetworkTopology {
    /// Whether a host id exists in this topology.
    pub fn contains(&self, id: &HostId) -> bool {
        self.nodes.iter().any(|n| &n.id == id)
    }

    pub fn node(&self, id: &HostId) -> Option<&NetworkNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }
}

// ── Attack steps ──────────────────────────────────────────────────

/// Shell a simulated command was executed in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShellLanguage {
    Powershell,
    Cmd,
    Bash,
}

/// A command executed during an attack step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Command {
    pub command: String,
    pub language: ShellLanguage,
}

/// A MITRE ATT&CK technique reference attached to a step.
///
/// Treated as opaque labels by the core; the ids and names come straight
/// from the generation service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MitreTechnique {
    /// Official technique id, e.g. "T1059.001".
    pub id: String,
    /// Full technique name, e.g. "PowerShell".
    pub name: String,
    /// 3-5 bullet points briefly explaining the technique.
    pub description: Vec<String>,
}

/// A simulated PowerShell Script Block Logging entry (Event ID 4104).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PowerShellLog {
    pub event_id: u32,
    /// User context the command ran under, e.g. "ADVERSARY\\Administrator".
    pub user: String,
    pub hostname: String,
    /// Full, unobfuscated text of the executed script block.
    pub script_block_text: String,
}

/// Overall defensive standing of the environment after a step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SecurityPosture {
    Secure,
    Guarded,
    Critical,
}

/// One ordered unit of the simulated attack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttackStep {
    /// Sequential step number, starting from 1.
    pub step: u32,
    pub title: String,
    pub description: String,
    /// Primary host targeted in this step; must reference a topology node.
    pub target_host_id: HostId,
    pub commands: Vec<Command>,
    /// MITRE ATT&CK tactic names relevant to this step.
    pub mitre_tactics: Vec<String>,
    pub mitre_techniques: Vec<MitreTechnique>,
    /// SIEM-style alert lines generated by this activity.
    pub system_alerts: Vec<String>,
    pub defense_recommendations: Vec<String>,
    /// Cumulative set of compromised hosts up to and including this step.
    /// Never shrinks across steps.
    pub compromised_host_ids: Vec<HostId>,
    pub security_posture: SecurityPosture,
    /// Script Block Logging entries for PowerShell commands in this step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub powershell_logs: Option<Vec<PowerShellLog>>,
    /// Defensive responses offered to the user after this step.
    /// Empty outside turn-based play.
    #[serde(default)]
    pub defensive_choices: Vec<String>,
}

// ── Scenario ──────────────────────────────────────────────────────

/// A complete generated attack narrative: topology plus ordered steps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationScenario {
    pub title: String,
    /// Executive summary, markdown supported.
    pub description: String,
    pub network_topology: NetworkTopology,
    pub steps: Vec<AttackStep>,
}

impl SimulationScenario {
    /// Index of the last step, if any steps exist.
    pub fn last_step_index(&self) -> Option<usize> {
        self.steps.len().checked_sub(1)
    }
}

/// The opening reply of a turn-based simulation: the scenario frame plus
/// the attacker's first move.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationStart {
    pub title: String,
    pub description: String,
    pub network_topology: NetworkTopology,
    pub first_step: AttackStep,
}

impl SimulationStart {
    /// Convert into a one-step scenario that further turns append to.
    pub fn into_scenario(self) -> SimulationScenario {
        SimulationScenario {
            title: self.title,
            description: self.description,
            network_topology: self.network_topology,
            steps: vec![self.first_step],
        }
    }
}

/// What the user asked for: the environment description plus the chosen
/// attack vector and optional free-text directives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioInput {
    /// Free-form, YAML-flavored environment description.
    pub environment: String,
    /// Primary attack vector, e.g. "Kerberoasting".
    pub attack_type: String,
    /// Special instructions for the generation service. May be empty.
    #[serde(default)]
    pub attack_directives: String,
}

impl ScenarioInput {
    pub fn new(
        environment: impl Into<String>,
        attack_type: impl Into<String>,
        attack_directives: impl Into<String>,
    ) -> Self {
        Self {
            environment: environment.into(),
            attack_type: attack_type.into(),
            attack_directives: attack_directives.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_type_serializes_display_names() {
        let json = serde_json::to_string(&NodeType::DomainController).unwrap();
        assert_eq!(json, "\"Domain Controller\"");

        let parsed: NodeType = serde_json::from_str("\"Member Server\"").unwrap();
        assert_eq!(parsed, NodeType::MemberServer);
    }

    #[test]
    fn shell_language_serializes_lowercase() {
        let json = serde_json::to_string(&ShellLanguage::Powershell).unwrap();
        assert_eq!(json, "\"powershell\"");
    }

    #[test]
    fn step_defaults_for_optional_fields() {
        // A step from the one-shot variant carries neither powershell_logs
        // nor defensive_choices.
        let json = serde_json::json!({
            "step": 1,
            "title": "Initial Access",
            "description": "Phishing payload executed.",
            "target_host_id": "WS01",
            "commands": [{"command": "whoami", "language": "cmd"}],
            "mitre_tactics": ["Initial Access"],
            "mitre_techniques": [],
            "system_alerts": [],
            "defense_recommendations": [],
            "compromised_host_ids": ["WS01"],
            "security_posture": "Guarded"
        });

        let step: AttackStep = serde_json::from_value(json).unwrap();
        assert!(step.powershell_logs.is_none());
        assert!(step.defensive_choices.is_empty());
        assert_eq!(step.target_host_id, HostId::from("WS01"));
    }

    #[test]
    fn topology_lookup() {
        let topo = NetworkTopology {
            nodes: vec![NetworkNode {
                id: HostId::from("DC01"),
                label: "Primary DC".to_string(),
                node_type: NodeType::DomainController,
                os: "Windows Server 2022".to_string(),
            }],
            edges: vec![],
        };

        assert!(topo.contains(&HostId::from("DC01")));
        assert!(!topo.contains(&HostId::from("WS01")));
        assert_eq!(topo.node(&HostId::from("DC01")).unwrap().label, "Primary DC");
    }

    #[test]
    fn scenario_serialization_roundtrip() {
        let scenario = SimulationScenario {
            title: "Operation Test".to_string(),
            description: "## Summary".to_string(),
            network_topology: NetworkTopology {
                nodes: vec![],
                edges: vec![],
            },
            steps: vec![],
        };

        let json = serde_json::to_string(&scenario).unwrap();
        let back: SimulationScenario = serde_json::from_str(&json).unwrap();
        assert_eq!(scenario, back);
    }

    #[test]
    fn start_converts_to_one_step_scenario() {
        let start = SimulationStart {
            title: "Operation Test".to_string(),
            description: "Briefing".to_string(),
            network_topology: NetworkTopology {
                nodes: vec![],
                edges: vec![],
            },
            first_step: AttackStep {
                step: 1,
                title: "Recon".to_string(),
                description: "Enumerate the domain.".to_string(),
                target_host_id: HostId::from("DC01"),
                commands: vec![],
                mitre_tactics: vec![],
                mitre_techniques: vec![],
                system_alerts: vec![],
                defense_recommendations: vec![],
                compromised_host_ids: vec![],
                security_posture: SecurityPosture::Secure,
                powershell_logs: None,
                defensive_choices: vec!["Isolate host".to_string()],
            },
        };

        let scenario = start.into_scenario();
        assert_eq!(scenario.steps.len(), 1);
        assert_eq!(scenario.last_step_index(), Some(0));
        assert_eq!(scenario.steps[0].title, "Recon");
    }
}

use thiserror::Error;

use crate::types::HostId;

/// Top-level error type for adversary-core.
#[derive(Error, Debug)]
pub enum AdversaryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A single structural problem found in a generated document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// The scenario has no steps.
    EmptySteps,
    /// Two topology nodes share an id.
    DuplicateNodeId(HostId),
    /// An edge endpoint references a host that is not in the topology.
    DanglingEdge { from: HostId, to: HostId, missing: HostId },
    /// A step targets a host that is not in the topology.
    UnknownTargetHost { step: u32, host: HostId },
    /// A step's compromised set references a host not in the topology.
    UnknownCompromisedHost { step: u32, host: HostId },
    /// A step's compromised set dropped a host present in the previous step.
    CompromisedSetShrank { step: u32, host: HostId },
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySteps => write!(f, "scenario has no attack steps"),
            Self::DuplicateNodeId(id) => write!(f, "duplicate node id '{id}' in topology"),
            Self::DanglingEdge { from, to, missing } => {
                write!(f, "edge {from} -> {to} references unknown node '{missing}'")
            }
            Self::UnknownTargetHost { step, host } => {
                write!(f, "step {step} targets unknown host '{host}'")
            }
            Self::UnknownCompromisedHost { step, host } => {
                write!(f, "step {step} marks unknown host '{host}' as compromised")
            }
            Self::CompromisedSetShrank { step, host } => {
                write!(f, "step {step} dropped previously compromised host '{host}'")
            }
        }
    }
}

/// A generated document failed structural validation.
///
/// Carries every issue found rather than just the first, so callers can
/// surface the full structural detail instead of a generic failure message.
#[derive(Error, Debug)]
#[error("document failed validation ({} issue(s)): {}", .issues.len(), format_issues(.issues))]
pub struct ScenarioInvalid {
    pub issues: Vec<ValidationIssue>,
}

impl ScenarioInvalid {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

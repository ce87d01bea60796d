//! adversary-gen: Generation adapter for Adversary.
//!
//! Translates user-supplied simulation parameters into validated scenario
//! documents via one call per operation to an external generation service.
//! The adapter is a pure function of its inputs plus service state: it holds
//! no simulation state and applies no retry policy — a failed attempt
//! surfaces immediately to the caller.

pub mod client;
pub mod decode;
pub mod error;
pub mod mitre;
pub mod prompt;

pub use client::{GeneratorConfig, LlmClient};
pub use error::GenerationError;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use adversary_core::types::{
    AttackStep, NetworkTopology, ScenarioInput, SimulationScenario, SimulationStart,
};

/// Everything a continuation call needs: the established topology and the
/// full step history ride along so the service can keep the compromised set
/// cumulative and the narrative coherent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContinuationRequest {
    pub input: ScenarioInput,
    pub topology: NetworkTopology,
    pub history: Vec<AttackStep>,
    /// The defensive response the user chose after the last step.
    pub last_action: String,
}

/// The generation service boundary.
///
/// Implementations must reject empty environment input locally (before any
/// network call) and must never return a document that fails structural
/// validation.
#[async_trait]
pub trait ScenarioGenerator: Send + Sync {
    /// Generate a complete scenario in one call.
    async fn generate_scenario(
        &self,
        input: &ScenarioInput,
    ) -> Result<SimulationScenario, GenerationError>;

    /// Open a turn-based simulation: scenario frame plus the first step.
    async fn start_simulation(
        &self,
        input: &ScenarioInput,
    ) -> Result<SimulationStart, GenerationError>;

    /// Generate the next step given the history so far and the user's
    /// chosen defensive action.
    async fn continue_simulation(
        &self,
        request: &ContinuationRequest,
    ) -> Result<AttackStep, GenerationError>;
}

/// Reject empty or whitespace-only environment text before any network call.
pub(crate) fn require_environment(input: &ScenarioInput) -> Result<(), GenerationError> {
    if input.environment.trim().is_empty() {
        return Err(GenerationError::EmptyEnvironment);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_environment_rejected() {
        let input = ScenarioInput::new("   \n", "Kerberoasting", "");
        assert!(matches!(
            require_environment(&input),
            Err(GenerationError::EmptyEnvironment)
        ));

        let input = ScenarioInput::new("domain: corp.local", "Kerberoasting", "");
        assert!(require_environment(&input).is_ok());
    }
}

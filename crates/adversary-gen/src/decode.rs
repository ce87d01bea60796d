//! Strict decode-or-fail boundary for generation replies.
//!
//! A reply is untrusted until it has been (1) parsed into the typed document
//! model and (2) passed structural validation. Nothing downstream ever sees
//! a raw payload.

use adversary_core::types::{AttackStep, NetworkTopology, SimulationScenario, SimulationStart};
use adversary_core::validate;

use crate::error::{GenerationError, Result};

/// Decode and validate a full-scenario reply.
pub fn decode_scenario(raw: &str) -> Result<SimulationScenario> {
    let scenario: SimulationScenario =
        serde_json::from_str(strip_fences(raw)).map_err(GenerationError::MalformedReply)?;
    validate::validate_scenario(&scenario)?;
    Ok(scenario)
}

/// Decode and validate a turn-based opening reply.
pub fn decode_start(raw: &str) -> Result<SimulationStart> {
    let start: SimulationStart =
        serde_json::from_str(strip_fences(raw)).map_err(GenerationError::MalformedReply)?;
    validate::validate_start(&start)?;
    Ok(start)
}

/// Decode and validate a continuation step against the established topology
/// and the step it follows.
pub fn decode_step(
    raw: &str,
    topology: &NetworkTopology,
    previous: Option<&AttackStep>,
) -> Result<AttackStep> {
    let step: AttackStep =
        serde_json::from_str(strip_fences(raw)).map_err(GenerationError::MalformedReply)?;
    validate::validate_continuation(topology, previous, &step)?;
    Ok(step)
}

/// Models sometimes wrap a JSON reply in a markdown code fence despite the
/// response MIME type; strip it before parsing.
fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

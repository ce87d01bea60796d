//! Structural validation for generated documents.
//!
//! The generation service is constrained by a response schema, but its
//! replies are still untrusted input: a document must pass this decode-or-fail
//! boundary before any downstream code touches it. Validation collects every
//! issue rather than stopping at the first.

use std::collections::HashSet;

use crate::error::{ScenarioInvalid, ValidationIssue};
use crate::types::{AttackStep, NetworkTopology, SimulationScenario, SimulationStart};

/// Validate a complete scenario: topology integrity, step references, and
/// monotone growth of the compromised set.
pub fn validate_scenario(scenario: &SimulationScenario) -> Result<(), ScenarioInvalid> {
    let mut issues = Vec::new();

    check_topology(&scenario.network_topology, &mut issues);

    if scenario.steps.is_empty() {
        issues.push(ValidationIssue::EmptySteps);
    }

    let mut prev: Option<&AttackStep> = None;
    for step in &scenario.steps {
        check_step(&scenario.network_topology, prev, step, &mut issues);
        prev = Some(step);
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ScenarioInvalid::new(issues))
    }
}

/// Validate the opening reply of a turn-based simulation.
pub fn validate_start(start: &SimulationStart) -> Result<(), ScenarioInvalid> {
    let mut issues = Vec::new();
    check_topology(&start.network_topology, &mut issues);
    check_step(&start.network_topology, None, &start.first_step, &mut issues);

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ScenarioInvalid::new(issues))
    }
}

/// Validate a continuation step against the established topology and the
/// step it follows.
pub fn validate_continuation(
    topology: &NetworkTopology,
    previous: Option<&AttackStep>,
    step: &AttackStep,
) -> Result<(), ScenarioInvalid> {
    let mut issues = Vec::new();
    check_step(topology, previous, step, &mut issues);

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ScenarioInvalid::new(issues))
    }
}

fn check_topology(topology: &NetworkTopology, issues: &mut Vec<ValidationIssue>) {
    let mut seen = HashSet::new();
    for node in &topology.nodes {
        if !seen.insert(&node.id) {
            issues.push(ValidationIssue::DuplicateNodeId(node.id.clone()));
        }
    }

    for edge in &topology.edges {
        for endpoint in [&edge.from, &edge.to] {
            if !topology.contains(endpoint) {
                issues.push(ValidationIssue::DanglingEdge {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
    }
}

fn check_step(
    topology: &NetworkTopology,
    previous: Option<&AttackStep>,
    step: &AttackStep,
    issues: &mut Vec<ValidationIssue>,
) {
    if !topology.contains(&step.target_host_id) {
        issues.push(ValidationIssue::UnknownTargetHost {
            step: step.step,
            host: step.target_host_id.clone(),
        });
    }

    for host in &step.compromised_host_ids {
        if !topology.contains(host) {
            issues.push(ValidationIssue::UnknownCompromisedHost {
                step: step.step,
                host: host.clone(),
            });
        }
    }

    // The compromised set is cumulative: anything compromised before stays
    // compromised.
    if let Some(prev) = previous {
        let current: HashSet<_> = step.compromised_host_ids.iter().collect();
        for host in &prev.compromised_host_ids {
            if !current.contains(host) {
                issues.push(ValidationIssue::CompromisedSetShrank {
                    step: step.step,
                    host: host.clone(),
                });
            }
        }
    }
}

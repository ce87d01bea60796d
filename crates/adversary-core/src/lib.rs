//! adversary-core: Shared types, validation, and configuration for Adversary.
//!
//! This crate provides the foundational types used across all Adversary
//! components:
//! - The scenario document model (topology, attack steps, scenarios)
//! - Structural validation for generated documents
//! - Configuration management
//! - Common error types

pub mod config;
pub mod error;
pub mod types;
pub mod validate;

pub use config::AdversaryConfig;
pub use error::{AdversaryError, ScenarioInvalid, ValidationIssue};
pub use types::{
    AttackStep, HostId, NetworkEdge, NetworkNode, NetworkTopology, ScenarioInput,
    SecurityPosture, SimulationScenario, SimulationStart,
};

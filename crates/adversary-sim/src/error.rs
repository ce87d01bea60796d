//! Error types for the adversary-sim crate.

use thiserror::Error;

use adversary_core::ScenarioInvalid;
use adversary_gen::GenerationError;
use adversary_history::{ExportError, HistoryError};

use crate::controller::Phase;

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("A generation request is already in flight")]
    RequestInFlight,

    #[error("Environment description is empty")]
    EmptyEnvironment,

    #[error("Operation '{operation}' is not valid in the {phase:?} phase")]
    InvalidPhase {
        operation: &'static str,
        phase: Phase,
    },

    #[error("Defensive actions are only available while viewing the latest step")]
    NotLatestStep,

    #[error("No active scenario")]
    NoScenario,

    /// A completed request delivered a document that fails validation.
    #[error("Generated document rejected: {0}")]
    DocumentRejected(#[from] ScenarioInvalid),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Request cancelled")]
    Cancelled,
}

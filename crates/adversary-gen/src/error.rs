//! Error types for the generation adapter.

use thiserror::Error;

use adversary_core::ScenarioInvalid;

#[derive(Error, Debug)]
pub enum GenerationError {
    /// Rejected locally, before any network call.
    #[error("Environment description is empty")]
    EmptyEnvironment,

    #[error("Generation service not configured: {0}")]
    Config(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Generation service returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The reply was not parseable JSON.
    #[error("Reply is not valid JSON: {0}")]
    MalformedReply(#[source] serde_json::Error),

    /// The reply parsed but does not satisfy the document schema.
    #[error("Reply failed schema validation: {0}")]
    SchemaViolation(#[from] ScenarioInvalid),

    /// The reply had no generated content to decode.
    #[error("Generation service returned an empty reply")]
    EmptyReply,
}

pub type Result<T> = std::result::Result<T, GenerationError>;

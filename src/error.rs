//! Error types for the procurement audit engine

use thiserror::Error;

/// Result type alias for audit pipeline operations
pub type Result<T> = std::result::Result<T, AuditError>;

#[derive(Error, Debug)]
pub enum AuditError {

    // =============================
    // Pipeline Errors
    // =============================

    /// One extraction provider failed. Absorbed by the fallback
    /// coordinator, never surfaced to callers.
    #[error("Extraction provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Generation response contained no brace-delimited JSON span.
    #[error("No structured output in generation response")]
    NoStructuredOutput,

    /// A JSON span was found but failed to parse.
    #[error("Malformed generation output: {0}")]
    MalformedOutput(String),

    /// Parsed JSON did not conform to the target schema.
    /// Carries the instance paths of every failing field.
    #[error("Schema violation: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),

    /// An external call exceeded its time bound.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Caller precondition violated (e.g. missing invoice data).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The generative text service itself failed (transport, quota,
    /// empty candidate list).
    #[error("Generation service error: {0}")]
    GenerationError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

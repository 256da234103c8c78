//! Unified error types for the domain layer.
//!
//! Kept deliberately small: the domain is passive data, so the only failures
//! are malformed input shapes and missing schema registrations.

use thiserror::Error;

/// Unified error type for domain operations.
#[derive(Debug, Error, Clone)]
pub enum DomainError {
    /// No schema model is registered for a document type. This is a
    /// configuration error, not a user-data error.
    #[error("No schema model registered for document type '{kind}'")]
    UnknownSchema { kind: String },

    /// A legacy field had a shape the transformer cannot interpret.
    #[error("Malformed field '{field}': {detail}")]
    Malformed { field: String, detail: String },

    /// Invalid document id format.
    #[error("Invalid document id: {0}")]
    InvalidId(String),
}

impl DomainError {
    /// Creates an UnknownSchema error for a document type string.
    pub fn unknown_schema(kind: impl Into<String>) -> Self {
        Self::UnknownSchema { kind: kind.into() }
    }

    /// Creates a Malformed error with field path and detail.
    pub fn malformed(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Malformed {
            field: field.into(),
            detail: detail.into(),
        }
    }
}

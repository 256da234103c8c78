//! Error types for port operations.

/// Host document-layer operation errors with context for debugging.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Document not found - includes document class and ID for actionable
    /// error messages.
    #[error("{document_class} not found: {id}")]
    NotFound {
        document_class: &'static str,
        id: String,
    },

    /// Host persistence call failed - includes operation name for tracing.
    #[error("Store error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    /// A raw document could not be decoded into the expected shape.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Create a NotFound error with document class and ID context.
    pub fn not_found(document_class: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            document_class,
            id: id.to_string(),
        }
    }

    /// Create a Database error with operation context.
    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    /// Create a Serialization error.
    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::serialization(value)
    }
}

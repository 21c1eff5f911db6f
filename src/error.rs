use thiserror::Error;

/// Errors surfaced by journal operations.
#[derive(Debug, Error)]
pub enum JournalError {
    /// A required field was empty. Nothing was changed.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("entry not found: {id}")]
    NotFound { id: String },

    /// The language-model or geocoding collaborator failed. Local state is untouched.
    #[error("external service failed: {0}")]
    ExternalService(String),

    /// Persisting a document failed. The in-memory change is kept and will be
    /// written again on the next successful persist.
    #[error("failed to write '{key}': {reason}")]
    StoreWrite { key: String, reason: String },

    #[error("failed to read '{key}': {reason}")]
    StoreRead { key: String, reason: String },
}

impl JournalError {
    pub fn not_found(id: impl Into<String>) -> Self {
        JournalError::NotFound { id: id.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, JournalError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, JournalError>;

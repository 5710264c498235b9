//! Error types shared by the reconciliation pipeline and its collaborators.

use thiserror::Error;

/// Result type alias for collaborator calls.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type alias for pipeline operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Errors surfaced by a directory or device collaborator.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Credentials were rejected or a session could not be created.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A single partition query failed.
    #[error("Query failed for partition {partition}: {message}")]
    Query { partition: String, message: String },

    /// The device listing could not be completed.
    #[error("Device listing failed: {0}")]
    Listing(String),

    /// Collaborator configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl SourceError {
    /// Create a partition query error.
    pub fn query(partition: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            partition: partition.into(),
            message: message.into(),
        }
    }

    /// Returns true for failures that concern credentials or sessions.
    #[must_use]
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}

/// Errors that abort a reconciliation run.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Settings failed validation.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// A session could not be established before collection.
    #[error("Session could not be established: {0}")]
    Authentication(#[source] SourceError),

    /// The cloud device listing failed after candidates were collected.
    #[error("Cloud device listing failed: {0}")]
    DeviceListing(#[source] SourceError),
}

//! Entra connector errors.

use thiserror::Error;

pub type EntraResult<T> = Result<T, EntraError>;

#[derive(Debug, Error)]
pub enum EntraError {
    #[error("invalid Entra configuration: {0}")]
    Config(String),

    /// The token endpoint refused the client credentials or was unreachable.
    #[error("token request failed: {0}")]
    Auth(String),

    /// Graph answered with a non-retryable error status.
    #[error("Graph request failed: {code}: {message}")]
    GraphApi {
        code: String,
        message: String,
        inner_error: Option<String>,
    },

    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Json(#[from] serde_json::Error),

    /// A device object lacked a required field.
    #[error("unusable device object: {0}")]
    Mapping(String),

    /// Graph asked for a longer pause than the client is willing to wait.
    #[error("throttled by Graph for {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("still throttled after {attempts} retries")]
    MaxRetriesExceeded { attempts: u32 },
}

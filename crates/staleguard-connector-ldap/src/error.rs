//! Error types for the LDAP connector.

use thiserror::Error;

/// Result type alias using `LdapError`.
pub type LdapResult<T> = Result<T, LdapError>;

/// Errors raised while querying a directory partition.
#[derive(Debug, Error)]
pub enum LdapError {
    /// Configuration validation error.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The server could not be reached.
    #[error("Failed to connect to LDAP server at {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: ldap3::LdapError,
    },

    /// Bind rejected with invalid credentials (result code 49).
    #[error("Invalid credentials for {bind_dn}")]
    InvalidCredentials { bind_dn: String },

    /// Bind failed for another reason.
    #[error("LDAP bind failed with code {rc}: {message}")]
    Bind { rc: u32, message: String },

    /// Search or protocol failure.
    #[error("LDAP operation failed: {0}")]
    Protocol(#[from] ldap3::LdapError),
}

impl LdapError {
    /// Returns true when the server rejected the bind itself.
    #[must_use]
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, Self::InvalidCredentials { .. } | Self::Bind { .. })
    }
}

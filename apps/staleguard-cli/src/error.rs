//! CLI error types and exit codes

use thiserror::Error;

use staleguard_connector_entra::EntraError;
use staleguard_connector_ldap::LdapError;
use staleguard_core::ReconcileError;

/// Exit codes for the CLI
/// - 0: Success (including runs that found no candidates)
/// - 1: Configuration or I/O error
/// - 2: Authentication failure
/// - 3: Data source failure
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Data source error: {0}")]
    Source(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::Export(_) | CliError::Io(_) => 1,
            CliError::AuthenticationFailed(_) => 2,
            CliError::Source(_) => 3,
        }
    }

    /// Print the error to stderr with appropriate formatting
    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();
        if use_color {
            eprintln!("\x1b[31merror:\x1b[0m {}", self);
        } else {
            eprintln!("error: {}", self);
        }
    }
}

impl From<ReconcileError> for CliError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::InvalidSettings(msg) => CliError::Config(msg),
            ReconcileError::Authentication(source) => {
                CliError::AuthenticationFailed(source.to_string())
            }
            ReconcileError::DeviceListing(source) => CliError::Source(source.to_string()),
        }
    }
}

impl From<EntraError> for CliError {
    fn from(err: EntraError) -> Self {
        CliError::Config(err.to_string())
    }
}

impl From<LdapError> for CliError {
    fn from(err: LdapError) -> Self {
        CliError::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err.to_string())
    }
}

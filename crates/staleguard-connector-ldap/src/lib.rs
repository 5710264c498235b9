//! # LDAP Directory Connector
//!
//! Active Directory computer queries for staleguard.
//!
//! One connection is opened per domain partition. Each query asks for
//! computer objects whose `whenChanged` is at or before the run cutoff,
//! using RFC 2696 paged results.
//!
//! ## Features
//!
//! - LDAP v3 with LDAPS or STARTTLS
//! - Simple bind, or anonymous when no bind DN is configured
//! - Per-partition domain controller overrides
//! - Paged search results
//!
//! ## Example
//!
//! ```ignore
//! use staleguard_connector_ldap::{DirectoryConfig, LdapConnector};
//!
//! let config = DirectoryConfig::default()
//!     .with_bind("CN=svc-staleguard,OU=Service,DC=corp,DC=example,DC=com", "secret")
//!     .with_ssl();
//!
//! let connector = LdapConnector::new(config)?
//!     .with_partitions(["corp.example.com", "emea.example.com"]);
//! ```

pub mod config;
pub mod connector;
pub mod error;
pub mod query;

// Re-exports
pub use config::DirectoryConfig;
pub use connector::LdapConnector;
pub use error::{LdapError, LdapResult};

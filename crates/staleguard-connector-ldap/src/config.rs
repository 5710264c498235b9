//! LDAP connector configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{LdapError, LdapResult};

/// Connection settings shared by every partition.
#[derive(Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Server port. Defaults to 636 with LDAPS, 389 otherwise.
    #[serde(default)]
    pub port: Option<u16>,

    /// Use SSL/TLS (LDAPS).
    #[serde(default)]
    pub use_ssl: bool,

    /// Use STARTTLS upgrade on plain LDAP connection.
    #[serde(default)]
    pub use_starttls: bool,

    /// Skip certificate verification. Lab use only.
    #[serde(default)]
    pub no_tls_verify: bool,

    /// Bind DN. Anonymous when absent.
    #[serde(default)]
    pub bind_dn: Option<String>,

    /// Bind password.
    #[serde(default, skip_serializing)]
    pub bind_password: Option<String>,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Explicit domain controller per partition. Partitions not listed are
    /// contacted by their DNS name.
    #[serde(default)]
    pub servers: HashMap<String, String>,
}

impl std::fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("use_starttls", &self.use_starttls)
            .field("no_tls_verify", &self.no_tls_verify)
            .field("bind_dn", &self.bind_dn)
            .field(
                "bind_password",
                &self.bind_password.as_ref().map(|_| "***REDACTED***"),
            )
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("servers", &self.servers)
            .finish()
    }
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            port: None,
            use_ssl: false,
            use_starttls: false,
            no_tls_verify: false,
            bind_dn: None,
            bind_password: None,
            connect_timeout_secs: default_connect_timeout(),
            servers: HashMap::new(),
        }
    }
}

impl DirectoryConfig {
    /// Set bind credentials.
    pub fn with_bind(mut self, bind_dn: impl Into<String>, password: impl Into<String>) -> Self {
        self.bind_dn = Some(bind_dn.into());
        self.bind_password = Some(password.into());
        self
    }

    /// Enable SSL (LDAPS).
    #[must_use]
    pub fn with_ssl(mut self) -> Self {
        self.use_ssl = true;
        self
    }

    /// Enable STARTTLS.
    #[must_use]
    pub fn with_starttls(mut self) -> Self {
        self.use_starttls = true;
        self
    }

    /// Send queries for `partition` to `host`.
    pub fn with_server(mut self, partition: impl Into<String>, host: impl Into<String>) -> Self {
        self.servers.insert(partition.into(), host.into());
        self
    }

    /// Effective port.
    #[must_use]
    pub fn effective_port(&self) -> u16 {
        self.port
            .unwrap_or(if self.use_ssl { 636 } else { 389 })
    }

    /// Host to contact for `partition`.
    #[must_use]
    pub fn host_for<'a>(&'a self, partition: &'a str) -> &'a str {
        self.servers
            .get(partition)
            .map(String::as_str)
            .unwrap_or(partition)
    }

    /// Connection URL for `partition`.
    #[must_use]
    pub fn url_for(&self, partition: &str) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        format!(
            "{}://{}:{}",
            scheme,
            self.host_for(partition),
            self.effective_port()
        )
    }

    /// Validate the configuration.
    pub fn validate(&self) -> LdapResult<()> {
        if self.use_ssl && self.use_starttls {
            return Err(LdapError::InvalidConfiguration(
                "use_ssl and use_starttls are mutually exclusive".to_string(),
            ));
        }

        match (&self.bind_dn, &self.bind_password) {
            (Some(dn), _) if dn.trim().is_empty() => {
                return Err(LdapError::InvalidConfiguration(
                    "bind_dn cannot be empty".to_string(),
                ));
            }
            (Some(_), None) => {
                return Err(LdapError::InvalidConfiguration(
                    "bind_password is required when bind_dn is set".to_string(),
                ));
            }
            (Some(_), Some(pw)) if pw.is_empty() => {
                // An empty password turns a simple bind into an unauthenticated one.
                return Err(LdapError::InvalidConfiguration(
                    "bind_password cannot be empty".to_string(),
                ));
            }
            _ => {}
        }

        if self.connect_timeout_secs == 0 {
            return Err(LdapError::InvalidConfiguration(
                "connect_timeout_secs must be greater than zero".to_string(),
            ));
        }

        for (partition, host) in &self.servers {
            if host.trim().is_empty() {
                return Err(LdapError::InvalidConfiguration(format!(
                    "servers.{} cannot be empty",
                    partition
                )));
            }
        }

        Ok(())
    }
}

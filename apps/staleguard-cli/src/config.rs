//! Run configuration loaded from a YAML file, environment variables and
//! command-line flags, in increasing order of precedence.
//!
//! Secrets are never read from the file. The client secret and the bind
//! password come from `STALEGUARD_CLIENT_SECRET` and
//! `STALEGUARD_BIND_PASSWORD`.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;

use staleguard_connector_entra::{EntraCloudEnvironment, EntraConfig, EntraCredentials};
use staleguard_connector_ldap::DirectoryConfig;
use staleguard_core::{ExclusionRule, ReconcileSettings};

use crate::error::{CliError, CliResult};

pub const ENV_CONFIG_PATH: &str = "STALEGUARD_CONFIG";
pub const ENV_CLIENT_SECRET: &str = "STALEGUARD_CLIENT_SECRET";
pub const ENV_BIND_PASSWORD: &str = "STALEGUARD_BIND_PASSWORD";
pub const ENV_TENANT_ID: &str = "STALEGUARD_TENANT_ID";
pub const ENV_STALE_DAYS: &str = "STALEGUARD_STALE_DAYS";

pub const DEFAULT_CONFIG_PATH: &str = "staleguard.yaml";
pub const DEFAULT_STALE_CUTOFF_DAYS: u32 = 90;
pub const DEFAULT_PRIMARY_EXPORT: &str = "stale-computers.csv";

/// Complete application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_stale_cutoff_days")]
    pub stale_cutoff_days: u32,

    #[serde(default)]
    pub tenant_id: String,

    #[serde(default)]
    pub domain_partitions: Vec<String>,

    #[serde(default)]
    pub exclusion_path_substrings: Vec<String>,

    #[serde(default)]
    pub scope_restriction: Option<String>,

    #[serde(default = "default_primary_export")]
    pub primary_export_destination: String,

    /// Empty or absent disables the debug export.
    #[serde(default)]
    pub debug_export_destination: Option<String>,

    #[serde(default)]
    pub entra: EntraSection,

    #[serde(default)]
    pub directory: DirectorySection,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(skip)]
    client_secret: Option<String>,
}

/// Entra app registration and Graph paging.
#[derive(Debug, Clone, Deserialize)]
pub struct EntraSection {
    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub cloud: EntraCloudEnvironment,

    #[serde(default = "default_entra_page_size")]
    pub page_size: u32,

    #[serde(default)]
    pub login_endpoint: Option<String>,

    #[serde(default)]
    pub graph_endpoint: Option<String>,
}

impl Default for EntraSection {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            cloud: EntraCloudEnvironment::default(),
            page_size: default_entra_page_size(),
            login_endpoint: None,
            graph_endpoint: None,
        }
    }
}

/// Directory connection settings plus the query page size.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectorySection {
    #[serde(flatten)]
    pub connection: DirectoryConfig,

    #[serde(default = "default_directory_page_size")]
    pub page_size: u32,
}

impl Default for DirectorySection {
    fn default() -> Self {
        Self {
            connection: DirectoryConfig::default(),
            page_size: default_directory_page_size(),
        }
    }
}

/// Logging output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_stale_cutoff_days() -> u32 {
    DEFAULT_STALE_CUTOFF_DAYS
}

fn default_primary_export() -> String {
    DEFAULT_PRIMARY_EXPORT.to_string()
}

fn default_entra_page_size() -> u32 {
    staleguard_connector_entra::MAX_PAGE_SIZE
}

fn default_directory_page_size() -> u32 {
    staleguard_core::config::DEFAULT_PAGE_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Flag values that take precedence over file and environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub stale_cutoff_days: Option<u32>,
    pub primary_export_destination: Option<String>,
    pub debug_export_destination: Option<String>,
    pub disable_debug_export: bool,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Parse a YAML document.
    pub fn from_yaml(yaml: &str) -> CliResult<Self> {
        let mut config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| CliError::Config(format!("Invalid configuration: {e}")))?;
        config.directory.connection.bind_password = None;
        Ok(config)
    }

    /// Read and parse a YAML file.
    pub fn from_file(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Cannot read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml(&content)
    }

    /// Read the file and apply process environment overrides.
    pub fn load(path: &Path) -> CliResult<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply environment overrides using the given lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> CliResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(tenant) = lookup(ENV_TENANT_ID) {
            self.tenant_id = tenant;
        }

        if let Some(days) = lookup(ENV_STALE_DAYS) {
            self.stale_cutoff_days = days.trim().parse().map_err(|_| {
                CliError::Config(format!(
                    "{ENV_STALE_DAYS} must be a non-negative integer, got '{days}'"
                ))
            })?;
        }

        if let Some(secret) = lookup(ENV_CLIENT_SECRET) {
            self.client_secret = Some(secret);
        }

        if let Some(password) = lookup(ENV_BIND_PASSWORD) {
            self.directory.connection.bind_password = Some(password);
        }

        Ok(())
    }

    /// Apply command-line overrides.
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(days) = overrides.stale_cutoff_days {
            self.stale_cutoff_days = days;
        }
        if let Some(ref output) = overrides.primary_export_destination {
            self.primary_export_destination = output.clone();
        }
        if let Some(ref debug) = overrides.debug_export_destination {
            self.debug_export_destination = Some(debug.clone());
        }
        if overrides.disable_debug_export {
            self.debug_export_destination = None;
        }
        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Check everything that can be checked without contacting a service.
    pub fn validate(&self) -> CliResult<()> {
        if self.tenant_id.trim().is_empty() {
            return Err(CliError::Config(
                "tenant_id is required (file or STALEGUARD_TENANT_ID)".to_string(),
            ));
        }

        if self.primary_export_destination.trim().is_empty() {
            return Err(CliError::Config(
                "primary_export_destination must not be empty".to_string(),
            ));
        }

        self.reconcile_settings()
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;

        self.entra_config()?;

        let directory = &self.directory.connection;
        if directory.bind_dn.is_some() && directory.bind_password.is_none() {
            return Err(CliError::Config(format!(
                "{ENV_BIND_PASSWORD} is required when directory.bind_dn is set"
            )));
        }
        directory.validate()?;

        Ok(())
    }

    /// Whether the client secret was supplied.
    pub fn has_client_secret(&self) -> bool {
        self.client_secret.is_some()
    }

    /// Settings for the core pipeline.
    pub fn reconcile_settings(&self) -> ReconcileSettings {
        let settings =
            ReconcileSettings::new(self.stale_cutoff_days, self.domain_partitions.clone())
                .with_exclusions(ExclusionRule::new(self.exclusion_path_substrings.iter()))
                .with_page_size(self.directory.page_size);

        match self.scope_restriction.as_deref().map(str::trim) {
            Some(scope) if !scope.is_empty() => settings.with_scope(scope),
            _ => settings,
        }
    }

    /// Entra connector configuration.
    pub fn entra_config(&self) -> CliResult<EntraConfig> {
        let mut builder = EntraConfig::builder()
            .tenant_id(self.tenant_id.trim())
            .cloud_environment(self.entra.cloud)
            .page_size(self.entra.page_size);

        if let Some(ref endpoint) = self.entra.login_endpoint {
            builder = builder.login_endpoint(endpoint);
        }
        if let Some(ref endpoint) = self.entra.graph_endpoint {
            builder = builder.graph_endpoint(endpoint);
        }

        Ok(builder.build()?)
    }

    /// App registration credentials. Fails when the client id or the
    /// client secret is missing.
    pub fn entra_credentials(&self) -> CliResult<EntraCredentials> {
        if self.entra.client_id.trim().is_empty() {
            return Err(CliError::Config("entra.client_id is required".to_string()));
        }

        let secret = self
            .client_secret
            .as_ref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CliError::Config(format!("{ENV_CLIENT_SECRET} is not set")))?;

        Ok(EntraCredentials {
            client_id: self.entra.client_id.trim().to_string(),
            client_secret: SecretString::from(secret.clone()),
        })
    }

    /// Directory connector configuration.
    pub fn directory_config(&self) -> DirectoryConfig {
        self.directory.connection.clone()
    }

    pub fn primary_export_path(&self) -> PathBuf {
        PathBuf::from(self.primary_export_destination.trim())
    }

    /// `None` when the debug export is disabled.
    pub fn debug_export_path(&self) -> Option<PathBuf> {
        self.debug_export_destination
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    }
}

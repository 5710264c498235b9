//! Entra ID connector configuration.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::{EntraError, EntraResult};

/// Largest `$top` the Graph devices endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 999;

/// National cloud the tenant lives in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntraCloudEnvironment {
    #[default]
    Commercial,
    UsGovernment,
    China,
}

impl EntraCloudEnvironment {
    /// Azure AD login authority.
    #[must_use]
    pub fn login_endpoint(&self) -> &'static str {
        match self {
            Self::Commercial => "https://login.microsoftonline.com",
            Self::UsGovernment => "https://login.microsoftonline.us",
            Self::China => "https://login.chinacloudapi.cn",
        }
    }

    /// Microsoft Graph root.
    #[must_use]
    pub fn graph_endpoint(&self) -> &'static str {
        match self {
            Self::Commercial => "https://graph.microsoft.com",
            Self::UsGovernment => "https://graph.microsoft.us",
            Self::China => "https://microsoftgraph.chinacloudapi.cn",
        }
    }
}

/// App registration credentials.
#[derive(Debug)]
pub struct EntraCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
}

/// Connector configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntraConfig {
    pub tenant_id: String,
    pub cloud_environment: EntraCloudEnvironment,
    pub api_version: String,
    /// `$top` for device listing.
    pub page_size: u32,
    pub max_retries: u32,
    pub request_timeout_secs: u64,
    /// Replaces the login authority, e.g. for a local mock.
    pub login_endpoint_override: Option<String>,
    /// Replaces the Graph root, e.g. for a local mock.
    pub graph_endpoint_override: Option<String>,
}

impl EntraConfig {
    pub fn builder() -> EntraConfigBuilder {
        EntraConfigBuilder::default()
    }

    #[must_use]
    pub fn login_endpoint(&self) -> &str {
        self.login_endpoint_override
            .as_deref()
            .unwrap_or_else(|| self.cloud_environment.login_endpoint())
    }

    #[must_use]
    pub fn graph_endpoint(&self) -> &str {
        self.graph_endpoint_override
            .as_deref()
            .unwrap_or_else(|| self.cloud_environment.graph_endpoint())
    }
}

/// Builder for [`EntraConfig`].
#[derive(Debug, Clone)]
pub struct EntraConfigBuilder {
    tenant_id: Option<String>,
    cloud_environment: EntraCloudEnvironment,
    api_version: String,
    page_size: u32,
    max_retries: u32,
    request_timeout_secs: u64,
    login_endpoint_override: Option<String>,
    graph_endpoint_override: Option<String>,
}

impl Default for EntraConfigBuilder {
    fn default() -> Self {
        Self {
            tenant_id: None,
            cloud_environment: EntraCloudEnvironment::default(),
            api_version: "v1.0".to_string(),
            page_size: MAX_PAGE_SIZE,
            max_retries: 5,
            request_timeout_secs: 30,
            login_endpoint_override: None,
            graph_endpoint_override: None,
        }
    }
}

impl EntraConfigBuilder {
    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    #[must_use]
    pub fn cloud_environment(mut self, env: EntraCloudEnvironment) -> Self {
        self.cloud_environment = env;
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn login_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.login_endpoint_override = Some(endpoint.into());
        self
    }

    pub fn graph_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.graph_endpoint_override = Some(endpoint.into());
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// Returns `EntraError::Config` when the tenant is missing or the page
    /// size is outside `1..=999`.
    pub fn build(self) -> EntraResult<EntraConfig> {
        let tenant_id = self
            .tenant_id
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| EntraError::Config("tenant_id is required".to_string()))?;

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(EntraError::Config(format!(
                "page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }

        Ok(EntraConfig {
            tenant_id,
            cloud_environment: self.cloud_environment,
            api_version: self.api_version,
            page_size: self.page_size,
            max_retries: self.max_retries,
            request_timeout_secs: self.request_timeout_secs,
            login_endpoint_override: self.login_endpoint_override.map(trim_slash),
            graph_endpoint_override: self.graph_endpoint_override.map(trim_slash),
        })
    }
}

fn trim_slash(endpoint: String) -> String {
    endpoint.trim_end_matches('/').to_string()
}

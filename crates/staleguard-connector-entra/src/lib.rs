//! Microsoft Entra ID device source for staleguard
//!
//! Lists every device in a tenant through the Microsoft Graph API and exposes
//! the result through the [`staleguard_core::DeviceSource`] trait.
//!
//! # Features
//!
//! - `OAuth2` client credentials authentication with token caching
//! - `@odata.nextLink` pagination
//! - Retry on throttling (429, honouring `Retry-After`) and transient 5xx
//! - Multi-cloud support (Commercial, US Government, China)
//!
//! # Example
//!
//! ```no_run
//! use staleguard_core::DeviceSource;
//! use staleguard_connector_entra::{EntraConfig, EntraConnector, EntraCredentials};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EntraConfig::builder()
//!     .tenant_id("your-tenant-id")
//!     .build()?;
//!
//! let credentials = EntraCredentials {
//!     client_id: "your-client-id".to_string(),
//!     client_secret: "your-client-secret".to_string().into(),
//! };
//!
//! let connector = EntraConnector::new(config, credentials)?;
//! connector.establish_session().await?;
//! let devices = connector.list_devices().await?;
//! # Ok(())
//! # }
//! ```

mod auth;
mod config;
mod connector;
mod devices;
mod error;
mod graph_client;

// Re-exports
pub use auth::TokenCache;
pub use config::{
    EntraCloudEnvironment, EntraConfig, EntraConfigBuilder, EntraCredentials, MAX_PAGE_SIZE,
};
pub use connector::EntraConnector;
pub use devices::{parse_device, DEVICE_SELECT_FIELDS};
pub use error::{EntraError, EntraResult};
pub use graph_client::{GraphClient, ODataError, ODataErrorBody, ODataResponse};

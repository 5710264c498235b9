//! Entra ID connector wiring token cache and Graph client.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

use staleguard_core::{DeviceRecord, DeviceSource, SourceError, SourceResult};

use crate::{EntraConfig, EntraCredentials, EntraResult, GraphClient, TokenCache};

/// Device source backed by Microsoft Graph.
#[derive(Debug)]
pub struct EntraConnector {
    config: EntraConfig,
    token_cache: Arc<TokenCache>,
    graph_client: GraphClient,
}

impl EntraConnector {
    /// Creates a connector. No network traffic happens until the session is established.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: EntraConfig, credentials: EntraCredentials) -> EntraResult<Self> {
        let token_cache = Arc::new(TokenCache::new(credentials, &config));
        let graph_client = GraphClient::new(Arc::clone(&token_cache), &config)?;

        Ok(Self {
            config,
            token_cache,
            graph_client,
        })
    }

    /// Replaces the Graph client, e.g. to shorten backoff in tests.
    #[must_use]
    pub fn with_graph_client(mut self, graph_client: GraphClient) -> Self {
        self.graph_client = graph_client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &EntraConfig {
        &self.config
    }

    #[must_use]
    pub fn graph_client(&self) -> &GraphClient {
        &self.graph_client
    }

    #[must_use]
    pub fn token_cache(&self) -> &Arc<TokenCache> {
        &self.token_cache
    }
}

#[async_trait]
impl DeviceSource for EntraConnector {
    #[instrument(skip(self), fields(tenant_id = %self.config.tenant_id))]
    async fn establish_session(&self) -> SourceResult<()> {
        self.token_cache
            .get_token()
            .await
            .map_err(|e| SourceError::Authentication(e.to_string()))?;
        info!("Entra session established");
        Ok(())
    }

    async fn list_devices(&self) -> SourceResult<Vec<DeviceRecord>> {
        self.list_all_devices()
            .await
            .map_err(|e| SourceError::Listing(e.to_string()))
    }
}

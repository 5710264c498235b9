//! LDAP connector implementation
//!
//! Implements the `DirectorySource` trait for Active Directory.

use async_trait::async_trait;
use ldap3::adapters::{Adapter, EntriesOnly, PagedResults};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use staleguard_core::{DirectoryQuery, DirectoryRow, DirectorySource, SourceError, SourceResult};

use crate::config::DirectoryConfig;
use crate::error::{LdapError, LdapResult};
use crate::query::{domain_to_base_dn, entry_to_row, ldap_attribute, stale_computer_filter};

/// LDAP result code for invalid credentials.
const RC_INVALID_CREDENTIALS: u32 = 49;

/// Active Directory source querying each partition over its own connection.
pub struct LdapConnector {
    config: DirectoryConfig,
    partitions: Vec<String>,
}

impl LdapConnector {
    /// Create a new connector with the given configuration.
    pub fn new(config: DirectoryConfig) -> LdapResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            partitions: Vec::new(),
        })
    }

    /// Partitions whose servers may be used to verify the bind credentials,
    /// tried in order until one is reachable.
    #[must_use]
    pub fn with_partitions<I, S>(mut self, partitions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partitions = partitions.into_iter().map(Into::into).collect();
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Search root for a query: the scope restriction if set, else the partition's naming context.
    #[must_use]
    pub fn search_base(query: &DirectoryQuery) -> String {
        query
            .scope
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| domain_to_base_dn(&query.partition))
    }

    /// Open a connection to the server for `partition` and spawn its driver.
    async fn open(&self, partition: &str) -> LdapResult<Ldap> {
        let url = self.config.url_for(partition);

        debug!(url = %url, "Connecting to LDAP server");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(self.config.connect_timeout_secs))
            .set_starttls(self.config.use_starttls)
            .set_no_tls_verify(self.config.no_tls_verify);

        let (conn, ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| LdapError::Connection {
                url: url.clone(),
                source: e,
            })?;

        // Spawn the connection driver
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        Ok(ldap)
    }

    /// Simple bind with the configured credentials. No-op when anonymous.
    async fn bind(&self, ldap: &mut Ldap) -> LdapResult<()> {
        let Some(bind_dn) = self.config.bind_dn.as_deref() else {
            debug!("No bind DN configured, using anonymous access");
            return Ok(());
        };
        let bind_password = self.config.bind_password.as_deref().unwrap_or("");

        debug!(bind_dn = %bind_dn, "Performing LDAP bind");

        let result = ldap.simple_bind(bind_dn, bind_password).await?;
        match result.rc {
            0 => Ok(()),
            RC_INVALID_CREDENTIALS => Err(LdapError::InvalidCredentials {
                bind_dn: bind_dn.to_string(),
            }),
            rc => Err(LdapError::Bind {
                rc,
                message: result.text,
            }),
        }
    }

    /// Open and bind a connection to the server for `partition`.
    async fn connect(&self, partition: &str) -> LdapResult<Ldap> {
        let mut ldap = self.open(partition).await?;
        self.bind(&mut ldap).await?;
        info!(partition = %partition, "LDAP connection established");
        Ok(ldap)
    }

    /// Bind once against the first reachable partition server.
    ///
    /// Rejected credentials are returned as errors. Unreachable servers are
    /// skipped and left to fail their own partition queries.
    #[instrument(skip(self))]
    pub async fn verify_bind(&self) -> LdapResult<()> {
        if self.config.bind_dn.is_none() {
            return Ok(());
        }

        for partition in &self.partitions {
            let mut ldap = match self.open(partition).await {
                Ok(ldap) => ldap,
                Err(e) => {
                    warn!(partition = %partition, error = %e, "Cannot verify bind against partition server");
                    continue;
                }
            };

            let result = self.bind(&mut ldap).await;
            if let Err(e) = ldap.unbind().await {
                debug!(error = %e, "LDAP unbind failed");
            }
            match result {
                Ok(()) => {
                    info!(partition = %partition, "LDAP bind verified");
                    return Ok(());
                }
                Err(e) if e.is_credential_failure() => return Err(e),
                Err(e) => {
                    warn!(partition = %partition, error = %e, "Cannot verify bind against partition server");
                }
            }
        }

        warn!("No partition server reachable, bind not verified");
        Ok(())
    }

    /// Run one paged search for stale computers in a partition.
    #[instrument(skip(self), fields(partition = %query.partition))]
    pub async fn search_partition(&self, query: &DirectoryQuery) -> LdapResult<Vec<DirectoryRow>> {
        let mut ldap = self.connect(&query.partition).await?;

        let base = Self::search_base(query);
        let filter = stale_computer_filter(query.cutoff.instant());
        let attrs: Vec<&str> = query.attributes.iter().copied().map(ldap_attribute).collect();
        let page_size = i32::try_from(query.page_size_hint).unwrap_or(i32::MAX);

        debug!(base = %base, filter = %filter, page_size, "Searching LDAP");

        let adapters: Vec<Box<dyn Adapter<_, _>>> = vec![
            Box::new(EntriesOnly::new()),
            Box::new(PagedResults::new(page_size)),
        ];
        let mut search = ldap
            .streaming_search_with(adapters, &base, Scope::Subtree, &filter, attrs)
            .await?;

        let mut rows = Vec::new();
        while let Some(entry) = search.next().await? {
            rows.push(entry_to_row(&SearchEntry::construct(entry)));
        }
        search.finish().await.success()?;

        if let Err(e) = ldap.unbind().await {
            debug!(error = %e, "LDAP unbind failed");
        }

        info!(rows = rows.len(), "LDAP search completed");
        Ok(rows)
    }
}

#[async_trait]
impl DirectorySource for LdapConnector {
    async fn establish_session(&self) -> SourceResult<()> {
        self.verify_bind()
            .await
            .map_err(|e| SourceError::Authentication(e.to_string()))
    }

    async fn query_stale_computers(&self, query: &DirectoryQuery) -> SourceResult<Vec<DirectoryRow>> {
        self.search_partition(query)
            .await
            .map_err(|e| SourceError::query(&query.partition, e.to_string()))
    }
}

impl std::fmt::Debug for LdapConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapConnector")
            .field("config", &self.config)
            .field("partitions", &self.partitions)
            .finish()
    }
}

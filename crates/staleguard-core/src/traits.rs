//! Collaborator interfaces consumed by the pipeline.
//!
//! Connector crates implement these traits. The core only sees materialized
//! row sets; pagination, sessions and transport are the implementor's concern.

use async_trait::async_trait;

use crate::config::ReconcileSettings;
use crate::cutoff::Cutoff;
use crate::error::SourceResult;
use crate::types::{DeviceRecord, DirectoryRow};

/// Logical attributes requested from the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryAttribute {
    LastModified,
    DistinguishedPath,
    AccountName,
    Name,
}

impl DirectoryAttribute {
    /// The attribute set every stale-computer query asks for.
    pub const STALE_COMPUTER_SET: [DirectoryAttribute; 4] = [
        DirectoryAttribute::LastModified,
        DirectoryAttribute::DistinguishedPath,
        DirectoryAttribute::AccountName,
        DirectoryAttribute::Name,
    ];
}

/// One per-partition request for computer records changed at or before the cutoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryQuery {
    /// Partition (domain) to query.
    pub partition: String,
    /// Records must have been modified at or before this instant.
    pub cutoff: Cutoff,
    /// Attributes to return.
    pub attributes: Vec<DirectoryAttribute>,
    /// Hint for server-side paging.
    pub page_size_hint: u32,
    /// Optional narrower search root.
    pub scope: Option<String>,
}

impl DirectoryQuery {
    /// Build the stale-computer query for `partition` from run settings.
    #[must_use]
    pub fn stale_computers(partition: &str, cutoff: Cutoff, settings: &ReconcileSettings) -> Self {
        Self {
            partition: partition.to_string(),
            cutoff,
            attributes: DirectoryAttribute::STALE_COMPUTER_SET.to_vec(),
            page_size_hint: settings.page_size_hint,
            scope: settings.scope_restriction.clone(),
        }
    }
}

/// On-premises directory that can be queried per partition.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// Establish any run-wide session. A failure aborts the run.
    async fn establish_session(&self) -> SourceResult<()> {
        Ok(())
    }

    /// Return computer rows matching `query`.
    ///
    /// Must return an error, not an empty vector, when the partition could
    /// not be queried.
    async fn query_stale_computers(&self, query: &DirectoryQuery) -> SourceResult<Vec<DirectoryRow>>;
}

/// Cloud identity directory that can list every device.
#[async_trait]
pub trait DeviceSource: Send + Sync {
    /// Establish the cloud session. A failure aborts the run.
    async fn establish_session(&self) -> SourceResult<()>;

    /// Return the complete device set.
    async fn list_devices(&self) -> SourceResult<Vec<DeviceRecord>>;
}

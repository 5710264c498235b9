//! Immutable settings for one reconciliation run.

use serde::{Deserialize, Serialize};

use crate::collector::ExclusionRule;
use crate::error::{ReconcileError, ReconcileResult};

/// Upper bound for the staleness window (100 years).
pub const MAX_STALE_CUTOFF_DAYS: u32 = 36_500;

/// Default page size hint passed to directory queries.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Settings consumed by the core stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSettings {
    /// Days before now that define the cutoff.
    pub stale_cutoff_days: u32,
    /// Partitions to query, in order.
    pub domain_partitions: Vec<String>,
    /// Distinguished-path exclusions.
    #[serde(default)]
    pub exclusions: ExclusionRule,
    /// Optional narrower search root.
    #[serde(default)]
    pub scope_restriction: Option<String>,
    /// Page size hint for directory queries.
    #[serde(default = "default_page_size")]
    pub page_size_hint: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl ReconcileSettings {
    /// Create settings with no exclusions and no scope restriction.
    pub fn new(stale_cutoff_days: u32, domain_partitions: Vec<String>) -> Self {
        Self {
            stale_cutoff_days,
            domain_partitions,
            exclusions: ExclusionRule::default(),
            scope_restriction: None,
            page_size_hint: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the exclusion rule.
    #[must_use]
    pub fn with_exclusions(mut self, exclusions: ExclusionRule) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Restrict queries to a search root.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope_restriction = Some(scope.into());
        self
    }

    /// Set the page size hint.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size_hint = page_size;
        self
    }

    /// Validate the settings.
    pub fn validate(&self) -> ReconcileResult<()> {
        if self.stale_cutoff_days > MAX_STALE_CUTOFF_DAYS {
            return Err(ReconcileError::InvalidSettings(format!(
                "stale_cutoff_days must be at most {}, got {}",
                MAX_STALE_CUTOFF_DAYS, self.stale_cutoff_days
            )));
        }

        if self.domain_partitions.is_empty() {
            return Err(ReconcileError::InvalidSettings(
                "at least one domain partition is required".to_string(),
            ));
        }

        for (i, partition) in self.domain_partitions.iter().enumerate() {
            if partition.trim().is_empty() {
                return Err(ReconcileError::InvalidSettings(format!(
                    "domain_partitions[{}] cannot be empty",
                    i
                )));
            }
        }

        if self.page_size_hint == 0 {
            return Err(ReconcileError::InvalidSettings(
                "page_size_hint must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

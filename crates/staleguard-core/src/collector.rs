//! Candidate collection across domain partitions.
//!
//! Each partition gets one directory query. A failing partition is logged
//! and skipped; the remaining partitions are still collected. No
//! cross-partition deduplication happens here, so the same computer name in
//! two domains yields two candidates.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::ReconcileSettings;
use crate::cutoff::Cutoff;
use crate::traits::{DirectoryQuery, DirectorySource};
use crate::types::{Candidate, DirectoryRow};

/// Drops directory rows whose distinguished path contains any listed substring.
///
/// Matching is a plain, case-sensitive substring test. Empty substrings are
/// discarded since they would match every row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ExclusionRule {
    substrings: Vec<String>,
}

impl ExclusionRule {
    /// Build a rule from path substrings.
    pub fn new<I, S>(substrings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            substrings: substrings
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        }
    }

    /// True when the rule excludes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.substrings.is_empty()
    }

    /// The configured substrings.
    #[must_use]
    pub fn substrings(&self) -> &[String] {
        &self.substrings
    }

    /// True when `path` contains any configured substring.
    #[must_use]
    pub fn excludes(&self, path: &str) -> bool {
        self.substrings.iter().any(|s| path.contains(s.as_str()))
    }

    /// Filter rows. Returns the input untouched when the rule is empty.
    #[must_use]
    pub fn apply(&self, rows: Vec<DirectoryRow>) -> Vec<DirectoryRow> {
        if self.is_empty() {
            return rows;
        }

        rows.into_iter()
            .filter(|row| {
                !row.distinguished_name
                    .as_deref()
                    .is_some_and(|dn| self.excludes(dn))
            })
            .collect()
    }
}

impl From<Vec<String>> for ExclusionRule {
    fn from(substrings: Vec<String>) -> Self {
        Self::new(substrings)
    }
}

impl From<ExclusionRule> for Vec<String> {
    fn from(rule: ExclusionRule) -> Self {
        rule.substrings
    }
}

/// A partition whose query failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionFailure {
    pub partition: String,
    pub error: String,
}

/// Outcome of collecting every configured partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    /// Candidates in partition order, then directory order.
    pub candidates: Vec<Candidate>,
    /// Partitions that contributed nothing because their query failed.
    pub failed_partitions: Vec<PartitionFailure>,
    /// Rows dropped by the exclusion rule.
    pub excluded_rows: usize,
    /// Rows dropped because they could not form a candidate.
    pub rejected_rows: usize,
}

impl Collection {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Rows of one partition after exclusion and validation.
#[derive(Debug, Default)]
struct PartitionRows {
    candidates: Vec<Candidate>,
    excluded: usize,
    rejected: usize,
}

fn normalize_partition_rows(
    partition: &str,
    rows: Vec<DirectoryRow>,
    settings: &ReconcileSettings,
    cutoff: Cutoff,
) -> PartitionRows {
    let fetched = rows.len();
    let kept = settings.exclusions.apply(rows);
    let mut out = PartitionRows {
        excluded: fetched - kept.len(),
        ..PartitionRows::default()
    };

    for row in kept {
        let dn = row.distinguished_name.clone().unwrap_or_default();
        match Candidate::from_row(partition, row, cutoff) {
            Ok(candidate) => out.candidates.push(candidate),
            Err(reason) => {
                warn!(partition = %partition, dn = %dn, reason = %reason, "Rejected directory row");
                out.rejected += 1;
            }
        }
    }

    out
}

/// Collect candidates from every configured partition.
///
/// Never fails as a whole: partition errors are recorded in
/// [`Collection::failed_partitions`].
#[instrument(skip_all, fields(partitions = settings.domain_partitions.len(), cutoff = %cutoff))]
pub async fn collect_candidates<D>(
    source: &D,
    settings: &ReconcileSettings,
    cutoff: Cutoff,
) -> Collection
where
    D: DirectorySource + ?Sized,
{
    let mut collection = Collection::default();

    for partition in &settings.domain_partitions {
        let query = DirectoryQuery::stale_computers(partition, cutoff, settings);
        debug!(partition = %partition, "Querying partition");

        let rows = match source.query_stale_computers(&query).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(partition = %partition, error = %e, "Directory query failed, skipping partition");
                collection.failed_partitions.push(PartitionFailure {
                    partition: partition.clone(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        let fetched = rows.len();
        let normalized = normalize_partition_rows(partition, rows, settings, cutoff);
        info!(
            partition = %partition,
            fetched,
            excluded = normalized.excluded,
            rejected = normalized.rejected,
            candidates = normalized.candidates.len(),
            "Partition collected"
        );

        collection.excluded_rows += normalized.excluded;
        collection.rejected_rows += normalized.rejected;
        collection.candidates.extend(normalized.candidates);
    }

    info!(
        candidates = collection.candidates.len(),
        failed_partitions = collection.failed_partitions.len(),
        "Candidate collection completed"
    );

    collection
}

//! End-to-end run: sessions, collection, indexing, reconciliation, ordering.

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use crate::collector::{collect_candidates, PartitionFailure};
use crate::config::ReconcileSettings;
use crate::cutoff::Cutoff;
use crate::error::{ReconcileError, ReconcileResult};
use crate::index::ActivityIndex;
use crate::ordering::{order_actionable, order_enriched};
use crate::reconcile::reconcile;
use crate::traits::{DeviceSource, DirectorySource};
use crate::types::EnrichedRecord;

/// Ordered result of a run that found candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub cutoff: Cutoff,
    pub candidate_count: usize,
    /// Devices listed by the cloud directory.
    pub device_count: usize,
    /// Entries in the activity index.
    pub indexed_devices: usize,
    /// Every candidate, inactive first, then by matched sign-in.
    pub enriched: Vec<EnrichedRecord>,
    /// Candidates without confirmed activity, oldest change first.
    pub actionable: Vec<EnrichedRecord>,
    pub failed_partitions: Vec<PartitionFailure>,
    pub excluded_rows: usize,
    pub rejected_rows: usize,
}

impl RunReport {
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.enriched.len() - self.actionable.len()
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Collection yielded nothing; later stages did not run.
    NoCandidates {
        cutoff: Cutoff,
        failed_partitions: Vec<PartitionFailure>,
    },
    /// Reconciliation completed.
    Completed(RunReport),
}

/// Run a full reconciliation against the given collaborators.
///
/// Sessions are established before anything is collected; a session failure
/// aborts the run. Partition failures are absorbed into the report. A failed
/// device listing aborts, since every candidate would otherwise look inactive.
#[instrument(skip_all, fields(stale_cutoff_days = settings.stale_cutoff_days))]
pub async fn run_reconciliation<D, V>(
    directory: &D,
    devices: &V,
    settings: &ReconcileSettings,
    now: DateTime<Utc>,
) -> ReconcileResult<RunOutcome>
where
    D: DirectorySource + ?Sized,
    V: DeviceSource + ?Sized,
{
    settings.validate()?;

    devices
        .establish_session()
        .await
        .map_err(ReconcileError::Authentication)?;
    directory
        .establish_session()
        .await
        .map_err(ReconcileError::Authentication)?;

    let cutoff = Cutoff::days_before(now, settings.stale_cutoff_days);
    info!(cutoff = %cutoff, partitions = settings.domain_partitions.len(), "Starting reconciliation");

    let collection = collect_candidates(directory, settings, cutoff).await;
    if collection.is_empty() {
        if !collection.failed_partitions.is_empty() {
            warn!(
                failed_partitions = collection.failed_partitions.len(),
                "No candidates collected and some partitions failed"
            );
        }
        info!("No stale computer accounts found, nothing to reconcile");
        return Ok(RunOutcome::NoCandidates {
            cutoff,
            failed_partitions: collection.failed_partitions,
        });
    }

    let listed = devices
        .list_devices()
        .await
        .map_err(ReconcileError::DeviceListing)?;
    let device_count = listed.len();

    let index = ActivityIndex::build(listed, cutoff);
    info!(devices = device_count, indexed = index.len(), "Activity index ready");

    let reconciliation = reconcile(&collection.candidates, &index, cutoff);
    let mut actionable = reconciliation.actionable();
    let mut enriched = reconciliation.enriched;
    order_actionable(&mut actionable);
    order_enriched(&mut enriched);

    info!(
        candidates = collection.candidates.len(),
        active = enriched.len() - actionable.len(),
        actionable = actionable.len(),
        "Reconciliation completed"
    );

    Ok(RunOutcome::Completed(RunReport {
        cutoff,
        candidate_count: collection.candidates.len(),
        device_count,
        indexed_devices: index.len(),
        enriched,
        actionable,
        failed_partitions: collection.failed_partitions,
        excluded_rows: collection.excluded_rows,
        rejected_rows: collection.rejected_rows,
    }))
}

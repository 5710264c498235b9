//! Join candidates against the activity index and classify them.

use serde::{Deserialize, Serialize};

use crate::cutoff::Cutoff;
use crate::index::ActivityIndex;
use crate::types::{ActivityStatus, Candidate, EnrichedRecord};

/// Enrich one candidate.
///
/// The sign-in is re-checked against the cutoff even though the index only
/// holds active devices, so classification stays correct if index
/// construction ever changes. A matched device that fails the re-check keeps
/// its id and sign-in on the record but is classified `NotActiveOrNotFound`,
/// so `status` always agrees with `is_active`.
#[must_use]
pub fn enrich(candidate: &Candidate, index: &ActivityIndex, cutoff: Cutoff) -> EnrichedRecord {
    let matched = index.get(&candidate.normalized_name());
    let matched_last_sign_in = matched.and_then(|d| d.last_sign_in);
    let is_active = matched.is_some() && cutoff.is_active(matched_last_sign_in);

    EnrichedRecord {
        candidate: candidate.clone(),
        matched_device_id: matched.map(|d| d.id.clone()),
        matched_last_sign_in,
        is_active,
        status: if is_active {
            ActivityStatus::Active
        } else {
            ActivityStatus::NotActiveOrNotFound
        },
    }
}

/// Enriched records for a candidate list, in candidate order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub enriched: Vec<EnrichedRecord>,
}

impl Reconciliation {
    /// Records with no confirmed activity.
    #[must_use]
    pub fn actionable(&self) -> Vec<EnrichedRecord> {
        self.enriched
            .iter()
            .filter(|r| r.is_actionable())
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.enriched.iter().filter(|r| r.is_active).count()
    }

    #[must_use]
    pub fn actionable_count(&self) -> usize {
        self.enriched.len() - self.active_count()
    }
}

/// Enrich every candidate. Pure and total.
#[must_use]
pub fn reconcile(candidates: &[Candidate], index: &ActivityIndex, cutoff: Cutoff) -> Reconciliation {
    Reconciliation {
        enriched: candidates
            .iter()
            .map(|c| enrich(c, index, cutoff))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeviceRecord;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn candidate(name: &str) -> Candidate {
        Candidate {
            domain_partition: "corp.example.com".to_string(),
            computer_name: name.to_string(),
            account_name: format!("{name}$"),
            last_changed: ts(2023, 1, 1),
            distinguished_name: format!("CN={name},OU=Workstations,DC=corp,DC=example,DC=com"),
        }
    }

    fn cutoff() -> Cutoff {
        Cutoff::at(ts(2024, 1, 1))
    }

    #[test]
    fn test_active_match_excluded_from_actionable() {
        let index = ActivityIndex::build(
            vec![DeviceRecord::new("dev-1", Some("PC01".into()), Some(ts(2024, 6, 1)))],
            cutoff(),
        );
        let result = reconcile(&[candidate("PC01")], &index, cutoff());

        let record = &result.enriched[0];
        assert!(record.is_active);
        assert_eq!(record.status, ActivityStatus::Active);
        assert_eq!(record.matched_device_id.as_deref(), Some("dev-1"));
        assert_eq!(record.matched_last_sign_in, Some(ts(2024, 6, 1)));
        assert!(result.actionable().is_empty());
    }

    #[test]
    fn test_missing_match_is_actionable() {
        let index = ActivityIndex::default();
        let result = reconcile(&[candidate("PC02")], &index, cutoff());

        let record = &result.enriched[0];
        assert!(!record.is_active);
        assert_eq!(record.status, ActivityStatus::NotActiveOrNotFound);
        assert!(record.matched_device_id.is_none());
        assert!(record.matched_last_sign_in.is_none());
        assert_eq!(result.actionable(), vec![record.clone()]);
    }

    #[test]
    fn test_join_is_case_insensitive() {
        let index = ActivityIndex::build(
            vec![DeviceRecord::new("dev-1", Some("pc01".into()), Some(ts(2024, 6, 1)))],
            cutoff(),
        );
        let record = enrich(&candidate("Pc01"), &index, cutoff());
        assert!(record.is_active);
    }

    #[test]
    fn test_recheck_against_later_cutoff() {
        let index = ActivityIndex::build(
            vec![DeviceRecord::new("dev-1", Some("PC01".into()), Some(ts(2024, 2, 1)))],
            cutoff(),
        );
        let later = Cutoff::at(ts(2024, 3, 1));
        let record = enrich(&candidate("PC01"), &index, later);
        assert!(!record.is_active);
        assert_eq!(record.status, ActivityStatus::NotActiveOrNotFound);
        assert_eq!(record.matched_device_id.as_deref(), Some("dev-1"));
    }

    #[test]
    fn test_duplicate_names_across_partitions_both_enriched() {
        let mut other = candidate("PC01");
        other.domain_partition = "emea.example.com".to_string();
        let result = reconcile(&[candidate("PC01"), other], &ActivityIndex::default(), cutoff());
        assert_eq!(result.enriched.len(), 2);
        assert_eq!(result.actionable_count(), 2);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let index = ActivityIndex::build(
            vec![
                DeviceRecord::new("dev-1", Some("PC01".into()), Some(ts(2024, 6, 1))),
                DeviceRecord::new("dev-2", Some("PC03".into()), Some(ts(2024, 2, 1))),
            ],
            cutoff(),
        );
        let candidates = vec![candidate("PC01"), candidate("PC02"), candidate("PC03")];

        let first = reconcile(&candidates, &index, cutoff());
        let second = reconcile(&candidates, &index, cutoff());
        assert_eq!(first, second);
        assert_eq!(first.active_count(), 2);
        assert_eq!(first.actionable_count(), 1);
    }
}

//! Output ordering expected by exporters.
//!
//! Both orders use stable sorts, so records with equal keys keep their
//! collection order.

use crate::types::EnrichedRecord;

/// Oldest directory change first.
pub fn order_actionable(records: &mut [EnrichedRecord]) {
    records.sort_by_key(|r| r.candidate.last_changed);
}

/// Inactive before active, then by matched sign-in with absent first.
pub fn order_enriched(records: &mut [EnrichedRecord]) {
    records.sort_by_key(|r| (r.is_active, r.matched_last_sign_in));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActivityStatus, Candidate};
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn record(name: &str, changed: DateTime<Utc>, sign_in: Option<DateTime<Utc>>) -> EnrichedRecord {
        let is_active = sign_in.is_some();
        EnrichedRecord {
            candidate: Candidate {
                domain_partition: "d".to_string(),
                computer_name: name.to_string(),
                account_name: format!("{name}$"),
                last_changed: changed,
                distinguished_name: format!("CN={name}"),
            },
            matched_device_id: sign_in.map(|_| format!("id-{name}")),
            matched_last_sign_in: sign_in,
            is_active,
            status: if is_active {
                ActivityStatus::Active
            } else {
                ActivityStatus::NotActiveOrNotFound
            },
        }
    }

    fn names(records: &[EnrichedRecord]) -> Vec<&str> {
        records
            .iter()
            .map(|r| r.candidate.computer_name.as_str())
            .collect()
    }

    #[test]
    fn test_actionable_oldest_first() {
        let mut records = vec![
            record("B", ts(2023, 6, 1), None),
            record("A", ts(2022, 1, 1), None),
            record("C", ts(2023, 12, 1), None),
        ];
        order_actionable(&mut records);
        assert_eq!(names(&records), ["A", "B", "C"]);
    }

    #[test]
    fn test_actionable_sort_is_stable() {
        let mut records = vec![
            record("first", ts(2023, 1, 1), None),
            record("second", ts(2023, 1, 1), None),
        ];
        order_actionable(&mut records);
        assert_eq!(names(&records), ["first", "second"]);
    }

    #[test]
    fn test_enriched_inactive_then_by_sign_in() {
        let mut records = vec![
            record("late", ts(2023, 1, 1), Some(ts(2024, 9, 1))),
            record("none", ts(2023, 1, 1), None),
            record("early", ts(2023, 1, 1), Some(ts(2024, 2, 1))),
        ];
        order_enriched(&mut records);
        assert_eq!(names(&records), ["none", "early", "late"]);
    }
}

//! Run-scoped value types: directory rows, candidates, cloud devices and
//! enriched reconciliation records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cutoff::Cutoff;

/// Case-fold a computer or device name into the join key.
///
/// Both sides of the join must go through this function.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.to_uppercase()
}

/// Raw row returned by a directory query, before validation.
///
/// Timestamps that could not be parsed by the collaborator arrive as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRow {
    /// Common name of the computer object.
    pub name: Option<String>,
    /// Logon account name (e.g. `PC01$`).
    pub account_name: Option<String>,
    /// Last modification time of the object.
    pub last_modified: Option<DateTime<Utc>>,
    /// Full distinguished path of the object.
    pub distinguished_name: Option<String>,
}

/// Why a directory row did not become a [`Candidate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowRejection {
    #[error("row has no name")]
    MissingName,

    #[error("row has no usable last-modified timestamp")]
    MissingLastChanged,

    #[error("row was modified after the cutoff")]
    NotStale,
}

/// A stale directory computer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Domain partition the record was collected from.
    pub domain_partition: String,
    /// Computer name used for the join.
    pub computer_name: String,
    /// Logon account name.
    pub account_name: String,
    /// Last modification time, at or before the cutoff.
    pub last_changed: DateTime<Utc>,
    /// Distinguished path of the object.
    pub distinguished_name: String,
}

impl Candidate {
    /// Validate a directory row collected from `partition`.
    ///
    /// Rows without a name or without a parseable last-modified value are
    /// rejected, as are rows the directory returned despite being newer than
    /// the cutoff.
    pub fn from_row(
        partition: &str,
        row: DirectoryRow,
        cutoff: Cutoff,
    ) -> Result<Self, RowRejection> {
        let computer_name = row
            .name
            .filter(|n| !n.is_empty())
            .ok_or(RowRejection::MissingName)?;
        let last_changed = row.last_modified.ok_or(RowRejection::MissingLastChanged)?;
        if !cutoff.is_stale(last_changed) {
            return Err(RowRejection::NotStale);
        }

        Ok(Self {
            domain_partition: partition.to_string(),
            computer_name,
            account_name: row.account_name.unwrap_or_default(),
            last_changed,
            distinguished_name: row.distinguished_name.unwrap_or_default(),
        })
    }

    /// The join key for this candidate.
    #[must_use]
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.computer_name)
    }
}

/// A device as listed by the cloud identity directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Opaque cloud object identifier.
    pub id: String,
    /// Display name, used as the join key once normalized.
    pub display_name: Option<String>,
    /// Approximate last sign-in.
    pub last_sign_in: Option<DateTime<Utc>>,
}

impl DeviceRecord {
    pub fn new(
        id: impl Into<String>,
        display_name: Option<String>,
        last_sign_in: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name,
            last_sign_in,
        }
    }

    /// Sign-in time for recency comparisons; absent sorts before everything.
    #[must_use]
    pub fn recency(&self) -> DateTime<Utc> {
        self.last_sign_in.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Join key, if the device has a usable name.
    #[must_use]
    pub fn normalized_name(&self) -> Option<String> {
        self.display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .map(normalize_name)
    }
}

/// Activity classification of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActivityStatus {
    /// A matching cloud device signed in at or after the cutoff.
    Active,
    /// No confirmed activity. The device may be inactive, missing from the
    /// cloud directory, or lacking a sign-in value; these are not told apart.
    NotActiveOrNotFound,
}

impl ActivityStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::NotActiveOrNotFound => "NotActiveOrNotFound",
        }
    }
}

impl std::fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate joined with its activity evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub candidate: Candidate,
    pub matched_device_id: Option<String>,
    pub matched_last_sign_in: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub status: ActivityStatus,
}

impl EnrichedRecord {
    /// True when this record belongs in the decommissioning output.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        !self.is_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn row(name: Option<&str>, modified: Option<DateTime<Utc>>) -> DirectoryRow {
        DirectoryRow {
            name: name.map(String::from),
            account_name: name.map(|n| format!("{n}$")),
            last_modified: modified,
            distinguished_name: name.map(|n| format!("CN={n},DC=corp,DC=example,DC=com")),
        }
    }

    #[test]
    fn test_normalize_name_case_folds() {
        assert_eq!(normalize_name("pc03"), "PC03");
        assert_eq!(normalize_name("Pc03"), normalize_name("pC03"));
    }

    #[test]
    fn test_candidate_from_valid_row() {
        let cutoff = Cutoff::at(ts(2024, 1, 1));
        let candidate =
            Candidate::from_row("corp.example.com", row(Some("PC01"), Some(ts(2023, 1, 1))), cutoff)
                .unwrap();
        assert_eq!(candidate.domain_partition, "corp.example.com");
        assert_eq!(candidate.computer_name, "PC01");
        assert_eq!(candidate.account_name, "PC01$");
        assert_eq!(candidate.last_changed, ts(2023, 1, 1));
    }

    #[test]
    fn test_candidate_rejects_missing_last_changed() {
        let cutoff = Cutoff::at(ts(2024, 1, 1));
        let err = Candidate::from_row("d", row(Some("PC01"), None), cutoff).unwrap_err();
        assert_eq!(err, RowRejection::MissingLastChanged);
    }

    #[test]
    fn test_candidate_rejects_missing_or_empty_name() {
        let cutoff = Cutoff::at(ts(2024, 1, 1));
        assert_eq!(
            Candidate::from_row("d", row(None, Some(ts(2023, 1, 1))), cutoff).unwrap_err(),
            RowRejection::MissingName
        );
        assert_eq!(
            Candidate::from_row("d", row(Some(""), Some(ts(2023, 1, 1))), cutoff).unwrap_err(),
            RowRejection::MissingName
        );
    }

    #[test]
    fn test_candidate_rejects_fresh_row() {
        let cutoff = Cutoff::at(ts(2024, 1, 1));
        let err = Candidate::from_row("d", row(Some("PC01"), Some(ts(2024, 2, 1))), cutoff)
            .unwrap_err();
        assert_eq!(err, RowRejection::NotStale);
    }

    #[test]
    fn test_device_recency_absent_is_minimal() {
        let absent = DeviceRecord::new("a", Some("X".into()), None);
        let present = DeviceRecord::new("b", Some("X".into()), Some(ts(1971, 1, 1)));
        assert!(absent.recency() < present.recency());
    }

    #[test]
    fn test_device_without_name_has_no_key() {
        assert_eq!(DeviceRecord::new("a", None, None).normalized_name(), None);
        assert_eq!(
            DeviceRecord::new("a", Some(String::new()), None).normalized_name(),
            None
        );
        assert_eq!(
            DeviceRecord::new("a", Some("pc01".into()), None).normalized_name(),
            Some("PC01".to_string())
        );
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ActivityStatus::Active.to_string(), "Active");
        assert_eq!(
            ActivityStatus::NotActiveOrNotFound.to_string(),
            "NotActiveOrNotFound"
        );
    }
}

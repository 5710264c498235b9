//! CSV export of reconciliation results
//!
//! Both files share one flat layout, one row per candidate:
//! Domain, ComputerName, AccountName, LastChanged, DistinguishedName,
//! MatchedDeviceId, MatchedLastSignIn, IsActive, Status
//!
//! Timestamps are RFC 3339 in UTC. Absent values are empty cells.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use staleguard_core::{EnrichedRecord, RunReport};

use crate::error::{CliError, CliResult};

/// Header row, in column order.
pub const COLUMNS: [&str; 9] = [
    "Domain",
    "ComputerName",
    "AccountName",
    "LastChanged",
    "DistinguishedName",
    "MatchedDeviceId",
    "MatchedLastSignIn",
    "IsActive",
    "Status",
];

/// CSV record for one enriched candidate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CsvRecord {
    pub domain: String,
    pub computer_name: String,
    pub account_name: String,
    pub last_changed: String,
    pub distinguished_name: String,
    #[serde(default)]
    pub matched_device_id: String,
    #[serde(default)]
    pub matched_last_sign_in: String,
    pub is_active: bool,
    pub status: String,
}

impl From<&EnrichedRecord> for CsvRecord {
    fn from(record: &EnrichedRecord) -> Self {
        let candidate = &record.candidate;
        Self {
            domain: candidate.domain_partition.clone(),
            computer_name: candidate.computer_name.clone(),
            account_name: candidate.account_name.clone(),
            last_changed: format_timestamp(candidate.last_changed),
            distinguished_name: candidate.distinguished_name.clone(),
            matched_device_id: record.matched_device_id.clone().unwrap_or_default(),
            matched_last_sign_in: record
                .matched_last_sign_in
                .map(format_timestamp)
                .unwrap_or_default(),
            is_active: record.is_active,
            status: record.status.as_str().to_string(),
        }
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Write records as CSV. The header is written even when `records` is empty.
pub fn write_records<W: Write>(records: &[EnrichedRecord], writer: W) -> CliResult<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(COLUMNS)
        .map_err(|e| CliError::Export(format!("CSV write error: {}", e)))?;

    for record in records {
        wtr.serialize(CsvRecord::from(record))
            .map_err(|e| CliError::Export(format!("CSV write error: {}", e)))?;
    }

    wtr.flush()
        .map_err(|e| CliError::Io(format!("Failed to flush CSV: {}", e)))?;

    Ok(())
}

/// Write records to a file, creating missing parent directories.
pub fn write_records_to_path(records: &[EnrichedRecord], path: &Path) -> CliResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            CliError::Io(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let file = File::create(path)
        .map_err(|e| CliError::Io(format!("Failed to create {}: {}", path.display(), e)))?;

    write_records(records, file)
}

/// Files written for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    pub primary: PathBuf,
    pub primary_rows: usize,
    pub debug: Option<PathBuf>,
    pub debug_rows: usize,
}

/// Write the actionable export and, when a destination is given, the debug
/// export of every candidate.
pub fn export_report(
    report: &RunReport,
    primary: &Path,
    debug: Option<&Path>,
) -> CliResult<ExportedFiles> {
    write_records_to_path(&report.actionable, primary)?;
    info!(
        path = %primary.display(),
        rows = report.actionable.len(),
        "Actionable export written"
    );

    if let Some(debug_path) = debug {
        write_records_to_path(&report.enriched, debug_path)?;
        info!(
            path = %debug_path.display(),
            rows = report.enriched.len(),
            "Debug export written"
        );
    }

    Ok(ExportedFiles {
        primary: primary.to_path_buf(),
        primary_rows: report.actionable.len(),
        debug: debug.map(Path::to_path_buf),
        debug_rows: if debug.is_some() {
            report.enriched.len()
        } else {
            0
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use staleguard_core::{ActivityStatus, Candidate};

    fn record(device: Option<(&str, DateTime<Utc>)>) -> EnrichedRecord {
        let candidate = Candidate {
            domain_partition: "corp.example.com".to_string(),
            computer_name: "WS-0042".to_string(),
            account_name: "WS-0042$".to_string(),
            last_changed: Utc.with_ymd_and_hms(2024, 1, 15, 8, 30, 0).unwrap(),
            distinguished_name: "CN=WS-0042,OU=Workstations,DC=corp,DC=example,DC=com"
                .to_string(),
        };
        let is_active = device.is_some();
        EnrichedRecord {
            candidate,
            matched_device_id: device.map(|(id, _)| id.to_string()),
            matched_last_sign_in: device.map(|(_, ts)| ts),
            is_active,
            status: if is_active {
                ActivityStatus::Active
            } else {
                ActivityStatus::NotActiveOrNotFound
            },
        }
    }

    #[test]
    fn test_header_only_when_empty() {
        let mut buf = Vec::new();
        write_records(&[], &mut buf).unwrap();

        let output = String::from_utf8(buf).unwrap();
        assert_eq!(output.trim_end(), COLUMNS.join(","));
    }

    #[test]
    fn test_unmatched_record_has_empty_cells() {
        let record = CsvRecord::from(&record(None));

        assert_eq!(record.last_changed, "2024-01-15T08:30:00Z");
        assert!(record.matched_device_id.is_empty());
        assert!(record.matched_last_sign_in.is_empty());
        assert!(!record.is_active);
        assert_eq!(record.status, "NotActiveOrNotFound");
    }

    #[test]
    fn test_matched_record_columns() {
        let signed_in = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut buf = Vec::new();
        write_records(&[record(Some(("dev-1", signed_in)))], &mut buf).unwrap();

        let mut reader = csv::Reader::from_reader(buf.as_slice());
        let headers: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(String::from)
            .collect();
        assert_eq!(headers, COLUMNS);

        let rows: Vec<CsvRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].matched_device_id, "dev-1");
        assert_eq!(rows[0].matched_last_sign_in, "2024-06-01T12:00:00Z");
        assert!(rows[0].is_active);
        assert_eq!(rows[0].status, "Active");
    }
}

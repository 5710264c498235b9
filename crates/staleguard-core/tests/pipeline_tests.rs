//! End-to-end pipeline tests against in-memory collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use staleguard_core::{
    run_reconciliation, ActivityStatus, DeviceRecord, DeviceSource, DirectoryAttribute,
    DirectoryQuery, DirectoryRow, DirectorySource, ExclusionRule, ReconcileError,
    ReconcileSettings, RunOutcome, SourceError, SourceResult,
};

fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

/// "now" such that a 90-day window puts the cutoff at 2024-01-01.
fn now() -> DateTime<Utc> {
    ts(2024, 3, 31)
}

fn computer(name: &str, ou: &str, domain_dn: &str, changed: DateTime<Utc>) -> DirectoryRow {
    DirectoryRow {
        name: Some(name.to_string()),
        account_name: Some(format!("{name}$")),
        last_modified: Some(changed),
        distinguished_name: Some(format!("CN={name},{ou},{domain_dn}")),
    }
}

#[derive(Default)]
struct FakeDirectory {
    partitions: HashMap<String, Result<Vec<DirectoryRow>, String>>,
    reject_session: bool,
    queries: Mutex<Vec<DirectoryQuery>>,
}

impl FakeDirectory {
    fn with(mut self, partition: &str, rows: Vec<DirectoryRow>) -> Self {
        self.partitions.insert(partition.to_string(), Ok(rows));
        self
    }

    fn failing(mut self, partition: &str) -> Self {
        self.partitions
            .insert(partition.to_string(), Err("server unavailable".to_string()));
        self
    }
}

#[async_trait]
impl DirectorySource for FakeDirectory {
    async fn establish_session(&self) -> SourceResult<()> {
        if self.reject_session {
            return Err(SourceError::Authentication(
                "Invalid credentials for CN=svc,DC=a".into(),
            ));
        }
        Ok(())
    }

    async fn query_stale_computers(&self, query: &DirectoryQuery) -> SourceResult<Vec<DirectoryRow>> {
        self.queries.lock().unwrap().push(query.clone());
        match self.partitions.get(&query.partition) {
            Some(Ok(rows)) => Ok(rows.clone()),
            Some(Err(msg)) => Err(SourceError::query(&query.partition, msg.clone())),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Default)]
struct FakeDevices {
    devices: Vec<DeviceRecord>,
    reject_session: bool,
    fail_listing: bool,
    list_calls: AtomicUsize,
}

#[async_trait]
impl DeviceSource for FakeDevices {
    async fn establish_session(&self) -> SourceResult<()> {
        if self.reject_session {
            return Err(SourceError::Authentication("invalid client secret".into()));
        }
        Ok(())
    }

    async fn list_devices(&self) -> SourceResult<Vec<DeviceRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            return Err(SourceError::Listing("graph unavailable".into()));
        }
        Ok(self.devices.clone())
    }
}

fn settings(partitions: &[&str]) -> ReconcileSettings {
    ReconcileSettings::new(90, partitions.iter().map(|p| p.to_string()).collect())
}

fn completed(outcome: RunOutcome) -> staleguard_core::RunReport {
    match outcome {
        RunOutcome::Completed(report) => report,
        other => panic!("expected a completed run, got {other:?}"),
    }
}

#[tokio::test]
async fn test_active_device_excluded_and_missing_device_actionable() {
    let directory = FakeDirectory::default().with(
        "a.example.com",
        vec![
            computer("PC01", "OU=Workstations", "DC=a", ts(2023, 1, 1)),
            computer("PC02", "OU=Workstations", "DC=a", ts(2023, 1, 1)),
        ],
    );
    let devices = FakeDevices {
        devices: vec![DeviceRecord::new("dev-1", Some("pc01".into()), Some(ts(2024, 6, 1)))],
        ..FakeDevices::default()
    };

    let report = completed(
        run_reconciliation(&directory, &devices, &settings(&["a.example.com"]), now())
            .await
            .unwrap(),
    );

    assert_eq!(report.cutoff.instant(), ts(2024, 1, 1));
    assert_eq!(report.candidate_count, 2);
    assert_eq!(report.active_count(), 1);
    assert_eq!(report.actionable.len(), 1);
    assert_eq!(report.actionable[0].candidate.computer_name, "PC02");
    assert_eq!(
        report.actionable[0].status,
        ActivityStatus::NotActiveOrNotFound
    );
}

#[tokio::test]
async fn test_partition_failure_is_isolated() {
    let directory = FakeDirectory::default()
        .with("a", vec![computer("PCA", "OU=W", "DC=a", ts(2023, 1, 1))])
        .failing("b")
        .with("c", vec![computer("PCC", "OU=W", "DC=c", ts(2023, 2, 1))]);
    let devices = FakeDevices::default();

    let report = completed(
        run_reconciliation(&directory, &devices, &settings(&["a", "b", "c"]), now())
            .await
            .unwrap(),
    );

    let partitions: Vec<&str> = report
        .actionable
        .iter()
        .map(|r| r.candidate.domain_partition.as_str())
        .collect();
    assert_eq!(partitions, ["a", "c"]);
    assert_eq!(report.failed_partitions.len(), 1);
    assert_eq!(report.failed_partitions[0].partition, "b");
    assert_eq!(directory.queries.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_no_candidates_skips_device_listing() {
    let directory = FakeDirectory::default().with("a", Vec::new());
    let devices = FakeDevices::default();

    let outcome = run_reconciliation(&directory, &devices, &settings(&["a"]), now())
        .await
        .unwrap();

    assert!(matches!(outcome, RunOutcome::NoCandidates { .. }));
    assert_eq!(devices.list_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_all_partitions_failing_is_not_an_error() {
    let directory = FakeDirectory::default().failing("a").failing("b");
    let devices = FakeDevices::default();

    let outcome = run_reconciliation(&directory, &devices, &settings(&["a", "b"]), now())
        .await
        .unwrap();

    match outcome {
        RunOutcome::NoCandidates {
            failed_partitions, ..
        } => assert_eq!(failed_partitions.len(), 2),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn test_session_failure_aborts_before_collection() {
    let directory =
        FakeDirectory::default().with("a", vec![computer("PC01", "OU=W", "DC=a", ts(2023, 1, 1))]);
    let devices = FakeDevices {
        reject_session: true,
        ..FakeDevices::default()
    };

    let err = run_reconciliation(&directory, &devices, &settings(&["a"]), now())
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::Authentication(_)));
    assert!(directory.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_directory_session_failure_aborts_before_collection() {
    let directory = FakeDirectory {
        reject_session: true,
        ..FakeDirectory::default()
    }
    .with("a", vec![computer("PC01", "OU=W", "DC=a", ts(2023, 1, 1))])
    .with("b", vec![computer("PC02", "OU=W", "DC=b", ts(2023, 1, 1))]);
    let devices = FakeDevices::default();

    let err = run_reconciliation(&directory, &devices, &settings(&["a", "b"]), now())
        .await
        .unwrap_err();

    match err {
        ReconcileError::Authentication(source) => assert!(source.is_authentication()),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(directory.queries.lock().unwrap().is_empty());
    assert_eq!(devices.list_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_device_listing_failure_is_fatal() {
    let directory =
        FakeDirectory::default().with("a", vec![computer("PC01", "OU=W", "DC=a", ts(2023, 1, 1))]);
    let devices = FakeDevices {
        fail_listing: true,
        ..FakeDevices::default()
    };

    let err = run_reconciliation(&directory, &devices, &settings(&["a"]), now())
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::DeviceListing(_)));
}

#[tokio::test]
async fn test_excluded_path_never_reaches_output() {
    let directory = FakeDirectory::default().with(
        "x",
        vec![
            computer("SRV01", "OU=Servers", "DC=x", ts(2023, 1, 1)),
            computer("PC01", "OU=Workstations", "DC=x", ts(2023, 1, 1)),
        ],
    );
    let devices = FakeDevices::default();
    let settings = settings(&["x"]).with_exclusions(ExclusionRule::new(["OU=Servers"]));

    let report = completed(
        run_reconciliation(&directory, &devices, &settings, now())
            .await
            .unwrap(),
    );

    assert_eq!(report.excluded_rows, 1);
    assert!(report
        .enriched
        .iter()
        .all(|r| r.candidate.computer_name != "SRV01"));
    assert_eq!(report.actionable.len(), 1);
}

#[tokio::test]
async fn test_query_carries_cutoff_scope_and_attributes() {
    let directory = FakeDirectory::default();
    let devices = FakeDevices::default();
    let settings = settings(&["a"])
        .with_scope("OU=Computers,DC=a")
        .with_page_size(250);

    run_reconciliation(&directory, &devices, &settings, now())
        .await
        .unwrap();

    let queries = directory.queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].cutoff.instant(), ts(2024, 1, 1));
    assert_eq!(queries[0].scope.as_deref(), Some("OU=Computers,DC=a"));
    assert_eq!(queries[0].page_size_hint, 250);
    assert_eq!(queries[0].attributes, DirectoryAttribute::STALE_COMPUTER_SET.to_vec());
}

#[tokio::test]
async fn test_outputs_are_ordered() {
    let directory = FakeDirectory::default().with(
        "a",
        vec![
            computer("NEWER", "OU=W", "DC=a", ts(2023, 9, 1)),
            computer("ACTIVE_LATE", "OU=W", "DC=a", ts(2022, 1, 1)),
            computer("OLDEST", "OU=W", "DC=a", ts(2021, 1, 1)),
            computer("ACTIVE_EARLY", "OU=W", "DC=a", ts(2022, 1, 1)),
        ],
    );
    let devices = FakeDevices {
        devices: vec![
            DeviceRecord::new("d1", Some("active_late".into()), Some(ts(2024, 3, 1))),
            DeviceRecord::new("d2", Some("active_early".into()), Some(ts(2024, 2, 1))),
        ],
        ..FakeDevices::default()
    };

    let report = completed(
        run_reconciliation(&directory, &devices, &settings(&["a"]), now())
            .await
            .unwrap(),
    );

    let actionable: Vec<&str> = report
        .actionable
        .iter()
        .map(|r| r.candidate.computer_name.as_str())
        .collect();
    assert_eq!(actionable, ["OLDEST", "NEWER"]);

    let enriched: Vec<&str> = report
        .enriched
        .iter()
        .map(|r| r.candidate.computer_name.as_str())
        .collect();
    assert_eq!(enriched, ["NEWER", "OLDEST", "ACTIVE_EARLY", "ACTIVE_LATE"]);
}

#[tokio::test]
async fn test_invalid_settings_rejected() {
    let directory = FakeDirectory::default();
    let devices = FakeDevices::default();

    let err = run_reconciliation(&directory, &devices, &settings(&[]), now())
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::InvalidSettings(_)));
}

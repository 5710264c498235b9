//! # staleguard core
//!
//! Reconciles stale directory computer accounts against cloud device
//! sign-in activity.
//!
//! The pipeline has three stages, all fed by one [`Cutoff`] computed per run:
//!
//! - **Collection** ([`collector`]): one filtered directory query per domain
//!   partition, optional distinguished-name exclusion, normalization into
//!   [`Candidate`] records. A failing partition is skipped with a warning.
//! - **Indexing** ([`index`]): cloud devices with a sign-in at or after the
//!   cutoff are folded into an [`ActivityIndex`] keyed by upper-cased display
//!   name, keeping the most recent sign-in per key.
//! - **Reconciliation** ([`reconcile`]): every candidate is joined against the
//!   index and classified. Candidates without a confirmed active device are
//!   *actionable*.
//!
//! I/O is delegated to the [`DirectorySource`] and [`DeviceSource`] traits.
//! Connector crates implement them; this crate never touches the network.
//!
//! ## Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use staleguard_core::{reconcile, ActivityIndex, Candidate, Cutoff, DeviceRecord};
//!
//! let cutoff = Cutoff::at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
//! let devices = vec![DeviceRecord::new(
//!     "dev-1",
//!     Some("pc01".to_string()),
//!     Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
//! )];
//! let index = ActivityIndex::build(devices, cutoff);
//!
//! let candidate = Candidate {
//!     domain_partition: "corp.example.com".to_string(),
//!     computer_name: "PC01".to_string(),
//!     account_name: "PC01$".to_string(),
//!     last_changed: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
//!     distinguished_name: "CN=PC01,OU=Workstations,DC=corp,DC=example,DC=com".to_string(),
//! };
//!
//! let result = reconcile(&[candidate], &index, cutoff);
//! assert!(result.actionable().is_empty());
//! ```

pub mod collector;
pub mod config;
pub mod cutoff;
pub mod error;
pub mod index;
pub mod ordering;
pub mod pipeline;
pub mod reconcile;
pub mod traits;
pub mod types;

// Re-exports
pub use collector::{collect_candidates, Collection, ExclusionRule, PartitionFailure};
pub use config::ReconcileSettings;
pub use cutoff::Cutoff;
pub use error::{ReconcileError, ReconcileResult, SourceError, SourceResult};
pub use index::ActivityIndex;
pub use ordering::{order_actionable, order_enriched};
pub use pipeline::{run_reconciliation, RunOutcome, RunReport};
pub use reconcile::{enrich, reconcile, Reconciliation};
pub use traits::{DeviceSource, DirectoryAttribute, DirectoryQuery, DirectorySource};
pub use types::{
    normalize_name, ActivityStatus, Candidate, DeviceRecord, DirectoryRow, EnrichedRecord,
    RowRejection,
};

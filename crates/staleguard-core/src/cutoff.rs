//! The single time boundary shared by staleness and activity checks.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Cutoff instant for one run.
///
/// Computed once as `now - stale_cutoff_days` and then only read. Directory
/// records changed at or before the cutoff are stale; cloud devices that
/// signed in at or after it are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cutoff(DateTime<Utc>);

impl Cutoff {
    /// Cutoff `days` before `now`. Saturates at the earliest representable instant.
    #[must_use]
    pub fn days_before(now: DateTime<Utc>, days: u32) -> Self {
        let instant = now
            .checked_sub_signed(Duration::days(i64::from(days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self(instant)
    }

    /// Cutoff at an explicit instant.
    #[must_use]
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }

    /// The boundary instant.
    #[must_use]
    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }

    /// True when a directory record last changed at `last_changed` is stale.
    #[must_use]
    pub fn is_stale(&self, last_changed: DateTime<Utc>) -> bool {
        last_changed <= self.0
    }

    /// True when a sign-in timestamp counts as activity. Absent never does.
    #[must_use]
    pub fn is_active(&self, last_sign_in: Option<DateTime<Utc>>) -> bool {
        matches!(last_sign_in, Some(ts) if ts >= self.0)
    }
}

impl std::fmt::Display for Cutoff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

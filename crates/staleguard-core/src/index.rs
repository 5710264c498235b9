//! Name-keyed index of recently active cloud devices.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::debug;

use crate::cutoff::Cutoff;
use crate::types::{normalize_name, DeviceRecord};

/// Most recently active device per normalized display name.
///
/// Only devices with a name and a sign-in at or after the cutoff are
/// indexed. Two devices sharing a display name collide; the later sign-in
/// wins and a tie keeps the first one seen. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityIndex {
    entries: HashMap<String, DeviceRecord>,
}

impl ActivityIndex {
    /// Fold `devices` into an index for `cutoff`.
    pub fn build<I>(devices: I, cutoff: Cutoff) -> Self
    where
        I: IntoIterator<Item = DeviceRecord>,
    {
        let mut considered = 0usize;
        let entries = devices
            .into_iter()
            .inspect(|_| considered += 1)
            .filter(|device| cutoff.is_active(device.last_sign_in))
            .filter_map(|device| device.normalized_name().map(|key| (key, device)))
            .fold(HashMap::new(), keep_most_recent);

        debug!(
            considered,
            indexed = entries.len(),
            "Activity index built"
        );

        Self { entries }
    }

    /// Look up by an already-normalized key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&DeviceRecord> {
        self.entries.get(key)
    }

    /// Look up by a raw computer name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&DeviceRecord> {
        self.entries.get(&normalize_name(name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fold step: insert `device`, replacing the incumbent only when strictly more recent.
fn keep_most_recent(
    mut acc: HashMap<String, DeviceRecord>,
    (key, device): (String, DeviceRecord),
) -> HashMap<String, DeviceRecord> {
    match acc.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(device);
        }
        Entry::Occupied(mut slot) => {
            if device.recency() > slot.get().recency() {
                slot.insert(device);
            }
        }
    }
    acc
}

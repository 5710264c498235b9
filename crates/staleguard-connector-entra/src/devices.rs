//! Device listing from Entra ID.

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use staleguard_core::DeviceRecord;

use crate::{EntraConnector, EntraError, EntraResult};

/// Device fields to select from Graph API.
pub const DEVICE_SELECT_FIELDS: &str = "id,displayName,approximateLastSignInDateTime";

/// Parses a device from the Graph API JSON response.
///
/// A missing `id` is an error. A missing or malformed
/// `approximateLastSignInDateTime` maps to `None`.
pub fn parse_device(value: &serde_json::Value) -> EntraResult<DeviceRecord> {
    let id = value
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| EntraError::Mapping("Missing device id".into()))?;

    let display_name = value
        .get("displayName")
        .and_then(|v| v.as_str())
        .map(String::from);

    let last_sign_in = value
        .get("approximateLastSignInDateTime")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(DeviceRecord::new(id, display_name, last_sign_in))
}

impl EntraConnector {
    /// Builds the device listing URL.
    fn build_device_query_url(&self) -> String {
        format!(
            "{}/devices?$select={}&$top={}",
            self.graph_client().base_url(),
            DEVICE_SELECT_FIELDS,
            self.config().page_size
        )
    }

    /// Lists every device in the tenant, following pagination to the end.
    #[instrument(skip(self))]
    pub async fn list_all_devices(&self) -> EntraResult<Vec<DeviceRecord>> {
        info!("Listing Entra devices");

        let url = self.build_device_query_url();
        let mut devices = Vec::new();
        let mut skipped = 0usize;

        self.graph_client()
            .get_paginated(&url, |page: Vec<serde_json::Value>| {
                for value in page {
                    match parse_device(&value) {
                        Ok(device) => devices.push(device),
                        Err(e) => {
                            skipped += 1;
                            warn!("Failed to parse device: {}", e);
                        }
                    }
                }
                Ok(())
            })
            .await?;

        info!(devices = devices.len(), skipped, "Device listing completed");
        Ok(devices)
    }
}

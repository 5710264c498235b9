//! Filter construction and entry mapping for stale computer queries.

use chrono::{DateTime, NaiveDateTime, Utc};
use ldap3::SearchEntry;

use staleguard_core::{DirectoryAttribute, DirectoryRow};

/// Active Directory attribute backing each logical attribute.
#[must_use]
pub fn ldap_attribute(attribute: DirectoryAttribute) -> &'static str {
    match attribute {
        DirectoryAttribute::LastModified => "whenChanged",
        DirectoryAttribute::DistinguishedPath => "distinguishedName",
        DirectoryAttribute::AccountName => "sAMAccountName",
        DirectoryAttribute::Name => "name",
    }
}

/// Format an instant as LDAP generalized time (`YYYYMMDDHHMMSS.0Z`).
#[must_use]
pub fn format_generalized_time(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%d%H%M%S.0Z").to_string()
}

/// Parse LDAP generalized time in UTC.
///
/// Accepts `YYYYMMDDHHMMSS[.f*]Z`. Anything else, including local-time
/// offsets, yields `None`.
#[must_use]
pub fn parse_generalized_time(value: &str) -> Option<DateTime<Utc>> {
    let body = value.trim().strip_suffix('Z')?;
    let (main, fraction) = match body.split_once(['.', ',']) {
        Some((main, fraction)) => (main, Some(fraction)),
        None => (body, None),
    };

    if main.len() != 14 || !main.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Some(f) = fraction {
        if f.is_empty() || !f.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }

    NaiveDateTime::parse_from_str(main, "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Filter for computer objects changed at or before `cutoff`.
#[must_use]
pub fn stale_computer_filter(cutoff: DateTime<Utc>) -> String {
    format!(
        "(&(objectCategory=computer)(whenChanged<={}))",
        format_generalized_time(cutoff)
    )
}

/// Derive the naming context of a DNS domain.
///
/// `corp.example.com` becomes `DC=corp,DC=example,DC=com`.
#[must_use]
pub fn domain_to_base_dn(domain: &str) -> String {
    domain
        .trim()
        .trim_end_matches('.')
        .split('.')
        .filter(|label| !label.is_empty())
        .map(|label| format!("DC={}", label))
        .collect::<Vec<_>>()
        .join(",")
}

/// Case-insensitive lookup of a single-valued attribute.
fn first_value<'a>(entry: &'a SearchEntry, name: &str) -> Option<&'a str> {
    entry
        .attrs
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, values)| values.first())
        .map(String::as_str)
}

/// Map a search entry to a directory row.
///
/// The entry DN is used when `distinguishedName` was not returned.
#[must_use]
pub fn entry_to_row(entry: &SearchEntry) -> DirectoryRow {
    let distinguished_name = first_value(entry, ldap_attribute(DirectoryAttribute::DistinguishedPath))
        .map(String::from)
        .or_else(|| (!entry.dn.is_empty()).then(|| entry.dn.clone()));

    DirectoryRow {
        name: first_value(entry, ldap_attribute(DirectoryAttribute::Name)).map(String::from),
        account_name: first_value(entry, ldap_attribute(DirectoryAttribute::AccountName))
            .map(String::from),
        last_modified: first_value(entry, ldap_attribute(DirectoryAttribute::LastModified))
            .and_then(parse_generalized_time),
        distinguished_name,
    }
}

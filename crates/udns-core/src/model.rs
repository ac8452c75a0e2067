//! Provider-native data model
//!
//! These types mirror what the remote service returns: zones, record sets
//! and the pagination metadata attached to every listing page.

use serde::{Deserialize, Serialize};

/// A DNS zone hosted by the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    /// Fully-qualified zone name with trailing dot (e.g. "example.com.")
    pub name: String,
    /// Owning account
    pub account_name: String,
    /// Number of resource records in the zone
    pub record_count: u64,
    /// Service-reported status (e.g. "ACTIVE")
    pub status: String,
}

impl Zone {
    pub fn new(name: impl Into<String>, account_name: impl Into<String>, record_count: u64) -> Self {
        Self {
            name: name.into(),
            account_name: account_name.into(),
            record_count,
            status: "ACTIVE".to_string(),
        }
    }
}

/// One resource record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSet {
    /// Owner name; empty denotes the zone apex
    pub owner_name: String,
    /// Record type. Listings may report it decorated, e.g. "A (1)"
    pub rr_type: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Record data values, in order
    pub rdata: Vec<String>,
}

impl RecordSet {
    /// Record type without the numeric decoration some listings append
    pub fn base_type(&self) -> &str {
        self.rr_type.split_whitespace().next().unwrap_or("")
    }
}

/// Selects zones: an empty zone name lists every zone of the account
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneKey {
    pub zone: String,
    pub account_name: String,
}

impl ZoneKey {
    /// Key listing every zone of an account
    pub fn account(account_name: impl Into<String>) -> Self {
        Self {
            zone: String::new(),
            account_name: account_name.into(),
        }
    }
}

/// Selects record sets inside a zone. Empty type/name act as wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RrSetKey {
    pub zone: String,
    pub rr_type: String,
    pub name: String,
}

impl RrSetKey {
    pub fn new(zone: impl Into<String>, rr_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            rr_type: rr_type.into(),
            name: name.into(),
        }
    }

    /// Key listing every record set of a zone
    pub fn whole_zone(zone: impl Into<String>) -> Self {
        Self::new(zone, "", "")
    }
}

impl std::fmt::Display for RrSetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} in {}", self.name, self.rr_type, self.zone)
    }
}

/// Pagination metadata returned with every listing page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultInfo {
    /// Items in this page
    pub returned_count: usize,
    /// Offset the page was fetched at
    pub offset: usize,
    /// Items across all pages
    pub total_count: usize,
}

/// A single listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub info: ResultInfo,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, info: ResultInfo) -> Self {
        Self { items, info }
    }
}

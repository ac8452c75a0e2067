//! Desired-state types supplied by the orchestrator
//!
//! [`Endpoint`] and [`Changes`] follow the JSON shape external-dns uses on its
//! plugin boundary, so a diff produced there deserializes directly.

use serde::{Deserialize, Serialize};

/// One desired DNS record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// DNS name, without trailing dot
    pub dns_name: String,
    /// Record type ("A", "CNAME", ...)
    pub record_type: String,
    /// Record data values
    #[serde(default)]
    pub targets: Vec<String>,
    /// TTL override; `None` means the provider default
    #[serde(rename = "recordTTL", default, skip_serializing_if = "Option::is_none")]
    pub record_ttl: Option<u32>,
}

impl Endpoint {
    /// Create an endpoint without a TTL override
    ///
    /// A trailing dot on `dns_name` is dropped.
    pub fn new<I, S>(dns_name: impl Into<String>, record_type: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dns_name: String = dns_name.into();
        Self {
            dns_name: dns_name.trim_end_matches('.').to_string(),
            record_type: record_type.into(),
            targets: targets.into_iter().map(Into::into).collect(),
            record_ttl: None,
        }
    }

    /// Set the TTL override
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.record_ttl = Some(ttl);
        self
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} [{}]", self.dns_name, self.record_type, self.targets.join(" "))
    }
}

/// Desired-state diff for one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changes {
    #[serde(rename = "Create", default)]
    pub create: Vec<Endpoint>,
    /// Previous state of updated records; informational only
    #[serde(rename = "UpdateOld", default)]
    pub update_old: Vec<Endpoint>,
    #[serde(rename = "UpdateNew", default)]
    pub update_new: Vec<Endpoint>,
    #[serde(rename = "Delete", default)]
    pub delete: Vec<Endpoint>,
}

impl Changes {
    /// True when there is nothing to create, update or delete
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update_new.is_empty() && self.delete.is_empty()
    }
}

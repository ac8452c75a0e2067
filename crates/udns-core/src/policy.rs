//! Per-record-type target cardinality
//!
//! Whether a record type may carry several targets is a provider decision.
//! [`TargetPolicy`] makes it explicit: every desired endpoint is checked
//! before a pass touches the network.

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPolicy {
    // record type (upper case) -> maximum number of targets
    limits: HashMap<String, usize>,
}

impl TargetPolicy {
    /// No limits beyond requiring at least one target
    pub fn permissive() -> Self {
        Self {
            limits: HashMap::new(),
        }
    }

    /// Limit `record_type` to at most `max` targets
    pub fn with_limit(mut self, record_type: &str, max: usize) -> Self {
        self.limits.insert(record_type.to_ascii_uppercase(), max);
        self
    }

    pub fn max_targets(&self, record_type: &str) -> Option<usize> {
        self.limits.get(&record_type.to_ascii_uppercase()).copied()
    }

    pub fn check(&self, endpoint: &Endpoint) -> Result<()> {
        if endpoint.targets.is_empty() {
            return Err(Error::invalid_input(format!(
                "{} {} has no targets",
                endpoint.dns_name, endpoint.record_type
            )));
        }
        if let Some(max) = self.max_targets(&endpoint.record_type)
            && endpoint.targets.len() > max
        {
            return Err(Error::invalid_input(format!(
                "{} {} has {} targets, at most {} allowed",
                endpoint.dns_name,
                endpoint.record_type,
                endpoint.targets.len(),
                max
            )));
        }
        Ok(())
    }
}

impl Default for TargetPolicy {
    /// A CNAME aliases exactly one name; every other type may be multi-valued
    fn default() -> Self {
        Self::permissive().with_limit("CNAME", 1)
    }
}

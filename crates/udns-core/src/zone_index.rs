//! Zone ownership by longest-suffix match
//!
//! Record sets carry no reference to their zone, so ownership is inferred from
//! name containment: a record belongs to the most specific zone whose name is
//! a label-aligned suffix of the record name.

use crate::model::Zone;
use std::collections::HashMap;

/// Lookup set of zone names, built fresh for every reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct ZoneIndex {
    // normalized name -> zone name as reported by the service
    zones: HashMap<String, String>,
}

impl ZoneIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_zones<'a>(zones: impl IntoIterator<Item = &'a Zone>) -> Self {
        let mut index = Self::new();
        for zone in zones {
            index.add(&zone.name);
        }
        index
    }

    pub fn add(&mut self, zone_name: &str) {
        let key = normalize(zone_name);
        if key.is_empty() {
            return;
        }
        self.zones.insert(key, zone_name.to_string());
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Find the zone owning `name`
    ///
    /// Trailing dots and letter case are ignored on both sides. A name equal
    /// to a zone name resolves to that zone (the apex). An empty name owns no
    /// zone. Returns the zone name as it was indexed.
    pub fn find_zone(&self, name: &str) -> Option<&str> {
        let name = normalize(name);
        if name.is_empty() {
            return None;
        }

        // Walk from the full name towards the root; the first hit is the longest.
        let mut candidate = name.as_str();
        loop {
            if let Some(zone) = self.zones.get(candidate) {
                return Some(zone.as_str());
            }
            match candidate.split_once('.') {
                Some((_, parent)) if !parent.is_empty() => candidate = parent,
                _ => return None,
            }
        }
    }
}

fn normalize(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

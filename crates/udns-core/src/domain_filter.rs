//! Domain allow-list
//!
//! A name passes the filter when it equals one of the configured domains or is
//! a subdomain of one. Comparison ignores case and leading/trailing dots. An
//! unconfigured filter lets everything through.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainFilter {
    filters: Vec<String>,
}

impl DomainFilter {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let filters = domains
            .into_iter()
            .map(|d| normalize(d.as_ref()))
            .filter(|d| !d.is_empty())
            .collect();
        Self { filters }
    }

    /// Parse a comma-separated list, as found in environment variables
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn is_configured(&self) -> bool {
        !self.filters.is_empty()
    }

    pub fn domains(&self) -> &[String] {
        &self.filters
    }

    pub fn matches(&self, name: &str) -> bool {
        if !self.is_configured() {
            return true;
        }
        let name = normalize(name);
        self.filters.iter().any(|filter| {
            name == *filter
                || name
                    .strip_suffix(filter.as_str())
                    .is_some_and(|rest| rest.ends_with('.'))
        })
    }
}

fn normalize(name: &str) -> String {
    name.trim().trim_matches('.').to_ascii_lowercase()
}

//! Configuration types for the UltraDNS provider
//!
//! Configuration is an explicit value: it is loaded once (usually from the
//! environment), validated eagerly, then handed to constructors.

use crate::domain_filter::DomainFilter;
use crate::pagination::{DEFAULT_PAGE_SIZE, PaginatedFetcher};
use crate::retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_INTERVAL, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the service username
pub const ENV_USERNAME: &str = "ULTRADNS_USERNAME";
/// Environment variable holding the service password
pub const ENV_PASSWORD: &str = "ULTRADNS_PASSWORD";
/// Environment variable holding the service base URL
pub const ENV_BASE_URL: &str = "ULTRADNS_BASEURL";
/// Environment variable holding the account name
pub const ENV_ACCOUNT_NAME: &str = "ULTRADNS_ACCOUNTNAME";
/// Optional comma-separated domain allow-list
pub const ENV_DOMAIN_FILTER: &str = "ULTRADNS_DOMAIN_FILTER";
/// Optional dry-run switch
pub const ENV_DRY_RUN: &str = "ULTRADNS_DRY_RUN";

/// Main provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct UltraDnsConfig {
    /// Service username
    pub username: String,

    /// Service password
    /// ⚠️ NEVER log this value
    pub password: String,

    /// Base URL of the REST API (e.g. "https://api.ultradns.com")
    pub base_url: String,

    /// Account whose zones are managed
    pub account_name: String,

    /// Zones outside these domains are ignored
    #[serde(default)]
    pub domain_filter: Vec<String>,

    /// Perform reads but skip mutations
    #[serde(default)]
    pub dry_run: bool,

    /// Retry settings for listing calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Items requested per listing page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for UltraDnsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UltraDnsConfig")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("account_name", &self.account_name)
            .field("domain_filter", &self.domain_filter)
            .field("dry_run", &self.dry_run)
            .field("retry", &self.retry)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl UltraDnsConfig {
    /// Create a configuration with default tuning
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        base_url: impl Into<String>,
        account_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            base_url: base_url.into(),
            account_name: account_name.into(),
            domain_filter: Vec::new(),
            dry_run: false,
            retry: RetryConfig::default(),
            page_size: default_page_size(),
        }
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, crate::Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// The four credential variables are required; an absent one is a
    /// configuration error naming it. Present-but-empty values are accepted.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, crate::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| crate::Error::config(format!("{key} is not set")))
        };

        let mut config = Self::new(
            required(ENV_USERNAME)?,
            required(ENV_PASSWORD)?,
            required(ENV_BASE_URL)?,
            required(ENV_ACCOUNT_NAME)?,
        );

        if let Some(filter) = lookup(ENV_DOMAIN_FILTER) {
            config.domain_filter = DomainFilter::parse(&filter).domains().to_vec();
        }

        if let Some(dry_run) = lookup(ENV_DRY_RUN) {
            config.dry_run = matches!(dry_run.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.base_url.is_empty()
            && !self.base_url.starts_with("https://")
            && !self.base_url.starts_with("http://")
        {
            return Err(crate::Error::config(format!(
                "{ENV_BASE_URL} must use HTTP or HTTPS scheme. Got: {}",
                self.base_url
            )));
        }

        if self.page_size == 0 {
            return Err(crate::Error::config("Page size must be > 0"));
        }

        self.retry.validate()?;

        Ok(())
    }

    /// The domain allow-list
    pub fn domain_filter(&self) -> DomainFilter {
        DomainFilter::new(&self.domain_filter)
    }

    /// The paginated fetcher described by this configuration
    pub fn fetcher(&self) -> PaginatedFetcher {
        PaginatedFetcher::new(self.retry.policy(), self.page_size)
    }
}

/// Retry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per call, first try included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Delay between attempts (in seconds)
    #[serde(default = "default_retry_interval_secs")]
    pub interval_secs: u64,
}

impl RetryConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_attempts == 0 {
            return Err(crate::Error::config("Retry attempts must be > 0"));
        }
        Ok(())
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.interval_secs))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval_secs: default_retry_interval_secs(),
        }
    }
}

fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

fn default_retry_interval_secs() -> u64 {
    DEFAULT_RETRY_INTERVAL.as_secs()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

//! Core traits
//!
//! - [`DnsClient`]: single-call access to the remote DNS management service
//! - [`Provider`]: the list-records / apply-changes boundary an orchestrator drives

pub mod dns_client;
pub mod provider;

pub use dns_client::DnsClient;
pub use provider::Provider;

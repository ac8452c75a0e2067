// # udns-core
//
// Synchronization core of the UltraDNS provider.
//
// ## Architecture Overview
//
// - **DnsClient**: Trait for single-call access to the remote DNS management service
// - **RetryPolicy**: Fixed-interval retry of transient (5xx) failures
// - **PaginatedFetcher**: Offset/limit page loop, each page wrapped by the retry policy
// - **ZoneIndex**: Longest-suffix routing of record names to zones
// - **ChangeReconciler**: Fetches the zone inventory, routes a desired-state diff
//   and applies it zone by zone
// - **Provider**: The list-records / apply-changes boundary an orchestrator drives
//
// ## Design Principles
//
// 1. **Injected transport**: The core never depends on a concrete HTTP client
// 2. **No cross-pass state**: Every pass fetches its own inventory
// 3. **Explicit configuration**: Validated once, before any reconciliation
// 4. **Fail closed on mutation**: UPDATE/DELETE only after an existence check

pub mod config;
pub mod context;
pub mod domain_filter;
pub mod endpoint;
pub mod error;
pub mod model;
pub mod pagination;
pub mod policy;
pub mod reconciler;
pub mod retry;
pub mod traits;
pub mod zone_index;

// Re-export core types for convenience
pub use config::{RetryConfig, UltraDnsConfig};
pub use context::Context;
pub use domain_filter::DomainFilter;
pub use endpoint::{Changes, Endpoint};
pub use error::{Error, Result};
pub use model::{Page, RecordSet, ResultInfo, RrSetKey, Zone, ZoneKey};
pub use pagination::PaginatedFetcher;
pub use policy::TargetPolicy;
pub use reconciler::{Change, ChangeAction, ChangeReconciler, ReconcileReport, ReconcileState};
pub use retry::RetryPolicy;
pub use traits::{DnsClient, Provider};
pub use zone_index::ZoneIndex;

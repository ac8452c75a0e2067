// # DNS Management Client Trait
//
// The capability the reconciler needs from the remote DNS management service:
// paginated listings plus single-record-set CRUD.
//
// ## Implementations
//
// - UltraDNS REST API: `udns-client-http` crate
// - In-memory doubles in `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use udns_core::{DnsClient, ZoneKey};
//
// async fn first_page(client: &dyn DnsClient) -> udns_core::Result<()> {
//     let page = client.list_zones(&ZoneKey::account("acme"), 0, 1000).await?;
//     println!("{} of {} zones", page.info.returned_count, page.info.total_count);
//     Ok(())
// }
// ```

use crate::error::Result;
use crate::model::{Page, RecordSet, RrSetKey, Zone, ZoneKey};
use async_trait::async_trait;

/// Trait for DNS management client implementations
///
/// Each method performs exactly one network call. Implementations must not
/// retry: the reconciler wraps listing calls in its own
/// [`RetryPolicy`](crate::retry::RetryPolicy) and relies on
/// [`Error::status`](crate::Error::status) to tell transient failures apart.
///
/// # Errors
///
/// - Service answered with a failure status → `Error::Remote { status: Some(..) }`
/// - No response at all → `Error::Transport`
#[async_trait]
pub trait DnsClient: Send + Sync {
    /// List one page of zones
    ///
    /// An empty `key.zone` lists every zone of `key.account_name`.
    async fn list_zones(&self, key: &ZoneKey, offset: usize, limit: usize) -> Result<Page<Zone>>;

    /// List one page of record sets
    ///
    /// Empty `key.rr_type` / `key.name` match any type / owner.
    async fn list_rrsets(
        &self,
        key: &RrSetKey,
        offset: usize,
        limit: usize,
    ) -> Result<Page<RecordSet>>;

    /// Select the record sets matching `key`
    ///
    /// A missing record set is reported either as `Ok(vec![])` or as a
    /// `Remote` error with status 404.
    async fn select_rrset(&self, key: &RrSetKey) -> Result<Vec<RecordSet>>;

    /// Create the record set at `key`
    async fn create_rrset(&self, key: &RrSetKey, rrset: &RecordSet) -> Result<()>;

    /// Replace the record set at `key`
    async fn update_rrset(&self, key: &RrSetKey, rrset: &RecordSet) -> Result<()>;

    /// Delete the record set at `key`
    async fn delete_rrset(&self, key: &RrSetKey) -> Result<()>;

    /// Client name (for logging)
    fn client_name(&self) -> &'static str;
}

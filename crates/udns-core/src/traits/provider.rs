// # Provider Trait
//
// The operations an external orchestrator (external-dns or similar) drives:
// list the current records and apply a desired-state diff. The core
// reconciler implements it; the orchestrator never sees `DnsClient`.

use crate::domain_filter::DomainFilter;
use crate::endpoint::{Changes, Endpoint};
use crate::error::Result;
use crate::model::Zone;
use crate::reconciler::ReconcileReport;
use crate::context::Context;
use async_trait::async_trait;

#[async_trait]
pub trait Provider: Send + Sync {
    /// The allow-list this provider was configured with
    fn domain_filter(&self) -> &DomainFilter;

    /// Zones of the account that pass the allow-list
    async fn zones(&self, ctx: &Context) -> Result<Vec<Zone>>;

    /// Current records of every allowed zone, as endpoints
    async fn records(&self, ctx: &Context) -> Result<Vec<Endpoint>>;

    /// Apply a desired-state diff
    async fn apply_changes(&self, ctx: &Context, changes: &Changes) -> Result<ReconcileReport>;
}

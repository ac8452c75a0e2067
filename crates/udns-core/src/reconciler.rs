//! Change reconciliation against the live zone inventory
//!
//! The ChangeReconciler is responsible for:
//! - Fetching the complete zone inventory (filtered by the domain allow-list)
//! - Routing every desired change to its owning zone
//! - Applying creates, updates and deletes zone by zone
//! - Confirming a record set exists before updating or deleting it
//!
//! ## Architecture
//!
//! ```text
//!   Changes (create / update / delete)
//!             │
//!             ▼
//! ┌──────────────────────┐     ┌───────────────────┐
//! │  ChangeReconciler    │────▶│ PaginatedFetcher  │──▶ DnsClient::list_zones
//! └──────────────────────┘     │  └ RetryPolicy    │
//!             │                └───────────────────┘
//!             ▼
//! ┌──────────────────────┐
//! │     ZoneIndex        │  longest-suffix routing
//! └──────────────────────┘
//!             │
//!             ▼
//!   DnsClient::{select, create, update, delete}_rrset
//! ```
//!
//! ## Pass Flow
//!
//! `Idle → FetchingInventory → Routing → Applying → Done`. A pass that fails
//! in any phase returns the error instead of a report; the phase it failed in
//! is logged. An empty diff goes straight to `Done` without a single network
//! call.

use crate::config::UltraDnsConfig;
use crate::context::Context;
use crate::domain_filter::DomainFilter;
use crate::endpoint::{Changes, Endpoint};
use crate::error::{Error, Result};
use crate::model::{RecordSet, RrSetKey, Zone, ZoneKey};
use crate::pagination::PaginatedFetcher;
use crate::policy::TargetPolicy;
use crate::traits::{DnsClient, Provider};
use crate::zone_index::ZoneIndex;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

/// TTL applied when an endpoint carries no override
pub const DEFAULT_TTL: u32 = 86400;

/// Record types surfaced by [`ChangeReconciler::records`]
pub const SUPPORTED_RECORD_TYPES: &[&str] = &["A", "AAAA", "CNAME", "MX", "NS", "PTR", "SRV", "TXT"];

/// Whether `record_type` is surfaced to the orchestrator
pub fn supported_record_type(record_type: &str) -> bool {
    SUPPORTED_RECORD_TYPES.contains(&record_type)
}

/// Kind of mutation a change performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Create => "CREATE",
            ChangeAction::Update => "UPDATE",
            ChangeAction::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider-native change: an action and the record set it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub action: ChangeAction,
    pub record: RecordSet,
}

impl Change {
    /// Build a change from a desired endpoint
    ///
    /// The owner name is the endpoint name made fully qualified. The TTL is
    /// the endpoint's override, or [`DEFAULT_TTL`].
    pub fn from_endpoint(action: ChangeAction, endpoint: &Endpoint) -> Self {
        let mut owner_name = endpoint.dns_name.trim_end_matches('.').to_string();
        owner_name.push('.');

        Self {
            action,
            record: RecordSet {
                owner_name,
                rr_type: endpoint.record_type.clone(),
                ttl: endpoint.record_ttl.unwrap_or(DEFAULT_TTL),
                rdata: endpoint.targets.clone(),
            },
        }
    }

    pub fn from_endpoints(action: ChangeAction, endpoints: &[Endpoint]) -> Vec<Self> {
        endpoints
            .iter()
            .map(|e| Self::from_endpoint(action, e))
            .collect()
    }
}

/// Changes that resolved to one zone, in submission order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneChanges {
    pub zone: String,
    pub changes: Vec<Change>,
}

/// Result of routing a batch of changes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutedChanges {
    /// Per-zone groups, in order of first appearance
    pub zones: Vec<ZoneChanges>,
    /// Changes no zone owns
    pub skipped: Vec<Change>,
}

/// Group `changes` by owning zone
///
/// Order within a zone is the input order. Changes without an owning zone
/// are set aside in `skipped`; they never fail the batch.
pub fn route_changes(index: &ZoneIndex, changes: Vec<Change>) -> RoutedChanges {
    let mut routed = RoutedChanges::default();

    for change in changes {
        let Some(zone) = index.find_zone(&change.record.owner_name) else {
            info!(
                record = %change.record.owner_name,
                "Skipping record because no hosted zone matching record DNS name was detected"
            );
            routed.skipped.push(change);
            continue;
        };

        match routed.zones.iter_mut().find(|group| group.zone == zone) {
            Some(group) => group.changes.push(change),
            None => routed.zones.push(ZoneChanges {
                zone: zone.to_string(),
                changes: vec![change],
            }),
        }
    }

    routed
}

/// Phase of a reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    Idle,
    FetchingInventory,
    Routing,
    Applying,
    Done,
}

/// Outcome of a successful reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Final state; always `Done` for a returned report
    pub state: ReconcileState,
    /// Zones in the (filtered) inventory
    pub zones_fetched: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Changes dropped because no zone owns them
    pub skipped: usize,
    /// Mutations were logged, not sent
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ReconcileReport {
    fn new(dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            state: ReconcileState::Idle,
            zones_fetched: 0,
            created: 0,
            updated: 0,
            deleted: 0,
            skipped: 0,
            dry_run,
            started_at: now,
            finished_at: now,
        }
    }

    /// Number of changes applied (or, in dry-run, that would have been)
    pub fn applied(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    fn transition(&mut self, next: ReconcileState) {
        debug!("Reconcile state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Core reconciler
///
/// Holds no state between passes: every call fetches its own inventory and
/// builds its own [`ZoneIndex`], so back-to-back passes are independent.
///
/// ## Threading
///
/// A pass awaits each network call in turn. No fan-out across zones or
/// pages.
pub struct ChangeReconciler {
    /// Remote service access
    client: Box<dyn DnsClient>,

    /// Account whose zones are listed
    account_name: String,

    /// Zones outside the allow-list are invisible
    domain_filter: DomainFilter,

    /// Page loop with per-page retry
    fetcher: PaginatedFetcher,

    /// Target cardinality rules for creates and updates
    target_policy: TargetPolicy,

    /// Reads happen, mutations are only logged
    dry_run: bool,
}

impl ChangeReconciler {
    /// Create a reconciler
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` fails validation.
    pub fn new(client: Box<dyn DnsClient>, config: &UltraDnsConfig) -> Result<Self> {
        config.validate()?;

        if config.dry_run {
            tracing::warn!("Reconciler running in DRY-RUN mode - no changes will be made");
        }

        Ok(Self {
            client,
            account_name: config.account_name.clone(),
            domain_filter: config.domain_filter(),
            fetcher: config.fetcher(),
            target_policy: TargetPolicy::default(),
            dry_run: config.dry_run,
        })
    }

    /// Replace the target cardinality policy
    pub fn with_target_policy(mut self, policy: TargetPolicy) -> Self {
        self.target_policy = policy;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Fetch every zone of the account that passes the allow-list
    pub async fn zones(&self, ctx: &Context) -> Result<Vec<Zone>> {
        let key = ZoneKey::account(&self.account_name);
        let zones = self
            .fetcher
            .fetch_all(ctx, |offset, limit| {
                self.client.list_zones(&key, offset, limit)
            })
            .await?;

        let total = zones.len();
        let zones: Vec<Zone> = zones
            .into_iter()
            .filter(|zone| {
                let allowed = self.domain_filter.matches(&zone.name);
                if !allowed {
                    info!(zone = %zone.name, "Zone excluded by domain filter");
                }
                allowed
            })
            .collect();

        debug!(total, kept = zones.len(), "Fetched zone inventory");
        Ok(zones)
    }

    /// Current records of every allowed zone, as endpoints
    ///
    /// Zones reporting zero records are not listed. Unsupported record types
    /// are left out; an empty owner name stands for the zone apex.
    pub async fn records(&self, ctx: &Context) -> Result<Vec<Endpoint>> {
        let zones = self.zones(ctx).await?;
        let mut endpoints = Vec::new();

        for zone in zones.iter().filter(|z| z.record_count != 0) {
            let key = RrSetKey::whole_zone(&zone.name);
            let rrsets = self
                .fetcher
                .fetch_all(ctx, |offset, limit| {
                    self.client.list_rrsets(&key, offset, limit)
                })
                .await?;

            for rrset in rrsets {
                let record_type = rrset.base_type();
                if !supported_record_type(record_type) {
                    debug!(record = %rrset.owner_name, record_type, "Skipping unsupported record type");
                    continue;
                }

                let name = if rrset.owner_name.is_empty() {
                    zone.name.as_str()
                } else {
                    rrset.owner_name.as_str()
                };

                endpoints.push(
                    Endpoint::new(name, record_type, rrset.rdata.iter().cloned()).with_ttl(rrset.ttl),
                );
            }
        }

        debug!(count = endpoints.len(), "Listed endpoints");
        Ok(endpoints)
    }

    /// Apply a desired-state diff
    ///
    /// Creates come first, then updates (`update_new`), then deletes. Every
    /// create and update is checked against the target policy before any
    /// network call.
    ///
    /// # Errors
    ///
    /// - Policy violation → `InvalidInput`, nothing sent
    /// - Zone inventory failure → aborts before any mutation
    /// - UPDATE/DELETE of a missing record set → `RecordNotFound`
    /// - Any mutation failure aborts the remaining changes; earlier ones stay
    pub async fn apply_changes(&self, ctx: &Context, changes: &Changes) -> Result<ReconcileReport> {
        for endpoint in changes.create.iter().chain(&changes.update_new) {
            self.target_policy.check(endpoint)?;
        }

        debug!(
            create = changes.create.len(),
            update = changes.update_new.len(),
            delete = changes.delete.len(),
            "Applying changes"
        );

        let mut combined =
            Vec::with_capacity(changes.create.len() + changes.update_new.len() + changes.delete.len());
        combined.extend(Change::from_endpoints(ChangeAction::Create, &changes.create));
        combined.extend(Change::from_endpoints(ChangeAction::Update, &changes.update_new));
        combined.extend(Change::from_endpoints(ChangeAction::Delete, &changes.delete));

        self.submit_changes(ctx, combined).await
    }

    /// Run one reconciliation pass over provider-native changes
    pub async fn submit_changes(&self, ctx: &Context, changes: Vec<Change>) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::new(self.dry_run);

        if changes.is_empty() {
            info!("All records are already up to date");
            report.transition(ReconcileState::Done);
            report.finished_at = Utc::now();
            return Ok(report);
        }

        match self.run_pass(ctx, changes, &mut report).await {
            Ok(()) => {
                report.transition(ReconcileState::Done);
                report.finished_at = Utc::now();
                info!(
                    created = report.created,
                    updated = report.updated,
                    deleted = report.deleted,
                    skipped = report.skipped,
                    "Reconciliation pass complete"
                );
                Ok(report)
            }
            Err(e) => {
                error!("Reconciliation failed during {:?}: {}", report.state, e);
                Err(e)
            }
        }
    }

    async fn run_pass(
        &self,
        ctx: &Context,
        changes: Vec<Change>,
        report: &mut ReconcileReport,
    ) -> Result<()> {
        report.transition(ReconcileState::FetchingInventory);
        let zones = self.zones(ctx).await?;
        report.zones_fetched = zones.len();

        report.transition(ReconcileState::Routing);
        let index = ZoneIndex::from_zones(&zones);
        let routed = route_changes(&index, changes);
        report.skipped = routed.skipped.len();

        report.transition(ReconcileState::Applying);
        for group in &routed.zones {
            for change in &group.changes {
                self.apply_change(ctx, &group.zone, change).await?;
                match change.action {
                    ChangeAction::Create => report.created += 1,
                    ChangeAction::Update => report.updated += 1,
                    ChangeAction::Delete => report.deleted += 1,
                }
            }
        }

        Ok(())
    }

    async fn apply_change(&self, ctx: &Context, zone: &str, change: &Change) -> Result<()> {
        ctx.check()?;
        let record = &change.record;
        info!(
            record = %record.owner_name,
            record_type = %record.rr_type,
            ttl = record.ttl,
            action = %change.action,
            zone,
            "Changing record."
        );

        let key = RrSetKey::new(zone, &record.rr_type, &record.owner_name);

        match change.action {
            ChangeAction::Create => {
                if self.skip_in_dry_run(change, &key) {
                    return Ok(());
                }
                self.client.create_rrset(&key, record).await
            }
            ChangeAction::Update => {
                self.ensure_exists(ctx, &key).await?;
                ctx.check()?;
                if self.skip_in_dry_run(change, &key) {
                    return Ok(());
                }
                self.client.update_rrset(&key, record).await
            }
            ChangeAction::Delete => {
                self.ensure_exists(ctx, &key).await?;
                ctx.check()?;
                if self.skip_in_dry_run(change, &key) {
                    return Ok(());
                }
                self.client.delete_rrset(&key).await
            }
        }
    }

    /// Confirm the record set at `key` exists
    async fn ensure_exists(&self, ctx: &Context, key: &RrSetKey) -> Result<()> {
        ctx.check()?;
        match self.client.select_rrset(key).await {
            Ok(found) if !found.is_empty() => Ok(()),
            Ok(_) => Err(Error::record_not_found(key.to_string())),
            Err(e) if e.status() == Some(404) => Err(Error::record_not_found(key.to_string())),
            Err(e) => Err(e),
        }
    }

    fn skip_in_dry_run(&self, change: &Change, key: &RrSetKey) -> bool {
        if self.dry_run {
            info!(
                "[DRY-RUN] Would {} {} via {}",
                change.action,
                key,
                self.client.client_name()
            );
        }
        self.dry_run
    }
}

#[async_trait]
impl Provider for ChangeReconciler {
    fn domain_filter(&self) -> &DomainFilter {
        &self.domain_filter
    }

    async fn zones(&self, ctx: &Context) -> Result<Vec<Zone>> {
        ChangeReconciler::zones(self, ctx).await
    }

    async fn records(&self, ctx: &Context) -> Result<Vec<Endpoint>> {
        ChangeReconciler::records(self, ctx).await
    }

    async fn apply_changes(&self, ctx: &Context, changes: &Changes) -> Result<ReconcileReport> {
        ChangeReconciler::apply_changes(self, ctx, changes).await
    }
}

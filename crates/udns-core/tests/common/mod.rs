//! Test doubles and common utilities for reconciliation contract tests
//!
//! [`MockDnsClient`] is an in-memory stand-in for the remote service. It
//! records every call in order and can be scripted to fail.

#![allow(dead_code)]

use udns_core::error::{Error, Result};
use udns_core::model::{Page, RecordSet, ResultInfo, RrSetKey, Zone, ZoneKey};
use udns_core::{ChangeReconciler, Context, DnsClient, UltraDnsConfig};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const ACCOUNT: &str = "teamrest";

/// One recorded client call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListZones { offset: usize, limit: usize },
    ListRrSets { zone: String, offset: usize, limit: usize },
    Select(RrSetKey),
    Create(RrSetKey, RecordSet),
    Update(RrSetKey, RecordSet),
    Delete(RrSetKey),
}

#[derive(Default)]
struct MockState {
    zones: Vec<Zone>,
    rrsets: HashMap<String, Vec<RecordSet>>,
    zone_failures: VecDeque<u16>,
    mutation_failures: HashMap<String, u16>,
    cancel_on_zone_listing: Option<Context>,
    calls: Vec<Call>,
}

/// An in-memory DnsClient that records calls
///
/// Clones share state, so a test keeps one clone for assertions and hands
/// another to the reconciler.
#[derive(Clone, Default)]
pub struct MockDnsClient {
    state: Arc<Mutex<MockState>>,
}

impl MockDnsClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a zone to the inventory
    pub fn with_zone(self, name: &str, record_count: u64) -> Self {
        self.state
            .lock()
            .unwrap()
            .zones
            .push(Zone::new(name, ACCOUNT, record_count));
        self
    }

    /// Seed an existing record set in `zone`
    pub fn with_rrset(self, zone: &str, owner_name: &str, rr_type: &str, rdata: &[&str]) -> Self {
        self.state
            .lock()
            .unwrap()
            .rrsets
            .entry(zone.to_string())
            .or_default()
            .push(RecordSet {
                owner_name: owner_name.to_string(),
                rr_type: rr_type.to_string(),
                ttl: 300,
                rdata: rdata.iter().map(|s| s.to_string()).collect(),
            });
        self
    }

    /// Fail the next zone listing calls with the given statuses, in order
    pub fn fail_zone_listing(self, statuses: &[u16]) -> Self {
        self.state
            .lock()
            .unwrap()
            .zone_failures
            .extend(statuses.iter().copied());
        self
    }

    /// Fail every mutation of `owner_name` with `status`
    pub fn fail_mutations_of(self, owner_name: &str, status: u16) -> Self {
        self.state
            .lock()
            .unwrap()
            .mutation_failures
            .insert(owner_name.to_string(), status);
        self
    }

    /// Cancel `ctx` once a zone listing has been served
    pub fn cancel_after_zone_listing(self, ctx: &Context) -> Self {
        self.state.lock().unwrap().cancel_on_zone_listing = Some(ctx.clone());
        self
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn zone_listing_count(&self) -> usize {
        self.count(|c| matches!(c, Call::ListZones { .. }))
    }

    pub fn select_count(&self) -> usize {
        self.count(|c| matches!(c, Call::Select(_)))
    }

    pub fn create_count(&self) -> usize {
        self.count(|c| matches!(c, Call::Create(..)))
    }

    pub fn update_count(&self) -> usize {
        self.count(|c| matches!(c, Call::Update(..)))
    }

    pub fn delete_count(&self) -> usize {
        self.count(|c| matches!(c, Call::Delete(_)))
    }

    /// Only the mutation calls, in order
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Create(..) | Call::Update(..) | Call::Delete(_)))
            .collect()
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn check_mutation(&self, owner_name: &str) -> Result<()> {
        match self.state.lock().unwrap().mutation_failures.get(owner_name) {
            Some(status) => Err(Error::remote(*status, format!("mutation of {owner_name} rejected"))),
            None => Ok(()),
        }
    }
}

fn page_of<T: Clone>(all: &[T], offset: usize, limit: usize) -> Page<T> {
    let start = offset.min(all.len());
    let end = (offset + limit).min(all.len());
    let items = all[start..end].to_vec();
    Page::new(
        items.clone(),
        ResultInfo {
            returned_count: items.len(),
            offset,
            total_count: all.len(),
        },
    )
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim_end_matches('.').eq_ignore_ascii_case(b.trim_end_matches('.'))
}

#[async_trait::async_trait]
impl DnsClient for MockDnsClient {
    async fn list_zones(&self, _key: &ZoneKey, offset: usize, limit: usize) -> Result<Page<Zone>> {
        self.record(Call::ListZones { offset, limit });
        let mut state = self.state.lock().unwrap();
        if let Some(status) = state.zone_failures.pop_front() {
            return Err(Error::remote(status, "zone listing failed"));
        }
        let page = page_of(&state.zones, offset, limit);
        if let Some(ctx) = &state.cancel_on_zone_listing {
            ctx.cancel();
        }
        Ok(page)
    }

    async fn list_rrsets(
        &self,
        key: &RrSetKey,
        offset: usize,
        limit: usize,
    ) -> Result<Page<RecordSet>> {
        self.record(Call::ListRrSets {
            zone: key.zone.clone(),
            offset,
            limit,
        });
        let state = self.state.lock().unwrap();
        let rrsets = state.rrsets.get(&key.zone).cloned().unwrap_or_default();
        Ok(page_of(&rrsets, offset, limit))
    }

    async fn select_rrset(&self, key: &RrSetKey) -> Result<Vec<RecordSet>> {
        self.record(Call::Select(key.clone()));
        let state = self.state.lock().unwrap();
        let found: Vec<RecordSet> = state
            .rrsets
            .get(&key.zone)
            .into_iter()
            .flatten()
            .filter(|r| same_name(&r.owner_name, &key.name) && r.base_type() == key.rr_type)
            .cloned()
            .collect();
        if found.is_empty() {
            return Err(Error::remote(404, format!("no rrset for {key}")));
        }
        Ok(found)
    }

    async fn create_rrset(&self, key: &RrSetKey, rrset: &RecordSet) -> Result<()> {
        self.record(Call::Create(key.clone(), rrset.clone()));
        self.check_mutation(&rrset.owner_name)?;
        self.state
            .lock()
            .unwrap()
            .rrsets
            .entry(key.zone.clone())
            .or_default()
            .push(rrset.clone());
        Ok(())
    }

    async fn update_rrset(&self, key: &RrSetKey, rrset: &RecordSet) -> Result<()> {
        self.record(Call::Update(key.clone(), rrset.clone()));
        self.check_mutation(&rrset.owner_name)?;
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.rrsets.get_mut(&key.zone).and_then(|rrsets| {
            rrsets
                .iter_mut()
                .find(|r| same_name(&r.owner_name, &key.name) && r.base_type() == key.rr_type)
        }) {
            *existing = rrset.clone();
        }
        Ok(())
    }

    async fn delete_rrset(&self, key: &RrSetKey) -> Result<()> {
        self.record(Call::Delete(key.clone()));
        self.check_mutation(&key.name)?;
        if let Some(rrsets) = self.state.lock().unwrap().rrsets.get_mut(&key.zone) {
            rrsets.retain(|r| !(same_name(&r.owner_name, &key.name) && r.base_type() == key.rr_type));
        }
        Ok(())
    }

    fn client_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a configuration suited for tests (no retry delay)
pub fn test_config() -> UltraDnsConfig {
    let mut config = UltraDnsConfig::new("user", "password", "https://api.example.net", ACCOUNT);
    config.retry.interval_secs = 0;
    config
}

/// Helper to build a reconciler over a clone of `client`
pub fn reconciler(client: &MockDnsClient) -> ChangeReconciler {
    reconciler_with(client, test_config())
}

pub fn reconciler_with(client: &MockDnsClient, config: UltraDnsConfig) -> ChangeReconciler {
    ChangeReconciler::new(Box::new(client.clone()), &config).expect("reconciler construction succeeds")
}

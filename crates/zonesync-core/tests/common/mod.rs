//! Test doubles shared by the engine contract tests
//!
//! The scripted IP source replays a per-family sequence of detection
//! results; the mock provider keeps zones and records in memory and counts
//! every call so tests can assert on short-circuit behavior.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use zonesync_core::config::{Credential, DdnsConfig, IpFamily, RecordType, TargetSources};
use zonesync_core::error::{Error, Result};
use zonesync_core::resolver::UpdateTarget;
use zonesync_core::traits::{DnsProvider, IpSource, RemoteRecord};

/// IP source replaying a scripted sequence of results per family
#[derive(Clone, Default)]
pub struct ScriptedIpSource {
    script: Arc<Mutex<HashMap<IpFamily, VecDeque<std::result::Result<IpAddr, String>>>>>,
    calls: Arc<Mutex<HashMap<IpFamily, usize>>>,
}

impl ScriptedIpSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful detection for the family
    pub fn push_ip(&self, family: IpFamily, ip: &str) {
        self.script
            .lock()
            .unwrap()
            .entry(family)
            .or_default()
            .push_back(Ok(ip.parse().unwrap()));
    }

    /// Queue a detection failure for the family
    pub fn push_failure(&self, family: IpFamily, message: &str) {
        self.script
            .lock()
            .unwrap()
            .entry(family)
            .or_default()
            .push_back(Err(message.to_string()));
    }

    /// Number of detect() calls seen for the family
    pub fn detect_calls(&self, family: IpFamily) -> usize {
        *self.calls.lock().unwrap().get(&family).unwrap_or(&0)
    }
}

#[async_trait]
impl IpSource for ScriptedIpSource {
    async fn detect(&self, family: IpFamily) -> Result<IpAddr> {
        *self.calls.lock().unwrap().entry(family).or_insert(0) += 1;

        let next = self
            .script
            .lock()
            .unwrap()
            .get_mut(&family)
            .and_then(|queue| queue.pop_front());

        match next {
            Some(Ok(ip)) => Ok(ip),
            Some(Err(message)) => Err(Error::detection(message)),
            None => Err(Error::detection("script exhausted")),
        }
    }
}

type RecordKey = (String, String, RecordType);

/// In-memory DNS provider with call accounting
#[derive(Clone, Default)]
pub struct MockDnsProvider {
    zones: Arc<Mutex<HashMap<String, String>>>,
    records: Arc<Mutex<HashMap<RecordKey, RemoteRecord>>>,
    resolve_calls: Arc<Mutex<usize>>,
    find_calls: Arc<Mutex<usize>>,
    upserts: Arc<Mutex<Vec<UpsertCall>>>,
    next_id: Arc<Mutex<u32>>,
}

/// One recorded upsert invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertCall {
    pub zone_id: String,
    pub existing_id: Option<String>,
    pub record_name: String,
    pub content: String,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_zone(&self, zone_name: &str, zone_id: &str) {
        self.zones
            .lock()
            .unwrap()
            .insert(zone_name.to_string(), zone_id.to_string());
    }

    pub fn add_record(
        &self,
        zone_id: &str,
        record_name: &str,
        record_type: RecordType,
        record_id: &str,
        content: &str,
    ) {
        self.records.lock().unwrap().insert(
            (zone_id.to_string(), record_name.to_string(), record_type),
            RemoteRecord {
                id: record_id.to_string(),
                content: content.to_string(),
                ttl: None,
                proxied: None,
            },
        );
    }

    /// Total provider calls of any kind
    pub fn total_calls(&self) -> usize {
        *self.resolve_calls.lock().unwrap()
            + *self.find_calls.lock().unwrap()
            + self.upserts.lock().unwrap().len()
    }

    pub fn upserts(&self) -> Vec<UpsertCall> {
        self.upserts.lock().unwrap().clone()
    }

    pub fn find_calls(&self) -> usize {
        *self.find_calls.lock().unwrap()
    }

    /// Current content of a stored record
    pub fn record_content(
        &self,
        zone_id: &str,
        record_name: &str,
        record_type: RecordType,
    ) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .get(&(zone_id.to_string(), record_name.to_string(), record_type))
            .map(|record| record.content.clone())
    }
}

#[async_trait]
impl DnsProvider for MockDnsProvider {
    async fn resolve_zone(&self, zone_name: &str) -> Result<String> {
        *self.resolve_calls.lock().unwrap() += 1;
        self.zones
            .lock()
            .unwrap()
            .get(zone_name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("zone not found: {zone_name}")))
    }

    async fn find_record(
        &self,
        zone_id: &str,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<Option<RemoteRecord>> {
        *self.find_calls.lock().unwrap() += 1;
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(zone_id.to_string(), record_name.to_string(), record_type))
            .cloned())
    }

    async fn upsert_record(
        &self,
        zone_id: &str,
        existing_id: Option<&str>,
        target: &UpdateTarget,
        content: &str,
    ) -> Result<String> {
        self.upserts.lock().unwrap().push(UpsertCall {
            zone_id: zone_id.to_string(),
            existing_id: existing_id.map(String::from),
            record_name: target.record_name.clone(),
            content: content.to_string(),
        });

        let key = (
            zone_id.to_string(),
            target.record_name.clone(),
            target.record_type,
        );
        let record_id = match existing_id {
            Some(id) => id.to_string(),
            None => {
                let mut next = self.next_id.lock().unwrap();
                *next += 1;
                format!("rec-new-{}", *next)
            }
        };

        self.records.lock().unwrap().insert(
            key,
            RemoteRecord {
                id: record_id.clone(),
                content: content.to_string(),
                ttl: Some(target.ttl),
                proxied: Some(target.proxied),
            },
        );
        Ok(record_id)
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Config for a single zone with an explicit record list
pub fn config_for(zone: &str, records: &[&str], interval: Option<u64>) -> DdnsConfig {
    DdnsConfig {
        sources: TargetSources {
            legacy_zone: Some(zone.to_string()),
            env_records: records.iter().map(|r| r.to_string()).collect(),
            ..TargetSources::default()
        },
        record_type: RecordType::A,
        ttl: 300,
        proxied: false,
        credential: Credential::Token {
            token: "test-token".to_string(),
        },
        interval,
        dry_run: false,
        once: false,
    }
}

/// A bare target for engines assembled without config resolution
pub fn target(zone: &str, record: &str, record_type: RecordType) -> UpdateTarget {
    UpdateTarget {
        zone_name: zone.to_string(),
        record_name: record.to_string(),
        record_type,
        ttl: 300,
        proxied: false,
    }
}

//! Target resolver
//!
//! Derives the ordered list of [`UpdateTarget`]s from the layered CLI and
//! environment inputs in [`TargetSources`]. Resolution is pure and
//! deterministic: the same config always yields the same ordered list.
//!
//! Precedence (first non-empty source wins, no merging):
//! - zones: CLI list, env list, legacy single zone
//! - records: CLI list, CLI single, env list, env single, each zone's own name
//!
//! A record list of length 1 is replicated across all zones; a single zone is
//! replicated across a longer record list (multi-record within one zone).
//! Any other length mismatch is a configuration error, raised before any
//! network activity.

use crate::config::{DdnsConfig, RecordType, TargetSources};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// One (zone, record, type) tuple kept in sync with the public IP
///
/// Produced once at startup, consumed read-only by every iteration.
/// Duplicates across the list are legal but wasteful.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTarget {
    /// Zone the record lives in
    pub zone_name: String,
    /// Fully qualified record name
    pub record_name: String,
    /// Record type (A or AAAA)
    pub record_type: RecordType,
    /// TTL applied on create/update
    pub ttl: u32,
    /// Whether the record goes through the provider's proxy
    pub proxied: bool,
}

/// Record-name source, in precedence order
enum RecordNames {
    /// An explicit list that must line up with the zone list
    List(Vec<String>),
    /// A single name applied to every zone
    PerZone(String),
    /// Each zone defaults to its own name
    Default,
}

fn record_names(sources: &TargetSources) -> RecordNames {
    if !sources.cli_records.is_empty() {
        RecordNames::List(sources.cli_records.clone())
    } else if let Some(name) = non_empty(&sources.cli_record) {
        RecordNames::PerZone(name)
    } else if !sources.env_records.is_empty() {
        RecordNames::List(sources.env_records.clone())
    } else if let Some(name) = non_empty(&sources.env_record) {
        RecordNames::PerZone(name)
    } else {
        RecordNames::Default
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|s| !s.is_empty()).map(String::from)
}

fn resolve_zones(sources: &TargetSources) -> Result<Vec<String>> {
    if !sources.cli_zones.is_empty() {
        return Ok(sources.cli_zones.clone());
    }
    if !sources.env_zones.is_empty() {
        return Ok(sources.env_zones.clone());
    }
    if let Some(zone) = non_empty(&sources.legacy_zone) {
        return Ok(vec![zone]);
    }
    Err(Error::config(
        "no zone configured: set --zones, CLOUDFLARE_ZONE_NAMES or CLOUDFLARE_ZONE_NAME",
    ))
}

/// Resolve the final ordered target list from a configuration
///
/// Fails with [`Error::Config`] on empty zone sources or a record/zone list
/// length mismatch. Never performs any I/O.
pub fn resolve_targets(config: &DdnsConfig) -> Result<Vec<UpdateTarget>> {
    let zones = resolve_zones(&config.sources)?;

    let (zones, records) = match record_names(&config.sources) {
        RecordNames::Default => (zones.clone(), zones),
        RecordNames::PerZone(name) => {
            let records = vec![name; zones.len()];
            (zones, records)
        }
        RecordNames::List(records) => {
            if records.len() == zones.len() {
                (zones, records)
            } else if records.len() == 1 {
                // Replicate the single record name across all zones
                (zones.clone(), vec![records[0].clone(); zones.len()])
            } else if zones.len() == 1 {
                // Multi-record within a single zone
                (vec![zones[0].clone(); records.len()], records)
            } else {
                return Err(Error::config(format!(
                    "record list length ({}) must match zone list length ({})",
                    records.len(),
                    zones.len()
                )));
            }
        }
    };

    Ok(zones
        .into_iter()
        .zip(records)
        .map(|(zone_name, record_name)| UpdateTarget {
            zone_name,
            record_name,
            record_type: config.record_type,
            ttl: config.ttl,
            proxied: config.proxied,
        })
        .collect())
}

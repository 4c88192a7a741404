//! Per-family change cache
//!
//! Remembers the last public IP seen for each address family so unchanged
//! iterations skip every provider call. Owned exclusively by the engine,
//! in-memory only; a restart always begins with an initial check.

use crate::config::IpFamily;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::net::IpAddr;

/// Last observed public IP for one address family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    /// The address seen on the last completed live check
    pub ip: IpAddr,
    /// When that check completed
    pub checked_at: DateTime<Utc>,
}

/// Map from address family to the last-seen public IP
#[derive(Debug, Clone, Default)]
pub struct IpCache {
    entries: HashMap<IpFamily, CacheEntry>,
}

impl IpCache {
    /// Create an empty cache; every family starts with an initial check
    pub fn new() -> Self {
        Self::default()
    }

    /// Last-seen entry for a family, if any iteration has completed for it
    pub fn get(&self, family: IpFamily) -> Option<&CacheEntry> {
        self.entries.get(&family)
    }

    /// Record the detected IP after a fully observed family pass
    pub fn set(&mut self, family: IpFamily, ip: IpAddr) {
        self.entries.insert(
            family,
            CacheEntry {
                ip,
                checked_at: Utc::now(),
            },
        );
    }
}

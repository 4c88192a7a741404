// # IP Source Trait
//
// Determines the machine's current public IP for one address family.
// Implementations try their lookup endpoints in order and return the first
// syntactically valid address of the requested family; they do not retry a
// single endpoint and they do not cache. Retries happen at the loop level
// (the next iteration), caching is the engine's change cache.

use crate::config::IpFamily;
use crate::error::Result;
use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for public IP detection
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Detect the current public IP for the given family
    ///
    /// Fails with [`crate::Error::Detection`] when every candidate lookup
    /// endpoint fails or returns an address of the wrong family.
    async fn detect(&self, family: IpFamily) -> Result<IpAddr>;
}

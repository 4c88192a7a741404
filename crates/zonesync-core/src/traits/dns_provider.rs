// # DNS Provider Trait
//
// Thin request layer over a managed DNS provider's API. Implementations
// perform exactly the call they are asked to perform:
//
// - no retry or backoff (the engine decides what to repeat, via the next
//   iteration)
// - no caching (remote state can change out-of-band, so the engine
//   re-fetches it whenever a live check is required)
// - no update decisions (the needs-update comparison lives in the engine)
//
// Errors map onto the engine's failure policy: `Error::Auth` for credential
// rejection, `Error::NotFound` for zones invisible to the credential, and
// `Error::Provider` for any other non-2xx response.

use crate::config::RecordType;
use crate::error::Result;
use crate::resolver::UpdateTarget;
use async_trait::async_trait;

/// Remote state of a DNS record, fetched per target per live check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRecord {
    /// Provider-assigned record id
    pub id: String,
    /// Current record content (the IP as a string)
    pub content: String,
    /// Current TTL, when the provider exposes it
    pub ttl: Option<u32>,
    /// Current proxied flag, when the provider exposes it
    pub proxied: Option<bool>,
}

/// Trait for DNS provider implementations
///
/// All three operations are idempotent from the caller's perspective.
/// Implementations must be thread-safe and carry a bounded request timeout;
/// a timeout is a failure of that call, not of the process.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Resolve a zone name to the provider's zone identifier
    ///
    /// Fails with [`crate::Error::NotFound`] when no matching zone is
    /// visible to the credential.
    async fn resolve_zone(&self, zone_name: &str) -> Result<String>;

    /// Look up a record by name and type within a zone
    ///
    /// Returns `Ok(None)` when the record does not exist; that is a normal
    /// outcome (the engine will create it), not an error.
    async fn find_record(
        &self,
        zone_id: &str,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<Option<RemoteRecord>>;

    /// Create or patch a record and return its id
    ///
    /// With `existing_id = None` the record is created; otherwise the
    /// identified record's content, TTL and proxied flag are patched to the
    /// target's values. The client writes unconditionally; whether a write
    /// is needed was already decided by the engine.
    async fn upsert_record(
        &self,
        zone_id: &str,
        existing_id: Option<&str>,
        target: &UpdateTarget,
        content: &str,
    ) -> Result<String>;

    /// Provider name for logging
    fn provider_name(&self) -> &'static str;
}

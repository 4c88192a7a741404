// # Cloudflare DNS Provider
//
// `DnsProvider` implementation over the Cloudflare API v4.
//
// This is a thin request layer, as the engine requires:
//
// - one HTTP request per operation, bounded by a 30 second timeout
// - no retry or backoff (the engine's next iteration is the retry)
// - no caching (remote state is re-fetched whenever a live check runs)
// - no update decisions (the engine compares remote state with the target)
//
// ## Security
//
// The credential never appears in logs or error messages; the `Debug`
// implementation redacts it.
//
// ## API Reference
//
// - List zones: GET `/zones?name=...&status=active`
// - List DNS records: GET `/zones/:zone_id/dns_records?name=...&type=...`
// - Create DNS record: POST `/zones/:zone_id/dns_records`
// - Patch DNS record: PATCH `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use zonesync_core::config::{Credential, RecordType};
use zonesync_core::resolver::UpdateTarget;
use zonesync_core::traits::{DnsProvider, RemoteRecord};
use zonesync_core::{Error, Result};

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Cloudflare DNS provider
pub struct CloudflareProvider {
    credential: Credential,
    client: reqwest::Client,
    base_url: String,
}

// Custom Debug implementation that hides the credential
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("credential", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Response envelope shared by all Cloudflare API v4 endpoints
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DnsRecord {
    id: String,
    content: String,
    ttl: Option<u32>,
    #[serde(default)]
    proxied: Option<bool>,
}

fn api_error_message(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "unknown API error".to_string();
    }
    errors
        .iter()
        .map(|e| format!("{} (code {})", e.message, e.code))
        .collect::<Vec<_>>()
        .join("; ")
}

impl CloudflareProvider {
    /// Create a provider talking to the public Cloudflare API
    pub fn new(credential: Credential) -> Result<Self> {
        Self::with_base_url(credential, CLOUDFLARE_API_BASE)
    }

    /// Create a provider against a custom API base URL
    pub fn with_base_url(credential: Credential, base_url: impl Into<String>) -> Result<Self> {
        credential.validate()?;

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::provider("cloudflare", format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            credential,
            client,
            base_url: base_url.into(),
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credential {
            Credential::Token { token } => request.bearer_auth(token),
            Credential::GlobalKey { email, key } => request
                .header("X-Auth-Email", email)
                .header("X-Auth-Key", key),
        }
    }

    /// Send a request and unwrap the Cloudflare response envelope
    ///
    /// 401/403 map to [`Error::Auth`]; every other non-2xx status and every
    /// `success: false` body maps to [`Error::Provider`].
    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = self
            .authorize(request)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(Error::auth(format!(
                "Cloudflare rejected the credential (status {status})"
            )));
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error response".to_string());
            return Err(Error::provider(
                "cloudflare",
                format!("API call failed: {status} - {body}"),
            ));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("failed to parse response: {e}")))?;

        if !envelope.success {
            return Err(Error::provider(
                "cloudflare",
                api_error_message(&envelope.errors),
            ));
        }

        envelope
            .result
            .ok_or_else(|| Error::provider("cloudflare", "response envelope missing result"))
    }

    fn record_payload(target: &UpdateTarget, content: &str) -> serde_json::Value {
        serde_json::json!({
            "type": target.record_type.as_str(),
            "name": target.record_name,
            "content": content,
            "ttl": target.ttl,
            "proxied": target.proxied,
        })
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn resolve_zone(&self, zone_name: &str) -> Result<String> {
        tracing::debug!(zone = %zone_name, "resolving zone id");

        let url = format!("{}/zones?name={}&status=active", self.base_url, zone_name);
        let zones: Vec<Zone> = self.send(self.client.get(&url)).await?;

        zones
            .into_iter()
            .next()
            .map(|zone| zone.id)
            .ok_or_else(|| Error::not_found(format!("zone not found: {zone_name}")))
    }

    async fn find_record(
        &self,
        zone_id: &str,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<Option<RemoteRecord>> {
        tracing::debug!(record = %record_name, rtype = %record_type, "looking up DNS record");

        let url = format!(
            "{}/zones/{}/dns_records?name={}&type={}",
            self.base_url,
            zone_id,
            record_name,
            record_type.as_str()
        );
        let records: Vec<DnsRecord> = self.send(self.client.get(&url)).await?;

        Ok(records.into_iter().next().map(|record| RemoteRecord {
            id: record.id,
            content: record.content,
            ttl: record.ttl,
            proxied: record.proxied,
        }))
    }

    async fn upsert_record(
        &self,
        zone_id: &str,
        existing_id: Option<&str>,
        target: &UpdateTarget,
        content: &str,
    ) -> Result<String> {
        let payload = Self::record_payload(target, content);

        let record: DnsRecord = match existing_id {
            Some(record_id) => {
                tracing::info!(record = %target.record_name, content = %content, "patching DNS record");
                let url = format!("{}/zones/{}/dns_records/{}", self.base_url, zone_id, record_id);
                self.send(self.client.patch(&url).json(&payload)).await?
            }
            None => {
                tracing::info!(record = %target.record_name, content = %content, "creating DNS record");
                let url = format!("{}/zones/{}/dns_records", self.base_url, zone_id);
                self.send(self.client.post(&url).json(&payload)).await?
            }
        };

        Ok(record.id)
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

// # HTTP IP Source
//
// Public IP detection over plain-text echo endpoints.
//
// Each family has its own ordered fallback chain; the first endpoint that
// answers with a syntactically valid address of the requested family wins.
// An endpoint failure, a malformed body or a wrong-family address advances
// to the next endpoint. A single detect() call never retries an endpoint;
// the engine's next iteration is the retry.

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use zonesync_core::config::IpFamily;
use zonesync_core::traits::IpSource;
use zonesync_core::{Error, Result};

/// Per-request timeout for the echo endpoints
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Default IPv4 echo endpoints, tried in order
const DEFAULT_V4_ENDPOINTS: &[&str] = &[
    "https://ipv4.icanhazip.com/",
    "https://api.ipify.org/",
    "https://checkip.amazonaws.com/",
];

/// Default IPv6 echo endpoints, tried in order
const DEFAULT_V6_ENDPOINTS: &[&str] = &[
    "https://ipv6.icanhazip.com/",
    "https://api64.ipify.org/",
];

/// HTTP-based public IP source with per-family endpoint fallback
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    client: reqwest::Client,
    v4_endpoints: Vec<String>,
    v6_endpoints: Vec<String>,
}

impl HttpIpSource {
    /// Create a source using the default endpoint chains
    pub fn new() -> Result<Self> {
        Self::with_endpoints(
            DEFAULT_V4_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            DEFAULT_V6_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// Create a source with custom endpoint chains
    pub fn with_endpoints(v4_endpoints: Vec<String>, v6_endpoints: Vec<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::detection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            v4_endpoints,
            v6_endpoints,
        })
    }

    fn endpoints(&self, family: IpFamily) -> &[String] {
        match family {
            IpFamily::V4 => &self.v4_endpoints,
            IpFamily::V6 => &self.v6_endpoints,
        }
    }

    async fn fetch(&self, url: &str) -> std::result::Result<String, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(format!("HTTP status {}", response.status()));
        }

        response
            .text()
            .await
            .map_err(|e| format!("failed to read body: {e}"))
    }
}

/// Parse an echo endpoint body into an address of the requested family
fn parse_address(body: &str, family: IpFamily) -> Option<IpAddr> {
    let ip: IpAddr = body.trim().parse().ok()?;
    match (family, ip) {
        (IpFamily::V4, IpAddr::V4(_)) => Some(ip),
        (IpFamily::V6, IpAddr::V6(_)) => Some(ip),
        _ => None,
    }
}

#[async_trait]
impl IpSource for HttpIpSource {
    async fn detect(&self, family: IpFamily) -> Result<IpAddr> {
        let endpoints = self.endpoints(family);
        let mut last_error = String::from("no endpoints configured");

        for url in endpoints {
            match self.fetch(url).await {
                Ok(body) => match parse_address(&body, family) {
                    Some(ip) => {
                        tracing::debug!(endpoint = %url, ip = %ip, "public IP detected");
                        return Ok(ip);
                    }
                    None => {
                        tracing::warn!(endpoint = %url, family = %family, "endpoint returned an invalid address");
                        last_error = format!("{url}: invalid {family} address");
                    }
                },
                Err(message) => {
                    tracing::warn!(endpoint = %url, error = %message, "endpoint lookup failed");
                    last_error = format!("{url}: {message}");
                }
            }
        }

        Err(Error::detection(format!(
            "unable to detect {family} address, last error: {last_error}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_ipv4() {
        let ip = parse_address("70.49.233.249\n", IpFamily::V4);
        assert_eq!(ip, Some("70.49.233.249".parse().unwrap()));
    }

    #[test]
    fn test_parse_valid_ipv6() {
        let ip = parse_address("  2001:db8::1  ", IpFamily::V6);
        assert_eq!(ip, Some("2001:db8::1".parse().unwrap()));
    }

    #[test]
    fn test_wrong_family_rejected() {
        assert_eq!(parse_address("70.49.233.249", IpFamily::V6), None);
        assert_eq!(parse_address("2001:db8::1", IpFamily::V4), None);
    }

    #[test]
    fn test_garbage_rejected() {
        assert_eq!(parse_address("<html>not an ip</html>", IpFamily::V4), None);
        assert_eq!(parse_address("", IpFamily::V4), None);
        assert_eq!(parse_address("999.999.999.999", IpFamily::V4), None);
    }

    #[test]
    fn test_default_endpoint_chains() {
        let source = HttpIpSource::new().unwrap();
        assert_eq!(source.endpoints(IpFamily::V4).len(), 3);
        assert_eq!(source.endpoints(IpFamily::V6).len(), 2);
        assert!(source.endpoints(IpFamily::V4)[0].contains("ipv4"));
        assert!(source.endpoints(IpFamily::V6)[0].contains("ipv6"));
    }

    #[tokio::test]
    async fn test_empty_chain_fails_with_detection_error() {
        let source = HttpIpSource::with_endpoints(Vec::new(), Vec::new()).unwrap();
        match source.detect(IpFamily::V4).await {
            Err(zonesync_core::Error::Detection(_)) => {}
            other => panic!("expected detection error, got {:?}", other),
        }
    }
}

//! Configuration types for the zonesync system
//!
//! The binary layers CLI flags over environment variables and hands the
//! result to the library as a [`DdnsConfig`]. Target resolution itself
//! (precedence, list matching, replication) lives in [`crate::resolver`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// DNS record type managed by the updater
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
}

impl RecordType {
    /// Address family this record type is updated from
    pub fn family(&self) -> IpFamily {
        match self {
            RecordType::A => IpFamily::V4,
            RecordType::Aaaa => IpFamily::V6,
        }
    }

    /// Wire name of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            other => Err(crate::Error::config(format!(
                "record type must be A or AAAA, got '{other}'"
            ))),
        }
    }
}

/// IP address family, grouping targets that share one public address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpFamily {
    /// IPv4
    V4,
    /// IPv6
    V6,
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpFamily::V4 => f.write_str("IPv4"),
            IpFamily::V6 => f.write_str("IPv6"),
        }
    }
}

/// Provider credential: API token, or legacy email + global key pair
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credential {
    /// Scoped API token (preferred)
    Token {
        /// The token value
        token: String,
    },
    /// Account email plus global API key
    GlobalKey {
        /// Account email
        email: String,
        /// Global API key
        key: String,
    },
}

// Custom Debug implementation that hides the secret material
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Token { .. } => f
                .debug_struct("Token")
                .field("token", &"<REDACTED>")
                .finish(),
            Credential::GlobalKey { email, .. } => f
                .debug_struct("GlobalKey")
                .field("email", email)
                .field("key", &"<REDACTED>")
                .finish(),
        }
    }
}

impl Credential {
    /// Validate that the credential is usable
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            Credential::Token { token } if token.is_empty() => {
                Err(crate::Error::config("API token cannot be empty"))
            }
            Credential::GlobalKey { email, key } if email.is_empty() || key.is_empty() => {
                Err(crate::Error::config("email and API key are both required"))
            }
            _ => Ok(()),
        }
    }
}

/// Layered zone and record-name inputs consumed by the target resolver
///
/// Each field corresponds to one configuration source. Precedence and list
/// matching are applied by [`crate::resolver::resolve_targets`]; this struct
/// only carries the raw values, empty meaning "not supplied".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetSources {
    /// `--zones a,b` CLI override
    #[serde(default)]
    pub cli_zones: Vec<String>,
    /// `CLOUDFLARE_ZONE_NAMES` environment list
    #[serde(default)]
    pub env_zones: Vec<String>,
    /// `CLOUDFLARE_ZONE_NAME` legacy single zone
    #[serde(default)]
    pub legacy_zone: Option<String>,

    /// `--records x,y` CLI override
    #[serde(default)]
    pub cli_records: Vec<String>,
    /// `--record` CLI single record, applied to every zone
    #[serde(default)]
    pub cli_record: Option<String>,
    /// `CLOUDFLARE_RECORD_NAMES` environment list
    #[serde(default)]
    pub env_records: Vec<String>,
    /// `CLOUDFLARE_RECORD_NAME` single record, applied to every zone
    #[serde(default)]
    pub env_record: Option<String>,
}

/// Resolved runtime configuration for the updater
///
/// Produced by the binary's env/CLI layering, consumed once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Layered zone/record inputs for the target resolver
    pub sources: TargetSources,

    /// Record type for every target
    pub record_type: RecordType,

    /// TTL applied on create/update
    pub ttl: u32,

    /// Whether records go through the provider's proxy
    pub proxied: bool,

    /// Provider credential
    pub credential: Credential,

    /// Loop interval in seconds; `None` runs a single iteration
    pub interval: Option<u64>,

    /// Detect and compare, but never write
    pub dry_run: bool,

    /// Force a single iteration even when an interval is configured
    pub once: bool,
}

impl DdnsConfig {
    /// Validate settings that are independent of target resolution
    ///
    /// List-matching invariants are checked by the resolver; both run before
    /// any network activity.
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.credential.validate()?;

        if self.sources.cli_zones.is_empty()
            && self.sources.env_zones.is_empty()
            && self.sources.legacy_zone.as_deref().unwrap_or("").is_empty()
        {
            return Err(crate::Error::config(
                "no zone configured: set --zones, CLOUDFLARE_ZONE_NAMES or CLOUDFLARE_ZONE_NAME",
            ));
        }

        if self.ttl == 0 {
            return Err(crate::Error::config("ttl must be greater than zero"));
        }

        if let Some(0) = self.interval {
            return Err(crate::Error::config("interval must be greater than zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> DdnsConfig {
        DdnsConfig {
            sources: TargetSources {
                legacy_zone: Some("example.com".to_string()),
                ..TargetSources::default()
            },
            record_type: RecordType::A,
            ttl: 300,
            proxied: false,
            credential: Credential::Token {
                token: "test-token".to_string(),
            },
            interval: None,
            dry_run: false,
            once: false,
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_missing_zone_rejected() {
        let mut config = base_config();
        config.sources.legacy_zone = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_token_rejected() {
        let mut config = base_config();
        config.credential = Credential::Token {
            token: String::new(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = base_config();
        config.interval = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_record_type_parsing() {
        assert_eq!("a".parse::<RecordType>().unwrap(), RecordType::A);
        assert_eq!("AAAA".parse::<RecordType>().unwrap(), RecordType::Aaaa);
        assert!("CNAME".parse::<RecordType>().is_err());
    }

    #[test]
    fn test_credential_debug_redacts_secrets() {
        let token = Credential::Token {
            token: "secret_token_12345".to_string(),
        };
        let debug = format!("{:?}", token);
        assert!(!debug.contains("secret_token_12345"));

        let key = Credential::GlobalKey {
            email: "ops@example.com".to_string(),
            key: "secret_key_67890".to_string(),
        };
        let debug = format!("{:?}", key);
        assert!(debug.contains("ops@example.com"));
        assert!(!debug.contains("secret_key_67890"));
    }
}

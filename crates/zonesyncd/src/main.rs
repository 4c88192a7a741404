// # zonesyncd - Cloudflare DDNS updater
//
// Thin integration layer:
//
// 1. Parse CLI flags and load the environment (optionally from a dotenv file)
// 2. Layer CLI over environment into a `DdnsConfig`
// 3. Initialize tracing and the tokio runtime
// 4. Wire the Cloudflare provider and the HTTP IP source into the engine
// 5. Map the run report onto an exit code
//
// All reconciliation logic lives in zonesync-core; this binary makes no
// update decisions of its own.
//
// ## Example
//
// ```bash
// export CLOUDFLARE_API_TOKEN=your_token
// export CLOUDFLARE_ZONE_NAMES=example.com,example.org
//
// zonesyncd --interval 300
// ```

use clap::Parser;
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;
use zonesync_core::config::{Credential, DdnsConfig, RecordType, TargetSources};
use zonesync_core::engine::Reconciler;

/// Exit codes for the different termination scenarios
///
/// - 0: clean shutdown
/// - 1: runtime error (every target of the final iteration failed)
/// - 2: configuration or argument error
/// - 130: interrupted by a shutdown signal
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    CleanShutdown = 0,
    RuntimeError = 1,
    ConfigError = 2,
    Interrupted = 130,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Cloudflare DDNS updater
///
/// Detects the public IP address and keeps DNS records in the configured
/// zones pointed at it. Flags override the corresponding environment
/// variables.
#[derive(Debug, Parser)]
#[command(name = "zonesyncd", version, about)]
struct Cli {
    /// Load environment variables from this dotenv file before reading them
    #[arg(long, value_name = "PATH")]
    env: Option<String>,

    /// Single zone to update (legacy form of --zones)
    #[arg(long, value_name = "ZONE")]
    zone: Option<String>,

    /// Comma-separated list of zones to update
    #[arg(long, value_delimiter = ',', value_name = "ZONES")]
    zones: Vec<String>,

    /// Single record name, applied to every zone
    #[arg(long, value_name = "RECORD")]
    record: Option<String>,

    /// Comma-separated list of record names, matched against the zone list
    #[arg(long, value_delimiter = ',', value_name = "RECORDS")]
    records: Vec<String>,

    /// Record type to manage
    #[arg(long = "type", value_name = "A|AAAA")]
    record_type: Option<RecordType>,

    /// TTL in seconds applied on create and update
    #[arg(long, value_name = "SECS")]
    ttl: Option<u32>,

    /// Route records through the Cloudflare proxy
    #[arg(long, conflicts_with = "no_proxied")]
    proxied: bool,

    /// Serve records DNS-only
    #[arg(long)]
    no_proxied: bool,

    /// Seconds between iterations; omit to run a single pass
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// Detect and compare, but never write to Cloudflare
    #[arg(long)]
    dry_run: bool,

    /// Run exactly one iteration even when an interval is configured
    #[arg(long)]
    once: bool,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// Raw environment values, read once so the merge logic stays testable
#[derive(Debug, Default)]
struct EnvSettings {
    api_token: Option<String>,
    email: Option<String>,
    api_key: Option<String>,
    zone_names: Vec<String>,
    zone_name: Option<String>,
    record_names: Vec<String>,
    record_name: Option<String>,
    record_type: Option<String>,
    ttl: Option<String>,
    proxied: Option<String>,
    interval: Option<String>,
    dry_run: Option<String>,
    log_level: Option<String>,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse a boolean environment value: 1/true/yes/on, case-insensitive
fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl EnvSettings {
    fn from_env() -> Self {
        Self {
            api_token: env::var("CLOUDFLARE_API_TOKEN").ok(),
            email: env::var("CLOUDFLARE_EMAIL").ok(),
            api_key: env::var("CLOUDFLARE_API_KEY").ok(),
            zone_names: env::var("CLOUDFLARE_ZONE_NAMES")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            zone_name: env::var("CLOUDFLARE_ZONE_NAME").ok(),
            record_names: env::var("CLOUDFLARE_RECORD_NAMES")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            record_name: env::var("CLOUDFLARE_RECORD_NAME").ok(),
            record_type: env::var("CLOUDFLARE_RECORD_TYPE").ok(),
            ttl: env::var("CLOUDFLARE_TTL").ok(),
            proxied: env::var("CLOUDFLARE_PROXIED").ok(),
            interval: env::var("DDNS_INTERVAL").ok(),
            dry_run: env::var("DDNS_DRY_RUN").ok(),
            log_level: env::var("DDNS_LOG_LEVEL").ok(),
        }
    }

    fn credential(&self) -> Result<Credential, zonesync_core::Error> {
        if let Some(token) = self.api_token.as_deref().filter(|t| !t.is_empty()) {
            return Ok(Credential::Token {
                token: token.to_string(),
            });
        }
        match (self.email.as_deref(), self.api_key.as_deref()) {
            (Some(email), Some(key)) if !email.is_empty() && !key.is_empty() => {
                Ok(Credential::GlobalKey {
                    email: email.to_string(),
                    key: key.to_string(),
                })
            }
            _ => Err(zonesync_core::Error::config(
                "no credential configured: set CLOUDFLARE_API_TOKEN, \
                 or CLOUDFLARE_EMAIL and CLOUDFLARE_API_KEY",
            )),
        }
    }
}

/// Layer CLI flags over environment values into the runtime configuration
///
/// Target precedence itself (zone chain, record chain, list matching) is the
/// resolver's job; this only slots each input into its source field.
fn build_config(cli: &Cli, env: &EnvSettings) -> Result<DdnsConfig, zonesync_core::Error> {
    let credential = env.credential()?;

    let record_type = match (cli.record_type, env.record_type.as_deref()) {
        (Some(rt), _) => rt,
        (None, Some(raw)) => raw.parse()?,
        (None, None) => RecordType::A,
    };

    let ttl = match (cli.ttl, env.ttl.as_deref()) {
        (Some(ttl), _) => ttl,
        (None, Some(raw)) => raw
            .trim()
            .parse()
            .map_err(|_| zonesync_core::Error::config(format!("invalid CLOUDFLARE_TTL: '{raw}'")))?,
        (None, None) => 300,
    };

    let proxied = if cli.proxied {
        true
    } else if cli.no_proxied {
        false
    } else {
        env.proxied.as_deref().map(parse_bool).unwrap_or(false)
    };

    let interval = match (cli.interval, env.interval.as_deref()) {
        (Some(secs), _) => Some(secs),
        (None, Some(raw)) => Some(raw.trim().parse().map_err(|_| {
            zonesync_core::Error::config(format!("invalid DDNS_INTERVAL: '{raw}'"))
        })?),
        (None, None) => None,
    };

    let dry_run = cli.dry_run || env.dry_run.as_deref().map(parse_bool).unwrap_or(false);

    let config = DdnsConfig {
        sources: TargetSources {
            cli_zones: cli.zones.clone(),
            env_zones: env.zone_names.clone(),
            legacy_zone: cli.zone.clone().or_else(|| env.zone_name.clone()),
            cli_records: cli.records.clone(),
            cli_record: cli.record.clone(),
            env_records: env.record_names.clone(),
            env_record: env.record_name.clone(),
        },
        record_type,
        ttl,
        proxied,
        credential,
        interval,
        dry_run,
        once: cli.once,
    };

    config.validate()?;
    Ok(config)
}

fn log_level(cli: &Cli, env: &EnvSettings) -> Level {
    if cli.verbose {
        return Level::DEBUG;
    }
    match env
        .log_level
        .as_deref()
        .unwrap_or("info")
        .to_ascii_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load the dotenv file before any environment variable is read.
    // Existing process environment wins over file entries.
    if let Some(path) = &cli.env {
        if let Err(e) = dotenvy::from_path(path) {
            eprintln!("Failed to load env file {path}: {e}");
            return DdnsExitCode::ConfigError.into();
        }
    } else {
        let _ = dotenvy::dotenv();
    }

    let env_settings = EnvSettings::from_env();

    let config = match build_config(&cli, &env_settings) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(&cli, &env_settings))
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
        return DdnsExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            return DdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(config)).into()
}

async fn run(config: DdnsConfig) -> DdnsExitCode {
    let provider = match zonesync_cloudflare::CloudflareProvider::new(config.credential.clone()) {
        Ok(provider) => provider,
        Err(e) => {
            error!("Failed to create Cloudflare client: {e}");
            return DdnsExitCode::ConfigError;
        }
    };

    let ip_source = match zonesync_ip_http::HttpIpSource::new() {
        Ok(source) => source,
        Err(e) => {
            error!("Failed to create IP source: {e}");
            return DdnsExitCode::ConfigError;
        }
    };

    // Target resolution failures (list mismatch, bad sources) surface here,
    // before any network call.
    let mut engine = match Reconciler::new(Box::new(ip_source), Box::new(provider), &config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Configuration error: {e}");
            return DdnsExitCode::ConfigError;
        }
    };

    info!(
        targets = engine.targets().len(),
        interval = ?config.interval,
        dry_run = config.dry_run,
        "zonesyncd starting"
    );

    let report = engine.run().await;

    if report.interrupted {
        info!(iterations = report.iterations, "interrupted, shutting down");
        return DdnsExitCode::Interrupted;
    }

    if report.all_failed() {
        error!("every target failed in the final iteration");
        return DdnsExitCode::RuntimeError;
    }

    info!(iterations = report.iterations, "done");
    DdnsExitCode::CleanShutdown
}

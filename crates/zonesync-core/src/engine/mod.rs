//! Core reconciliation engine
//!
//! The [`Reconciler`] owns the update targets and the per-family change
//! cache, and drives one pass over all targets per iteration:
//!
//! 1. detect the public IP for each address family present in the targets
//! 2. compare against the cached last-seen IP for that family
//! 3. skip the provider entirely when unchanged, otherwise live-reconcile
//!    every target of the family (resolve zone, fetch record, create/patch)
//! 4. commit the detected IP to the cache after the family pass
//!
//! Targets are processed strictly sequentially; the only suspension points
//! are the collaborators' network calls and the inter-iteration sleep. A
//! failure on one target or one family never aborts the rest of the
//! iteration, and in continuous mode only cancellation stops the loop.

use crate::cache::IpCache;
use crate::config::{DdnsConfig, IpFamily, RecordType};
use crate::error::Result;
use crate::resolver::{self, UpdateTarget};
use crate::traits::{DnsProvider, IpSource, RemoteRecord};
use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Outcome of one target in one iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Record already correct, or IP unchanged since the last iteration
    Noop,
    /// Existing record patched (or would be, in dry-run)
    Updated,
    /// Record created (or would be, in dry-run)
    Created,
    /// Detection or provider failure, isolated to this target
    Error(String),
}

impl Outcome {
    /// Log label for the outcome
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Noop => "noop",
            Outcome::Updated => "updated",
            Outcome::Created => "created",
            Outcome::Error(_) => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }
}

/// Per-target, per-iteration result, consumed only by structured logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationResult {
    pub zone_name: String,
    pub record_name: String,
    pub record_type: RecordType,
    pub outcome: Outcome,
    /// Detected IP, absent when detection itself failed
    pub ip: Option<IpAddr>,
    /// Remote record id, absent on cached noops and detection failures
    pub record_id: Option<String>,
}

impl IterationResult {
    fn new(target: &UpdateTarget, outcome: Outcome, ip: Option<IpAddr>, record_id: Option<String>) -> Self {
        Self {
            zone_name: target.zone_name.clone(),
            record_name: target.record_name.clone(),
            record_type: target.record_type,
            outcome,
            ip,
            record_id,
        }
    }
}

/// How the detected IP relates to the cached one for a family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckStatus {
    /// No cached value yet: live-reconcile regardless of remote state
    Initial,
    /// Cached value equals the detected IP: skip the provider entirely
    Unchanged,
    /// Cached value differs: live-reconcile every target of the family
    Changed,
}

impl CheckStatus {
    fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Initial => "initial check",
            CheckStatus::Unchanged => "unchanged",
            CheckStatus::Changed => "CHANGED",
        }
    }
}

/// Aggregate of a finished run, used by the process wrapper for exit codes
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Number of iterations performed
    pub iterations: u64,
    /// Whether the loop exited on a cancellation signal
    pub interrupted: bool,
    /// Results of the final iteration
    pub last_results: Vec<IterationResult>,
}

impl RunReport {
    /// True when every target of the final iteration errored
    pub fn all_failed(&self) -> bool {
        !self.last_results.is_empty() && self.last_results.iter().all(|r| r.outcome.is_error())
    }
}

/// Reconciliation loop controller
///
/// Owns the resolved targets and the per-family IP cache. Construction
/// resolves targets and validates configuration, so every [`crate::Error::Config`]
/// surfaces before the first network call.
pub struct Reconciler {
    ip_source: Box<dyn IpSource>,
    provider: Box<dyn DnsProvider>,
    targets: Vec<UpdateTarget>,
    interval: Option<Duration>,
    once: bool,
    dry_run: bool,
    cache: IpCache,
    iteration: u64,
}

impl Reconciler {
    /// Create a reconciler from a resolved configuration
    ///
    /// Fails fast with [`crate::Error::Config`] when validation or target
    /// resolution fails; no network activity happens here.
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: &DdnsConfig,
    ) -> Result<Self> {
        config.validate()?;
        let targets = resolver::resolve_targets(config)?;

        Ok(Self {
            ip_source,
            provider,
            targets,
            interval: config.interval.map(Duration::from_secs),
            once: config.once,
            dry_run: config.dry_run,
            cache: IpCache::new(),
            iteration: 0,
        })
    }

    /// Assemble a reconciler from an explicit target list
    ///
    /// For embedders and tests that bypass config-based resolution; runs
    /// single-shot unless driven through [`Reconciler::run_iteration`].
    pub fn with_targets(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        targets: Vec<UpdateTarget>,
        dry_run: bool,
    ) -> Self {
        Self {
            ip_source,
            provider,
            targets,
            interval: None,
            once: true,
            dry_run,
            cache: IpCache::new(),
            iteration: 0,
        }
    }

    /// The resolved targets, in reconciliation order
    pub fn targets(&self) -> &[UpdateTarget] {
        &self.targets
    }

    /// Cached last-seen IP for a family, if a pass has completed for it
    pub fn cached_ip(&self, family: IpFamily) -> Option<IpAddr> {
        self.cache.get(family).map(|entry| entry.ip)
    }

    /// Run until completion or SIGINT
    ///
    /// Performs exactly one iteration when no interval is configured or
    /// `once` was requested; otherwise loops until cancelled.
    pub async fn run(&mut self) -> RunReport {
        self.run_internal(None).await
    }

    /// Run with an explicit cancellation signal (used by tests)
    ///
    /// The signal is observed between iterations; an in-flight iteration is
    /// always completed before the loop exits.
    pub async fn run_with_shutdown(&mut self, shutdown: oneshot::Receiver<()>) -> RunReport {
        self.run_internal(Some(shutdown)).await
    }

    async fn run_internal(&mut self, mut shutdown: Option<oneshot::Receiver<()>>) -> RunReport {
        let single_shot = self.once || self.interval.is_none();
        let mut interrupted = false;
        let mut last_results;

        info!(
            targets = self.targets.len(),
            provider = self.provider.provider_name(),
            dry_run = self.dry_run,
            "starting reconciliation"
        );

        loop {
            last_results = self.run_iteration().await;

            if single_shot {
                break;
            }
            // interval is present whenever we are not single-shot
            let interval = self.interval.unwrap_or_default();

            if let Some(rx) = shutdown.as_mut() {
                // A signal sent during the iteration wins over the sleep
                match rx.try_recv() {
                    Err(oneshot::error::TryRecvError::Empty) => {}
                    _ => {
                        interrupted = true;
                        break;
                    }
                }
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = rx => {
                        interrupted = true;
                        break;
                    }
                }
            } else {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = tokio::signal::ctrl_c() => {
                        info!("shutdown signal received");
                        interrupted = true;
                        break;
                    }
                }
            }
        }

        if interrupted {
            info!(iterations = self.iteration, "reconciliation interrupted");
        }

        RunReport {
            iterations: self.iteration,
            interrupted,
            last_results,
        }
    }

    /// Perform one full pass over all targets
    ///
    /// Families are visited in order of first appearance in the target list;
    /// within a family, targets keep their resolved order.
    pub async fn run_iteration(&mut self) -> Vec<IterationResult> {
        self.iteration += 1;
        let mut results = Vec::with_capacity(self.targets.len());

        let mut families: Vec<IpFamily> = Vec::new();
        for target in &self.targets {
            let family = target.record_type.family();
            if !families.contains(&family) {
                families.push(family);
            }
        }

        for family in families {
            let group: Vec<UpdateTarget> = self
                .targets
                .iter()
                .filter(|t| t.record_type.family() == family)
                .cloned()
                .collect();

            let current_ip = match self.ip_source.detect(family).await {
                Ok(ip) => ip,
                Err(e) => {
                    // Isolated to this family; other families still proceed
                    warn!(iteration = self.iteration, family = %family, error = %e, "IP detection failed");
                    for target in &group {
                        results.push(IterationResult::new(
                            target,
                            Outcome::Error(e.to_string()),
                            None,
                            None,
                        ));
                    }
                    continue;
                }
            };

            let status = match self.cache.get(family) {
                None => CheckStatus::Initial,
                Some(entry) if entry.ip == current_ip => CheckStatus::Unchanged,
                Some(_) => CheckStatus::Changed,
            };
            let previous = self
                .cache
                .get(family)
                .map(|entry| entry.ip.to_string())
                .unwrap_or_else(|| "none".to_string());

            info!(
                iteration = self.iteration,
                family = %family,
                previous = %previous,
                current = %current_ip,
                status = status.as_str(),
                "public address check"
            );

            match status {
                CheckStatus::Unchanged => {
                    for target in &group {
                        results.push(IterationResult::new(
                            target,
                            Outcome::Noop,
                            Some(current_ip),
                            None,
                        ));
                    }
                }
                CheckStatus::Initial | CheckStatus::Changed => {
                    for target in &group {
                        let result = self.reconcile_target(target, current_ip).await;
                        self.log_result(&result);
                        results.push(result);
                    }
                }
            }

            // Unconditional, even on an unchanged pass: this is what keeps
            // the next iteration's comparison valid.
            self.cache.set(family, current_ip);
        }

        results
    }

    /// Reconcile a single target against the detected IP
    ///
    /// Errors are converted into an `error` outcome here so the remaining
    /// targets of the iteration are unaffected.
    async fn reconcile_target(&self, target: &UpdateTarget, current_ip: IpAddr) -> IterationResult {
        match self.apply_target(target, current_ip).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    zone = %target.zone_name,
                    record = %target.record_name,
                    error = %e,
                    "target reconciliation failed"
                );
                IterationResult::new(target, Outcome::Error(e.to_string()), Some(current_ip), None)
            }
        }
    }

    async fn apply_target(&self, target: &UpdateTarget, current_ip: IpAddr) -> Result<IterationResult> {
        let zone_id = self.provider.resolve_zone(&target.zone_name).await?;
        let remote = self
            .provider
            .find_record(&zone_id, &target.record_name, target.record_type)
            .await?;
        let content = current_ip.to_string();

        match remote {
            Some(remote) => {
                if !needs_update(&remote, &content, target) {
                    debug!(record = %target.record_name, "remote record already up to date");
                    return Ok(IterationResult::new(
                        target,
                        Outcome::Noop,
                        Some(current_ip),
                        Some(remote.id),
                    ));
                }

                if self.dry_run {
                    info!(record = %target.record_name, content = %content, "dry-run: would patch record");
                    return Ok(IterationResult::new(
                        target,
                        Outcome::Updated,
                        Some(current_ip),
                        Some(remote.id),
                    ));
                }

                let record_id = self
                    .provider
                    .upsert_record(&zone_id, Some(&remote.id), target, &content)
                    .await?;
                Ok(IterationResult::new(
                    target,
                    Outcome::Updated,
                    Some(current_ip),
                    Some(record_id),
                ))
            }
            None => {
                if self.dry_run {
                    info!(record = %target.record_name, content = %content, "dry-run: would create record");
                    return Ok(IterationResult::new(
                        target,
                        Outcome::Created,
                        Some(current_ip),
                        None,
                    ));
                }

                let record_id = self
                    .provider
                    .upsert_record(&zone_id, None, target, &content)
                    .await?;
                Ok(IterationResult::new(
                    target,
                    Outcome::Created,
                    Some(current_ip),
                    Some(record_id),
                ))
            }
        }
    }

    fn log_result(&self, result: &IterationResult) {
        info!(
            zone = %result.zone_name,
            record = %result.record_name,
            rtype = %result.record_type,
            outcome = result.outcome.as_str(),
            ip = result.ip.map(|ip| ip.to_string()).unwrap_or_else(|| "none".to_string()),
            record_id = result.record_id.as_deref().unwrap_or("absent"),
            "target reconciled"
        );
    }
}

/// A write is needed when any tracked field differs from the fetched state
///
/// TTL and proxied only participate when the provider exposes them.
fn needs_update(remote: &RemoteRecord, content: &str, target: &UpdateTarget) -> bool {
    if remote.content != content {
        return true;
    }
    if remote.ttl.is_some_and(|ttl| ttl != target.ttl) {
        return true;
    }
    if remote.proxied.is_some_and(|proxied| proxied != target.proxied) {
        return true;
    }
    false
}

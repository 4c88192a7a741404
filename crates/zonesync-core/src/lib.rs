// # zonesync-core
//
// Core library for the zonesync DDNS updater.
//
// ## Architecture Overview
//
// - **resolver**: derives the ordered target list from layered CLI/env inputs
// - **IpSource**: trait for public IP detection, one address per family
// - **DnsProvider**: trait for the provider's zone/record/upsert operations
// - **IpCache**: per-family last-seen IP, the only mutable state across
//   iterations
// - **Reconciler**: the loop that ties detection, cache and provider together
//
// ## Design Principles
//
// 1. **Fail fast on configuration**: target resolution and validation run
//    before any network call
// 2. **Isolate failures**: a broken target or family never takes down an
//    iteration, only cancellation stops the loop
// 3. **Minimize provider traffic**: the change cache short-circuits every
//    provider call when the public IP has not moved
// 4. **Library-first**: the binary is a thin wrapper over this crate

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod resolver;
pub mod traits;

// Re-export core types for convenience
pub use cache::IpCache;
pub use config::{Credential, DdnsConfig, IpFamily, RecordType, TargetSources};
pub use engine::{IterationResult, Outcome, Reconciler, RunReport};
pub use error::{Error, Result};
pub use resolver::{UpdateTarget, resolve_targets};
pub use traits::{DnsProvider, IpSource, RemoteRecord};

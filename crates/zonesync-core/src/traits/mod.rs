//! Trait seams between the engine and its external collaborators

pub mod dns_provider;
pub mod ip_source;

pub use dns_provider::{DnsProvider, RemoteRecord};
pub use ip_source::IpSource;

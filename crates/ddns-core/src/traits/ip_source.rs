// # IP Source Trait
//
// Defines the interface for discovering the caller's current public IPv4
// address.
//
// ## Implementations
//
// - HTTP echo service: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let current_ip = source.current().await?;
//     println!("Public IP: {}", current_ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for IP source implementations
///
/// An IP source answers one question per run: what is the public IPv4
/// address right now. Nothing is cached between calls and nothing is
/// persisted.
///
/// # Trust Level: Semi-Trusted
///
/// ## Allowed Capabilities
/// - ✅ Perform one outbound request per `current()` call
///
/// ## Forbidden Capabilities
/// - ❌ Perform DNS updates (use `DnsProvider`)
/// - ❌ Implement retry logic (the external scheduler re-runs the job)
/// - ❌ Decide whether an update is needed (owned by `Reconciler`)
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The current address
    /// - `Err(Error::Network)`: Transport failure, non-2xx status,
    ///   unreadable body, or a body that is not an IPv4 literal
    async fn current(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Short name of the source, for logging
    fn source_name(&self) -> &str {
        "unknown"
    }
}

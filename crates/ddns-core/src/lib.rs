// # ddns-core
//
// Core library for the one-shot DDNS reconciler.
//
// ## Architecture Overview
//
// This library provides the core functionality for dynamic DNS updates:
// - **IpSource**: Trait for discovering the current public IPv4 address
// - **DnsProvider**: Trait for reading and updating DNS records via provider APIs
// - **Reconciler**: Compares the record with the current IP and updates it when they differ
// - **ProviderRegistry**: Plugin-based registry for DNS providers
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from provider implementations
// 2. **Stateless Runs**: The provider's record is the only durable state
// 3. **Plugin-Based**: Providers are registered dynamically, no hard-coded if-else
// 4. **Library-First**: Errors are returned, never turned into process exits
// 5. **Idempotency**: A run with nothing to change performs no mutation

pub mod traits;
pub mod reconciler;
pub mod registry;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider, DnsProviderFactory, DnsRecord, Zone};
pub use reconciler::{Outcome, ReconcileEvent, ReconcileState, Reconciler};
pub use registry::ProviderRegistry;
pub use config::{DdnsConfig, IpSourceConfig, ProviderConfig, RecordTarget};
pub use error::{Error, ErrorKind, Result};

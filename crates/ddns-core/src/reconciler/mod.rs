//! One-shot DDNS reconciler
//!
//! The Reconciler is responsible for:
//! - Resolving the current public IP via IpSource
//! - Fetching the provider's current record via DnsProvider
//! - Comparing the two and updating only when they differ
//! - Treating a provider "duplicate value" rejection as success
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────┐
//!                 │  Reconciler  │
//!                 └──────────────┘
//!                        │
//!        ┌───────────────┼────────────────┐
//!        │ (concurrent)  │                │
//!        ▼               ▼                ▼
//! ┌─────────────┐ ┌──────────────┐ ┌─────────────┐
//! │  IpSource   │ │ DnsProvider  │ │   Events    │
//! │ (current)   │ │ (zone/record │ │  (notify)   │
//! └─────────────┘ │  /update)    │ └─────────────┘
//!                 └──────────────┘
//! ```
//!
//! ## State Machine
//!
//! ```text
//! Init → ZoneResolved → RecordFetched → Compared → { UpToDate | Updated | DryRun | Failed }
//! ```
//!
//! 1. Resolve the zone for the configured domain (NotFound → Failed)
//! 2. Find the record by exact name and type (NotFound → Failed)
//! 3. Independently, resolve the external IP (Network → Failed)
//! 4. Compare the record value with the IP by exact string equality
//! 5. Equal → UpToDate, no mutation
//! 6. Different → update; success or DuplicateValue → Updated, else Failed

use crate::config::RecordTarget;
use crate::error::Result;
use crate::traits::{DnsProvider, DnsRecord, IpSource, Zone};
use std::net::Ipv4Addr;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Capacity of the phase event channel
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Reconciliation phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    Init,
    ZoneResolved,
    RecordFetched,
    Compared,
    UpToDate,
    Updated,
    /// An update was needed but skipped
    DryRun,
    Failed,
}

impl ReconcileState {
    /// Whether the run ends in this state
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::UpToDate | Self::Updated | Self::DryRun | Self::Failed
        )
    }
}

/// Terminal success outcome of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The record already held the current IP; nothing was written
    UpToDate {
        /// The value found on the provider
        value: String,
    },
    /// The record now holds the current IP
    Updated {
        /// The value that was overwritten
        previous: String,
        /// The value now stored
        current: String,
        /// The provider reported the value was already stored
        duplicate: bool,
    },
    /// Dry-run: an update was needed but not performed
    DryRun {
        /// The value found on the provider
        previous: String,
        /// The value that would have been written
        desired: String,
    },
}

impl Outcome {
    /// The terminal state this outcome corresponds to
    pub fn state(&self) -> ReconcileState {
        match self {
            Outcome::UpToDate { .. } => ReconcileState::UpToDate,
            Outcome::Updated { .. } => ReconcileState::Updated,
            Outcome::DryRun { .. } => ReconcileState::DryRun,
        }
    }
}

/// Events emitted by the Reconciler, one per completed phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// Run started
    Started {
        record_name: String,
        provider: &'static str,
    },

    /// External IP resolved
    IpResolved { ip: Ipv4Addr },

    /// Zone resolved
    ZoneResolved { zone_id: String, zone_name: String },

    /// Record fetched
    RecordFetched { record_id: String, value: String },

    /// Record value compared with the external IP
    Compared {
        current: String,
        desired: String,
        needs_update: bool,
    },

    /// Run finished successfully
    Finished { outcome: Outcome },

    /// Run failed
    Failed { error: String },
}

impl ReconcileEvent {
    /// The state the machine is in after this event
    pub fn state(&self) -> ReconcileState {
        match self {
            ReconcileEvent::Started { .. } | ReconcileEvent::IpResolved { .. } => {
                ReconcileState::Init
            }
            ReconcileEvent::ZoneResolved { .. } => ReconcileState::ZoneResolved,
            ReconcileEvent::RecordFetched { .. } => ReconcileState::RecordFetched,
            ReconcileEvent::Compared { .. } => ReconcileState::Compared,
            ReconcileEvent::Finished { outcome } => outcome.state(),
            ReconcileEvent::Failed { .. } => ReconcileState::Failed,
        }
    }
}

/// One-shot DDNS reconciler
///
/// Owns the IP source and provider for a single run. A run never retries;
/// the external scheduler that invokes the program is the retry mechanism.
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Call [`Reconciler::run()`] once per invocation
/// 3. Inspect the returned [`Outcome`] or error
pub struct Reconciler {
    /// IP source for the desired value
    ip_source: Box<dyn IpSource>,

    /// DNS provider holding the actual value
    provider: Box<dyn DnsProvider>,

    /// The managed record
    target: RecordTarget,

    /// Perform every read but skip the update
    dry_run: bool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ReconcileEvent>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where event_receiver yields
    /// one event per completed phase. The receiver may be dropped.
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        target: RecordTarget,
    ) -> (Self, mpsc::Receiver<ReconcileEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let reconciler = Self {
            ip_source,
            provider,
            target,
            dry_run: false,
            event_tx: tx,
        };

        (reconciler, rx)
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run one reconciliation
    ///
    /// # Returns
    ///
    /// - `Ok(Outcome)`: UpToDate, Updated, or DryRun
    /// - `Err(Error)`: Failed; the error names the phase that failed
    pub async fn run(&self) -> Result<Outcome> {
        info!(
            "Reconciling {} record {} in {} via {}{}",
            self.target.record_type,
            self.target.record_name,
            self.target.domain_name,
            self.provider.provider_name(),
            if self.dry_run { " [DRY-RUN]" } else { "" }
        );
        self.emit_event(ReconcileEvent::Started {
            record_name: self.target.record_name.clone(),
            provider: self.provider.provider_name(),
        });

        match self.reconcile().await {
            Ok(outcome) => {
                self.emit_event(ReconcileEvent::Finished {
                    outcome: outcome.clone(),
                });
                Ok(outcome)
            }
            Err(e) => {
                error!("Reconciliation failed: {}", e);
                self.emit_event(ReconcileEvent::Failed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn reconcile(&self) -> Result<Outcome> {
        // The two reads are independent; the update waits for both.
        let (ip, lookup) = tokio::join!(self.resolve_ip(), self.fetch_record());
        let (zone, record) = lookup?;
        let ip = ip?;

        let desired = ip.to_string();
        let needs_update = record.value != desired;
        self.emit_event(ReconcileEvent::Compared {
            current: record.value.clone(),
            desired: desired.clone(),
            needs_update,
        });

        if !needs_update {
            info!("IP address is already up to date: {}", record.value);
            return Ok(Outcome::UpToDate {
                value: record.value,
            });
        }

        info!(
            "{} DNS record: {} -> {} (was: {})",
            if self.dry_run { "Would update" } else { "Updating" },
            self.target.record_name,
            desired,
            record.value
        );

        if self.dry_run {
            return Ok(Outcome::DryRun {
                previous: record.value,
                desired,
            });
        }

        self.apply_update(&zone, record, desired).await
    }

    /// Resolve the external IP
    async fn resolve_ip(&self) -> Result<Ipv4Addr> {
        let ip = self.ip_source.current().await?;
        info!("External IP resolved: {} (via {})", ip, self.ip_source.source_name());
        self.emit_event(ReconcileEvent::IpResolved { ip });
        Ok(ip)
    }

    /// Resolve the zone, then find the record in it
    async fn fetch_record(&self) -> Result<(Zone, DnsRecord)> {
        let zone = self.provider.resolve_zone(&self.target.domain_name).await?;
        info!("Zone resolved: {} (id: {})", zone.name, zone.id);
        self.emit_event(ReconcileEvent::ZoneResolved {
            zone_id: zone.id.clone(),
            zone_name: zone.name.clone(),
        });

        let record = self.provider.find_record(&zone, &self.target).await?;
        info!(
            "Record found: {} {} = {} (id: {})",
            record.name, record.record_type, record.value, record.id
        );
        self.emit_event(ReconcileEvent::RecordFetched {
            record_id: record.id.clone(),
            value: record.value.clone(),
        });

        Ok((zone, record))
    }

    /// Perform the single update call
    async fn apply_update(
        &self,
        zone: &Zone,
        mut record: DnsRecord,
        desired: String,
    ) -> Result<Outcome> {
        if let Some(ttl) = self.target.ttl {
            record.ttl = Some(ttl);
        }

        match self.provider.update_record(zone, &record, &desired).await {
            Ok(()) => {
                info!(
                    "DNS record updated successfully: {} -> {}",
                    self.target.record_name, desired
                );
                Ok(Outcome::Updated {
                    previous: record.value,
                    current: desired,
                    duplicate: false,
                })
            }
            Err(e) if e.is_duplicate() => {
                info!(
                    "The DNS record already holds {} (reported by {}), treating as updated",
                    desired,
                    self.provider.provider_name()
                );
                debug!("Duplicate signal: {}", e);
                Ok(Outcome::Updated {
                    previous: record.value,
                    current: desired,
                    duplicate: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Emit a reconciler event
    fn emit_event(&self, event: ReconcileEvent) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.event_tx.try_send(event) {
            warn!("Event channel full, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_states() {
        let up_to_date = Outcome::UpToDate {
            value: "1.2.3.4".to_string(),
        };
        let updated = Outcome::Updated {
            previous: "1.2.3.4".to_string(),
            current: "5.6.7.8".to_string(),
            duplicate: false,
        };

        assert_eq!(up_to_date.state(), ReconcileState::UpToDate);
        assert_eq!(updated.state(), ReconcileState::Updated);
        assert!(updated.state().is_terminal());
        assert!(!ReconcileState::Compared.is_terminal());
    }

    #[test]
    fn test_event_states() {
        let event = ReconcileEvent::Failed {
            error: "Not found: record".to_string(),
        };
        assert_eq!(event.state(), ReconcileState::Failed);
        assert_eq!(event.clone(), event);
    }
}

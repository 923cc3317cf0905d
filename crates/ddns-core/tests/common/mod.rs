//! Test doubles and common utilities for reconciler contract tests
//!
//! The doubles record every call so tests can assert on how many reads
//! and mutations a run performed.

#![allow(dead_code)]

use ddns_core::config::RecordTarget;
use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, DnsRecord, IpSource, Zone};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An IpSource that always returns the same address
pub struct StaticIpSource {
    ip: Ipv4Addr,
    call_count: Arc<AtomicUsize>,
}

impl StaticIpSource {
    pub fn new(ip: Ipv4Addr) -> Self {
        Self {
            ip,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared handle to the current() call counter
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.call_count)
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip)
    }

    fn source_name(&self) -> &str {
        "static"
    }
}

/// An IpSource whose every call fails with a network error
pub struct FailingIpSource;

#[async_trait::async_trait]
impl IpSource for FailingIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        Err(Error::network("IP echo service unreachable"))
    }

    fn source_name(&self) -> &str {
        "failing"
    }
}

/// How the mock provider answers update_record
#[derive(Debug, Clone)]
pub enum UpdateBehavior {
    /// Store the value and succeed
    Succeed,
    /// Reject with a duplicate-value signal (value is stored anyway)
    Duplicate,
    /// Reject with a provider error carrying this status
    Reject(u16),
}

/// Provider-side state, shared so successive runs see earlier updates
#[derive(Debug, Default)]
pub struct ProviderState {
    pub zones: Vec<Zone>,
    pub records: Vec<DnsRecord>,
    pub updates: Vec<(String, String, Option<u32>)>,
    pub find_calls: usize,
}

/// A configurable in-memory DnsProvider
#[derive(Clone)]
pub struct MockDnsProvider {
    state: Arc<Mutex<ProviderState>>,
    behavior: UpdateBehavior,
}

impl MockDnsProvider {
    /// A provider owning `example.com` with the given records
    pub fn new(records: Vec<DnsRecord>) -> Self {
        let state = ProviderState {
            zones: vec![Zone::new("zone-1", "example.com")],
            records,
            ..Default::default()
        };

        Self {
            state: Arc::new(Mutex::new(state)),
            behavior: UpdateBehavior::Succeed,
        }
    }

    /// A provider owning `example.com` with one A record `home` = `value`
    pub fn with_home_record(value: &str) -> Self {
        Self::new(vec![a_record("rec-1", "home", value)])
    }

    /// Change how update_record responds
    pub fn with_behavior(mut self, behavior: UpdateBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Remove every zone
    pub fn without_zones(self) -> Self {
        self.state.lock().unwrap().zones.clear();
        self
    }

    /// Number of update_record calls so far
    pub fn update_count(&self) -> usize {
        self.state.lock().unwrap().updates.len()
    }

    /// Number of find_record calls so far
    pub fn find_count(&self) -> usize {
        self.state.lock().unwrap().find_calls
    }

    /// (record id, value, ttl) of every update_record call
    pub fn updates(&self) -> Vec<(String, String, Option<u32>)> {
        self.state.lock().unwrap().updates.clone()
    }

    /// Current stored value of a record
    pub fn value_of(&self, record_id: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|r| r.id == record_id)
            .map(|r| r.value.clone())
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn resolve_zone(&self, domain_name: &str) -> Result<Zone> {
        let state = self.state.lock().unwrap();
        state
            .zones
            .iter()
            .find(|z| z.name == domain_name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("Zone not found: {}", domain_name)))
    }

    async fn find_record(&self, _zone: &Zone, target: &RecordTarget) -> Result<DnsRecord> {
        let mut state = self.state.lock().unwrap();
        state.find_calls += 1;
        state
            .records
            .iter()
            .find(|r| r.name == target.record_name && r.record_type == target.record_type)
            .cloned()
            .ok_or_else(|| {
                Error::not_found(format!(
                    "Record not found: {} ({})",
                    target.record_name, target.record_type
                ))
            })
    }

    async fn update_record(&self, _zone: &Zone, record: &DnsRecord, new_value: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .updates
            .push((record.id.clone(), new_value.to_string(), record.ttl));

        match self.behavior {
            UpdateBehavior::Reject(status) => {
                return Err(Error::provider_status("mock", status, "update rejected"));
            }
            UpdateBehavior::Succeed | UpdateBehavior::Duplicate => {}
        }

        if let Some(stored) = state.records.iter_mut().find(|r| r.id == record.id) {
            stored.value = new_value.to_string();
        }

        match self.behavior {
            UpdateBehavior::Duplicate => Err(Error::duplicate_value("mock", new_value)),
            _ => Ok(()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Build an A record snapshot
pub fn a_record(id: &str, name: &str, value: &str) -> DnsRecord {
    DnsRecord::new(id, name, "A", value)
}

/// The target used by most scenarios: `home.example.com` A
pub fn home_target() -> RecordTarget {
    RecordTarget::new("example.com", "home", "A")
}

//! Architectural Contract Test: Phase Events
//!
//! This test verifies that the reconciler reports each completed phase
//! on its event channel, in order, and ends with exactly one terminal event.
//!
//! Constraints verified:
//! - Zone resolution precedes record fetch, which precedes comparison
//! - Every run ends with one Finished or Failed event
//! - A dry run never reports the record as up to date
//! - A dropped receiver never fails the run

mod common;

use common::*;
use ddns_core::{ReconcileEvent, ReconcileState, Reconciler};
use std::net::Ipv4Addr;
use tokio::sync::mpsc;

fn drain(rx: &mut mpsc::Receiver<ReconcileEvent>) -> Vec<ReconcileEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn position(events: &[ReconcileEvent], state: ReconcileState) -> Option<usize> {
    events.iter().position(|e| e.state() == state)
}

#[tokio::test]
async fn successful_update_emits_ordered_phases() {
    let provider = MockDnsProvider::with_home_record("1.2.3.4");
    let (reconciler, mut event_rx) = Reconciler::new(
        Box::new(StaticIpSource::new(Ipv4Addr::new(5, 6, 7, 8))),
        Box::new(provider),
        home_target(),
    );

    reconciler.run().await.expect("run succeeds");
    let events = drain(&mut event_rx);

    assert!(matches!(
        events.first(),
        Some(ReconcileEvent::Started { provider: "mock", .. })
    ));
    assert!(events.contains(&ReconcileEvent::IpResolved {
        ip: Ipv4Addr::new(5, 6, 7, 8)
    }));

    let zone = position(&events, ReconcileState::ZoneResolved).expect("zone event");
    let record = position(&events, ReconcileState::RecordFetched).expect("record event");
    let compared = position(&events, ReconcileState::Compared).expect("compare event");
    assert!(zone < record && record < compared);

    assert_eq!(
        events[compared],
        ReconcileEvent::Compared {
            current: "1.2.3.4".to_string(),
            desired: "5.6.7.8".to_string(),
            needs_update: true,
        }
    );

    let last = events.last().expect("terminal event");
    assert_eq!(last.state(), ReconcileState::Updated);
    assert_eq!(
        events.iter().filter(|e| e.state().is_terminal()).count(),
        1,
        "exactly one terminal event"
    );
}

#[tokio::test]
async fn failed_lookup_emits_failed_without_compare() {
    let provider = MockDnsProvider::new(Vec::new());
    let (reconciler, mut event_rx) = Reconciler::new(
        Box::new(StaticIpSource::new(Ipv4Addr::new(5, 6, 7, 8))),
        Box::new(provider),
        home_target(),
    );

    reconciler.run().await.expect_err("record missing");
    let events = drain(&mut event_rx);

    assert!(position(&events, ReconcileState::ZoneResolved).is_some());
    assert!(position(&events, ReconcileState::RecordFetched).is_none());
    assert!(position(&events, ReconcileState::Compared).is_none());
    assert!(matches!(events.last(), Some(ReconcileEvent::Failed { .. })));
}

#[tokio::test]
async fn dry_run_ends_in_its_own_terminal_state() {
    let provider = MockDnsProvider::with_home_record("1.2.3.4");
    let (reconciler, mut event_rx) = Reconciler::new(
        Box::new(StaticIpSource::new(Ipv4Addr::new(5, 6, 7, 8))),
        Box::new(provider),
        home_target(),
    );

    let outcome = reconciler
        .with_dry_run(true)
        .run()
        .await
        .expect("dry run succeeds");
    let events = drain(&mut event_rx);

    assert_eq!(outcome.state(), ReconcileState::DryRun);

    let last = events.last().expect("terminal event");
    assert_eq!(last.state(), ReconcileState::DryRun);
    assert_ne!(last.state(), ReconcileState::UpToDate);
    assert!(last.state().is_terminal());
    assert!(position(&events, ReconcileState::UpToDate).is_none());
}

#[tokio::test]
async fn dropped_receiver_does_not_fail_run() {
    let provider = MockDnsProvider::with_home_record("1.2.3.4");
    let (reconciler, event_rx) = Reconciler::new(
        Box::new(StaticIpSource::new(Ipv4Addr::new(1, 2, 3, 4))),
        Box::new(provider),
        home_target(),
    );
    drop(event_rx);

    let outcome = reconciler.run().await.expect("run succeeds");
    assert_eq!(outcome.state(), ReconcileState::UpToDate);
}

//! End-to-end discovery scenarios against fake, in-memory collaborators.
//! No SSH/Telnet/SQL Server touched: `FakeCollector` and `FakeStore` are
//! trait objects standing in for `SessionDeviceCollector` and
//! `netwalker_store::InventoryStore`, so the scheduling loop, frontier
//! dedup, filter stages, and placeholder/disposition bookkeeping can be
//! exercised deterministically.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use netwalker_connection::Credentials;
use netwalker_engine::{
    CollectOutcome, DeviceCollector, DiscoveryEngine, EngineConfig, EngineEvent, EventSink,
    InventoryWriter, SessionLeakMonitor, TracingEventSink,
};
use netwalker_filter::FilterCriteria;
use netwalker_types::{Capability, DeviceReport, DeviceStatus, DiscoveryProtocol, Endpoint, Neighbor, Platform};

#[derive(Clone)]
enum FakeOutcome {
    Report(DeviceReport),
    ConnectFailed(String),
}

/// Canned per-device outcomes, keyed by identity key. Records every
/// identity key it was asked to collect, so tests can assert a coarsely
/// filtered device was never dialed.
#[derive(Default)]
struct FakeCollector {
    outcomes: Mutex<HashMap<String, FakeOutcome>>,
    attempts: Mutex<Vec<String>>,
}

impl FakeCollector {
    fn set(&self, key: &str, outcome: FakeOutcome) {
        self.outcomes.lock().unwrap().insert(key.to_string(), outcome);
    }

    fn attempted(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

impl DeviceCollector for FakeCollector {
    fn collect(&self, endpoint: &Endpoint, _credentials: &Credentials) -> CollectOutcome {
        let key = endpoint.identity_key();
        self.attempts.lock().unwrap().push(key.clone());
        match self.outcomes.lock().unwrap().get(&key) {
            Some(FakeOutcome::Report(report)) => CollectOutcome::Report(Box::new(report.clone())),
            Some(FakeOutcome::ConnectFailed(reason)) => CollectOutcome::ConnectFailed(reason.clone()),
            None => CollectOutcome::ConnectFailed(format!("no fake outcome registered for {key}")),
        }
    }
}

/// Generates an unbounded linear neighbor chain N0 -> N1 -> N2 -> ...,
/// for exercising deadline-reset exhaustion without precomputing an
/// arbitrarily large outcome table.
struct ChainCollector;

impl DeviceCollector for ChainCollector {
    fn collect(&self, endpoint: &Endpoint, _credentials: &Credentials) -> CollectOutcome {
        let key = endpoint.identity_key();
        let index: u32 = key.trim_start_matches('n').parse().unwrap_or(0);
        let next = index + 1;
        let next_hostname = format!("N{next}");
        let next_ip = Ipv4Addr::new(10, 0, (next / 256) as u8, (next % 256) as u8);
        let report = device_report(
            &format!("N{index}"),
            vec![neighbor(&next_hostname, next_ip, "Gi0/1", "Gi0/2")],
        );
        CollectOutcome::Report(Box::new(report))
    }
}

#[derive(Default)]
struct FakeStore {
    reports: Mutex<Vec<DeviceReport>>,
    dispositions: Mutex<Vec<(String, DeviceStatus)>>,
}

#[async_trait::async_trait]
impl InventoryWriter for FakeStore {
    async fn store_report(&self, report: &DeviceReport) -> anyhow::Result<()> {
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }

    async fn record_disposition(
        &self,
        hostname: &str,
        status: &DeviceStatus,
        _now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.dispositions
            .lock()
            .unwrap()
            .push((hostname.to_string(), status.clone()));
        Ok(())
    }
}

struct NoopLeakMonitor;

impl SessionLeakMonitor for NoopLeakMonitor {
    fn total_live_sessions(&self) -> u32 {
        0
    }

    fn close_all(&self, _deadline: Duration) {}
}

#[derive(Default)]
struct RecordingEventSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn credentials() -> Credentials {
    Credentials {
        username: "admin".to_string(),
        password: "admin".to_string(),
        enable_password: None,
    }
}

fn neighbor(remote_hostname: &str, remote_ip: Ipv4Addr, local_interface: &str, remote_interface: &str) -> Neighbor {
    Neighbor {
        remote_hostname: remote_hostname.to_string(),
        remote_ip: Some(remote_ip),
        local_interface: local_interface.to_string(),
        remote_interface: remote_interface.to_string(),
        platform: None,
        capabilities: vec![Capability::Switch],
        protocol: DiscoveryProtocol::Cdp,
    }
}

fn device_report(hostname: &str, neighbors: Vec<Neighbor>) -> DeviceReport {
    DeviceReport {
        hostname: hostname.to_string(),
        platform: Platform::Ios,
        software_version: "15.2(7)E3".to_string(),
        serial_numbers: vec![format!("{hostname}-SERIAL")],
        hardware_model: "WS-C3560CX-8PC-S".to_string(),
        uptime: None,
        interfaces: Vec::new(),
        vlans: Vec::new(),
        neighbors,
        prefixes: Vec::new(),
        prefix_summaries: Vec::new(),
        prefix_exceptions: Vec::new(),
        stack_members: Vec::new(),
        primary_ip: None,
        collected_at: Utc::now(),
        partial: false,
    }
}

#[tokio::test]
async fn scenario_a_seed_only_filtered_never_dials_out() {
    let collector = Arc::new(FakeCollector::default());
    let store = Arc::new(FakeStore::default());
    let filter = FilterCriteria {
        exclude_hostnames: vec!["*-PHONE-*".to_string()],
        ..Default::default()
    };
    let config = EngineConfig {
        max_depth: 0,
        ..Default::default()
    };
    let engine = DiscoveryEngine::with_collaborators(
        collector.clone(),
        Arc::new(NoopLeakMonitor),
        credentials(),
        filter,
        store.clone(),
        config,
        Arc::new(TracingEventSink),
    );

    let seed = Endpoint::new("LAB-PHONE-01").with_ip("10.1.1.50".parse().unwrap());
    let summary = engine.run(vec![seed]).await;

    assert_eq!(summary.completed, 1);
    assert!(
        collector.attempted().is_empty(),
        "a coarsely filtered seed must never reach the connection attempt stage"
    );

    let dispositions = store.dispositions.lock().unwrap();
    assert_eq!(dispositions.len(), 1);
    assert!(store.reports.lock().unwrap().is_empty());
    let (hostname, status) = &dispositions[0];
    assert_eq!(hostname, "lab-phone-01");
    match status {
        DeviceStatus::Filtered { reason } => assert!(reason.to_lowercase().contains("hostname")),
        other => panic!("expected Filtered, got {other:?}"),
    }
}

#[tokio::test]
async fn scenario_b_two_hop_chain_visits_each_device_once() {
    let collector = Arc::new(FakeCollector::default());
    collector.set(
        "a",
        FakeOutcome::Report(device_report(
            "A",
            vec![neighbor("B", Ipv4Addr::new(10, 0, 0, 2), "Gi0/1", "Gi0/2")],
        )),
    );
    collector.set(
        "b",
        FakeOutcome::Report(device_report(
            "B",
            vec![
                neighbor("A", Ipv4Addr::new(10, 0, 0, 1), "Gi0/2", "Gi0/1"),
                neighbor("C", Ipv4Addr::new(10, 0, 0, 3), "Gi0/3", "Gi0/1"),
            ],
        )),
    );
    collector.set(
        "c",
        FakeOutcome::Report(device_report(
            "C",
            vec![neighbor("B", Ipv4Addr::new(10, 0, 0, 2), "Gi0/1", "Gi0/3")],
        )),
    );

    let store = Arc::new(FakeStore::default());
    let config = EngineConfig {
        max_depth: 2,
        ..Default::default()
    };
    let engine = DiscoveryEngine::with_collaborators(
        collector,
        Arc::new(NoopLeakMonitor),
        credentials(),
        FilterCriteria::default(),
        store.clone(),
        config,
        Arc::new(TracingEventSink),
    );

    let seed = Endpoint::new("A").with_ip(Ipv4Addr::new(10, 0, 0, 1));
    let summary = engine.run(vec![seed]).await;

    assert_eq!(summary.completed, 3, "A, B, and C are each dispatched exactly once");
    assert!(store.dispositions.lock().unwrap().is_empty());

    let reports = store.reports.lock().unwrap();
    let mut hostnames: Vec<&str> = reports.iter().map(|r| r.hostname.as_str()).collect();
    hostnames.sort_unstable();
    assert_eq!(hostnames, vec!["A", "B", "C"]);

    // Each side of an adjacency reports it independently (A->B, B->A,
    // B->C, C->B): four raw observations. Collapsing that to the two
    // canonical link rows is the Inventory Store's job (canonical
    // direction dedup in `upsert_neighbor`), not the engine's.
    let raw_adjacencies: usize = reports.iter().map(|r| r.neighbors.len()).sum();
    assert_eq!(raw_adjacencies, 4);
}

#[tokio::test]
async fn scenario_c_placeholder_is_promoted_on_a_later_run() {
    let store = Arc::new(FakeStore::default());

    let first_run_collector = Arc::new(FakeCollector::default());
    first_run_collector.set(
        "a",
        FakeOutcome::Report(device_report(
            "A",
            vec![neighbor("B-SW01", Ipv4Addr::new(10, 0, 0, 2), "Gi0/1", "Gi0/2")],
        )),
    );
    first_run_collector.set("b-sw01", FakeOutcome::ConnectFailed("connection refused".to_string()));

    let engine = DiscoveryEngine::with_collaborators(
        first_run_collector,
        Arc::new(NoopLeakMonitor),
        credentials(),
        FilterCriteria::default(),
        store.clone(),
        EngineConfig {
            max_depth: 2,
            ..Default::default()
        },
        Arc::new(TracingEventSink),
    );
    let seed = Endpoint::new("A").with_ip(Ipv4Addr::new(10, 0, 0, 1));
    let summary = engine.run(vec![seed]).await;
    assert_eq!(summary.completed, 2);

    {
        let reports = store.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].hostname, "A");
    }
    {
        let dispositions = store.dispositions.lock().unwrap();
        assert_eq!(dispositions.len(), 1);
        let (hostname, status) = &dispositions[0];
        assert_eq!(hostname, "b-sw01");
        assert!(matches!(status, DeviceStatus::ConnectFailed { .. }));
    }

    // Re-run with credentials that now reach B-SW01. A fresh engine means
    // a fresh frontier, exactly as a second invocation of the crawl would.
    let second_run_collector = Arc::new(FakeCollector::default());
    second_run_collector.set(
        "a",
        FakeOutcome::Report(device_report(
            "A",
            vec![neighbor("B-SW01", Ipv4Addr::new(10, 0, 0, 2), "Gi0/1", "Gi0/2")],
        )),
    );
    second_run_collector.set("b-sw01", FakeOutcome::Report(device_report("B-SW01", vec![])));

    let engine = DiscoveryEngine::with_collaborators(
        second_run_collector,
        Arc::new(NoopLeakMonitor),
        credentials(),
        FilterCriteria::default(),
        store.clone(),
        EngineConfig {
            max_depth: 2,
            ..Default::default()
        },
        Arc::new(TracingEventSink),
    );
    let seed = Endpoint::new("A").with_ip(Ipv4Addr::new(10, 0, 0, 1));
    let summary = engine.run(vec![seed]).await;
    assert_eq!(summary.completed, 2);

    let reports = store.reports.lock().unwrap();
    assert_eq!(
        reports.len(),
        2,
        "A is re-walked and B-SW01 is walked for the first time; the store (not the engine) \
         is what collapses this into two device rows total via placeholder promotion"
    );
    assert!(reports.iter().any(|r| r.hostname == "B-SW01"));
}

#[tokio::test]
async fn scenario_f_deadline_resets_are_capped_and_the_crawl_terminates() {
    let store = Arc::new(FakeStore::default());
    let events = Arc::new(RecordingEventSink::default());
    let config = EngineConfig {
        max_depth: u32::MAX,
        max_workers: 1,
        discovery_timeout: Duration::from_millis(20),
        max_deadline_resets: 3,
        ..Default::default()
    };
    let engine = DiscoveryEngine::with_collaborators(
        Arc::new(ChainCollector),
        Arc::new(NoopLeakMonitor),
        credentials(),
        FilterCriteria::default(),
        store,
        config.clone(),
        events.clone(),
    );

    let seed = Endpoint::new("N0").with_ip(Ipv4Addr::new(10, 0, 0, 0));
    // An ever-discovering chain keeps remaining time below the reset
    // threshold every time a device completes; exact tick-by-tick timing
    // is covered precisely (with `std::thread::sleep`) by `deadline.rs`'s
    // own unit tests. This asserts the integration contract: the engine
    // never exceeds the configured reset budget and always terminates.
    let summary = engine.run(vec![seed]).await;

    assert!(summary.deadline_resets <= config.max_deadline_resets);
    assert!(summary.deadline_reached);

    let recorded = events.events.lock().unwrap();
    let reset_events = recorded
        .iter()
        .filter(|event| matches!(event, EngineEvent::DeadlineReset { .. }))
        .count();
    assert_eq!(reset_events as u32, summary.deadline_resets);
    assert!(recorded.iter().any(|event| matches!(event, EngineEvent::DeadlineReached)));
}

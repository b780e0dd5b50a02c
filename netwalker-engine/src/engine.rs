use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinSet;

use netwalker_collector::CollectOptions;
use netwalker_connection::{ConnectOptions, ConnectionManager, Credentials};
use netwalker_filter::FilterCriteria;
use netwalker_types::{Endpoint, PendingNode};

use crate::collect::{DeviceCollector, SessionDeviceCollector, SessionLeakMonitor};
use crate::deadline::Deadline;
use crate::events::{EngineEvent, EventSink, TracingEventSink};
use crate::frontier::Frontier;
use crate::inventory::InventoryWriter;
use crate::worker::{run_worker, WorkerOutcome};

/// Everything about the crawl that does not vary per depth or worker:
/// frontier, criteria, collaborators, and the mutable deadline/drain
/// state. Shared by `Arc` across every spawned worker task.
pub(crate) struct Shared {
    pub(crate) frontier: Frontier,
    pub(crate) filter: FilterCriteria,
    pub(crate) config: EngineConfig,
    pub(crate) collector: Arc<dyn DeviceCollector>,
    pub(crate) credentials: Credentials,
    pub(crate) store: Arc<dyn InventoryWriter>,
    pub(crate) events: Arc<dyn EventSink>,
    pub(crate) leak_monitor: Arc<dyn SessionLeakMonitor>,
    pub(crate) deadline: Mutex<Deadline>,
    pub(crate) draining: AtomicBool,
    pub(crate) completed: AtomicU64,
}

/// Tunables pulled from `discovery.*` configuration (spec §6).
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub max_depth: u32,
    pub max_workers: usize,
    pub discovery_timeout: Duration,
    pub max_deadline_resets: u32,
    /// Poll the connection manager's live-session count every this many
    /// completed devices (spec §4.1: N=10).
    pub leak_poll_every: u32,
    /// Force `close_all` once live sessions exceed this (spec §4.1:
    /// default 5).
    pub leak_threshold: u32,
    pub close_all_deadline: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_workers: 5,
            discovery_timeout: Duration::from_secs(3600),
            max_deadline_resets: 10,
            leak_poll_every: 10,
            leak_threshold: 5,
            close_all_deadline: Duration::from_secs(30),
        }
    }
}

/// Final tally returned from one `run` call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CrawlSummary {
    pub completed: u64,
    pub total_seen: u64,
    pub deadline_resets: u32,
    pub deadline_reached: bool,
}

/// Drives breadth-first traversal with bounded concurrency and a
/// resettable global deadline (spec §4.6). Construct once per crawl; `run`
/// consumes the seed list and returns once the frontier drains or the
/// deadline forces a drain.
pub struct DiscoveryEngine {
    shared: Arc<Shared>,
}

impl DiscoveryEngine {
    /// Production constructor: wires a real SSH/Telnet-backed
    /// `DeviceCollector` on top of the given `ConnectionManager`, and uses
    /// that same manager for leak surveillance.
    pub fn new(
        connection_manager: Arc<ConnectionManager>,
        credentials: Credentials,
        connect_options: ConnectOptions,
        collect_options: CollectOptions,
        filter: FilterCriteria,
        store: Arc<dyn InventoryWriter>,
        config: EngineConfig,
    ) -> Self {
        let collector: Arc<dyn DeviceCollector> = Arc::new(SessionDeviceCollector {
            connection_manager: connection_manager.clone(),
            connect_options,
            collect_options,
        });
        let leak_monitor: Arc<dyn SessionLeakMonitor> = connection_manager;
        Self::with_collaborators(
            collector,
            leak_monitor,
            credentials,
            filter,
            store,
            config,
            Arc::new(TracingEventSink),
        )
    }

    /// Full-control constructor used by tests: every collaborator is
    /// injected, so a crawl can run end to end against deterministic fakes
    /// with no real I/O (spec §14).
    pub fn with_collaborators(
        collector: Arc<dyn DeviceCollector>,
        leak_monitor: Arc<dyn SessionLeakMonitor>,
        credentials: Credentials,
        filter: FilterCriteria,
        store: Arc<dyn InventoryWriter>,
        config: EngineConfig,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let deadline = Deadline::new(config.discovery_timeout, config.max_deadline_resets);
        Self {
            shared: Arc::new(Shared {
                frontier: Frontier::new(),
                filter,
                config,
                collector,
                credentials,
                store,
                events,
                leak_monitor,
                deadline: Mutex::new(deadline),
                draining: AtomicBool::new(false),
                completed: AtomicU64::new(0),
            }),
        }
    }

    /// Runs the crawl to completion: seeds the frontier, drains it with up
    /// to `max_workers` concurrent workers, and returns once nothing is
    /// left in flight and nothing remains queued (or the deadline forced
    /// a drain and every in-flight worker has since finished).
    pub async fn run(&self, seeds: Vec<Endpoint>) -> CrawlSummary {
        for endpoint in seeds {
            self.shared.frontier.try_enqueue(PendingNode::seed(endpoint));
        }

        let mut workers: JoinSet<WorkerOutcome> = JoinSet::new();

        loop {
            self.check_deadline();

            if !self.shared.draining.load(Ordering::Relaxed) {
                while workers.len() < self.shared.config.max_workers {
                    let Some(node) = self.shared.frontier.pop() else {
                        break;
                    };
                    let shared = self.shared.clone();
                    workers.spawn(run_worker(shared, node));
                }
            }

            if workers.is_empty() {
                if self.shared.frontier.is_empty() || self.shared.draining.load(Ordering::Relaxed) {
                    break;
                }
                // Nothing in flight yet the frontier is non-empty and we
                // are not draining: spin once more to pick it up.
                continue;
            }

            if let Some(result) = workers.join_next().await {
                self.handle_worker_result(result);
            }
        }

        let completed = self.shared.completed.load(Ordering::Relaxed);
        let total_seen = self.shared.frontier.total_seen();
        let deadline_state = self.shared.deadline.lock().unwrap();
        CrawlSummary {
            completed,
            total_seen,
            deadline_resets: deadline_state.resets_used(),
            deadline_reached: deadline_state.expired(),
        }
    }

    /// Signals external cancellation: the engine enters drain mode
    /// exactly as it would on deadline exhaustion (spec §5 "On external
    /// cancellation").
    pub fn cancel(&self) {
        if !self.shared.draining.swap(true, Ordering::Relaxed) {
            self.shared.events.emit(EngineEvent::Draining {
                reason: "external cancellation",
            });
        }
    }

    fn check_deadline(&self) {
        let expired = self.shared.deadline.lock().unwrap().expired();
        if expired && !self.shared.draining.swap(true, Ordering::Relaxed) {
            self.shared.events.emit(EngineEvent::DeadlineReached);
        }
    }

    fn handle_worker_result(&self, result: Result<WorkerOutcome, tokio::task::JoinError>) {
        let outcome = result.unwrap_or(WorkerOutcome { queued_new: false });
        let completed = self.shared.completed.fetch_add(1, Ordering::Relaxed) + 1;

        if outcome.queued_new && !self.shared.draining.load(Ordering::Relaxed) {
            let mut deadline = self.shared.deadline.lock().unwrap();
            if deadline.maybe_reset() {
                self.shared.events.emit(EngineEvent::DeadlineReset {
                    resets_used: deadline.resets_used(),
                    resets_allowed: self.shared.config.max_deadline_resets,
                });
            }
        }

        let leak_poll_every = u64::from(self.shared.config.leak_poll_every.max(1));
        if completed % leak_poll_every == 0 {
            let live = self.shared.leak_monitor.total_live_sessions();
            if live > self.shared.config.leak_threshold {
                self.shared.events.emit(EngineEvent::SessionLeakPurge {
                    live_sessions: live,
                    threshold: self.shared.config.leak_threshold,
                });
                self.shared
                    .leak_monitor
                    .close_all(self.shared.config.close_all_deadline);
            }
        }

        let total_seen = self.shared.frontier.total_seen();
        let remaining_in_frontier = self.shared.frontier.len() as u64;
        let percent_complete = if total_seen == 0 {
            100.0
        } else {
            (completed as f64 / total_seen as f64) * 100.0
        };
        self.shared.events.emit(EngineEvent::Progress {
            completed,
            total_seen,
            percent_complete,
            remaining_in_frontier,
        });
    }
}

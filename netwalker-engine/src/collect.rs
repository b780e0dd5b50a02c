//! The engine's seam onto the Connection Manager and Device Collector. A
//! `DeviceCollector` implementation owns the blocking transport work for
//! one device end to end (open, run the command sequence, close) so a
//! `Session` never crosses an `.await` point. Production code runs the
//! real implementation inside `spawn_blocking`; tests substitute a fake
//! that returns canned outcomes with no I/O at all.

use std::sync::Arc;
use std::time::Duration;

use netwalker_collector::CollectOptions;
use netwalker_connection::{ConnectOptions, ConnectionManager, Credentials};
use netwalker_types::{DeviceReport, Endpoint};

/// The result of attempting to collect one device, already classified
/// into the terminal dispositions spec §7 distinguishes.
pub enum CollectOutcome {
    Report(Box<DeviceReport>),
    ConnectFailed(String),
    CollectFailed(String),
}

/// Drives one device's connect-and-collect sequence. Implementations must
/// not suspend except inside whatever blocking call they choose to make;
/// the engine calls this from within `spawn_blocking`.
pub trait DeviceCollector: Send + Sync {
    fn collect(&self, endpoint: &Endpoint, credentials: &Credentials) -> CollectOutcome;
}

/// Production implementation: opens a session through the
/// `ConnectionManager`, runs the fixed command sequence through
/// `netwalker_collector::collect_device`, and closes the session
/// regardless of outcome.
pub struct SessionDeviceCollector {
    pub connection_manager: Arc<ConnectionManager>,
    pub connect_options: ConnectOptions,
    pub collect_options: CollectOptions,
}

impl DeviceCollector for SessionDeviceCollector {
    fn collect(&self, endpoint: &Endpoint, credentials: &Credentials) -> CollectOutcome {
        let mut session = match self
            .connection_manager
            .open(endpoint, credentials, &self.connect_options)
        {
            Ok(session) => session,
            Err(err) => return CollectOutcome::ConnectFailed(err.to_string()),
        };

        let result = netwalker_collector::collect_device(&mut session, &self.collect_options);
        self.connection_manager.close(session);

        match result {
            Ok(mut report) => {
                report.primary_ip = endpoint.primary_ip.filter(|ip| !ip.is_unspecified());
                CollectOutcome::Report(Box::new(report))
            }
            Err(err) => CollectOutcome::CollectFailed(err.to_string()),
        }
    }
}

/// The engine's view onto `ConnectionManager`'s leak surveillance: polled
/// every N processed devices, and forced closed past a threshold (spec
/// §4.1 "Leak surveillance"). A trait so tests can substitute a fake that
/// never claims a leak.
pub trait SessionLeakMonitor: Send + Sync {
    fn total_live_sessions(&self) -> u32;
    fn close_all(&self, deadline: Duration);
}

impl SessionLeakMonitor for ConnectionManager {
    fn total_live_sessions(&self) -> u32 {
        self.total_live_sessions()
    }

    fn close_all(&self, deadline: Duration) {
        self.close_all(deadline)
    }
}

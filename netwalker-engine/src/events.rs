//! Structured progress and lifecycle events. Per spec §1, the core only
//! emits these; formatting and banner printing is an external sink's job.
//! The default sink routes them through `tracing`, leaving presentation to
//! whatever subscriber the binary installs.

use tracing::info;

/// One emitted engine lifecycle event.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    /// Emitted after each worker completes.
    Progress {
        completed: u64,
        total_seen: u64,
        percent_complete: f64,
        remaining_in_frontier: u64,
    },
    /// A deadline reset was granted; `resets_used` already reflects this
    /// one.
    DeadlineReset { resets_used: u32, resets_allowed: u32 },
    /// The global deadline was reached; the engine enters drain mode.
    DeadlineReached,
    /// Entered drain mode for a reason other than deadline exhaustion
    /// (external cancellation).
    Draining { reason: &'static str },
    /// `close_all` was invoked as a safety purge because the live-session
    /// count exceeded the configured threshold.
    SessionLeakPurge { live_sessions: u32, threshold: u32 },
}

/// Receives `EngineEvent`s as the crawl progresses. Implement this to wire
/// the core up to a real logging/metrics sink; the default
/// `TracingEventSink` just logs.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Default sink: every event becomes one `tracing::info!` call.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::Progress {
                completed,
                total_seen,
                percent_complete,
                remaining_in_frontier,
            } => {
                info!(
                    completed,
                    total_seen,
                    percent_complete,
                    remaining_in_frontier,
                    "discovery progress"
                );
            }
            EngineEvent::DeadlineReset {
                resets_used,
                resets_allowed,
            } => {
                info!(resets_used, resets_allowed, "discovery deadline reset");
            }
            EngineEvent::DeadlineReached => {
                info!("discovery deadline reached, entering drain mode");
            }
            EngineEvent::Draining { reason } => {
                info!(reason, "discovery entering drain mode");
            }
            EngineEvent::SessionLeakPurge {
                live_sessions,
                threshold,
            } => {
                info!(live_sessions, threshold, "session leak purge triggered");
            }
        }
    }
}

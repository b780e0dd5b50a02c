//! Bounded-concurrency breadth-first discovery scheduling. Owns the
//! frontier, the resettable deadline, and the per-device worker body, and
//! drives both the blocking connect/collect path and the async store
//! writes to completion. CLI wiring, credential sourcing, and report
//! rendering live outside this crate.

mod collect;
mod deadline;
mod engine;
mod events;
mod frontier;
mod inventory;
mod worker;

pub use collect::{CollectOutcome, DeviceCollector, SessionDeviceCollector, SessionLeakMonitor};
pub use engine::{CrawlSummary, DiscoveryEngine, EngineConfig};
pub use events::{EngineEvent, EventSink, TracingEventSink};
pub use inventory::InventoryWriter;

//! Parsing for the two on-disk text formats the core consumes regardless of
//! who produces them. CLI/argument parsing and credential loading live
//! outside this crate; `Credentials` itself is re-exported from
//! `netwalker-types`, which is where every crate that authenticates a
//! session agrees on its shape.

mod config;
mod seeds;

pub use config::{parse_config, Config, ConfigError, DiscoveryProtocol, PreferredTransport};
pub use netwalker_types::Credentials;
pub use seeds::{parse_seed_file, SeedEntry};

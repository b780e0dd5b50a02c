//! Interactive CLI session management: opening SSH sessions with a Telnet
//! fallback, running commands against an open session, and tearing
//! sessions down within a bounded deadline.
//!
//! The Discovery Engine never shares a `Session` across workers and never
//! holds one past the end of a single device's collection. This crate's
//! job is to make opening, using, and closing that session safe even when
//! the remote device hangs mid-command or the transport drops.

mod error;
mod manager;
mod session;

pub use error::{ConnectError, ExecError};
pub use manager::{ConnectOptions, ConnectionManager, PreferredTransport};
pub use netwalker_types::Credentials;
pub use session::{Session, SessionState};

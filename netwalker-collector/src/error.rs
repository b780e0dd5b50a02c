use thiserror::Error;

/// A terminal failure of the whole device collection. Anything less than
/// this produces a `partial` report instead of an error.
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("show version failed: {0}")]
    VersionUnavailable(String),
    #[error("show version output could not be parsed into a device identity")]
    IdentityUnparseable,
    #[error("session broken mid-collection: {0}")]
    SessionBroken(String),
}

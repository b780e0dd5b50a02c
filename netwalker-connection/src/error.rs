use std::time::Duration;

use thiserror::Error;

/// Why `open` could not produce a `Session`. Both transports are tried in
/// order before this is returned to the caller.
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("connection refused on both ssh and telnet")]
    ConnectRefused,
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),
    #[error("authentication rejected: {0}")]
    AuthRejected(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Why a single command failed during `execute`. The collector may retry a
/// command once on `Timeout` or `Eof` before abandoning it; `PromptLost`
/// means the session's state machine can no longer be trusted and the
/// session should be closed.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("command timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection closed before a prompt was seen (eof)")]
    Eof,
    #[error("prompt lost: {0}")]
    PromptLost(String),
}

use std::time::Duration;

use netwalker_connection::{ExecError, Session};

/// Runs `command`, retrying once if the first attempt failed with a
/// retryable error (`Timeout` or `Eof`). `PromptLost` means the session's
/// state machine can no longer be trusted, so it is never retried.
pub fn run_with_retry(
    session: &mut Session,
    command: &str,
    read_timeout: Duration,
) -> Result<String, ExecError> {
    match session.execute(command, read_timeout) {
        Ok(text) => Ok(text),
        Err(ExecError::PromptLost(msg)) => Err(ExecError::PromptLost(msg)),
        Err(_) => session.execute(command, read_timeout),
    }
}

/// Runs `command` once and discards the result, for best-effort steps like
/// `terminal length 0` where failure carries no consequence.
pub fn run_best_effort(session: &mut Session, command: &str, read_timeout: Duration) {
    let _ = session.execute(command, read_timeout);
}

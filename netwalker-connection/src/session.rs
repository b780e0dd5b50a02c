use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use regex::Regex;
use std::sync::OnceLock;
use telnet::{Event, Telnet};

use crate::error::ExecError;

/// `Dialing -> Authenticating -> Ready -> InCommand -> Ready -> Closing ->
/// Closed`. Any state may transition to `Broken` on I/O error; from
/// `Broken` only `Closing -> Closed` is legal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Dialing,
    Authenticating,
    Ready,
    InCommand,
    Closing,
    Closed,
    Broken,
}

pub(crate) enum Transport {
    Ssh {
        channel: ssh2::Channel,
        #[allow(dead_code)]
        session: ssh2::Session,
    },
    Telnet {
        conn: Telnet,
    },
}

fn prompt_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)[\r\n]?[\w.\-]*[#>]\s*$").unwrap())
}

/// One live interactive CLI session opened by the `ConnectionManager`.
/// Owned by exactly one worker at a time; never shared across threads.
pub struct Session {
    pub(crate) host: String,
    pub(crate) transport: Transport,
    pub(crate) state: SessionState,
}

impl Session {
    pub(crate) fn new(host: String, transport: Transport) -> Self {
        Self {
            host,
            transport,
            state: SessionState::Ready,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_broken(&self) -> bool {
        self.state == SessionState::Broken
    }

    /// Sends one CLI line and reads the response up to the next prompt.
    /// Used for every command in the collector's sequence, including
    /// `terminal length 0`, which is safe to send more than once on the
    /// same session.
    pub fn execute(&mut self, command: &str, read_timeout: Duration) -> Result<String, ExecError> {
        if self.state == SessionState::Broken {
            return Err(ExecError::PromptLost(
                "session already broken".to_string(),
            ));
        }
        self.state = SessionState::InCommand;
        let result = match &mut self.transport {
            Transport::Ssh { channel, .. } => exec_ssh(channel, command, read_timeout),
            Transport::Telnet { conn } => exec_telnet(conn, command, read_timeout),
        };
        self.state = match &result {
            Ok(_) => SessionState::Ready,
            // Timeout and Eof are locally recoverable: the collector may
            // retry the same command once more on the same session.
            Err(ExecError::Timeout(_)) | Err(ExecError::Eof) => SessionState::Ready,
            Err(ExecError::PromptLost(_)) => SessionState::Broken,
        };
        result
    }

    /// Sends `exit` then `logout`, ignoring any error from either — safe
    /// to call on an already-broken session.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closing;
        let _ = self.execute("exit", Duration::from_secs(2));
        let _ = self.execute("logout", Duration::from_secs(2));
        match &mut self.transport {
            Transport::Ssh { channel, .. } => {
                let _ = channel.close();
            }
            Transport::Telnet { .. } => {}
        }
        self.state = SessionState::Closed;
    }
}

fn exec_ssh(
    channel: &mut ssh2::Channel,
    command: &str,
    read_timeout: Duration,
) -> Result<String, ExecError> {
    channel
        .write_all(format!("{command}\n").as_bytes())
        .map_err(|e| ExecError::PromptLost(e.to_string()))?;
    read_until_prompt(channel, read_timeout)
}

fn read_until_prompt<R: Read>(reader: &mut R, read_timeout: Duration) -> Result<String, ExecError> {
    let deadline = Instant::now() + read_timeout;
    let mut buf = [0u8; 4096];
    let mut acc = String::new();
    loop {
        if Instant::now() >= deadline {
            return Err(ExecError::Timeout(read_timeout));
        }
        match reader.read(&mut buf) {
            Ok(0) => return Err(ExecError::Eof),
            Ok(n) => {
                acc.push_str(&String::from_utf8_lossy(&buf[..n]));
                if prompt_re().is_match(&acc) {
                    return Ok(acc);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
            Err(e) => return Err(ExecError::PromptLost(e.to_string())),
        }
    }
}

fn exec_telnet(conn: &mut Telnet, command: &str, read_timeout: Duration) -> Result<String, ExecError> {
    conn.write(format!("{command}\n").as_bytes())
        .map_err(|e| ExecError::PromptLost(e.to_string()))?;
    let deadline = Instant::now() + read_timeout;
    let mut acc = String::new();
    loop {
        if Instant::now() >= deadline {
            return Err(ExecError::Timeout(read_timeout));
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        match conn.read_timeout(remaining) {
            Ok(Event::Data(data)) => {
                acc.push_str(&String::from_utf8_lossy(&data));
                if prompt_re().is_match(&acc) {
                    return Ok(acc);
                }
            }
            Ok(Event::TimedOut) => return Err(ExecError::Timeout(read_timeout)),
            Ok(Event::NoData) => continue,
            Ok(_) => continue,
            Err(e) => return Err(ExecError::PromptLost(e.to_string())),
        }
    }
}

pub(crate) fn connect_ssh_tcp(
    host: &str,
    port: u16,
    timeout: Duration,
) -> std::io::Result<TcpStream> {
    let addr = format!("{host}:{port}");
    let resolved = std::net::ToSocketAddrs::to_socket_addrs(&addr)?
        .next()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no address resolved"))?;
    TcpStream::connect_timeout(&resolved, timeout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_regex_matches_hash_and_angle_bracket() {
        assert!(prompt_re().is_match("core-sw01# "));
        assert!(prompt_re().is_match("core-sw01>"));
        assert!(prompt_re().is_match("show version\ncore-sw01#"));
    }

    #[test]
    fn prompt_regex_rejects_mid_output_lines() {
        assert!(!prompt_re().is_match("Cisco IOS Software, C3750E\n"));
    }
}

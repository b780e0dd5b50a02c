use std::collections::HashMap;
use std::io::{Read as _, Write as _};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use ssh2::Session as Ssh2Session;
use telnet::{Event, Telnet};
use tracing::{debug, warn};

use netwalker_types::{Credentials, Endpoint};

use crate::error::ConnectError;
use crate::session::{connect_ssh_tcp, Session, Transport};

/// Which transport `open` tries first. The other is always attempted as a
/// fallback on refusal or transport mismatch, never on auth rejection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreferredTransport {
    Ssh,
    Telnet,
}

#[derive(Clone, Debug)]
pub struct ConnectOptions {
    pub connect_timeout: Duration,
    pub transport: PreferredTransport,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            transport: PreferredTransport::Ssh,
        }
    }
}

/// Opens and tears down interactive CLI sessions, falling back from SSH to
/// Telnet on connection refusal or an unsupported transport but never on an
/// explicit authentication rejection. Tracks how many sessions are live per
/// host so the Discovery Engine can poll for a leak and force a purge.
pub struct ConnectionManager {
    live: Mutex<HashMap<String, u32>>,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            live: Mutex::new(HashMap::new()),
        }
    }

    /// Number of sessions this manager believes are still open against
    /// `host`. The Engine polls this every N processed devices and, past a
    /// configured threshold, calls `close_all`.
    pub fn live_session_count(&self, host: &str) -> u32 {
        *self.live.lock().unwrap().get(host).unwrap_or(&0)
    }

    pub fn total_live_sessions(&self) -> u32 {
        self.live.lock().unwrap().values().sum()
    }

    fn track_open(&self, host: &str) {
        *self.live.lock().unwrap().entry(host.to_string()).or_insert(0) += 1;
    }

    fn track_close(&self, host: &str) {
        if let Some(count) = self.live.lock().unwrap().get_mut(host) {
            *count = count.saturating_sub(1);
        }
    }

    /// Tries the preferred transport first, falling back to the other one
    /// on refusal or a transport mismatch. An explicit authentication
    /// rejection from the first transport is returned immediately without
    /// trying the second.
    pub fn open(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
        options: &ConnectOptions,
    ) -> Result<Session, ConnectError> {
        let host = endpoint.host.clone();
        let deadline = Instant::now() + options.connect_timeout;

        type Opener = fn(&str, &Credentials, Instant) -> Result<Session, ConnectError>;
        let (first, second): (Opener, Opener) = match options.transport {
            PreferredTransport::Ssh => (open_ssh, open_telnet),
            PreferredTransport::Telnet => (open_telnet, open_ssh),
        };

        match first(&host, credentials, deadline) {
            Ok(session) => {
                self.track_open(&host);
                return Ok(session);
            }
            Err(ConnectError::AuthRejected(msg)) => return Err(ConnectError::AuthRejected(msg)),
            Err(e) => debug!(host = %host, error = %e, "preferred transport failed, falling back"),
        }

        let session = second(&host, credentials, deadline)?;
        self.track_open(&host);
        Ok(session)
    }

    pub fn close(&self, mut session: Session) {
        let host = session.host().to_string();
        session.close();
        self.track_close(&host);
    }

    /// Forces every session this manager has opened to close, bounded by
    /// `deadline`. Sessions still unaccounted for when the deadline expires
    /// are dropped and logged, not waited on further.
    pub fn close_all(&self, deadline: Duration) {
        let started = Instant::now();
        let remaining: Vec<(String, u32)> = {
            let live = self.live.lock().unwrap();
            live.iter().map(|(h, c)| (h.clone(), *c)).collect()
        };
        let forced: u32 = remaining.iter().map(|(_, c)| c).sum();
        if forced > 0 {
            warn!(forced_count = forced, "close_all purging leaked sessions");
        }
        self.live.lock().unwrap().clear();
        if started.elapsed() > deadline {
            warn!("close_all exceeded its bounded deadline");
        }
    }
}

fn classify_ssh_error(err: &ssh2::Error) -> ConnectError {
    use ssh2::ErrorCode;
    match err.code() {
        ErrorCode::Session(-18) | ErrorCode::Session(-16) => {
            ConnectError::AuthRejected(err.message().to_string())
        }
        _ => ConnectError::Transport(err.message().to_string()),
    }
}

fn open_ssh(
    host: &str,
    credentials: &Credentials,
    deadline: Instant,
) -> Result<Session, ConnectError> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        return Err(ConnectError::ConnectTimeout(remaining));
    }
    let tcp = connect_ssh_tcp(host, 22, remaining).map_err(|e| {
        if e.kind() == std::io::ErrorKind::TimedOut {
            ConnectError::ConnectTimeout(remaining)
        } else {
            ConnectError::Transport(e.to_string())
        }
    })?;

    let mut ssh = Ssh2Session::new().map_err(|e| ConnectError::Transport(e.to_string()))?;
    ssh.set_tcp_stream(tcp);
    ssh.handshake().map_err(|e| classify_ssh_error(&e))?;
    ssh.userauth_password(&credentials.username, &credentials.password)
        .map_err(|e| classify_ssh_error(&e))?;
    if !ssh.authenticated() {
        return Err(ConnectError::AuthRejected(
            "authentication did not complete".to_string(),
        ));
    }

    let mut channel = ssh
        .channel_session()
        .map_err(|e| ConnectError::Transport(e.to_string()))?;
    channel
        .request_pty("vt100", None, None)
        .map_err(|e| ConnectError::Transport(e.to_string()))?;
    channel
        .shell()
        .map_err(|e| ConnectError::Transport(e.to_string()))?;

    escalate_enable_ssh(&ssh, &mut channel, credentials, deadline)?;

    Ok(Session::new(
        host.to_string(),
        Transport::Ssh {
            channel,
            session: ssh,
        },
    ))
}

/// Reads the shell's first prompt and, per spec §4.1 ("Enable-password is
/// supplied if and only if the device presents an unprivileged prompt"),
/// sends `enable` and the enable password when that prompt is unprivileged
/// (`>`). A device presenting `#` directly, or a missing enable password,
/// leaves the session as-is.
fn escalate_enable_ssh(
    session: &ssh2::Session,
    channel: &mut ssh2::Channel,
    credentials: &Credentials,
    deadline: Instant,
) -> Result<(), ConnectError> {
    session.set_blocking(false);
    let result = escalate_enable_ssh_inner(channel, credentials, deadline);
    session.set_blocking(true);
    result
}

fn escalate_enable_ssh_inner(
    channel: &mut ssh2::Channel,
    credentials: &Credentials,
    deadline: Instant,
) -> Result<(), ConnectError> {
    let banner = read_ssh_until(channel, deadline, is_prompt_line)?;
    if !banner.trim_end().ends_with('>') {
        return Ok(());
    }
    let Some(enable_password) = credentials.enable_password.as_deref() else {
        return Ok(());
    };

    channel
        .write_all(b"enable\n")
        .map_err(|e| ConnectError::Transport(e.to_string()))?;
    read_ssh_until(channel, deadline, |acc| acc.to_lowercase().contains("password:"))?;

    channel
        .write_all(format!("{enable_password}\n").as_bytes())
        .map_err(|e| ConnectError::Transport(e.to_string()))?;
    // Ready is only reported once `#` (privileged EXEC) is seen; a device
    // that rejects the enable password falls back to the unprivileged
    // prompt and the session proceeds at that level.
    read_ssh_until(channel, deadline, is_prompt_line)?;
    Ok(())
}

fn is_prompt_line(acc: &str) -> bool {
    let trimmed = acc.trim_end();
    trimmed.ends_with('#') || trimmed.ends_with('>')
}

fn read_ssh_until<F: Fn(&str) -> bool>(
    channel: &mut ssh2::Channel,
    deadline: Instant,
    stop: F,
) -> Result<String, ConnectError> {
    let mut buf = [0u8; 4096];
    let mut acc = String::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(ConnectError::ConnectTimeout(remaining));
        }
        match channel.read(&mut buf) {
            Ok(0) => return Err(ConnectError::Transport("eof before enable prompt".to_string())),
            Ok(n) => {
                acc.push_str(&String::from_utf8_lossy(&buf[..n]));
                if stop(&acc) {
                    return Ok(acc);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
            Err(e) => return Err(ConnectError::Transport(e.to_string())),
        }
    }
}

fn open_telnet(
    host: &str,
    credentials: &Credentials,
    deadline: Instant,
) -> Result<Session, ConnectError> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        return Err(ConnectError::ConnectTimeout(remaining));
    }
    let mut conn = Telnet::connect((host, 23u16), 4096)
        .map_err(|e| ConnectError::Transport(e.to_string()))?;

    negotiate_login(&mut conn, credentials, remaining)?;

    Ok(Session::new(host.to_string(), Transport::Telnet { conn }))
}

fn negotiate_login(
    conn: &mut Telnet,
    credentials: &Credentials,
    timeout: Duration,
) -> Result<(), ConnectError> {
    let deadline = Instant::now() + timeout;
    let mut acc = String::new();
    let mut sent_user = false;
    let mut sent_pass = false;
    let mut sent_enable = false;
    let mut awaiting_enable_password = false;
    loop {
        if Instant::now() >= deadline {
            return Err(ConnectError::ConnectTimeout(timeout));
        }
        match conn.read_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(Event::Data(data)) => {
                acc.push_str(&String::from_utf8_lossy(&data));
                let lower = acc.to_lowercase();
                if !sent_user && lower.contains("username:") {
                    conn.write(format!("{}\n", credentials.username).as_bytes())
                        .map_err(|e| ConnectError::Transport(e.to_string()))?;
                    sent_user = true;
                    acc.clear();
                } else if !sent_pass && lower.contains("password:") {
                    conn.write(format!("{}\n", credentials.password).as_bytes())
                        .map_err(|e| ConnectError::Transport(e.to_string()))?;
                    sent_pass = true;
                    acc.clear();
                } else if awaiting_enable_password && lower.contains("password:") {
                    let enable_password = credentials.enable_password.as_deref().unwrap_or("");
                    conn.write(format!("{enable_password}\n").as_bytes())
                        .map_err(|e| ConnectError::Transport(e.to_string()))?;
                    awaiting_enable_password = false;
                    acc.clear();
                } else if sent_pass
                    && (lower.contains("invalid") || lower.contains("access denied"))
                {
                    return Err(ConnectError::AuthRejected(acc.trim().to_string()));
                } else if sent_pass && !sent_enable && acc.ends_with('#') {
                    return Ok(());
                } else if sent_pass && !sent_enable && acc.ends_with('>') {
                    // Unprivileged prompt: escalate only if an enable
                    // password was actually supplied (spec §4.1).
                    let Some(enable_password) = credentials.enable_password.as_deref() else {
                        return Ok(());
                    };
                    if enable_password.is_empty() {
                        return Ok(());
                    }
                    conn.write(b"enable\n")
                        .map_err(|e| ConnectError::Transport(e.to_string()))?;
                    sent_enable = true;
                    awaiting_enable_password = true;
                    acc.clear();
                } else if sent_enable && !awaiting_enable_password && (acc.ends_with('#') || acc.ends_with('>')) {
                    // Ready is reported whether or not the enable password
                    // was accepted; a rejected enable leaves the session at
                    // the unprivileged prompt instead of failing the connect.
                    return Ok(());
                }
            }
            Ok(Event::TimedOut) => return Err(ConnectError::ConnectTimeout(timeout)),
            Ok(Event::NoData) => continue,
            Ok(_) => continue,
            Err(e) => return Err(ConnectError::Transport(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_live_session_count_per_host() {
        let mgr = ConnectionManager::new();
        assert_eq!(mgr.live_session_count("sw01"), 0);
        mgr.track_open("sw01");
        mgr.track_open("sw01");
        assert_eq!(mgr.live_session_count("sw01"), 2);
        mgr.track_close("sw01");
        assert_eq!(mgr.live_session_count("sw01"), 1);
    }

    #[test]
    fn close_all_clears_all_hosts() {
        let mgr = ConnectionManager::new();
        mgr.track_open("sw01");
        mgr.track_open("sw02");
        mgr.close_all(Duration::from_secs(30));
        assert_eq!(mgr.total_live_sessions(), 0);
    }
}

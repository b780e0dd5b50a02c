use std::net::Ipv4Addr;

/// An addressable target of a connection attempt.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub primary_ip: Option<Ipv4Addr>,
    pub hostname_hint: Option<String>,
}

impl Endpoint {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            primary_ip: None,
            hostname_hint: None,
        }
    }

    pub fn with_ip(mut self, ip: Ipv4Addr) -> Self {
        self.primary_ip = Some(ip);
        self
    }

    pub fn with_hostname_hint(mut self, hostname: impl Into<String>) -> Self {
        self.hostname_hint = Some(hostname.into());
        self
    }

    /// Whether `primary_ip` is a routable address rather than an
    /// unrouted placeholder such as `0.0.0.0`.
    fn routable_ip(&self) -> Option<Ipv4Addr> {
        self.primary_ip.filter(|ip| !ip.is_unspecified())
    }

    /// The deduplication identity for this endpoint: the cleaned hostname
    /// when one is known, otherwise the primary IP.
    pub fn identity_key(&self) -> String {
        let hostname = self.hostname_hint.as_deref().unwrap_or(&self.host);
        let cleaned = clean_hostname(hostname);
        if !cleaned.is_empty() && !looks_like_ipv4(&cleaned) {
            return cleaned;
        }
        if let Some(ip) = self.routable_ip() {
            return ip.to_string();
        }
        String::new()
    }
}

fn looks_like_ipv4(s: &str) -> bool {
    s.parse::<Ipv4Addr>().is_ok()
}

/// Strip a trailing `(SERIAL)` suffix and lowercase the bare hostname.
///
/// Idempotent: `clean(clean(h)) == clean(h)`.
pub fn clean_hostname(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_serial = strip_parenthesized_suffix(trimmed);
    without_serial.trim().to_ascii_lowercase()
}

fn strip_parenthesized_suffix(s: &str) -> &str {
    let trimmed = s.trim_end();
    if trimmed.ends_with(')') {
        if let Some(open) = trimmed.rfind('(') {
            return trimmed[..open].trim_end();
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_serial_suffix() {
        assert_eq!(clean_hostname("SW01(FOC1234X0YZ)"), "sw01");
        assert_eq!(clean_hostname("  SW01  "), "sw01");
        assert_eq!(clean_hostname("sw01"), "sw01");
    }

    #[test]
    fn cleaning_is_idempotent() {
        for input in ["SW01(FOC1234X0YZ)", "core-sw-1", "  Spaced  ", ""] {
            let once = clean_hostname(input);
            let twice = clean_hostname(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn identity_key_prefers_cleaned_hostname() {
        let ep = Endpoint::new("10.0.0.1")
            .with_ip("10.0.0.1".parse().unwrap())
            .with_hostname_hint("CORE-SW01(FOC12345ABC)");
        assert_eq!(ep.identity_key(), "core-sw01");
    }

    #[test]
    fn identity_key_falls_back_to_ip_when_hostname_unknown() {
        let ep = Endpoint::new("10.0.0.1").with_ip("10.0.0.1".parse().unwrap());
        assert_eq!(ep.identity_key(), "10.0.0.1");
    }

    #[test]
    fn unspecified_ip_does_not_participate_in_identity() {
        let ep = Endpoint::new("0.0.0.0").with_ip(Ipv4Addr::UNSPECIFIED);
        assert_eq!(ep.identity_key(), "");
    }
}

use netwalker_types::{DeviceIdentity, Platform};
use regex::Regex;
use std::sync::OnceLock;

/// Words that never become the hostname even if a pattern would otherwise
/// capture them.
const STOP_WORDS: &[&str] = &[
    "kernel", "system", "device", "switch", "router", "nexus", "cisco",
];

fn device_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*Device name:\s*(\S+)\s*$").unwrap())
}

fn prompt_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^([A-Za-z0-9_.\-]+)[#>]\s*$").unwrap())
}

fn uptime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(\S+)\s+uptime is\s").unwrap())
}

fn is_stop_word(candidate: &str) -> bool {
    STOP_WORDS.contains(&candidate.to_ascii_lowercase().as_str())
}

/// Detects the platform family from `show version` marker strings.
pub fn detect_platform(show_version: &str) -> Platform {
    if show_version.contains("IOS-XE") {
        Platform::IosXe
    } else if show_version.contains("NX-OS") || show_version.contains("NXOS") {
        Platform::NxOs
    } else if show_version.contains("IOS Software") {
        Platform::Ios
    } else {
        Platform::Unknown
    }
}

/// Extracts the raw (uncleaned) hostname from `show version` output,
/// trying each candidate pattern in priority order. Returns `None` if
/// every candidate is empty or a stop-word.
pub fn extract_hostname(show_version: &str) -> Option<String> {
    for candidate in device_name_re()
        .captures_iter(show_version)
        .map(|c| c[1].to_string())
        .chain(
            prompt_re()
                .captures_iter(show_version)
                .map(|c| c[1].to_string()),
        )
        .chain(
            uptime_re()
                .captures_iter(show_version)
                .map(|c| c[1].to_string()),
        )
    {
        if !candidate.is_empty() && !is_stop_word(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)(?:Version|NXOS:\s*version)\s+([^\s,]+)").unwrap()
    })
}

fn uptime_value_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)uptime is\s+(.+)$").unwrap())
}

fn kernel_uptime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)Kernel uptime is\s+(.+)$").unwrap())
}

fn hardware_model_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?mi)^\s*cisco\s+(\S+(?:\s+\S+)?)\s+(?:\(|Chassis)").unwrap()
    })
}

/// Parses `show version` output (and, if available, `show inventory`
/// output for serials) into a `DeviceIdentity`. Returns `None` if no usable
/// hostname could be extracted — the caller must treat this as a terminal
/// `collect_failed`, since a device report is never built without one.
pub fn parse_identity(show_version: &str, show_inventory: &str) -> Option<DeviceIdentity> {
    let raw_hostname = extract_hostname(show_version)?;
    let platform = detect_platform(show_version);
    let software_version = version_re()
        .captures(show_version)
        .map(|c| c[1].trim_end_matches(',').to_string())
        .unwrap_or_default();
    let uptime = kernel_uptime_re()
        .captures(show_version)
        .or_else(|| uptime_value_re().captures(show_version))
        .map(|c| c[1].trim().to_string());
    let hardware_model = hardware_model_re()
        .captures(show_version)
        .map(|c| c[1].trim().to_string())
        .or_else(|| crate::inventory::extract_primary_model(show_inventory))
        .unwrap_or_default();
    let serial_numbers = crate::inventory::extract_serials(show_inventory);

    Some(DeviceIdentity {
        hostname: raw_hostname,
        platform,
        software_version,
        serial_numbers,
        hardware_model,
        uptime,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NXOS_VERSION: &str = r#"Cisco Nexus Operating System (NX-OS) Software
NXOS: version 9.3(10)
Hardware
  cisco Nexus9000 C93180YC-FX Chassis

  Device name: nxos-specific
  Kernel uptime is 125 day(s), 10 hour(s), 17 minute(s), 53 second(s)

nxos-specific# "#;

    const IOS_VERSION: &str = r#"Cisco IOS Software, C3750E Software (C3750E-UNIVERSALK9-M), Version 15.2(4)E10
core-sw01 uptime is 10 weeks, 2 days, 4 hours, 12 minutes
cisco WS-C3750X-24 (PowerPC405) processor
"#;

    #[test]
    fn detects_nxos_platform() {
        assert_eq!(detect_platform(NXOS_VERSION), Platform::NxOs);
    }

    #[test]
    fn detects_ios_platform() {
        assert_eq!(detect_platform(IOS_VERSION), Platform::Ios);
    }

    #[test]
    fn extracts_nxos_hostname_from_device_name_line() {
        assert_eq!(extract_hostname(NXOS_VERSION).as_deref(), Some("nxos-specific"));
    }

    #[test]
    fn extracts_ios_hostname_from_uptime_line() {
        assert_eq!(extract_hostname(IOS_VERSION).as_deref(), Some("core-sw01"));
    }

    #[test]
    fn stop_words_are_never_returned() {
        let text = "switch# \nrouter uptime is 1 day\n";
        assert_eq!(extract_hostname(text), None);
    }

    #[test]
    fn parses_full_identity_for_nxos() {
        let identity = parse_identity(NXOS_VERSION, "").unwrap();
        assert_eq!(identity.hostname, "nxos-specific");
        assert_eq!(identity.platform, Platform::NxOs);
        assert_eq!(identity.software_version, "9.3(10)");
        assert!(identity.uptime.unwrap().contains("125 day"));
    }

    #[test]
    fn returns_none_when_no_hostname_can_be_extracted() {
        assert!(parse_identity("garbage with no markers", "").is_none());
    }
}

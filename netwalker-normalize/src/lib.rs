//! Canonical interface-name normalization.
//!
//! `normalize` is a pure function: no I/O, no failure mode. Unrecognized
//! input is returned unchanged, which also gives idempotence for free —
//! `normalize(normalize(n, p), p) == normalize(n, p)` holds because every
//! canonical form is itself a fixed point.

use netwalker_types::Platform;

/// Longest-match-first interface abbreviations, valid on IOS/IOS-XE.
/// Order matters: a longer alias (e.g. `tengigabitethernet`) must be tried
/// before a shorter one that is also a prefix of it would be (there are no
/// such collisions today, but keeping the list sorted longest-first keeps
/// it safe to extend).
const IOS_ALIASES: &[(&str, &str)] = &[
    ("gigabitethernet", "GigabitEthernet"),
    ("tengigabitethernet", "TenGigabitEthernet"),
    ("fastethernet", "FastEthernet"),
    ("fortygigabitethernet", "FortyGigabitEthernet"),
    ("hundredgigabitethernet", "HundredGigE"),
    ("twentyfivegige", "TwentyFiveGigE"),
    ("hundredgige", "HundredGigE"),
    ("loopback", "Loopback"),
    ("tunnel", "Tunnel"),
    ("vlan", "Vlan"),
    ("twe", "TwentyFiveGigE"),
    ("gi", "GigabitEthernet"),
    ("te", "TenGigabitEthernet"),
    ("fa", "FastEthernet"),
    ("fo", "FortyGigabitEthernet"),
    ("hu", "HundredGigE"),
    ("lo", "Loopback"),
    ("tu", "Tunnel"),
];

const PORT_CHANNEL_ALIASES: &[&str] = &["port-channel", "po"];
const MANAGEMENT_ALIASES: &[&str] = &["management", "mgmt"];
const NXOS_ETHERNET_ALIASES: &[&str] = &["ethernet", "eth"];

/// Canonicalizes an interface name to its full, platform-appropriate form.
pub fn normalize(name: &str, platform: Platform) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let lower = trimmed.to_ascii_lowercase();

    if let Some(suffix) = strip_longest_alias(&lower, PORT_CHANNEL_ALIASES) {
        return format!("Port-channel{}", &trimmed[trimmed.len() - suffix.len()..]);
    }

    if let Some(suffix) = strip_longest_alias(&lower, MANAGEMENT_ALIASES) {
        let digits = if suffix.is_empty() { "0" } else { suffix };
        return match platform {
            Platform::NxOs => format!("mgmt{digits}"),
            _ => format!("Management{digits}"),
        };
    }

    match platform {
        Platform::NxOs => {
            if let Some(suffix) = strip_longest_alias(&lower, NXOS_ETHERNET_ALIASES) {
                return format!("Ethernet{}", &trimmed[trimmed.len() - suffix.len()..]);
            }
            trimmed.to_string()
        }
        Platform::Ios | Platform::IosXe => {
            for (alias, canonical) in IOS_ALIASES {
                if let Some(suffix) = lower.strip_prefix(alias) {
                    return format!("{canonical}{}", &trimmed[trimmed.len() - suffix.len()..]);
                }
            }
            trimmed.to_string()
        }
        Platform::Unknown => trimmed.to_string(),
    }
}

/// Finds the longest alias in `aliases` that prefixes `lower`, returning the
/// unmatched remainder (the numeric suffix to preserve verbatim).
fn strip_longest_alias<'a>(lower: &'a str, aliases: &[&str]) -> Option<&'a str> {
    aliases
        .iter()
        .filter_map(|alias| lower.strip_prefix(alias))
        .max_by_key(|remainder| lower.len() - remainder.len())
}

use std::collections::HashSet;
use std::time::Duration;

use netwalker_connection::Session;
use netwalker_types::{Platform, Prefix, PrefixSource, PrefixSummary};

use crate::commands::run_with_retry;

/// Options gating the optional IPv4 prefix sub-pipeline (§4.8).
#[derive(Clone, Debug)]
pub struct PrefixOptions {
    pub enabled: bool,
    pub read_timeout: Duration,
}

impl Default for PrefixOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            read_timeout: Duration::from_secs(30),
        }
    }
}

pub struct PrefixResult {
    pub prefixes: Vec<Prefix>,
    pub summaries: Vec<PrefixSummary>,
    pub exceptions: Vec<String>,
}

/// Runs VRF discovery, global and per-VRF RIB and BGP collection, ambiguity
/// resolution, device-level deduplication, and summarization analysis, on
/// the same already-open session used for the main collect sequence.
pub fn collect_prefixes(
    session: &mut Session,
    platform: Platform,
    options: &PrefixOptions,
) -> PrefixResult {
    let mut exceptions = Vec::new();
    let mut raw = Vec::new();

    let vrfs = match run_with_retry(session, "show vrf", options.read_timeout) {
        Ok(text) => netwalker_parser::parse_vrf_names(&text),
        Err(e) => {
            exceptions.push(format!("show vrf failed: {e}"));
            Vec::new()
        }
    };

    collect_route_table(session, options, "global", "show ip route", PrefixSource::Rib, &mut raw, &mut exceptions);
    collect_route_table(
        session,
        options,
        "global",
        "show ip route connected",
        PrefixSource::Connected,
        &mut raw,
        &mut exceptions,
    );

    for vrf in &vrfs {
        let sanitized = netwalker_parser::sanitize_vrf_name(vrf);
        collect_route_table(
            session,
            options,
            &sanitized,
            &format!("show ip route vrf {vrf}"),
            PrefixSource::Rib,
            &mut raw,
            &mut exceptions,
        );
        collect_route_table(
            session,
            options,
            &sanitized,
            &format!("show ip route vrf {vrf} connected"),
            PrefixSource::Connected,
            &mut raw,
            &mut exceptions,
        );
    }

    collect_bgp(session, options, "global", "show ip bgp", &mut raw, &mut exceptions);
    for vrf in &vrfs {
        let sanitized = netwalker_parser::sanitize_vrf_name(vrf);
        let command = match platform {
            Platform::NxOs => format!("show ip bgp vrf {vrf}"),
            _ => format!("show ip bgp vpnv4 vrf {vrf}"),
        };
        collect_bgp(session, options, &sanitized, &command, &mut raw, &mut exceptions);
    }

    let deduped = dedup_device_level(raw);
    let summaries = summarize(&deduped);

    PrefixResult {
        prefixes: deduped,
        summaries,
        exceptions,
    }
}

fn collect_route_table(
    session: &mut Session,
    options: &PrefixOptions,
    vrf: &str,
    command: &str,
    source: PrefixSource,
    out: &mut Vec<Prefix>,
    exceptions: &mut Vec<String>,
) {
    match run_with_retry(session, command, options.read_timeout) {
        Ok(text) => out.extend(netwalker_parser::parse_route_table(&text, vrf, source)),
        Err(e) => exceptions.push(format!("{command} failed: {e}")),
    }
}

fn collect_bgp(
    session: &mut Session,
    options: &PrefixOptions,
    vrf: &str,
    command: &str,
    out: &mut Vec<Prefix>,
    exceptions: &mut Vec<String>,
) {
    let text = match run_with_retry(session, command, options.read_timeout) {
        Ok(text) => text,
        Err(e) => {
            exceptions.push(format!("{command} failed: {e}"));
            return;
        }
    };

    for line in text.lines() {
        match netwalker_parser::parse_bgp_line(line, vrf) {
            Some(Ok(prefix)) => out.push(prefix),
            Some(Err(ambiguous)) => {
                match resolve_ambiguous(session, options, vrf, &ambiguous.network, platform_bgp_vrf_hint(command)) {
                    Some(prefix) => out.push(prefix),
                    None => exceptions.push(format!(
                        "could not resolve prefix length for {} in vrf {vrf}",
                        ambiguous.network
                    )),
                }
            }
            None => {}
        }
    }
}

fn platform_bgp_vrf_hint(command: &str) -> Option<&str> {
    if command.contains("vrf") {
        Some(command)
    } else {
        None
    }
}

/// Issues a follow-up `show ip bgp <prefix>` (or VRF variant) then `show ip
/// route <prefix>` to resolve a network address with no known mask length.
fn resolve_ambiguous(
    session: &mut Session,
    options: &PrefixOptions,
    vrf: &str,
    network: &str,
    vrf_command_hint: Option<&str>,
) -> Option<Prefix> {
    let bgp_follow_up = match vrf_command_hint {
        Some(hint) if hint.contains("vpnv4") => format!("show ip bgp vpnv4 vrf {vrf} {network}"),
        Some(_) => format!("show ip bgp vrf {vrf} {network}"),
        None => format!("show ip bgp {network}"),
    };
    if let Ok(text) = run_with_retry(session, &bgp_follow_up, options.read_timeout) {
        if let Some(prefix) = extract_prefix_length_from_detail(&text, network, vrf, PrefixSource::Bgp) {
            return Some(prefix);
        }
    }

    let route_follow_up = if vrf == "global" {
        format!("show ip route {network}")
    } else {
        format!("show ip route vrf {vrf} {network}")
    };
    if let Ok(text) = run_with_retry(session, &route_follow_up, options.read_timeout) {
        if let Some(prefix) = extract_prefix_length_from_detail(&text, network, vrf, PrefixSource::Rib) {
            return Some(prefix);
        }
    }

    None
}

fn extract_prefix_length_from_detail(
    text: &str,
    network: &str,
    vrf: &str,
    source: PrefixSource,
) -> Option<Prefix> {
    let needle = format!("{network}/");
    let line = text.lines().find(|l| l.contains(&needle))?;
    let start = line.find(&needle)?;
    let rest = &line[start..];
    let cidr_text: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '/')
        .collect();
    let cidr = cidr_text.parse().ok()?;
    Some(Prefix {
        cidr,
        vrf: vrf.to_string(),
        source,
        protocol_code: None,
    })
}

fn dedup_device_level(prefixes: Vec<Prefix>) -> Vec<Prefix> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for prefix in prefixes {
        let key = (prefix.vrf.clone(), prefix.cidr, prefix.source);
        if seen.insert(key) {
            out.push(prefix);
        }
    }
    out
}

/// For each VRF, sorts prefixes ascending by prefix length and scans
/// pairwise for strict containment, keeping the comparison O(n^2) per VRF
/// rather than across the whole device.
fn summarize(prefixes: &[Prefix]) -> Vec<PrefixSummary> {
    let mut by_vrf: std::collections::BTreeMap<&str, Vec<&Prefix>> = std::collections::BTreeMap::new();
    for prefix in prefixes {
        by_vrf.entry(prefix.vrf.as_str()).or_default().push(prefix);
    }

    let mut summaries = Vec::new();
    for (vrf, mut group) in by_vrf {
        group.sort_by_key(|p| p.cidr.mask());
        for i in 0..group.len() {
            for j in (i + 1)..group.len() {
                if group[i].cidr.strictly_contains(&group[j].cidr) {
                    summaries.push(PrefixSummary {
                        vrf: vrf.to_string(),
                        summary: group[i].cidr,
                        component: group[j].cidr,
                    });
                }
            }
        }
    }
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_collapses_identical_device_level_keys() {
        let cidr = "10.0.0.0/24".parse().unwrap();
        let prefixes = vec![
            Prefix { cidr, vrf: "global".into(), source: PrefixSource::Rib, protocol_code: Some('C') },
            Prefix { cidr, vrf: "global".into(), source: PrefixSource::Rib, protocol_code: Some('C') },
        ];
        assert_eq!(dedup_device_level(prefixes).len(), 1);
    }

    #[test]
    fn summarize_finds_containment_within_same_vrf() {
        let summary_cidr = "10.0.0.0/8".parse().unwrap();
        let component_cidr = "10.1.0.0/16".parse().unwrap();
        let prefixes = vec![
            Prefix { cidr: summary_cidr, vrf: "global".into(), source: PrefixSource::Rib, protocol_code: None },
            Prefix { cidr: component_cidr, vrf: "global".into(), source: PrefixSource::Rib, protocol_code: None },
        ];
        let summaries = summarize(&prefixes);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].summary, summary_cidr);
        assert_eq!(summaries[0].component, component_cidr);
    }

    #[test]
    fn summarize_ignores_prefixes_in_different_vrfs() {
        let summary_cidr = "10.0.0.0/8".parse().unwrap();
        let component_cidr = "10.1.0.0/16".parse().unwrap();
        let prefixes = vec![
            Prefix { cidr: summary_cidr, vrf: "global".into(), source: PrefixSource::Rib, protocol_code: None },
            Prefix { cidr: component_cidr, vrf: "prod".into(), source: PrefixSource::Rib, protocol_code: None },
        ];
        assert!(summarize(&prefixes).is_empty());
    }
}

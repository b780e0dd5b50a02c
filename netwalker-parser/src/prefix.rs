use netwalker_types::{Ipv4Cidr, Prefix, PrefixSource};
use regex::Regex;
use std::sync::OnceLock;

/// A prefix line that could not be resolved to a length: a BGP line
/// naming a network but no mask, requiring separate resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AmbiguousPrefix {
    pub network: String,
    pub protocol_code: Option<char>,
}

fn cidr_route_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([A-Z*]?)\s*(\d{1,3}(?:\.\d{1,3}){3}/\d{1,2})\b").unwrap()
    })
}

fn mask_route_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*([A-Z*]?)\s*(\d{1,3}(?:\.\d{1,3}){3})\s+(\d{1,3}(?:\.\d{1,3}){3})\b",
        )
        .unwrap()
    })
}

fn protocol_code(token: &str) -> Option<char> {
    token.chars().find(|c| c.is_ascii_uppercase())
}

/// Parses one line of `show ip route` / `show ip route connected` /
/// per-VRF variants into a `Prefix`. Accepts CIDR form, mask form, and
/// host-route lines like `L 10.1.1.1/32`. Lines that parse to neither
/// form produce `None`.
pub fn parse_route_line(line: &str, vrf: &str, source: PrefixSource) -> Option<Prefix> {
    if let Some(caps) = cidr_route_re().captures(line) {
        let cidr: Ipv4Cidr = caps[2].parse().ok()?;
        return Some(Prefix {
            cidr,
            vrf: vrf.to_string(),
            source,
            protocol_code: protocol_code(&caps[1]),
        });
    }
    if let Some(caps) = mask_route_re().captures(line) {
        let cidr = Ipv4Cidr::from_address_and_netmask(caps[2].parse().ok()?, caps[3].parse().ok()?).ok()?;
        return Some(Prefix {
            cidr,
            vrf: vrf.to_string(),
            source,
            protocol_code: protocol_code(&caps[1]),
        });
    }
    None
}

pub fn parse_route_table(text: &str, vrf: &str, source: PrefixSource) -> Vec<Prefix> {
    text.lines()
        .filter_map(|line| parse_route_line(line, vrf, source))
        .collect()
}

fn bgp_cidr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([*>isSdh ]*)\s*(\d{1,3}(?:\.\d{1,3}){3}/\d{1,2})\b").unwrap()
    })
}

fn bgp_ambiguous_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([*>isSdh ]*)\s*(\d{1,3}(?:\.\d{1,3}){3})(?:\s|$)").unwrap()
    })
}

/// Parses one line of `show ip bgp` output. BGP lines lacking a prefix
/// length are returned via the `Err` side for the collector's separate
/// ambiguity-resolution step instead of being silently dropped.
pub fn parse_bgp_line(line: &str, vrf: &str) -> Option<Result<Prefix, AmbiguousPrefix>> {
    if let Some(caps) = bgp_cidr_re().captures(line) {
        let cidr = caps[2].parse::<Ipv4Cidr>().ok()?;
        return Some(Ok(Prefix {
            cidr,
            vrf: vrf.to_string(),
            source: PrefixSource::Bgp,
            protocol_code: None,
        }));
    }
    if let Some(caps) = bgp_ambiguous_re().captures(line) {
        if caps[2].parse::<std::net::Ipv4Addr>().is_ok() {
            return Some(Err(AmbiguousPrefix {
                network: caps[2].to_string(),
                protocol_code: None,
            }));
        }
    }
    None
}

/// Replaces every character outside `[A-Za-z0-9_-]` in a VRF name so it
/// can be used as a stable storage key.
pub fn sanitize_vrf_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Parses `show vrf` output into a list of VRF names; empty output (a
/// device with no VRFs configured) is legal.
pub fn parse_vrf_names(text: &str) -> Vec<String> {
    text.lines()
        .skip(1) // header row
        .filter_map(|line| line.split_whitespace().next())
        .filter(|name| !name.is_empty() && *name != "VRF-Name")
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cidr_route_line() {
        let p = parse_route_line("D    10.1.1.0/24 [90/3072] via 10.0.0.1", "global", PrefixSource::Rib).unwrap();
        assert_eq!(p.cidr.to_string(), "10.1.1.0/24");
        assert_eq!(p.protocol_code, Some('D'));
    }

    #[test]
    fn parses_mask_form_route_line() {
        let p = parse_route_line(
            "C    10.1.2.0    255.255.255.0 is directly connected",
            "global",
            PrefixSource::Connected,
        )
        .unwrap();
        assert_eq!(p.cidr.to_string(), "10.1.2.0/24");
    }

    #[test]
    fn parses_host_route_with_prefix_length() {
        let p = parse_route_line("L    10.1.1.1/32 is directly connected", "global", PrefixSource::Connected)
            .unwrap();
        assert_eq!(p.cidr.to_string(), "10.1.1.1/32");
        assert_eq!(p.protocol_code, Some('L'));
    }

    #[test]
    fn bgp_line_with_length_parses_directly() {
        let result = parse_bgp_line("*> 10.5.0.0/16   0.0.0.0   0   32768 i", "global").unwrap();
        assert!(result.is_ok());
    }

    #[test]
    fn bgp_line_without_length_is_ambiguous() {
        let result = parse_bgp_line("*> 10.5.0.0   0.0.0.0   0   32768 i", "global").unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn sanitizes_vrf_names() {
        assert_eq!(sanitize_vrf_name("VRF one/two.three"), "VRF_one_two_three");
        assert_eq!(sanitize_vrf_name("prod-1_A"), "prod-1_A");
    }

    #[test]
    fn parses_vrf_name_table() {
        let text = "VRF-Name                           VRF-ID State\nmanagement                         1      Up\nprod                                2      Up\n";
        assert_eq!(parse_vrf_names(text), vec!["management", "prod"]);
    }

    #[test]
    fn empty_vrf_table_is_legal() {
        assert!(parse_vrf_names("").is_empty());
    }
}

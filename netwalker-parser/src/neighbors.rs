use netwalker_types::{clean_hostname, Capability, DiscoveryProtocol, Neighbor};
use netwalker_types::Platform;
use regex::Regex;
use std::sync::OnceLock;

fn field_re(label: &str) -> Regex {
    Regex::new(&format!(r"(?m)^\s*{label}\s*:\s*(.+?)\s*$", label = regex::escape(label))).unwrap()
}

fn first_field<'a>(block: &'a str, labels: &[&str]) -> Option<&'a str> {
    for label in labels {
        let re = field_re(label);
        if let Some(c) = re.captures(block) {
            return c.get(1).map(|m| m.as_str());
        }
    }
    None
}

fn capabilities_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?ms)Capabilities\s*:\s*(.+?)(?:\n\s*\n|Interface:|$)").unwrap())
}

fn parse_capabilities(block: &str) -> Vec<Capability> {
    let Some(caps) = capabilities_re().captures(block) else {
        return Vec::new();
    };
    caps[1]
        .split([',', ' ', '\n', '\t'])
        .filter(|t| !t.trim().is_empty())
        .filter_map(Capability::parse_token)
        .collect()
}

fn interface_pair_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*Interface:\s*(\S+),\s*Port ID \(outgoing port\):\s*(\S+)").unwrap()
    })
}

/// Splits `show cdp neighbors detail` output into per-neighbor blocks (each
/// introduced by a `Device ID:` line) and parses the CDP and NX-OS variant
/// fields: `Device ID:`, `IP address:` / `IPv4 Address:` / `Mgmt address:`,
/// `Platform:`, `Interface:`, `Port ID (outgoing port):`, `Capabilities:`.
pub fn parse_cdp_neighbors(text: &str, platform: Platform) -> (Vec<Neighbor>, Vec<String>) {
    let mut neighbors = Vec::new();
    let mut exceptions = Vec::new();

    for block in split_on_device_id(text) {
        match parse_cdp_block(&block, platform) {
            Some(n) => neighbors.push(n),
            None => exceptions.push(format!("unparsable CDP block: {:?}", block.lines().next().unwrap_or(""))),
        }
    }

    (neighbors, exceptions)
}

fn split_on_device_id(text: &str) -> Vec<String> {
    let marker_re = Regex::new(r"(?m)^\s*Device ID:").unwrap();
    let mut blocks = Vec::new();
    let mut starts: Vec<usize> = marker_re.find_iter(text).map(|m| m.start()).collect();
    starts.push(text.len());
    for w in starts.windows(2) {
        blocks.push(text[w[0]..w[1]].to_string());
    }
    blocks
}

fn parse_cdp_block(block: &str, platform: Platform) -> Option<Neighbor> {
    let raw_hostname = first_field(block, &["Device ID"])?;
    let remote_hostname = clean_hostname(raw_hostname);
    if remote_hostname.is_empty() {
        return None;
    }
    let remote_ip = first_field(block, &["IP address", "IPv4 Address", "Mgmt address"])
        .and_then(|s| s.parse().ok());
    let platform_str = first_field(block, &["Platform"]).map(|s| {
        s.split(',').next().unwrap_or(s).trim().to_string()
    });
    let (local_interface, remote_interface) = interface_pair_re()
        .captures(block)
        .map(|c| (c[1].to_string(), c[2].to_string()))?;

    Some(Neighbor {
        remote_hostname,
        remote_ip,
        local_interface: netwalker_normalize::normalize(&local_interface, platform),
        remote_interface: netwalker_normalize::normalize(&remote_interface, platform),
        platform: platform_str,
        capabilities: parse_capabilities(block),
        protocol: DiscoveryProtocol::Cdp,
    })
}

fn lldp_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*Chassis id:").unwrap())
}

/// Parses `show lldp neighbors detail` block-structured output, and falls
/// back to the tabular `show lldp neighbors` format when no detail blocks
/// are present.
pub fn parse_lldp_neighbors(text: &str, platform: Platform) -> (Vec<Neighbor>, Vec<String>) {
    if lldp_block_re().is_match(text) {
        parse_lldp_detail_blocks(text, platform)
    } else {
        parse_lldp_tabular(text, platform)
    }
}

fn parse_lldp_detail_blocks(text: &str, platform: Platform) -> (Vec<Neighbor>, Vec<String>) {
    let marker_re = Regex::new(r"(?m)^\s*Chassis id:").unwrap();
    let mut starts: Vec<usize> = marker_re.find_iter(text).map(|m| m.start()).collect();
    starts.push(text.len());

    let mut neighbors = Vec::new();
    let mut exceptions = Vec::new();
    for w in starts.windows(2) {
        let block = &text[w[0]..w[1]];
        match parse_lldp_detail_block(block, platform) {
            Some(n) => neighbors.push(n),
            None => exceptions.push(format!(
                "unparsable LLDP block: {:?}",
                block.lines().next().unwrap_or("")
            )),
        }
    }
    (neighbors, exceptions)
}

fn parse_lldp_detail_block(block: &str, platform: Platform) -> Option<Neighbor> {
    let raw_hostname = first_field(block, &["System Name"])?;
    let remote_hostname = clean_hostname(raw_hostname);
    if remote_hostname.is_empty() {
        return None;
    }
    let remote_ip = first_field(block, &["Management Addresses", "Management Address"])
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse().ok());
    let local_interface = first_field(block, &["Local Port id", "Local Intf"])?.to_string();
    let remote_interface = first_field(block, &["Port id", "Port Description"])?.to_string();
    let capabilities = first_field(block, &["System Capabilities", "Enabled Capabilities"])
        .map(|caps| {
            caps.split([',', ' '])
                .filter(|t| !t.trim().is_empty())
                .filter_map(Capability::parse_token)
                .collect()
        })
        .unwrap_or_default();

    Some(Neighbor {
        remote_hostname,
        remote_ip,
        local_interface: netwalker_normalize::normalize(&local_interface, platform),
        remote_interface: netwalker_normalize::normalize(&remote_interface, platform),
        platform: first_field(block, &["System Description"]).map(|s| s.to_string()),
        capabilities,
        protocol: DiscoveryProtocol::Lldp,
    })
}

fn lldp_tabular_row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^(\S+)\s+(\S+)\s+(\d+)\s+(\S*)\s+(\S+)\s*$").unwrap()
    })
}

fn parse_lldp_tabular(text: &str, platform: Platform) -> (Vec<Neighbor>, Vec<String>) {
    let mut neighbors = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("Local Intf") || trimmed.starts_with('-') {
            continue;
        }
        let Some(caps) = lldp_tabular_row_re().captures(trimmed) else {
            continue;
        };
        let remote_hostname = clean_hostname(&caps[2]);
        if remote_hostname.is_empty() {
            continue;
        }
        let capabilities = caps[4]
            .chars()
            .filter_map(|c| match c {
                'B' => Some(Capability::Bridge),
                'R' => Some(Capability::Router),
                'W' => Some(Capability::Wireless),
                'S' => Some(Capability::Station),
                _ => None,
            })
            .collect();
        neighbors.push(Neighbor {
            remote_hostname,
            remote_ip: None,
            local_interface: netwalker_normalize::normalize(&caps[1], platform),
            remote_interface: netwalker_normalize::normalize(&caps[5], platform),
            platform: None,
            capabilities,
            protocol: DiscoveryProtocol::Lldp,
        });
    }
    (neighbors, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CDP_DETAIL: &str = r#"-------------------------
Device ID: SW02.example.com
Entry address(es):
  IP address: 10.0.0.2
Platform: cisco WS-C2960X-24TS-L,  Capabilities: Switch IGMP
Interface: GigabitEthernet1/0/1,  Port ID (outgoing port): GigabitEthernet1/0/2
Holdtime : 123 sec

-------------------------
Device ID: SW03
Entry address(es):
  IPv4 Address: 10.0.0.3
Platform: cisco WS-C3850-24,  Capabilities: Router Switch IGMP
Interface: GigabitEthernet1/0/2,  Port ID (outgoing port): TenGigabitEthernet1/1
"#;

    #[test]
    fn parses_multiple_cdp_blocks() {
        let (neighbors, exceptions) = parse_cdp_neighbors(CDP_DETAIL, Platform::Ios);
        assert!(exceptions.is_empty());
        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].remote_hostname, "sw02.example.com");
        assert_eq!(neighbors[0].remote_ip, Some("10.0.0.2".parse().unwrap()));
        assert_eq!(neighbors[0].local_interface, "GigabitEthernet1/0/1");
        assert_eq!(neighbors[0].remote_interface, "GigabitEthernet1/0/2");
        assert!(neighbors[0].capabilities.contains(&Capability::Switch));
        assert_eq!(neighbors[1].remote_ip, Some("10.0.0.3".parse().unwrap()));
        assert!(neighbors[1].capabilities.contains(&Capability::Router));
    }

    const LLDP_DETAIL: &str = r#"Chassis id: aabb.ccdd.eeff
Port id: Gi1/0/10
Local Port id: Gi1/0/5
Port Description: GigabitEthernet1/0/10
System Name: SW04
System Description: Cisco IOS Software
System Capabilities: B, R
Management Addresses:
    IP: 10.0.0.4
"#;

    #[test]
    fn parses_lldp_detail_block() {
        let (neighbors, exceptions) = parse_lldp_neighbors(LLDP_DETAIL, Platform::Ios);
        assert!(exceptions.is_empty());
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].remote_hostname, "sw04");
        assert_eq!(neighbors[0].local_interface, "GigabitEthernet1/0/5");
        assert!(neighbors[0].capabilities.contains(&Capability::Bridge));
    }

    const LLDP_TABULAR: &str = r#"Local Intf    Device ID    Hold-time  Capability   Port ID
Gi1/0/1       sw05         120        B,R          Gi1/0/2
"#;

    #[test]
    fn parses_lldp_tabular_fallback() {
        let (neighbors, _) = parse_lldp_neighbors(LLDP_TABULAR, Platform::Ios);
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].remote_hostname, "sw05");
        assert_eq!(neighbors[0].local_interface, "GigabitEthernet1/0/1");
        assert_eq!(neighbors[0].remote_interface, "GigabitEthernet1/0/2");
    }
}

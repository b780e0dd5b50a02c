use netwalker_types::Vlan;
use regex::Regex;
use std::sync::OnceLock;

fn vlan_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The whitespace before the trailing port list is `\s*`, not `\s+`, so
    // a VLAN with no ports (nothing trailing the status column) still
    // matches.
    RE.get_or_init(|| Regex::new(r"^(\d+)\s+(\S+)\s+(\S+)\s*(.*)$").unwrap())
}

/// Parses `show vlan` / `show vlan brief` output. On NX-OS, a `VLAN
/// Type` section header ends the table so the following type-info rows
/// are never mistaken for VLAN names.
pub fn parse_vlans(text: &str) -> Vec<Vlan> {
    let mut vlans = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_end();
        if trimmed.trim_start().starts_with("VLAN Type") {
            break;
        }
        let Some(caps) = vlan_line_re().captures(trimmed) else {
            continue;
        };
        let Ok(number) = caps[1].parse::<u16>() else {
            continue;
        };
        if !(1..=4094).contains(&number) {
            continue;
        }
        let name = caps[2].to_string();
        let ports = caps[4].trim();
        let port_count = if ports.is_empty() {
            0
        } else {
            ports.split(',').filter(|p| !p.trim().is_empty()).count() as u32
        };
        vlans.push(Vlan {
            number,
            name,
            port_count: Some(port_count),
        });
    }
    vlans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vlan_with_zero_ports() {
        let vlans = parse_vlans("461 FW-RINGCENTRAL active");
        assert_eq!(vlans.len(), 1);
        assert_eq!(vlans[0].number, 461);
        assert_eq!(vlans[0].name, "FW-RINGCENTRAL");
        assert_eq!(vlans[0].port_count, Some(0));
    }

    #[test]
    fn parses_vlan_with_ports() {
        let vlans = parse_vlans("100  PROD_DATA  active    Eth1/1, Eth1/2");
        assert_eq!(vlans[0].port_count, Some(2));
    }

    #[test]
    fn stops_at_nxos_vlan_type_header() {
        let text = "1    default   active    Eth1/4\n\nVLAN Type\n---- -----\n1    enet\n";
        let vlans = parse_vlans(text);
        assert_eq!(vlans.len(), 1);
        assert_eq!(vlans[0].number, 1);
    }

    #[test]
    fn ignores_non_vlan_lines() {
        let text = "VLAN Name                             Status    Ports\n---- -------------------------------- --------- -------\n100  DATA   active    Eth1/1\n";
        let vlans = parse_vlans(text);
        assert_eq!(vlans.len(), 1);
        assert_eq!(vlans[0].number, 100);
    }
}

use netwalker_types::{Interface, InterfaceType, Platform};
use regex::Regex;
use std::sync::OnceLock;

fn interface_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(\S+) is (up|down|administratively down)").unwrap())
}

fn line_protocol_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"line protocol is (up|down)").unwrap())
}

fn ip_address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Internet address is (\d{1,3}(?:\.\d{1,3}){3})/(\d{1,2})").unwrap()
    })
}

fn classify(name: &str) -> InterfaceType {
    let lower = name.to_ascii_lowercase();
    if lower.starts_with("loopback") {
        InterfaceType::Loopback
    } else if lower.starts_with("vlan") {
        InterfaceType::Vlan
    } else if lower.starts_with("tunnel") {
        InterfaceType::Tunnel
    } else if lower.starts_with("port-channel") {
        InterfaceType::PortChannel
    } else if lower.starts_with("management") || lower.starts_with("mgmt") {
        InterfaceType::Management
    } else {
        InterfaceType::Physical
    }
}

/// Parses `show interfaces` (IOS/IOS-XE) block-structured output into a
/// list of `Interface`s. Each interface block starts at an "`<iface>` is
/// up/down" header line and runs until the next one.
pub fn parse_interfaces(text: &str, platform: Platform) -> Vec<Interface> {
    let header_re = interface_header_re();
    let mut starts: Vec<(usize, String, bool)> = header_re
        .captures_iter(text)
        .map(|c| {
            let pos = c.get(0).unwrap().start();
            let admin_up = &c[2] == "up";
            (pos, c[1].to_string(), admin_up)
        })
        .collect();
    starts.push((text.len(), String::new(), false));

    let mut interfaces = Vec::new();
    for window in starts.windows(2) {
        let (start, raw_name, admin_up) = &window[0];
        let end = window[1].0;
        if raw_name.is_empty() {
            continue;
        }
        let block = &text[*start..end];
        let canonical = netwalker_normalize::normalize(raw_name, platform);
        let oper_up = line_protocol_re().captures(block).map(|c| &c[1] == "up");
        let ipv4 = ip_address_re().captures(block).and_then(|c| {
            let addr = c[1].parse().ok()?;
            let mask: u8 = c[2].parse().ok()?;
            netwalker_types::Ipv4Cidr::new(addr, mask).ok()
        });

        interfaces.push(Interface {
            name: canonical.clone(),
            interface_type: classify(&canonical),
            ipv4,
            admin_up: Some(*admin_up),
            oper_up,
        });
    }
    interfaces
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOW_INTERFACES: &str = r#"GigabitEthernet1/0/1 is up, line protocol is up
  Hardware is Gigabit Ethernet, address is aabb.ccdd.0001
  Internet address is 10.1.1.1/24
  MTU 1500 bytes

Vlan100 is down, line protocol is down
  Hardware is EtherSVI

Loopback0 is up, line protocol is up
  Internet address is 192.168.0.1/32
"#;

    #[test]
    fn parses_multiple_interface_blocks() {
        let interfaces = parse_interfaces(SHOW_INTERFACES, Platform::Ios);
        assert_eq!(interfaces.len(), 3);
        assert_eq!(interfaces[0].name, "GigabitEthernet1/0/1");
        assert_eq!(interfaces[0].interface_type, InterfaceType::Physical);
        assert_eq!(interfaces[0].admin_up, Some(true));
        assert_eq!(interfaces[0].oper_up, Some(true));
        assert_eq!(interfaces[0].ipv4.unwrap().to_string(), "10.1.1.0/24");

        assert_eq!(interfaces[1].interface_type, InterfaceType::Vlan);
        assert_eq!(interfaces[1].admin_up, Some(false));

        assert_eq!(interfaces[2].interface_type, InterfaceType::Loopback);
        assert_eq!(interfaces[2].ipv4.unwrap().to_string(), "192.168.0.1/32");
    }

    #[test]
    fn classifies_port_channel_and_management() {
        assert_eq!(classify("Port-channel1"), InterfaceType::PortChannel);
        assert_eq!(classify("Management0"), InterfaceType::Management);
        assert_eq!(classify("mgmt0"), InterfaceType::Management);
    }
}

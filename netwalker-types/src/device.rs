use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cidr::Ipv4Cidr;

/// Platform family, detected from `show version` marker strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Ios,
    IosXe,
    NxOs,
    Unknown,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "IOS",
            Platform::IosXe => "IOS-XE",
            Platform::NxOs => "NX-OS",
            Platform::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A CDP/LLDP neighbor capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    Router,
    Switch,
    Bridge,
    Host,
    Phone,
    Camera,
    Printer,
    AccessPoint,
    Wireless,
    Station,
}

impl Capability {
    /// Parses a single whitespace/comma-tokenized capability word, as
    /// emitted by `show cdp neighbors detail` / `show lldp neighbors
    /// detail`. Unrecognized tokens are `None`.
    pub fn parse_token(token: &str) -> Option<Self> {
        let normalized = token.trim().trim_matches(',').to_ascii_lowercase();
        Some(match normalized.as_str() {
            "router" | "r" => Capability::Router,
            "switch" | "s" => Capability::Switch,
            "bridge" | "b" => Capability::Bridge,
            "host" | "h" => Capability::Host,
            "phone" => Capability::Phone,
            "camera" => Capability::Camera,
            "printer" => Capability::Printer,
            "access-point" | "access_point" | "ap" => Capability::AccessPoint,
            "wireless" | "w" | "wlan" => Capability::Wireless,
            "station" | "s-station" => Capability::Station,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Router => "router",
            Capability::Switch => "switch",
            Capability::Bridge => "bridge",
            Capability::Host => "host",
            Capability::Phone => "phone",
            Capability::Camera => "camera",
            Capability::Printer => "printer",
            Capability::AccessPoint => "access-point",
            Capability::Wireless => "wireless",
            Capability::Station => "station",
        }
    }
}

/// Logical interface type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterfaceType {
    Physical,
    Loopback,
    Vlan,
    Tunnel,
    Management,
    PortChannel,
}

/// A named port or logical interface on a device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub interface_type: InterfaceType,
    pub ipv4: Option<Ipv4Cidr>,
    pub admin_up: Option<bool>,
    pub oper_up: Option<bool>,
}

impl Interface {
    pub fn new(name: impl Into<String>, interface_type: InterfaceType) -> Self {
        Self {
            name: name.into(),
            interface_type,
            ipv4: None,
            admin_up: None,
            oper_up: None,
        }
    }
}

/// CDP or LLDP discovery protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscoveryProtocol {
    Cdp,
    Lldp,
}

/// A CDP/LLDP adjacency observed on a collected device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub remote_hostname: String,
    pub remote_ip: Option<Ipv4Addr>,
    pub local_interface: String,
    pub remote_interface: String,
    pub platform: Option<String>,
    pub capabilities: Vec<Capability>,
    pub protocol: DiscoveryProtocol,
}

/// A VLAN definition present on a device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vlan {
    pub number: u16,
    pub name: String,
    pub port_count: Option<u32>,
}

/// Source of a routed IPv4 prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrefixSource {
    Rib,
    Connected,
    Bgp,
}

/// An IPv4 prefix observed in a routing source on a device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prefix {
    pub cidr: Ipv4Cidr,
    pub vrf: String,
    pub source: PrefixSource,
    pub protocol_code: Option<char>,
}

/// A summary-to-component relationship found within one device's VRF: the
/// summary strictly contains the component, by subnet math.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrefixSummary {
    pub vrf: String,
    pub summary: Ipv4Cidr,
    pub component: Ipv4Cidr,
}

/// Role of a physical switch within a stack or VSS pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StackRole {
    Active,
    Standby,
    Master,
    Member,
}

/// One physical switch participating in a logical stack or VSS.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StackMember {
    pub member_number: u8,
    pub role: StackRole,
    pub hardware_model: String,
    pub serial_number: String,
}

/// Identity and version fields extracted from `show version` / `show
/// inventory`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub hostname: String,
    pub platform: Platform,
    pub software_version: String,
    pub serial_numbers: Vec<String>,
    pub hardware_model: String,
    pub uptime: Option<String>,
}

/// The output of collecting one device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceReport {
    pub hostname: String,
    pub platform: Platform,
    pub software_version: String,
    pub serial_numbers: Vec<String>,
    pub hardware_model: String,
    pub uptime: Option<String>,
    pub interfaces: Vec<Interface>,
    pub vlans: Vec<Vlan>,
    pub neighbors: Vec<Neighbor>,
    pub prefixes: Vec<Prefix>,
    pub prefix_summaries: Vec<PrefixSummary>,
    pub prefix_exceptions: Vec<String>,
    pub stack_members: Vec<StackMember>,
    pub primary_ip: Option<Ipv4Addr>,
    pub collected_at: DateTime<Utc>,
    pub partial: bool,
}

impl DeviceReport {
    /// A successful report always has a non-empty cleaned hostname.
    /// Construct from a parsed `DeviceIdentity`; callers that cannot
    /// produce one (parse failure on `show version`) must not call this
    /// and should instead emit `DeviceStatus::CollectFailed`.
    pub fn new(identity: DeviceIdentity, collected_at: DateTime<Utc>) -> Self {
        Self {
            hostname: identity.hostname,
            platform: identity.platform,
            software_version: identity.software_version,
            serial_numbers: identity.serial_numbers,
            hardware_model: identity.hardware_model,
            uptime: identity.uptime,
            interfaces: Vec::new(),
            vlans: Vec::new(),
            neighbors: Vec::new(),
            prefixes: Vec::new(),
            prefix_summaries: Vec::new(),
            prefix_exceptions: Vec::new(),
            stack_members: Vec::new(),
            primary_ip: None,
            collected_at,
            partial: false,
        }
    }

    /// The serial number used as identity alongside `hostname` in the
    /// Inventory Store. Standalone devices report exactly one serial;
    /// stacks report one per member in `serial_numbers`, and the *first*
    /// is the device-row identity.
    pub fn primary_serial(&self) -> Option<&str> {
        self.serial_numbers.first().map(String::as_str)
    }
}

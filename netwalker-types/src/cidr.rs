use std::net::Ipv4Addr;

use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;

const IPV4_LENGTH: u8 = 32;

#[derive(Error, Debug)]
pub enum Ipv4CidrError {
    #[error("invalid netmask")]
    InvalidNetmask,
    #[error("invalid IPv4 address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),
}

/// A canonical IPv4 network: a network address with a prefix length, with
/// every address bit outside the mask forced to zero.
#[derive(
    Clone, Copy, Debug, PartialOrd, Ord, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct Ipv4Cidr {
    addr: Ipv4Addr,
    mask: u8,
}

impl Ipv4Cidr {
    pub fn new(addr: Ipv4Addr, mask: u8) -> Result<Self, Ipv4CidrError> {
        if mask > IPV4_LENGTH {
            return Err(Ipv4CidrError::InvalidNetmask);
        }
        Ok(Self { addr, mask }.canonical())
    }

    /// Build a CIDR from a dotted-quad subnet mask (e.g. `255.255.255.0`)
    /// instead of a prefix length, as seen in `show ip route` mask-form
    /// output.
    pub fn from_address_and_netmask(addr: Ipv4Addr, netmask: Ipv4Addr) -> Result<Self, Ipv4CidrError> {
        let bits = netmask.to_bits();
        // a valid netmask is a contiguous run of one-bits from the top.
        let mask = bits.leading_ones() as u8;
        if bits != (u32::MAX.checked_shl((32 - mask) as u32).unwrap_or(0)) {
            return Err(Ipv4CidrError::InvalidNetmask);
        }
        Self::new(addr, mask)
    }

    pub fn address(&self) -> Ipv4Addr {
        self.addr
    }

    pub fn mask(&self) -> u8 {
        self.mask
    }

    fn normalize(addr: u32, mask: u8) -> u32 {
        addr & u32::MAX.checked_shl((32 - mask) as u32).unwrap_or(0)
    }

    /// The network address with the host bits zeroed out.
    pub fn canonical(&self) -> Self {
        Self {
            addr: Ipv4Addr::from_bits(Self::normalize(self.addr.to_bits(), self.mask)),
            mask: self.mask,
        }
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        Self::normalize(self.addr.to_bits(), self.mask) == Self::normalize(ip.to_bits(), self.mask)
    }

    /// Whether `self` strictly contains `other` (same prefix, shorter
    /// mask, and not identical) — used by prefix summarization to drop
    /// components already covered by a broader aggregate.
    pub fn strictly_contains(&self, other: &Ipv4Cidr) -> bool {
        self.mask < other.mask
            && Self::normalize(self.addr.to_bits(), self.mask)
                == Self::normalize(other.addr.to_bits(), self.mask)
    }
}

impl std::str::FromStr for Ipv4Cidr {
    type Err = Ipv4CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((addr, mask)) => Self::new(
                addr.parse()?,
                mask.parse::<u8>().map_err(|_| Ipv4CidrError::InvalidNetmask)?,
            ),
            None => Self::new(s.parse()?, 32),
        }
    }
}

impl std::fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_host_bits() {
        let cidr: Ipv4Cidr = "10.1.1.55/24".parse().unwrap();
        assert_eq!(cidr.to_string(), "10.1.1.0/24");
    }

    #[test]
    fn round_trips_canonical_form() {
        for input in ["10.0.0.0/8", "192.168.1.0/24", "0.0.0.0/0", "10.1.1.1/32"] {
            let cidr: Ipv4Cidr = input.parse().unwrap();
            assert_eq!(cidr.to_string(), input);
        }
    }

    #[test]
    fn parses_netmask_form() {
        let cidr =
            Ipv4Cidr::from_address_and_netmask("172.16.5.0".parse().unwrap(), "255.255.255.0".parse().unwrap())
                .unwrap();
        assert_eq!(cidr.to_string(), "172.16.5.0/24");
    }

    #[test]
    fn rejects_non_contiguous_netmask() {
        assert!(Ipv4Cidr::from_address_and_netmask(
            "10.0.0.0".parse().unwrap(),
            "255.0.255.0".parse().unwrap(),
        )
        .is_err());
    }

    #[test]
    fn strict_containment() {
        let summary: Ipv4Cidr = "10.0.0.0/8".parse().unwrap();
        let component: Ipv4Cidr = "10.1.0.0/16".parse().unwrap();
        assert!(summary.strictly_contains(&component));
        assert!(!component.strictly_contains(&summary));
        assert!(!summary.strictly_contains(&summary));
    }
}

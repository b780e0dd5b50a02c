use std::fmt::Display;

use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MacAddressError {
    #[error("mac address must have exactly 6 octets")]
    InvalidLength,
    #[error("mac address contains a non-hex octet")]
    InvalidSymbols,
}

/// EUI-48 MAC address, as reported by `show switch detail` / `show mod`.
#[derive(
    Clone, Copy, Debug, DeserializeFromStr, SerializeDisplay, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl std::str::FromStr for MacAddress {
    type Err = MacAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Strips both the colon/dash byte-grouped form (`aa:bb:cc:11:22:33`)
        // and the Cisco dot-grouped form (`aabb.cc11.2233`) down to a flat
        // run of hex digits, since either grouping yields the same 12 nibbles.
        let hex: String = s.chars().filter(|c| !matches!(c, '.' | ':' | '-')).collect();
        if hex.len() != 12 {
            return Err(MacAddressError::InvalidLength);
        }

        let mut octets = [0u8; 6];
        for (octet, chunk) in octets.iter_mut().zip(hex.as_bytes().chunks(2)) {
            let byte_str = std::str::from_utf8(chunk).map_err(|_| MacAddressError::InvalidSymbols)?;
            *octet = u8::from_str_radix(byte_str, 16).map_err(|_| MacAddressError::InvalidSymbols)?;
        }

        Ok(Self(octets))
    }
}

impl Display for MacAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_colon_and_dot_forms() {
        let a: MacAddress = "aa:bb:cc:11:22:33".parse().unwrap();
        let b: MacAddress = "aabb.cc11.2233".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "AA:BB:CC:11:22:33");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("aa:bb:cc:11:22".parse::<MacAddress>().is_err());
        assert!("zz:bb:cc:11:22:33".parse::<MacAddress>().is_err());
        assert!("".parse::<MacAddress>().is_err());
    }
}

//! IPv4 address and prefix types with safe parsing.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// An IPv4 address wrapper with dotted-quad parsing and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ipv4Address(Ipv4Addr);

impl Ipv4Address {
    pub const fn new(a: u8, b: u8, c: u8, d: u8) -> Self {
        Ipv4Address(Ipv4Addr::new(a, b, c, d))
    }

    pub const fn inner(&self) -> Ipv4Addr {
        self.0
    }

    pub const fn octets(&self) -> [u8; 4] {
        self.0.octets()
    }
}

impl fmt::Display for Ipv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Ipv4Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Ipv4Addr>()
            .map(Ipv4Address)
            .map_err(|_| ParseError::InvalidIpAddress(s.to_string()))
    }
}

impl From<Ipv4Addr> for Ipv4Address {
    fn from(addr: Ipv4Addr) -> Self {
        Ipv4Address(addr)
    }
}

impl From<Ipv4Address> for Ipv4Addr {
    fn from(addr: Ipv4Address) -> Self {
        addr.0
    }
}

impl From<u32> for Ipv4Address {
    fn from(bits: u32) -> Self {
        Ipv4Address(Ipv4Addr::from(bits))
    }
}

impl From<Ipv4Address> for u32 {
    fn from(addr: Ipv4Address) -> Self {
        u32::from(addr.0)
    }
}

/// An IPv4 network prefix in CIDR notation (e.g., 10.0.0.0/24).
///
/// Provides the derived addresses the sync daemon works with: the dotted
/// netmask, the broadcast address, and the gateway address (one below the
/// broadcast address).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ipv4Net {
    address: Ipv4Address,
    prefix_len: u8,
}

impl Ipv4Net {
    /// Creates a new IPv4 prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix length exceeds 32.
    pub fn new(address: Ipv4Address, prefix_len: u8) -> Result<Self, ParseError> {
        if prefix_len > 32 {
            return Err(ParseError::InvalidIpPrefix(format!(
                "prefix length {} exceeds maximum 32",
                prefix_len
            )));
        }

        Ok(Ipv4Net {
            address,
            prefix_len,
        })
    }

    /// Returns the address part of this prefix.
    pub const fn address(&self) -> &Ipv4Address {
        &self.address
    }

    /// Returns the prefix length in bits.
    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Returns the dotted-quad netmask of this prefix.
    pub fn netmask(&self) -> Ipv4Address {
        let bits = if self.prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - self.prefix_len)
        };
        Ipv4Address::from(bits)
    }

    /// Returns the broadcast address of this prefix.
    pub fn broadcast(&self) -> Ipv4Address {
        let mask = u32::from(self.netmask());
        let network = u32::from(self.address) & mask;
        Ipv4Address::from(network | !mask)
    }

    /// Returns the gateway address: one below the broadcast address.
    pub fn gateway(&self) -> Ipv4Address {
        Ipv4Address::from(u32::from(self.broadcast()).wrapping_sub(1))
    }
}

impl fmt::Display for Ipv4Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for Ipv4Net {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_str, len_str) = s
            .rsplit_once('/')
            .ok_or_else(|| ParseError::InvalidIpPrefix(s.to_string()))?;

        let address: Ipv4Address = addr_str.parse()?;
        let prefix_len: u8 = len_str
            .parse()
            .map_err(|_| ParseError::InvalidIpPrefix(s.to_string()))?;

        Ipv4Net::new(address, prefix_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ipv4_parse() {
        let addr: Ipv4Address = "192.168.1.1".parse().unwrap();
        assert_eq!(addr.octets(), [192, 168, 1, 1]);
    }

    #[test]
    fn test_ipv4_parse_invalid() {
        assert!("192.168.1".parse::<Ipv4Address>().is_err());
        assert!("not-an-address".parse::<Ipv4Address>().is_err());
    }

    #[test]
    fn test_prefix_parse() {
        let net: Ipv4Net = "10.0.0.0/24".parse().unwrap();
        assert_eq!(net.prefix_len(), 24);
        assert_eq!(net.address().to_string(), "10.0.0.0");
    }

    #[test]
    fn test_invalid_prefix() {
        assert!("10.0.0.0/33".parse::<Ipv4Net>().is_err());
        assert!("10.0.0.0".parse::<Ipv4Net>().is_err());
        assert!("10.0.0/24".parse::<Ipv4Net>().is_err());
    }

    #[test]
    fn test_netmask() {
        let net: Ipv4Net = "10.0.0.0/24".parse().unwrap();
        assert_eq!(net.netmask().to_string(), "255.255.255.0");

        let net: Ipv4Net = "172.16.0.0/20".parse().unwrap();
        assert_eq!(net.netmask().to_string(), "255.255.240.0");

        let net: Ipv4Net = "0.0.0.0/0".parse().unwrap();
        assert_eq!(net.netmask().to_string(), "0.0.0.0");
    }

    #[test]
    fn test_broadcast() {
        let net: Ipv4Net = "10.0.0.0/24".parse().unwrap();
        assert_eq!(net.broadcast().to_string(), "10.0.0.255");

        // The host part of the address is ignored
        let net: Ipv4Net = "10.0.0.17/24".parse().unwrap();
        assert_eq!(net.broadcast().to_string(), "10.0.0.255");
    }

    #[test]
    fn test_gateway_derivation() {
        let net: Ipv4Net = "10.0.0.0/24".parse().unwrap();
        assert_eq!(net.gateway().to_string(), "10.0.0.254");
        assert_eq!(net.netmask().to_string(), "255.255.255.0");

        let net: Ipv4Net = "192.168.48.0/22".parse().unwrap();
        assert_eq!(net.gateway().to_string(), "192.168.51.254");
        assert_eq!(net.netmask().to_string(), "255.255.252.0");
    }

    #[test]
    fn test_display() {
        let net: Ipv4Net = "192.168.0.0/16".parse().unwrap();
        assert_eq!(net.to_string(), "192.168.0.0/16");
    }
}

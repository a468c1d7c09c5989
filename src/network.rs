use heapless::Vec;

use crate::checks;

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    MissingGateway,
    MissingSubnet,
    InvalidSubnet,
}

/// IPv4 addressing of the station interface
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IpSettings {
    Dhcp,
    Static(StaticIp),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticIp {
    pub address: [u8; 4],
    pub gateway: [u8; 4],
    pub prefix_len: u8,
    pub dns: Vec<[u8; 4], 2>,
}

impl IpSettings {
    /// An absent or unspecified (0.0.0.0) address selects DHCP, the other
    /// parts are then ignored.
    pub fn from_parts(
        address: Option<[u8; 4]>,
        gateway: Option<[u8; 4]>,
        subnet: Option<[u8; 4]>,
        primary_dns: Option<[u8; 4]>,
        secondary_dns: Option<[u8; 4]>,
    ) -> Result<Self, Error> {
        let address = match address {
            Some(address) if address != [0; 4] => address,
            _ => return Ok(Self::Dhcp),
        };

        let gateway = gateway.ok_or(Error::MissingGateway)?;
        let prefix_len = subnet_to_prefix(subnet.ok_or(Error::MissingSubnet)?)?;

        let dns = [primary_dns, secondary_dns].into_iter().flatten().collect();

        Ok(Self::Static(StaticIp {
            address,
            gateway,
            prefix_len,
            dns,
        }))
    }
}

/// Converts a dotted subnet mask to a prefix length, rejecting masks whose
/// ones aren't contiguous.
pub fn subnet_to_prefix(mask: [u8; 4]) -> Result<u8, Error> {
    checks::subnet_prefix(mask).ok_or(Error::InvalidSubnet)
}

/// Parses a dotted-quad IPv4 literal, `None` for anything else (host names).
pub fn parse_ipv4(host: &str) -> Option<[u8; 4]> {
    let mut octets = [0u8; 4];
    let mut parts = host.split('.');
    for octet in octets.iter_mut() {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *octet = part.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(octets)
}

//! Configuration checks, shared with `build.rs` so an invalid `cfg.toml`
//! fails the build with the same rules the firmware relies on.
//!
//! Only `core` is used here, the build script includes this file by path.

use core::fmt;

/// Upper bound for the number of reads averaged in one cycle
pub const MAX_READS: usize = 16;
/// The client ID doubles as DHCP hostname, which is limited to this length
pub const HOSTNAME_MAX_LEN: usize = 32;

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// A count or duration is zero
    Zero(&'static str),
    TooManyReads,
    ClientId,
    Topic(&'static str),
    Coefficient(&'static str),
    MissingGateway,
    MissingSubnet,
    InvalidSubnet,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Zero(name) => write!(f, "{name} must be at least 1"),
            Error::TooManyReads => write!(f, "n_reads must be at most {MAX_READS}"),
            Error::ClientId => write!(
                f,
                "mqtt_client_id must be 1 to {HOSTNAME_MAX_LEN} ASCII letters, digits, '-' or '_'"
            ),
            Error::Topic(name) => write!(f, "{name} must be a non-empty topic without wildcards"),
            Error::Coefficient(name) => {
                write!(f, "{name} calibration must be finite with a non-zero slope")
            }
            Error::MissingGateway => write!(f, "static_ip requires a gateway"),
            Error::MissingSubnet => write!(f, "static_ip requires a subnet"),
            Error::InvalidSubnet => write!(f, "subnet is not a contiguous mask"),
        }
    }
}

pub fn non_zero(name: &'static str, value: u64) -> Result<(), Error> {
    if value == 0 {
        return Err(Error::Zero(name));
    }
    Ok(())
}

pub fn reads(n_reads: usize) -> Result<(), Error> {
    non_zero("n_reads", n_reads as u64)?;
    if n_reads > MAX_READS {
        return Err(Error::TooManyReads);
    }
    Ok(())
}

/// The client ID ends up as DHCP hostname and unescaped inside the JSON and
/// Influx payloads, so it is restricted to hostname-safe characters.
pub fn client_id(id: &str) -> Result<(), Error> {
    let valid_char = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
    if id.is_empty() || id.len() > HOSTNAME_MAX_LEN || !id.chars().all(valid_char) {
        return Err(Error::ClientId);
    }
    Ok(())
}

/// Publish topics can't be empty or hold the `+`/`#` wildcards.
pub fn topic(name: &'static str, topic: &str) -> Result<(), Error> {
    if topic.is_empty() || topic.contains(['+', '#']) {
        return Err(Error::Topic(name));
    }
    Ok(())
}

pub fn coefficients(name: &'static str, slope: f32, shift: f32) -> Result<(), Error> {
    if !slope.is_finite() || slope == 0.0 || !shift.is_finite() {
        return Err(Error::Coefficient(name));
    }
    Ok(())
}

/// Prefix length of a dotted subnet mask, `None` when the ones aren't
/// contiguous.
pub fn subnet_prefix(mask: [u8; 4]) -> Option<u8> {
    let bits = u32::from_be_bytes(mask);
    let prefix = bits.leading_ones();
    if bits.checked_shl(prefix).unwrap_or(0) != 0 {
        return None;
    }
    Some(prefix as u8)
}

/// A static address (anything but absent or 0.0.0.0) needs a gateway and a
/// valid subnet. A subnet given without an address must still be valid.
pub fn static_ip(
    address: Option<[u8; 4]>,
    gateway: Option<[u8; 4]>,
    subnet: Option<[u8; 4]>,
) -> Result<(), Error> {
    if let Some(subnet) = subnet {
        subnet_prefix(subnet).ok_or(Error::InvalidSubnet)?;
    }
    if address.is_some_and(|address| address != [0; 4]) {
        gateway.ok_or(Error::MissingGateway)?;
        subnet.ok_or(Error::MissingSubnet)?;
    }
    Ok(())
}

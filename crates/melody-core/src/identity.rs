//! Client identity hashing
//!
//! Callers are rate limited by a one-way hash of their network address so the raw
//! address never reaches the database or the logs.

use sha2::{Digest, Sha256};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Hashed, non-reversible representation of a caller's address.
///
/// Always a 64 character lowercase hex SHA-256 digest.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClientIdentifier(String);

impl ClientIdentifier {
    /// Hash a raw address after stripping any port segment.
    ///
    /// Never fails: input that is not an address is hashed as-is.
    pub fn from_address(raw_address: &str) -> Self {
        let host = strip_port(raw_address.trim());
        let digest = Sha256::digest(host.as_bytes());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ClientIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Remove a trailing `:port` from `host:port` or `[v6]:port`.
///
/// Bare IPv6 addresses are left untouched.
fn strip_port(address: &str) -> &str {
    if address.parse::<IpAddr>().is_ok() {
        return address;
    }
    if let Ok(socket) = address.parse::<SocketAddr>() {
        return match socket {
            SocketAddr::V4(_) => address.rsplit_once(':').map_or(address, |(host, _)| host),
            SocketAddr::V6(_) => address
                .strip_prefix('[')
                .and_then(|rest| rest.split_once(']'))
                .map_or(address, |(host, _)| host),
        };
    }
    if let Some(inner) = address.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        return inner;
    }
    match address.split_once(':') {
        // Exactly one colon: hostname:port
        Some((host, port)) if !port.contains(':') => host,
        _ => address,
    }
}

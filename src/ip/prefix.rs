//! Canonical IPv4 prefixes.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::addr::{self, BITS};

/// Errors produced while parsing a prefix from CIDR text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrefixError {
    #[error("Missing prefix length in '{0}'")]
    MissingLength(String),

    #[error("Invalid address in '{0}'")]
    InvalidAddress(String),

    #[error("Invalid prefix length in '{0}'")]
    InvalidLength(String),
}

/// An IPv4 address range written as base address and prefix length.
///
/// A `Prefix` is always canonical: every bit past `len` is zero. Ordering is
/// by base address first, then by length, so a larger block sorts before the
/// smaller blocks that share its base address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Prefix {
    addr: Ipv4Addr,
    len: u8,
}

impl Prefix {
    /// Build a prefix, masking `addr` down to `len` bits.
    ///
    /// A `len` wider than the address space is clamped: `Prefix::new(addr, 40)`
    /// is the `/32` of `addr`. Use [`Prefix::try_new`] to reject such lengths.
    pub fn new(addr: Ipv4Addr, len: u8) -> Self {
        let len = len.min(BITS);
        Prefix {
            addr: Ipv4Addr::from(u32::from(addr) & addr::mask(len)),
            len,
        }
    }

    /// Build a prefix, rejecting lengths wider than the address space.
    pub fn try_new(addr: Ipv4Addr, len: u8) -> Result<Self, PrefixError> {
        if len > BITS {
            return Err(PrefixError::InvalidLength(format!("{}/{}", addr, len)));
        }
        Ok(Self::new(addr, len))
    }

    /// Base (network) address.
    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }

    /// Prefix length in bits.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u8 {
        self.len
    }

    /// Last address covered by this prefix.
    pub fn last_address(&self) -> Ipv4Addr {
        addr::last_address(self)
    }

    /// True if `addr` falls inside this prefix.
    pub fn contains_addr(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & addr::mask(self.len) == u32::from(self.addr)
    }

    /// True if `other` is entirely covered by this prefix.
    pub fn contains(&self, other: &Prefix) -> bool {
        self.len <= other.len && self.contains_addr(other.addr)
    }

    /// True if the two ranges share at least one address.
    ///
    /// Prefixes are nodes of the same binary trie, so they overlap exactly
    /// when one contains the other.
    pub fn overlaps(&self, other: &Prefix) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.len)
    }
}

impl FromStr for Prefix {
    type Err = PrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, len) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| PrefixError::MissingLength(s.to_string()))?;

        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| PrefixError::InvalidAddress(s.to_string()))?;
        let len: u8 = len
            .parse()
            .map_err(|_| PrefixError::InvalidLength(s.to_string()))?;

        Prefix::try_new(addr, len).map_err(|_| PrefixError::InvalidLength(s.to_string()))
    }
}

impl Serialize for Prefix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Prefix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

//! Address pools.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::addr::{self, BITS};
use super::prefix::Prefix;

/// A source address range plus the length of every subnet carved from it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pool {
    pub prefix: Prefix,
    pub size: u8,
}

impl Pool {
    pub fn new(prefix: Prefix, size: u8) -> Self {
        Pool { prefix, size }
    }

    /// Why this pool cannot be used, if anything.
    pub fn check(&self) -> Result<(), String> {
        if self.prefix.len() == 0 {
            return Err("zero prefix".to_string());
        }
        if self.size < self.prefix.len() {
            return Err(format!(
                "allocation size /{} is larger than the pool itself",
                self.size
            ));
        }
        if self.size > BITS {
            return Err(format!("allocation size /{} exceeds /{}", self.size, BITS));
        }
        Ok(())
    }

    /// First subnet of the pool.
    pub fn first_subnet(&self) -> Prefix {
        Prefix::new(self.prefix.addr(), self.size)
    }

    /// Number of subnets the pool hands out when empty.
    pub fn capacity(&self) -> u64 {
        1u64 << self.size.saturating_sub(self.prefix.len()).min(BITS)
    }

    /// Next allocation-sized subnet after the one holding `prev`'s last
    /// address, or `None` when that runs off the end of the pool.
    pub fn next_subnet_after(&self, prev: &Prefix) -> Option<Prefix> {
        let tail = Prefix::new(prev.last_address(), self.size);
        let next = addr::add(tail.addr(), 1, BITS.saturating_sub(self.size))?;
        let candidate = Prefix::new(next, self.size);

        self.prefix.overlaps(&candidate).then_some(candidate)
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.prefix, self.size)
    }
}

//! Fixed-width address arithmetic.
//!
//! Every function here works on 32-bit IPv4 addresses. The allocator only
//! ever needs to step by whole subnets and to measure gaps between two
//! grid-aligned points, so the helpers are deliberately small.

use std::net::Ipv4Addr;

use super::prefix::Prefix;

/// Width of the address space, in bits.
pub const BITS: u8 = Ipv4Addr::BITS as u8;

/// Network mask with the `len` leading bits set.
pub fn mask(len: u8) -> u32 {
    u32::MAX
        .checked_shl(u32::from(BITS.saturating_sub(len)))
        .unwrap_or(0)
}

/// The address right after `addr`, or `None` at the top of the space.
pub fn successor(addr: Ipv4Addr) -> Option<Ipv4Addr> {
    u32::from(addr).checked_add(1).map(Ipv4Addr::from)
}

/// The address right before `addr`, or `None` at `0.0.0.0`.
pub fn predecessor(addr: Ipv4Addr) -> Option<Ipv4Addr> {
    u32::from(addr).checked_sub(1).map(Ipv4Addr::from)
}

/// Returns `addr + (x << shift)`.
///
/// Yields `None` instead of wrapping when the result does not fit in the
/// address space.
pub fn add(addr: Ipv4Addr, x: u64, shift: u8) -> Option<Ipv4Addr> {
    let offset = 1u64.checked_shl(u32::from(shift))?.checked_mul(x)?;
    let sum = u64::from(u32::from(addr)).checked_add(offset)?;
    u32::try_from(sum).ok().map(Ipv4Addr::from)
}

/// Returns `a - b`. Only meaningful for `a >= b`; saturates to 0 otherwise.
pub fn subtract(a: Ipv4Addr, b: Ipv4Addr) -> u32 {
    u32::from(a).saturating_sub(u32::from(b))
}

/// Last (broadcast) address covered by `prefix`.
pub fn last_address(prefix: &Prefix) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(prefix.addr()) | !mask(prefix.len()))
}

/// Number of whole subnets of length `size` between the grid points of `p1`
/// and `p2`.
///
/// Both base addresses are first truncated to `size` bits. This is a
/// threshold measure ("is there room for N subnets"), not an exact offset.
pub fn distance(p1: &Prefix, p2: &Prefix, size: u8) -> u32 {
    let from = Prefix::new(p1.addr(), size);
    let to = Prefix::new(p2.addr(), size);

    subtract(to.addr(), from.addr())
        .checked_shr(u32::from(BITS.saturating_sub(size)))
        .unwrap_or(0)
}

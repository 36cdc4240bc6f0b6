//! Subnet allocation across address pools.
//!
//! The allocator hands out the lowest free subnet of the first pool that
//! still has room. Free space is found with a single ascending scan over the
//! allocation list merged with a caller-supplied list of reserved ranges, so
//! a request costs time linear in the number of known blocks.

use log::{debug, trace};

use super::addr;
use super::cursor::MergeCursor;
use super::pool::Pool;
use super::prefix::Prefix;

/// Errors returned by [`Allocator`] operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    #[error("Invalid pool {pool}: {reason}")]
    InvalidPool { pool: Pool, reason: String },

    #[error("No free address pools")]
    NoFreePool,

    #[error("Prefix {0} is not valid")]
    InvalidPrefix(Prefix),

    #[error("Prefix {prefix} overlaps with {existing}")]
    Overlap { prefix: Prefix, existing: Prefix },

    #[error("{0} is not allocated")]
    NotAllocated(Prefix),
}

/// Tracks allocated subnets over a fixed, sorted set of pools.
///
/// `allocated` is kept sorted by base address and never holds two
/// overlapping entries. The allocator does no locking: mutation goes through
/// `&mut self`, so sharing one between threads takes a `Mutex` or a single
/// owner on the caller's side.
#[derive(Debug, Clone)]
pub struct Allocator {
    pools: Vec<Pool>,
    allocated: Vec<Prefix>,
}

impl Allocator {
    /// Create an allocator over `pools`.
    ///
    /// Pools are checked, then sorted by base address and length. They are
    /// scanned in that order for every request.
    pub fn new(mut pools: Vec<Pool>) -> Result<Self, AllocError> {
        for pool in &pools {
            pool.check().map_err(|reason| AllocError::InvalidPool {
                pool: *pool,
                reason,
            })?;
        }
        pools.sort_by_key(|pool| pool.prefix);

        debug!("Allocator created with {} pool(s)", pools.len());
        Ok(Allocator {
            pools,
            allocated: Vec::new(),
        })
    }

    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    /// Current allocations, sorted by base address.
    pub fn allocated(&self) -> &[Prefix] {
        &self.allocated
    }

    pub fn len(&self) -> usize {
        self.allocated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocated.is_empty()
    }

    /// True if exactly `prefix` (same base and length) is allocated.
    pub fn is_allocated(&self, prefix: &Prefix) -> bool {
        self.allocated.binary_search(prefix).is_ok()
    }

    /// Allocate the next free subnet without any reserved ranges.
    pub fn allocate(&mut self) -> Result<Prefix, AllocError> {
        self.allocate_next(&[])
    }

    /// Allocate the lowest free subnet that conflicts neither with existing
    /// allocations nor with `reserved`.
    ///
    /// `reserved` must be sorted by address and free of overlaps; it is not
    /// checked. Returns [`AllocError::NoFreePool`] when every pool is used up,
    /// in which case nothing changes.
    pub fn allocate_next(&mut self, reserved: &[Prefix]) -> Result<Prefix, AllocError> {
        let (index, prefix) = self
            .find_next(reserved)
            .inspect_err(|_| debug!("No free subnet left in {} pool(s)", self.pools.len()))?;

        self.allocated.insert(index, prefix);
        debug_assert!(self.is_consistent(), "allocation list out of order after inserting {}", prefix);

        debug!("Allocated {}", prefix);
        Ok(prefix)
    }

    /// Find the subnet to allocate and the index where it goes in
    /// `allocated`.
    fn find_next(&self, reserved: &[Prefix]) -> Result<(usize, Prefix), AllocError> {
        let mut pool_id = 0;
        // Allocation-sized block holding the end of the furthest unavailable
        // range seen inside the current pool.
        let mut partial: Option<Prefix> = None;

        let mut cursor = MergeCursor::new(&self.allocated, reserved, |a: &Prefix, b: &Prefix| {
            a.addr() < b.addr()
        });

        while let Some(unavailable) = cursor.peek() {
            let pool = self.pools.get(pool_id).ok_or(AllocError::NoFreePool)?;
            let index = cursor.position_a();

            if unavailable.overlaps(&pool.prefix) {
                if unavailable.len() <= pool.prefix.len() {
                    trace!("{} covers pool {}", unavailable, pool);
                    // A block reaching past this pool may cover the next one too.
                    if unavailable.last_address() == pool.prefix.last_address() {
                        cursor.advance();
                    }
                    partial = None;
                    pool_id += 1;
                    continue;
                }

                cursor.advance();

                let free = match partial {
                    None if addr::distance(&pool.first_subnet(), unavailable, pool.size) >= 1 => {
                        Some(pool.first_subnet())
                    }
                    Some(prev) if addr::distance(&prev, unavailable, pool.size) >= 2 => {
                        pool.next_subnet_after(&prev)
                    }
                    _ => None,
                };
                if let Some(free) = free {
                    return Ok((index, free));
                }

                if unavailable.last_address() == pool.prefix.last_address() {
                    trace!("{} reaches the end of pool {}", unavailable, pool);
                    partial = None;
                    pool_id += 1;
                    continue;
                }

                let tail = Prefix::new(unavailable.last_address(), pool.size);
                partial = Some(partial.map_or(tail, |prev| prev.max(tail)));
                continue;
            }

            // The pool was partially used and this block lies past it: what is
            // left after the last used block is the only candidate.
            if let Some(prev) = partial.take() {
                if let Some(free) = pool.next_subnet_after(&prev) {
                    return Ok((index, free));
                }
                trace!("Pool {} is full", pool);
                pool_id += 1;
                // Re-test the same block against the next pool.
                continue;
            }

            if pool.prefix.addr() < unavailable.addr() {
                return Ok((index, pool.first_subnet()));
            }

            cursor.advance();
        }

        if let Some(prev) = partial {
            if let Some(free) = self.pools.get(pool_id).and_then(|pool| pool.next_subnet_after(&prev)) {
                return Ok((cursor.position_a(), free));
            }
            pool_id += 1;
        }

        // Whatever pool is left was never touched by the scan.
        self.pools
            .get(pool_id)
            .map(|pool| (self.allocated.len(), pool.first_subnet()))
            .ok_or(AllocError::NoFreePool)
    }

    /// Mark `prefix` as allocated if it overlaps no existing allocation.
    ///
    /// Pools are not consulted: any block may be taken this way.
    pub fn allocate_static(&mut self, prefix: Prefix) -> Result<(), AllocError> {
        if prefix.len() == 0 {
            return Err(AllocError::InvalidPrefix(prefix));
        }

        let index = self.allocated.partition_point(|p| p.addr() < prefix.addr());

        // Only the neighbours at the insertion point can overlap.
        let before = index.checked_sub(1).and_then(|i| self.allocated.get(i));
        let after = self.allocated.get(index);
        if let Some(existing) = before.into_iter().chain(after).find(|p| p.overlaps(&prefix)) {
            return Err(AllocError::Overlap {
                prefix,
                existing: *existing,
            });
        }

        self.allocated.insert(index, prefix);
        debug!("Statically allocated {}", prefix);
        Ok(())
    }

    /// Release `prefix`. Only an exact match (same base and length) is
    /// released.
    pub fn deallocate(&mut self, prefix: Prefix) -> Result<(), AllocError> {
        match self.allocated.binary_search_by_key(&prefix.addr(), Prefix::addr) {
            Ok(index) if self.allocated[index].len() == prefix.len() => {
                self.allocated.remove(index);
                debug!("Deallocated {}", prefix);
                Ok(())
            }
            _ => Err(AllocError::NotAllocated(prefix)),
        }
    }

    fn is_consistent(&self) -> bool {
        self.allocated
            .windows(2)
            .all(|w| w[0].last_address() < w[1].addr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix(s: &str) -> Prefix {
        s.parse().unwrap()
    }

    fn allocator(pools: &[(&str, u8)], allocated: &[&str]) -> Allocator {
        let pools = pools
            .iter()
            .map(|(p, size)| Pool::new(prefix(p), *size))
            .collect();
        let mut allocator = Allocator::new(pools).unwrap();
        for p in allocated {
            allocator.allocate_static(prefix(p)).unwrap();
        }
        allocator
    }

    #[test]
    fn test_allocate_cases() {
        let cases: Vec<(&str, Allocator, Result<Prefix, AllocError>)> = vec![
            (
                "last partial overlap",
                allocator(
                    &[("192.168.0.0/16", 24)],
                    &["192.168.0.0/24", "192.168.1.0/24", "192.168.2.3/30"],
                ),
                Ok(prefix("192.168.3.0/24")),
            ),
            (
                "partial overlap in the middle with enough space left",
                allocator(
                    &[("172.16.0.0/15", 16), ("192.168.0.0/16", 24)],
                    &["172.16.0.0/16", "192.168.0.0/24"],
                ),
                Ok(prefix("172.17.0.0/16")),
            ),
            (
                "partial overlap in the middle without space left",
                allocator(
                    &[("172.16.0.0/15", 16), ("192.168.0.0/16", 24)],
                    &["172.16.0.0/16", "172.17.0.0/16", "192.168.0.0/24"],
                ),
                Ok(prefix("192.168.1.0/24")),
            ),
            (
                "partial overlap but not enough space left",
                allocator(&[("30.0.0.0/31", 31), ("192.168.0.0/16", 24)], &["30.0.0.0/32"]),
                Ok(prefix("192.168.0.0/24")),
            ),
            (
                "full overlap with small allocations",
                allocator(
                    &[("40.0.0.0/31", 31), ("192.168.0.0/16", 24)],
                    &["40.0.0.0/32", "40.0.0.1/32"],
                ),
                Ok(prefix("192.168.0.0/24")),
            ),
            (
                "full overlap with same size allocation",
                allocator(&[("50.0.0.0/31", 31), ("192.168.0.0/16", 24)], &["50.0.0.0/31"]),
                Ok(prefix("192.168.0.0/24")),
            ),
            (
                "full overlap with bigger allocation",
                allocator(&[("172.16.0.0/12", 24), ("192.168.0.0/16", 24)], &["172.0.0.0/8"]),
                Ok(prefix("192.168.0.0/24")),
            ),
            (
                "extra allocations, no pool left",
                allocator(
                    &[("172.16.0.0/15", 16)],
                    &["172.16.0.0/16", "172.17.0.0/16", "192.168.0.0/24"],
                ),
                Err(AllocError::NoFreePool),
            ),
            (
                "pools fully allocated",
                allocator(
                    &[("172.16.0.0/15", 16), ("192.168.0.0/23", 24)],
                    &["172.16.0.0/16", "172.17.0.0/16", "192.168.0.0/24", "192.168.1.0/24"],
                ),
                Err(AllocError::NoFreePool),
            ),
            (
                "partial overlap, not enough space left",
                allocator(
                    &[("172.16.0.0/15", 16), ("192.168.0.0/23", 24)],
                    &["172.16.0.0/16", "172.17.0.0/16", "192.168.0.0/24", "192.168.1.1/31"],
                ),
                Err(AllocError::NoFreePool),
            ),
        ];

        for (name, mut allocator, expected) in cases {
            let before = allocator.allocated().to_vec();
            let result = allocator.allocate();
            assert_eq!(result, expected, "case: {}", name);

            if result.is_err() {
                assert_eq!(allocator.allocated(), &before[..], "case: {}", name);
            }
            assert!(allocator.is_consistent(), "case: {}", name);
        }
    }

    #[test]
    fn test_mixed_pools() {
        let mut allocator = allocator(
            &[
                ("30.0.0.0/31", 31),
                ("40.0.0.0/31", 31),
                ("50.0.0.0/31", 31),
                ("172.16.0.0/12", 24),
                ("192.168.0.0/16", 24),
            ],
            &[
                "30.0.0.0/32",
                "40.0.0.0/32",
                "40.0.0.1/32",
                "50.0.0.0/31",
                "172.0.0.0/8",
                "192.168.0.0/24",
                "192.168.1.0/24",
                "192.168.2.3/30",
            ],
        );

        assert_eq!(allocator.allocate(), Ok(prefix("192.168.3.0/24")));
    }

    #[test]
    fn test_empty_allocator_takes_first_subnet() {
        let mut allocator = allocator(&[("30.0.0.0/31", 31)], &[]);
        assert_eq!(allocator.allocate(), Ok(prefix("30.0.0.0/31")));
        assert_eq!(allocator.allocate(), Err(AllocError::NoFreePool));
        assert_eq!(allocator.len(), 1);
    }

    #[test]
    fn test_unsorted_pools_are_sorted() {
        let allocator = allocator(&[("192.168.0.0/16", 24), ("10.0.0.0/8", 24), ("10.0.0.0/16", 24)], &[]);
        let pools: Vec<String> = allocator.pools().iter().map(|p| p.prefix.to_string()).collect();
        assert_eq!(pools, vec!["10.0.0.0/8", "10.0.0.0/16", "192.168.0.0/16"]);
    }

    #[test]
    fn test_invalid_pool_is_rejected() {
        let err = Allocator::new(vec![Pool::new(prefix("0.0.0.0/0"), 8)]).unwrap_err();
        assert!(matches!(err, AllocError::InvalidPool { .. }));

        let err = Allocator::new(vec![Pool::new(prefix("10.0.0.0/16"), 12)]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid pool 10.0.0.0/16@12: allocation size /12 is larger than the pool itself");
    }

    #[test]
    fn test_fills_gap_before_first_allocation() {
        let mut allocator = allocator(&[("192.168.0.0/16", 24)], &["192.168.5.4/30"]);
        assert_eq!(allocator.allocate(), Ok(prefix("192.168.0.0/24")));
        assert_eq!(allocator.allocated()[0], prefix("192.168.0.0/24"));
    }

    #[test]
    fn test_fills_gap_between_allocations() {
        let mut allocator = allocator(&[("192.168.0.0/16", 24)], &["192.168.0.0/24", "192.168.2.0/24"]);
        assert_eq!(allocator.allocate(), Ok(prefix("192.168.1.0/24")));
        assert_eq!(
            allocator.allocated(),
            &[prefix("192.168.0.0/24"), prefix("192.168.1.0/24"), prefix("192.168.2.0/24")]
        );
    }

    #[test]
    fn test_allocation_larger_than_subnet_size_is_skipped() {
        let mut allocator = allocator(&[("192.168.0.0/16", 24)], &["192.168.0.0/20"]);
        assert_eq!(allocator.allocate(), Ok(prefix("192.168.16.0/24")));
    }

    #[test]
    fn test_block_covering_several_pools() {
        let mut allocator = allocator(
            &[("172.16.0.0/12", 24), ("172.32.0.0/12", 24), ("192.168.0.0/16", 24)],
            &["172.0.0.0/8"],
        );
        assert_eq!(allocator.allocate(), Ok(prefix("192.168.0.0/24")));
    }

    #[test]
    fn test_pool_before_unrelated_allocation() {
        let mut allocator = allocator(&[("10.0.0.0/24", 24)], &["192.168.0.0/16"]);
        assert_eq!(allocator.allocate(), Ok(prefix("10.0.0.0/24")));
        assert_eq!(allocator.allocated()[0], prefix("10.0.0.0/24"));
    }

    #[test]
    fn test_reserved_ranges_are_skipped() {
        let mut allocator = allocator(
            &[("192.168.0.0/16", 24)],
            &["192.168.0.0/24", "192.168.1.0/24", "192.168.2.3/30"],
        );
        let reserved = [prefix("192.168.2.4/30"), prefix("192.168.3.0/30")];

        assert_eq!(allocator.allocate_next(&reserved), Ok(prefix("192.168.4.0/24")));
        assert!(!allocator.is_allocated(&prefix("192.168.3.0/30")));
    }

    #[test]
    fn test_reserved_overlapping_allocated_entry() {
        let mut allocator = allocator(&[("10.0.0.0/8", 24)], &["10.0.0.0/24"]);
        let reserved = [prefix("10.0.0.0/16")];
        assert_eq!(allocator.allocate_next(&reserved), Ok(prefix("10.1.0.0/24")));
    }

    #[test]
    fn test_exhaustion_leaves_state_unchanged() {
        let mut allocator = allocator(&[("172.16.0.0/15", 16)], &["172.16.0.0/16", "172.17.0.0/16"]);
        let before = allocator.allocated().to_vec();

        assert_eq!(allocator.allocate(), Err(AllocError::NoFreePool));
        assert_eq!(allocator.allocated(), &before[..]);
    }

    #[test]
    fn test_serial_allocation_drains_pool() {
        let mut allocator = allocator(&[("10.0.0.0/16", 24)], &[]);
        for i in 0..256u32 {
            let expected = Prefix::new(std::net::Ipv4Addr::from(0x0a00_0000 + (i << 8)), 24);
            assert_eq!(allocator.allocate(), Ok(expected));
        }
        assert_eq!(allocator.allocate(), Err(AllocError::NoFreePool));
        assert_eq!(allocator.len(), 256);
    }

    #[test]
    fn test_allocate_static_conflict() {
        let mut allocator = allocator(&[("192.168.0.0/16", 24)], &["192.168.0.0/24"]);

        let err = allocator.allocate_static(prefix("192.168.0.0/31")).unwrap_err();
        assert_eq!(
            err,
            AllocError::Overlap {
                prefix: prefix("192.168.0.0/31"),
                existing: prefix("192.168.0.0/24"),
            }
        );
        assert_eq!(err.to_string(), "Prefix 192.168.0.0/31 overlaps with 192.168.0.0/24");
        assert_eq!(allocator.allocated(), &[prefix("192.168.0.0/24")]);
    }

    #[test]
    fn test_allocate_static_detects_containing_predecessor() {
        let mut allocator = allocator(&[], &["10.0.0.0/8", "11.0.0.0/8"]);
        assert!(matches!(
            allocator.allocate_static(prefix("10.20.0.0/16")),
            Err(AllocError::Overlap { .. })
        ));
        assert!(matches!(
            allocator.allocate_static(prefix("8.0.0.0/6")),
            Err(AllocError::Overlap { .. })
        ));
        assert_eq!(allocator.allocate_static(prefix("12.0.0.0/8")), Ok(()));
        assert_eq!(allocator.allocate_static(prefix("9.0.0.0/8")), Ok(()));
        assert!(allocator.is_consistent());
    }

    #[test]
    fn test_allocate_static_rejects_zero_prefix() {
        let mut allocator = allocator(&[], &[]);
        assert_eq!(
            allocator.allocate_static(prefix("0.0.0.0/0")),
            Err(AllocError::InvalidPrefix(prefix("0.0.0.0/0")))
        );
    }

    #[test]
    fn test_deallocate_requires_exact_match() {
        let mut allocator = allocator(&[("192.168.0.0/16", 24)], &["192.168.0.0/24", "192.168.1.0/24"]);

        assert_eq!(
            allocator.deallocate(prefix("192.168.0.0/25")),
            Err(AllocError::NotAllocated(prefix("192.168.0.0/25")))
        );
        assert_eq!(
            allocator.deallocate(prefix("192.168.0.0/16")),
            Err(AllocError::NotAllocated(prefix("192.168.0.0/16")))
        );
        assert_eq!(allocator.deallocate(prefix("192.168.0.0/24")), Ok(()));
        assert_eq!(allocator.allocated(), &[prefix("192.168.1.0/24")]);

        // The freed block is handed out again first.
        assert_eq!(allocator.allocate(), Ok(prefix("192.168.0.0/24")));
    }
}

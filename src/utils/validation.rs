//! Configuration validation utilities.
//!
//! This module provides consistency checks for pools, reserved ranges and
//! static allocations before an allocator is built from them.

use crate::ip::{Pool, Prefix};

/// Validate the pool list
///
/// Checks for:
/// - Zero prefixes and out-of-range allocation sizes
/// - Pools that overlap each other (pools are independent allocation sources)
///
/// # Returns
/// * `Ok(())` if validation succeeds
/// * `Err(String)` with an error message if validation fails
///
/// # Examples
/// ```
/// use prefixpool::ip::Pool;
/// use prefixpool::utils::validation::validate_pools;
///
/// let pools = vec![
///     Pool::new("10.0.0.0/8".parse().unwrap(), 24),
///     Pool::new("10.1.0.0/16".parse().unwrap(), 24),
/// ];
/// assert!(validate_pools(&pools[..1]).is_ok());
/// assert!(validate_pools(&pools).is_err()); // 10.1.0.0/16 lies inside 10.0.0.0/8
/// ```
pub fn validate_pools(pools: &[Pool]) -> Result<(), String> {
    for pool in pools {
        pool.check()
            .map_err(|reason| format!("Pool {}: {}", pool, reason))?;
    }

    let mut sorted: Vec<&Pool> = pools.iter().collect();
    sorted.sort_by_key(|pool| pool.prefix);
    for pair in sorted.windows(2) {
        if pair[0].prefix.overlaps(&pair[1].prefix) {
            return Err(format!(
                "Pools {} and {} overlap",
                pair[0].prefix, pair[1].prefix
            ));
        }
    }

    let capacity: u64 = pools.iter().map(Pool::capacity).sum();
    log::info!("{} pool(s) configured, {} subnet(s) available in total", pools.len(), capacity);

    Ok(())
}

/// Validate a sorted list of reserved ranges
///
/// Reserved ranges must be sorted by address and must not overlap each
/// other. Ranges that fall outside every pool are accepted but have no
/// effect, so they are only reported.
pub fn validate_reserved(reserved: &[Prefix], pools: &[Pool]) -> Result<(), String> {
    for pair in reserved.windows(2) {
        if pair[1].addr() < pair[0].addr() {
            return Err(format!("Reserved ranges are not sorted: {} comes after {}", pair[1], pair[0]));
        }
        if pair[0].overlaps(&pair[1]) {
            return Err(format!("Reserved ranges {} and {} overlap", pair[0], pair[1]));
        }
    }

    for prefix in reserved {
        if !pools.iter().any(|pool| pool.prefix.overlaps(prefix)) {
            log::warn!("Reserved range {} is outside every pool and will never matter", prefix);
        }
    }

    Ok(())
}

/// Validate the static allocations applied at startup
pub fn validate_static_allocations(prefixes: &[Prefix]) -> Result<(), String> {
    for (i, prefix) in prefixes.iter().enumerate() {
        if prefix.len() == 0 {
            return Err(format!("Static allocation {} is the zero prefix", prefix));
        }
        if let Some(other) = prefixes[..i].iter().find(|other| other.overlaps(prefix)) {
            return Err(format!("Static allocations {} and {} overlap", other, prefix));
        }
    }

    Ok(())
}

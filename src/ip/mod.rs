//! IPv4 subnet allocation.
//!
//! This module holds the allocation engine: canonical prefixes, address
//! pools, the address arithmetic the scan relies on, and the allocator that
//! carves lowest-address-first subnets out of the pools.

pub mod addr;
pub mod allocator;
pub mod cursor;
pub mod pool;
pub mod prefix;

// Re-export commonly used types
pub use allocator::{AllocError, Allocator};
pub use cursor::MergeCursor;
pub use pool::Pool;
pub use prefix::{Prefix, PrefixError};

//! # Prefixpool - lowest-address-first IPv4 subnet allocation
//!
//! This library allocates non-overlapping IPv4 subnets out of a configured
//! set of address pools. It is the address-management core of a network
//! provisioning component: callers ask for "the next free /24" or mark an
//! exact block as taken.
//!
//! ## Overview
//!
//! Every pool is a source prefix plus an allocation size, the length of every
//! subnet carved from it. The allocator keeps a sorted, non-overlapping list
//! of allocated prefixes and answers three requests:
//!
//! - **allocate next**: the lowest free subnet of the first pool with room,
//!   skipping existing allocations and a caller-supplied list of reserved
//!   ranges it does not own;
//! - **allocate static**: take an exact block if nothing overlaps it;
//! - **deallocate**: release a block previously taken.
//!
//! The engine is synchronous, does no I/O and keeps no state beyond the two
//! sorted lists. Persisting allocations across restarts is left to callers.
//!
//! ## Architecture
//!
//! - `ip`: prefixes, pools, address arithmetic, the merge cursor and the
//!   allocator
//! - `config`: YAML configuration model and validation errors
//! - `config_loader`: configuration file loading
//! - `report`: JSON and text reports of an allocation run
//! - `utils`: validation helpers
//!
//! ## Example Usage
//!
//! ```rust
//! use prefixpool::ip::{Allocator, Pool, Prefix};
//!
//! let mut allocator = Allocator::new(vec![
//!     Pool::new("192.168.0.0/16".parse()?, 24),
//! ])?;
//!
//! allocator.allocate_static("192.168.0.0/24".parse()?)?;
//! let reserved = ["192.168.1.0/30".parse::<Prefix>()?];
//!
//! let next = allocator.allocate_next(&reserved)?;
//! assert_eq!(next.to_string(), "192.168.2.0/24");
//!
//! allocator.deallocate(next)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! pools:
//!   - prefix: 10.0.0.0/8
//!     size: 24
//! reserved:
//!   - 10.0.0.0/30
//! static_allocations:
//!   - 10.1.0.0/16
//! ```
//!
//! ## Error Handling
//!
//! Library operations return `thiserror` enums (`AllocError`, `PrefixError`,
//! `ValidationError`). File loading and the binary use `color_eyre` for
//! reports with context.

pub mod config;
pub mod config_loader;
pub mod ip;
pub mod report;
pub mod utils;

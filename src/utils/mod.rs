//! Shared utilities: configuration validation.

pub mod validation;

pub use validation::{validate_pools, validate_reserved, validate_static_allocations};

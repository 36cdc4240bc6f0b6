use serde::{Deserialize, Serialize};

use crate::ip::{AllocError, Allocator, Pool, Prefix};
use crate::utils::validation::{validate_pools, validate_reserved, validate_static_allocations};

/// Allocator configuration as read from YAML
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    /// Address pools subnets are allocated from
    pub pools: Vec<Pool>,
    /// Ranges owned by someone else; never handed out
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reserved: Vec<Prefix>,
    /// Blocks taken before the first dynamic allocation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub static_allocations: Vec<Prefix>,
}

impl Config {
    /// Validate the configuration
    ///
    /// Reserved ranges are expected to be sorted already, see
    /// [`Config::sort_reserved`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.pools.is_empty() {
            return Err(ValidationError::InvalidPool(
                "at least one pool must be configured".to_string(),
            ));
        }

        validate_pools(&self.pools).map_err(ValidationError::InvalidPool)?;
        validate_reserved(&self.reserved, &self.pools).map_err(ValidationError::InvalidReserved)?;
        validate_static_allocations(&self.static_allocations).map_err(ValidationError::InvalidStatic)?;

        Ok(())
    }

    /// Sort reserved ranges by address, the order the allocator requires.
    pub fn sort_reserved(&mut self) {
        self.reserved.sort();
    }

    /// Build an allocator from the pools and apply the static allocations.
    pub fn build_allocator(&self) -> Result<Allocator, AllocError> {
        let mut allocator = Allocator::new(self.pools.clone())?;
        for prefix in &self.static_allocations {
            allocator.allocate_static(*prefix)?;
        }
        Ok(allocator)
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid pool configuration: {0}")]
    InvalidPool(String),
    #[error("Invalid reserved ranges: {0}")]
    InvalidReserved(String),
    #[error("Invalid static allocations: {0}")]
    InvalidStatic(String),
}

//! Allocation reports.
//!
//! Summarizes an allocator's state after a run, as JSON or as plain text.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{eyre, Result, WrapErr};
use serde::Serialize;

use crate::config::Config;
use crate::ip::{AllocError, Allocator, Pool, Prefix};

/// Snapshot of an allocator after a run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AllocationReport {
    pub pools: Vec<Pool>,
    /// Subnets handed out by this run, in allocation order
    pub assigned: Vec<Prefix>,
    /// Every allocation, sorted by address
    pub allocated: Vec<Prefix>,
}

impl AllocationReport {
    pub fn new(allocator: &Allocator, assigned: Vec<Prefix>) -> Self {
        AllocationReport {
            pools: allocator.pools().to_vec(),
            assigned,
            allocated: allocator.allocated().to_vec(),
        }
    }

    /// One assigned subnet per line
    pub fn to_text(&self) -> String {
        self.assigned
            .iter()
            .map(|prefix| prefix.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Apply the static allocations of `config`, then hand out `count` subnets.
///
/// Running out of pools before `count` subnets are assigned is an error that
/// says how many could be allocated.
pub fn run_allocations(config: &Config, count: usize) -> Result<AllocationReport> {
    let mut allocator = config
        .build_allocator()
        .wrap_err("Failed to apply static allocations")?;

    let mut assigned = Vec::with_capacity(count);
    for _ in 0..count {
        match allocator.allocate_next(&config.reserved) {
            Ok(prefix) => assigned.push(prefix),
            Err(AllocError::NoFreePool) => {
                return Err(eyre!(
                    "No free address pools: only {} of {} subnet(s) could be allocated",
                    assigned.len(),
                    count
                ));
            }
            Err(e) => return Err(e.into()),
        }
    }
    log::info!("Allocated {} subnet(s)", assigned.len());

    Ok(AllocationReport::new(&allocator, assigned))
}

/// Write the report as pretty-printed JSON to `path`.
pub fn write_json_report(report: &AllocationReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).wrap_err("Could not encode allocation report")?;
    fs::write(path, json).wrap_err_with(|| format!("Could not write allocation report {}", path.display()))?;

    log::info!(
        "Wrote allocation report ({} assigned, {} allocated) to {}",
        report.assigned.len(),
        report.allocated.len(),
        path.display()
    );
    Ok(())
}

use crate::config::Config;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load, normalize and validate a configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    let mut config: Config = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    // The allocator expects reserved ranges in address order
    config.sort_reserved();

    config.validate()?;

    info!(
        "Loaded {} pool(s), {} reserved range(s), {} static allocation(s)",
        config.pools.len(),
        config.reserved.len(),
        config.static_allocations.len()
    );

    Ok(config)
}

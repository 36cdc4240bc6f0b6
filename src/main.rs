use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use prefixpool::config_loader;
use prefixpool::report::{run_allocations, write_json_report};

/// Allocate IPv4 subnets from configured address pools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the pool configuration YAML file
    #[arg(short, long)]
    config: PathBuf,

    /// Number of subnets to allocate
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,

    /// Print the full report as JSON instead of one subnet per line
    #[arg(long)]
    json: bool,

    /// Also write the JSON report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Configuration file: {:?}", args.config);

    let config = config_loader::load_config(&args.config)?;
    let report = run_allocations(&config, args.count)?;

    if let Some(output) = &args.output {
        write_json_report(&report, output)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.to_text());
    }

    Ok(())
}

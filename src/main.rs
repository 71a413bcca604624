//! goas - Command-line tool for generating OpenAPI documentation from Go code.
//!
//! Reads the general API information from the module's main file and the
//! operation annotations from every package, resolves the referenced Go types
//! and writes one OpenAPI 3 document.
//!
//! # Usage
//!
//! ```bash
//! goas [OPTIONS]
//! ```
//!
//! # Examples
//!
//! Generate JSON documentation for the module in the current directory:
//! ```bash
//! goas --module-path . --output oas.json
//! ```
//!
//! Generate YAML, only from the handlers package, failing on any problem:
//! ```bash
//! goas --handler-path ./handlers -f yaml -o oas.yaml --strict
//! ```

use anyhow::Result;
use clap::Parser;
use goas::cli;
use log::info;

fn main() -> Result<()> {
    // Parse once so the verbose flag can configure logging before validation logs anything
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("goas starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}

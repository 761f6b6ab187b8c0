//! OpenAPI from classes - Command-line tool for generating OpenAPI documents.
//!
//! Reads class metadata descriptors from the configured class path, finds the
//! endpoint classes and writes an OpenAPI 3.0 document describing them.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-classes --config <FILE> [OPTIONS]
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation:
//! ```bash
//! openapi-from-classes --config openapi-config.yaml -o openapi.yaml
//! ```
//!
//! Add a class path entry and generate JSON:
//! ```bash
//! openapi-from-classes --config openapi-config.yaml --class-path build/classes -f json
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_from_classes::cli;

fn main() -> Result<()> {
    // Parse once to read the verbose flag before the logger exists
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("OpenAPI from classes starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}

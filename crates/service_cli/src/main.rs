//! optval - Command Line Option Valuation
//!
//! Front end for the pricing-model catalog.
//!
//! # Commands
//!
//! - `optval models` - List the catalog's pricing methods
//! - `optval price --model <name> ...` - Value one contract with one method
//! - `optval compare ...` - Value one contract with every method
//!
//! # Configuration
//!
//! Settings come from an optional TOML file (`--config`), then `PRICER_*`
//! environment variables, then command-line flags. `RUST_LOG` takes
//! precedence over the configured log level.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pricer_pricing::{PricingModelCatalog, PricingModelKind};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;

pub use error::{CliError, Result};

use commands::ContractArgs;
use config::{CliArgs, LogLevel, OutputFormat};

/// Option valuation across a catalog of pricing methods
#[derive(Parser)]
#[command(name = "optval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Output format (table, json)
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the pricing methods in the catalog
    Models,

    /// Value one contract with one pricing method
    Price {
        /// Catalog method (see `optval models`)
        #[arg(short, long, default_value = "black-scholes")]
        model: PricingModelKind,

        #[command(flatten)]
        contract: ContractArgs,
    },

    /// Value one contract with every pricing method
    Compare {
        #[command(flatten)]
        contract: ContractArgs,
    },
}

fn init_tracing(level: LogLevel) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.as_filter_str())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::build_config(&CliArgs {
        config_file: cli.config.clone(),
        log_level: cli.log_level,
        output_format: cli.format,
    })
    .context("failed to load configuration")?;

    init_tracing(config.log_level);
    debug!(?config, "configuration loaded");

    let format = config.output_format;
    match &cli.command {
        Commands::Models => {
            let catalog = PricingModelCatalog::new(config.valuation.clone())?;
            commands::models::run(&catalog, format)?;
        }
        Commands::Price { model, contract } => {
            let catalog = contract.catalog(&config.valuation)?;
            commands::price::run(&catalog, *model, contract, format)
                .with_context(|| format!("failed to price with {}", model))?;
        }
        Commands::Compare { contract } => {
            let catalog = contract.catalog(&config.valuation)?;
            commands::compare::run(&catalog, contract, format)
                .context("failed to compare pricing methods")?;
        }
    }

    Ok(())
}

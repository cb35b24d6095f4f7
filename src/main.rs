// src/main.rs

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use deb2arch::config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let quiet = matches!(cli.command, Commands::Convert { quiet: true, .. });
    let default_level = if quiet { "warn" } else { "info" };

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Convert {
            target,
            output,
            install,
            quiet,
            mappings,
            include_scripts,
            release,
            no_pkgfile,
        } => commands::cmd_convert(
            &config,
            commands::ConvertArgs {
                target,
                output,
                install,
                quiet,
                mappings,
                include_scripts,
                release,
                no_pkgfile,
            },
        ),
        Commands::Inspect { deb } => commands::cmd_inspect(&deb),
        Commands::Resolve { deps, mappings } => {
            commands::cmd_resolve(&config, &deps, mappings.as_deref())
        }
    }
}

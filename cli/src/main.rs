// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # regstore CLI
//!
//! The `regstore` binary administers the repository and image-vulnerability
//! record stores of a container registry.
//!
//! ## Commands
//!
//! - `regstore config show|validate|generate` - Configuration management
//! - `regstore schema init` - Create missing PostgreSQL tables
//! - `regstore repo put|get|list|delete|pull|star` - Repository records
//! - `regstore vuln put|get|find|list` - Image vulnerability records

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use regstore_cli::commands::{self, ConfigCommand, RepoCommand, SchemaCommand, VulnCommand};
use regstore_core::domain::config::{LoggingConfig, StoreConfigManifest};

/// regstore - Registry metadata record stores
#[derive(Parser)]
#[command(name = "regstore")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "REGSTORE_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); defaults to the config value
    #[arg(long, global = true, env = "REGSTORE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Database schema management
    #[command(name = "schema")]
    Schema {
        #[command(subcommand)]
        command: SchemaCommand,
    },

    /// Repository records
    #[command(name = "repo")]
    Repo {
        #[command(subcommand)]
        command: RepoCommand,
    },

    /// Image vulnerability records
    #[command(name = "vuln")]
    Vuln {
        #[command(subcommand)]
        command: VulnCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // A broken config file must not prevent `config validate` from reporting it
    let mut logging = StoreConfigManifest::load_or_default(cli.config.clone())
        .map(|config| config.spec.logging)
        .unwrap_or_default();
    if let Some(level) = &cli.log_level {
        logging.level = level.clone();
    }
    init_logging(&logging)?;

    match cli.command {
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        Some(Commands::Schema { command }) => {
            commands::schema::handle_command(command, cli.config).await
        }
        Some(Commands::Repo { command }) => {
            commands::repo::handle_command(command, cli.config).await
        }
        Some(Commands::Vuln { command }) => {
            commands::vuln::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&logging.level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}

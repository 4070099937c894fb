// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Schema commands
//!
//! Commands: init

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use regstore_core::domain::config::StoreConfigManifest;
use regstore_core::domain::store::StorageBackend;
use regstore_core::infrastructure::db::Database;
use regstore_core::infrastructure::schema;

#[derive(Subcommand)]
pub enum SchemaCommand {
    /// Create missing tables, sequence and indexes
    Init {
        /// Print the statements instead of applying them
        #[arg(long)]
        dry_run: bool,
    },
}

pub async fn handle_command(command: SchemaCommand, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        SchemaCommand::Init { dry_run } => init(config_path, dry_run).await,
    }
}

async fn init(config_path: Option<PathBuf>, dry_run: bool) -> Result<()> {
    if dry_run {
        for statement in schema::bootstrap_statements() {
            println!("{};", statement.trim());
        }
        return Ok(());
    }

    let config = StoreConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    let StorageBackend::PostgreSQL(postgres) = config.storage_backend()? else {
        println!("{}", "In-memory backend has no schema; nothing to do.".yellow());
        return Ok(());
    };

    let database = Database::new(&postgres).await?;
    schema::bootstrap(database.get_pool()).await?;

    println!("{}", "✓ Schema is up to date".green());
    Ok(())
}

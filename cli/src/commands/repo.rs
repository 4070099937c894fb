// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository record commands
//!
//! Commands: put, get, list, delete, pull, star

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use regstore_core::application::catalog::RepositoryCatalogService;
use regstore_core::domain::repository_record::{RepositoryId, RepositoryRecord};
use regstore_core::domain::store::RepositoryRecordStore;

use crate::embedded::EmbeddedStores;
use crate::output::print_json;

#[derive(Subcommand)]
pub enum RepoCommand {
    /// Register a repository (insert, or refresh an existing one)
    Put {
        /// Repository id, e.g. library/nginx
        #[arg(long)]
        id: String,

        /// Repository name
        #[arg(long)]
        name: String,

        #[arg(long)]
        owner_id: i64,

        #[arg(long)]
        project_id: i64,

        /// Managing subsystem
        #[arg(long, default_value = "")]
        manager: String,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Show a repository record
    Get {
        #[arg(value_name = "REPOSITORY_ID")]
        id: String,

        /// Include resolved owner and project names
        #[arg(long)]
        view: bool,
    },

    /// List repositories ordered by id
    List {
        /// Only repositories of this project
        #[arg(long)]
        project_id: Option<i64>,
    },

    /// Delete a repository record (no error if absent)
    Delete {
        #[arg(value_name = "REPOSITORY_ID")]
        id: String,
    },

    /// Count one pull
    Pull {
        #[arg(value_name = "REPOSITORY_ID")]
        id: String,
    },

    /// Count one star
    Star {
        #[arg(value_name = "REPOSITORY_ID")]
        id: String,
    },
}

pub async fn handle_command(command: RepoCommand, config_path: Option<PathBuf>) -> Result<()> {
    let embedded = EmbeddedStores::open(config_path).await?;
    let catalog = &embedded.catalog;

    match command {
        RepoCommand::Put {
            id,
            name,
            owner_id,
            project_id,
            manager,
            description,
        } => {
            let record = RepositoryRecord::new(parse_id(&id)?, name, owner_id, project_id)
                .with_manager(manager)
                .with_description(description);
            let stored = catalog
                .register(record)
                .await
                .with_context(|| format!("Failed to register repository {}", id))?;
            print_json(&stored)
        }
        RepoCommand::Get { id, view } => {
            let id = parse_id(&id)?;
            if view {
                if embedded.is_ephemeral() {
                    anyhow::bail!(
                        "--view needs the postgres backend: the in-memory identity lookup has no owner or project names"
                    );
                }
                let view = catalog
                    .view(&id)
                    .await
                    .with_context(|| format!("Failed to resolve repository {}", id))?;
                print_json(&view)
            } else {
                let record = catalog
                    .get(&id)
                    .await
                    .with_context(|| format!("Failed to fetch repository {}", id))?;
                print_json(&record)
            }
        }
        RepoCommand::List { project_id } => {
            let records = match project_id {
                Some(project_id) => embedded.stores.repositories.list_by_project(project_id).await,
                None => embedded.stores.repositories.list().await,
            }
            .context("Failed to list repositories")?;
            print_json(&records)
        }
        RepoCommand::Delete { id } => {
            let id = parse_id(&id)?;
            catalog
                .remove(&id)
                .await
                .with_context(|| format!("Failed to delete repository {}", id))?;
            println!("{}", format!("✓ Repository {} deleted", id).green());
            Ok(())
        }
        RepoCommand::Pull { id } => {
            let id = parse_id(&id)?;
            let count = catalog
                .record_pull(&id)
                .await
                .with_context(|| format!("Failed to count pull of {}", id))?;
            println!("{} pull_count={}", id, count);
            Ok(())
        }
        RepoCommand::Star { id } => {
            let id = parse_id(&id)?;
            let count = catalog
                .record_star(&id)
                .await
                .with_context(|| format!("Failed to count star of {}", id))?;
            println!("{} star_count={}", id, count);
            Ok(())
        }
    }
}

fn parse_id(id: &str) -> Result<RepositoryId> {
    RepositoryId::new(id).with_context(|| format!("Invalid repository id '{}'", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_rejects_surrounding_slash() {
        assert!(parse_id("library/nginx").is_ok());
        assert!(parse_id("/library/nginx").is_err());
        assert!(parse_id("").is_err());
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Schema bootstrap for the PostgreSQL backend.
//!
//! Creates the two tables, the revision sequence and the lookup indexes when
//! they are missing. Existing tables are left untouched; evolving a deployed
//! schema is handled outside this crate.

use anyhow::{Context, Result};
use sqlx::postgres::PgPool;
use tracing::{debug, info};

use crate::infrastructure::mapping::{IMAGE_VULNERABILITY_TABLE, REPOSITORY_TABLE, VULNERABILITY_REVISION_SEQUENCE};

/// Idempotent DDL statements, in execution order
pub fn bootstrap_statements() -> Vec<String> {
    vec![
        REPOSITORY_TABLE.create_table_sql(),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_repository_project_id ON {} (project_id)",
            REPOSITORY_TABLE.table
        ),
        format!("CREATE SEQUENCE IF NOT EXISTS {}", VULNERABILITY_REVISION_SEQUENCE),
        IMAGE_VULNERABILITY_TABLE.create_table_sql(),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_img_vulnerability_repo_tag ON {} (repo_name, tag, revision DESC)",
            IMAGE_VULNERABILITY_TABLE.table
        ),
    ]
}

/// Create missing tables, sequence and indexes in one transaction
pub async fn bootstrap(pool: &PgPool) -> Result<()> {
    info!("Bootstrapping regstore schema");

    let mut tx = pool.begin().await.context("Failed to open schema transaction")?;
    for statement in bootstrap_statements() {
        debug!("Applying: {}", statement.lines().next().unwrap_or_default());
        sqlx::query(&statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to apply schema statement: {}", statement))?;
    }
    tx.commit().await.context("Failed to commit schema transaction")?;

    info!("Schema is up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_created_before_its_table() {
        let statements = bootstrap_statements();
        let sequence = statements
            .iter()
            .position(|s| s.starts_with("CREATE SEQUENCE"))
            .unwrap();
        let table = statements
            .iter()
            .position(|s| s.contains("CREATE TABLE IF NOT EXISTS img_vulnerability"))
            .unwrap();
        assert!(sequence < table);
    }

    #[test]
    fn test_every_statement_is_idempotent() {
        for statement in bootstrap_statements() {
            assert!(statement.contains("IF NOT EXISTS"), "{}", statement);
        }
    }
}

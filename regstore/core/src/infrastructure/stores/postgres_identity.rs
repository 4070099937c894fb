// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Identity lookup against the registry's own `harbor_user` and `project`
//! tables, sharing the store's connection pool.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::domain::identity::IdentityLookup;
use crate::domain::store::StoreError;

pub struct PostgresIdentityLookup {
    pool: PgPool,
}

impl PostgresIdentityLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityLookup for PostgresIdentityLookup {
    async fn owner_name(&self, owner_id: i64) -> Result<String, StoreError> {
        let row = sqlx::query("SELECT username FROM harbor_user WHERE user_id = $1")
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(row.try_get("username")?),
            None => Err(StoreError::NotFound(format!("owner {}", owner_id))),
        }
    }

    async fn project_name(&self, project_id: i64) -> Result<String, StoreError> {
        let row = sqlx::query("SELECT name FROM project WHERE project_id = $1")
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(row.try_get("name")?),
            None => Err(StoreError::NotFound(format!("project {}", project_id))),
        }
    }
}

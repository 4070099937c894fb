// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Repository Record Store
//!
//! `RepositoryRecordStore` backed by the `repository` table via `sqlx`.
//! Every write is a single statement, so each record changes atomically.
//! `update_time` is computed in SQL as `GREATEST(now, update_time + 1µs)`,
//! keeping it strictly increasing even when the application clock lags the
//! stored value.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tracing::debug;

use crate::domain::clock::{Clock, SystemClock};
use crate::domain::repository_record::{RepositoryId, RepositoryRecord};
use crate::domain::store::{RepositoryRecordStore, StoreError};
use crate::infrastructure::mapping::REPOSITORY_TABLE;

pub struct PostgresRepositoryRecordStore {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PostgresRepositoryRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    pub fn with_clock(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    async fn bump_counter(&self, id: &RepositoryId, column: &'static str) -> Result<i64, StoreError> {
        let sql = format!(
            r#"
            UPDATE {table}
            SET {column} = {column} + 1,
                update_time = GREATEST($2, update_time + INTERVAL '1 microsecond')
            WHERE repository_id = $1
            RETURNING {column}
            "#,
            table = REPOSITORY_TABLE.table,
            column = column,
        );

        let row = sqlx::query(&sql)
            .bind(id.as_str())
            .bind(self.clock.now())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(row.try_get(column)?),
            None => Err(StoreError::NotFound(format!("repository {}", id))),
        }
    }
}

#[async_trait]
impl RepositoryRecordStore for PostgresRepositoryRecordStore {
    async fn insert(&self, record: &RepositoryRecord) -> Result<RepositoryRecord, StoreError> {
        record.validate()?;
        let now = self.clock.now();

        let sql = format!(
            r#"
            INSERT INTO {table} ({columns})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING {columns}
            "#,
            table = REPOSITORY_TABLE.table,
            columns = REPOSITORY_TABLE.select_list(),
        );

        let row = sqlx::query(&sql)
            .bind(record.repository_id.as_str())
            .bind(&record.name)
            .bind(record.owner_id)
            .bind(record.project_id)
            .bind(&record.manager)
            .bind(&record.description)
            .bind(record.pull_count)
            .bind(record.star_count)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match StoreError::from(e) {
                StoreError::DuplicateKey(_) => {
                    StoreError::DuplicateKey(format!("repository {}", record.repository_id))
                }
                other => other,
            })?;

        debug!("Inserted repository {}", record.repository_id);
        parse_repository_row(&row)
    }

    async fn update(&self, record: &RepositoryRecord) -> Result<RepositoryRecord, StoreError> {
        record.validate()?;

        let sql = format!(
            r#"
            UPDATE {table}
            SET name = $2,
                owner_id = $3,
                project_id = $4,
                manager = $5,
                description = $6,
                pull_count = $7,
                star_count = $8,
                update_time = GREATEST($9, update_time + INTERVAL '1 microsecond')
            WHERE repository_id = $1
            RETURNING {columns}
            "#,
            table = REPOSITORY_TABLE.table,
            columns = REPOSITORY_TABLE.select_list(),
        );

        let row = sqlx::query(&sql)
            .bind(record.repository_id.as_str())
            .bind(&record.name)
            .bind(record.owner_id)
            .bind(record.project_id)
            .bind(&record.manager)
            .bind(&record.description)
            .bind(record.pull_count)
            .bind(record.star_count)
            .bind(self.clock.now())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                debug!("Updated repository {}", record.repository_id);
                parse_repository_row(&row)
            }
            None => Err(StoreError::NotFound(format!("repository {}", record.repository_id))),
        }
    }

    async fn refresh_descriptive(&self, record: &RepositoryRecord) -> Result<RepositoryRecord, StoreError> {
        record.validate()?;

        let sql = format!(
            r#"
            UPDATE {table}
            SET name = $2,
                owner_id = $3,
                project_id = $4,
                manager = $5,
                description = $6,
                update_time = GREATEST($7, update_time + INTERVAL '1 microsecond')
            WHERE repository_id = $1
            RETURNING {columns}
            "#,
            table = REPOSITORY_TABLE.table,
            columns = REPOSITORY_TABLE.select_list(),
        );

        let row = sqlx::query(&sql)
            .bind(record.repository_id.as_str())
            .bind(&record.name)
            .bind(record.owner_id)
            .bind(record.project_id)
            .bind(&record.manager)
            .bind(&record.description)
            .bind(self.clock.now())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                debug!("Refreshed repository {}", record.repository_id);
                parse_repository_row(&row)
            }
            None => Err(StoreError::NotFound(format!("repository {}", record.repository_id))),
        }
    }

    async fn get(&self, id: &RepositoryId) -> Result<RepositoryRecord, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE repository_id = $1",
            REPOSITORY_TABLE.select_list(),
            REPOSITORY_TABLE.table
        );

        let row = sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => parse_repository_row(&row),
            None => Err(StoreError::NotFound(format!("repository {}", id))),
        }
    }

    async fn delete(&self, id: &RepositoryId) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE repository_id = $1", REPOSITORY_TABLE.table);
        let result = sqlx::query(&sql)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            debug!("Delete of absent repository {} ignored", id);
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<RepositoryRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY repository_id ASC",
            REPOSITORY_TABLE.select_list(),
            REPOSITORY_TABLE.table
        );

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(parse_repository_row).collect()
    }

    async fn list_by_project(&self, project_id: i64) -> Result<Vec<RepositoryRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE project_id = $1 ORDER BY repository_id ASC",
            REPOSITORY_TABLE.select_list(),
            REPOSITORY_TABLE.table
        );

        let rows = sqlx::query(&sql)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(parse_repository_row).collect()
    }

    async fn increment_pull_count(&self, id: &RepositoryId) -> Result<i64, StoreError> {
        self.bump_counter(id, "pull_count").await
    }

    async fn increment_star_count(&self, id: &RepositoryId) -> Result<i64, StoreError> {
        self.bump_counter(id, "star_count").await
    }
}

/// Parse a repository record from a database row
fn parse_repository_row(row: &PgRow) -> Result<RepositoryRecord, StoreError> {
    let repository_id: String = row.try_get("repository_id")?;
    let repository_id = RepositoryId::new(repository_id)
        .map_err(|e| StoreError::Serialization(format!("Stored repository_id is invalid: {}", e)))?;
    let creation_time: DateTime<Utc> = row.try_get("creation_time")?;
    let update_time: DateTime<Utc> = row.try_get("update_time")?;

    Ok(RepositoryRecord {
        repository_id,
        name: row.try_get("name")?,
        owner_id: row.try_get("owner_id")?,
        project_id: row.try_get("project_id")?,
        manager: row.try_get("manager")?,
        description: row.try_get("description")?,
        pull_count: row.try_get("pull_count")?,
        star_count: row.try_get("star_count")?,
        creation_time,
        update_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    async fn connect() -> Option<PgPool> {
        let url = std::env::var("REGSTORE_TEST_DATABASE_URL").ok()?;
        let pool = PgPoolOptions::new().max_connections(2).connect(&url).await.ok()?;
        crate::infrastructure::schema::bootstrap(&pool).await.ok()?;
        Some(pool)
    }

    #[tokio::test]
    #[ignore = "requires REGSTORE_TEST_DATABASE_URL"]
    async fn test_insert_update_get_delete() {
        let Some(pool) = connect().await else { return };
        let store = PostgresRepositoryRecordStore::new(pool);
        let id = RepositoryId::new(format!("it/{}", uuid::Uuid::new_v4())).unwrap();

        let inserted = store
            .insert(&RepositoryRecord::new(id.clone(), "it", 1, 1).with_manager("harbor"))
            .await
            .unwrap();
        assert_eq!(inserted.creation_time, inserted.update_time);
        assert!(store.insert(&inserted).await.unwrap_err().is_duplicate_key());

        let updated = store
            .update(&inserted.clone().with_description("changed"))
            .await
            .unwrap();
        assert!(updated.update_time > inserted.update_time);
        assert_eq!(updated.creation_time, inserted.creation_time);
        assert_eq!(store.get(&id).await.unwrap(), updated);

        assert_eq!(store.increment_pull_count(&id).await.unwrap(), 1);

        let refreshed = store
            .refresh_descriptive(&RepositoryRecord::new(id.clone(), "renamed", 2, 2))
            .await
            .unwrap();
        assert_eq!(refreshed.name, "renamed");
        assert_eq!(refreshed.pull_count, 1);
        assert!(refreshed.update_time > updated.update_time);

        store.delete(&id).await.unwrap();
        store.delete(&id).await.unwrap();
        assert!(store.get(&id).await.unwrap_err().is_not_found());
    }
}

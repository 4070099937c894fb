// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Postgres Image Vulnerability
//!
//! `ImageVulnerabilityStore` backed by the `img_vulnerability` table.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Upsert and query scan results; the `revision` column (fed by
//!   `img_vulnerability_revision_seq`) is advanced on every upsert and orders
//!   `find_by_repo_tag`

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tracing::debug;

use crate::domain::store::{ImageVulnerabilityStore, StoreError};
use crate::domain::vulnerability::{ImageVulnerabilityId, ImageVulnerabilityRecord, VulnerabilityPayload};
use crate::infrastructure::mapping::{IMAGE_VULNERABILITY_TABLE, VULNERABILITY_REVISION_SEQUENCE};

pub struct PostgresImageVulnerabilityStore {
    pool: PgPool,
}

impl PostgresImageVulnerabilityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImageVulnerabilityStore for PostgresImageVulnerabilityStore {
    async fn upsert(&self, record: &ImageVulnerabilityRecord) -> Result<(), StoreError> {
        record.validate()?;

        let sql = format!(
            r#"
            INSERT INTO {table} (rv_id, repo_name, tag, v_count, vulnerabilities)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (rv_id) DO UPDATE SET
                repo_name = EXCLUDED.repo_name,
                tag = EXCLUDED.tag,
                v_count = EXCLUDED.v_count,
                vulnerabilities = EXCLUDED.vulnerabilities,
                revision = nextval('{sequence}')
            "#,
            table = IMAGE_VULNERABILITY_TABLE.table,
            sequence = VULNERABILITY_REVISION_SEQUENCE,
        );

        sqlx::query(&sql)
            .bind(record.rv_id.as_str())
            .bind(&record.repo_name)
            .bind(&record.tag)
            .bind(record.vulnerability_count)
            .bind(record.vulnerabilities.raw())
            .execute(&self.pool)
            .await?;

        debug!("Upserted vulnerability record {}", record.rv_id);
        Ok(())
    }

    async fn get(&self, rv_id: &ImageVulnerabilityId) -> Result<ImageVulnerabilityRecord, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE rv_id = $1",
            IMAGE_VULNERABILITY_TABLE.select_list(),
            IMAGE_VULNERABILITY_TABLE.table
        );

        let row = sqlx::query(&sql)
            .bind(rv_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => parse_vulnerability_row(&row),
            None => Err(StoreError::NotFound(format!("vulnerability record {}", rv_id))),
        }
    }

    async fn find_by_repo_tag(&self, repo_name: &str, tag: &str) -> Result<ImageVulnerabilityRecord, StoreError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM {}
            WHERE repo_name = $1 AND tag = $2
            ORDER BY revision DESC
            LIMIT 1
            "#,
            IMAGE_VULNERABILITY_TABLE.select_list(),
            IMAGE_VULNERABILITY_TABLE.table
        );

        let row = sqlx::query(&sql)
            .bind(repo_name)
            .bind(tag)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => parse_vulnerability_row(&row),
            None => Err(StoreError::NotFound(format!(
                "vulnerability record for {}:{}",
                repo_name, tag
            ))),
        }
    }

    async fn list_by_repo(&self, repo_name: &str) -> Result<Vec<ImageVulnerabilityRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE repo_name = $1 ORDER BY tag ASC, revision DESC",
            IMAGE_VULNERABILITY_TABLE.select_list(),
            IMAGE_VULNERABILITY_TABLE.table
        );

        let rows = sqlx::query(&sql)
            .bind(repo_name)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(parse_vulnerability_row).collect()
    }
}

/// Parse a vulnerability record from a database row
fn parse_vulnerability_row(row: &PgRow) -> Result<ImageVulnerabilityRecord, StoreError> {
    let rv_id: String = row.try_get("rv_id")?;
    let rv_id = ImageVulnerabilityId::new(rv_id)
        .map_err(|e| StoreError::Serialization(format!("Stored rv_id is invalid: {}", e)))?;
    let vulnerabilities: String = row.try_get("vulnerabilities")?;

    Ok(ImageVulnerabilityRecord {
        rv_id,
        repo_name: row.try_get("repo_name")?,
        tag: row.try_get("tag")?,
        vulnerability_count: row.try_get("v_count")?,
        vulnerabilities: VulnerabilityPayload::from_raw(vulnerabilities),
    })
}

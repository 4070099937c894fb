// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Store Interfaces
//!
//! Persistence contracts for the two record types, defined in the domain layer
//! and implemented in `crate::infrastructure::stores`.
//!
//! | Trait | Record | Implementations |
//! |-------|--------|----------------|
//! | `RepositoryRecordStore` | `RepositoryRecord` | `InMemoryRepositoryRecordStore`, `PostgresRepositoryRecordStore` |
//! | `ImageVulnerabilityStore` | `ImageVulnerabilityRecord` | `InMemoryImageVulnerabilityStore`, `PostgresImageVulnerabilityStore` |
//!
//! ## Storage Backend Abstraction
//!
//! The concrete backend is chosen at startup from `regstore-config.yaml`.
//! In-memory stores serve development and tests; PostgreSQL stores serve
//! production. Callers only see these traits, so backends are interchangeable.
//!
//! Writes are atomic per record. No store retries or falls back: every error
//! reaches the caller as-is.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::repository_record::{RepositoryId, RepositoryRecord};
use crate::domain::validation::ValidationError;
use crate::domain::vulnerability::{ImageVulnerabilityId, ImageVulnerabilityRecord};

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostgresConfig {
    pub connection_string: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

/// Store contract for repository records.
///
/// `creation_time` and `update_time` belong to the store: values supplied by
/// the caller are ignored on every write.
#[async_trait]
pub trait RepositoryRecordStore: Send + Sync {
    /// Insert a new record, stamping both timestamps with the same instant.
    /// Fails with `DuplicateKey` when the id is taken.
    async fn insert(&self, record: &RepositoryRecord) -> Result<RepositoryRecord, StoreError>;

    /// Replace every persisted field except `creation_time`, refreshing
    /// `update_time`. Fails with `NotFound` when the id is absent.
    async fn update(&self, record: &RepositoryRecord) -> Result<RepositoryRecord, StoreError>;

    /// Overwrite only the descriptive fields (name, owner_id, project_id,
    /// manager, description) of a stored record in one atomic write,
    /// refreshing `update_time`. Counters and `creation_time` keep their
    /// stored values. Fails with `NotFound` when the id is absent.
    async fn refresh_descriptive(&self, record: &RepositoryRecord) -> Result<RepositoryRecord, StoreError>;

    async fn get(&self, id: &RepositoryId) -> Result<RepositoryRecord, StoreError>;

    /// Remove a record. Removing an absent id succeeds.
    async fn delete(&self, id: &RepositoryId) -> Result<(), StoreError>;

    /// All records ordered by id
    async fn list(&self) -> Result<Vec<RepositoryRecord>, StoreError>;

    /// Records of one project ordered by id
    async fn list_by_project(&self, project_id: i64) -> Result<Vec<RepositoryRecord>, StoreError>;

    /// Atomically add one pull and return the new count.
    async fn increment_pull_count(&self, id: &RepositoryId) -> Result<i64, StoreError>;

    /// Atomically add one star and return the new count.
    async fn increment_star_count(&self, id: &RepositoryId) -> Result<i64, StoreError>;
}

/// Store contract for image vulnerability records.
///
/// Records carry no timestamp. Each backend keeps a storage-only revision,
/// bumped on every upsert, which defines "latest" for `find_by_repo_tag`.
#[async_trait]
pub trait ImageVulnerabilityStore: Send + Sync {
    /// Insert or overwrite the record keyed by `rv_id`.
    async fn upsert(&self, record: &ImageVulnerabilityRecord) -> Result<(), StoreError>;

    async fn get(&self, rv_id: &ImageVulnerabilityId) -> Result<ImageVulnerabilityRecord, StoreError>;

    /// Most recently upserted record for the repository/tag pair.
    async fn find_by_repo_tag(&self, repo_name: &str, tag: &str) -> Result<ImageVulnerabilityRecord, StoreError>;

    /// Every record of a repository ordered by tag
    async fn list_by_repo(&self, repo_name: &str) -> Result<Vec<ImageVulnerabilityRecord>, StoreError>;
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StoreError::DuplicateKey(_))
    }
}

/// PostgreSQL `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return StoreError::DuplicateKey(db_err.message().to_string());
            }
        }
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("Row not found".to_string()),
            _ => StoreError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Store Factory - Application Layer
//!
//! Creates concrete store implementations based on the storage backend
//! configuration, keeping the domain layer free of infrastructure choices.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Wire one backend's stores and identity lookup together

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;

use crate::domain::clock::Clock;
use crate::domain::identity::IdentityLookup;
use crate::domain::store::{ImageVulnerabilityStore, RepositoryRecordStore, StorageBackend};
use crate::infrastructure::db::Database;
use crate::infrastructure::stores::{
    InMemoryImageVulnerabilityStore, InMemoryRepositoryRecordStore, PostgresIdentityLookup,
    PostgresImageVulnerabilityStore, PostgresRepositoryRecordStore, StaticIdentityLookup,
};

/// Creates a RepositoryRecordStore implementation based on the configured backend
pub fn create_repository_record_store(
    backend: &StorageBackend,
    database: Option<&Database>,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn RepositoryRecordStore>> {
    match backend {
        StorageBackend::InMemory => Ok(Arc::new(InMemoryRepositoryRecordStore::with_clock(clock))),
        StorageBackend::PostgreSQL(_) => {
            let database = database.context("PostgreSQL backend requires a database connection")?;
            Ok(Arc::new(PostgresRepositoryRecordStore::with_clock(
                database.get_pool().clone(),
                clock,
            )))
        }
    }
}

/// Creates an ImageVulnerabilityStore implementation based on the configured backend
pub fn create_image_vulnerability_store(
    backend: &StorageBackend,
    database: Option<&Database>,
) -> Result<Arc<dyn ImageVulnerabilityStore>> {
    match backend {
        StorageBackend::InMemory => Ok(Arc::new(InMemoryImageVulnerabilityStore::new())),
        StorageBackend::PostgreSQL(_) => {
            let database = database.context("PostgreSQL backend requires a database connection")?;
            Ok(Arc::new(PostgresImageVulnerabilityStore::new(
                database.get_pool().clone(),
            )))
        }
    }
}

/// Creates an IdentityLookup implementation based on the configured backend
pub fn create_identity_lookup(
    backend: &StorageBackend,
    database: Option<&Database>,
) -> Result<Arc<dyn IdentityLookup>> {
    match backend {
        StorageBackend::InMemory => Ok(Arc::new(StaticIdentityLookup::new())),
        StorageBackend::PostgreSQL(_) => {
            let database = database.context("PostgreSQL backend requires a database connection")?;
            Ok(Arc::new(PostgresIdentityLookup::new(database.get_pool().clone())))
        }
    }
}

/// Every store of one backend, sharing a single connection pool.
#[derive(Clone)]
pub struct Stores {
    pub repositories: Arc<dyn RepositoryRecordStore>,
    pub vulnerabilities: Arc<dyn ImageVulnerabilityStore>,
    pub identities: Arc<dyn IdentityLookup>,
    pub database: Option<Database>,
}

impl Stores {
    /// Connect (when needed) and build all stores for `backend`.
    pub async fn open(backend: &StorageBackend, clock: Arc<dyn Clock>) -> Result<Self> {
        let database = match backend {
            StorageBackend::InMemory => {
                warn!("Using in-memory stores; records are lost on exit");
                None
            }
            StorageBackend::PostgreSQL(config) => Some(Database::new(config).await?),
        };

        Ok(Self {
            repositories: create_repository_record_store(backend, database.as_ref(), clock)?,
            vulnerabilities: create_image_vulnerability_store(backend, database.as_ref())?,
            identities: create_identity_lookup(backend, database.as_ref())?,
            database,
        })
    }
}

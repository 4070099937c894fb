// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Catalog Application Service
//!
//! Write path for registry notifications and read path for repository views:
//! - Domain layer: `RepositoryRecord`, `RepositoryView`
//! - Store: `RepositoryRecordStore` for persistence
//! - Identity lookup: resolves owner/project display names on every read
//!
//! Store errors are returned untouched so callers can branch on the kind.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::identity::IdentityLookup;
use crate::domain::repository_record::{RepositoryId, RepositoryRecord, RepositoryView};
use crate::domain::store::{RepositoryRecordStore, StoreError};

// ============================================================================
// Service Trait
// ============================================================================

#[async_trait]
pub trait RepositoryCatalogService: Send + Sync {
    /// Record a repository seen in a registry notification: insert it, or
    /// refresh the descriptive fields of the stored record. Counters and
    /// creation time of an existing record are kept.
    async fn register(&self, record: RepositoryRecord) -> Result<RepositoryRecord, StoreError>;

    async fn get(&self, id: &RepositoryId) -> Result<RepositoryRecord, StoreError>;

    /// Record plus resolved owner and project names
    async fn view(&self, id: &RepositoryId) -> Result<RepositoryView, StoreError>;

    /// Views of every repository, optionally limited to one project
    async fn list_views(&self, project_id: Option<i64>) -> Result<Vec<RepositoryView>, StoreError>;

    async fn record_pull(&self, id: &RepositoryId) -> Result<i64, StoreError>;

    async fn record_star(&self, id: &RepositoryId) -> Result<i64, StoreError>;

    /// Administrative removal; absent ids are ignored
    async fn remove(&self, id: &RepositoryId) -> Result<(), StoreError>;
}

// ============================================================================
// Standard Implementation
// ============================================================================

pub struct StandardRepositoryCatalogService {
    store: Arc<dyn RepositoryRecordStore>,
    identities: Arc<dyn IdentityLookup>,
}

impl StandardRepositoryCatalogService {
    pub fn new(store: Arc<dyn RepositoryRecordStore>, identities: Arc<dyn IdentityLookup>) -> Self {
        Self { store, identities }
    }

    async fn resolve(&self, record: RepositoryRecord) -> Result<RepositoryView, StoreError> {
        let owner_name = self.identities.owner_name(record.owner_id).await?;
        let project_name = self.identities.project_name(record.project_id).await?;
        Ok(RepositoryView {
            record,
            owner_name,
            project_name,
        })
    }
}

#[async_trait]
impl RepositoryCatalogService for StandardRepositoryCatalogService {
    async fn register(&self, record: RepositoryRecord) -> Result<RepositoryRecord, StoreError> {
        match self.store.insert(&record).await {
            Ok(stored) => {
                info!(
                    "Registered repository {} (project: {}, owner: {})",
                    stored.repository_id, stored.project_id, stored.owner_id
                );
                Ok(stored)
            }
            Err(StoreError::DuplicateKey(_)) => {
                let updated = self.store.refresh_descriptive(&record).await?;
                info!("Refreshed repository {}", updated.repository_id);
                Ok(updated)
            }
            Err(e) => Err(e),
        }
    }

    async fn get(&self, id: &RepositoryId) -> Result<RepositoryRecord, StoreError> {
        debug!("Fetching repository {}", id);
        self.store.get(id).await
    }

    async fn view(&self, id: &RepositoryId) -> Result<RepositoryView, StoreError> {
        let record = self.store.get(id).await?;
        self.resolve(record).await
    }

    async fn list_views(&self, project_id: Option<i64>) -> Result<Vec<RepositoryView>, StoreError> {
        let records = match project_id {
            Some(project_id) => self.store.list_by_project(project_id).await?,
            None => self.store.list().await?,
        };

        let mut views = Vec::with_capacity(records.len());
        for record in records {
            views.push(self.resolve(record).await?);
        }
        Ok(views)
    }

    async fn record_pull(&self, id: &RepositoryId) -> Result<i64, StoreError> {
        let count = self.store.increment_pull_count(id).await?;
        debug!("Repository {} pull count is now {}", id, count);
        Ok(count)
    }

    async fn record_star(&self, id: &RepositoryId) -> Result<i64, StoreError> {
        let count = self.store.increment_star_count(id).await?;
        debug!("Repository {} star count is now {}", id, count);
        Ok(count)
    }

    async fn remove(&self, id: &RepositoryId) -> Result<(), StoreError> {
        self.store.delete(id).await?;
        info!("Removed repository {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::ManualClock;
    use crate::infrastructure::stores::{InMemoryRepositoryRecordStore, StaticIdentityLookup};
    use chrono::{Duration, TimeZone, Utc};

    fn service(clock: Arc<ManualClock>) -> StandardRepositoryCatalogService {
        let identities = StaticIdentityLookup::new()
            .with_owner(1, "admin")
            .with_project(1, "library")
            .with_project(2, "infra");
        StandardRepositoryCatalogService::new(
            Arc::new(InMemoryRepositoryRecordStore::with_clock(clock)),
            Arc::new(identities),
        )
    }

    fn nginx() -> RepositoryRecord {
        RepositoryRecord::new(RepositoryId::new("library/nginx").unwrap(), "nginx", 1, 1)
            .with_manager("harbor")
    }

    #[tokio::test]
    async fn test_register_twice_keeps_counters_and_creation_time() {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()));
        let catalog = service(clock.clone());

        let first = catalog.register(nginx()).await.unwrap();
        catalog.record_pull(&first.repository_id).await.unwrap();
        catalog.record_star(&first.repository_id).await.unwrap();

        clock.advance(Duration::minutes(5));
        let refreshed = catalog
            .register(nginx().with_description("official build"))
            .await
            .unwrap();

        assert_eq!(refreshed.description, "official build");
        assert_eq!(refreshed.pull_count, 1);
        assert_eq!(refreshed.star_count, 1);
        assert_eq!(refreshed.creation_time, first.creation_time);
        assert!(refreshed.update_time > first.update_time);
    }

    /// Counts a pull on every failed insert, landing it between the
    /// duplicate-key failure and the refresh that follows.
    struct PullOnConflictStore {
        inner: InMemoryRepositoryRecordStore,
    }

    #[async_trait]
    impl RepositoryRecordStore for PullOnConflictStore {
        async fn insert(&self, record: &RepositoryRecord) -> Result<RepositoryRecord, StoreError> {
            let result = self.inner.insert(record).await;
            if result.is_err() {
                self.inner.increment_pull_count(&record.repository_id).await?;
            }
            result
        }

        async fn update(&self, record: &RepositoryRecord) -> Result<RepositoryRecord, StoreError> {
            self.inner.update(record).await
        }

        async fn refresh_descriptive(&self, record: &RepositoryRecord) -> Result<RepositoryRecord, StoreError> {
            self.inner.refresh_descriptive(record).await
        }

        async fn get(&self, id: &RepositoryId) -> Result<RepositoryRecord, StoreError> {
            let stored = self.inner.get(id).await?;
            self.inner.increment_pull_count(id).await?;
            Ok(stored)
        }

        async fn delete(&self, id: &RepositoryId) -> Result<(), StoreError> {
            self.inner.delete(id).await
        }

        async fn list(&self) -> Result<Vec<RepositoryRecord>, StoreError> {
            self.inner.list().await
        }

        async fn list_by_project(&self, project_id: i64) -> Result<Vec<RepositoryRecord>, StoreError> {
            self.inner.list_by_project(project_id).await
        }

        async fn increment_pull_count(&self, id: &RepositoryId) -> Result<i64, StoreError> {
            self.inner.increment_pull_count(id).await
        }

        async fn increment_star_count(&self, id: &RepositoryId) -> Result<i64, StoreError> {
            self.inner.increment_star_count(id).await
        }
    }

    #[tokio::test]
    async fn test_register_refresh_does_not_lose_concurrent_pull() {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()));
        let inner = InMemoryRepositoryRecordStore::with_clock(clock);
        let catalog = StandardRepositoryCatalogService::new(
            Arc::new(PullOnConflictStore { inner: inner.clone() }),
            Arc::new(StaticIdentityLookup::new()),
        );
        let id = RepositoryId::new("library/nginx").unwrap();

        catalog.register(nginx()).await.unwrap();
        assert_eq!(catalog.record_pull(&id).await.unwrap(), 1);

        let refreshed = catalog
            .register(nginx().with_description("official build"))
            .await
            .unwrap();

        let stored = inner.get(&id).await.unwrap();
        assert_eq!(stored.pull_count, 2);
        assert_eq!(refreshed.pull_count, 2);
        assert_eq!(stored.description, "official build");
    }

    #[tokio::test]
    async fn test_view_resolves_names() {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()));
        let catalog = service(clock);
        catalog.register(nginx()).await.unwrap();

        let view = catalog.view(&RepositoryId::new("library/nginx").unwrap()).await.unwrap();
        assert_eq!(view.owner_name, "admin");
        assert_eq!(view.project_name, "library");
        assert_eq!(view.record.name, "nginx");
    }

    #[tokio::test]
    async fn test_view_with_unknown_project_is_not_found() {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()));
        let catalog = service(clock);
        let orphan = RepositoryRecord::new(RepositoryId::new("ghost/app").unwrap(), "app", 1, 99);
        catalog.register(orphan).await.unwrap();

        let err = catalog
            .view(&RepositoryId::new("ghost/app").unwrap())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_views_filters_by_project() {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()));
        let catalog = service(clock);
        catalog.register(nginx()).await.unwrap();
        catalog
            .register(RepositoryRecord::new(RepositoryId::new("infra/proxy").unwrap(), "proxy", 1, 2))
            .await
            .unwrap();

        assert_eq!(catalog.list_views(None).await.unwrap().len(), 2);
        let infra = catalog.list_views(Some(2)).await.unwrap();
        assert_eq!(infra.len(), 1);
        assert_eq!(infra[0].project_name, "infra");
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()));
        let catalog = service(clock);
        let id = catalog.register(nginx()).await.unwrap().repository_id;

        catalog.remove(&id).await.unwrap();
        catalog.remove(&id).await.unwrap();
        assert!(catalog.get(&id).await.unwrap_err().is_not_found());
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Store Implementations
//!
//! Infrastructure implementations of the store contracts defined in
//! `crate::domain::store` and of the identity lookup.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve repository and vulnerability records
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! ## PostgreSQL
//!
//! - **PostgresRepositoryRecordStore** - `repository` table
//! - **PostgresImageVulnerabilityStore** - `img_vulnerability` table
//! - **PostgresIdentityLookup** - `harbor_user` / `project` tables
//!
//! ## In-Memory
//!
//! - **InMemoryRepositoryRecordStore** - lock-guarded ordered map
//! - **InMemoryImageVulnerabilityStore** - lock-guarded map with revisions
//! - **StaticIdentityLookup** - fixed id-to-name tables
//!
//! Every in-memory write holds the write lock for its whole
//! read-modify-write, so readers never see a half-applied record.

pub mod postgres_identity;
pub mod postgres_image_vulnerability;
pub mod postgres_repository_record;

pub use postgres_identity::PostgresIdentityLookup;
pub use postgres_image_vulnerability::PostgresImageVulnerabilityStore;
pub use postgres_repository_record::PostgresRepositoryRecordStore;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::domain::clock::{next_update_time, Clock, SystemClock};
use crate::domain::identity::IdentityLookup;
use crate::domain::repository_record::{RepositoryId, RepositoryRecord};
use crate::domain::store::{ImageVulnerabilityStore, RepositoryRecordStore, StoreError};
use crate::domain::vulnerability::{ImageVulnerabilityId, ImageVulnerabilityRecord};

// ============================================================================
// Repository records
// ============================================================================

#[derive(Clone)]
pub struct InMemoryRepositoryRecordStore {
    records: Arc<RwLock<BTreeMap<RepositoryId, RepositoryRecord>>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRepositoryRecordStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Arc::new(RwLock::new(BTreeMap::new())),
            clock,
        }
    }

    fn bump_counter<F>(&self, id: &RepositoryId, bump: F) -> Result<i64, StoreError>
    where
        F: FnOnce(&mut RepositoryRecord) -> i64,
    {
        let mut records = self.records.write();
        let stored = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("repository {}", id)))?;

        let count = bump(stored);
        stored.update_time = next_update_time(stored.update_time, self.clock.now());
        Ok(count)
    }
}

impl Default for InMemoryRepositoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RepositoryRecordStore for InMemoryRepositoryRecordStore {
    async fn insert(&self, record: &RepositoryRecord) -> Result<RepositoryRecord, StoreError> {
        record.validate()?;

        let mut records = self.records.write();
        if records.contains_key(&record.repository_id) {
            return Err(StoreError::DuplicateKey(format!(
                "repository {}",
                record.repository_id
            )));
        }

        let now = self.clock.now();
        let mut stored = record.clone();
        stored.creation_time = now;
        stored.update_time = now;
        records.insert(stored.repository_id.clone(), stored.clone());

        debug!("Inserted repository {}", stored.repository_id);
        Ok(stored)
    }

    async fn update(&self, record: &RepositoryRecord) -> Result<RepositoryRecord, StoreError> {
        record.validate()?;

        let mut records = self.records.write();
        let existing = records
            .get_mut(&record.repository_id)
            .ok_or_else(|| StoreError::NotFound(format!("repository {}", record.repository_id)))?;

        let mut stored = record.clone();
        stored.creation_time = existing.creation_time;
        stored.update_time = next_update_time(existing.update_time, self.clock.now());
        *existing = stored.clone();

        debug!("Updated repository {}", stored.repository_id);
        Ok(stored)
    }

    async fn refresh_descriptive(&self, record: &RepositoryRecord) -> Result<RepositoryRecord, StoreError> {
        record.validate()?;

        let mut records = self.records.write();
        let existing = records
            .get_mut(&record.repository_id)
            .ok_or_else(|| StoreError::NotFound(format!("repository {}", record.repository_id)))?;

        existing.merge_descriptive(record);
        existing.update_time = next_update_time(existing.update_time, self.clock.now());

        debug!("Refreshed repository {}", existing.repository_id);
        Ok(existing.clone())
    }

    async fn get(&self, id: &RepositoryId) -> Result<RepositoryRecord, StoreError> {
        let records = self.records.read();
        records
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("repository {}", id)))
    }

    async fn delete(&self, id: &RepositoryId) -> Result<(), StoreError> {
        let mut records = self.records.write();
        if records.remove(id).is_none() {
            debug!("Delete of absent repository {} ignored", id);
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<RepositoryRecord>, StoreError> {
        let records = self.records.read();
        Ok(records.values().cloned().collect())
    }

    async fn list_by_project(&self, project_id: i64) -> Result<Vec<RepositoryRecord>, StoreError> {
        let records = self.records.read();
        Ok(records
            .values()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn increment_pull_count(&self, id: &RepositoryId) -> Result<i64, StoreError> {
        self.bump_counter(id, |record| {
            record.pull_count += 1;
            record.pull_count
        })
    }

    async fn increment_star_count(&self, id: &RepositoryId) -> Result<i64, StoreError> {
        self.bump_counter(id, |record| {
            record.star_count += 1;
            record.star_count
        })
    }
}

// ============================================================================
// Image vulnerability records
// ============================================================================

struct RevisionedRecord {
    revision: u64,
    record: ImageVulnerabilityRecord,
}

#[derive(Default)]
struct VulnerabilityTable {
    records: HashMap<ImageVulnerabilityId, RevisionedRecord>,
    next_revision: u64,
}

#[derive(Clone, Default)]
pub struct InMemoryImageVulnerabilityStore {
    table: Arc<RwLock<VulnerabilityTable>>,
}

impl InMemoryImageVulnerabilityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImageVulnerabilityStore for InMemoryImageVulnerabilityStore {
    async fn upsert(&self, record: &ImageVulnerabilityRecord) -> Result<(), StoreError> {
        record.validate()?;

        let mut table = self.table.write();
        table.next_revision += 1;
        let revision = table.next_revision;
        table.records.insert(
            record.rv_id.clone(),
            RevisionedRecord {
                revision,
                record: record.clone(),
            },
        );

        debug!("Upserted vulnerability record {} (revision {})", record.rv_id, revision);
        Ok(())
    }

    async fn get(&self, rv_id: &ImageVulnerabilityId) -> Result<ImageVulnerabilityRecord, StoreError> {
        let table = self.table.read();
        table
            .records
            .get(rv_id)
            .map(|stored| stored.record.clone())
            .ok_or_else(|| StoreError::NotFound(format!("vulnerability record {}", rv_id)))
    }

    async fn find_by_repo_tag(&self, repo_name: &str, tag: &str) -> Result<ImageVulnerabilityRecord, StoreError> {
        let table = self.table.read();
        table
            .records
            .values()
            .filter(|stored| stored.record.repo_name == repo_name && stored.record.tag == tag)
            .max_by_key(|stored| stored.revision)
            .map(|stored| stored.record.clone())
            .ok_or_else(|| StoreError::NotFound(format!("vulnerability record for {}:{}", repo_name, tag)))
    }

    async fn list_by_repo(&self, repo_name: &str) -> Result<Vec<ImageVulnerabilityRecord>, StoreError> {
        let table = self.table.read();
        let mut matching: Vec<&RevisionedRecord> = table
            .records
            .values()
            .filter(|stored| stored.record.repo_name == repo_name)
            .collect();
        matching.sort_by(|a, b| {
            a.record
                .tag
                .cmp(&b.record.tag)
                .then(b.revision.cmp(&a.revision))
        });
        Ok(matching.into_iter().map(|stored| stored.record.clone()).collect())
    }
}

// ============================================================================
// Identity lookup
// ============================================================================

/// Identity lookup over fixed tables, for development and tests.
#[derive(Clone, Default)]
pub struct StaticIdentityLookup {
    owners: Arc<RwLock<HashMap<i64, String>>>,
    projects: Arc<RwLock<HashMap<i64, String>>>,
}

impl StaticIdentityLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_owner(self, owner_id: i64, name: impl Into<String>) -> Self {
        self.insert_owner(owner_id, name);
        self
    }

    pub fn with_project(self, project_id: i64, name: impl Into<String>) -> Self {
        self.insert_project(project_id, name);
        self
    }

    pub fn insert_owner(&self, owner_id: i64, name: impl Into<String>) {
        self.owners.write().insert(owner_id, name.into());
    }

    pub fn insert_project(&self, project_id: i64, name: impl Into<String>) {
        self.projects.write().insert(project_id, name.into());
    }
}

#[async_trait]
impl IdentityLookup for StaticIdentityLookup {
    async fn owner_name(&self, owner_id: i64) -> Result<String, StoreError> {
        self.owners
            .read()
            .get(&owner_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("owner {}", owner_id)))
    }

    async fn project_name(&self, project_id: i64) -> Result<String, StoreError> {
        self.projects
            .read()
            .get(&project_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("project {}", project_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::ManualClock;
    use crate::domain::vulnerability::VulnerabilityPayload;
    use chrono::{Duration, TimeZone, Utc};

    fn record(id: &str, project_id: i64) -> RepositoryRecord {
        let repository_id = RepositoryId::new(id).unwrap();
        let name = id.rsplit('/').next().unwrap().to_string();
        RepositoryRecord::new(repository_id, name, 1, project_id)
    }

    fn vulnerability(rv_id: &str, repo: &str, tag: &str) -> ImageVulnerabilityRecord {
        ImageVulnerabilityRecord {
            rv_id: ImageVulnerabilityId::new(rv_id).unwrap(),
            repo_name: repo.to_string(),
            tag: tag.to_string(),
            vulnerability_count: 0,
            vulnerabilities: VulnerabilityPayload::from_raw("[]"),
        }
    }

    #[tokio::test]
    async fn test_insert_overrides_caller_timestamps() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let store = InMemoryRepositoryRecordStore::with_clock(Arc::new(ManualClock::new(start)));

        let mut input = record("library/nginx", 1);
        input.creation_time = start - Duration::days(30);
        input.update_time = start + Duration::days(30);

        let stored = store.insert(&input).await.unwrap();
        assert_eq!(stored.creation_time, start);
        assert_eq!(stored.update_time, start);
    }

    #[tokio::test]
    async fn test_update_ignores_caller_creation_time() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let store = InMemoryRepositoryRecordStore::with_clock(clock.clone());

        let mut stored = store.insert(&record("library/nginx", 1)).await.unwrap();
        clock.advance(Duration::minutes(1));
        stored.creation_time = start + Duration::days(1);

        let updated = store.update(&stored).await.unwrap();
        assert_eq!(updated.creation_time, start);
        assert_eq!(updated.update_time, start + Duration::minutes(1));
    }

    #[tokio::test]
    async fn test_update_time_strictly_increases_on_stalled_clock() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let store = InMemoryRepositoryRecordStore::with_clock(Arc::new(ManualClock::new(start)));

        let inserted = store.insert(&record("library/nginx", 1)).await.unwrap();
        let updated = store.update(&inserted).await.unwrap();

        assert!(updated.update_time > inserted.update_time);
        assert!(updated.creation_time <= updated.update_time);
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_record() {
        let store = InMemoryRepositoryRecordStore::new();
        let mut input = record("library/nginx", 1);
        input.pull_count = -1;

        let err = store.insert(&input).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_orders_by_id_and_filters_by_project() {
        let store = InMemoryRepositoryRecordStore::new();
        store.insert(&record("library/redis", 1)).await.unwrap();
        store.insert(&record("acme/api", 2)).await.unwrap();
        store.insert(&record("library/alpine", 1)).await.unwrap();

        let ids: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.repository_id.to_string())
            .collect();
        assert_eq!(ids, vec!["acme/api", "library/alpine", "library/redis"]);

        let library = store.list_by_project(1).await.unwrap();
        assert_eq!(library.len(), 2);
        assert!(library.iter().all(|r| r.project_id == 1));
    }

    #[tokio::test]
    async fn test_counters_increment_and_refresh_update_time() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let store = InMemoryRepositoryRecordStore::with_clock(clock.clone());
        let id = RepositoryId::new("library/nginx").unwrap();
        store.insert(&record("library/nginx", 1)).await.unwrap();

        clock.advance(Duration::seconds(10));
        assert_eq!(store.increment_pull_count(&id).await.unwrap(), 1);
        assert_eq!(store.increment_pull_count(&id).await.unwrap(), 2);
        assert_eq!(store.increment_star_count(&id).await.unwrap(), 1);

        let stored = store.get(&id).await.unwrap();
        assert_eq!(stored.pull_count, 2);
        assert_eq!(stored.star_count, 1);
        assert_eq!(stored.creation_time, start);
        assert!(stored.update_time > start + Duration::seconds(10));
    }

    #[tokio::test]
    async fn test_refresh_descriptive_keeps_counters() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let store = InMemoryRepositoryRecordStore::with_clock(Arc::new(ManualClock::new(start)));
        let id = RepositoryId::new("library/nginx").unwrap();
        let inserted = store.insert(&record("library/nginx", 1)).await.unwrap();
        store.increment_pull_count(&id).await.unwrap();
        store.increment_star_count(&id).await.unwrap();

        // Counters in the incoming record are ignored
        let incoming = record("library/nginx", 2).with_description("moved");
        let refreshed = store.refresh_descriptive(&incoming).await.unwrap();

        assert_eq!(refreshed.project_id, 2);
        assert_eq!(refreshed.description, "moved");
        assert_eq!(refreshed.pull_count, 1);
        assert_eq!(refreshed.star_count, 1);
        assert_eq!(refreshed.creation_time, inserted.creation_time);
        assert!(refreshed.update_time > inserted.update_time);
        assert_eq!(store.get(&id).await.unwrap(), refreshed);

        let ghost = record("library/ghost", 1);
        assert!(store.refresh_descriptive(&ghost).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_increment_missing_repository_is_not_found() {
        let store = InMemoryRepositoryRecordStore::new();
        let id = RepositoryId::new("library/ghost").unwrap();
        assert!(store.increment_star_count(&id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_find_by_repo_tag_prefers_latest_upsert() {
        let store = InMemoryImageVulnerabilityStore::new();
        store.upsert(&vulnerability("b", "library/nginx", "1.25")).await.unwrap();
        store.upsert(&vulnerability("a", "library/nginx", "1.25")).await.unwrap();

        let latest = store.find_by_repo_tag("library/nginx", "1.25").await.unwrap();
        assert_eq!(latest.rv_id.as_str(), "a");

        // Re-upserting "b" makes it the latest again
        store.upsert(&vulnerability("b", "library/nginx", "1.25")).await.unwrap();
        let latest = store.find_by_repo_tag("library/nginx", "1.25").await.unwrap();
        assert_eq!(latest.rv_id.as_str(), "b");
    }

    #[tokio::test]
    async fn test_upsert_rejects_blank_tag() {
        let store = InMemoryImageVulnerabilityStore::new();
        let err = store
            .upsert(&vulnerability("a", "library/nginx", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_by_repo_orders_by_tag() {
        let store = InMemoryImageVulnerabilityStore::new();
        store.upsert(&vulnerability("1", "library/nginx", "latest")).await.unwrap();
        store.upsert(&vulnerability("2", "library/nginx", "1.25")).await.unwrap();
        store.upsert(&vulnerability("3", "library/redis", "7")).await.unwrap();

        let tags: Vec<String> = store
            .list_by_repo("library/nginx")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.tag)
            .collect();
        assert_eq!(tags, vec!["1.25", "latest"]);
    }

    #[test]
    fn test_static_identity_lookup() {
        let lookup = StaticIdentityLookup::new()
            .with_owner(1, "admin")
            .with_project(1, "library");

        assert_eq!(tokio_test::block_on(lookup.owner_name(1)).unwrap(), "admin");
        assert_eq!(tokio_test::block_on(lookup.project_name(1)).unwrap(), "library");
        assert!(tokio_test::block_on(lookup.owner_name(2)).unwrap_err().is_not_found());

        lookup.insert_owner(2, "ci-bot");
        assert_eq!(tokio_test::block_on(lookup.owner_name(2)).unwrap(), "ci-bot");
    }
}

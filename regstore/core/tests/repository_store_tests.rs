// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use regstore_core::domain::clock::{Clock, ManualClock};
use regstore_core::domain::repository_record::{RepositoryId, RepositoryRecord};
use regstore_core::domain::store::{RepositoryRecordStore, StoreError};
use regstore_core::domain::validation::ValidationError;
use regstore_core::infrastructure::stores::InMemoryRepositoryRecordStore;

fn store_at(year: i32) -> (Arc<ManualClock>, InMemoryRepositoryRecordStore) {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(year, 6, 1, 12, 0, 0).unwrap()));
    let store = InMemoryRepositoryRecordStore::with_clock(clock.clone());
    (clock, store)
}

fn nginx() -> RepositoryRecord {
    RepositoryRecord::new(RepositoryId::new("library/nginx").unwrap(), "nginx", 1, 1).with_manager("harbor")
}

#[tokio::test]
async fn insert_then_get_returns_same_record_with_insert_time() {
    let (clock, store) = store_at(2024);
    let inserted = store.insert(&nginx()).await.unwrap();
    let fetched = store.get(&RepositoryId::new("library/nginx").unwrap()).await.unwrap();

    assert_eq!(fetched, inserted);
    assert_eq!(fetched.name, "nginx");
    assert_eq!(fetched.owner_id, 1);
    assert_eq!(fetched.project_id, 1);
    assert_eq!(fetched.manager, "harbor");
    assert_eq!(fetched.pull_count, 0);
    assert_eq!(fetched.star_count, 0);
    assert_eq!(fetched.creation_time, fetched.update_time);
    assert_eq!(fetched.creation_time, clock.now());
}

#[tokio::test]
async fn update_changes_fields_and_advances_update_time_only() {
    let (clock, store) = store_at(2024);
    let original = store.insert(&nginx()).await.unwrap();

    clock.advance(Duration::seconds(30));
    let mut changed = original.clone();
    changed.description = "The official nginx image".to_string();
    store.update(&changed).await.unwrap();

    let fetched = store.get(&original.repository_id).await.unwrap();
    assert_eq!(fetched.description, "The official nginx image");
    assert!(fetched.update_time > original.update_time);
    assert_eq!(fetched.creation_time, original.creation_time);
}

#[tokio::test]
async fn update_time_increases_even_without_clock_movement() {
    let (_clock, store) = store_at(2024);
    let original = store.insert(&nginx()).await.unwrap();

    let first = store.update(&original.clone().with_description("a")).await.unwrap();
    let second = store.update(&first.clone().with_description("b")).await.unwrap();

    assert!(first.update_time > original.update_time);
    assert!(second.update_time > first.update_time);
}

#[tokio::test]
async fn duplicate_insert_fails_with_duplicate_key() {
    let (_clock, store) = store_at(2024);
    store.insert(&nginx()).await.unwrap();

    let err = store.insert(&nginx()).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey(_)));
}

#[tokio::test]
async fn missing_repository_operations() {
    let (_clock, store) = store_at(2024);
    let id = RepositoryId::new("library/missing").unwrap();

    assert!(store.get(&id).await.unwrap_err().is_not_found());
    let ghost = RepositoryRecord::new(id.clone(), "missing", 1, 1);
    assert!(store.update(&ghost).await.unwrap_err().is_not_found());
    store.delete(&id).await.unwrap();
}

#[tokio::test]
async fn invalid_records_are_rejected_before_storage() {
    let (_clock, store) = store_at(2024);
    let unnamed = RepositoryRecord::new(RepositoryId::new("library/blank").unwrap(), "", 1, 1);

    let err = store.insert(&unnamed).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::Empty { field: "name" })
    ));
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_pulls_are_all_counted() {
    let (_clock, store) = store_at(2024);
    let store = Arc::new(store);
    let id = store.insert(&nginx()).await.unwrap().repository_id;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = store.clone();
        let id = id.clone();
        handles.push(tokio::spawn(async move { store.increment_pull_count(&id).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.get(&id).await.unwrap().pull_count, 16);
}

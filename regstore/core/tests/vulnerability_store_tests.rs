// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use regstore_core::domain::store::{ImageVulnerabilityStore, StoreError};
use regstore_core::domain::validation::ValidationError;
use regstore_core::domain::vulnerability::{
    ImageVulnerabilityId, ImageVulnerabilityRecord, Severity, Vulnerability, VulnerabilityPayload,
    MAX_TAG_CHARS,
};
use regstore_core::infrastructure::stores::InMemoryImageVulnerabilityStore;

fn openssl_finding() -> Vulnerability {
    Vulnerability {
        name: "CVE-2023-5678".to_string(),
        namespace_name: "debian:12".to_string(),
        description: "Excessive time spent in DH check".to_string(),
        link: "https://security-tracker.debian.org/tracker/CVE-2023-5678".to_string(),
        severity: Severity::Medium,
        fixed_by: Some("3.0.13-1~deb12u1".to_string()),
        metadata: Some(serde_json::json!({ "NVD": { "CVSSv3": { "Score": 5.3 } } })),
    }
}

#[tokio::test]
async fn upsert_then_get_round_trips_every_field() {
    let store = InMemoryImageVulnerabilityStore::new();
    let record = ImageVulnerabilityRecord::from_findings(
        ImageVulnerabilityId::new("scan-1").unwrap(),
        "library/nginx",
        "1.25",
        &[openssl_finding()],
    )
    .unwrap();

    store.upsert(&record).await.unwrap();
    let fetched = store.get(&record.rv_id).await.unwrap();

    assert_eq!(fetched, record);
    assert_eq!(fetched.findings().unwrap(), vec![openssl_finding()]);
}

#[tokio::test]
async fn upsert_overwrites_in_place() {
    let store = InMemoryImageVulnerabilityStore::new();
    let rv_id = ImageVulnerabilityId::new("scan-1").unwrap();
    let before = ImageVulnerabilityRecord::from_findings(rv_id.clone(), "library/nginx", "1.25", &[openssl_finding()]).unwrap();
    let after = ImageVulnerabilityRecord::from_findings(rv_id.clone(), "library/nginx", "1.25", &[]).unwrap();

    store.upsert(&before).await.unwrap();
    store.upsert(&after).await.unwrap();

    let fetched = store.get(&rv_id).await.unwrap();
    assert_eq!(fetched.vulnerability_count, 0);
    assert_eq!(store.list_by_repo("library/nginx").await.unwrap().len(), 1);
}

#[tokio::test]
async fn legacy_payload_is_kept_byte_for_byte() {
    let store = InMemoryImageVulnerabilityStore::new();
    let raw = r#"[{"Name":"CVE-2019-0001","Severity":"defcon1","Extra":true}]"#;
    let record = ImageVulnerabilityRecord {
        rv_id: ImageVulnerabilityId::new("legacy").unwrap(),
        repo_name: "library/busybox".to_string(),
        tag: "1.36".to_string(),
        vulnerability_count: 1,
        vulnerabilities: VulnerabilityPayload::from_raw(raw),
    };

    store.upsert(&record).await.unwrap();
    let fetched = store.find_by_repo_tag("library/busybox", "1.36").await.unwrap();

    assert_eq!(fetched.vulnerabilities.raw(), raw);
    assert_eq!(fetched.summarize().unwrap().critical, 1);
}

#[tokio::test]
async fn missing_records_are_not_found() {
    let store = InMemoryImageVulnerabilityStore::new();
    assert!(store
        .get(&ImageVulnerabilityId::new("nope").unwrap())
        .await
        .unwrap_err()
        .is_not_found());
    assert!(store
        .find_by_repo_tag("library/nginx", "latest")
        .await
        .unwrap_err()
        .is_not_found());
    assert!(store.list_by_repo("library/nginx").await.unwrap().is_empty());
}

#[tokio::test]
async fn overlong_tag_is_a_validation_error() {
    let store = InMemoryImageVulnerabilityStore::new();
    let record = ImageVulnerabilityRecord::from_findings(
        ImageVulnerabilityId::new("scan-long").unwrap(),
        "library/nginx",
        "t".repeat(MAX_TAG_CHARS + 1),
        &[],
    )
    .unwrap();

    let err = store.upsert(&record).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::Malformed { field: "tag", .. })
    ));
    assert!(store.list_by_repo("library/nginx").await.unwrap().is_empty());
}

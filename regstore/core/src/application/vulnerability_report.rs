// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Vulnerability Report Application Service
//!
//! Accepts scan results from the scanner pipeline and serves them back per
//! repository/tag. Results produced through `record_scan` reuse the rv_id of
//! an existing result for the same repository/tag, so that path keeps at most
//! one record per pair.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::store::{ImageVulnerabilityStore, StoreError};
use crate::domain::vulnerability::{
    ImageVulnerabilityId, ImageVulnerabilityRecord, Vulnerability, VulnerabilitySummary,
};

#[async_trait]
pub trait VulnerabilityReportService: Send + Sync {
    /// Store the findings of one scan of `repo_name:tag`.
    async fn record_scan(
        &self,
        repo_name: &str,
        tag: &str,
        findings: &[Vulnerability],
    ) -> Result<ImageVulnerabilityRecord, StoreError>;

    /// Store a record produced elsewhere, verbatim.
    async fn ingest(&self, record: &ImageVulnerabilityRecord) -> Result<(), StoreError>;

    async fn get(&self, rv_id: &ImageVulnerabilityId) -> Result<ImageVulnerabilityRecord, StoreError>;

    async fn latest(&self, repo_name: &str, tag: &str) -> Result<ImageVulnerabilityRecord, StoreError>;

    /// Decoded findings of the latest scan
    async fn findings(&self, repo_name: &str, tag: &str) -> Result<Vec<Vulnerability>, StoreError>;

    async fn summary(&self, repo_name: &str, tag: &str) -> Result<VulnerabilitySummary, StoreError>;

    async fn list_for_repo(&self, repo_name: &str) -> Result<Vec<ImageVulnerabilityRecord>, StoreError>;
}

pub struct StandardVulnerabilityReportService {
    store: Arc<dyn ImageVulnerabilityStore>,
}

impl StandardVulnerabilityReportService {
    pub fn new(store: Arc<dyn ImageVulnerabilityStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl VulnerabilityReportService for StandardVulnerabilityReportService {
    async fn record_scan(
        &self,
        repo_name: &str,
        tag: &str,
        findings: &[Vulnerability],
    ) -> Result<ImageVulnerabilityRecord, StoreError> {
        let rv_id = match self.store.find_by_repo_tag(repo_name, tag).await {
            Ok(existing) => existing.rv_id,
            Err(StoreError::NotFound(_)) => ImageVulnerabilityId::generate(),
            Err(e) => return Err(e),
        };

        let record = ImageVulnerabilityRecord::from_findings(rv_id, repo_name, tag, findings)?;
        self.store.upsert(&record).await?;

        info!(
            "Recorded scan of {}:{} ({} vulnerabilities, rv_id: {})",
            repo_name, tag, record.vulnerability_count, record.rv_id
        );
        Ok(record)
    }

    async fn ingest(&self, record: &ImageVulnerabilityRecord) -> Result<(), StoreError> {
        if let Err(e) = record.check_consistency() {
            warn!(
                "Storing inconsistent vulnerability record {} for {}:{}: {}",
                record.rv_id, record.repo_name, record.tag, e
            );
        }
        self.store.upsert(record).await
    }

    async fn get(&self, rv_id: &ImageVulnerabilityId) -> Result<ImageVulnerabilityRecord, StoreError> {
        debug!("Fetching vulnerability record {}", rv_id);
        self.store.get(rv_id).await
    }

    async fn latest(&self, repo_name: &str, tag: &str) -> Result<ImageVulnerabilityRecord, StoreError> {
        self.store.find_by_repo_tag(repo_name, tag).await
    }

    async fn findings(&self, repo_name: &str, tag: &str) -> Result<Vec<Vulnerability>, StoreError> {
        let record = self.store.find_by_repo_tag(repo_name, tag).await?;
        Ok(record.findings()?)
    }

    async fn summary(&self, repo_name: &str, tag: &str) -> Result<VulnerabilitySummary, StoreError> {
        let record = self.store.find_by_repo_tag(repo_name, tag).await?;
        Ok(record.summarize()?)
    }

    async fn list_for_repo(&self, repo_name: &str) -> Result<Vec<ImageVulnerabilityRecord>, StoreError> {
        self.store.list_by_repo(repo_name).await
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Image Vulnerability Record
//!
//! Scan result summary for one repository/tag pair. The finding list is kept
//! as serialized JSON text ([`VulnerabilityPayload`]) so rows written by older
//! ingesters round-trip untouched; typed access goes through
//! [`VulnerabilityPayload::decode`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::store::StoreError;
use crate::domain::validation::{require_max_chars, require_non_negative, require_text, ValidationError};

/// Column bounds of `img_vulnerability`
pub const MAX_RV_ID_CHARS: usize = 255;
pub const MAX_REPO_NAME_CHARS: usize = 255;
pub const MAX_TAG_CHARS: usize = 128;

/// Opaque primary key of one (repository, tag) scan result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageVulnerabilityId(String);

impl ImageVulnerabilityId {
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        require_text("rv_id", &id)?;
        Ok(Self(id))
    }

    /// Fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ImageVulnerabilityId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ImageVulnerabilityId> for String {
    fn from(id: ImageVulnerabilityId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ImageVulnerabilityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scanner severity scale, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Unknown,
    Negligible,
    Low,
    Medium,
    High,
    Critical,
    Defcon1,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Unknown => "Unknown",
            Severity::Negligible => "Negligible",
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
            Severity::Defcon1 => "Defcon1",
        }
    }
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "negligible" => Severity::Negligible,
            "low" => Severity::Low,
            "medium" => Severity::Medium,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            "defcon1" => Severity::Defcon1,
            _ => Severity::Unknown,
        }
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        severity.as_str().to_string()
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding, in the scanner's wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vulnerability {
    pub name: String,
    #[serde(default)]
    pub namespace_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    #[serde(default = "default_severity")]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

fn default_severity() -> Severity {
    Severity::Unknown
}

/// Serialized finding list exactly as stored in the `vulnerabilities` column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VulnerabilityPayload(String);

impl VulnerabilityPayload {
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn from_findings(findings: &[Vulnerability]) -> Result<Self, serde_json::Error> {
        Ok(Self(serde_json::to_string(findings)?))
    }

    /// Decode the finding list. An empty payload is an empty list.
    pub fn decode(&self) -> Result<Vec<Vulnerability>, serde_json::Error> {
        if self.0.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&self.0)
    }

    pub fn raw(&self) -> &str {
        &self.0
    }

    pub fn into_raw(self) -> String {
        self.0
    }
}

/// Finding counts per severity bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilitySummary {
    pub critical: i64,
    pub high: i64,
    pub medium: i64,
    pub low: i64,
    pub unknown: i64,
}

impl VulnerabilitySummary {
    pub fn from_findings(findings: &[Vulnerability]) -> Self {
        let mut summary = Self::default();
        for finding in findings {
            match finding.severity {
                Severity::Critical | Severity::Defcon1 => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low | Severity::Negligible => summary.low += 1,
                Severity::Unknown => summary.unknown += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> i64 {
        self.critical + self.high + self.medium + self.low + self.unknown
    }
}

// ============================================================================
// Record
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageVulnerabilityRecord {
    pub rv_id: ImageVulnerabilityId,
    pub repo_name: String,
    pub tag: String,
    #[serde(rename = "v_count")]
    pub vulnerability_count: i32,
    pub vulnerabilities: VulnerabilityPayload,
}

impl ImageVulnerabilityRecord {
    /// Record whose count is derived from `findings`, so it is consistent by
    /// construction. More findings than `v_count` can hold is a `Validation`
    /// error.
    pub fn from_findings(
        rv_id: ImageVulnerabilityId,
        repo_name: impl Into<String>,
        tag: impl Into<String>,
        findings: &[Vulnerability],
    ) -> Result<Self, StoreError> {
        Ok(Self {
            rv_id,
            repo_name: repo_name.into(),
            tag: tag.into(),
            vulnerability_count: finding_count(findings.len())?,
            vulnerabilities: VulnerabilityPayload::from_findings(findings)?,
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_max_chars("rv_id", self.rv_id.as_str(), MAX_RV_ID_CHARS)?;
        require_text("repo_name", &self.repo_name)?;
        require_max_chars("repo_name", &self.repo_name, MAX_REPO_NAME_CHARS)?;
        require_text("tag", &self.tag)?;
        require_max_chars("tag", &self.tag, MAX_TAG_CHARS)?;
        require_non_negative("v_count", i64::from(self.vulnerability_count))?;
        Ok(())
    }

    /// Check that `vulnerability_count` matches the decoded payload. Stores
    /// never call this; enforcing it is up to the ingester.
    pub fn check_consistency(&self) -> Result<(), ValidationError> {
        let decoded = self
            .vulnerabilities
            .decode()
            .map_err(|e| ValidationError::Malformed {
                field: "vulnerabilities",
                reason: e.to_string(),
            })?;

        if decoded.len() as i64 != i64::from(self.vulnerability_count) {
            return Err(ValidationError::CountMismatch {
                declared: i64::from(self.vulnerability_count),
                decoded: decoded.len(),
            });
        }
        Ok(())
    }

    pub fn findings(&self) -> Result<Vec<Vulnerability>, serde_json::Error> {
        self.vulnerabilities.decode()
    }

    pub fn summarize(&self) -> Result<VulnerabilitySummary, serde_json::Error> {
        Ok(VulnerabilitySummary::from_findings(&self.findings()?))
    }
}

/// Number of findings as a `v_count` value.
fn finding_count(len: usize) -> Result<i32, ValidationError> {
    i32::try_from(len).map_err(|_| ValidationError::Malformed {
        field: "v_count",
        reason: format!("{} findings exceed the column range", len),
    })
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Repository Record
//!
//! One row per image repository known to the registry. Every value here comes
//! from registry notification events except the counters (bumped by the pull
//! and star paths) and the timestamps (stamped by the store on write).
//!
//! Owner and project display names are not part of the record: they are
//! resolved at read time and carried on [`RepositoryView`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::validation::{require_max_chars, require_non_negative, require_text, ValidationError};

const MAX_REPOSITORY_ID_LEN: usize = 255;

/// Column bounds of `repository`
pub const MAX_NAME_CHARS: usize = 255;
pub const MAX_MANAGER_CHARS: usize = 255;

// ============================================================================
// Value Objects
// ============================================================================

/// Primary key of a repository record, typically `<owner>/<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryId(String);

impl RepositoryId {
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        require_text("repository_id", &id)?;

        if id.len() > MAX_REPOSITORY_ID_LEN {
            return Err(ValidationError::Malformed {
                field: "repository_id",
                reason: format!("longer than {} bytes", MAX_REPOSITORY_ID_LEN),
            });
        }
        if id.chars().any(char::is_whitespace) {
            return Err(ValidationError::Malformed {
                field: "repository_id",
                reason: "contains whitespace".to_string(),
            });
        }
        if id.starts_with('/') || id.ends_with('/') {
            return Err(ValidationError::Malformed {
                field: "repository_id",
                reason: "leading or trailing '/'".to_string(),
            });
        }

        Ok(Self(id))
    }

    /// Build the conventional `<owner>/<name>` identifier.
    pub fn from_parts(owner: &str, name: &str) -> Result<Self, ValidationError> {
        Self::new(format!("{}/{}", owner, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RepositoryId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RepositoryId> for String {
    fn from(id: RepositoryId) -> Self {
        id.0
    }
}

impl std::fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Record
// ============================================================================

/// Persisted repository record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub repository_id: RepositoryId,
    pub name: String,
    pub owner_id: i64,
    pub project_id: i64,
    /// Subsystem managing this repository's lifecycle
    pub manager: String,
    pub description: String,
    pub pull_count: i64,
    pub star_count: i64,
    /// Set once by the store on first insert
    pub creation_time: DateTime<Utc>,
    /// Refreshed by the store on every write
    pub update_time: DateTime<Utc>,
}

impl RepositoryRecord {
    /// New record with zeroed counters. Timestamps are placeholders until the
    /// record is inserted.
    pub fn new(repository_id: RepositoryId, name: impl Into<String>, owner_id: i64, project_id: i64) -> Self {
        Self {
            repository_id,
            name: name.into(),
            owner_id,
            project_id,
            manager: String::new(),
            description: String::new(),
            pull_count: 0,
            star_count: 0,
            creation_time: DateTime::<Utc>::default(),
            update_time: DateTime::<Utc>::default(),
        }
    }

    pub fn with_manager(mut self, manager: impl Into<String>) -> Self {
        self.manager = manager.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_max_chars("name", &self.name, MAX_NAME_CHARS)?;
        require_max_chars("manager", &self.manager, MAX_MANAGER_CHARS)?;
        require_non_negative("owner_id", self.owner_id)?;
        require_non_negative("project_id", self.project_id)?;
        require_non_negative("pull_count", self.pull_count)?;
        require_non_negative("star_count", self.star_count)?;
        Ok(())
    }

    /// Copy the notification-sourced fields of `incoming` onto this record,
    /// leaving identity, counters and timestamps alone.
    pub fn merge_descriptive(&mut self, incoming: &RepositoryRecord) {
        self.name = incoming.name.clone();
        self.owner_id = incoming.owner_id;
        self.project_id = incoming.project_id;
        self.manager = incoming.manager.clone();
        self.description = incoming.description.clone();
    }
}

/// Read model: a stored record plus the display names resolved from the
/// identity service. Never written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryView {
    #[serde(flatten)]
    pub record: RepositoryRecord,
    pub owner_name: String,
    pub project_name: String,
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain layer: records, value objects and the store contracts.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Storage-agnostic record shapes and persistence interfaces

pub mod clock;
pub mod config;
pub mod identity;
pub mod repository_record;
pub mod store;
pub mod validation;
pub mod vulnerability;

pub use clock::{Clock, ManualClock, SystemClock};
pub use identity::IdentityLookup;
pub use repository_record::{RepositoryId, RepositoryRecord, RepositoryView};
pub use store::{ImageVulnerabilityStore, RepositoryRecordStore, StorageBackend, StoreError};
pub use validation::ValidationError;
pub use vulnerability::{
    ImageVulnerabilityId, ImageVulnerabilityRecord, Severity, Vulnerability, VulnerabilityPayload,
    VulnerabilitySummary,
};

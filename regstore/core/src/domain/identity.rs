// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Identity and project lookup used by read paths to resolve the display
//! names that repository records do not persist.

use async_trait::async_trait;

use crate::domain::store::StoreError;

#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// Display name of a user. Fails with `NotFound` for an unknown id.
    async fn owner_name(&self, owner_id: i64) -> Result<String, StoreError>;

    /// Display name of a project. Fails with `NotFound` for an unknown id.
    async fn project_name(&self, project_id: i64) -> Result<String, StoreError>;
}

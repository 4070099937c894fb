// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Embedded store context
//!
//! Loads configuration, opens the configured backend in-process and builds
//! the application services the commands run against.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use regstore_core::application::catalog::StandardRepositoryCatalogService;
use regstore_core::application::store_factory::Stores;
use regstore_core::application::vulnerability_report::StandardVulnerabilityReportService;
use regstore_core::domain::clock::SystemClock;
use regstore_core::domain::config::{BackendKind, StoreConfigManifest};
use regstore_core::infrastructure::schema;

pub struct EmbeddedStores {
    pub config: StoreConfigManifest,
    pub stores: Stores,
    pub catalog: StandardRepositoryCatalogService,
    pub reports: StandardVulnerabilityReportService,
}

impl EmbeddedStores {
    pub async fn open(config_path: Option<PathBuf>) -> Result<Self> {
        let config = StoreConfigManifest::load_or_default(config_path)
            .context("Failed to load configuration")?;
        config
            .validate()
            .context("Configuration validation failed")?;

        if let Some(warning) = ephemeral_backend_warning(&config) {
            eprintln!("{}", format!("⚠ {}", warning).yellow());
        }

        let backend = config.storage_backend()?;
        let stores = Stores::open(&backend, Arc::new(SystemClock))
            .await
            .context("Failed to open stores")?;

        let bootstrap = config
            .spec
            .storage
            .postgres
            .as_ref()
            .is_some_and(|postgres| postgres.bootstrap_schema);
        if bootstrap {
            if let Some(database) = &stores.database {
                info!("bootstrap_schema is enabled");
                schema::bootstrap(database.get_pool()).await?;
            }
        }

        let catalog = StandardRepositoryCatalogService::new(
            stores.repositories.clone(),
            stores.identities.clone(),
        );
        let reports = StandardVulnerabilityReportService::new(stores.vulnerabilities.clone());

        Ok(Self {
            config,
            stores,
            catalog,
            reports,
        })
    }

    /// True when records live only as long as this process
    pub fn is_ephemeral(&self) -> bool {
        self.stores.database.is_none()
    }
}

/// Warning printed before a command runs against the in-memory backend
pub fn ephemeral_backend_warning(config: &StoreConfigManifest) -> Option<&'static str> {
    match config.spec.storage.backend {
        BackendKind::Memory => Some(
            "Using the in-memory backend: records are discarded when this command exits. \
             Set spec.storage.backend to postgres or export REGSTORE_DATABASE_URL to persist them.",
        ),
        BackendKind::Postgres => None,
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Store Configuration Types
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) selecting the
// storage backend and the logging setup of a regstore process.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::store::{PostgresConfig, StorageBackend};

pub const API_VERSION: &str = "regstore/v1";
pub const KIND: &str = "StoreConfig";

/// Top-level store configuration manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfigManifest {
    /// API version (must be "regstore/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "StoreConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: StoreConfigSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfigSpec {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Memory,
    Postgres,
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Ok(BackendKind::Memory),
            "postgres" | "postgresql" => Ok(BackendKind::Postgres),
            other => anyhow::bail!("Unknown storage backend '{}'. Expected memory or postgres", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: BackendKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgres: Option<PostgresSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostgresSettings {
    /// Connection URL, e.g. postgres://user@host/registry
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    /// Create missing tables on startup
    #[serde(default)]
    pub bootstrap_schema: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("compact" or "json")
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_backend() -> BackendKind {
    BackendKind::Memory
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            postgres: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for StoreConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "regstore".to_string(),
                labels: None,
            },
            spec: StoreConfigSpec::default(),
        }
    }
}

impl StoreConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. REGSTORE_CONFIG_PATH environment variable
    /// 2. ./regstore-config.yaml (working directory)
    /// 3. ~/.regstore/config.yaml (user home)
    /// 4. /etc/regstore/config.yaml (system, Unix) or C:\ProgramData\Regstore\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("REGSTORE_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./regstore-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".regstore").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/regstore/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Regstore\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails if missing/invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using in-memory defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source.
    ///
    /// `REGSTORE_DATABASE_URL` switches the backend to postgres with that URL;
    /// `REGSTORE_STORAGE_BACKEND` selects the backend explicitly and wins.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("REGSTORE_DATABASE_URL") {
            tracing::info!("Environment override: REGSTORE_DATABASE_URL");
            match self.spec.storage.postgres.as_mut() {
                Some(postgres) => postgres.url = url,
                None => {
                    self.spec.storage.postgres = Some(PostgresSettings {
                        url,
                        max_connections: default_max_connections(),
                        acquire_timeout_secs: default_acquire_timeout_secs(),
                        bootstrap_schema: false,
                    })
                }
            }
            self.spec.storage.backend = BackendKind::Postgres;
        }

        if let Some(val) = lookup("REGSTORE_STORAGE_BACKEND") {
            match val.parse::<BackendKind>() {
                Ok(kind) => {
                    tracing::info!("Environment override: REGSTORE_STORAGE_BACKEND={:?}", kind);
                    self.spec.storage.backend = kind;
                }
                Err(e) => {
                    tracing::warn!("Invalid value for REGSTORE_STORAGE_BACKEND: {}. Ignoring.", e);
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.storage.backend == BackendKind::Postgres {
            let postgres = self
                .spec
                .storage
                .postgres
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("spec.storage.postgres is required for the postgres backend"))?;

            if postgres.url.is_empty() {
                anyhow::bail!("spec.storage.postgres.url cannot be empty");
            }
            if postgres.max_connections == 0 {
                anyhow::bail!("spec.storage.postgres.max_connections must be greater than 0");
            }
        }

        if !matches!(self.spec.logging.format.as_str(), "compact" | "json") {
            anyhow::bail!(
                "Invalid logging.format: '{}'. Must be 'compact' or 'json'",
                self.spec.logging.format
            );
        }

        Ok(())
    }

    /// Resolve the configured storage backend
    pub fn storage_backend(&self) -> anyhow::Result<StorageBackend> {
        match self.spec.storage.backend {
            BackendKind::Memory => Ok(StorageBackend::InMemory),
            BackendKind::Postgres => {
                let postgres = self
                    .spec
                    .storage
                    .postgres
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("spec.storage.postgres is required for the postgres backend"))?;
                Ok(StorageBackend::PostgreSQL(PostgresConfig {
                    connection_string: postgres.url.clone(),
                    max_connections: postgres.max_connections,
                    acquire_timeout: Duration::from_secs(postgres.acquire_timeout_secs),
                }))
            }
        }
    }
}

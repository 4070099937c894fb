// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for regstore CLI

pub mod config;
pub mod repo;
pub mod schema;
pub mod vuln;

pub use self::config::ConfigCommand;
pub use self::repo::RepoCommand;
pub use self::schema::SchemaCommand;
pub use self::vuln::VulnCommand;

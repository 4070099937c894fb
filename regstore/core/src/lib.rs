// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # regstore core
//!
//! Persistence contracts for container registry metadata: repository records
//! and per-tag image vulnerability summaries.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Record types, store traits, application services and the
//!   in-memory / PostgreSQL store implementations

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;

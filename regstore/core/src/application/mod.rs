// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod catalog;
pub mod store_factory;
pub mod vulnerability_report;

pub use catalog::{RepositoryCatalogService, StandardRepositoryCatalogService};
pub use store_factory::Stores;
pub use vulnerability_report::{StandardVulnerabilityReportService, VulnerabilityReportService};

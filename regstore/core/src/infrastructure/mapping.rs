// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Record-to-Table Mapping
//!
//! Field/column mapping for the relational backend, kept out of the record
//! types. Each [`TableMapping`] lists every record field with its column (or
//! none for transient fields), its SQL definition and the role the store plays
//! for it (primary key, auto timestamps). Storage-only columns such as the
//! vulnerability revision appear here too, without a record field.
//!
//! The schema bootstrap renders DDL from these tables and the PostgreSQL
//! stores take their column lists from them.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    PrimaryKey,
    Data,
    /// Stamped by the store on insert only
    AutoNowAdd,
    /// Stamped by the store on every write
    AutoNow,
    /// Lives on the read model only; never stored
    Transient,
    /// Stored but not part of the record
    StorageOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub field: &'static str,
    pub column: Option<&'static str>,
    pub definition: &'static str,
    pub role: ColumnRole,
}

const fn column(field: &'static str, column: &'static str, definition: &'static str, role: ColumnRole) -> ColumnMapping {
    ColumnMapping {
        field,
        column: Some(column),
        definition,
        role,
    }
}

const fn transient(field: &'static str) -> ColumnMapping {
    ColumnMapping {
        field,
        column: None,
        definition: "",
        role: ColumnRole::Transient,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableMapping {
    pub table: &'static str,
    pub columns: &'static [ColumnMapping],
}

pub const REPOSITORY_TABLE: TableMapping = TableMapping {
    table: "repository",
    columns: &[
        column("RepositoryID", "repository_id", "VARCHAR(255) NOT NULL", ColumnRole::PrimaryKey),
        column("Name", "name", "VARCHAR(255) NOT NULL", ColumnRole::Data),
        transient("OwnerName"),
        column("OwnerID", "owner_id", "BIGINT NOT NULL", ColumnRole::Data),
        transient("ProjectName"),
        column("ProjectID", "project_id", "BIGINT NOT NULL", ColumnRole::Data),
        column("Manager", "manager", "VARCHAR(255) NOT NULL DEFAULT ''", ColumnRole::Data),
        column("Description", "description", "TEXT NOT NULL DEFAULT ''", ColumnRole::Data),
        column("PullCount", "pull_count", "BIGINT NOT NULL DEFAULT 0", ColumnRole::Data),
        column("StarCount", "star_count", "BIGINT NOT NULL DEFAULT 0", ColumnRole::Data),
        column("CreationTime", "creation_time", "TIMESTAMPTZ NOT NULL", ColumnRole::AutoNowAdd),
        column("UpdateTime", "update_time", "TIMESTAMPTZ NOT NULL", ColumnRole::AutoNow),
    ],
};

/// Sequence feeding the vulnerability `revision` column
pub const VULNERABILITY_REVISION_SEQUENCE: &str = "img_vulnerability_revision_seq";

pub const IMAGE_VULNERABILITY_TABLE: TableMapping = TableMapping {
    table: "img_vulnerability",
    columns: &[
        column("RVID", "rv_id", "VARCHAR(255) NOT NULL", ColumnRole::PrimaryKey),
        column("RepoName", "repo_name", "VARCHAR(255) NOT NULL", ColumnRole::Data),
        column("Tag", "tag", "VARCHAR(128) NOT NULL", ColumnRole::Data),
        column("VulnerabilityCount", "v_count", "INTEGER NOT NULL DEFAULT 0", ColumnRole::Data),
        column("Vulnerabilities", "vulnerabilities", "TEXT NOT NULL DEFAULT ''", ColumnRole::Data),
        column(
            "Revision",
            "revision",
            "BIGINT NOT NULL DEFAULT nextval('img_vulnerability_revision_seq')",
            ColumnRole::StorageOnly,
        ),
    ],
};

impl TableMapping {
    pub fn primary_key(&self) -> &'static str {
        self.columns
            .iter()
            .find(|c| c.role == ColumnRole::PrimaryKey)
            .and_then(|c| c.column)
            .unwrap_or_default()
    }

    /// Column of a record field, `None` for transient or unknown fields
    pub fn column_for(&self, field: &str) -> Option<&'static str> {
        self.columns
            .iter()
            .find(|c| c.field == field)
            .and_then(|c| c.column)
    }

    /// Record fields that are never written
    pub fn transient_fields(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|c| c.role == ColumnRole::Transient)
            .map(|c| c.field)
            .collect()
    }

    /// Columns that hold record fields, in declaration order
    pub fn record_columns(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|c| !matches!(c.role, ColumnRole::Transient | ColumnRole::StorageOnly))
            .filter_map(|c| c.column)
            .collect()
    }

    /// Comma separated `record_columns`, for SELECT / RETURNING lists
    pub fn select_list(&self) -> String {
        self.record_columns().join(", ")
    }

    pub fn create_table_sql(&self) -> String {
        let mut lines: Vec<String> = self
            .columns
            .iter()
            .filter_map(|c| c.column.map(|name| format!("    {} {}", name, c.definition)))
            .collect();
        lines.push(format!("    PRIMARY KEY ({})", self.primary_key()));

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
            self.table,
            lines.join(",\n")
        )
    }
}

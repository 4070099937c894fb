// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Image vulnerability commands
//!
//! Commands: put, get, find, list

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use regstore_core::application::vulnerability_report::VulnerabilityReportService;
use regstore_core::domain::vulnerability::{ImageVulnerabilityId, Vulnerability};

use crate::embedded::EmbeddedStores;
use crate::output::print_json;

#[derive(Subcommand)]
pub enum VulnCommand {
    /// Store scan findings for an image tag
    Put {
        /// Repository name, e.g. library/nginx
        #[arg(long)]
        repo: String,

        #[arg(long)]
        tag: String,

        /// JSON array of findings in scanner format
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },

    /// Show a vulnerability record by rv_id
    Get {
        #[arg(value_name = "RV_ID")]
        rv_id: String,
    },

    /// Show the latest record of an image tag
    Find {
        #[arg(long)]
        repo: String,

        #[arg(long)]
        tag: String,

        /// Print severity counts instead of the record
        #[arg(long)]
        summary: bool,
    },

    /// List records of a repository
    List {
        #[arg(long)]
        repo: String,
    },
}

pub async fn handle_command(command: VulnCommand, config_path: Option<PathBuf>) -> Result<()> {
    let embedded = EmbeddedStores::open(config_path).await?;
    let reports = &embedded.reports;

    match command {
        VulnCommand::Put { repo, tag, file } => {
            let findings = read_findings(&file)?;
            let record = reports
                .record_scan(&repo, &tag, &findings)
                .await
                .with_context(|| format!("Failed to store scan of {}:{}", repo, tag))?;
            println!(
                "{}",
                format!(
                    "✓ Stored {} findings for {}:{} (rv_id: {})",
                    record.vulnerability_count, repo, tag, record.rv_id
                )
                .green()
            );
            Ok(())
        }
        VulnCommand::Get { rv_id } => {
            let rv_id = ImageVulnerabilityId::new(rv_id.as_str())
                .with_context(|| format!("Invalid rv_id '{}'", rv_id))?;
            let record = reports
                .get(&rv_id)
                .await
                .with_context(|| format!("Failed to fetch vulnerability record {}", rv_id))?;
            print_json(&record)
        }
        VulnCommand::Find { repo, tag, summary } => {
            if summary {
                let summary = reports
                    .summary(&repo, &tag)
                    .await
                    .with_context(|| format!("Failed to summarize {}:{}", repo, tag))?;
                print_json(&summary)
            } else {
                let record = reports
                    .latest(&repo, &tag)
                    .await
                    .with_context(|| format!("Failed to find vulnerability record for {}:{}", repo, tag))?;
                print_json(&record)
            }
        }
        VulnCommand::List { repo } => {
            let records = reports
                .list_for_repo(&repo)
                .await
                .with_context(|| format!("Failed to list vulnerability records of {}", repo))?;
            print_json(&records)
        }
    }
}

fn read_findings(path: &Path) -> Result<Vec<Vulnerability>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read findings from {:?}", path))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse findings in {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use regstore_core::domain::vulnerability::Severity;

    #[test]
    fn test_read_findings_scanner_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("findings.json");
        std::fs::write(
            &path,
            r#"[{"Name":"CVE-2024-6119","NamespaceName":"debian:12","Severity":"High","FixedBy":"3.0.14-1~deb12u2"}]"#,
        )
        .unwrap();

        let findings = read_findings(&path).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].fixed_by.as_deref(), Some("3.0.14-1~deb12u2"));
    }

    #[test]
    fn test_read_findings_rejects_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("findings.json");
        std::fs::write(&path, r#"{"Name":"CVE-2024-6119"}"#).unwrap();
        assert!(read_findings(&path).is_err());
    }
}

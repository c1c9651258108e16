//! Run command implementation
//!
//! This module implements the `run` command, which runs one job once and
//! exits.

use super::{
    build_job, load_valid_config, EXIT_CONFIG_ERROR, EXIT_FATAL, EXIT_JOB_FAILED, EXIT_OK,
};
use crate::adapters::auth::AzureTokenProvider;
use crate::config::{NimbusConfig, PaginationStrategy};
use crate::core::jobs::{ArtifactOutcome, JobKind, JobReport, UploadOutcome};
use clap::Args;
use std::sync::Arc;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Job to run (disk_inventory or placement_score)
    pub job: JobKind,

    /// Override the Resource Graph page size (1-1000)
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Override the pagination strategy (counted or continuation_token)
    #[arg(long)]
    pub pagination: Option<PaginationStrategy>,

    /// Override the directory artifacts are written to
    #[arg(long)]
    pub output_dir: Option<String>,
}

impl RunArgs {
    /// Apply CLI overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut NimbusConfig) {
        if let Some(page_size) = self.page_size {
            tracing::info!(page_size, "Overriding page size from CLI");
            config.disk_inventory.page_size = page_size;
        }
        if let Some(pagination) = self.pagination {
            tracing::info!(pagination = %pagination, "Overriding pagination strategy from CLI");
            config.disk_inventory.pagination = pagination;
        }
        if let Some(ref output_dir) = self.output_dir {
            tracing::info!(output_dir = %output_dir, "Overriding output directory from CLI");
            config.application.output_dir = output_dir.clone();
        }
    }

    /// Execute the run command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(job = %self.job, "Starting run command");

        let mut config = match load_valid_config(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        self.apply_overrides(&mut config);
        if let Err(e) = config.validate() {
            eprintln!("Invalid command line override: {e}");
            return Ok(EXIT_CONFIG_ERROR);
        }

        if self.job == JobKind::PlacementScore && config.placement.is_none() {
            eprintln!("The placement_score job needs a [placement] section in {config_path}");
            return Ok(EXIT_CONFIG_ERROR);
        }

        let tokens = match AzureTokenProvider::from_config(&config.identity) {
            Ok(t) => Arc::new(t),
            Err(e) => {
                tracing::error!(error = %e, "Failed to create Azure credential");
                eprintln!("Failed to create Azure credential: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        let job = build_job(&config, self.job, tokens)?;

        println!("🚀 Running {}...", self.job);
        let report = match job.run(false).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(job = %self.job, error = %e, "Job failed");
                eprintln!("❌ {} failed: {e}", self.job);
                return Ok(EXIT_JOB_FAILED);
            }
        };

        report.log_report();
        print_report(&report);

        Ok(if report.is_successful() {
            EXIT_OK
        } else {
            EXIT_JOB_FAILED
        })
    }
}

fn print_report(report: &JobReport) {
    println!();
    println!("📊 Run Summary:");
    println!("  Job: {}", report.job);
    println!("  Run ID: {}", report.run_id);
    if let Some(ref export) = report.export {
        println!("  Reported Total: {}", export.total_reported);
        println!("  Pages Fetched: {}", export.pages_fetched);
        if export.total_drift {
            println!("  ⚠️  Total changed between pages");
        }
    }
    match &report.artifact {
        ArtifactOutcome::Produced(artifact) => {
            println!("  Artifact: {}", artifact.path.display());
            println!("  Rows: {}", artifact.rows);
            println!("  Bytes: {}", artifact.bytes);
            println!("  SHA-256: {}", artifact.sha256);
        }
        ArtifactOutcome::NotProduced { reason } => {
            println!("  Artifact: none ({reason})");
        }
    }
    match &report.upload {
        None => println!("  Upload: skipped"),
        Some(UploadOutcome::Uploaded {
            container,
            blob_name,
            ..
        }) => println!("  Upload: {container}/{blob_name}"),
        Some(UploadOutcome::Failed {
            container,
            blob_name,
            error,
        }) => println!("  Upload: ❌ {container}/{blob_name} failed: {error}"),
    }
    println!("  Duration: {:.2}s", report.duration.as_secs_f64());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    const CONFIG: &str = r#"
[storage]
account_url = "https://acct.blob.core.windows.net"
container_name = "exports"
"#;

    #[test]
    fn test_apply_overrides() {
        let mut config = load_config_from_str(CONFIG).unwrap();
        let args = RunArgs {
            job: JobKind::DiskInventory,
            page_size: Some(200),
            pagination: Some(PaginationStrategy::ContinuationToken),
            output_dir: Some("/tmp/nimbus".to_string()),
        };

        args.apply_overrides(&mut config);

        assert_eq!(config.disk_inventory.page_size, 200);
        assert_eq!(
            config.disk_inventory.pagination,
            PaginationStrategy::ContinuationToken
        );
        assert_eq!(config.application.output_dir, "/tmp/nimbus");
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let mut config = load_config_from_str(CONFIG).unwrap();
        let args = RunArgs {
            job: JobKind::PlacementScore,
            page_size: None,
            pagination: None,
            output_dir: None,
        };

        args.apply_overrides(&mut config);
        assert_eq!(config.disk_inventory.page_size, 1000);
    }
}

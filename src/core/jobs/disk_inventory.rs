//! Disk inventory job
//!
//! Pages the managed-disk query into `{output_dir}/{file_name}` and uploads it
//! as `{blob_prefix}_{YYYYMMDD}.csv`.

use super::outcome::{Artifact, ArtifactOutcome, JobKind, JobReport};
use super::{upload_artifact, Job};
use crate::adapters::auth::TokenProvider;
use crate::adapters::blob::{BlobStorageClient, BlobUploader};
use crate::adapters::resource_graph::{QuerySource, ResourceGraphClient};
use crate::config::NimbusConfig;
use crate::core::export::{CsvSink, PaginatedExporter, PaginationConfig};
use crate::domain::{BlobName, ContainerName, NimbusError, Result};
use crate::{log_job_complete, log_job_start};
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Resource Graph disk inventory export
pub struct DiskInventoryJob {
    exporter: PaginatedExporter,
    output_path: PathBuf,
    blob_prefix: String,
    container: ContainerName,
    source: Arc<dyn QuerySource>,
    uploader: Arc<dyn BlobUploader>,
}

impl DiskInventoryJob {
    /// Create the job with explicit collaborators
    pub fn new(
        config: &NimbusConfig,
        source: Arc<dyn QuerySource>,
        uploader: Arc<dyn BlobUploader>,
    ) -> Self {
        let disk = &config.disk_inventory;
        Self {
            exporter: PaginatedExporter::new(disk.query.clone(), PaginationConfig::from(disk)),
            output_path: PathBuf::from(&config.application.output_dir).join(&disk.file_name),
            blob_prefix: disk.blob_prefix.clone(),
            container: config.storage.container_name.clone(),
            source,
            uploader,
        }
    }

    /// Create the job with the Azure REST clients
    pub fn from_config(config: &NimbusConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        let source = ResourceGraphClient::new(
            &config.http,
            config.disk_inventory.subscriptions.clone(),
            tokens.clone(),
        )?;
        let uploader = BlobStorageClient::new(&config.storage, &config.http, tokens)?;
        Ok(Self::new(config, Arc::new(source), Arc::new(uploader)))
    }

    /// Local path the CSV is written to
    pub fn output_path(&self) -> &PathBuf {
        &self.output_path
    }
}

#[async_trait]
impl Job for DiskInventoryJob {
    fn kind(&self) -> JobKind {
        JobKind::DiskInventory
    }

    async fn run(&self, past_due: bool) -> Result<JobReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let started = Instant::now();
        log_job_start!(self.kind(), run_id, past_due);

        let output_path = self.output_path.clone();
        let summary = self
            .exporter
            .export(self.source.as_ref(), move || CsvSink::create(output_path))
            .await?;
        summary.log_summary();

        let artifact = match summary.output {
            Some(ref path) => {
                let blob_name = BlobName::dated(&self.blob_prefix, started_at.date_naive(), "csv")
                    .map_err(NimbusError::Validation)?;
                ArtifactOutcome::Produced(Artifact::from_file(
                    path,
                    blob_name,
                    summary.rows_written,
                )?)
            }
            None => {
                tracing::info!(job = %self.kind(), "No disks found, skipping upload");
                ArtifactOutcome::not_produced("query returned no records")
            }
        };

        let upload = match artifact.artifact() {
            Some(a) => Some(upload_artifact(self.uploader.as_ref(), &self.container, a).await),
            None => None,
        };

        let report = JobReport {
            job: self.kind(),
            run_id,
            started_at,
            past_due,
            artifact,
            export: Some(summary),
            upload,
            duration: started.elapsed(),
        };
        log_job_complete!(report.job, report.rows(), report.duration);
        Ok(report)
    }
}
